use std::collections::HashMap;

use quizfield_engine::{
    AudioService, Canvas, ImageStore, InputAction, InputSnapshot, Rgba, ScreenRect, TextStyle,
};
use tracing::{debug, info, warn};

use crate::data::{CharacterChange, ScriptRegistry, VnScript};
use crate::state::{MapChange, PlayerState};
use crate::ui;

/// Auto-fit character height as a share of the screen height.
const CHARACTER_HEIGHT_FRACTION: f32 = 0.6;
/// Distance from the bottom of the screen to the character's feet.
const CHARACTER_BASELINE_MARGIN: i32 = 100;
const TEXT_BOX_MARGIN: i32 = 50;
const TEXT_BOX_HEIGHT: i32 = 150;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NovelStatus {
    Running,
    Finished,
}

#[derive(Debug, Clone, PartialEq)]
struct CharacterView {
    image: String,
    scale: Option<f32>,
    offset_y: i32,
}

#[derive(Debug)]
struct ActiveScript {
    id: String,
    script: VnScript,
    labels: HashMap<String, usize>,
    index: usize,
    selected: usize,
    background: Option<String>,
    character: Option<CharacterView>,
}

impl ActiveScript {
    /// Index of `label`, or the next step when no such label exists.
    fn resolve(&self, label: Option<&str>) -> usize {
        let fallthrough = self.index + 1;
        let Some(label) = label else {
            return fallthrough;
        };
        match self.labels.get(label) {
            Some(index) => *index,
            None => {
                warn!(script = %self.id, label, "vn_jump_label_missing");
                fallthrough
            }
        }
    }
}

/// Plays one script at a time and remembers a map change it asked for.
#[derive(Debug, Default)]
pub(crate) struct VisualNovelEngine {
    active: Option<ActiveScript>,
    deferred: Option<MapChange>,
}

impl VisualNovelEngine {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn start(
        &mut self,
        script_id: &str,
        scripts: &ScriptRegistry,
        player: &mut PlayerState,
        audio: &mut dyn AudioService,
    ) -> NovelStatus {
        let Some(script) = scripts.get(script_id) else {
            warn!(script = %script_id, "vn_script_missing");
            self.active = None;
            return NovelStatus::Finished;
        };

        let mut labels = HashMap::new();
        for (index, step) in script.steps.iter().enumerate() {
            if let Some(label) = step.label.as_ref() {
                if labels.contains_key(label) {
                    warn!(script = %script_id, label = %label, "vn_duplicate_label_ignored");
                } else {
                    labels.insert(label.clone(), index);
                }
            }
        }
        if let Some(track) = script.bgm.as_deref() {
            audio.play_music(track);
        }
        info!(script = %script_id, steps = script.steps.len(), "vn_started");

        self.active = Some(ActiveScript {
            id: script_id.to_string(),
            script: script.clone(),
            labels,
            index: 0,
            selected: 0,
            background: None,
            character: None,
        });
        self.go_to(0, player)
    }

    pub(crate) fn update(&mut self, input: &InputSnapshot, player: &mut PlayerState) -> NovelStatus {
        let Some(active) = self.active.as_mut() else {
            return NovelStatus::Finished;
        };
        let Some(step) = active.script.steps.get(active.index) else {
            return self.finish();
        };

        let next = match step.choice.as_ref() {
            Some(prompt) => {
                let count = prompt.options.len();
                if input.pressed(InputAction::MoveUp) {
                    active.selected = (active.selected + count - 1) % count;
                    None
                } else if input.pressed(InputAction::MoveDown) {
                    active.selected = (active.selected + 1) % count;
                    None
                } else if input.pressed(InputAction::Confirm) {
                    let target = match prompt.correct {
                        Some(correct) if active.selected == correct => prompt.on_correct.as_deref(),
                        Some(_) => prompt.on_wrong.as_deref(),
                        None => step.jump.as_deref(),
                    };
                    debug!(script = %active.id, selected = active.selected, "vn_choice_made");
                    Some(active.resolve(target))
                } else {
                    None
                }
            }
            None => {
                let advance = input.pressed(InputAction::Confirm)
                    || input.pressed(InputAction::PointerPrimary);
                advance.then(|| active.resolve(step.jump.as_deref()))
            }
        };

        match next {
            Some(index) => self.go_to(index, player),
            None => NovelStatus::Running,
        }
    }

    /// Map change requested by the last script, consumed once.
    pub(crate) fn take_deferred_transition(&mut self) -> Option<MapChange> {
        self.deferred.take()
    }

    fn go_to(&mut self, index: usize, player: &mut PlayerState) -> NovelStatus {
        let Some(active) = self.active.as_mut() else {
            return NovelStatus::Finished;
        };
        let Some(step) = active.script.steps.get(index) else {
            return self.finish();
        };
        active.index = index;
        active.selected = 0;

        if let Some(background) = step.background.as_ref() {
            active.background = Some(background.clone());
        }
        match &step.character {
            CharacterChange::Keep => {}
            CharacterChange::Clear => active.character = None,
            CharacterChange::Show {
                image,
                scale,
                offset_y,
            } => {
                active.character = Some(CharacterView {
                    image: image.clone(),
                    scale: *scale,
                    offset_y: *offset_y,
                });
            }
        }
        if player.grant_missing_items(&step.items) > 0 {
            info!(script = %active.id, step = index, "vn_items_granted");
        }
        if let Some(flag) = step.set_flag.as_deref() {
            player.set_flag(flag);
        }
        if let Some(change) = step.next_map.as_ref() {
            debug!(script = %active.id, map = %change.map, "vn_next_map_deferred");
            self.deferred = Some(change.clone());
        }
        NovelStatus::Running
    }

    fn finish(&mut self) -> NovelStatus {
        if let Some(active) = self.active.take() {
            info!(script = %active.id, "vn_finished");
        }
        NovelStatus::Finished
    }

    pub(crate) fn draw(&self, canvas: &mut dyn Canvas, images: &mut ImageStore) {
        canvas.clear(Rgba::BLACK);
        let Some(active) = self.active.as_ref() else {
            return;
        };
        let (width, height) = canvas.size();

        if let Some(background) = active
            .background
            .as_deref()
            .and_then(|key| images.sized(key, width, height, false))
        {
            canvas.draw_image(&background, 0, 0);
        }

        if let Some(view) = active.character.as_ref() {
            if let Some(original) = images.get(&view.image) {
                let scale = view.scale.unwrap_or_else(|| {
                    height as f32 * CHARACTER_HEIGHT_FRACTION / original.height().max(1) as f32
                });
                let scaled_width = ((original.width() as f32 * scale).round() as u32).max(1);
                let scaled_height = ((original.height() as f32 * scale).round() as u32).max(1);
                if let Some(sprite) = images.sized(&view.image, scaled_width, scaled_height, false) {
                    let x = (width as i32 - scaled_width as i32) / 2;
                    let y = height as i32 - CHARACTER_BASELINE_MARGIN - scaled_height as i32
                        + view.offset_y;
                    canvas.draw_image(&sprite, x, y);
                }
            }
        }

        let Some(step) = active.script.steps.get(active.index) else {
            return;
        };
        let rect = ScreenRect::new(
            TEXT_BOX_MARGIN,
            height as i32 - TEXT_BOX_MARGIN - TEXT_BOX_HEIGHT,
            width as i32 - TEXT_BOX_MARGIN * 2,
            TEXT_BOX_HEIGHT,
        );
        let style = TextStyle::new(Rgba::WHITE);
        let max_chars = ui::chars_per_line(rect.width, style);
        let mut lines = Vec::new();
        if let Some(speaker) = step.speaker.as_deref() {
            lines.push(format!("[{speaker}]"));
        }
        lines.extend(ui::wrap_text(&step.text, max_chars));
        if let Some(prompt) = step.choice.as_ref() {
            lines.extend(prompt.options.iter().enumerate().map(|(index, option)| {
                let cursor = if index == active.selected { '>' } else { ' ' };
                format!("{cursor} {option}")
            }));
        }
        let lines = lines.iter().map(String::as_str).collect::<Vec<_>>();
        canvas.draw_text_block(&lines, rect, style);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::TilePos;
    use crate::test_support::{registries, RecordingAudio};

    impl VisualNovelEngine {
        fn is_active(&self) -> bool {
            self.active.is_some()
        }

        fn current_index(&self) -> Option<usize> {
            self.active.as_ref().map(|active| active.index)
        }
    }

    const SCRIPTS: &str = r#"{
        "branch": {"bgm": "story.mp3", "steps": [
            {"bg": "bg/sea.png", "char": "captain.png", "text": "Quiz!", "choices": ["2", "3"],
             "correct": 1, "on_correct": "right", "on_wrong": "wrong"},
            {"label": "wrong", "text": "No.", "jump": "end"},
            {"label": "right", "text": "Yes!", "item": "compass", "char": "none"},
            {"label": "end", "text": "Bye.", "next_map": {"map": "isle", "dest_x": 3, "dest_y": 4},
             "set_flag": "voyage_done"}
        ]},
        "loose": [
            {"text": "one", "jump": "nowhere"},
            {"text": "two", "choices": ["a", "b"], "jump": "last"},
            {"text": "skipped"},
            {"label": "last", "text": "three", "items": ["compass"]}
        ]
    }"#;

    struct Reader {
        engine: VisualNovelEngine,
        scripts: ScriptRegistry,
        player: PlayerState,
        audio: RecordingAudio,
    }

    impl Reader {
        fn new() -> Self {
            Self {
                engine: VisualNovelEngine::new(),
                scripts: registries("{}", "{}", SCRIPTS, "{}").scripts,
                player: PlayerState::new(TilePos::new(0, 0)),
                audio: RecordingAudio::default(),
            }
        }

        fn start(&mut self, id: &str) -> NovelStatus {
            self.engine
                .start(id, &self.scripts, &mut self.player, &mut self.audio)
        }

        fn press(&mut self, action: InputAction) -> NovelStatus {
            self.engine.update(
                &InputSnapshot::empty().with_pressed(action),
                &mut self.player,
            )
        }

        fn character(&self) -> Option<String> {
            self.engine
                .active
                .as_ref()
                .and_then(|active| active.character.as_ref())
                .map(|view| view.image.clone())
        }
    }

    #[test]
    fn unknown_script_finishes_immediately() {
        let mut reader = Reader::new();
        assert_eq!(reader.start("missing"), NovelStatus::Finished);
        assert!(!reader.engine.is_active());
    }

    #[test]
    fn correct_choice_jumps_to_correct_label() {
        let mut reader = Reader::new();
        assert_eq!(reader.start("branch"), NovelStatus::Running);
        assert_eq!(reader.audio.music.as_deref(), Some("story.mp3"));
        assert_eq!(reader.character().as_deref(), Some("captain.png"));

        reader.press(InputAction::MoveDown);
        reader.press(InputAction::Confirm);
        assert_eq!(reader.engine.current_index(), Some(2));
        assert_eq!(reader.player.items, vec!["compass"]);
        assert_eq!(reader.character(), None);

        reader.press(InputAction::Confirm);
        assert_eq!(reader.engine.current_index(), Some(3));
        assert!(reader.player.flag("voyage_done"));
        assert_eq!(reader.press(InputAction::PointerPrimary), NovelStatus::Finished);
        assert_eq!(
            reader.engine.take_deferred_transition(),
            Some(MapChange {
                map: "isle".to_string(),
                dest: Some(TilePos::new(3, 4)),
            })
        );
        assert_eq!(reader.engine.take_deferred_transition(), None);
    }

    #[test]
    fn wrong_choice_jumps_to_wrong_label_then_follows_jump() {
        let mut reader = Reader::new();
        reader.start("branch");
        reader.press(InputAction::Confirm);
        assert_eq!(reader.engine.current_index(), Some(1));
        assert_eq!(reader.character().as_deref(), Some("captain.png"), "absent char keeps");
        reader.press(InputAction::Confirm);
        assert_eq!(reader.engine.current_index(), Some(3));
        assert!(reader.player.items.is_empty());
    }

    #[test]
    fn missing_label_falls_through_and_narrative_choice_takes_step_jump() {
        let mut reader = Reader::new();
        reader.player.items.push("compass".to_string());
        reader.start("loose");
        reader.press(InputAction::Confirm);
        assert_eq!(reader.engine.current_index(), Some(1));

        assert_eq!(reader.press(InputAction::MoveUp), NovelStatus::Running);
        assert_eq!(reader.engine.current_index(), Some(1), "choice waits for confirm");
        reader.press(InputAction::Confirm);
        assert_eq!(reader.engine.current_index(), Some(3));
        assert_eq!(reader.player.items, vec!["compass"], "held items are not re-added");
    }

    #[test]
    fn pointer_does_not_resolve_a_choice() {
        let mut reader = Reader::new();
        reader.start("branch");
        reader.press(InputAction::PointerPrimary);
        assert_eq!(reader.engine.current_index(), Some(0));
    }
}
