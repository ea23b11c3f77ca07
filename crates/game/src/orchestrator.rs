use quizfield_engine::{
    AudioService, Canvas, ImageStore, InputAction, InputSnapshot, Scene, SceneCommand,
};
use tracing::{error, info, warn};

use crate::data::Registries;
use crate::dialogue::{DialogueEffect, DialogueEngine};
use crate::field::{FieldController, FieldEnv, FieldEvent, NpcRoster};
use crate::novel::{NovelStatus, VisualNovelEngine};
use crate::save::{JsonSaveStore, SaveRecord};
use crate::state::{MapChange, PlayerState};
use crate::title::TitleScreen;
use crate::ui;

const TOAST_FRAMES: u32 = 120;
const CHEST_OPEN_EFFECT: &str = "chestopen.mp3";
const CHEST_CLOSE_EFFECT: &str = "chestclose.mp3";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActiveScene {
    Title,
    Field,
    VisualNovel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Overlay {
    Inventory,
    Map,
}

#[derive(Debug)]
struct Toast {
    text: &'static str,
    frames_left: u32,
}

/// Owns the session and routes each tick to exactly one scene.
pub(crate) struct SceneOrchestrator {
    active: ActiveScene,
    registries: Registries,
    images: ImageStore,
    save_store: JsonSaveStore,
    player: PlayerState,
    npcs: NpcRoster,
    field: FieldController,
    dialogue: DialogueEngine,
    novel: VisualNovelEngine,
    /// Map change held back by dialogue until its scenario has played.
    deferred: Option<MapChange>,
    overlay: Option<Overlay>,
    title: TitleScreen,
    toast: Option<Toast>,
}

impl SceneOrchestrator {
    pub(crate) fn new(
        registries: Registries,
        images: ImageStore,
        save_store: JsonSaveStore,
        screen_width: u32,
        screen_height: u32,
    ) -> Self {
        let player = PlayerState::new(registries.game.start_tile());
        let npcs = NpcRoster::new(&registries.npcs);
        Self {
            active: ActiveScene::Title,
            registries,
            images,
            save_store,
            player,
            npcs,
            field: FieldController::new(screen_width, screen_height),
            dialogue: DialogueEngine::new(),
            novel: VisualNovelEngine::new(),
            deferred: None,
            overlay: None,
            title: TitleScreen::default(),
            toast: None,
        }
    }

    /// Fresh player, NPC flags and field state.
    fn reset_session(&mut self) {
        self.player = PlayerState::new(self.registries.game.start_tile());
        self.npcs = NpcRoster::new(&self.registries.npcs);
        self.field.reset();
        self.dialogue = DialogueEngine::new();
        self.novel = VisualNovelEngine::new();
        self.deferred = None;
        self.overlay = None;
    }

    fn start_new_game(&mut self, audio: &mut dyn AudioService) {
        self.reset_session();
        info!(
            start_map = %self.registries.game.start_map,
            x = self.player.tile.x,
            y = self.player.tile.y,
            "new_game_started"
        );
        match self.registries.game.opening_script.clone() {
            Some(script) => self.start_scenario(&script, audio),
            None => self.return_to_field(audio),
        }
    }

    fn start_scenario(&mut self, script: &str, audio: &mut dyn AudioService) {
        let status = self
            .novel
            .start(script, &self.registries.scripts, &mut self.player, audio);
        match status {
            NovelStatus::Running => self.active = ActiveScene::VisualNovel,
            NovelStatus::Finished => self.return_to_field(audio),
        }
    }

    /// Resumes the field after a script, applying any map change it left behind.
    fn return_to_field(&mut self, audio: &mut dyn AudioService) {
        self.active = ActiveScene::Field;
        if self.field.map_id().is_none() {
            let mut env = FieldEnv {
                maps: &self.registries.maps,
                images: &mut self.images,
                audio: &mut *audio,
            };
            self.field
                .load_map(&self.registries.game.start_map, &mut env);
        } else {
            self.field.resume_music(audio);
        }

        let from_script = self.novel.take_deferred_transition();
        let from_dialogue = self.deferred.take();
        if let Some(change) = from_script.or(from_dialogue) {
            info!(map = %change.map, "deferred_transition_applied");
            self.field.begin_transition(change);
        }
    }

    fn read_save(&mut self) -> Option<SaveRecord> {
        match self.save_store.load() {
            Ok(Some(record)) => Some(record),
            Ok(None) => {
                info!(path = %self.save_store.path().display(), "save_missing_nothing_to_load");
                self.show_toast("NO SAVE DATA");
                None
            }
            Err(error) => {
                warn!(error = %error, "save_unreadable_treated_as_missing");
                self.show_toast("NO SAVE DATA");
                None
            }
        }
    }

    fn save_progress(&mut self) {
        let record = SaveRecord::capture(&self.player, self.field.map_id());
        match self.save_store.store(&record) {
            Ok(()) => self.show_toast("SAVED"),
            Err(error) => {
                error!(error = %error, "save_failed");
                self.show_toast("SAVE FAILED");
            }
        }
    }

    /// Restores `record` into the field. A save whose map is gone resumes at
    /// the start map; when no map can be loaded the save is refused.
    fn apply_save(&mut self, record: &SaveRecord, audio: &mut dyn AudioService) {
        let start_map = self.registries.game.start_map.clone();
        let mut map = record.map.clone().unwrap_or_else(|| start_map.clone());
        let mut env = FieldEnv {
            maps: &self.registries.maps,
            images: &mut self.images,
            audio,
        };
        let mut at_start = false;
        if !self.field.load_map(&map, &mut env) {
            warn!(map = %map, start_map = %start_map, "save_map_unknown_using_start_map");
            if map == start_map || !self.field.load_map(&start_map, &mut env) {
                self.show_toast("NO SAVE DATA");
                return;
            }
            map = start_map;
            at_start = true;
        }

        record.restore_into(&mut self.player);
        if at_start || !self.field.contains(self.player.tile) {
            let start = self.registries.game.start_tile();
            if !at_start {
                warn!(
                    map = %map,
                    x = self.player.tile.x,
                    y = self.player.tile.y,
                    "save_position_out_of_bounds_using_start"
                );
            }
            self.player.tile = start;
        }
        self.dialogue.close();
        self.deferred = None;
        self.overlay = None;
        self.active = ActiveScene::Field;
        info!(map = %map, x = self.player.tile.x, y = self.player.tile.y, "save_restored");
        self.show_toast("LOADED");
    }

    fn show_toast(&mut self, text: &'static str) {
        self.toast = Some(Toast {
            text,
            frames_left: TOAST_FRAMES,
        });
    }

    fn tick_toast(&mut self) {
        if let Some(toast) = self.toast.as_mut() {
            toast.frames_left = toast.frames_left.saturating_sub(1);
            if toast.frames_left == 0 {
                self.toast = None;
            }
        }
    }

    fn update_title(&mut self, input: &InputSnapshot, audio: &mut dyn AudioService) {
        self.title.tick();
        if input.pressed(InputAction::Load) {
            if let Some(record) = self.read_save() {
                self.reset_session();
                self.apply_save(&record, audio);
            }
            return;
        }
        if input.pressed(InputAction::Confirm) || input.pressed(InputAction::PointerPrimary) {
            self.start_new_game(audio);
        }
    }

    fn update_field(&mut self, input: &InputSnapshot, audio: &mut dyn AudioService) {
        let settled = !self.dialogue.is_active() && !self.field.is_transitioning();
        if settled {
            if self.overlay.is_none() && input.pressed(InputAction::Save) {
                self.save_progress();
                return;
            }
            if self.overlay.is_none() && input.pressed(InputAction::Load) {
                if let Some(record) = self.read_save() {
                    self.apply_save(&record, audio);
                }
                return;
            }
            if input.pressed(InputAction::ToggleInventory) {
                self.toggle_overlay(Overlay::Inventory, audio);
            } else if input.pressed(InputAction::ToggleMap) {
                self.toggle_overlay(Overlay::Map, audio);
            } else if self.overlay.is_some() && input.pressed(InputAction::Cancel) {
                self.overlay = None;
                audio.play_effect(CHEST_CLOSE_EFFECT);
            }
        }
        if self.overlay.is_some() {
            return;
        }

        self.npcs.animate();
        for effect in self
            .dialogue
            .update(input, &mut self.player, &mut self.npcs)
        {
            match effect {
                DialogueEffect::DeferTransition(change) => self.deferred = Some(change),
                DialogueEffect::BeginTransition(change) => {
                    self.field.begin_transition(change);
                }
                DialogueEffect::StartScenario(script) => self.start_scenario(&script, audio),
            }
        }
        if self.active != ActiveScene::Field {
            return;
        }

        let mut env = FieldEnv {
            maps: &self.registries.maps,
            images: &mut self.images,
            audio,
        };
        let event = self.field.update(
            input,
            self.dialogue.is_active(),
            &mut self.player,
            &self.npcs,
            &mut env,
        );
        if event == FieldEvent::TalkRequested {
            if let Some(map_id) = self.field.map_id() {
                self.dialogue.try_talk(map_id, self.player.tile, &self.npcs);
            }
        }
    }

    fn toggle_overlay(&mut self, overlay: Overlay, audio: &mut dyn AudioService) {
        if self.overlay == Some(overlay) {
            self.overlay = None;
            audio.play_effect(CHEST_CLOSE_EFFECT);
        } else {
            self.overlay = Some(overlay);
            audio.play_effect(CHEST_OPEN_EFFECT);
        }
    }

    fn update_novel(&mut self, input: &InputSnapshot, audio: &mut dyn AudioService) {
        if self.novel.update(input, &mut self.player) == NovelStatus::Finished {
            self.return_to_field(audio);
        }
    }

    fn render_field(&mut self, canvas: &mut dyn Canvas) {
        self.field
            .draw(canvas, &self.player, &self.npcs, &mut self.images);
        if let Some(objective) = self.registries.game.current_objective(&self.player) {
            ui::draw_objective_bar(canvas, objective);
        }
        ui::draw_items_line(canvas, &self.player.items);
        self.dialogue.draw(canvas, &self.npcs);
        match self.overlay {
            Some(Overlay::Inventory) => ui::draw_inventory_overlay(canvas, &self.player.items),
            Some(Overlay::Map) => {
                let area = ui::draw_map_overlay_frame(canvas);
                self.field
                    .draw_overview(canvas, area, &self.player, &mut self.images);
            }
            None => {}
        }
        if let Some(toast) = self.toast.as_ref() {
            ui::draw_toast(canvas, toast.text);
        }
        self.field.draw_transition_mask(canvas);
    }
}

impl Scene for SceneOrchestrator {
    fn load(&mut self, audio: &mut dyn AudioService) {
        audio.stop_music();
        info!(
            maps = self.registries.maps.len(),
            npcs = self.registries.npcs.len(),
            "title_shown"
        );
    }

    fn update(&mut self, input: &InputSnapshot, audio: &mut dyn AudioService) -> SceneCommand {
        if input.pressed(InputAction::Quit) {
            info!(reason = "quit_key", scene = ?self.active, "shutdown_requested");
            return SceneCommand::Quit;
        }
        match self.active {
            ActiveScene::Title => self.update_title(input, audio),
            ActiveScene::Field => self.update_field(input, audio),
            ActiveScene::VisualNovel => self.update_novel(input, audio),
        }
        self.tick_toast();
        SceneCommand::None
    }

    fn render(&mut self, canvas: &mut dyn Canvas) {
        match self.active {
            ActiveScene::Title => self.title.draw(
                canvas,
                &mut self.images,
                &self.registries.game.title,
                self.registries.game.title_image.as_deref(),
            ),
            ActiveScene::Field => self.render_field(canvas),
            ActiveScene::VisualNovel => self.novel.draw(canvas, &mut self.images),
        }
    }

    fn unload(&mut self, audio: &mut dyn AudioService) {
        audio.stop_music();
        info!(scene = ?self.active, "session_closed");
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use quizfield_engine::FrameCanvas;
    use tempfile::TempDir;

    use super::*;
    use crate::state::TilePos;
    use crate::test_support::{registries, RecordingAudio};

    const MAPS: &str = r#"{
        "meadow": {
            "walkable": {"kind": "tiles", "width": 8, "height": 8},
            "bgm": "meadow.mp3"
        },
        "harbor": {
            "walkable": {"kind": "tiles", "width": 8, "height": 8},
            "bgm": "harbor.mp3"
        }
    }"#;

    const NPCS: &str = r#"{
        "ferryman": {
            "map_id": "meadow",
            "position": [3, 2],
            "lines": ["The ferry leaves now."],
            "reward": ["ticket"],
            "map_trigger": {"map": "harbor", "dest_x": 4, "dest_y": 6},
            "novel_trigger": "crossing"
        }
    }"#;

    const SCRIPTS: &str = r#"{
        "opening": {"bgm": "opening.mp3", "steps": [
            {"speaker": "Guide", "text": "Welcome."},
            {"text": "Off you go.", "set_flag": "intro_done"}
        ]},
        "crossing": [{"text": "The boat rocks gently."}]
    }"#;

    const GAME: &str = r#"{
        "start_map": "meadow",
        "start_position": [2, 2],
        "title_image": null,
        "objectives": [
            {"text": "Watch the intro", "until_flag": "intro_done"},
            {"text": "Find the ferry"}
        ]
    }"#;

    impl SceneOrchestrator {
        fn active_scene(&self) -> ActiveScene {
            self.active
        }
    }

    struct Harness {
        scene: SceneOrchestrator,
        audio: RecordingAudio,
        _temp: TempDir,
    }

    impl Harness {
        fn new(game: &str) -> Self {
            let temp = TempDir::new().expect("tempdir");
            let scene = SceneOrchestrator::new(
                registries(MAPS, NPCS, SCRIPTS, game),
                ImageStore::new(temp.path().join("img")),
                JsonSaveStore::new(temp.path().join("saves").join("save.json")),
                900,
                700,
            );
            let mut harness = Self {
                scene,
                audio: RecordingAudio::default(),
                _temp: temp,
            };
            harness.scene.load(&mut harness.audio);
            harness
        }

        fn press(&mut self, action: InputAction) -> SceneCommand {
            let input = InputSnapshot::empty().with_pressed(action);
            self.scene.update(&input, &mut self.audio)
        }

        fn idle(&mut self, frames: usize) {
            for _ in 0..frames {
                self.scene.update(&InputSnapshot::empty(), &mut self.audio);
            }
        }

        fn start_and_skip_opening(&mut self) {
            self.press(InputAction::Confirm);
            assert_eq!(self.scene.active_scene(), ActiveScene::VisualNovel);
            self.press(InputAction::Confirm);
            self.press(InputAction::Confirm);
            assert_eq!(self.scene.active_scene(), ActiveScene::Field);
        }
    }

    #[test]
    fn opening_script_plays_before_the_field() {
        let mut harness = Harness::new(GAME);
        assert_eq!(harness.scene.active_scene(), ActiveScene::Title);
        harness.press(InputAction::Confirm);
        assert_eq!(harness.audio.current_music(), Some("opening.mp3"));

        harness.press(InputAction::Confirm);
        harness.press(InputAction::Confirm);
        assert_eq!(harness.scene.active_scene(), ActiveScene::Field);
        assert_eq!(harness.scene.field.map_id(), Some("meadow"));
        assert_eq!(harness.scene.player.tile, TilePos::new(2, 2));
        assert!(harness.scene.player.flag("intro_done"));
        assert_eq!(harness.audio.current_music(), Some("meadow.mp3"));
    }

    #[test]
    fn missing_opening_script_goes_straight_to_the_field() {
        let mut harness = Harness::new(
            r#"{"start_map": "meadow", "start_position": [1, 1], "opening_script": "nope"}"#,
        );
        harness.press(InputAction::PointerPrimary);
        assert_eq!(harness.scene.active_scene(), ActiveScene::Field);
        assert_eq!(harness.scene.field.map_id(), Some("meadow"));
    }

    #[test]
    fn quit_ends_the_program_from_any_scene() {
        let mut harness = Harness::new(GAME);
        assert_eq!(harness.press(InputAction::Quit), SceneCommand::Quit);
        harness.press(InputAction::Confirm);
        assert_eq!(harness.press(InputAction::Quit), SceneCommand::Quit);
        harness.press(InputAction::Confirm);
        harness.press(InputAction::Confirm);
        assert_eq!(harness.press(InputAction::Quit), SceneCommand::Quit);
    }

    #[test]
    fn scenario_plays_before_the_deferred_map_change() {
        let mut harness = Harness::new(GAME);
        harness.start_and_skip_opening();

        harness.press(InputAction::Confirm);
        assert!(harness.scene.dialogue.is_active());
        harness.idle(20);
        harness.press(InputAction::Confirm);
        assert_eq!(harness.scene.active_scene(), ActiveScene::VisualNovel);
        assert_eq!(harness.scene.player.items, vec!["ticket".to_string()]);
        assert_eq!(harness.scene.field.map_id(), Some("meadow"));

        harness.press(InputAction::Confirm);
        assert_eq!(harness.scene.active_scene(), ActiveScene::Field);
        assert!(harness.scene.field.is_transitioning());

        let mut frames = 0;
        while harness.scene.field.is_transitioning() {
            frames += 1;
            assert!(frames < 500, "transition never ended");
            harness.idle(1);
        }
        assert_eq!(harness.scene.field.map_id(), Some("harbor"));
        assert_eq!(harness.scene.player.tile, TilePos::new(4, 6));
        assert_eq!(harness.audio.current_music(), Some("harbor.mp3"));
    }

    #[test]
    fn save_and_load_round_trip_through_the_store() {
        let mut harness = Harness::new(GAME);
        harness.start_and_skip_opening();
        harness.scene.player.grant_items(&["shell".to_string()]);
        harness.press(InputAction::Save);
        assert!(harness.scene.save_store.path().is_file());

        harness.scene.player.tile = TilePos::new(6, 6);
        harness.scene.player.items.clear();
        harness.press(InputAction::Load);
        assert_eq!(harness.scene.player.tile, TilePos::new(2, 2));
        assert_eq!(harness.scene.player.items, vec!["shell".to_string()]);
        assert!(harness.scene.player.flag("intro_done"));
    }

    #[test]
    fn title_continue_restores_the_saved_map() {
        let mut harness = Harness::new(GAME);
        harness.press(InputAction::Load);
        assert_eq!(harness.scene.active_scene(), ActiveScene::Title);

        let path = harness.scene.save_store.path().to_path_buf();
        fs::create_dir_all(path.parent().expect("parent")).expect("dir");
        fs::write(&path, r#"{"x": 5, "y": 1, "items": [], "map": "harbor"}"#).expect("write");
        harness.press(InputAction::Load);
        assert_eq!(harness.scene.active_scene(), ActiveScene::Field);
        assert_eq!(harness.scene.field.map_id(), Some("harbor"));
        assert_eq!(harness.scene.player.tile, TilePos::new(5, 1));
    }

    fn write_save(harness: &Harness, json: &str) {
        let path = harness.scene.save_store.path().to_path_buf();
        fs::create_dir_all(path.parent().expect("parent")).expect("dir");
        fs::write(&path, json).expect("write");
    }

    #[test]
    fn continue_with_a_removed_map_resumes_at_the_start() {
        let mut harness = Harness::new(GAME);
        write_save(&harness, r#"{"x": 3, "y": 3, "items": ["shell"], "map": "removed_map"}"#);
        harness.press(InputAction::Load);
        assert_eq!(harness.scene.active_scene(), ActiveScene::Field);
        assert_eq!(harness.scene.field.map_id(), Some("meadow"));
        assert_eq!(harness.scene.player.tile, TilePos::new(2, 2));
        assert_eq!(harness.scene.player.items, vec!["shell".to_string()]);

        let held = InputSnapshot::empty().with_action_down(InputAction::MoveDown, true);
        for _ in 0..5 {
            harness.scene.update(&held, &mut harness.audio);
        }
        harness.idle(1);
        assert_eq!(harness.scene.player.tile, TilePos::new(2, 3));
    }

    #[test]
    fn saved_position_outside_the_map_falls_back_to_the_start_tile() {
        let mut harness = Harness::new(GAME);
        write_save(&harness, r#"{"x": 40, "y": -2, "items": [], "map": "harbor"}"#);
        harness.press(InputAction::Load);
        assert_eq!(harness.scene.field.map_id(), Some("harbor"));
        assert_eq!(harness.scene.player.tile, TilePos::new(2, 2));
    }

    #[test]
    fn save_is_refused_when_no_map_can_be_loaded() {
        let mut harness = Harness::new(
            r#"{"start_map": "nowhere", "start_position": [1, 1], "opening_script": null}"#,
        );
        write_save(&harness, r#"{"x": 1, "y": 1, "items": [], "map": "removed_map"}"#);
        harness.press(InputAction::Load);
        assert_eq!(harness.scene.active_scene(), ActiveScene::Title);
        assert_eq!(harness.scene.field.map_id(), None);
    }

    #[test]
    fn malformed_save_is_treated_as_missing() {
        let mut harness = Harness::new(GAME);
        let path = harness.scene.save_store.path().to_path_buf();
        fs::create_dir_all(path.parent().expect("parent")).expect("dir");
        fs::write(&path, "{not json").expect("write");
        harness.press(InputAction::Load);
        assert_eq!(harness.scene.active_scene(), ActiveScene::Title);
    }

    #[test]
    fn overlays_suspend_movement_and_play_chest_effects() {
        let mut harness = Harness::new(GAME);
        harness.start_and_skip_opening();
        harness.press(InputAction::ToggleInventory);
        assert_eq!(harness.audio.effects, vec![CHEST_OPEN_EFFECT.to_string()]);

        let held = InputSnapshot::empty().with_action_down(InputAction::MoveDown, true);
        for _ in 0..10 {
            harness.scene.update(&held, &mut harness.audio);
        }
        assert_eq!(harness.scene.player.tile, TilePos::new(2, 2));

        harness.press(InputAction::ToggleMap);
        assert_eq!(harness.scene.overlay, Some(Overlay::Map));
        harness.press(InputAction::ToggleMap);
        assert_eq!(harness.scene.overlay, None);
        assert_eq!(harness.audio.effects.last().map(String::as_str), Some(CHEST_CLOSE_EFFECT));
    }

    #[test]
    fn field_render_draws_hud_over_the_map() {
        let mut harness = Harness::new(GAME);
        harness.start_and_skip_opening();
        let mut frame = vec![0_u8; 900 * 700 * 4];
        let mut canvas = FrameCanvas::new(&mut frame, 900, 700);
        harness.scene.render(&mut canvas);
        assert_eq!(canvas.pixel(899, 31), Some(quizfield_engine::Rgba::WHITE));
    }
}
