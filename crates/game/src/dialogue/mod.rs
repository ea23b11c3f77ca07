mod quiz;

use quizfield_engine::{Canvas, InputAction, InputSnapshot, Rgba, ScreenRect, TextStyle};
use tracing::{debug, info};

use self::quiz::{QuizInput, QuizProgress};
use crate::data::QuizSet;
use crate::field::NpcRoster;
use crate::state::{MapChange, PlayerState, TilePos};
use crate::ui;

/// Frames of ignored input after a conversation opens or changes state.
pub(crate) const OPEN_DEBOUNCE_FRAMES: u32 = 15;
pub(crate) const STEP_DEBOUNCE_FRAMES: u32 = 15;
/// Longer cooldown after closing so the closing press cannot reopen the talk.
pub(crate) const CLOSE_DEBOUNCE_FRAMES: u32 = 20;

/// Requests a finished conversation hands back to the scene owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DialogueEffect {
    StartScenario(String),
    /// Change map once the scenario that follows has ended.
    DeferTransition(MapChange),
    BeginTransition(MapChange),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Phase {
    Lines,
    Quiz(QuizProgress),
    Result { quiz_done: bool },
    Blocked,
}

#[derive(Debug, Clone)]
struct DialogueSession {
    npc: usize,
    lines: Vec<String>,
    line_index: usize,
    phase: Phase,
}

enum Next {
    Stay,
    Close,
    AfterLines,
    Finalize,
    Answered { correct: bool },
}

#[derive(Debug, Default)]
pub(crate) struct DialogueEngine {
    session: Option<DialogueSession>,
    wait_frames: u32,
}

impl DialogueEngine {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Opens a conversation with the first NPC one tile away, if any.
    pub(crate) fn try_talk(&mut self, map_id: &str, tile: TilePos, npcs: &NpcRoster) -> bool {
        if self.session.is_some() || self.wait_frames > 0 {
            return false;
        }
        let Some((index, npc)) = npcs
            .adjacent_to(map_id, tile)
            .and_then(|index| npcs.get(index).map(|npc| (index, npc)))
        else {
            return false;
        };
        info!(npc = %npc.def.id, quiz_done = npc.quiz_done, "dialogue_opened");
        self.session = Some(DialogueSession {
            npc: index,
            lines: npc.def.lines.clone(),
            line_index: 0,
            phase: Phase::Lines,
        });
        self.wait_frames = OPEN_DEBOUNCE_FRAMES;
        true
    }

    pub(crate) fn close(&mut self) {
        if self.session.take().is_some() {
            debug!("dialogue_closed");
            self.wait_frames = CLOSE_DEBOUNCE_FRAMES;
        }
    }

    pub(crate) fn update(
        &mut self,
        input: &InputSnapshot,
        player: &mut PlayerState,
        npcs: &mut NpcRoster,
    ) -> Vec<DialogueEffect> {
        if self.wait_frames > 0 {
            self.wait_frames -= 1;
            return Vec::new();
        }
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };

        let next = if input.pressed(InputAction::Cancel) {
            Next::Close
        } else if let Phase::Quiz(progress) = &mut session.phase {
            let quiz = npcs
                .get(session.npc)
                .and_then(|npc| npc.def.quiz.as_ref())
                .and_then(|set| set.question(progress.index));
            match quiz.map(|quiz| progress.handle(quiz, input)) {
                Some(QuizInput::Pending) => Next::Stay,
                Some(QuizInput::Answered { correct }) => Next::Answered { correct },
                None => Next::Finalize,
            }
        } else if input.pressed(InputAction::Confirm) {
            session.line_index += 1;
            if session.line_index < session.lines.len() {
                Next::Stay
            } else {
                match session.phase {
                    Phase::Lines => Next::AfterLines,
                    Phase::Result { quiz_done: true } => Next::Finalize,
                    _ => Next::Close,
                }
            }
        } else {
            Next::Stay
        };

        match next {
            Next::Stay => Vec::new(),
            Next::Close => {
                self.close();
                Vec::new()
            }
            Next::AfterLines => {
                let has_open_quiz = npcs
                    .get(session.npc)
                    .is_some_and(|npc| npc.def.quiz.is_some() && !npc.quiz_done);
                if has_open_quiz {
                    session.phase = Phase::Quiz(QuizProgress::default());
                    session.lines.clear();
                    session.line_index = 0;
                    self.wait_frames = STEP_DEBOUNCE_FRAMES;
                    Vec::new()
                } else {
                    self.finalize(player, npcs)
                }
            }
            Next::Finalize => self.finalize(player, npcs),
            Next::Answered { correct } => {
                self.resolve_answer(correct, player, npcs);
                Vec::new()
            }
        }
    }

    fn resolve_answer(&mut self, correct: bool, player: &mut PlayerState, npcs: &mut NpcRoster) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(npc) = npcs.get_mut(session.npc) else {
            self.close();
            return;
        };
        let Phase::Quiz(progress) = &mut session.phase else {
            return;
        };
        debug!(npc = %npc.def.id, question = progress.index, correct, "quiz_answered");

        let (lines, quiz_done) = match npc.def.quiz.as_ref() {
            Some(QuizSet::Sequence(quizzes)) if correct => {
                if progress.index + 1 < quizzes.len() {
                    progress.next_question();
                    self.wait_frames = STEP_DEBOUNCE_FRAMES;
                    return;
                }
                npc.quiz_done = true;
                let mut lines = vec!["All correct! Well done.".to_string()];
                if !npc.reward_granted && !npc.def.reward.is_empty() {
                    player.grant_items(&npc.def.reward);
                    npc.reward_granted = true;
                    lines.extend(npc.def.reward.iter().map(|item| format!("You got {item}!")));
                }
                info!(npc = %npc.def.id, questions = quizzes.len(), "quiz_completed");
                (lines, true)
            }
            Some(QuizSet::Sequence(_)) => (
                vec![
                    "Wrong answer.".to_string(),
                    "Start again from the first question.".to_string(),
                ],
                false,
            ),
            Some(QuizSet::Single(quiz)) if correct => {
                npc.quiz_done = true;
                player.grant_items(&quiz.reward);
                let mut lines = vec!["Correct!".to_string()];
                lines.extend(quiz.reward.iter().map(|item| format!("You got {item}!")));
                info!(npc = %npc.def.id, "quiz_completed");
                (lines, true)
            }
            Some(QuizSet::Single(_)) => (vec!["Wrong answer. Try again.".to_string()], false),
            None => {
                self.close();
                return;
            }
        };

        session.phase = Phase::Result { quiz_done };
        session.lines = lines;
        session.line_index = 0;
        self.wait_frames = STEP_DEBOUNCE_FRAMES;
    }

    /// Grants the one-time reward, sets flags and emits the NPC's triggers.
    fn finalize(&mut self, player: &mut PlayerState, npcs: &mut NpcRoster) -> Vec<DialogueEffect> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        let Some(npc) = npcs.get_mut(session.npc) else {
            self.close();
            return Vec::new();
        };

        if !npc.reward_granted && !npc.def.reward.is_empty() {
            player.grant_items(&npc.def.reward);
            npc.reward_granted = true;
            info!(npc = %npc.def.id, items = npc.def.reward.len(), "npc_reward_granted");
        }
        for flag in &npc.def.set_flags {
            player.set_flag(flag);
        }

        let mut effects = Vec::new();
        if let Some(trigger) = npc.def.map_trigger.as_ref() {
            let missing_item = trigger
                .required_item
                .as_deref()
                .filter(|item| !player.has_item(item));
            if let Some(item) = missing_item {
                info!(npc = %npc.def.id, item, "map_trigger_blocked_missing_item");
                session.phase = Phase::Blocked;
                session.lines = vec![trigger.blocked_text(item)];
                session.line_index = 0;
                self.wait_frames = STEP_DEBOUNCE_FRAMES;
                return effects;
            }
            if npc.def.novel_trigger.is_some() {
                effects.push(DialogueEffect::DeferTransition(trigger.change.clone()));
            } else {
                effects.push(DialogueEffect::BeginTransition(trigger.change.clone()));
            }
        }
        if let Some(script) = npc.def.novel_trigger.as_ref() {
            effects.push(DialogueEffect::StartScenario(script.clone()));
        }
        debug!(npc = %npc.def.id, effects = effects.len(), "dialogue_finalized");
        self.close();
        effects
    }

    fn visible_lines(&self, npcs: &NpcRoster) -> Vec<String> {
        let Some(session) = self.session.as_ref() else {
            return Vec::new();
        };
        match &session.phase {
            Phase::Quiz(progress) => npcs
                .get(session.npc)
                .and_then(|npc| npc.def.quiz.as_ref())
                .and_then(|set| set.question(progress.index))
                .map(|quiz| progress.display_lines(quiz))
                .unwrap_or_default(),
            _ => session
                .lines
                .get(session.line_index.min(session.lines.len().saturating_sub(1)))
                .cloned()
                .into_iter()
                .collect(),
        }
    }

    pub(crate) fn draw(&self, canvas: &mut dyn Canvas, npcs: &NpcRoster) {
        if self.session.is_none() {
            return;
        }
        let (width, height) = canvas.size();
        let rect = dialogue_rect(width as i32, height as i32);
        let style = TextStyle::new(Rgba::WHITE);
        let wrapped = self
            .visible_lines(npcs)
            .iter()
            .flat_map(|line| ui::wrap_text(line, ui::chars_per_line(rect.width, style)))
            .collect::<Vec<_>>();
        let lines = wrapped.iter().map(String::as_str).collect::<Vec<_>>();
        canvas.draw_text_block(&lines, rect, style);
    }
}

fn dialogue_rect(screen_width: i32, screen_height: i32) -> ScreenRect {
    let height = screen_height * 3 / 10;
    ScreenRect::new(
        screen_width / 10,
        screen_height - height - 20,
        screen_width * 8 / 10,
        height,
    )
}
