use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::state::{MapChange, TilePos};

pub(crate) type RawNpcDocument = BTreeMap<String, RawNpc>;

const DEFAULT_BOB_SPEED: f32 = 0.5;
const DEFAULT_BOB_MAX_OFFSET: f32 = 8.0;

#[derive(Debug, Deserialize)]
pub(crate) struct RawNpc {
    map_id: String,
    position: [i32; 2],
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    lines: Vec<String>,
    #[serde(default)]
    quiz: Option<RawQuizSpec>,
    #[serde(default)]
    reward: Vec<String>,
    #[serde(default)]
    map_trigger: Option<RawMapTrigger>,
    #[serde(default)]
    novel_trigger: Option<String>,
    #[serde(default)]
    set_flags: Vec<String>,
    #[serde(default)]
    movement_x: Option<RawMovement>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawQuizSpec {
    Sequence(Vec<RawQuiz>),
    Single(RawQuiz),
}

#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
enum RawQuizKind {
    #[default]
    Choice,
    Text,
}

#[derive(Debug, Deserialize)]
struct RawQuiz {
    #[serde(rename = "type", default)]
    kind: RawQuizKind,
    #[serde(default)]
    question: String,
    #[serde(default)]
    choices: Vec<String>,
    #[serde(default)]
    answer: Option<Value>,
    #[serde(default)]
    reward: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawMapTrigger {
    map: String,
    #[serde(default)]
    dest_x: Option<i32>,
    #[serde(default)]
    dest_y: Option<i32>,
    #[serde(default)]
    required_item: Option<String>,
    #[serde(default)]
    blocked_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawMovement {
    #[serde(default)]
    enabled: bool,
    #[serde(default = "default_bob_speed")]
    speed: f32,
    #[serde(default = "default_bob_max_offset")]
    max_offset: f32,
}

fn default_bob_speed() -> f32 {
    DEFAULT_BOB_SPEED
}

fn default_bob_max_offset() -> f32 {
    DEFAULT_BOB_MAX_OFFSET
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum QuizKind {
    Choice { choices: Vec<String>, answer: usize },
    Text { answer: String },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Quiz {
    pub(crate) prompt: String,
    pub(crate) kind: QuizKind,
    pub(crate) reward: Vec<String>,
}

impl Quiz {
    pub(crate) fn is_correct_choice(&self, selected: usize) -> bool {
        match &self.kind {
            QuizKind::Choice { choices, answer } => !choices.is_empty() && selected == *answer,
            QuizKind::Text { .. } => false,
        }
    }

    pub(crate) fn is_correct_text(&self, input: &str) -> bool {
        match &self.kind {
            QuizKind::Text { answer } => input.trim() == answer,
            QuizKind::Choice { .. } => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum QuizSet {
    Single(Quiz),
    /// Must be answered in order; any miss restarts from the first.
    Sequence(Vec<Quiz>),
}

impl QuizSet {
    pub(crate) fn question(&self, index: usize) -> Option<&Quiz> {
        match self {
            QuizSet::Single(quiz) => (index == 0).then_some(quiz),
            QuizSet::Sequence(quizzes) => quizzes.get(index),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MapTrigger {
    pub(crate) change: MapChange,
    pub(crate) required_item: Option<String>,
    pub(crate) blocked_message: Option<String>,
}

impl MapTrigger {
    pub(crate) fn blocked_text(&self, item: &str) -> String {
        self.blocked_message
            .clone()
            .unwrap_or_else(|| format!("You need {item} to go on."))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct IdleMotion {
    pub(crate) speed: f32,
    pub(crate) max_offset: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NpcDefinition {
    pub(crate) id: String,
    pub(crate) map_id: String,
    pub(crate) tile: TilePos,
    pub(crate) image: Option<String>,
    pub(crate) lines: Vec<String>,
    pub(crate) quiz: Option<QuizSet>,
    pub(crate) reward: Vec<String>,
    pub(crate) map_trigger: Option<MapTrigger>,
    pub(crate) novel_trigger: Option<String>,
    pub(crate) set_flags: Vec<String>,
    pub(crate) idle_motion: Option<IdleMotion>,
}

/// Validates every record, in id order.
pub(crate) fn validate_npcs(raw: RawNpcDocument) -> Vec<NpcDefinition> {
    raw.into_iter()
        .map(|(id, npc)| validate_npc(id, npc))
        .collect()
}

fn validate_npc(id: String, raw: RawNpc) -> NpcDefinition {
    let quiz = raw.quiz.and_then(|spec| match spec {
        RawQuizSpec::Single(quiz) => Some(QuizSet::Single(validate_quiz(&id, quiz))),
        RawQuizSpec::Sequence(quizzes) if quizzes.is_empty() => {
            warn!(npc = %id, "npc_quiz_list_empty_ignored");
            None
        }
        RawQuizSpec::Sequence(quizzes) => Some(QuizSet::Sequence(
            quizzes
                .into_iter()
                .map(|quiz| validate_quiz(&id, quiz))
                .collect(),
        )),
    });
    let map_trigger = raw.map_trigger.map(|trigger| MapTrigger {
        change: MapChange::from_parts(trigger.map, trigger.dest_x, trigger.dest_y),
        required_item: trigger.required_item,
        blocked_message: trigger.blocked_message,
    });
    let idle_motion = raw
        .movement_x
        .filter(|movement| movement.enabled)
        .map(|movement| IdleMotion {
            speed: movement.speed.abs(),
            max_offset: movement.max_offset.abs(),
        });

    NpcDefinition {
        tile: TilePos::new(raw.position[0], raw.position[1]),
        id,
        map_id: raw.map_id,
        image: raw.image,
        lines: raw.lines,
        quiz,
        reward: raw.reward,
        map_trigger,
        novel_trigger: raw.novel_trigger,
        set_flags: raw.set_flags,
        idle_motion,
    }
}

fn validate_quiz(npc_id: &str, raw: RawQuiz) -> Quiz {
    let kind = match raw.kind {
        RawQuizKind::Choice => {
            let answer = match raw.answer {
                Some(Value::Number(number)) => number
                    .as_u64()
                    .and_then(|index| usize::try_from(index).ok()),
                None => Some(0),
                Some(_) => None,
            };
            let answer = answer.unwrap_or_else(|| {
                warn!(npc = %npc_id, "quiz_answer_index_invalid_using_zero");
                0
            });
            if raw.choices.is_empty() {
                warn!(npc = %npc_id, "quiz_has_no_choices");
            }
            QuizKind::Choice {
                choices: raw.choices,
                answer,
            }
        }
        RawQuizKind::Text => {
            let answer = match raw.answer {
                Some(Value::String(text)) => text.trim().to_string(),
                Some(Value::Number(number)) => number.to_string(),
                _ => {
                    warn!(npc = %npc_id, "quiz_text_answer_missing");
                    String::new()
                }
            };
            QuizKind::Text { answer }
        }
    };
    Quiz {
        prompt: raw.question,
        kind,
        reward: raw.reward,
    }
}
