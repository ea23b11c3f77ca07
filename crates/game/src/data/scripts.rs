use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::warn;

use crate::state::MapChange;

pub(crate) type RawScriptDocument = BTreeMap<String, RawScript>;

const CLEAR_CHARACTER: &str = "none";

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawScript {
    Steps(Vec<RawStep>),
    Full {
        #[serde(default)]
        bgm: Option<String>,
        steps: Vec<RawStep>,
    },
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawStep {
    #[serde(default)]
    bg: Option<String>,
    #[serde(default, rename = "char")]
    character: Option<String>,
    #[serde(default)]
    char_scale: Option<f32>,
    #[serde(default)]
    char_offset_y: Option<i32>,
    #[serde(default)]
    speaker: Option<String>,
    #[serde(default)]
    text: String,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    jump: Option<String>,
    #[serde(default)]
    choices: Vec<String>,
    #[serde(default)]
    correct: Option<usize>,
    #[serde(default)]
    on_correct: Option<String>,
    #[serde(default)]
    on_wrong: Option<String>,
    #[serde(default)]
    item: Option<String>,
    #[serde(default)]
    items: Vec<String>,
    #[serde(default)]
    next_map: Option<RawNextMap>,
    #[serde(default)]
    set_flag: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawNextMap {
    map: String,
    #[serde(default)]
    dest_x: Option<i32>,
    #[serde(default)]
    dest_y: Option<i32>,
}

/// Character slot change requested by a step. A step without `char` keeps
/// whatever is shown.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CharacterChange {
    Keep,
    Clear,
    Show {
        image: String,
        scale: Option<f32>,
        offset_y: i32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ChoicePrompt {
    pub(crate) options: Vec<String>,
    pub(crate) correct: Option<usize>,
    pub(crate) on_correct: Option<String>,
    pub(crate) on_wrong: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct VnStep {
    pub(crate) background: Option<String>,
    pub(crate) character: CharacterChange,
    pub(crate) speaker: Option<String>,
    pub(crate) text: String,
    pub(crate) label: Option<String>,
    pub(crate) jump: Option<String>,
    pub(crate) choice: Option<ChoicePrompt>,
    pub(crate) items: Vec<String>,
    pub(crate) next_map: Option<MapChange>,
    pub(crate) set_flag: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct VnScript {
    pub(crate) bgm: Option<String>,
    pub(crate) steps: Vec<VnStep>,
}

#[derive(Debug, Default)]
pub(crate) struct ScriptRegistry {
    scripts: BTreeMap<String, VnScript>,
}

impl ScriptRegistry {
    pub(crate) fn from_raw(raw: RawScriptDocument) -> Self {
        let scripts = raw
            .into_iter()
            .map(|(id, script)| {
                let (bgm, steps) = match script {
                    RawScript::Steps(steps) => (None, steps),
                    RawScript::Full { bgm, steps } => (bgm, steps),
                };
                if steps.is_empty() {
                    warn!(script = %id, "vn_script_empty");
                }
                let steps = steps.into_iter().map(validate_step).collect();
                (id, VnScript { bgm, steps })
            })
            .collect();
        Self { scripts }
    }

    pub(crate) fn get(&self, id: &str) -> Option<&VnScript> {
        self.scripts.get(id)
    }

    pub(crate) fn len(&self) -> usize {
        self.scripts.len()
    }
}

fn validate_step(raw: RawStep) -> VnStep {
    let character = match raw.character {
        None => CharacterChange::Keep,
        Some(name) if name.eq_ignore_ascii_case(CLEAR_CHARACTER) => CharacterChange::Clear,
        Some(image) => CharacterChange::Show {
            image,
            scale: raw.char_scale.filter(|scale| *scale > 0.0),
            offset_y: raw.char_offset_y.unwrap_or(0),
        },
    };
    let choice = (!raw.choices.is_empty()).then(|| ChoicePrompt {
        options: raw.choices,
        correct: raw.correct,
        on_correct: raw.on_correct,
        on_wrong: raw.on_wrong,
    });
    let mut items = raw.items;
    if let Some(item) = raw.item {
        items.insert(0, item);
    }

    VnStep {
        background: raw.bg,
        character,
        speaker: raw.speaker.filter(|speaker| !speaker.is_empty()),
        text: raw.text,
        label: raw.label,
        jump: raw.jump,
        choice,
        items,
        next_map: raw
            .next_map
            .map(|next| MapChange::from_parts(next.map, next.dest_x, next.dest_y)),
        set_flag: raw.set_flag,
    }
}
