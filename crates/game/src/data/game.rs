use serde::Deserialize;

use crate::state::{PlayerState, TilePos};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct Objective {
    pub(crate) text: String,
    /// Objective stays current until this flag is set. `None` never expires.
    #[serde(default)]
    pub(crate) until_flag: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub(crate) struct GameConfig {
    pub(crate) title: String,
    pub(crate) title_image: Option<String>,
    pub(crate) start_map: String,
    pub(crate) start_position: [i32; 2],
    pub(crate) opening_script: Option<String>,
    pub(crate) objectives: Vec<Objective>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            title: "QUIZFIELD".to_string(),
            title_image: Some("title.jpg".to_string()),
            start_map: "world".to_string(),
            start_position: [5, 5],
            opening_script: Some("opening".to_string()),
            objectives: Vec::new(),
        }
    }
}

impl GameConfig {
    pub(crate) fn start_tile(&self) -> TilePos {
        TilePos::new(self.start_position[0], self.start_position[1])
    }

    pub(crate) fn current_objective(&self, player: &PlayerState) -> Option<&str> {
        self.objectives
            .iter()
            .find(|objective| {
                objective
                    .until_flag
                    .as_deref()
                    .map_or(true, |flag| !player.flag(flag))
            })
            .map(|objective| objective.text.as_str())
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use quizfield_engine::parse_json_document;

    use super::*;

    #[test]
    fn partial_document_keeps_other_defaults() {
        let config: GameConfig =
            parse_json_document(r#"{"start_map": "harbor"}"#, Path::new("game.json"))
                .expect("game");
        assert_eq!(config.start_map, "harbor");
        assert_eq!(config.start_tile(), TilePos::new(5, 5));
        assert_eq!(config.opening_script.as_deref(), Some("opening"));
    }

    #[test]
    fn objective_advances_as_flags_are_set() {
        let config: GameConfig = parse_json_document(
            r#"{"objectives": [
                {"text": "Talk to the guide", "until_flag": "met_guide"},
                {"text": "Cross the sea", "until_flag": "crossed"},
                {"text": "Explore freely"}
            ]}"#,
            Path::new("game.json"),
        )
        .expect("game");
        let mut player = PlayerState::new(TilePos::new(0, 0));
        assert_eq!(config.current_objective(&player), Some("Talk to the guide"));
        player.set_flag("met_guide");
        player.set_flag("crossed");
        assert_eq!(config.current_objective(&player), Some("Explore freely"));
    }
}
