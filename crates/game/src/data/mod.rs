mod game;
mod maps;
mod npcs;
mod scripts;

use std::path::Path;

use quizfield_engine::load_json_document_or_default;
use tracing::info;

pub(crate) use game::GameConfig;
pub(crate) use maps::{MapDefinition, MapRegistry, SamplingPolicy, SeaRule, WalkableSource};
pub(crate) use npcs::{validate_npcs, NpcDefinition, Quiz, QuizKind, QuizSet};
#[cfg(test)]
pub(crate) use npcs::{IdleMotion, MapTrigger};
pub(crate) use scripts::{CharacterChange, ScriptRegistry, VnScript};

const MAPS_FILE: &str = "maps.json";
const NPCS_FILE: &str = "npcs.json";
const SCRIPTS_FILE: &str = "scripts.json";
const GAME_FILE: &str = "game.json";

/// Every content document, validated once at startup.
#[derive(Debug, Default)]
pub(crate) struct Registries {
    pub(crate) maps: MapRegistry,
    pub(crate) npcs: Vec<NpcDefinition>,
    pub(crate) scripts: ScriptRegistry,
    pub(crate) game: GameConfig,
}

impl Registries {
    pub(crate) fn load(data_dir: &Path) -> Self {
        let maps = MapRegistry::from_raw(load_json_document_or_default(&data_dir.join(MAPS_FILE)));
        let npcs = validate_npcs(load_json_document_or_default(&data_dir.join(NPCS_FILE)));
        let scripts =
            ScriptRegistry::from_raw(load_json_document_or_default(&data_dir.join(SCRIPTS_FILE)));
        let game: GameConfig = load_json_document_or_default(&data_dir.join(GAME_FILE));

        info!(
            maps = maps.len(),
            npcs = npcs.len(),
            scripts = scripts.len(),
            start_map = %game.start_map,
            "content_loaded"
        );
        Self {
            maps,
            npcs,
            scripts,
            game,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn missing_and_malformed_documents_degrade_to_empty() {
        let temp = TempDir::new().expect("tempdir");
        fs::write(temp.path().join(NPCS_FILE), "[1, 2").expect("write npcs");
        fs::write(
            temp.path().join(MAPS_FILE),
            r#"{"world": {"walkable": {"kind": "tiles", "width": 3, "height": 3}}}"#,
        )
        .expect("write maps");

        let registries = Registries::load(temp.path());
        assert!(registries.maps.get("world").is_some());
        assert!(registries.npcs.is_empty());
        assert_eq!(registries.scripts.len(), 0);
        assert_eq!(registries.game, GameConfig::default());
    }
}
