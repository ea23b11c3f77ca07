use std::path::Path;

use quizfield_engine::{parse_json_document, AudioService};

use crate::data::{GameConfig, MapRegistry, NpcDefinition, Registries, ScriptRegistry};
use crate::state::TilePos;

/// Records every audio request so tests can assert on music changes.
#[derive(Debug, Default)]
pub(crate) struct RecordingAudio {
    pub(crate) music: Option<String>,
    pub(crate) effects: Vec<String>,
    pub(crate) music_starts: Vec<String>,
}

impl AudioService for RecordingAudio {
    fn play_music(&mut self, track: &str) {
        if self.music.as_deref() != Some(track) {
            self.music = Some(track.to_string());
            self.music_starts.push(track.to_string());
        }
    }

    fn stop_music(&mut self) {
        self.music = None;
    }

    fn play_effect(&mut self, effect: &str) {
        self.effects.push(effect.to_string());
    }

    fn current_music(&self) -> Option<&str> {
        self.music.as_deref()
    }
}

pub(crate) fn registries(maps: &str, npcs: &str, scripts: &str, game: &str) -> Registries {
    Registries {
        maps: MapRegistry::from_raw(parse_json_document(maps, Path::new("maps.json")).expect("maps")),
        npcs: crate::data::validate_npcs(
            parse_json_document(npcs, Path::new("npcs.json")).expect("npcs"),
        ),
        scripts: ScriptRegistry::from_raw(
            parse_json_document(scripts, Path::new("scripts.json")).expect("scripts"),
        ),
        game: parse_json_document::<GameConfig>(game, Path::new("game.json")).expect("game"),
    }
}

pub(crate) fn npc_def(id: &str, map_id: &str, tile: TilePos) -> NpcDefinition {
    NpcDefinition {
        id: id.to_string(),
        map_id: map_id.to_string(),
        tile,
        image: None,
        lines: Vec::new(),
        quiz: None,
        reward: Vec::new(),
        map_trigger: None,
        novel_trigger: None,
        set_flags: Vec::new(),
        idle_motion: None,
    }
}
