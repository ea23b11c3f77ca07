use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use quizfield_engine::write_text_atomic;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::state::{PlayerState, TilePos};

/// Flat snapshot of player progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct SaveRecord {
    pub(crate) x: i32,
    pub(crate) y: i32,
    #[serde(default)]
    pub(crate) items: Vec<String>,
    #[serde(default)]
    pub(crate) flags: BTreeMap<String, bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) map: Option<String>,
}

impl SaveRecord {
    pub(crate) fn capture(player: &PlayerState, map: Option<&str>) -> Self {
        Self {
            x: player.tile.x,
            y: player.tile.y,
            items: player.items.clone(),
            flags: player.flags.clone(),
            map: map.map(str::to_string),
        }
    }

    /// Copies the snapshot into `player`. Facing is not part of a save.
    pub(crate) fn restore_into(&self, player: &mut PlayerState) {
        player.tile = TilePos::new(self.x, self.y);
        player.items = self.items.clone();
        player.flags = self.flags.clone();
    }
}

#[derive(Debug, Error)]
pub(crate) enum SaveError {
    #[error("read save at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parse save json at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_path_to_error::Error<serde_json::Error>,
    },
    #[error("encode save json: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("write save at {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone)]
pub(crate) struct JsonSaveStore {
    path: PathBuf,
}

impl JsonSaveStore {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when no save exists yet.
    pub(crate) fn load(&self) -> Result<Option<SaveRecord>, SaveError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SaveError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        let mut deserializer = serde_json::Deserializer::from_str(&raw);
        let record = serde_path_to_error::deserialize(&mut deserializer).map_err(|source| {
            SaveError::Parse {
                path: self.path.clone(),
                source,
            }
        })?;
        Ok(Some(record))
    }

    pub(crate) fn store(&self, record: &SaveRecord) -> Result<(), SaveError> {
        let text = serde_json::to_string_pretty(record).map_err(SaveError::Encode)?;
        write_text_atomic(&self.path, &text).map_err(|source| SaveError::Write {
            path: self.path.clone(),
            source,
        })?;
        info!(path = %self.path.display(), items = record.items.len(), "save_written");
        Ok(())
    }
}
