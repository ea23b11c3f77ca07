use std::collections::{BTreeMap, HashSet};

use serde::Deserialize;
use tracing::warn;

use crate::state::{MapChange, TilePos};

pub(crate) type RawMapDocument = BTreeMap<String, RawMap>;

#[derive(Debug, Deserialize)]
pub(crate) struct RawMap {
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    walkable: Option<WalkableSource>,
    #[serde(default)]
    exits: Vec<RawExit>,
    #[serde(default)]
    bgm: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawExit {
    x: i32,
    y: i32,
    target_map: String,
    #[serde(default)]
    dest_x: Option<i32>,
    #[serde(default)]
    dest_y: Option<i32>,
}

/// Colour predicate marking a pixel as impassable water.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub(crate) enum SeaRule {
    /// Saturated blue with a narrow green band, the painted sea colour.
    #[default]
    Band,
    /// Blue above `min_blue` and stronger than both other channels.
    BlueDominant {
        #[serde(default = "default_min_blue")]
        min_blue: u8,
    },
}

fn default_min_blue() -> u8 {
    100
}

impl SeaRule {
    pub(crate) fn is_sea(self, [r, g, b, _]: [u8; 4]) -> bool {
        match self {
            SeaRule::Band => r < 25 && (90..=155).contains(&g) && b >= 230,
            SeaRule::BlueDominant { min_blue } => b > r && b > g && b > min_blue,
        }
    }
}

/// How the 3x3 footprint block votes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum SamplingPolicy {
    /// Blocked when any sampled pixel is sea.
    #[default]
    Any,
    /// Blocked when at least half of the in-image samples are sea.
    Majority,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub(crate) enum WalkableSource {
    Image {
        #[serde(default)]
        sampling: SamplingPolicy,
        #[serde(default)]
        sea: SeaRule,
    },
    Tiles {
        width: i32,
        height: i32,
        #[serde(default)]
        blocked: Vec<[i32; 2]>,
    },
}

impl Default for WalkableSource {
    fn default() -> Self {
        WalkableSource::Image {
            sampling: SamplingPolicy::default(),
            sea: SeaRule::default(),
        }
    }
}

impl WalkableSource {
    pub(crate) fn tile_bounds(&self) -> Option<(i32, i32)> {
        match self {
            WalkableSource::Tiles { width, height, .. } => Some((*width, *height)),
            WalkableSource::Image { .. } => None,
        }
    }

    pub(crate) fn blocked_tiles(&self) -> HashSet<TilePos> {
        match self {
            WalkableSource::Tiles { blocked, .. } => blocked
                .iter()
                .map(|[x, y]| TilePos::new(*x, *y))
                .collect(),
            WalkableSource::Image { .. } => HashSet::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Exit {
    pub(crate) tile: TilePos,
    pub(crate) change: MapChange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MapDefinition {
    pub(crate) id: String,
    pub(crate) image: Option<String>,
    pub(crate) walkable: WalkableSource,
    pub(crate) exits: Vec<Exit>,
    pub(crate) bgm: Option<String>,
}

#[derive(Debug, Default)]
pub(crate) struct MapRegistry {
    maps: BTreeMap<String, MapDefinition>,
}

impl MapRegistry {
    pub(crate) fn from_raw(raw: RawMapDocument) -> Self {
        let maps = raw
            .into_iter()
            .map(|(id, raw_map)| {
                let definition = validate_map(&id, raw_map);
                (id, definition)
            })
            .collect::<BTreeMap<_, _>>();

        for definition in maps.values() {
            for exit in &definition.exits {
                if !maps.contains_key(&exit.change.map) {
                    warn!(
                        map = %definition.id,
                        target = %exit.change.map,
                        "map_exit_target_unknown"
                    );
                }
            }
        }
        Self { maps }
    }

    pub(crate) fn get(&self, id: &str) -> Option<&MapDefinition> {
        self.maps.get(id)
    }

    pub(crate) fn len(&self) -> usize {
        self.maps.len()
    }
}

fn validate_map(id: &str, raw: RawMap) -> MapDefinition {
    let walkable = raw.walkable.unwrap_or_default();
    if raw.image.is_none() && matches!(walkable, WalkableSource::Image { .. }) {
        warn!(map = %id, "map_has_no_image_for_collision");
    }
    let bounds = walkable.tile_bounds();
    let exits = raw
        .exits
        .into_iter()
        .filter_map(|exit| {
            let tile = TilePos::new(exit.x, exit.y);
            let in_bounds = bounds.map_or(true, |(width, height)| {
                (0..width).contains(&tile.x) && (0..height).contains(&tile.y)
            });
            if !in_bounds {
                warn!(map = %id, x = tile.x, y = tile.y, "map_exit_out_of_bounds_dropped");
                return None;
            }
            Some(Exit {
                tile,
                change: MapChange::from_parts(exit.target_map, exit.dest_x, exit.dest_y),
            })
        })
        .collect();

    MapDefinition {
        id: id.to_string(),
        image: raw.image,
        walkable,
        exits,
        bgm: raw.bgm,
    }
}
