use std::collections::HashSet;

use quizfield_engine::{ImageStore, PixelImage};
use tracing::warn;

use super::TILE_SIZE;
use crate::data::{MapDefinition, SamplingPolicy, SeaRule, WalkableSource};
use crate::state::TilePos;

/// Footprint sample point inside a tile, slightly below its centre.
const FOOTPRINT_X: i32 = TILE_SIZE / 2;
const FOOTPRINT_Y: i32 = TILE_SIZE / 2 + 1;

/// Per-map walkable grid, computed once when the map loads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct CollisionField {
    width: i32,
    height: i32,
    walkable: Vec<bool>,
}

impl CollisionField {
    pub(crate) fn load(definition: &MapDefinition, images: &mut ImageStore) -> Self {
        match &definition.walkable {
            WalkableSource::Tiles { width, height, .. } => {
                Self::from_tiles(*width, *height, &definition.walkable.blocked_tiles())
            }
            WalkableSource::Image { sampling, sea } => {
                let image = definition.image.as_deref().and_then(|key| images.get(key));
                match image {
                    Some(image) => Self::from_image(&image, *sea, *sampling),
                    None => {
                        warn!(map = %definition.id, "collision_image_missing_map_blocked");
                        Self::default()
                    }
                }
            }
        }
    }

    pub(crate) fn from_tiles(width: i32, height: i32, blocked: &HashSet<TilePos>) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        let walkable = (0..height)
            .flat_map(|y| (0..width).map(move |x| TilePos::new(x, y)))
            .map(|tile| !blocked.contains(&tile))
            .collect();
        Self {
            width,
            height,
            walkable,
        }
    }

    pub(crate) fn from_image(image: &PixelImage, sea: SeaRule, sampling: SamplingPolicy) -> Self {
        let width = image.width() as i32 / TILE_SIZE;
        let height = image.height() as i32 / TILE_SIZE;
        let walkable = (0..height)
            .flat_map(|y| (0..width).map(move |x| TilePos::new(x, y)))
            .map(|tile| {
                let sample_x = tile.x * TILE_SIZE + FOOTPRINT_X;
                let sample_y = tile.y * TILE_SIZE + FOOTPRINT_Y;
                !footprint_is_sea(image, sample_x, sample_y, sea, sampling)
            })
            .collect();
        Self {
            width,
            height,
            walkable,
        }
    }

    pub(crate) fn width(&self) -> i32 {
        self.width
    }

    pub(crate) fn height(&self) -> i32 {
        self.height
    }

    pub(crate) fn in_bounds(&self, tile: TilePos) -> bool {
        (0..self.width).contains(&tile.x) && (0..self.height).contains(&tile.y)
    }

    pub(crate) fn is_walkable(&self, tile: TilePos) -> bool {
        if !self.in_bounds(tile) {
            return false;
        }
        let index = (tile.y * self.width + tile.x) as usize;
        self.walkable.get(index).copied().unwrap_or(false)
    }
}

fn footprint_is_sea(
    image: &PixelImage,
    center_x: i32,
    center_y: i32,
    sea: SeaRule,
    sampling: SamplingPolicy,
) -> bool {
    let width = image.width() as i32;
    let height = image.height() as i32;
    let block = (-1..=1).flat_map(|dy| (-1..=1).map(move |dx| (center_x + dx, center_y + dy)));

    match sampling {
        SamplingPolicy::Any => {
            // The whole 3x3 block must sit inside the image.
            let interior = (1..width - 1).contains(&center_x) && (1..height - 1).contains(&center_y);
            if !interior {
                return true;
            }
            block
                .filter_map(|(x, y)| image.pixel(x as u32, y as u32))
                .any(|pixel| sea.is_sea(pixel.0))
        }
        SamplingPolicy::Majority => {
            let samples = block
                .filter(|(x, y)| (0..width).contains(x) && (0..height).contains(y))
                .filter_map(|(x, y)| image.pixel(x as u32, y as u32))
                .map(|pixel| sea.is_sea(pixel.0))
                .collect::<Vec<_>>();
            let sea_count = samples.iter().filter(|is_sea| **is_sea).count();
            samples.is_empty() || sea_count * 2 >= samples.len()
        }
    }
}
