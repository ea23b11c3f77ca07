mod collision;
mod npc;
mod transition;

use std::collections::HashMap;

use quizfield_engine::{
    AudioService, Canvas, ImageStore, InputAction, InputSnapshot, PixelImage, Rgba, ScreenRect,
};
use tracing::{debug, info, warn};

pub(crate) use npc::NpcRoster;
#[cfg(test)]
pub(crate) use npc::NpcState;

use self::collision::CollisionField;
use self::transition::{TransitionController, TransitionTick};

use crate::data::MapRegistry;
use crate::state::{Direction, MapChange, PlayerState, TilePos};

/// Source map pixels per tile.
pub(crate) const TILE_SIZE: i32 = 10;
pub(crate) const ZOOM: i32 = 2;
pub(crate) const SCALED_TILE: i32 = TILE_SIZE * ZOOM;
/// Map pixels advanced per frame during a step.
pub(crate) const MOVE_SPEED: i32 = 2;

const FIELD_BACKGROUND: Rgba = Rgba::rgb(50, 50, 80);
const WALKABLE_CELL: Rgba = Rgba::rgb(70, 130, 70);
const BLOCKED_CELL: Rgba = Rgba::rgb(30, 60, 150);
const NPC_PLACEHOLDER: Rgba = Rgba::rgb(230, 180, 60);
const PLAYER_MARKER: Rgba = Rgba::rgb(220, 40, 40);

pub(crate) const PLAYER_FRONT: &str = "character/player_front.png";
pub(crate) const PLAYER_BACK: &str = "character/player_back.png";
pub(crate) const PLAYER_RIGHT: &str = "character/player_right.png";

/// Collaborators the field needs while updating.
pub(crate) struct FieldEnv<'a> {
    pub(crate) maps: &'a MapRegistry,
    pub(crate) images: &'a mut ImageStore,
    pub(crate) audio: &'a mut dyn AudioService,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldEvent {
    None,
    TalkRequested,
}

#[derive(Debug, Clone, Copy)]
struct StepMotion {
    direction: Direction,
    offset: i32,
}

#[derive(Debug)]
struct LoadedMap {
    id: String,
    image: Option<String>,
    bgm: Option<String>,
    collision: CollisionField,
    exits: HashMap<TilePos, MapChange>,
}

/// Tile movement, exits and the iris transition for the current map.
#[derive(Debug)]
pub(crate) struct FieldController {
    map: Option<LoadedMap>,
    motion: Option<StepMotion>,
    transition: TransitionController,
}

impl FieldController {
    pub(crate) fn new(screen_width: u32, screen_height: u32) -> Self {
        Self {
            map: None,
            motion: None,
            transition: TransitionController::for_screen(screen_width, screen_height),
        }
    }

    /// Registers solid stand-ins for player sprites that fail to load.
    pub(crate) fn install_sprite_fallbacks(images: &mut ImageStore) {
        let fallbacks = [
            (PLAYER_FRONT, Rgba::rgb(255, 0, 0)),
            (PLAYER_BACK, Rgba::rgb(0, 255, 0)),
            (PLAYER_RIGHT, Rgba::rgb(0, 0, 255)),
        ];
        for (key, color) in fallbacks {
            if images.get(key).is_none() {
                let side = SCALED_TILE as u32;
                images.insert(key, PixelImage::solid(side, side, color));
            }
        }
    }

    pub(crate) fn map_id(&self) -> Option<&str> {
        self.map.as_ref().map(|map| map.id.as_str())
    }

    /// Whether `tile` lies inside the loaded map.
    pub(crate) fn contains(&self, tile: TilePos) -> bool {
        self.map
            .as_ref()
            .is_some_and(|map| map.collision.in_bounds(tile))
    }

    pub(crate) fn is_transitioning(&self) -> bool {
        self.transition.is_active()
    }

    pub(crate) fn reset(&mut self) {
        self.map = None;
        self.motion = None;
        self.transition.cancel();
    }

    /// Swaps in `id`. Unknown ids leave the current map untouched.
    pub(crate) fn load_map(&mut self, id: &str, env: &mut FieldEnv<'_>) -> bool {
        let Some(definition) = env.maps.get(id) else {
            warn!(map = %id, "map_unknown_ignored");
            return false;
        };
        let collision = CollisionField::load(definition, env.images);
        let exits = definition
            .exits
            .iter()
            .filter_map(|exit| {
                if collision.in_bounds(exit.tile) {
                    Some((exit.tile, exit.change.clone()))
                } else {
                    warn!(map = %id, x = exit.tile.x, y = exit.tile.y, "map_exit_out_of_bounds_dropped");
                    None
                }
            })
            .collect::<HashMap<_, _>>();

        info!(
            map = %id,
            width = collision.width(),
            height = collision.height(),
            exits = exits.len(),
            "map_loaded"
        );
        self.map = Some(LoadedMap {
            id: id.to_string(),
            image: definition.image.clone(),
            bgm: definition.bgm.clone(),
            collision,
            exits,
        });
        self.motion = None;
        self.resume_music(env.audio);
        true
    }

    /// Plays the current map's track, or silence when it has none.
    pub(crate) fn resume_music(&self, audio: &mut dyn AudioService) {
        match self.map.as_ref().and_then(|map| map.bgm.as_deref()) {
            Some(track) => audio.play_music(track),
            None => audio.stop_music(),
        }
    }

    pub(crate) fn begin_transition(&mut self, change: MapChange) -> bool {
        self.transition.begin(change)
    }

    pub(crate) fn update(
        &mut self,
        input: &InputSnapshot,
        dialogue_active: bool,
        player: &mut PlayerState,
        npcs: &NpcRoster,
        env: &mut FieldEnv<'_>,
    ) -> FieldEvent {
        if self.transition.is_active() {
            if let TransitionTick::SwapMap(change) = self.transition.tick() {
                self.apply_map_change(&change, player, env);
            }
            return FieldEvent::None;
        }
        if dialogue_active {
            return FieldEvent::None;
        }

        if let Some(motion) = self.motion.as_mut() {
            motion.offset += MOVE_SPEED;
            if motion.offset >= TILE_SIZE {
                let direction = motion.direction;
                self.motion = None;
                self.commit_step(direction, player);
            }
            return FieldEvent::None;
        }

        let held = Direction::PRECEDENCE
            .into_iter()
            .find(|direction| input.is_down(move_action(*direction)));
        if let Some(direction) = held {
            self.try_start_move(direction, player, npcs);
            return FieldEvent::None;
        }
        if input.pressed(InputAction::Confirm) {
            return FieldEvent::TalkRequested;
        }
        FieldEvent::None
    }

    /// Turns the player and starts a step if the destination is open.
    pub(crate) fn try_start_move(
        &mut self,
        direction: Direction,
        player: &mut PlayerState,
        npcs: &NpcRoster,
    ) -> bool {
        if self.motion.is_some() {
            return false;
        }
        player.facing = direction;
        let Some(map) = self.map.as_ref() else {
            return false;
        };
        let target = player.tile.step(direction);
        if !map.collision.in_bounds(target)
            || npcs.occupies(&map.id, target)
            || !map.collision.is_walkable(target)
        {
            return false;
        }
        self.motion = Some(StepMotion {
            direction,
            offset: 0,
        });
        true
    }

    fn commit_step(&mut self, direction: Direction, player: &mut PlayerState) {
        player.tile = player.tile.step(direction);
        let exit = self
            .map
            .as_ref()
            .and_then(|map| map.exits.get(&player.tile))
            .cloned();
        if let Some(change) = exit {
            debug!(x = player.tile.x, y = player.tile.y, target = %change.map, "exit_reached");
            self.transition.begin(change);
        }
    }

    fn apply_map_change(
        &mut self,
        change: &MapChange,
        player: &mut PlayerState,
        env: &mut FieldEnv<'_>,
    ) {
        if !self.load_map(&change.map, env) {
            return;
        }
        if let Some(dest) = change.dest {
            player.tile = dest;
        }
    }

    /// Player position in zoomed map pixels, including the in-flight step.
    fn player_pixel_origin(&self, player: &PlayerState) -> (i32, i32) {
        let mut x = player.tile.x * SCALED_TILE;
        let mut y = player.tile.y * SCALED_TILE;
        if let Some(motion) = self.motion {
            let (dx, dy) = motion.direction.delta();
            x += dx * motion.offset * ZOOM;
            y += dy * motion.offset * ZOOM;
        }
        (x, y)
    }

    /// Draws the map, NPCs and the player with the camera centred on the player.
    pub(crate) fn draw(
        &self,
        canvas: &mut dyn Canvas,
        player: &PlayerState,
        npcs: &NpcRoster,
        images: &mut ImageStore,
    ) {
        canvas.clear(FIELD_BACKGROUND);
        let Some(map) = self.map.as_ref() else {
            return;
        };
        let (screen_width, screen_height) = canvas.size();
        let anchor_x = screen_width as i32 / 2 - SCALED_TILE / 2;
        let anchor_y = screen_height as i32 / 2 - SCALED_TILE / 2;
        let (player_x, player_y) = self.player_pixel_origin(player);
        let origin_x = anchor_x - player_x;
        let origin_y = anchor_y - player_y;

        let background = map.image.as_deref().and_then(|key| {
            let original = images.get(key)?;
            images.sized(
                key,
                original.width() * ZOOM as u32,
                original.height() * ZOOM as u32,
                false,
            )
        });
        match background {
            Some(image) => canvas.draw_image(&image, origin_x, origin_y),
            None => draw_walkability_grid(
                canvas,
                &map.collision,
                origin_x,
                origin_y,
                SCALED_TILE,
                (screen_width as i32, screen_height as i32),
            ),
        }

        for npc in npcs.on_map(&map.id) {
            let x = origin_x + npc.def.tile.x * SCALED_TILE + (npc.bob_offset() * ZOOM as f32) as i32;
            let y = origin_y + npc.def.tile.y * SCALED_TILE;
            let sprite = npc
                .def
                .image
                .as_deref()
                .and_then(|key| images.sized(key, SCALED_TILE as u32, SCALED_TILE as u32, false));
            match sprite {
                Some(sprite) => canvas.draw_image(&sprite, x, y),
                None => canvas.fill_rect(
                    ScreenRect::new(x + 2, y + 2, SCALED_TILE - 4, SCALED_TILE - 4),
                    NPC_PLACEHOLDER,
                ),
            }
        }

        let (key, mirrored) = match player.facing {
            Direction::Down => (PLAYER_FRONT, false),
            Direction::Up => (PLAYER_BACK, false),
            Direction::Right => (PLAYER_RIGHT, false),
            Direction::Left => (PLAYER_RIGHT, true),
        };
        if let Some(sprite) = images.sized(key, SCALED_TILE as u32, SCALED_TILE as u32, mirrored) {
            canvas.draw_image(&sprite, anchor_x, anchor_y);
        }
    }

    /// Blacks out everything outside the iris while a transition runs.
    pub(crate) fn draw_transition_mask(&self, canvas: &mut dyn Canvas) {
        if !self.transition.is_active() {
            return;
        }
        let (width, height) = canvas.size();
        canvas.circular_mask(width as i32 / 2, height as i32 / 2, self.transition.radius());
    }

    /// Whole-map overview fitted into `area`, with a marker on the player.
    pub(crate) fn draw_overview(
        &self,
        canvas: &mut dyn Canvas,
        area: ScreenRect,
        player: &PlayerState,
        images: &mut ImageStore,
    ) {
        let Some(map) = self.map.as_ref() else {
            return;
        };
        let width = map.collision.width().max(1);
        let height = map.collision.height().max(1);
        let cell = (area.width / width).min(area.height / height).max(1);
        let origin_x = area.x + (area.width - cell * width) / 2;
        let origin_y = area.y + (area.height - cell * height) / 2;

        let background = map.image.as_deref().and_then(|key| {
            images.sized(key, (cell * width) as u32, (cell * height) as u32, false)
        });
        match background {
            Some(image) => canvas.draw_image(&image, origin_x, origin_y),
            None => draw_walkability_grid(
                canvas,
                &map.collision,
                origin_x,
                origin_y,
                cell,
                (area.right(), area.bottom()),
            ),
        }
        let marker = (cell * 2).max(6);
        canvas.fill_rect(
            ScreenRect::new(
                origin_x + player.tile.x * cell + cell / 2 - marker / 2,
                origin_y + player.tile.y * cell + cell / 2 - marker / 2,
                marker,
                marker,
            ),
            PLAYER_MARKER,
        );
    }
}

fn move_action(direction: Direction) -> InputAction {
    match direction {
        Direction::Up => InputAction::MoveUp,
        Direction::Down => InputAction::MoveDown,
        Direction::Left => InputAction::MoveLeft,
        Direction::Right => InputAction::MoveRight,
    }
}

fn draw_walkability_grid(
    canvas: &mut dyn Canvas,
    collision: &CollisionField,
    origin_x: i32,
    origin_y: i32,
    cell: i32,
    (clip_right, clip_bottom): (i32, i32),
) {
    for y in 0..collision.height() {
        let top = origin_y + y * cell;
        if top + cell < 0 || top > clip_bottom {
            continue;
        }
        for x in 0..collision.width() {
            let left = origin_x + x * cell;
            if left + cell < 0 || left > clip_right {
                continue;
            }
            let color = if collision.is_walkable(TilePos::new(x, y)) {
                WALKABLE_CELL
            } else {
                BLOCKED_CELL
            };
            canvas.fill_rect(ScreenRect::new(left, top, cell, cell), color);
        }
    }
}
