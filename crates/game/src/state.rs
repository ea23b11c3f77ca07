use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct TilePos {
    pub(crate) x: i32,
    pub(crate) y: i32,
}

impl TilePos {
    pub(crate) const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub(crate) fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self::new(self.x + dx, self.y + dy)
    }

    pub(crate) fn manhattan(self, other: TilePos) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Held-key precedence when several directions are down at once.
    pub(crate) const PRECEDENCE: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub(crate) const fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

/// Target of a map change. Without `dest` the player keeps their tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MapChange {
    pub(crate) map: String,
    pub(crate) dest: Option<TilePos>,
}

impl MapChange {
    pub(crate) fn from_parts(map: String, dest_x: Option<i32>, dest_y: Option<i32>) -> Self {
        let dest = match (dest_x, dest_y) {
            (Some(x), Some(y)) => Some(TilePos::new(x, y)),
            _ => None,
        };
        Self { map, dest }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PlayerState {
    pub(crate) tile: TilePos,
    pub(crate) facing: Direction,
    pub(crate) items: Vec<String>,
    pub(crate) flags: BTreeMap<String, bool>,
}

impl PlayerState {
    pub(crate) fn new(tile: TilePos) -> Self {
        Self {
            tile,
            facing: Direction::Down,
            items: Vec::new(),
            flags: BTreeMap::new(),
        }
    }

    pub(crate) fn has_item(&self, item: &str) -> bool {
        self.items.iter().any(|held| held == item)
    }

    /// Appends every item, duplicates included.
    pub(crate) fn grant_items(&mut self, items: &[String]) {
        self.items.extend(items.iter().cloned());
    }

    /// Appends items not already held. Returns how many were added.
    pub(crate) fn grant_missing_items(&mut self, items: &[String]) -> usize {
        let mut added = 0;
        for item in items {
            if !self.has_item(item) {
                self.items.push(item.clone());
                added += 1;
            }
        }
        added
    }

    pub(crate) fn set_flag(&mut self, flag: &str) {
        self.flags.insert(flag.to_string(), true);
    }

    pub(crate) fn flag(&self, flag: &str) -> bool {
        self.flags.get(flag).copied().unwrap_or(false)
    }
}
