use crate::data::NpcDefinition;
use crate::state::TilePos;

/// An NPC record plus the progress it accumulates during a session.
#[derive(Debug, Clone)]
pub(crate) struct NpcState {
    pub(crate) def: NpcDefinition,
    pub(crate) quiz_done: bool,
    pub(crate) reward_granted: bool,
    bob_offset: f32,
    bob_velocity: f32,
}

impl NpcState {
    pub(crate) fn new(def: NpcDefinition) -> Self {
        let bob_velocity = def.idle_motion.map_or(0.0, |motion| motion.speed);
        Self {
            def,
            quiz_done: false,
            reward_granted: false,
            bob_offset: 0.0,
            bob_velocity,
        }
    }

    /// Lateral idle offset in map pixels.
    pub(crate) fn bob_offset(&self) -> f32 {
        self.bob_offset
    }

    fn animate(&mut self) {
        let Some(motion) = self.def.idle_motion else {
            return;
        };
        self.bob_offset += self.bob_velocity;
        if self.bob_offset.abs() >= motion.max_offset {
            self.bob_offset = self.bob_offset.clamp(-motion.max_offset, motion.max_offset);
            self.bob_velocity = -self.bob_velocity;
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct NpcRoster {
    npcs: Vec<NpcState>,
}

impl NpcRoster {
    pub(crate) fn new(definitions: &[NpcDefinition]) -> Self {
        Self {
            npcs: definitions.iter().cloned().map(NpcState::new).collect(),
        }
    }

    pub(crate) fn get(&self, index: usize) -> Option<&NpcState> {
        self.npcs.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut NpcState> {
        self.npcs.get_mut(index)
    }

    pub(crate) fn on_map<'a>(&'a self, map_id: &'a str) -> impl Iterator<Item = &'a NpcState> {
        self.npcs.iter().filter(move |npc| npc.def.map_id == map_id)
    }

    pub(crate) fn occupies(&self, map_id: &str, tile: TilePos) -> bool {
        self.on_map(map_id).any(|npc| npc.def.tile == tile)
    }

    /// First NPC on `map_id` exactly one tile away from `tile`.
    pub(crate) fn adjacent_to(&self, map_id: &str, tile: TilePos) -> Option<usize> {
        self.npcs
            .iter()
            .position(|npc| npc.def.map_id == map_id && npc.def.tile.manhattan(tile) == 1)
    }

    pub(crate) fn animate(&mut self) {
        for npc in &mut self.npcs {
            npc.animate();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::IdleMotion;
    use crate::test_support::npc_def as npc;

    #[test]
    fn adjacency_is_manhattan_one_on_the_same_map() {
        let roster = NpcRoster::new(&[
            npc("far", "world", TilePos::new(5, 5)),
            npc("other_map", "cave", TilePos::new(2, 3)),
            npc("near", "world", TilePos::new(3, 3)),
        ]);
        assert_eq!(roster.adjacent_to("world", TilePos::new(2, 3)), Some(2));
        assert_eq!(roster.adjacent_to("world", TilePos::new(4, 4)), None);
        assert!(roster.occupies("cave", TilePos::new(2, 3)));
        assert!(!roster.occupies("world", TilePos::new(2, 3)));
    }

    #[test]
    fn bob_bounces_between_bounds() {
        let mut def = npc("bob", "world", TilePos::new(0, 0));
        def.idle_motion = Some(IdleMotion {
            speed: 1.0,
            max_offset: 2.0,
        });
        let mut roster = NpcRoster::new(&[def]);
        let mut offsets = Vec::new();
        for _ in 0..6 {
            roster.animate();
            offsets.push(roster.get(0).expect("npc").bob_offset());
        }
        assert_eq!(offsets, vec![1.0, 2.0, 1.0, 0.0, -1.0, -2.0]);
    }

    #[test]
    fn npcs_without_motion_stay_put() {
        let mut roster = NpcRoster::new(&[npc("still", "world", TilePos::new(0, 0))]);
        roster.animate();
        assert_eq!(roster.get(0).expect("npc").bob_offset(), 0.0);
    }
}
