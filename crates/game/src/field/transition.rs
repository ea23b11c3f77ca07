use tracing::debug;

use crate::state::MapChange;

/// Radius change per frame while the iris closes or opens.
pub(crate) const TRANSITION_SPEED: f32 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Closing,
    Opening,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TransitionTick {
    Idle,
    Animating,
    /// The iris just closed. The caller loads the target map now.
    SwapMap(MapChange),
    Finished,
}

#[derive(Debug, Clone)]
struct ActiveTransition {
    stage: Stage,
    target: Option<MapChange>,
}

/// Iris wipe: closing, one map swap at radius zero, then opening.
#[derive(Debug, Clone)]
pub(crate) struct TransitionController {
    max_radius: f32,
    radius: f32,
    active: Option<ActiveTransition>,
}

impl TransitionController {
    /// `max_radius` is the centre-to-corner distance of the screen.
    pub(crate) fn new(max_radius: f32) -> Self {
        Self {
            max_radius,
            radius: max_radius,
            active: None,
        }
    }

    pub(crate) fn for_screen(width: u32, height: u32) -> Self {
        Self::new((width as f32 / 2.0).hypot(height as f32 / 2.0))
    }

    /// Starts closing toward `target`. Ignored while a transition runs.
    pub(crate) fn begin(&mut self, target: MapChange) -> bool {
        if self.active.is_some() {
            debug!(map = %target.map, "transition_begin_ignored_while_active");
            return false;
        }
        debug!(map = %target.map, "transition_started");
        self.radius = self.max_radius;
        self.active = Some(ActiveTransition {
            stage: Stage::Closing,
            target: Some(target),
        });
        true
    }

    pub(crate) fn tick(&mut self) -> TransitionTick {
        let Some(active) = self.active.as_mut() else {
            return TransitionTick::Idle;
        };
        match active.stage {
            Stage::Closing => {
                self.radius -= TRANSITION_SPEED;
                if self.radius > 0.0 {
                    return TransitionTick::Animating;
                }
                self.radius = 0.0;
                active.stage = Stage::Opening;
                match active.target.take() {
                    Some(target) => TransitionTick::SwapMap(target),
                    None => TransitionTick::Animating,
                }
            }
            Stage::Opening => {
                self.radius += TRANSITION_SPEED;
                if self.radius < self.max_radius {
                    return TransitionTick::Animating;
                }
                self.radius = self.max_radius;
                self.active = None;
                TransitionTick::Finished
            }
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub(crate) fn radius(&self) -> f32 {
        self.radius
    }

    pub(crate) fn cancel(&mut self) {
        self.active = None;
        self.radius = self.max_radius;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::TilePos;

    impl TransitionController {
        fn stage(&self) -> Option<Stage> {
            self.active.as_ref().map(|active| active.stage)
        }
    }

    fn cave() -> MapChange {
        MapChange {
            map: "cave".to_string(),
            dest: Some(TilePos::new(2, 3)),
        }
    }

    #[test]
    fn full_cycle_swaps_exactly_once_and_returns_to_idle() {
        let mut transition = TransitionController::for_screen(900, 700);
        assert!(transition.begin(cave()));

        let mut swaps = Vec::new();
        let mut ticks = 0;
        loop {
            ticks += 1;
            assert!(ticks < 1_000, "transition never finished");
            match transition.tick() {
                TransitionTick::SwapMap(change) => {
                    assert_eq!(transition.radius(), 0.0);
                    assert_eq!(transition.stage(), Some(Stage::Opening));
                    swaps.push(change);
                }
                TransitionTick::Finished => break,
                TransitionTick::Animating => {}
                TransitionTick::Idle => panic!("went idle before finishing"),
            }
        }

        assert_eq!(swaps, vec![cave()]);
        assert!(!transition.is_active());
        assert_eq!(transition.tick(), TransitionTick::Idle);
    }

    #[test]
    fn begin_is_rejected_while_active() {
        let mut transition = TransitionController::new(40.0);
        assert!(transition.begin(cave()));
        transition.tick();
        let other = MapChange {
            map: "town".to_string(),
            dest: None,
        };
        assert!(!transition.begin(other));

        let swapped = (0..10).find_map(|_| match transition.tick() {
            TransitionTick::SwapMap(change) => Some(change),
            _ => None,
        });
        assert_eq!(swapped, Some(cave()));
    }

    #[test]
    fn radius_shrinks_then_grows_by_fixed_speed() {
        let mut transition = TransitionController::new(20.0);
        transition.begin(cave());
        assert_eq!(transition.tick(), TransitionTick::Animating);
        assert_eq!(transition.radius(), 12.0);
        transition.tick();
        assert_eq!(transition.radius(), 4.0);
        assert!(matches!(transition.tick(), TransitionTick::SwapMap(_)));
        assert_eq!(transition.tick(), TransitionTick::Animating);
        assert_eq!(transition.radius(), 8.0);
        transition.tick();
        assert_eq!(transition.tick(), TransitionTick::Finished);
        assert_eq!(transition.radius(), 20.0);
    }
}
