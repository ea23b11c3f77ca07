use std::collections::HashSet;

use winit::keyboard::KeyCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    Confirm,
    Cancel,
    Quit,
    Save,
    Load,
    ToggleInventory,
    ToggleMap,
    Digit0,
    Digit1,
    Digit2,
    Digit3,
    Digit4,
    Digit5,
    Digit6,
    Digit7,
    Digit8,
    Digit9,
    Backspace,
    Decimal,
    PointerPrimary,
}

const ACTION_COUNT: usize = 24;

impl InputAction {
    pub const ALL: [InputAction; ACTION_COUNT] = [
        InputAction::MoveUp,
        InputAction::MoveDown,
        InputAction::MoveLeft,
        InputAction::MoveRight,
        InputAction::Confirm,
        InputAction::Cancel,
        InputAction::Quit,
        InputAction::Save,
        InputAction::Load,
        InputAction::ToggleInventory,
        InputAction::ToggleMap,
        InputAction::Digit0,
        InputAction::Digit1,
        InputAction::Digit2,
        InputAction::Digit3,
        InputAction::Digit4,
        InputAction::Digit5,
        InputAction::Digit6,
        InputAction::Digit7,
        InputAction::Digit8,
        InputAction::Digit9,
        InputAction::Backspace,
        InputAction::Decimal,
        InputAction::PointerPrimary,
    ];

    /// Keys that type into a numeric input buffer, in buffer order.
    pub const NUMERIC_ENTRY: [InputAction; 11] = [
        InputAction::Digit0,
        InputAction::Digit1,
        InputAction::Digit2,
        InputAction::Digit3,
        InputAction::Digit4,
        InputAction::Digit5,
        InputAction::Digit6,
        InputAction::Digit7,
        InputAction::Digit8,
        InputAction::Digit9,
        InputAction::Decimal,
    ];

    const fn index(self) -> usize {
        self as usize
    }

    pub fn typed_char(self) -> Option<char> {
        match self {
            InputAction::Digit0 => Some('0'),
            InputAction::Digit1 => Some('1'),
            InputAction::Digit2 => Some('2'),
            InputAction::Digit3 => Some('3'),
            InputAction::Digit4 => Some('4'),
            InputAction::Digit5 => Some('5'),
            InputAction::Digit6 => Some('6'),
            InputAction::Digit7 => Some('7'),
            InputAction::Digit8 => Some('8'),
            InputAction::Digit9 => Some('9'),
            InputAction::Decimal => Some('.'),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }
}

/// Per-frame input view: raw held state plus rising edges since the previous sample.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    held: ActionStates,
    pressed: ActionStates,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.held.is_down(action)
    }

    pub fn pressed(&self, action: InputAction) -> bool {
        self.pressed.is_down(action)
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.held.set(action, is_down);
        self
    }

    pub fn with_pressed(mut self, action: InputAction) -> Self {
        self.held.set(action, true);
        self.pressed.set(action, true);
        self
    }
}

/// Turns raw key state into edge-triggered presses. `sample` runs once per tick.
///
/// Keyboard keys are tracked per physical key, so two keys bound to the same
/// action each produce their own press and neither release masks the other.
#[derive(Debug, Default)]
pub struct InputSampler {
    keys: HashSet<KeyCode>,
    previous_keys: HashSet<KeyCode>,
    direct: ActionStates,
    previous_direct: ActionStates,
}

impl InputSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw state for inputs that are not keyboard keys, such as the pointer.
    pub fn set_raw(&mut self, action: InputAction, is_down: bool) {
        self.direct.set(action, is_down);
    }

    pub fn set_key(&mut self, code: KeyCode, is_down: bool) {
        if is_down {
            self.keys.insert(code);
        } else {
            self.keys.remove(&code);
        }
    }

    pub fn release_all(&mut self) {
        self.keys.clear();
        self.direct = ActionStates::default();
    }

    pub fn sample(&mut self) -> InputSnapshot {
        let mut held = self.direct;
        let mut pressed = ActionStates::default();
        for action in InputAction::ALL {
            pressed.set(
                action,
                self.direct.is_down(action) && !self.previous_direct.is_down(action),
            );
        }
        for code in &self.keys {
            let Some(action) = action_for_key_code(*code) else {
                continue;
            };
            held.set(action, true);
            if !self.previous_keys.contains(code) {
                pressed.set(action, true);
            }
        }
        self.previous_keys.clone_from(&self.keys);
        self.previous_direct = self.direct;
        InputSnapshot { held, pressed }
    }
}

pub(crate) fn action_for_key_code(code: KeyCode) -> Option<InputAction> {
    let action = match code {
        KeyCode::ArrowUp | KeyCode::KeyW => InputAction::MoveUp,
        KeyCode::ArrowDown | KeyCode::KeyS => InputAction::MoveDown,
        KeyCode::ArrowLeft | KeyCode::KeyA => InputAction::MoveLeft,
        KeyCode::ArrowRight | KeyCode::KeyD => InputAction::MoveRight,
        KeyCode::KeyZ | KeyCode::Enter | KeyCode::NumpadEnter | KeyCode::Space => {
            InputAction::Confirm
        }
        KeyCode::KeyQ | KeyCode::KeyX => InputAction::Cancel,
        KeyCode::Escape => InputAction::Quit,
        KeyCode::F5 => InputAction::Save,
        KeyCode::F9 => InputAction::Load,
        KeyCode::KeyI => InputAction::ToggleInventory,
        KeyCode::KeyM => InputAction::ToggleMap,
        KeyCode::Digit0 | KeyCode::Numpad0 => InputAction::Digit0,
        KeyCode::Digit1 | KeyCode::Numpad1 => InputAction::Digit1,
        KeyCode::Digit2 | KeyCode::Numpad2 => InputAction::Digit2,
        KeyCode::Digit3 | KeyCode::Numpad3 => InputAction::Digit3,
        KeyCode::Digit4 | KeyCode::Numpad4 => InputAction::Digit4,
        KeyCode::Digit5 | KeyCode::Numpad5 => InputAction::Digit5,
        KeyCode::Digit6 | KeyCode::Numpad6 => InputAction::Digit6,
        KeyCode::Digit7 | KeyCode::Numpad7 => InputAction::Digit7,
        KeyCode::Digit8 | KeyCode::Numpad8 => InputAction::Digit8,
        KeyCode::Digit9 | KeyCode::Numpad9 => InputAction::Digit9,
        KeyCode::Backspace => InputAction::Backspace,
        KeyCode::Period | KeyCode::NumpadDecimal => InputAction::Decimal,
        _ => return None,
    };
    Some(action)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_actions_have_distinct_indices() {
        for (expected, action) in InputAction::ALL.iter().enumerate() {
            assert_eq!(action.index(), expected, "{action:?}");
        }
    }

    #[test]
    fn held_key_yields_single_edge() {
        let mut sampler = InputSampler::new();
        sampler.set_raw(InputAction::Confirm, true);

        let first = sampler.sample();
        let second = sampler.sample();
        let third = sampler.sample();

        assert!(first.pressed(InputAction::Confirm));
        assert!(!second.pressed(InputAction::Confirm));
        assert!(!third.pressed(InputAction::Confirm));
        assert!(third.is_down(InputAction::Confirm));
    }

    #[test]
    fn release_then_press_retriggers() {
        let mut sampler = InputSampler::new();
        sampler.set_raw(InputAction::MoveUp, true);
        assert!(sampler.sample().pressed(InputAction::MoveUp));

        sampler.set_raw(InputAction::MoveUp, false);
        let released = sampler.sample();
        assert!(!released.pressed(InputAction::MoveUp));
        assert!(!released.is_down(InputAction::MoveUp));

        sampler.set_raw(InputAction::MoveUp, true);
        assert!(sampler.sample().pressed(InputAction::MoveUp));
    }

    #[test]
    fn keys_sharing_an_action_do_not_mask_each_other() {
        let mut sampler = InputSampler::new();
        sampler.set_key(KeyCode::KeyW, true);
        sampler.set_key(KeyCode::ArrowUp, true);
        assert!(sampler.sample().is_down(InputAction::MoveUp));

        sampler.set_key(KeyCode::KeyW, false);
        let still_held = sampler.sample();
        assert!(still_held.is_down(InputAction::MoveUp));

        sampler.set_key(KeyCode::ArrowUp, false);
        assert!(!sampler.sample().is_down(InputAction::MoveUp));
    }

    #[test]
    fn second_key_for_a_held_action_yields_a_new_edge() {
        let mut sampler = InputSampler::new();
        sampler.set_key(KeyCode::KeyZ, true);
        assert!(sampler.sample().pressed(InputAction::Confirm));
        assert!(!sampler.sample().pressed(InputAction::Confirm));

        sampler.set_key(KeyCode::Enter, true);
        assert!(sampler.sample().pressed(InputAction::Confirm));

        sampler.set_key(KeyCode::Enter, true);
        assert!(!sampler.sample().pressed(InputAction::Confirm), "key repeat");
    }

    #[test]
    fn release_all_clears_held_state() {
        let mut sampler = InputSampler::new();
        sampler.set_raw(InputAction::MoveLeft, true);
        sampler.sample();
        sampler.release_all();
        assert!(!sampler.sample().is_down(InputAction::MoveLeft));
    }

    #[test]
    fn wasd_and_arrows_map_to_same_movement() {
        assert_eq!(
            action_for_key_code(KeyCode::KeyW),
            action_for_key_code(KeyCode::ArrowUp)
        );
        assert_eq!(
            action_for_key_code(KeyCode::KeyD),
            Some(InputAction::MoveRight)
        );
        assert_eq!(action_for_key_code(KeyCode::F5), Some(InputAction::Save));
        assert_eq!(action_for_key_code(KeyCode::KeyP), None);
    }

    #[test]
    fn numeric_entry_keys_type_expected_chars() {
        let typed: String = InputAction::NUMERIC_ENTRY
            .iter()
            .filter_map(|action| action.typed_char())
            .collect();
        assert_eq!(typed, "0123456789.");
        assert_eq!(InputAction::Confirm.typed_char(), None);
    }
}
