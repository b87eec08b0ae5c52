use winit::event::{ElementState, KeyEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::world::MovementInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    Run,
    Interact,
    Quit,
}

const ACTION_COUNT: usize = 7;

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

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::MoveUp => 0,
            InputAction::MoveDown => 1,
            InputAction::MoveLeft => 2,
            InputAction::MoveRight => 3,
            InputAction::Run => 4,
            InputAction::Interact => 5,
            InputAction::Quit => 6,
        }
    }

    fn from_physical_key(key: PhysicalKey) -> Option<Self> {
        let PhysicalKey::Code(code) = key else {
            return None;
        };
        match code {
            KeyCode::KeyW | KeyCode::ArrowUp => Some(InputAction::MoveUp),
            KeyCode::KeyS | KeyCode::ArrowDown => Some(InputAction::MoveDown),
            KeyCode::KeyA | KeyCode::ArrowLeft => Some(InputAction::MoveLeft),
            KeyCode::KeyD | KeyCode::ArrowRight => Some(InputAction::MoveRight),
            KeyCode::ShiftLeft => Some(InputAction::Run),
            KeyCode::Space => Some(InputAction::Interact),
            KeyCode::Escape => Some(InputAction::Quit),
            _ => None,
        }
    }
}

/// Input state sampled once per simulation tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    actions: ActionStates,
    interact_pressed: bool,
    quit_requested: bool,
}

impl InputSnapshot {
    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    /// True only on the first tick after Space goes down.
    pub fn interact_pressed(&self) -> bool {
        self.interact_pressed
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn movement(&self) -> MovementInput {
        MovementInput {
            up: self.is_down(InputAction::MoveUp),
            down: self.is_down(InputAction::MoveDown),
            left: self.is_down(InputAction::MoveLeft),
            right: self.is_down(InputAction::MoveRight),
            run: self.is_down(InputAction::Run),
        }
    }
}

/// Accumulates window keyboard events between ticks.
#[derive(Debug, Default)]
pub(crate) struct InputCollector {
    actions: ActionStates,
    interact_pressed_edge: bool,
    quit_requested: bool,
}

impl InputCollector {
    pub(crate) fn mark_quit_requested(&mut self) {
        self.quit_requested = true;
    }

    pub(crate) fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub(crate) fn handle_keyboard_input(&mut self, key_event: &KeyEvent) {
        self.handle_key(key_event.physical_key, key_event.state);
    }

    fn handle_key(&mut self, key: PhysicalKey, state: ElementState) {
        let Some(action) = InputAction::from_physical_key(key) else {
            return;
        };
        let is_pressed = state == ElementState::Pressed;
        if action == InputAction::Interact && is_pressed && !self.actions.is_down(action) {
            self.interact_pressed_edge = true;
        }
        if action == InputAction::Quit && is_pressed {
            self.mark_quit_requested();
        }
        self.actions.set(action, is_pressed);
    }

    /// Clears focus-dependent state so keys released while unfocused do not
    /// stay held.
    pub(crate) fn release_all(&mut self) {
        self.actions = ActionStates::default();
    }

    pub(crate) fn snapshot_for_tick(&mut self) -> InputSnapshot {
        let snapshot = InputSnapshot {
            actions: self.actions,
            interact_pressed: self.interact_pressed_edge,
            quit_requested: self.quit_requested,
        };
        self.interact_pressed_edge = false;
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> PhysicalKey {
        PhysicalKey::Code(code)
    }

    #[test]
    fn wasd_and_arrow_keys_map_to_movement() {
        let mut input = InputCollector::default();
        input.handle_key(key(KeyCode::KeyW), ElementState::Pressed);
        input.handle_key(key(KeyCode::ArrowLeft), ElementState::Pressed);
        input.handle_key(key(KeyCode::ShiftLeft), ElementState::Pressed);

        let movement = input.snapshot_for_tick().movement();
        assert_eq!(
            movement,
            MovementInput {
                up: true,
                down: false,
                left: true,
                right: false,
                run: true,
            }
        );
    }

    #[test]
    fn key_release_clears_action_state() {
        let mut input = InputCollector::default();
        input.handle_key(key(KeyCode::KeyD), ElementState::Pressed);
        input.handle_key(key(KeyCode::KeyD), ElementState::Released);
        assert!(!input.snapshot_for_tick().is_down(InputAction::MoveRight));
    }

    #[test]
    fn interact_is_edge_triggered_for_single_tick() {
        let mut input = InputCollector::default();
        input.handle_key(key(KeyCode::Space), ElementState::Pressed);
        let first = input.snapshot_for_tick();
        let second = input.snapshot_for_tick();
        assert!(first.interact_pressed());
        assert!(!second.interact_pressed());
    }

    #[test]
    fn held_space_does_not_retrigger_until_released() {
        let mut input = InputCollector::default();
        input.handle_key(key(KeyCode::Space), ElementState::Pressed);
        let first = input.snapshot_for_tick();
        // Key repeat delivers further presses while held.
        input.handle_key(key(KeyCode::Space), ElementState::Pressed);
        let second = input.snapshot_for_tick();
        input.handle_key(key(KeyCode::Space), ElementState::Released);
        input.handle_key(key(KeyCode::Space), ElementState::Pressed);
        let third = input.snapshot_for_tick();

        assert!(first.interact_pressed());
        assert!(!second.interact_pressed());
        assert!(third.interact_pressed());
    }

    #[test]
    fn escape_requests_quit() {
        let mut input = InputCollector::default();
        input.handle_key(key(KeyCode::Escape), ElementState::Pressed);
        assert!(input.quit_requested());
        assert!(input.snapshot_for_tick().quit_requested());
    }

    #[test]
    fn release_all_drops_held_keys() {
        let mut input = InputCollector::default();
        input.handle_key(key(KeyCode::ArrowUp), ElementState::Pressed);
        input.release_all();
        assert_eq!(input.snapshot_for_tick().movement(), MovementInput::default());
    }
}
