use std::collections::HashSet;

use super::frame::InputFrame;
use super::types::{InputEvent, Key, KeyState, MouseButton, MouseButtonState};

/// Current input state for a single window.
///
/// Holds "is down" information and the cursor position.
/// Per-frame transitions are recorded into an `InputFrame`.
#[derive(Debug, Default)]
pub struct InputState {
    pub focused: bool,

    /// Cursor position in logical pixels.
    pub pointer_pos: Option<(f32, f32)>,

    pub keys_down: HashSet<Key>,
    pub buttons_down: HashSet<MouseButton>,
}

impl InputState {
    /// Applies an input event to the current state and writes deltas to `frame`.
    pub fn apply_event(&mut self, frame: &mut InputFrame, ev: InputEvent) {
        match ev {
            InputEvent::Focused(f) => {
                self.focused = f;
                if !f {
                    // Keys released while unfocused never reach us.
                    self.keys_down.clear();
                    self.buttons_down.clear();
                }
            }

            InputEvent::PointerMoved { x, y } => {
                self.pointer_pos = Some((x, y));
            }

            InputEvent::PointerDelta { dx, dy } => {
                frame.pointer_delta.0 += dx;
                frame.pointer_delta.1 += dy;
            }

            InputEvent::PointerEntered => {
                frame.pointer_entered = true;
            }

            InputEvent::PointerLeft => {
                self.pointer_pos = None;
            }

            InputEvent::Key { key, state, .. } => match state {
                KeyState::Pressed => {
                    if self.keys_down.insert(key) {
                        frame.keys_pressed.insert(key);
                    }
                }
                KeyState::Released => {
                    if self.keys_down.remove(&key) {
                        frame.keys_released.insert(key);
                    }
                }
            },

            InputEvent::PointerButton { button, state } => match state {
                MouseButtonState::Pressed => {
                    if self.buttons_down.insert(button) {
                        frame.buttons_pressed.insert(button);
                    }
                }
                MouseButtonState::Released => {
                    if self.buttons_down.remove(&button) {
                        frame.buttons_released.insert(button);
                    }
                }
            },
        }

        frame.push_event(ev);
    }

    pub fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    pub fn button_down(&self, btn: MouseButton) -> bool {
        self.buttons_down.contains(&btn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(key: Key, state: KeyState) -> InputEvent {
        InputEvent::Key {
            key,
            state,
            repeat: false,
        }
    }

    #[test]
    fn press_is_recorded_once() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();

        state.apply_event(&mut frame, key(Key::W, KeyState::Pressed));
        state.apply_event(&mut frame, key(Key::W, KeyState::Pressed));

        assert!(state.key_down(Key::W));
        assert!(frame.key_pressed(Key::W));
        assert_eq!(frame.events.len(), 2);
    }

    #[test]
    fn pointer_deltas_accumulate_until_cleared() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();

        state.apply_event(&mut frame, InputEvent::PointerDelta { dx: 1.0, dy: -2.0 });
        state.apply_event(&mut frame, InputEvent::PointerDelta { dx: 0.5, dy: 1.0 });
        assert_eq!(frame.pointer_delta, (1.5, -1.0));

        frame.clear();
        assert_eq!(frame.pointer_delta, (0.0, 0.0));
        assert!(frame.events.is_empty());
    }

    #[test]
    fn focus_loss_clears_held_keys() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();

        state.apply_event(&mut frame, key(Key::A, KeyState::Pressed));
        state.apply_event(
            &mut frame,
            InputEvent::PointerButton {
                button: MouseButton::Left,
                state: MouseButtonState::Pressed,
            },
        );
        state.apply_event(&mut frame, InputEvent::Focused(false));

        assert!(!state.key_down(Key::A));
        assert!(!state.button_down(MouseButton::Left));
    }
}
