use std::collections::HashSet;

use super::types::{InputEvent, Key, MouseButton};

/// Per-frame input deltas.
///
/// `InputState` holds what is currently down; `InputFrame` holds what changed
/// since the previous frame. The runtime clears it after every `on_frame`.
#[derive(Debug, Default)]
pub struct InputFrame {
    /// Raw events in arrival order.
    pub events: Vec<InputEvent>,

    pub keys_pressed: HashSet<Key>,
    pub keys_released: HashSet<Key>,
    pub buttons_pressed: HashSet<MouseButton>,
    pub buttons_released: HashSet<MouseButton>,

    /// Sum of raw pointer motion received this frame.
    pub pointer_delta: (f32, f32),

    /// Set when the cursor entered the window this frame.
    pub pointer_entered: bool,
}

impl InputFrame {
    pub fn clear(&mut self) {
        self.events.clear();
        self.keys_pressed.clear();
        self.keys_released.clear();
        self.buttons_pressed.clear();
        self.buttons_released.clear();
        self.pointer_delta = (0.0, 0.0);
        self.pointer_entered = false;
    }

    pub fn push_event(&mut self, ev: InputEvent) {
        self.events.push(ev);
    }

    #[inline]
    pub fn key_pressed(&self, key: Key) -> bool {
        self.keys_pressed.contains(&key)
    }

    #[inline]
    pub fn button_pressed(&self, button: MouseButton) -> bool {
        self.buttons_pressed.contains(&button)
    }
}
