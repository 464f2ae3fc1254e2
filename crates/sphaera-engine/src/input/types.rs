/// Keyboard key identifier.
///
/// Only the keys the viewer binds get their own variant; everything else maps
/// to `Key::Unknown` with the platform key code.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Key {
    Escape,
    Space,
    W,
    A,
    S,
    D,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Unknown(u32),
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum KeyState {
    Pressed,
    Released,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other(u16),
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MouseButtonState {
    Pressed,
    Released,
}

/// Platform-agnostic input events emitted by the runtime.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum InputEvent {
    Key {
        key: Key,
        state: KeyState,
        /// True when the event is a key-repeat.
        repeat: bool,
    },

    PointerButton {
        button: MouseButton,
        state: MouseButtonState,
    },

    /// Cursor position in logical pixels.
    PointerMoved { x: f32, y: f32 },

    /// Raw, unaccelerated pointer motion. Keeps arriving while the cursor is confined.
    PointerDelta { dx: f32, dy: f32 },

    PointerEntered,
    PointerLeft,
    Focused(bool),
}
