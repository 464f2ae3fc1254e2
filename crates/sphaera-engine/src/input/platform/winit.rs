use winit::dpi::PhysicalPosition;
use winit::event::{DeviceEvent, ElementState, MouseButton as WinitMouseButton, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::Window;

use crate::input::{InputEvent, Key, KeyState, MouseButton, MouseButtonState};

/// Translates a winit `WindowEvent` into an engine `InputEvent`.
///
/// Returns `None` for events not represented by the input subsystem.
pub fn translate_window_event(window: &Window, event: &WindowEvent) -> Option<InputEvent> {
    match event {
        WindowEvent::Focused(f) => Some(InputEvent::Focused(*f)),

        WindowEvent::CursorEntered { .. } => Some(InputEvent::PointerEntered),
        WindowEvent::CursorLeft { .. } => Some(InputEvent::PointerLeft),

        WindowEvent::CursorMoved { position, .. } => {
            let (x, y) = to_logical_f32(window, *position);
            Some(InputEvent::PointerMoved { x, y })
        }

        WindowEvent::MouseInput { state, button, .. } => Some(InputEvent::PointerButton {
            button: map_mouse_button(*button),
            state: match state {
                ElementState::Pressed => MouseButtonState::Pressed,
                ElementState::Released => MouseButtonState::Released,
            },
        }),

        WindowEvent::KeyboardInput { event, .. } => Some(InputEvent::Key {
            key: map_key(event.physical_key),
            state: match event.state {
                ElementState::Pressed => KeyState::Pressed,
                ElementState::Released => KeyState::Released,
            },
            repeat: event.repeat,
        }),

        _ => None,
    }
}

/// Translates raw device motion; cursor warping and confinement do not affect it.
pub fn translate_device_event(event: &DeviceEvent) -> Option<InputEvent> {
    match event {
        DeviceEvent::MouseMotion { delta: (dx, dy) } => Some(InputEvent::PointerDelta {
            dx: *dx as f32,
            dy: *dy as f32,
        }),
        _ => None,
    }
}

fn to_logical_f32(window: &Window, pos: PhysicalPosition<f64>) -> (f32, f32) {
    let logical = pos.to_logical::<f64>(window.scale_factor());
    (logical.x as f32, logical.y as f32)
}

fn map_mouse_button(b: WinitMouseButton) -> MouseButton {
    match b {
        WinitMouseButton::Left => MouseButton::Left,
        WinitMouseButton::Right => MouseButton::Right,
        WinitMouseButton::Middle => MouseButton::Middle,
        WinitMouseButton::Back => MouseButton::Other(3),
        WinitMouseButton::Forward => MouseButton::Other(4),
        WinitMouseButton::Other(v) => MouseButton::Other(v),
    }
}

fn map_key(pk: PhysicalKey) -> Key {
    match pk {
        PhysicalKey::Code(code) => match code {
            KeyCode::Escape => Key::Escape,
            KeyCode::Space => Key::Space,
            KeyCode::KeyW => Key::W,
            KeyCode::KeyA => Key::A,
            KeyCode::KeyS => Key::S,
            KeyCode::KeyD => Key::D,
            KeyCode::ArrowUp => Key::ArrowUp,
            KeyCode::ArrowDown => Key::ArrowDown,
            KeyCode::ArrowLeft => Key::ArrowLeft,
            KeyCode::ArrowRight => Key::ArrowRight,
            other => Key::Unknown(other as u32),
        },

        // NativeKeyCode has no stable numeric form in winit 0.30.
        PhysicalKey::Unidentified(_) => Key::Unknown(0),
    }
}
