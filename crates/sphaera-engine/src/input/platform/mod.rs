//! Platform event translation.

mod winit;

pub use self::winit::{translate_device_event, translate_window_event};
