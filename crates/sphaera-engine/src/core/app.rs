use winit::event::{DeviceEvent, WindowEvent};
use winit::window::WindowId;

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by higher layers.
pub trait App {
    /// Called for window events, after the runtime has updated input state.
    fn on_window_event(&mut self, window_id: WindowId, event: &WindowEvent) -> AppControl {
        let _ = (window_id, event);
        AppControl::Continue
    }

    /// Called for raw device events (unfiltered mouse motion and the like).
    fn on_device_event(&mut self, event: &DeviceEvent) -> AppControl {
        let _ = event;
        AppControl::Continue
    }

    /// Called once per rendered frame per window.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;
}
