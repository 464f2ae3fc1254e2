use winit::window::{CursorGrabMode, Window, WindowId};

use crate::coords::Extent;
use crate::device::{Gpu, SurfaceErrorAction};
use crate::input::{InputFrame, InputState};
use crate::render::{RenderCtx, RenderTarget};
use crate::time::FrameTime;

use super::app::AppControl;

/// Per-window handles and immutable window metadata.
pub struct WindowCtx<'a> {
    pub id: WindowId,
    pub window: &'a Window,
}

impl<'a> WindowCtx<'a> {
    /// Window client area in physical pixels.
    pub fn physical_extent(&self) -> Extent {
        Extent::from(self.window.inner_size())
    }

    /// Confines and hides the pointer while grabbed; restores it on release.
    ///
    /// Platforms without confinement fall back to locking. Failure to grab is
    /// logged and otherwise ignored; look input still arrives as raw motion.
    pub fn set_pointer_grab(&self, grabbed: bool) {
        let result = if grabbed {
            self.window
                .set_cursor_grab(CursorGrabMode::Confined)
                .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Locked))
        } else {
            self.window.set_cursor_grab(CursorGrabMode::None)
        };

        if let Err(e) = result {
            log::warn!("pointer grab ({grabbed}) failed: {e}");
        }
        self.window.set_cursor_visible(!grabbed);
    }
}

/// Per-frame context passed to `core::App::on_frame`.
///
/// Lifetimes:
/// - `'a` is the duration of the callback invocation
/// - `'w` is the window-borrow lifetime carried by `Gpu<'w>`
pub struct FrameCtx<'a, 'w> {
    pub window: WindowCtx<'a>,
    pub gpu: &'a mut Gpu<'w>,
    pub input: &'a InputState,
    pub input_frame: &'a InputFrame,
    pub time: FrameTime,
}

impl<'a, 'w> FrameCtx<'a, 'w> {
    /// Acquires a drawable, calls `draw` with a ready [`RenderCtx`] and
    /// [`RenderTarget`], then submits and presents.
    ///
    /// The frame is presented even when `draw` fails; its error is logged.
    /// A failed acquire skips the frame unless the surface is lost for good.
    pub fn render<F>(&mut self, draw: F) -> AppControl
    where
        F: FnOnce(&RenderCtx<'_>, &mut RenderTarget<'_>) -> anyhow::Result<()>,
    {
        let mut frame = match self.gpu.begin_frame() {
            Ok(f) => f,
            Err(err) => {
                let action = self.gpu.handle_surface_error(err);
                if action == SurfaceErrorAction::Fatal {
                    return AppControl::Exit;
                }
                return AppControl::Continue;
            }
        };

        let (width, height) = frame.size();
        let rctx = RenderCtx::new(
            self.gpu.device(),
            self.gpu.queue(),
            self.gpu.surface_format(),
            Extent::new(width, height),
        );

        // RenderTarget borrows frame.encoder; dropped before submit() takes frame.
        let drawn = {
            let mut target = RenderTarget::new(&mut frame.encoder, &frame.view);
            draw(&rctx, &mut target)
        };
        if let Err(e) = drawn {
            log::error!("frame recording failed: {e:#}");
        }

        self.window.window.pre_present_notify();
        self.gpu.submit(frame);

        AppControl::Continue
    }
}
