use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{DeviceEvent, DeviceId, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{App as CoreApp, AppControl, FrameCtx, WindowCtx};
use crate::device::{Gpu, GpuInit};
use crate::input::platform::{translate_device_event, translate_window_event};
use crate::input::{InputFrame, InputState};
use crate::time::FrameClock;

/// Window configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "sphaera".to_string(),
            initial_size: LogicalSize::new(800.0, 600.0),
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens one window and drives `app` until it exits or the window closes.
    ///
    /// A failure to create the window or its GPU context is returned here
    /// after the event loop has shut down.
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: 'static + CoreApp,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState {
            config,
            gpu_init,
            app,
            window: None,
            fatal: None,
        };

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.fatal.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// The window, its surface-bound GPU context, and its input/timing state.
#[self_referencing]
struct WindowEntry {
    input_state: InputState,
    input_frame: InputFrame,
    clock: FrameClock,

    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

impl WindowEntry {
    fn open(event_loop: &ActiveEventLoop, config: &RuntimeConfig, gpu_init: GpuInit) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title(config.title.clone())
            .with_inner_size(config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        WindowEntryTryBuilder {
            input_state: InputState::default(),
            input_frame: InputFrame::default(),
            clock: FrameClock::default(),
            window,
            gpu_builder: |w| {
                pollster::block_on(Gpu::new(w, gpu_init))
                    .context("GPU initialization failed for window")
            },
        }
        .try_build()
    }

    fn id(&self) -> WindowId {
        self.with_window(|w| w.id())
    }

    fn request_redraw(&self) {
        self.with_window(|w| w.request_redraw());
    }
}

struct AppState<A>
where
    A: CoreApp + 'static,
{
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,

    /// `None` before `resumed` and after the window closes.
    window: Option<WindowEntry>,
    /// First unrecoverable error; returned from `Runtime::run`.
    fatal: Option<anyhow::Error>,
}

impl<A> AppState<A>
where
    A: CoreApp + 'static,
{
    /// Drops the window (and with it the surface) and stops the loop.
    fn shut_down(&mut self, event_loop: &ActiveEventLoop) {
        self.window = None;
        event_loop.exit();
    }

    /// Runs one `on_frame` for the window, then clears its per-frame input.
    fn frame(&mut self, window_id: WindowId) -> AppControl {
        let (app, Some(entry)) = (&mut self.app, self.window.as_mut()) else {
            return AppControl::Continue;
        };

        entry.with_mut(|fields| {
            let mut ctx = FrameCtx {
                window: WindowCtx {
                    id: window_id,
                    window: fields.window,
                },
                gpu: fields.gpu,
                input: fields.input_state,
                input_frame: fields.input_frame,
                time: fields.clock.tick(),
            };
            let control = app.on_frame(&mut ctx);

            fields.input_frame.clear();
            control
        })
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: CoreApp + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        match WindowEntry::open(event_loop, &self.config, self.gpu_init.clone()) {
            Ok(entry) => {
                entry.request_redraw();
                self.window = Some(entry);
            }
            Err(e) => {
                log::error!("failed to open window: {e:#}");
                self.fatal = Some(e);
                event_loop.exit();
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);

        // Accumulation never settles; redraw continuously.
        if let Some(entry) = self.window.as_ref() {
            entry.request_redraw();
        }
    }

    fn device_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        // Raw motion only counts while the window has focus.
        if let (Some(ev), Some(entry)) = (translate_device_event(&event), self.window.as_mut()) {
            entry.with_mut(|fields| {
                if fields.input_state.focused {
                    fields.input_state.apply_event(fields.input_frame, ev);
                }
            });
        }

        if self.app.on_device_event(&event) == AppControl::Exit {
            self.shut_down(event_loop);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(entry) = self.window.as_mut() else {
            return;
        };
        if entry.id() != window_id {
            return;
        }

        entry.with_mut(|fields| {
            if let Some(ev) = translate_window_event(fields.window, &event) {
                fields.input_state.apply_event(fields.input_frame, ev);
            }
        });

        if self.app.on_window_event(window_id, &event) == AppControl::Exit {
            self.shut_down(event_loop);
            return;
        }

        match &event {
            WindowEvent::CloseRequested => self.shut_down(event_loop),

            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(entry) = self.window.as_mut() {
                    let size = entry.with_window(|w| w.inner_size());
                    entry.with_gpu_mut(|gpu| gpu.resize(size));
                    entry.request_redraw();
                }
            }

            WindowEvent::RedrawRequested => {
                if self.frame(window_id) == AppControl::Exit {
                    self.shut_down(event_loop);
                }
            }

            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_window_is_titled_and_800_by_600() {
        let config = RuntimeConfig::default();
        assert_eq!(config.title, "sphaera");
        assert_eq!(config.initial_size, LogicalSize::new(800.0, 600.0));
    }
}
