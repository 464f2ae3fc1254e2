use std::process::ExitCode;

use sphaera_engine::camera::{CameraController, CameraState, GrabChange};
use sphaera_engine::config::RenderConfig;
use sphaera_engine::coords::Extent;
use sphaera_engine::core::{App, AppControl, FrameCtx};
use sphaera_engine::device::GpuInit;
use sphaera_engine::logging::{init_logging, LoggingConfig};
use sphaera_engine::pipeline::FramePipeline;
use sphaera_engine::render::{Renderer, Tonemap};
use sphaera_engine::scene::Scene;
use sphaera_engine::time::FrameStats;
use sphaera_engine::trace::{BackendKind, DeviceBackend, HostBackend, ShadingBackend};
use sphaera_engine::window::{Runtime, RuntimeConfig};

/// Interactive viewer: fly the camera, watch the image converge.
struct PathTracerApp {
    config: RenderConfig,
    controller: CameraController,
    renderer: Renderer,
    stats: FrameStats,

    /// Created on the first frame, once the drawable size is known.
    pipeline: Option<FramePipeline>,
    /// Created on the first frame; the device backend needs the window's device.
    backend: Option<Box<dyn ShadingBackend>>,
}

impl PathTracerApp {
    fn new(config: RenderConfig) -> Self {
        Self {
            controller: CameraController::new(config.move_speed, config.look_sensitivity),
            renderer: Renderer::new(Tonemap {
                exposure: config.exposure,
                gamma: config.gamma,
            }),
            stats: FrameStats::default(),
            pipeline: None,
            backend: None,
            config,
        }
    }

    fn make_backend(&self, ctx: &FrameCtx<'_, '_>) -> Box<dyn ShadingBackend> {
        match self.config.backend {
            BackendKind::Host => Box::new(HostBackend::new()),
            BackendKind::Device => Box::new(DeviceBackend::new(
                ctx.gpu.device().clone(),
                ctx.gpu.queue().clone(),
            )),
        }
    }

    /// Reallocates resolution-sized state when the drawable changed size.
    fn sync_extent(&mut self, ctx: &FrameCtx<'_, '_>, extent: Extent) -> anyhow::Result<()> {
        match self.pipeline.as_mut() {
            None => {
                log::info!(
                    "tracing {}x{} on the {} backend, seed {}",
                    extent.width,
                    extent.height,
                    self.config.backend,
                    self.config.seed
                );
                self.pipeline = Some(FramePipeline::new(
                    Scene::default_scene(),
                    CameraState::default(),
                    extent,
                    self.config.seed,
                ));
            }
            Some(pipeline) if pipeline.extent() != extent => {
                ctx.gpu.wait_idle()?;
                pipeline.resize(extent);
                self.renderer.resize();
                self.controller.skip_next_motion();
            }
            Some(_) => {}
        }
        Ok(())
    }
}

impl App for PathTracerApp {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        self.stats.record(ctx.time.dt);

        let extent = Extent::from(ctx.gpu.size());
        if extent.is_empty() {
            return AppControl::Continue;
        }
        if let Err(e) = self.sync_extent(ctx, extent) {
            log::error!("resize failed: {e:#}");
            return AppControl::Exit;
        }
        if self.backend.is_none() {
            self.backend = Some(self.make_backend(ctx));
        }

        let Self {
            controller,
            renderer,
            stats,
            pipeline: Some(pipeline),
            backend: Some(backend),
            ..
        } = self
        else {
            return AppControl::Continue;
        };

        match controller.update(pipeline.camera_mut(), ctx.input, ctx.input_frame, ctx.time.dt) {
            Some(GrabChange::Grabbed) => ctx.window.set_pointer_grab(true),
            Some(GrabChange::Released) => ctx.window.set_pointer_grab(false),
            None => {}
        }

        match pipeline.step(&mut **backend, ctx.time.elapsed) {
            Ok(report) => {
                if stats.report_due() {
                    log::info!(
                        "{:.2} ms/frame ({:.1} fps), {} samples accumulated",
                        stats.average_ms(),
                        stats.fps(),
                        report.counter
                    );
                }
            }
            Err(e) => log::error!("frame {} failed: {e}", ctx.time.frame_index),
        }

        let displayed = pipeline.displayed();
        let image_extent = pipeline.extent();
        ctx.render(|rctx, target| {
            renderer.render(rctx, target, displayed, image_extent)?;
            Ok(())
        })
    }
}

fn main() -> ExitCode {
    init_logging(LoggingConfig::default());

    let config = match RenderConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            log::error!("invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let gpu_init = GpuInit {
        prefer_srgb: false,
        ..GpuInit::default()
    };

    match Runtime::run(RuntimeConfig::default(), gpu_init, PathTracerApp::new(config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
