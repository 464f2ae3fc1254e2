use anyhow::{Context, Result};
use winit::dpi::PhysicalSize;
use winit::window::Window;

use super::init::device_descriptor;
use super::surface;
use super::{GpuFrame, GpuInit, SurfaceErrorAction};

/// Window-bound GPU context: device, queue, and the configured surface.
///
/// The surface borrows the window for `'w`; the runtime keeps both in one
/// self-referencing entry so the window always outlives this value.
pub struct Gpu<'w> {
    surface: wgpu::Surface<'w>,
    adapter_info: wgpu::AdapterInfo,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,

    /// Current drawable size in physical pixels.
    size: PhysicalSize<u32>,
}

impl<'w> Gpu<'w> {
    pub async fn new(window: &'w Window, init: GpuInit) -> Result<Self> {
        let size = window.inner_size();
        anyhow::ensure!(size.width > 0 && size.height > 0, "window has zero size");

        let GpuInit {
            prefer_srgb,
            present_mode,
            alpha_mode,
            required_features,
            required_limits,
            desired_maximum_frame_latency,
        } = init;

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .context("failed to create wgpu surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let (device, queue) = adapter
            .request_device(&device_descriptor(
                "sphaera device",
                required_features,
                required_limits,
            ))
            .await
            .context("failed to create wgpu device/queue")?;

        let caps = surface.get_capabilities(&adapter);
        let format = surface::choose_surface_format(&caps, prefer_srgb)
            .context("no supported surface formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode,
            alpha_mode: surface::choose_alpha_mode(&caps, alpha_mode),
            view_formats: vec![],
            desired_maximum_frame_latency,
        };
        surface.configure(&device, &config);

        let adapter_info = adapter.get_info();
        log::info!(
            "gpu ready: {} ({:?}), surface {:?} {}x{}",
            adapter_info.name,
            adapter_info.backend,
            format,
            size.width,
            size.height
        );

        Ok(Self {
            surface,
            adapter_info,
            device,
            queue,
            config,
            size,
        })
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Current drawable size (physical pixels).
    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    pub fn adapter_info(&self) -> &wgpu::AdapterInfo {
        &self.adapter_info
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Reconfigures the surface after a resize.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        surface::apply_resize(
            &self.surface,
            &self.device,
            &mut self.config,
            &mut self.size,
            new_size,
        );
    }

    /// Blocks until every submitted command buffer has finished executing.
    ///
    /// Required before freeing resolution-sized resources that in-flight work
    /// may still reference. There is no timeout; a failed wait is fatal.
    pub fn wait_idle(&self) -> Result<()> {
        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .context("device wait-idle failed")?;
        Ok(())
    }

    /// Acquires the next drawable and creates an encoder for it.
    pub fn begin_frame(&self) -> std::result::Result<GpuFrame, wgpu::SurfaceError> {
        let surface_texture = self.surface.get_current_texture()?;
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("sphaera frame encoder"),
            });

        Ok(GpuFrame {
            surface_texture,
            view,
            encoder,
        })
    }

    /// Submits the frame's commands, then presents the drawable.
    pub fn submit(&self, frame: GpuFrame) {
        let GpuFrame {
            surface_texture,
            view,
            encoder,
        } = frame;

        self.queue.submit(std::iter::once(encoder.finish()));
        drop(view);
        surface_texture.present();
    }

    pub fn handle_surface_error(&mut self, err: wgpu::SurfaceError) -> SurfaceErrorAction {
        log::warn!("surface error: {err}");
        surface::map_surface_error(&self.surface, &self.device, &self.config, self.size, err)
    }
}
