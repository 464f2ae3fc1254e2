use anyhow::{Context, Result};

use super::init::device_descriptor;

/// Device and queue without a surface.
///
/// Used where the shading kernel runs without a window, e.g. to compare the
/// device and host shading backends.
pub struct HeadlessGpu {
    pub adapter_info: wgpu::AdapterInfo,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl HeadlessGpu {
    pub async fn new() -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .context("no GPU adapter available")?;

        let (device, queue) = adapter
            .request_device(&device_descriptor(
                "sphaera headless device",
                wgpu::Features::empty(),
                wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits()),
            ))
            .await
            .context("failed to create headless device/queue")?;

        Ok(Self {
            adapter_info: adapter.get_info(),
            device,
            queue,
        })
    }

    /// Blocking variant of [`HeadlessGpu::new`].
    pub fn block_on_new() -> Result<Self> {
        pollster::block_on(Self::new())
    }
}
