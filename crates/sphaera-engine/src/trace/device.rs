use std::num::NonZeroU64;

use bytemuck::Zeroable;
use glam::Vec4;

use super::backend::{BackendKind, ShadeConstants, ShadingBackend, TraceError, TraceInput};
use crate::camera::GpuSceneConstants;
use crate::coords::Extent;
use crate::scene::GpuSphere;

/// Kernel workgroup edge; must match `@workgroup_size` in `shade.wgsl`.
pub const WORKGROUP_SIZE: u32 = 10;

const TEXEL_BYTES: u64 = std::mem::size_of::<[f32; 4]>() as u64;

/// Runs the shading kernel on a compute device and reads the samples back.
///
/// Resolution-sized buffers are created lazily and rebuilt when the extent
/// changes. Each `trace` submits one dispatch plus a copy into a mappable
/// staging buffer, then blocks until the copy is mapped.
pub struct DeviceBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,

    pipeline: Option<wgpu::ComputePipeline>,
    bind_group_layout: Option<wgpu::BindGroupLayout>,
    scene_ubo: Option<wgpu::Buffer>,
    shade_ubo: Option<wgpu::Buffer>,

    sphere_buffer: Option<wgpu::Buffer>,
    sphere_capacity: usize,

    targets: Option<Targets>,
    bind_group: Option<wgpu::BindGroup>,

    ray_scratch: Vec<[f32; 4]>,
}

/// Buffers sized to one extent.
struct Targets {
    extent: Extent,
    rays: wgpu::Buffer,
    samples: wgpu::Buffer,
    readback: wgpu::Buffer,
}

impl DeviceBackend {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self {
            device,
            queue,
            pipeline: None,
            bind_group_layout: None,
            scene_ubo: None,
            shade_ubo: None,
            sphere_buffer: None,
            sphere_capacity: 0,
            targets: None,
            bind_group: None,
            ray_scratch: Vec::new(),
        }
    }

    /// Number of workgroups along each axis for `extent`.
    #[inline]
    pub fn dispatch_size(extent: Extent) -> (u32, u32) {
        (
            extent.width.div_ceil(WORKGROUP_SIZE),
            extent.height.div_ceil(WORKGROUP_SIZE),
        )
    }

    // ── private helpers ────────────────────────────────────────────────────

    fn ensure_pipeline(&mut self) {
        if self.pipeline.is_some() {
            return;
        }

        let shader = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sphaera shade kernel"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/shade.wgsl").into()),
        });

        let uniform = |binding: u32, size: usize| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: NonZeroU64::new(size as u64),
            },
            count: None,
        };
        let storage = |binding: u32, read_only: bool| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let bind_group_layout =
            self.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("sphaera shade bgl"),
                entries: &[
                    uniform(0, std::mem::size_of::<GpuSceneConstants>()),
                    uniform(1, std::mem::size_of::<ShadeConstants>()),
                    storage(2, true),
                    storage(3, true),
                    storage(4, false),
                ],
            });

        let pipeline_layout =
            self.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("sphaera shade pipeline layout"),
                bind_group_layouts: &[&bind_group_layout],
                immediate_size: 0,
            });

        let pipeline = self.device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("sphaera shade pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        let ubo = |label: &str, size: usize| {
            self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: size as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };
        self.scene_ubo = Some(ubo(
            "sphaera scene constants ubo",
            std::mem::size_of::<GpuSceneConstants>(),
        ));
        self.shade_ubo = Some(ubo(
            "sphaera shade constants ubo",
            std::mem::size_of::<ShadeConstants>(),
        ));

        self.pipeline = Some(pipeline);
        self.bind_group_layout = Some(bind_group_layout);
        self.bind_group = None;
    }

    /// Grows the sphere buffer when needed. An empty scene still binds one
    /// zero-radius sphere, which the kernel skips as degenerate.
    fn ensure_sphere_capacity(&mut self, required: usize) {
        let required = required.max(1);
        if required <= self.sphere_capacity && self.sphere_buffer.is_some() {
            return;
        }

        let capacity = required.next_power_of_two();
        self.sphere_buffer = Some(self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("sphaera sphere buffer"),
            size: (capacity * std::mem::size_of::<GpuSphere>()) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.sphere_capacity = capacity;
        self.bind_group = None;
    }

    fn ensure_targets(&mut self, extent: Extent) {
        if self.targets.as_ref().is_some_and(|t| t.extent == extent) {
            return;
        }

        let size = extent.pixel_count().max(1) as u64 * TEXEL_BYTES;
        let buffer = |label: &str, usage: wgpu::BufferUsages| {
            self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size,
                usage,
                mapped_at_creation: false,
            })
        };

        self.targets = Some(Targets {
            extent,
            rays: buffer(
                "sphaera ray buffer",
                wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            ),
            samples: buffer(
                "sphaera sample buffer",
                wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            ),
            readback: buffer(
                "sphaera sample readback",
                wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            ),
        });
        self.bind_group = None;

        log::debug!(
            "device backend: allocated {}x{} per-pixel buffers",
            extent.width,
            extent.height
        );
    }

    fn ensure_bind_group(&mut self) {
        if self.bind_group.is_some() {
            return;
        }
        let (Some(bgl), Some(scene_ubo), Some(shade_ubo), Some(spheres), Some(targets)) = (
            self.bind_group_layout.as_ref(),
            self.scene_ubo.as_ref(),
            self.shade_ubo.as_ref(),
            self.sphere_buffer.as_ref(),
            self.targets.as_ref(),
        ) else {
            return;
        };

        self.bind_group = Some(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sphaera shade bind group"),
            layout: bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: scene_ubo.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: shade_ubo.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: spheres.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: targets.rays.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: targets.samples.as_entire_binding(),
                },
            ],
        }));
    }

    fn upload(&mut self, input: &TraceInput<'_>) {
        let (Some(scene_ubo), Some(shade_ubo), Some(spheres), Some(targets)) = (
            self.scene_ubo.as_ref(),
            self.shade_ubo.as_ref(),
            self.sphere_buffer.as_ref(),
            self.targets.as_ref(),
        ) else {
            return;
        };

        self.queue.write_buffer(
            scene_ubo,
            0,
            bytemuck::bytes_of(&input.constants.to_gpu()),
        );
        self.queue
            .write_buffer(shade_ubo, 0, bytemuck::bytes_of(&input.shade));

        let mut packed = input.scene.to_gpu();
        if packed.is_empty() {
            packed.push(GpuSphere::zeroed());
        }
        self.queue
            .write_buffer(spheres, 0, bytemuck::cast_slice(&packed));

        self.ray_scratch.clear();
        self.ray_scratch
            .extend(input.rays.iter().map(|d| [d.x, d.y, d.z, 1.0]));
        self.queue
            .write_buffer(&targets.rays, 0, bytemuck::cast_slice(&self.ray_scratch));
    }

    fn read_samples(&self, targets: &Targets, samples: &mut [Vec4]) -> Result<(), TraceError> {
        let slice = targets.readback.slice(..);
        let (sender, receiver) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });

        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|e| TraceError::Readback(e.to_string()))?;
        receiver
            .recv()
            .map_err(|_| TraceError::Readback("map callback dropped".to_string()))?
            .map_err(|e| TraceError::Readback(e.to_string()))?;

        {
            let data = slice.get_mapped_range();
            let texels: &[[f32; 4]] = bytemuck::cast_slice(&data[..]);
            for (dst, src) in samples.iter_mut().zip(texels) {
                *dst = Vec4::from_array(*src);
            }
        }
        targets.readback.unmap();

        Ok(())
    }
}

impl ShadingBackend for DeviceBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Device
    }

    fn trace(&mut self, input: &TraceInput<'_>, samples: &mut [Vec4]) -> Result<(), TraceError> {
        input.check_sizes(samples)?;
        let extent = input.extent();
        if extent.is_empty() {
            return Ok(());
        }

        self.ensure_pipeline();
        self.ensure_sphere_capacity(input.scene.len());
        self.ensure_targets(extent);
        self.ensure_bind_group();
        self.upload(input);

        let (Some(pipeline), Some(bind_group), Some(targets)) = (
            self.pipeline.as_ref(),
            self.bind_group.as_ref(),
            self.targets.as_ref(),
        ) else {
            return Err(TraceError::Readback(
                "shade resources were not created".to_string(),
            ));
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("sphaera shade encoder"),
            });

        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("sphaera shade pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, bind_group, &[]);
            let (gx, gy) = Self::dispatch_size(extent);
            pass.dispatch_workgroups(gx, gy, 1);
        }

        let bytes = extent.pixel_count() as u64 * TEXEL_BYTES;
        encoder.copy_buffer_to_buffer(&targets.samples, 0, &targets.readback, 0, bytes);
        self.queue.submit(std::iter::once(encoder.finish()));

        self.read_samples(targets, samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_covers_partial_workgroups() {
        assert_eq!(DeviceBackend::dispatch_size(Extent::new(800, 600)), (80, 60));
        assert_eq!(DeviceBackend::dispatch_size(Extent::new(801, 1)), (81, 1));
        assert_eq!(DeviceBackend::dispatch_size(Extent::new(9, 10)), (1, 1));
    }
}
