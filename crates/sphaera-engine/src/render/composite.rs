use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};

use super::{RenderCtx, RenderTarget};

/// Tonemap parameters: `out = pow(1 - exp(-hdr * exposure), 1 / gamma)`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Tonemap {
    pub exposure: f32,
    pub gamma: f32,
}

impl Default for Tonemap {
    fn default() -> Self {
        Self {
            exposure: 1.0,
            gamma: 2.2,
        }
    }
}

impl Tonemap {
    /// Host-side reference of the fragment shader's curve.
    pub fn apply(&self, hdr: f32) -> f32 {
        (1.0 - (-hdr * self.exposure).exp()).powf(1.0 / self.gamma)
    }
}

/// Uniform block for `Tonemap`.
///
/// Layout (16 bytes):
///   exposure f32     @ 0
///   gamma    f32     @ 4
///   _pad     [f32;2] @ 8
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct TonemapUniform {
    exposure: f32,
    gamma: f32,
    _pad: [f32; 2],
}

/// Fullscreen pass that samples the HDR color image into the drawable.
#[derive(Default)]
pub struct CompositePass {
    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,
    bind_group_layout: Option<wgpu::BindGroupLayout>,
    tonemap_ubo: Option<wgpu::Buffer>,

    bind_group: Option<wgpu::BindGroup>,
    /// Generation of the color image `bind_group` was built for.
    bound_generation: Option<u64>,
}

impl CompositePass {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the composite pass. `color_view` must be in its shader-read state.
    pub fn draw(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        color_view: &wgpu::TextureView,
        color_generation: u64,
        tonemap: Tonemap,
    ) {
        self.ensure_pipeline(ctx);
        self.ensure_bind_group(ctx, color_view, color_generation);
        self.write_tonemap(ctx, tonemap);

        let Some(pipeline) = self.pipeline.as_ref() else { return; };
        let Some(bind_group) = self.bind_group.as_ref() else { return; };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("sphaera composite pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, bind_group, &[]);
        rpass.draw(0..3, 0..1);
    }

    // ── private helpers ────────────────────────────────────────────────────

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format == Some(ctx.surface_format) && self.pipeline.is_some() {
            return;
        }

        if ctx.surface_format.is_srgb() {
            log::warn!(
                "composite target {:?} is sRGB; gamma will be applied twice",
                ctx.surface_format
            );
        }

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sphaera composite shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/composite.wgsl").into()),
        });

        let bind_group_layout =
            ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("sphaera composite bgl"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: false },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: NonZeroU64::new(
                                std::mem::size_of::<TonemapUniform>() as u64,
                            ),
                        },
                        count: None,
                    },
                ],
            });

        let pipeline_layout =
            ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("sphaera composite pipeline layout"),
                bind_group_layouts: &[&bind_group_layout],
                immediate_size: 0,
            });

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("sphaera composite pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        self.tonemap_ubo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("sphaera tonemap ubo"),
            size: std::mem::size_of::<TonemapUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));

        self.pipeline_format = Some(ctx.surface_format);
        self.pipeline = Some(pipeline);
        self.bind_group_layout = Some(bind_group_layout);
        self.bind_group = None;
        self.bound_generation = None;
    }

    fn ensure_bind_group(
        &mut self,
        ctx: &RenderCtx<'_>,
        color_view: &wgpu::TextureView,
        generation: u64,
    ) {
        if self.bound_generation == Some(generation) && self.bind_group.is_some() {
            return;
        }
        let Some(bgl) = self.bind_group_layout.as_ref() else { return; };
        let Some(ubo) = self.tonemap_ubo.as_ref() else { return; };

        self.bind_group = Some(ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sphaera composite bind group"),
            layout: bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(color_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: ubo.as_entire_binding(),
                },
            ],
        }));
        self.bound_generation = Some(generation);
    }

    fn write_tonemap(&self, ctx: &RenderCtx<'_>, tonemap: Tonemap) {
        let Some(ubo) = self.tonemap_ubo.as_ref() else { return; };
        let uniform = TonemapUniform {
            exposure: tonemap.exposure,
            gamma: tonemap.gamma.max(f32::EPSILON),
            _pad: [0.0; 2],
        };
        ctx.queue.write_buffer(ubo, 0, bytemuck::bytes_of(&uniform));
    }
}
