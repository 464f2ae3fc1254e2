use glam::Vec4;

use super::composite::{CompositePass, Tonemap};
use super::{RenderCtx, RenderTarget};
use crate::barrier::{BarrierError, FrameBarrierSequencer, ImageId, ImageLayout};
use crate::coords::Extent;

/// Bytes per texel of the HDR color image (`Rgba32Float`).
pub const COLOR_TEXEL_BYTES: u32 = 16;

struct ColorImage {
    extent: Extent,
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

/// Presents the displayed image: uploads it into the HDR color image, then
/// composites that onto the drawable.
///
/// Every frame walks the same layout schedule through a
/// [`FrameBarrierSequencer`]; a frame that breaks it is abandoned.
pub struct Renderer {
    tonemap: Tonemap,
    composite: CompositePass,
    color: Option<ColorImage>,
    color_generation: u64,
    barriers: FrameBarrierSequencer,
    /// Zero-filled upload used before the first sample exists.
    blank: Vec<u8>,
}

impl Renderer {
    pub fn new(tonemap: Tonemap) -> Self {
        Self {
            tonemap,
            composite: CompositePass::new(),
            color: None,
            color_generation: 0,
            barriers: FrameBarrierSequencer::new(),
            blank: Vec::new(),
        }
    }

    #[inline]
    pub fn tonemap(&self) -> Tonemap {
        self.tonemap
    }

    pub fn set_tonemap(&mut self, tonemap: Tonemap) {
        self.tonemap = tonemap;
    }

    #[inline]
    pub fn barriers(&self) -> &FrameBarrierSequencer {
        &self.barriers
    }

    /// Drops resolution-dependent images. The caller waits for device idle first.
    pub fn resize(&mut self) {
        self.color = None;
        self.blank.clear();
        self.barriers.reset();
    }

    /// Records one presented frame into `target`.
    ///
    /// `displayed` is the running mean in row-major order, or `None` before the
    /// first fold, in which case black is shown.
    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        displayed: Option<&[Vec4]>,
        extent: Extent,
    ) -> Result<(), BarrierError> {
        let result = self.record(ctx, target, displayed, extent);
        if result.is_err() {
            self.barriers.abandon_frame();
        }
        result
    }

    fn record(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        displayed: Option<&[Vec4]>,
        extent: Extent,
    ) -> Result<(), BarrierError> {
        if extent.is_empty() {
            return Ok(());
        }
        self.ensure_color(ctx, extent);

        self.barriers.begin_frame()?;

        self.barriers.transition(ImageId::Color, ImageLayout::General)?;
        self.upload(ctx, displayed, extent);

        self.barriers.transition(ImageId::Color, ImageLayout::ShaderReadOnly)?;
        self.barriers.transition(ImageId::Drawable, ImageLayout::ColorAttachment)?;

        if let Some(color) = self.color.as_ref() {
            self.composite
                .draw(ctx, target, &color.view, self.color_generation, self.tonemap);
        }

        self.barriers.transition(ImageId::Drawable, ImageLayout::PresentSrc)?;
        self.barriers.finish_frame()?;
        Ok(())
    }

    // ── private helpers ────────────────────────────────────────────────────

    fn ensure_color(&mut self, ctx: &RenderCtx<'_>, extent: Extent) {
        if self.color.as_ref().is_some_and(|c| c.extent == extent) {
            return;
        }

        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("sphaera color image"),
            size: wgpu::Extent3d {
                width: extent.width,
                height: extent.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba32Float,
            usage: wgpu::TextureUsages::COPY_DST | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        log::debug!("color image allocated at {}x{}", extent.width, extent.height);

        // A fresh image has no defined contents.
        self.barriers.reset();
        self.color_generation = self.color_generation.wrapping_add(1);
        self.color = Some(ColorImage {
            extent,
            texture,
            view,
        });
    }

    fn upload(&mut self, ctx: &RenderCtx<'_>, displayed: Option<&[Vec4]>, extent: Extent) {
        let Some(color) = self.color.as_ref() else { return; };

        let bytes: &[u8] = match displayed {
            Some(pixels) if pixels.len() == extent.pixel_count() => bytemuck::cast_slice(pixels),
            Some(pixels) => {
                log::warn!(
                    "displayed image has {} pixels, color image expects {}; showing black",
                    pixels.len(),
                    extent.pixel_count()
                );
                Self::blank(&mut self.blank, extent)
            }
            None => Self::blank(&mut self.blank, extent),
        };

        ctx.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &color.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytes,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(extent.width * COLOR_TEXEL_BYTES),
                rows_per_image: Some(extent.height),
            },
            wgpu::Extent3d {
                width: extent.width,
                height: extent.height,
                depth_or_array_layers: 1,
            },
        );
    }

    fn blank(scratch: &mut Vec<u8>, extent: Extent) -> &[u8] {
        scratch.resize(extent.pixel_count() * COLOR_TEXEL_BYTES as usize, 0);
        scratch
    }
}
