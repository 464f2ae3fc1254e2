use crate::coords::Extent;

/// Renderer-facing context: device/queue, surface format, drawable extent.
pub struct RenderCtx<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub surface_format: wgpu::TextureFormat,
    /// Drawable size in physical pixels.
    pub extent: Extent,
}

impl<'a> RenderCtx<'a> {
    #[inline]
    pub fn new(
        device: &'a wgpu::Device,
        queue: &'a wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        extent: Extent,
    ) -> Self {
        Self {
            device,
            queue,
            surface_format,
            extent,
        }
    }
}

/// Target for drawing (encoder + drawable view).
pub struct RenderTarget<'a> {
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub color_view: &'a wgpu::TextureView,
}

impl<'a> RenderTarget<'a> {
    #[inline]
    pub fn new(encoder: &'a mut wgpu::CommandEncoder, color_view: &'a wgpu::TextureView) -> Self {
        Self {
            encoder,
            color_view,
        }
    }
}
