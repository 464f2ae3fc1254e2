/// A single acquired drawable plus the encoder that records into it.
///
/// Short-lived: holding the surface texture blocks acquisition of the next one.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}

impl GpuFrame {
    /// Drawable size in physical pixels.
    #[inline]
    pub fn size(&self) -> (u32, u32) {
        let t = &self.surface_texture.texture;
        (t.width(), t.height())
    }
}
