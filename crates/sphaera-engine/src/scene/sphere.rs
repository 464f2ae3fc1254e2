use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Analytic sphere with a simple material.
///
/// `metallic` is carried for completeness; the integrator does not read it.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
    pub albedo: Vec3,
    /// Reflection jitter scale in `[0, 1]`.
    pub roughness: f32,
    pub metallic: f32,
}

impl Default for Sphere {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            radius: 0.5,
            albedo: Vec3::ONE,
            roughness: 1.0,
            metallic: 0.0,
        }
    }
}

impl Sphere {
    /// A sphere with a non-positive or non-finite radius can never be hit.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        !(self.radius > 0.0 && self.radius.is_finite()) || !self.center.is_finite()
    }
}

/// Storage-buffer layout (48 bytes, WGSL struct alignment 16):
///
///  offset  0  center     vec3<f32>
///  offset 12  radius     f32
///  offset 16  albedo     vec3<f32>
///  offset 28  roughness  f32
///  offset 32  metallic   f32
///  offset 36  _pad       [f32; 3]
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct GpuSphere {
    pub center: [f32; 3],
    pub radius: f32,
    pub albedo: [f32; 3],
    pub roughness: f32,
    pub metallic: f32,
    pub _pad: [f32; 3],
}

impl From<&Sphere> for GpuSphere {
    fn from(s: &Sphere) -> Self {
        Self {
            center: s.center.to_array(),
            radius: s.radius,
            albedo: s.albedo.to_array(),
            roughness: s.roughness,
            metallic: s.metallic,
            _pad: [0.0; 3],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_documented_material() {
        let s = Sphere::default();
        assert_eq!(s.radius, 0.5);
        assert_eq!(s.albedo, Vec3::ONE);
    }

    #[test]
    fn degenerate_radius_detected() {
        let mut s = Sphere::default();
        assert!(!s.is_degenerate());
        s.radius = 0.0;
        assert!(s.is_degenerate());
        s.radius = f32::NAN;
        assert!(s.is_degenerate());
    }

    #[test]
    fn gpu_layout_is_48_bytes() {
        assert_eq!(std::mem::size_of::<GpuSphere>(), 48);
    }
}
