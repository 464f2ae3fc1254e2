//! Analytic scene description.
//!
//! The scene is a small, ordered, immutable list of spheres. Objects are
//! addressed by their index in that list; hit records carry the index back to
//! the integrator so it can look up material parameters.

mod sphere;

pub use sphere::{GpuSphere, Sphere};

/// Ordered sphere list shared read-only with shading workers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    spheres: Vec<Sphere>,
}

impl Scene {
    #[inline]
    pub fn new(spheres: Vec<Sphere>) -> Self {
        Self { spheres }
    }

    /// Two-sphere scene: a rough magenta ball resting on a large blue ground sphere.
    pub fn default_scene() -> Self {
        Self::new(vec![
            Sphere {
                center: glam::Vec3::ZERO,
                radius: 1.0,
                albedo: glam::Vec3::new(1.0, 0.0, 1.0),
                roughness: 1.0,
                metallic: 0.0,
            },
            Sphere {
                center: glam::Vec3::new(0.0, -1001.0, 0.0),
                radius: 1000.0,
                albedo: glam::Vec3::new(0.0, 0.0, 1.0),
                roughness: 0.1,
                metallic: 0.0,
            },
        ])
    }

    #[inline]
    pub fn spheres(&self) -> &[Sphere] {
        &self.spheres
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.spheres.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.spheres.is_empty()
    }

    /// Returns the sphere at `index`, if any.
    #[inline]
    pub fn get(&self, index: u32) -> Option<&Sphere> {
        self.spheres.get(index as usize)
    }

    /// Packs the sphere list into the storage-buffer layout read by the shading kernel.
    pub fn to_gpu(&self) -> Vec<GpuSphere> {
        self.spheres.iter().map(GpuSphere::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_scene_is_index_addressed() {
        let scene = Scene::default_scene();
        assert_eq!(scene.len(), 2);
        assert_eq!(scene.get(0).map(|s| s.radius), Some(1.0));
        assert_eq!(scene.get(1).map(|s| s.radius), Some(1000.0));
        assert!(scene.get(2).is_none());
    }

    #[test]
    fn gpu_packing_preserves_order() {
        let scene = Scene::default_scene();
        let packed = scene.to_gpu();
        assert_eq!(packed.len(), 2);
        assert_eq!(packed[1].center, [0.0, -1001.0, 0.0]);
        assert_eq!(packed[0].albedo, [1.0, 0.0, 1.0]);
    }
}
