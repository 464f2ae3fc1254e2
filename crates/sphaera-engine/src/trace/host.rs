use glam::Vec4;
use rayon::prelude::*;

use super::backend::{BackendKind, ShadingBackend, TraceError, TraceInput};
use super::integrator::shade_pixel;
use super::rng::PixelRng;

/// Shades on the rayon pool, one independent `PixelRng` per pixel.
///
/// Workers share only the read-only scene and ray buffer; each writes its own
/// sample slot. `trace` returns after the pool has joined.
#[derive(Debug, Default)]
pub struct HostBackend;

impl HostBackend {
    pub fn new() -> Self {
        Self
    }
}

impl ShadingBackend for HostBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Host
    }

    fn trace(&mut self, input: &TraceInput<'_>, samples: &mut [Vec4]) -> Result<(), TraceError> {
        input.check_sizes(samples)?;

        let scene = input.scene;
        let origin = input.constants.camera_position;
        let seed = input.shade.seed;

        samples
            .par_iter_mut()
            .zip(input.rays.par_iter())
            .enumerate()
            .for_each(|(pixel, (sample, &direction))| {
                let mut rng = PixelRng::new(seed, pixel as u32);
                *sample = shade_pixel(scene, origin, direction, &mut rng);
            });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{CameraState, SceneConstants};
    use crate::coords::Extent;
    use crate::scene::Scene;
    use crate::trace::{generate_rays, ShadeConstants};
    use glam::Vec3;

    fn frame(extent: Extent, seed: u32) -> (Scene, SceneConstants, Vec<Vec3>, ShadeConstants) {
        let scene = Scene::default_scene();
        let camera = CameraState::default();
        let constants = SceneConstants::from_camera(&camera, extent.aspect());
        let mut rays = vec![Vec3::ZERO; extent.pixel_count()];
        generate_rays(constants.inverse_view_projection, extent, &mut rays).unwrap();
        let shade = ShadeConstants::new(camera.position, 0.0, 1, seed, extent);
        (scene, constants, rays, shade)
    }

    #[test]
    fn matches_serial_shading() {
        let extent = Extent::new(16, 12);
        let (scene, constants, rays, shade) = frame(extent, 99);
        let input = TraceInput {
            scene: &scene,
            constants: &constants,
            rays: &rays,
            shade,
        };

        let mut samples = vec![Vec4::ZERO; extent.pixel_count()];
        HostBackend::new().trace(&input, &mut samples).unwrap();

        for (i, (&s, &d)) in samples.iter().zip(&rays).enumerate() {
            let mut rng = PixelRng::new(99, i as u32);
            assert_eq!(s, shade_pixel(&scene, constants.camera_position, d, &mut rng));
            assert_eq!(s.w, 1.0);
        }
    }

    #[test]
    fn rejects_short_sample_buffer() {
        let extent = Extent::new(4, 4);
        let (scene, constants, rays, shade) = frame(extent, 0);
        let input = TraceInput {
            scene: &scene,
            constants: &constants,
            rays: &rays,
            shade,
        };

        let mut samples = vec![Vec4::ZERO; 3];
        let err = HostBackend::new().trace(&input, &mut samples).unwrap_err();
        assert_eq!(
            err,
            TraceError::SizeMismatch {
                expected: 16,
                actual: 3
            }
        );
    }
}
