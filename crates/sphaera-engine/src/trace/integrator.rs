use glam::{Vec3, Vec4};
use rand::RngCore;

use super::intersect::intersect;
use super::rng::unit_jitter;
use crate::scene::Scene;

/// Color returned by rays that escape the scene.
pub const SKY_COLOR: Vec3 = Vec3::new(0.6, 0.7, 0.9);

/// Offset along the perturbed normal applied to secondary-ray origins.
pub const EPSILON: f32 = 1e-3;

pub const BOUNCES: u32 = 2;

/// Direction the light travels, `normalize(-1, -1, 1)`.
#[inline]
pub fn light_direction() -> Vec3 {
    Vec3::new(-1.0, -1.0, 1.0).normalize()
}

/// Shades one camera ray with a fixed two-bounce walk.
///
/// The contribution multiplier starts at 1.0 and halves after each hit. On a
/// miss the remaining multiplier scales `SKY_COLOR` and the walk stops. Each
/// hit consumes exactly three jitter draws from `rng` (x, y, z).
pub fn shade_pixel<R: RngCore + ?Sized>(
    scene: &Scene,
    origin: Vec3,
    direction: Vec3,
    rng: &mut R,
) -> Vec4 {
    let to_light = -light_direction();

    let mut color = Vec3::ZERO;
    let mut multiplier = 1.0f32;
    let mut ray_origin = origin;
    let mut ray_direction = direction;

    for _ in 0..BOUNCES {
        let hit = intersect(ray_origin, ray_direction, scene.spheres());
        if !hit.is_hit() {
            color += SKY_COLOR * multiplier;
            break;
        }

        let Some(sphere) = scene.get(hit.object_index) else {
            break;
        };

        let lambert = hit.normal.dot(to_light).max(0.0);
        color += sphere.albedo * lambert * multiplier;

        let jitter = Vec3::new(unit_jitter(rng), unit_jitter(rng), unit_jitter(rng));
        let normal = hit.normal + sphere.roughness * jitter;

        ray_origin = hit.position + normal * EPSILON;
        ray_direction = reflect(ray_direction, normal);
        multiplier *= 0.5;
    }

    color.extend(1.0)
}

/// `d - 2 * dot(d, n) * n`; `n` is used as given.
#[inline]
pub fn reflect(direction: Vec3, normal: Vec3) -> Vec3 {
    direction - 2.0 * direction.dot(normal) * normal
}
