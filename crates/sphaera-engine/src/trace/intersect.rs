use glam::Vec3;

use crate::scene::Sphere;

/// Nearest-hit record for one ray query.
///
/// A miss is encoded as `distance == HitResult::MISS_DISTANCE`; the remaining
/// fields are zeroed in that case.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct HitResult {
    pub distance: f32,
    pub normal: Vec3,
    pub position: Vec3,
    pub object_index: u32,
}

impl HitResult {
    pub const MISS_DISTANCE: f32 = -1.0;

    #[inline]
    pub const fn miss() -> Self {
        Self {
            distance: Self::MISS_DISTANCE,
            normal: Vec3::ZERO,
            position: Vec3::ZERO,
            object_index: 0,
        }
    }

    #[inline]
    pub fn is_hit(&self) -> bool {
        self.distance >= 0.0
    }
}

/// Intersects a ray against every sphere and returns the nearest non-negative hit.
///
/// `direction` is used as given; it does not need to be unit length because
/// `a = dot(d, d)` feeds both the quadratic and the `t -> position` step.
/// Equal distances keep the lower sphere index.
pub fn intersect(origin: Vec3, direction: Vec3, spheres: &[Sphere]) -> HitResult {
    let a = direction.dot(direction);
    if !(a > 0.0) || !a.is_finite() || !origin.is_finite() {
        return HitResult::miss();
    }

    let mut closest = f32::MAX;
    let mut closest_index: Option<usize> = None;

    for (index, sphere) in spheres.iter().enumerate() {
        if sphere.is_degenerate() {
            continue;
        }

        let oc = origin - sphere.center;
        let b = 2.0 * oc.dot(direction);
        let c = oc.dot(oc) - sphere.radius * sphere.radius;

        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            continue;
        }

        let root = discriminant.sqrt();
        let near = (-b - root) / (2.0 * a);
        let far = (-b + root) / (2.0 * a);

        let t = if near >= 0.0 {
            near
        } else if far >= 0.0 {
            far
        } else {
            continue;
        };

        if closest > t {
            closest = t;
            closest_index = Some(index);
        }
    }

    let Some(index) = closest_index else {
        return HitResult::miss();
    };

    let sphere = &spheres[index];
    let position = origin + direction * closest;

    HitResult {
        distance: closest,
        normal: (position - sphere.center).normalize_or_zero(),
        position,
        object_index: index as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn unit_sphere_at(center: Vec3, radius: f32) -> Sphere {
        Sphere {
            center,
            radius,
            ..Sphere::default()
        }
    }

    // ── misses ────────────────────────────────────────────────────────────

    #[test]
    fn empty_scene_misses() {
        let hit = intersect(Vec3::ZERO, Vec3::Z, &[]);
        assert!(!hit.is_hit());
        assert_eq!(hit.distance, -1.0);
    }

    #[test]
    fn ray_pointing_away_misses() {
        let spheres = [unit_sphere_at(Vec3::ZERO, 1.0)];
        let hit = intersect(Vec3::new(0.0, 0.0, -5.0), -Vec3::Z, &spheres);
        assert!(!hit.is_hit());
    }

    #[test]
    fn zero_length_direction_misses() {
        let spheres = [unit_sphere_at(Vec3::ZERO, 1.0)];
        let hit = intersect(Vec3::new(0.0, 0.0, -5.0), Vec3::ZERO, &spheres);
        assert!(!hit.is_hit());
    }

    #[test]
    fn degenerate_radius_is_skipped() {
        let spheres = [unit_sphere_at(Vec3::ZERO, 0.0)];
        let hit = intersect(Vec3::new(0.0, 0.0, -5.0), Vec3::Z, &spheres);
        assert!(!hit.is_hit());
        assert!(hit.normal.is_finite());
    }

    // ── hits ──────────────────────────────────────────────────────────────

    #[test]
    fn hit_distance_is_origin_distance_minus_radius() {
        let r = 1.5;
        let spheres = [unit_sphere_at(Vec3::ZERO, r)];
        let origin = Vec3::new(0.0, 0.0, -8.0);
        let hit = intersect(origin, Vec3::Z, &spheres);

        assert!(hit.is_hit());
        assert!((hit.distance - (origin.length() - r)).abs() < EPS);
        assert!((hit.normal - Vec3::new(0.0, 0.0, -1.0)).length() < EPS);
        assert!((hit.normal.length() - 1.0).abs() < EPS);
    }

    #[test]
    fn unnormalized_direction_scales_distance_not_position() {
        let spheres = [unit_sphere_at(Vec3::ZERO, 1.0)];
        let origin = Vec3::new(0.0, 0.0, -8.0);
        let hit = intersect(origin, Vec3::new(0.0, 0.0, 2.0), &spheres);

        assert!((hit.distance - 3.5).abs() < EPS);
        assert!((hit.position - Vec3::new(0.0, 0.0, -1.0)).length() < EPS);
    }

    #[test]
    fn origin_inside_sphere_takes_far_root() {
        let spheres = [unit_sphere_at(Vec3::ZERO, 2.0)];
        let hit = intersect(Vec3::ZERO, Vec3::X, &spheres);

        assert!(hit.is_hit());
        assert!((hit.distance - 2.0).abs() < EPS);
        assert!((hit.normal - Vec3::X).length() < EPS);
    }

    #[test]
    fn nearest_sphere_wins() {
        let spheres = [
            unit_sphere_at(Vec3::new(0.0, 0.0, 10.0), 1.0),
            unit_sphere_at(Vec3::new(0.0, 0.0, 4.0), 1.0),
        ];
        let hit = intersect(Vec3::ZERO, Vec3::Z, &spheres);
        assert_eq!(hit.object_index, 1);
        assert!((hit.distance - 3.0).abs() < EPS);
    }

    #[test]
    fn equal_distance_keeps_lower_index() {
        let s = unit_sphere_at(Vec3::new(0.0, 0.0, 4.0), 1.0);
        let hit = intersect(Vec3::ZERO, Vec3::Z, &[s, s]);
        assert_eq!(hit.object_index, 0);
    }
}
