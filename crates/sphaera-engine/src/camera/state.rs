use glam::{EulerRot, Quat, Vec3};

/// Position plus Euler rotation in degrees (pitch, yaw, roll).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraState {
    pub position: Vec3,
    pub rotation: Vec3,
}

impl Default for CameraState {
    /// Eight units behind the origin, looking down +Z.
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, -8.0),
            rotation: Vec3::ZERO,
        }
    }
}

impl CameraState {
    /// Orientation built from the Euler angles, applied X first, then Y, then Z.
    #[inline]
    pub fn orientation(&self) -> Quat {
        let r = self.rotation * (std::f32::consts::PI / 180.0);
        Quat::from_euler(EulerRot::ZYX, r.z, r.y, r.x)
    }

    /// True when position or rotation differs from `previous` at all.
    #[inline]
    pub fn moved_since(&self, previous: &CameraState) -> bool {
        self.position != previous.position || self.rotation != previous.rotation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rotation_is_identity() {
        let cam = CameraState::default();
        assert!(cam.orientation().abs_diff_eq(Quat::IDENTITY, 1e-6));
    }

    #[test]
    fn yaw_turns_forward_toward_plus_x() {
        let cam = CameraState {
            rotation: Vec3::new(0.0, 90.0, 0.0),
            ..CameraState::default()
        };
        let forward = cam.orientation() * Vec3::Z;
        assert!(forward.abs_diff_eq(Vec3::X, 1e-5), "{forward:?}");
    }

    #[test]
    fn any_delta_counts_as_motion() {
        let a = CameraState::default();
        let mut b = a;
        assert!(!b.moved_since(&a));

        b.rotation.y += 1e-4;
        assert!(b.moved_since(&a));
    }
}
