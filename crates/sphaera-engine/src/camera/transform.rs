use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};

use super::state::CameraState;

pub const FOV_Y_DEGREES: f32 = 60.0;
pub const Z_NEAR: f32 = 0.01;

/// Per-frame camera matrices.
///
/// The projection is left-handed with reversed depth and an infinite far
/// plane, so unprojecting NDC depth 0 lands on the plane at infinity and the
/// resulting `xyz` is a world-space direction.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SceneConstants {
    pub projection: Mat4,
    pub view: Mat4,
    pub view_projection: Mat4,
    pub inverse_view_projection: Mat4,
    pub camera_position: Vec3,
}

impl SceneConstants {
    pub fn from_camera(camera: &CameraState, aspect: f32) -> Self {
        let projection =
            Mat4::perspective_infinite_reverse_lh(FOV_Y_DEGREES.to_radians(), aspect, Z_NEAR);
        let view =
            Mat4::from_rotation_translation(camera.orientation(), camera.position).inverse();
        let view_projection = projection * view;

        Self {
            projection,
            view,
            view_projection,
            inverse_view_projection: view_projection.inverse(),
            camera_position: camera.position,
        }
    }

    /// Unprojects a normalized device coordinate into a (non-normalized) ray direction.
    #[inline]
    pub fn unproject(&self, ndc_x: f32, ndc_y: f32) -> Vec3 {
        (self.inverse_view_projection * Vec4::new(ndc_x, ndc_y, 0.0, 1.0)).truncate()
    }

    pub fn to_gpu(&self) -> GpuSceneConstants {
        GpuSceneConstants {
            projection: self.projection.to_cols_array_2d(),
            view: self.view.to_cols_array_2d(),
            view_projection: self.view_projection.to_cols_array_2d(),
            inverse_view_projection: self.inverse_view_projection.to_cols_array_2d(),
            camera_position: self.camera_position.to_array(),
            _pad: 0.0,
        }
    }
}

/// GPU uniform block for `SceneConstants`.
///
/// Layout (272 bytes):
///   projection               [f32;16] @   0
///   view                     [f32;16] @  64
///   view_projection          [f32;16] @ 128
///   inverse_view_projection  [f32;16] @ 192
///   camera_position          [f32; 3] @ 256
///   _pad                     f32      @ 268
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct GpuSceneConstants {
    pub projection: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub view_projection: [[f32; 4]; 4],
    pub inverse_view_projection: [[f32; 4]; 4],
    pub camera_position: [f32; 3],
    pub _pad: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    #[test]
    fn center_ray_points_down_plus_z() {
        let sc = SceneConstants::from_camera(&CameraState::default(), 4.0 / 3.0);
        let d = sc.unproject(0.0, 0.0);
        assert!(d.abs_diff_eq(Vec3::Z, EPS), "{d:?}");
    }

    #[test]
    fn inverse_round_trips() {
        let cam = CameraState {
            position: Vec3::new(1.0, 2.0, -3.0),
            rotation: Vec3::new(10.0, 20.0, 0.0),
        };
        let sc = SceneConstants::from_camera(&cam, 1.5);
        let id = sc.view_projection * sc.inverse_view_projection;
        assert!(id.abs_diff_eq(Mat4::IDENTITY, EPS));
    }

    #[test]
    fn view_moves_camera_to_origin() {
        let cam = CameraState::default();
        let sc = SceneConstants::from_camera(&cam, 1.0);
        let p = sc.view.transform_point3(cam.position);
        assert!(p.abs_diff_eq(Vec3::ZERO, EPS));
    }

    #[test]
    fn right_edge_ray_leans_toward_plus_x() {
        let sc = SceneConstants::from_camera(&CameraState::default(), 1.0);
        let d = sc.unproject(1.0, 0.0);
        assert!(d.x > 0.0 && d.z > 0.0);
        // Half the horizontal FOV at aspect 1 is 30 degrees.
        let angle = d.x.atan2(d.z).to_degrees();
        assert!((angle - 30.0).abs() < 1e-2, "{angle}");
    }

    #[test]
    fn gpu_block_is_272_bytes() {
        assert_eq!(std::mem::size_of::<GpuSceneConstants>(), 272);
    }
}
