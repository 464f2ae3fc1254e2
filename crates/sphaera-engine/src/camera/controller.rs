use glam::{Mat3, Vec3};

use super::state::CameraState;
use crate::input::{InputFrame, InputState, Key, MouseButton};

/// Pointer grab transition the caller must apply to the window cursor.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum GrabChange {
    Grabbed,
    Released,
}

/// WASD + mouse-look fly camera.
///
/// Left click grabs the pointer, Escape releases it. Movement and look only
/// apply while grabbed. The controller never signals accumulation resets;
/// callers compare `CameraState` before and after `update`.
#[derive(Debug, Clone)]
pub struct CameraController {
    move_speed: f32,
    look_sensitivity: f32,
    grabbed: bool,
    skip_next_motion: bool,
}

impl CameraController {
    pub const PITCH_LIMIT: f32 = 90.0;

    pub fn new(move_speed: f32, look_sensitivity: f32) -> Self {
        Self {
            move_speed,
            look_sensitivity,
            grabbed: false,
            skip_next_motion: false,
        }
    }

    #[inline]
    pub fn is_grabbed(&self) -> bool {
        self.grabbed
    }

    /// Drops the next pointer delta; call after resize or cursor warps.
    #[inline]
    pub fn skip_next_motion(&mut self) {
        self.skip_next_motion = true;
    }

    /// Forces the pointer back to released, e.g. when grabbing the cursor failed.
    pub fn release(&mut self) {
        self.grabbed = false;
    }

    /// Applies one frame of input to `camera`.
    pub fn update(
        &mut self,
        camera: &mut CameraState,
        input: &InputState,
        frame: &InputFrame,
        dt: f32,
    ) -> Option<GrabChange> {
        let mut change = None;

        if !self.grabbed && frame.button_pressed(MouseButton::Left) {
            self.grabbed = true;
            self.skip_next_motion = true;
            change = Some(GrabChange::Grabbed);
        } else if self.grabbed && frame.key_pressed(Key::Escape) {
            self.grabbed = false;
            change = Some(GrabChange::Released);
        }

        if frame.pointer_entered {
            self.skip_next_motion = true;
        }

        if !self.grabbed {
            return change;
        }

        let impulse = Self::impulse(input);
        if impulse != Vec3::ZERO {
            let velocity =
                (Mat3::from_quat(camera.orientation()) * impulse).normalize() * self.move_speed;
            camera.position += velocity * dt;
        }

        let (dx, dy) = frame.pointer_delta;
        if dx != 0.0 || dy != 0.0 {
            if self.skip_next_motion {
                self.skip_next_motion = false;
            } else {
                camera.rotation.x += dy * self.look_sensitivity * dt;
                camera.rotation.y += dx * self.look_sensitivity * dt;
                camera.rotation.x = camera
                    .rotation
                    .x
                    .clamp(-Self::PITCH_LIMIT, Self::PITCH_LIMIT);
            }
        }

        change
    }

    /// `(right - left, 0, forward - back)` from held keys.
    fn impulse(input: &InputState) -> Vec3 {
        let axis = |pos: bool, neg: bool| (pos as i32 - neg as i32) as f32;

        let forward = input.key_down(Key::W) || input.key_down(Key::ArrowUp);
        let back = input.key_down(Key::S) || input.key_down(Key::ArrowDown);
        let right = input.key_down(Key::D) || input.key_down(Key::ArrowRight);
        let left = input.key_down(Key::A) || input.key_down(Key::ArrowLeft);

        Vec3::new(axis(right, left), 0.0, axis(forward, back))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{InputEvent, KeyState, MouseButtonState};

    fn press(state: &mut InputState, frame: &mut InputFrame, key: Key) {
        state.apply_event(
            frame,
            InputEvent::Key {
                key,
                state: KeyState::Pressed,
                repeat: false,
            },
        );
    }

    fn click(state: &mut InputState, frame: &mut InputFrame) {
        state.apply_event(
            frame,
            InputEvent::PointerButton {
                button: MouseButton::Left,
                state: MouseButtonState::Pressed,
            },
        );
    }

    fn grabbed_controller() -> (CameraController, InputState, InputFrame, CameraState) {
        let mut ctl = CameraController::new(10.0, 4.096);
        let mut input = InputState::default();
        let mut frame = InputFrame::default();
        let mut cam = CameraState::default();

        click(&mut input, &mut frame);
        assert_eq!(
            ctl.update(&mut cam, &input, &frame, 0.016),
            Some(GrabChange::Grabbed)
        );
        frame.clear();
        (ctl, input, frame, cam)
    }

    // ── grabbing ──────────────────────────────────────────────────────────

    #[test]
    fn ungrabbed_ignores_movement() {
        let mut ctl = CameraController::new(10.0, 4.096);
        let mut input = InputState::default();
        let mut frame = InputFrame::default();
        let mut cam = CameraState::default();

        press(&mut input, &mut frame, Key::W);
        frame.pointer_delta = (10.0, 10.0);

        assert_eq!(ctl.update(&mut cam, &input, &frame, 0.1), None);
        assert_eq!(cam, CameraState::default());
    }

    #[test]
    fn escape_releases() {
        let (mut ctl, mut input, mut frame, mut cam) = grabbed_controller();
        press(&mut input, &mut frame, Key::Escape);
        assert_eq!(
            ctl.update(&mut cam, &input, &frame, 0.016),
            Some(GrabChange::Released)
        );
        assert!(!ctl.is_grabbed());
    }

    // ── motion ────────────────────────────────────────────────────────────

    #[test]
    fn forward_moves_along_view_direction() {
        let (mut ctl, mut input, mut frame, mut cam) = grabbed_controller();
        press(&mut input, &mut frame, Key::W);
        ctl.update(&mut cam, &input, &frame, 0.5);

        assert!(cam.position.abs_diff_eq(glam::Vec3::new(0.0, 0.0, -3.0), 1e-5));
    }

    #[test]
    fn first_motion_after_grab_is_dropped() {
        let (mut ctl, input, mut frame, mut cam) = grabbed_controller();

        frame.pointer_delta = (100.0, 100.0);
        ctl.update(&mut cam, &input, &frame, 0.1);
        assert_eq!(cam.rotation, glam::Vec3::ZERO);

        frame.pointer_delta = (10.0, 5.0);
        ctl.update(&mut cam, &input, &frame, 0.5);
        assert!((cam.rotation.y - 10.0 * 4.096 * 0.5).abs() < 1e-4);
        assert!((cam.rotation.x - 5.0 * 4.096 * 0.5).abs() < 1e-4);
    }

    #[test]
    fn pitch_is_clamped() {
        let (mut ctl, input, mut frame, mut cam) = grabbed_controller();
        frame.pointer_delta = (0.0, 1.0);
        ctl.update(&mut cam, &input, &frame, 0.1);

        frame.pointer_delta = (0.0, 10_000.0);
        ctl.update(&mut cam, &input, &frame, 1.0);
        assert_eq!(cam.rotation.x, CameraController::PITCH_LIMIT);
    }
}
