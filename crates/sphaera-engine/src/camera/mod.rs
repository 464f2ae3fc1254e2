//! Camera state, per-frame transforms, and the fly-camera controller.
//!
//! `CameraState` is the only thing input handling mutates. Everything
//! downstream (ray generation, shading constants) derives from a
//! `SceneConstants` snapshot taken once per frame.

mod controller;
mod state;
mod transform;

pub use controller::{CameraController, GrabChange};
pub use state::CameraState;
pub use transform::{GpuSceneConstants, SceneConstants, FOV_Y_DEGREES, Z_NEAR};
