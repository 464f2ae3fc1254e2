//! Sphaera engine crate.
//!
//! A progressive path tracer over an analytic sphere scene. Each frame a ray
//! is generated per pixel, shaded by a host (rayon) or device (wgpu compute)
//! backend, and folded into a running mean that is tonemapped to the window.
//! Camera motion or a resize restarts the accumulation.

pub mod accumulate;
pub mod barrier;
pub mod camera;
pub mod config;
pub mod coords;
pub mod core;
pub mod device;
pub mod input;
pub mod logging;
pub mod pipeline;
pub mod render;
pub mod scene;
pub mod time;
pub mod trace;
pub mod window;
