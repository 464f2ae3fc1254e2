//! Per-pixel shading: ray generation, ray/sphere intersection, the two-bounce
//! integrator, and the host and device backends that run it.
//!
//! Data flow for one frame:
//! `generate_rays` fills the ray buffer, a `ShadingBackend` turns
//! `(scene, rays, ShadeConstants)` into one sample per pixel, and the
//! accumulator folds those samples into the running average.

mod backend;
mod device;
mod host;
mod integrator;
mod intersect;
mod raygen;
mod rng;

pub use backend::{
    BackendKind, ShadeConstants, ShadingBackend, TraceError, TraceInput, UnknownBackend,
};
pub use device::{DeviceBackend, WORKGROUP_SIZE};
pub use host::HostBackend;
pub use integrator::{light_direction, reflect, shade_pixel, BOUNCES, EPSILON, SKY_COLOR};
pub use intersect::{intersect, HitResult};
pub use raygen::{generate_rays, RayGenError};
pub use rng::{pcg_hash, unit_jitter, PixelRng};
