//! GPU device + surface management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue (windowed or headless)
//! - creating & configuring the Surface (swapchain)
//! - acquiring frames and providing encoders/views for rendering
//! - the device-idle wait that guards resolution-dependent reallocation

mod error;
mod frame;
mod gpu;
mod headless;
mod init;
mod surface;

pub use error::SurfaceErrorAction;
pub use frame::GpuFrame;
pub use gpu::Gpu;
pub use headless::HeadlessGpu;
pub use init::GpuInit;
