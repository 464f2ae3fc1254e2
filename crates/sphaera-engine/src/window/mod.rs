//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and the single viewer window, and wires them
//! to the GPU layer.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
