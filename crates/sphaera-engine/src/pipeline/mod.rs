//! The per-frame render-loop state and its step function.

mod frame;

pub use frame::{FrameError, FramePipeline, FrameReport};
