//! Frame timing.
//!
//! - one `FrameClock` per window; `tick()` once per presented frame
//! - `FrameStats` keeps a rolling frame-time average for periodic reporting

mod frame_clock;
mod stats;

pub use frame_clock::{FrameClock, FrameTime};
pub use stats::FrameStats;
