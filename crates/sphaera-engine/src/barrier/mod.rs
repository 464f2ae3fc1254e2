//! Per-frame ordering of image state transitions.
//!
//! wgpu inserts the actual pipeline barriers. This module is the explicit
//! schedule the renderer walks through each frame, checked transition by
//! transition, so a reordered or skipped step fails loudly instead of
//! producing a torn frame:
//!
//! ```text
//! color:    undefined | shader-read-only -> general -> shader-read-only
//! drawable: undefined -> color-attachment -> present-src
//! ```
//!
//! Color-image steps come before drawable steps within a frame.

mod layout;
mod sequencer;

pub use layout::{Access, Barrier, ImageId, ImageLayout, Stage};
pub use sequencer::{BarrierError, FrameBarrierSequencer};
