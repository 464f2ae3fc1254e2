//! Presentation.
//!
//! The displayed image is uploaded into an HDR color image, then a fullscreen
//! pass tonemaps it onto the acquired drawable. The layout of both images is
//! tracked per frame by `barrier::FrameBarrierSequencer`.

mod composite;
mod ctx;
mod renderer;

pub use composite::{CompositePass, Tonemap};
pub use ctx::{RenderCtx, RenderTarget};
pub use renderer::{Renderer, COLOR_TEXEL_BYTES};
