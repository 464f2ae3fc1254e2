//! Pixel-grid geometry shared by the per-pixel buffers and GPU resources.

mod extent;

pub use extent::Extent;
