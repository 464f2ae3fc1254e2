use std::fmt;

use glam::{Mat4, Vec3, Vec4};
use rayon::prelude::*;

use crate::coords::Extent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RayGenError {
    /// The output buffer does not hold exactly `extent.pixel_count()` entries.
    SizeMismatch { expected: usize, actual: usize },
}

impl fmt::Display for RayGenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SizeMismatch { expected, actual } => write!(
                f,
                "ray buffer holds {actual} directions, extent needs {expected}"
            ),
        }
    }
}

impl std::error::Error for RayGenError {}

/// Writes one world-space ray direction per pixel, rows in parallel.
///
/// Pixel `(x, y)` maps to `uv = 2 * (x, y) / extent - 1` and is unprojected as
/// `(uv, 0, 1)`. The direction keeps whatever length the unprojection gives it.
pub fn generate_rays(
    inverse_view_projection: Mat4,
    extent: Extent,
    out: &mut [Vec3],
) -> Result<(), RayGenError> {
    let expected = extent.pixel_count();
    if out.len() != expected {
        return Err(RayGenError::SizeMismatch {
            expected,
            actual: out.len(),
        });
    }
    if expected == 0 {
        return Ok(());
    }

    let width = extent.width as usize;
    let inv_w = 2.0 / extent.width as f32;
    let inv_h = 2.0 / extent.height as f32;

    out.par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            let v = y as f32 * inv_h - 1.0;
            for (x, dir) in row.iter_mut().enumerate() {
                let u = x as f32 * inv_w - 1.0;
                *dir = (inverse_view_projection * Vec4::new(u, v, 0.0, 1.0)).truncate();
            }
        });

    Ok(())
}
