use std::fmt;
use std::str::FromStr;

use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};

use crate::camera::SceneConstants;
use crate::coords::Extent;
use crate::scene::Scene;

/// Which variant runs the bounce-shading work.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum BackendKind {
    #[default]
    Host,
    Device,
}

impl BackendKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Host => "host",
            Self::Device => "device",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = UnknownBackend;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "host" | "cpu" => Ok(Self::Host),
            "device" | "gpu" => Ok(Self::Device),
            _ => Err(UnknownBackend(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownBackend(pub String);

impl fmt::Display for UnknownBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown shading backend {:?} (expected host or device)", self.0)
    }
}

impl std::error::Error for UnknownBackend {}

/// Per-frame shading constants, in the order the compute kernel reads them.
///
/// Layout (32 bytes):
///   camera_position [f32;3] @  0
///   time            f32     @ 12
///   sample_counter  i32     @ 16
///   seed            u32     @ 20
///   width           u32     @ 24
///   height          u32     @ 28
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct ShadeConstants {
    pub camera_position: [f32; 3],
    pub time: f32,
    pub sample_counter: i32,
    pub seed: u32,
    pub width: u32,
    pub height: u32,
}

impl ShadeConstants {
    pub fn new(camera_position: Vec3, time: f32, sample_counter: i32, seed: u32, extent: Extent) -> Self {
        Self {
            camera_position: camera_position.to_array(),
            time,
            sample_counter,
            seed,
            width: extent.width,
            height: extent.height,
        }
    }

    #[inline]
    pub fn extent(&self) -> Extent {
        Extent::new(self.width, self.height)
    }
}

/// Everything a backend needs for one frame. All of it is read-only.
#[derive(Debug, Copy, Clone)]
pub struct TraceInput<'a> {
    pub scene: &'a Scene,
    pub constants: &'a SceneConstants,
    pub rays: &'a [Vec3],
    pub shade: ShadeConstants,
}

impl TraceInput<'_> {
    #[inline]
    pub fn extent(&self) -> Extent {
        self.shade.extent()
    }

    /// Checks that the ray and sample buffers both match the frame extent.
    pub fn check_sizes(&self, samples: &[Vec4]) -> Result<(), TraceError> {
        let expected = self.extent().pixel_count();
        for actual in [self.rays.len(), samples.len()] {
            if actual != expected {
                return Err(TraceError::SizeMismatch { expected, actual });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TraceError {
    SizeMismatch { expected: usize, actual: usize },
    /// Reading samples back from the device failed.
    Readback(String),
}

impl fmt::Display for TraceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SizeMismatch { expected, actual } => write!(
                f,
                "per-pixel buffer holds {actual} entries, extent needs {expected}"
            ),
            Self::Readback(msg) => write!(f, "sample readback failed: {msg}"),
        }
    }
}

impl std::error::Error for TraceError {}

/// Produces one RGBA sample per pixel for the current frame.
///
/// Both variants consume the same ray buffer and must agree within float
/// tolerance for the same `ShadeConstants::seed`.
pub trait ShadingBackend {
    fn kind(&self) -> BackendKind;

    /// Shades every pixel of `input` into `samples` (row-major, extent-sized).
    fn trace(&mut self, input: &TraceInput<'_>, samples: &mut [Vec4]) -> Result<(), TraceError>;
}
