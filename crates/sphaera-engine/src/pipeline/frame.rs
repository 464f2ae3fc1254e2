use std::fmt;

use glam::Vec4;
use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};

use crate::accumulate::{AccumulationError, AccumulationEvent, Accumulator};
use crate::camera::{CameraState, SceneConstants};
use crate::coords::Extent;
use crate::scene::Scene;
use crate::trace::{ShadeConstants, ShadingBackend, TraceError, TraceInput};

#[derive(Debug, Clone, PartialEq)]
pub enum FrameError {
    Accumulation(AccumulationError),
    Trace(TraceError),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accumulation(e) => write!(f, "accumulation: {e}"),
            Self::Trace(e) => write!(f, "shading: {e}"),
        }
    }
}

impl std::error::Error for FrameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Accumulation(e) => Some(e),
            Self::Trace(e) => Some(e),
        }
    }
}

impl From<AccumulationError> for FrameError {
    fn from(e: AccumulationError) -> Self {
        Self::Accumulation(e)
    }
}

impl From<TraceError> for FrameError {
    fn from(e: TraceError) -> Self {
        Self::Trace(e)
    }
}

/// What one `step` did.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FrameReport {
    /// Sample counter after this frame's fold.
    pub counter: u32,
    /// The camera moved and the running average was cleared first.
    pub reset: bool,
    /// Seed handed to the backend for this frame.
    pub seed: u32,
}

/// Render-loop-owned state: scene, camera, accumulation buffers and the RNG.
///
/// Nothing else mutates the accumulation buffers. Backends only see
/// read-only views for the duration of `step`.
pub struct FramePipeline {
    scene: Scene,
    camera: CameraState,
    last_camera: CameraState,
    constants: SceneConstants,
    accumulator: Accumulator,
    rng: SmallRng,
    samples: Vec<Vec4>,
}

impl FramePipeline {
    pub fn new(scene: Scene, camera: CameraState, extent: Extent, seed: u64) -> Self {
        Self::with_rng(scene, camera, extent, SmallRng::seed_from_u64(seed))
    }

    pub fn with_rng(scene: Scene, camera: CameraState, extent: Extent, rng: SmallRng) -> Self {
        Self {
            scene,
            camera,
            last_camera: camera,
            constants: SceneConstants::from_camera(&camera, extent.aspect()),
            accumulator: Accumulator::new(extent),
            rng,
            samples: vec![Vec4::ZERO; extent.pixel_count()],
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    /// Camera to be mutated by input handling between frames.
    pub fn camera_mut(&mut self) -> &mut CameraState {
        &mut self.camera
    }

    /// Matrices used by the most recent `step`.
    pub fn constants(&self) -> &SceneConstants {
        &self.constants
    }

    pub fn accumulator(&self) -> &Accumulator {
        &self.accumulator
    }

    pub fn extent(&self) -> Extent {
        self.accumulator.extent()
    }

    /// The current running average, if any sample has been folded since the last reset.
    pub fn displayed(&self) -> Option<&[Vec4]> {
        self.accumulator.displayed()
    }

    /// Samples produced by the most recent `step`.
    pub fn last_samples(&self) -> &[Vec4] {
        &self.samples
    }

    /// Reallocates every resolution-sized buffer. Callers wait for the device
    /// to go idle first.
    pub fn resize(&mut self, extent: Extent) {
        self.accumulator.apply(AccumulationEvent::Resize(extent));
        self.samples = vec![Vec4::ZERO; extent.pixel_count()];
    }

    /// Renders one sample per pixel and folds it into the running average.
    ///
    /// Motion is detected by comparing the camera with its state at the
    /// previous step, and the reset happens before any ray is generated.
    pub fn step(
        &mut self,
        backend: &mut dyn ShadingBackend,
        time: f32,
    ) -> Result<FrameReport, FrameError> {
        let reset = self.camera.moved_since(&self.last_camera)
            && self.accumulator.apply(AccumulationEvent::CameraMoved);
        self.last_camera = self.camera;

        let extent = self.accumulator.extent();
        self.constants = SceneConstants::from_camera(&self.camera, extent.aspect());
        self.accumulator
            .generate_rays(self.constants.inverse_view_projection)?;

        let seed = self.rng.next_u32();
        let sample_counter = self.accumulator.counter().saturating_add(1);
        let shade = ShadeConstants::new(
            self.camera.position,
            time,
            i32::try_from(sample_counter).unwrap_or(i32::MAX),
            seed,
            extent,
        );

        let input = TraceInput {
            scene: &self.scene,
            constants: &self.constants,
            rays: self.accumulator.rays()?,
            shade,
        };
        backend.trace(&input, &mut self.samples)?;

        let counter = self.accumulator.fold(&self.samples)?;

        Ok(FrameReport {
            counter,
            reset,
            seed,
        })
    }
}
