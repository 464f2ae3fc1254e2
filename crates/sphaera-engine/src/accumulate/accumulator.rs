use std::fmt;

use glam::{Mat4, Vec3, Vec4};
use rayon::prelude::*;

use crate::coords::Extent;
use crate::trace::{generate_rays, RayGenError};

/// Inputs that invalidate the running average.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AccumulationEvent {
    /// Camera position or rotation changed since the previous frame.
    CameraMoved,
    /// Drawable size changed; every per-pixel buffer is reallocated.
    Resize(Extent),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AccumulationPhase {
    /// Counter is 0 and the sum is zeroed.
    Reset,
    /// At least one sample has been folded in.
    Accumulating,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AccumulationError {
    /// A per-pixel buffer does not match the current extent.
    SizeMismatch { expected: usize, actual: usize },
    /// Rays were not regenerated since the last fold or resize.
    StaleRays,
    RayGen(RayGenError),
    /// Internal state check failed.
    Invariant(&'static str),
}

impl fmt::Display for AccumulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SizeMismatch { expected, actual } => write!(
                f,
                "sample buffer holds {actual} entries, accumulator expects {expected}"
            ),
            Self::StaleRays => f.write_str("ray directions were not regenerated for this frame"),
            Self::RayGen(e) => write!(f, "ray generation failed: {e}"),
            Self::Invariant(what) => write!(f, "accumulation invariant violated: {what}"),
        }
    }
}

impl std::error::Error for AccumulationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::RayGen(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RayGenError> for AccumulationError {
    fn from(e: RayGenError) -> Self {
        Self::RayGen(e)
    }
}

/// Running per-pixel mean of shading samples.
///
/// Frame protocol: `generate_rays` → read `rays` and shade → `fold`.
/// `fold` consumes the rays, so a frame that skips regeneration is rejected
/// with `StaleRays` instead of averaging directions from two camera states.
#[derive(Debug)]
pub struct Accumulator {
    extent: Extent,
    counter: u32,
    rays: Vec<Vec3>,
    sum: Vec<Vec4>,
    /// Finite samples folded per pixel; the divisor for that pixel's mean.
    valid: Vec<u32>,
    displayed: Vec<Vec4>,
    rays_fresh: bool,
}

impl Accumulator {
    pub fn new(extent: Extent) -> Self {
        let n = extent.pixel_count();
        Self {
            extent,
            counter: 0,
            rays: vec![Vec3::ZERO; n],
            sum: vec![Vec4::ZERO; n],
            valid: vec![0; n],
            displayed: vec![Vec4::ZERO; n],
            rays_fresh: false,
        }
    }

    #[inline]
    pub fn extent(&self) -> Extent {
        self.extent
    }

    /// Samples folded since the last reset.
    #[inline]
    pub fn counter(&self) -> u32 {
        self.counter
    }

    #[inline]
    pub fn phase(&self) -> AccumulationPhase {
        if self.counter == 0 {
            AccumulationPhase::Reset
        } else {
            AccumulationPhase::Accumulating
        }
    }

    /// Applies an invalidating event. Returns true when state changed.
    pub fn apply(&mut self, event: AccumulationEvent) -> bool {
        match event {
            AccumulationEvent::CameraMoved => self.reset(),
            AccumulationEvent::Resize(extent) => {
                self.resize(extent);
                true
            }
        }
    }

    /// Zeroes the sum and counter in place. A no-op when already reset.
    pub fn reset(&mut self) -> bool {
        if self.counter == 0 {
            return false;
        }

        log::debug!("accumulation reset after {} samples", self.counter);
        self.counter = 0;
        self.sum.fill(Vec4::ZERO);
        self.valid.fill(0);
        self.displayed.fill(Vec4::ZERO);
        true
    }

    /// Reallocates all per-pixel buffers for `extent` and resets.
    pub fn resize(&mut self, extent: Extent) {
        log::debug!(
            "accumulation buffers {}x{} -> {}x{}",
            self.extent.width,
            self.extent.height,
            extent.width,
            extent.height
        );
        *self = Self::new(extent);
    }

    /// Recomputes every ray direction from this frame's inverse view-projection.
    pub fn generate_rays(&mut self, inverse_view_projection: Mat4) -> Result<(), AccumulationError> {
        generate_rays(inverse_view_projection, self.extent, &mut self.rays)?;
        self.rays_fresh = true;
        Ok(())
    }

    /// Ray directions for the current frame.
    pub fn rays(&self) -> Result<&[Vec3], AccumulationError> {
        if !self.rays_fresh {
            return Err(AccumulationError::StaleRays);
        }
        Ok(&self.rays)
    }

    /// Adds one sample per pixel and refreshes the displayed average.
    ///
    /// The counter is incremented first, so the new sample is part of both the
    /// sum and the divisor. Non-finite samples are dropped so one bad pixel
    /// cannot poison the sum until the next reset; each pixel divides by the
    /// number of samples it actually kept, which equals the counter when every
    /// sample was finite.
    ///
    /// Once the counter reaches `u32::MAX` the image is held as is: the rays
    /// are consumed but nothing more is added.
    pub fn fold(&mut self, samples: &[Vec4]) -> Result<u32, AccumulationError> {
        let expected = self.extent.pixel_count();
        if samples.len() != expected {
            return Err(AccumulationError::SizeMismatch {
                expected,
                actual: samples.len(),
            });
        }
        if !self.rays_fresh {
            return Err(AccumulationError::StaleRays);
        }
        self.rays_fresh = false;

        if self.counter == u32::MAX {
            log::trace!("accumulation saturated; sample discarded");
            return Ok(self.counter);
        }

        let poisoned = samples.par_iter().filter(|s| !s.is_finite()).count();
        if poisoned > 0 {
            log::warn!("dropped {poisoned} non-finite samples");
        }

        self.counter += 1;

        self.sum
            .par_iter_mut()
            .zip(self.valid.par_iter_mut())
            .zip(self.displayed.par_iter_mut())
            .zip(samples.par_iter())
            .for_each(|(((sum, valid), shown), &sample)| {
                if sample.is_finite() {
                    *sum += sample;
                    *valid += 1;
                }
                *shown = if *valid > 0 {
                    *sum / *valid as f32
                } else {
                    Vec4::ZERO
                };
            });

        Ok(self.counter)
    }

    /// Current average; `None` until the first sample after a reset.
    pub fn displayed(&self) -> Option<&[Vec4]> {
        (self.counter > 0).then_some(self.displayed.as_slice())
    }

    pub fn sum(&self) -> &[Vec4] {
        &self.sum
    }

    /// Verifies buffer sizes and the reset-state contract.
    pub fn check_invariants(&self) -> Result<(), AccumulationError> {
        let expected = self.extent.pixel_count();
        for actual in [
            self.rays.len(),
            self.sum.len(),
            self.valid.len(),
            self.displayed.len(),
        ] {
            if actual != expected {
                return Err(AccumulationError::SizeMismatch { expected, actual });
            }
        }
        if self.counter == 0 && self.sum.iter().any(|s| *s != Vec4::ZERO) {
            return Err(AccumulationError::Invariant("sum is non-zero while reset"));
        }
        if self.valid.iter().any(|v| *v > self.counter) {
            return Err(AccumulationError::Invariant("pixel kept more samples than were folded"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXTENT: Extent = Extent::new(4, 3);

    fn fresh(acc: &mut Accumulator) {
        acc.generate_rays(Mat4::IDENTITY).unwrap();
    }

    fn filled(value: f32) -> Vec<Vec4> {
        vec![Vec4::splat(value); EXTENT.pixel_count()]
    }

    // ── folding ───────────────────────────────────────────────────────────

    #[test]
    fn starts_reset_without_display() {
        let acc = Accumulator::new(EXTENT);
        assert_eq!(acc.phase(), AccumulationPhase::Reset);
        assert!(acc.displayed().is_none());
        acc.check_invariants().unwrap();
    }

    #[test]
    fn displayed_is_running_mean() {
        let mut acc = Accumulator::new(EXTENT);
        for (i, v) in [1.0, 2.0, 6.0].into_iter().enumerate() {
            fresh(&mut acc);
            assert_eq!(acc.fold(&filled(v)).unwrap(), i as u32 + 1);
        }

        assert_eq!(acc.phase(), AccumulationPhase::Accumulating);
        let shown = acc.displayed().unwrap();
        assert!(shown.iter().all(|p| (*p - Vec4::splat(3.0)).abs().max_element() < 1e-6));
        assert!(acc.sum().iter().all(|p| *p == Vec4::splat(9.0)));
    }

    #[test]
    fn first_fold_displays_the_sample_itself() {
        let mut acc = Accumulator::new(EXTENT);
        fresh(&mut acc);
        acc.fold(&filled(0.25)).unwrap();
        assert!(acc.displayed().unwrap().iter().all(|p| *p == Vec4::splat(0.25)));
    }

    #[test]
    fn non_finite_samples_do_not_poison_sum() {
        let mut acc = Accumulator::new(EXTENT);
        let mut samples = filled(1.0);
        samples[5] = Vec4::new(f32::NAN, 0.0, 0.0, 1.0);
        samples[6] = Vec4::splat(f32::INFINITY);

        fresh(&mut acc);
        acc.fold(&samples).unwrap();
        fresh(&mut acc);
        acc.fold(&filled(1.0)).unwrap();

        let shown = acc.displayed().unwrap();
        assert!(shown.iter().all(|p| p.is_finite()));
        assert_eq!(shown[0], Vec4::splat(1.0));
        acc.check_invariants().unwrap();
    }

    #[test]
    fn dropped_samples_do_not_darken_the_mean() {
        let mut acc = Accumulator::new(EXTENT);
        let mut samples = filled(1.0);
        samples[5] = Vec4::new(f32::NAN, 0.0, 0.0, 1.0);

        fresh(&mut acc);
        acc.fold(&samples).unwrap();
        assert_eq!(acc.displayed().unwrap()[5], Vec4::ZERO);

        fresh(&mut acc);
        acc.fold(&filled(1.0)).unwrap();
        assert_eq!(acc.counter(), 2);
        assert_eq!(acc.displayed().unwrap()[5], Vec4::splat(1.0));
    }

    #[test]
    fn saturated_counter_holds_the_image() {
        let mut acc = Accumulator::new(EXTENT);
        fresh(&mut acc);
        acc.fold(&filled(2.0)).unwrap();
        acc.counter = u32::MAX;

        fresh(&mut acc);
        assert_eq!(acc.fold(&filled(100.0)).unwrap(), u32::MAX);
        assert_eq!(acc.sum()[0], Vec4::splat(2.0));
        assert_eq!(acc.displayed().unwrap()[0], Vec4::splat(2.0));

        // Rays are still consumed.
        assert_eq!(acc.fold(&filled(1.0)).unwrap_err(), AccumulationError::StaleRays);
    }

    // ── guards ────────────────────────────────────────────────────────────

    #[test]
    fn mismatched_samples_are_rejected() {
        let mut acc = Accumulator::new(EXTENT);
        fresh(&mut acc);
        let err = acc.fold(&vec![Vec4::ONE; 5]).unwrap_err();
        assert_eq!(
            err,
            AccumulationError::SizeMismatch {
                expected: 12,
                actual: 5
            }
        );
        assert_eq!(acc.counter(), 0);
    }

    #[test]
    fn fold_requires_fresh_rays_every_frame() {
        let mut acc = Accumulator::new(EXTENT);
        assert_eq!(acc.rays().unwrap_err(), AccumulationError::StaleRays);

        fresh(&mut acc);
        assert_eq!(acc.rays().unwrap().len(), 12);
        acc.fold(&filled(1.0)).unwrap();

        assert_eq!(acc.fold(&filled(1.0)).unwrap_err(), AccumulationError::StaleRays);
        assert_eq!(acc.counter(), 1);
    }

    // ── events ────────────────────────────────────────────────────────────

    #[test]
    fn camera_moved_is_idempotent_when_reset() {
        let mut acc = Accumulator::new(EXTENT);
        assert!(!acc.apply(AccumulationEvent::CameraMoved));
        assert_eq!(acc.phase(), AccumulationPhase::Reset);
        acc.check_invariants().unwrap();
    }

    #[test]
    fn camera_moved_zeroes_sum_once() {
        let mut acc = Accumulator::new(EXTENT);
        fresh(&mut acc);
        acc.fold(&filled(2.0)).unwrap();

        assert!(acc.apply(AccumulationEvent::CameraMoved));
        assert_eq!(acc.counter(), 0);
        assert!(acc.sum().iter().all(|s| *s == Vec4::ZERO));
        assert!(acc.displayed().is_none());
        assert!(!acc.apply(AccumulationEvent::CameraMoved));
        acc.check_invariants().unwrap();
    }

    #[test]
    fn resize_reallocates_and_resets() {
        let mut acc = Accumulator::new(EXTENT);
        fresh(&mut acc);
        acc.fold(&filled(2.0)).unwrap();

        let bigger = Extent::new(8, 5);
        assert!(acc.apply(AccumulationEvent::Resize(bigger)));
        assert_eq!(acc.extent(), bigger);
        assert_eq!(acc.counter(), 0);
        assert_eq!(acc.sum().len(), 40);
        assert_eq!(acc.rays().unwrap_err(), AccumulationError::StaleRays);
        acc.check_invariants().unwrap();

        fresh(&mut acc);
        assert!(acc.fold(&filled(1.0)).is_err());
    }
}
