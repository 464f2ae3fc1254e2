use std::collections::VecDeque;

/// Rolling average of frame times over the last `window` frames.
#[derive(Debug, Clone)]
pub struct FrameStats {
    samples: VecDeque<f32>,
    window: usize,
    total: f32,
    frames: u64,
}

impl FrameStats {
    pub const DEFAULT_WINDOW: usize = 120;

    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            samples: VecDeque::with_capacity(window),
            window,
            total: 0.0,
            frames: 0,
        }
    }

    /// Records one frame's duration in seconds.
    pub fn record(&mut self, dt: f32) {
        if self.samples.len() == self.window {
            if let Some(old) = self.samples.pop_front() {
                self.total -= old;
            }
        }
        self.samples.push_back(dt);
        self.total += dt;
        self.frames += 1;
    }

    /// Frames recorded since creation.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// True once every `window` frames; used to throttle reporting.
    pub fn report_due(&self) -> bool {
        self.frames > 0 && self.frames % self.window as u64 == 0
    }

    pub fn average_ms(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.total / self.samples.len() as f32 * 1000.0
    }

    pub fn fps(&self) -> f32 {
        let ms = self.average_ms();
        if ms > 0.0 { 1000.0 / ms } else { 0.0 }
    }
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_rolls_over_window() {
        let mut stats = FrameStats::new(2);
        stats.record(0.010);
        stats.record(0.020);
        stats.record(0.030);

        assert!((stats.average_ms() - 25.0).abs() < 1e-3);
        assert!((stats.fps() - 40.0).abs() < 1e-2);
        assert_eq!(stats.frames(), 3);
    }

    #[test]
    fn report_is_due_every_window() {
        let mut stats = FrameStats::new(3);
        let due: Vec<bool> = (0..6)
            .map(|_| {
                stats.record(0.016);
                stats.report_due()
            })
            .collect();
        assert_eq!(due, [false, false, true, false, false, true]);
    }

    #[test]
    fn empty_stats_report_zero() {
        let stats = FrameStats::default();
        assert_eq!(stats.average_ms(), 0.0);
        assert_eq!(stats.fps(), 0.0);
    }
}
