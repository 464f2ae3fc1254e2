use std::fmt;

use super::layout::{Barrier, ImageId, ImageLayout};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BarrierError {
    /// `from -> to` is not an edge of the transition graph for this image.
    IllegalTransition {
        image: ImageId,
        from: ImageLayout,
        to: ImageLayout,
    },
    /// The transition would move the frame backwards in the per-frame order.
    OutOfOrder {
        image: ImageId,
        to: ImageLayout,
        reached: ImageLayout,
    },
    /// `finish_frame` found an image short of its terminal layout.
    Incomplete { image: ImageId, layout: ImageLayout },
    /// The image ended in its terminal layout without visiting `layout` this frame.
    Skipped { image: ImageId, layout: ImageLayout },
    FrameNotOpen,
    FrameAlreadyOpen,
}

impl fmt::Display for BarrierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IllegalTransition { image, from, to } => {
                write!(f, "illegal transition for {image:?}: {from:?} -> {to:?}")
            }
            Self::OutOfOrder { image, to, reached } => write!(
                f,
                "{image:?} -> {to:?} is out of order; frame already reached {reached:?}"
            ),
            Self::Incomplete { image, layout } => write!(
                f,
                "frame finished with {image:?} in {layout:?}, expected {:?}",
                image.terminal_layout()
            ),
            Self::Skipped { image, layout } => {
                write!(f, "frame finished without moving {image:?} through {layout:?}")
            }
            Self::FrameNotOpen => f.write_str("transition outside of an open frame"),
            Self::FrameAlreadyOpen => f.write_str("frame begun twice without finishing"),
        }
    }
}

impl std::error::Error for BarrierError {}

/// Tracks the current layout of each image and validates every transition.
///
/// Holds no resources; only "current layout per image" plus the frame cursor.
#[derive(Debug)]
pub struct FrameBarrierSequencer {
    layouts: [ImageLayout; 2],
    frame_open: bool,
    /// Highest layout rank reached in the open frame.
    reached: ImageLayout,
    recorded: Vec<Barrier>,
}

impl Default for FrameBarrierSequencer {
    fn default() -> Self {
        Self {
            layouts: [ImageLayout::Undefined; 2],
            frame_open: false,
            reached: ImageLayout::Undefined,
            recorded: Vec::new(),
        }
    }
}

impl FrameBarrierSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn layout(&self, image: ImageId) -> ImageLayout {
        self.layouts[image.index()]
    }

    #[inline]
    pub fn is_frame_open(&self) -> bool {
        self.frame_open
    }

    /// Opens a frame. The drawable is freshly acquired, so it starts undefined;
    /// the color image keeps whatever layout the previous frame left it in.
    pub fn begin_frame(&mut self) -> Result<(), BarrierError> {
        if self.frame_open {
            return Err(BarrierError::FrameAlreadyOpen);
        }
        self.layouts[ImageId::Drawable.index()] = ImageLayout::Undefined;
        self.reached = ImageLayout::Undefined;
        self.recorded.clear();
        self.frame_open = true;
        Ok(())
    }

    /// Moves `image` to `to`, returning the barrier that orders it.
    pub fn transition(&mut self, image: ImageId, to: ImageLayout) -> Result<Barrier, BarrierError> {
        if !self.frame_open {
            return Err(BarrierError::FrameNotOpen);
        }

        let from = self.layout(image);
        let barrier = Barrier::edge(image, from, to)
            .filter(|_| image.allows(to))
            .ok_or(BarrierError::IllegalTransition { image, from, to })?;

        if to.rank() < self.reached.rank() {
            return Err(BarrierError::OutOfOrder {
                image,
                to,
                reached: self.reached,
            });
        }

        log::trace!("barrier {barrier}");
        self.layouts[image.index()] = to;
        self.reached = to;
        self.recorded.push(barrier);
        Ok(barrier)
    }

    /// Closes the frame after checking every image reached its terminal layout
    /// by way of each of its required layouts.
    /// Returns the barriers recorded during the frame, in order.
    pub fn finish_frame(&mut self) -> Result<&[Barrier], BarrierError> {
        if !self.frame_open {
            return Err(BarrierError::FrameNotOpen);
        }
        for image in ImageId::ALL {
            let layout = self.layout(image);
            if layout != image.terminal_layout() {
                return Err(BarrierError::Incomplete { image, layout });
            }
            // The color image starts a frame already in its terminal layout.
            for required in image.required_layouts() {
                let visited = self
                    .recorded
                    .iter()
                    .any(|b| b.image == image && b.to == required);
                if !visited {
                    return Err(BarrierError::Skipped {
                        image,
                        layout: required,
                    });
                }
            }
        }
        self.frame_open = false;
        Ok(&self.recorded)
    }

    /// Abandons an open frame (e.g. the drawable could not be acquired).
    ///
    /// The drawable returns to undefined; the color image keeps its layout
    /// because whatever was recorded for it may already be submitted.
    pub fn abandon_frame(&mut self) {
        if self.frame_open {
            log::debug!("barrier frame abandoned after {} transitions", self.recorded.len());
        }
        self.frame_open = false;
        self.layouts[ImageId::Drawable.index()] = ImageLayout::Undefined;
        self.recorded.clear();
    }

    /// All images were torn down; transitions restart from undefined.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ImageId::{Color, Drawable};
    use ImageLayout::*;

    fn run_frame(seq: &mut FrameBarrierSequencer) -> Result<Vec<Barrier>, BarrierError> {
        seq.begin_frame()?;
        seq.transition(Color, General)?;
        seq.transition(Color, ShaderReadOnly)?;
        seq.transition(Drawable, ColorAttachment)?;
        seq.transition(Drawable, PresentSrc)?;
        Ok(seq.finish_frame()?.to_vec())
    }

    // ── happy path ────────────────────────────────────────────────────────

    #[test]
    fn first_frame_starts_from_undefined() {
        let mut seq = FrameBarrierSequencer::new();
        let barriers = run_frame(&mut seq).unwrap();

        assert_eq!(barriers.len(), 4);
        assert_eq!(barriers[0].from, Undefined);
        assert_eq!(seq.layout(Color), ShaderReadOnly);
        assert_eq!(seq.layout(Drawable), PresentSrc);
    }

    #[test]
    fn later_frames_rewrite_from_shader_read_only() {
        let mut seq = FrameBarrierSequencer::new();
        run_frame(&mut seq).unwrap();
        let barriers = run_frame(&mut seq).unwrap();

        assert_eq!(barriers[0].from, ShaderReadOnly);
        assert_eq!(barriers[2].from, Undefined);
    }

    #[test]
    fn reset_restarts_from_undefined() {
        let mut seq = FrameBarrierSequencer::new();
        run_frame(&mut seq).unwrap();
        seq.reset();

        assert_eq!(seq.layout(Color), Undefined);
        let barriers = run_frame(&mut seq).unwrap();
        assert_eq!(barriers[0].from, Undefined);
    }

    // ── hazards ───────────────────────────────────────────────────────────

    #[test]
    fn read_before_write_is_illegal() {
        let mut seq = FrameBarrierSequencer::new();
        seq.begin_frame().unwrap();
        assert_eq!(
            seq.transition(Color, ShaderReadOnly),
            Err(BarrierError::IllegalTransition {
                image: Color,
                from: Undefined,
                to: ShaderReadOnly
            })
        );
    }

    #[test]
    fn shading_after_composite_is_out_of_order() {
        let mut seq = FrameBarrierSequencer::new();
        run_frame(&mut seq).unwrap();

        seq.begin_frame().unwrap();
        seq.transition(Drawable, ColorAttachment).unwrap();
        assert_eq!(
            seq.transition(Color, General),
            Err(BarrierError::OutOfOrder {
                image: Color,
                to: General,
                reached: ColorAttachment
            })
        );
    }

    #[test]
    fn skipped_present_leaves_frame_incomplete() {
        let mut seq = FrameBarrierSequencer::new();
        seq.begin_frame().unwrap();
        seq.transition(Color, General).unwrap();
        seq.transition(Color, ShaderReadOnly).unwrap();
        seq.transition(Drawable, ColorAttachment).unwrap();

        assert_eq!(
            seq.finish_frame().unwrap_err(),
            BarrierError::Incomplete {
                image: Drawable,
                layout: ColorAttachment
            }
        );
    }

    #[test]
    fn skipped_shading_write_is_rejected() {
        let mut seq = FrameBarrierSequencer::new();
        run_frame(&mut seq).unwrap();

        // Color is still ShaderReadOnly from the previous frame.
        seq.begin_frame().unwrap();
        seq.transition(Drawable, ColorAttachment).unwrap();
        seq.transition(Drawable, PresentSrc).unwrap();

        assert_eq!(
            seq.finish_frame().unwrap_err(),
            BarrierError::Skipped {
                image: Color,
                layout: General
            }
        );
        assert!(seq.is_frame_open());
    }

    #[test]
    fn wrong_image_layout_is_illegal() {
        let mut seq = FrameBarrierSequencer::new();
        seq.begin_frame().unwrap();
        assert!(matches!(
            seq.transition(Drawable, General),
            Err(BarrierError::IllegalTransition { .. })
        ));
    }

    #[test]
    fn transitions_need_an_open_frame() {
        let mut seq = FrameBarrierSequencer::new();
        assert_eq!(seq.transition(Color, General), Err(BarrierError::FrameNotOpen));

        seq.begin_frame().unwrap();
        assert_eq!(seq.begin_frame(), Err(BarrierError::FrameAlreadyOpen));
        seq.abandon_frame();
        assert!(!seq.is_frame_open());
    }
}
