use std::fmt;

/// Images whose state the sequencer tracks.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ImageId {
    /// HDR image written by shading and sampled by the composite pass.
    Color,
    /// Swapchain image acquired for this frame.
    Drawable,
}

impl ImageId {
    pub const ALL: [ImageId; 2] = [ImageId::Color, ImageId::Drawable];

    /// Layout the image must be in when a frame finishes.
    pub const fn terminal_layout(self) -> ImageLayout {
        match self {
            Self::Color => ImageLayout::ShaderReadOnly,
            Self::Drawable => ImageLayout::PresentSrc,
        }
    }

    /// Layouts the image must pass through every frame, in order.
    pub const fn required_layouts(self) -> [ImageLayout; 2] {
        match self {
            Self::Color => [ImageLayout::General, ImageLayout::ShaderReadOnly],
            Self::Drawable => [ImageLayout::ColorAttachment, ImageLayout::PresentSrc],
        }
    }

    /// Whether `layout` is ever valid for this image.
    pub const fn allows(self, layout: ImageLayout) -> bool {
        match (self, layout) {
            (_, ImageLayout::Undefined) => true,
            (Self::Color, ImageLayout::General | ImageLayout::ShaderReadOnly) => true,
            (Self::Drawable, ImageLayout::ColorAttachment | ImageLayout::PresentSrc) => true,
            _ => false,
        }
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            Self::Color => 0,
            Self::Drawable => 1,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ImageLayout {
    Undefined,
    /// Writable by the shading stage.
    General,
    ShaderReadOnly,
    ColorAttachment,
    PresentSrc,
}

impl ImageLayout {
    /// Position in the per-frame order. A frame's transitions never go back.
    pub const fn rank(self) -> u8 {
        match self {
            Self::Undefined => 0,
            Self::General => 1,
            Self::ShaderReadOnly => 2,
            Self::ColorAttachment => 3,
            Self::PresentSrc => 4,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Stage {
    TopOfPipe,
    Shading,
    FragmentShader,
    ColorAttachmentOutput,
    BottomOfPipe,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Access {
    None,
    ShadingWrite,
    ShaderRead,
    ColorAttachmentWrite,
}

/// One validated transition with the stage/access scopes it orders.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Barrier {
    pub image: ImageId,
    pub from: ImageLayout,
    pub to: ImageLayout,
    pub src_stage: Stage,
    pub src_access: Access,
    pub dst_stage: Stage,
    pub dst_access: Access,
}

impl Barrier {
    /// Builds the barrier for a legal edge, or `None` if `from -> to` is not one.
    pub fn edge(image: ImageId, from: ImageLayout, to: ImageLayout) -> Option<Self> {
        use Access as A;
        use ImageLayout as L;
        use Stage as S;

        let (src_stage, src_access, dst_stage, dst_access) = match (from, to) {
            (L::Undefined, L::General) => (S::TopOfPipe, A::None, S::Shading, A::ShadingWrite),
            (L::ShaderReadOnly, L::General) => {
                (S::FragmentShader, A::ShaderRead, S::Shading, A::ShadingWrite)
            }
            (L::General, L::ShaderReadOnly) => {
                (S::Shading, A::ShadingWrite, S::FragmentShader, A::ShaderRead)
            }
            (L::Undefined, L::ColorAttachment) => (
                S::TopOfPipe,
                A::None,
                S::ColorAttachmentOutput,
                A::ColorAttachmentWrite,
            ),
            (L::ColorAttachment, L::PresentSrc) => (
                S::ColorAttachmentOutput,
                A::ColorAttachmentWrite,
                S::BottomOfPipe,
                A::None,
            ),
            _ => return None,
        };

        Some(Self {
            image,
            from,
            to,
            src_stage,
            src_access,
            dst_stage,
            dst_access,
        })
    }
}

impl fmt::Display for Barrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}: {:?} -> {:?} ({:?}/{:?} -> {:?}/{:?})",
            self.image,
            self.from,
            self.to,
            self.src_stage,
            self.src_access,
            self.dst_stage,
            self.dst_access
        )
    }
}
