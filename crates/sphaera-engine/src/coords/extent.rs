/// Resolution of every per-pixel buffer, in physical pixels.
///
/// Buffers are row-major: pixel `(x, y)` lives at `y * width + x`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Extent {
    pub width: u32,
    pub height: u32,
}

impl Extent {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    pub const fn pixel_count(self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Width over height; 1.0 for an empty extent so projections stay finite.
    #[inline]
    pub fn aspect(self) -> f32 {
        if self.is_empty() {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    #[inline]
    pub const fn index(self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Index of the pixel whose normalized coordinate is `(0, 0)` for even extents.
    #[inline]
    pub const fn center(self) -> (u32, u32) {
        (self.width / 2, self.height / 2)
    }
}

impl From<winit::dpi::PhysicalSize<u32>> for Extent {
    #[inline]
    fn from(size: winit::dpi::PhysicalSize<u32>) -> Self {
        Self::new(size.width, size.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_count_and_index() {
        let e = Extent::new(4, 3);
        assert_eq!(e.pixel_count(), 12);
        assert_eq!(e.index(0, 0), 0);
        assert_eq!(e.index(3, 2), 11);
        assert_eq!(e.center(), (2, 1));
    }

    #[test]
    fn empty_extent_has_unit_aspect() {
        assert!(Extent::new(0, 10).is_empty());
        assert_eq!(Extent::new(0, 10).aspect(), 1.0);
        assert_eq!(Extent::new(800, 400).aspect(), 2.0);
    }
}
