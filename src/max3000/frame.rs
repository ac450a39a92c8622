//! In-memory dot buffers and the rotation-aware drawing surface handed to writers.
//!
//! A [`DotFrame`] is always stored in physical panel coordinates. Writers draw through a
//! [`Canvas`], which maps logical coordinates through the display's [`Rotation`] first.
//!
//! ```
//! use embedded_graphics::{
//!     pixelcolor::BinaryColor,
//!     prelude::*,
//!     primitives::{Line, PrimitiveStyle},
//! };
//! use max3000_kit::max3000::frame::{Canvas, DotFrame, Rotation};
//!
//! let mut frame = DotFrame::<28, 16>::new();
//! let mut canvas = Canvas::new(&mut frame, Rotation::Deg90);
//! assert_eq!((canvas.width(), canvas.height()), (16, 28));
//!
//! Line::new(Point::new(0, 0), Point::new(15, 0))
//!     .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
//!     .draw(&mut canvas)
//!     .expect("drawing on a canvas is infallible");
//!
//! // Logical row 0 lands on the right-most physical column.
//! assert!(frame[(27, 0)] && frame[(27, 15)]);
//! ```

use core::{
    convert::Infallible,
    ops::{Deref, DerefMut, Index, IndexMut},
};

use embedded_graphics::{
    Pixel,
    pixelcolor::BinaryColor,
    prelude::{DrawTarget, OriginDimensions, Point, Size},
};

use crate::{Error, Result, config::ConfigError};

/// What drawing a dot does.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DotColor {
    /// Flip the dot to its dark face.
    Dark,
    /// Flip the dot to its lit face.
    Light,
    /// Flip the dot to whichever face it is not showing.
    Inverse,
}

impl DotColor {
    /// Resolve against the dot's current state.
    #[must_use]
    pub const fn apply(self, current: bool) -> bool {
        match self {
            Self::Dark => false,
            Self::Light => true,
            Self::Inverse => !current,
        }
    }
}

impl From<bool> for DotColor {
    fn from(lit: bool) -> Self {
        if lit { Self::Light } else { Self::Dark }
    }
}

impl From<BinaryColor> for DotColor {
    fn from(color: BinaryColor) -> Self {
        Self::from(color.is_on())
    }
}

/// Display rotation, clockwise.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rotation {
    /// Panels as mounted.
    #[default]
    Deg0,
    /// Quarter turn clockwise.
    Deg90,
    /// Half turn.
    Deg180,
    /// Quarter turn counter-clockwise.
    Deg270,
}

impl Rotation {
    /// Parse a rotation in degrees.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidRotation`] for anything but 0, 90, 180, or 270.
    pub const fn from_degrees(degrees: u16) -> core::result::Result<Self, ConfigError> {
        match degrees {
            0 => Ok(Self::Deg0),
            90 => Ok(Self::Deg90),
            180 => Ok(Self::Deg180),
            270 => Ok(Self::Deg270),
            _ => Err(ConfigError::InvalidRotation),
        }
    }

    /// The rotation in degrees.
    #[must_use]
    pub const fn degrees(self) -> u16 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }

    /// Whether logical width and height are swapped relative to the panels.
    #[must_use]
    pub const fn swaps_axes(self) -> bool {
        matches!(self, Self::Deg90 | Self::Deg270)
    }

    /// Logical `(width, height)` of a physical `width` × `height` display.
    #[must_use]
    pub const fn logical_size(self, width: usize, height: usize) -> (usize, usize) {
        if self.swaps_axes() {
            (height, width)
        } else {
            (width, height)
        }
    }

    /// Map logical `(x, y)` to physical coordinates on a `width` × `height` display.
    ///
    /// The point must already be inside [`logical_size`](Self::logical_size).
    #[must_use]
    pub const fn to_physical(
        self,
        x_index: usize,
        y_index: usize,
        width: usize,
        height: usize,
    ) -> (usize, usize) {
        match self {
            Self::Deg0 => (x_index, y_index),
            Self::Deg90 => (width - 1 - y_index, x_index),
            Self::Deg180 => (width - 1 - x_index, height - 1 - y_index),
            Self::Deg270 => (y_index, height - 1 - x_index),
        }
    }
}

/// A physical dot buffer, `W` columns by `H` rows, row-major.
///
/// `frame[(x, y)]` is `true` when the dot at column `x`, row `y` shows its lit face.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DotFrame<const W: usize, const H: usize>(pub [[bool; W]; H]);

impl<const W: usize, const H: usize> DotFrame<W, H> {
    /// Frame width in dots (columns).
    pub const WIDTH: usize = W;
    /// Frame height in dots (rows).
    pub const HEIGHT: usize = H;
    /// Total number of dots (WIDTH × HEIGHT).
    pub const LEN: usize = W * H;
    /// Frame dimensions as a [`Size`].
    pub const SIZE: Size = Size::new(W as u32, H as u32);
    /// Top-left corner coordinate as a [`Point`].
    pub const TOP_LEFT: Point = Point::new(0, 0);
    /// Top-right corner coordinate as a [`Point`].
    pub const TOP_RIGHT: Point = Point::new((W - 1) as i32, 0);
    /// Bottom-left corner coordinate as a [`Point`].
    pub const BOTTOM_LEFT: Point = Point::new(0, (H - 1) as i32);
    /// Bottom-right corner coordinate as a [`Point`].
    pub const BOTTOM_RIGHT: Point = Point::new((W - 1) as i32, (H - 1) as i32);

    /// Create a frame with every dot dark.
    #[must_use]
    pub const fn new() -> Self {
        Self([[false; W]; H])
    }

    /// Create a frame with every dot set to `lit`.
    #[must_use]
    pub const fn filled(lit: bool) -> Self {
        Self([[lit; W]; H])
    }

    /// The dot at `(x, y)`, or `None` outside the frame.
    #[must_use]
    pub fn get(&self, x_index: usize, y_index: usize) -> Option<bool> {
        self.0.get(y_index)?.get(x_index).copied()
    }

    /// Set the dot at `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`] outside the frame.
    pub fn set(&mut self, x_index: usize, y_index: usize, lit: bool) -> Result<()> {
        let dot = self
            .0
            .get_mut(y_index)
            .and_then(|row| row.get_mut(x_index))
            .ok_or(Error::IndexOutOfBounds)?;
        *dot = lit;
        Ok(())
    }

    /// Set every dot to `lit`.
    pub fn fill(&mut self, lit: bool) {
        *self = Self::filled(lit);
    }

    /// The dot at logical `(x, y)` as seen through `rotation`. Outside the frame reads as dark.
    #[must_use]
    pub fn get_rotated(&self, rotation: Rotation, x_index: i32, y_index: i32) -> bool {
        let (width, height) = rotation.logical_size(W, H);
        let (Ok(x_index), Ok(y_index)) = (usize::try_from(x_index), usize::try_from(y_index))
        else {
            return false;
        };
        if x_index >= width || y_index >= height {
            return false;
        }
        let (column, row) = rotation.to_physical(x_index, y_index, W, H);
        self.0[row][column]
    }

    /// Number of lit dots.
    #[must_use]
    pub fn lit_count(&self) -> usize {
        self.0.iter().flatten().filter(|lit| **lit).count()
    }
}

impl<const W: usize, const H: usize> Deref for DotFrame<W, H> {
    type Target = [[bool; W]; H];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<const W: usize, const H: usize> DerefMut for DotFrame<W, H> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<const W: usize, const H: usize> Index<(usize, usize)> for DotFrame<W, H> {
    type Output = bool;

    fn index(&self, (x_index, y_index): (usize, usize)) -> &Self::Output {
        assert!(x_index < W, "x_index must be within width");
        assert!(y_index < H, "y_index must be within height");
        &self.0[y_index][x_index]
    }
}

impl<const W: usize, const H: usize> IndexMut<(usize, usize)> for DotFrame<W, H> {
    fn index_mut(&mut self, (x_index, y_index): (usize, usize)) -> &mut Self::Output {
        assert!(x_index < W, "x_index must be within width");
        assert!(y_index < H, "y_index must be within height");
        &mut self.0[y_index][x_index]
    }
}

impl<const W: usize, const H: usize> From<[[bool; W]; H]> for DotFrame<W, H> {
    fn from(array: [[bool; W]; H]) -> Self {
        Self(array)
    }
}

impl<const W: usize, const H: usize> From<DotFrame<W, H>> for [[bool; W]; H] {
    fn from(frame: DotFrame<W, H>) -> Self {
        frame.0
    }
}

impl<const W: usize, const H: usize> Default for DotFrame<W, H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const W: usize, const H: usize> OriginDimensions for DotFrame<W, H> {
    fn size(&self) -> Size {
        Self::SIZE
    }
}

impl<const W: usize, const H: usize> DrawTarget for DotFrame<W, H> {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> core::result::Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            let x_index = coord.x;
            let y_index = coord.y;
            if x_index >= 0 && x_index < W as i32 && y_index >= 0 && y_index < H as i32 {
                self.0[y_index as usize][x_index as usize] = color.is_on();
            }
        }
        Ok(())
    }
}

/// Rotation-aware drawing surface over a [`DotFrame`].
///
/// This is the `it` a display writer receives. Coordinates are logical: `(0, 0)` is the top-left
/// corner as the viewer sees it after rotation. Drawing outside the logical area is ignored.
pub struct Canvas<'a, const W: usize, const H: usize> {
    frame: &'a mut DotFrame<W, H>,
    rotation: Rotation,
}

impl<'a, const W: usize, const H: usize> Canvas<'a, W, H> {
    /// Wrap `frame`, drawing through `rotation`.
    #[must_use]
    pub const fn new(frame: &'a mut DotFrame<W, H>, rotation: Rotation) -> Self {
        Self { frame, rotation }
    }

    /// Logical width in dots.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.rotation.logical_size(W, H).0
    }

    /// Logical height in dots.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.rotation.logical_size(W, H).1
    }

    /// The rotation drawing goes through.
    #[must_use]
    pub const fn rotation(&self) -> Rotation {
        self.rotation
    }

    fn physical(&self, x_index: i32, y_index: i32) -> Option<(usize, usize)> {
        let x_index = usize::try_from(x_index).ok()?;
        let y_index = usize::try_from(y_index).ok()?;
        (x_index < self.width() && y_index < self.height())
            .then(|| self.rotation.to_physical(x_index, y_index, W, H))
    }

    /// Draw one dot. Out-of-range coordinates are ignored.
    pub fn draw_pixel(&mut self, x_index: i32, y_index: i32, color: DotColor) {
        if let Some((column, row)) = self.physical(x_index, y_index) {
            let dot = &mut self.frame.0[row][column];
            *dot = color.apply(*dot);
        }
    }

    /// Read one dot. Out-of-range coordinates read as dark.
    #[must_use]
    pub fn get_pixel(&self, x_index: i32, y_index: i32) -> bool {
        self.frame.get_rotated(self.rotation, x_index, y_index)
    }

    /// Apply `color` to every dot.
    pub fn fill(&mut self, color: DotColor) {
        for dot in self.frame.0.iter_mut().flatten() {
            *dot = color.apply(*dot);
        }
    }

    /// Turn every dot dark.
    pub fn clear(&mut self) {
        self.frame.fill(false);
    }
}

impl<const W: usize, const H: usize> OriginDimensions for Canvas<'_, W, H> {
    fn size(&self) -> Size {
        Size::new(self.width() as u32, self.height() as u32)
    }
}

impl<const W: usize, const H: usize> DrawTarget for Canvas<'_, W, H> {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> core::result::Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            self.draw_pixel(coord.x, coord.y, color.into());
        }
        Ok(())
    }
}
