//! Wipe transitions played between the old and the new contents of a display.
//!
//! A transition starts from the "before" frame and sweeps a two-dot-wide lit bar across the
//! display, leaving the "after" frame behind it. Steps are drawn in logical coordinates, so a
//! rotated display wipes the way the viewer sees it.

use embassy_time::Duration;

use crate::max3000::frame::{Canvas, DotColor, DotFrame, Rotation};

/// Pause between transition steps.
pub const STEP_DELAY: Duration = Duration::from_millis(5);

/// A wipe transition.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Transition {
    /// A vertical bar sweeping left to right.
    HorizontalWipe = 1,
    /// A diagonal bar sweeping from the top-left corner to the bottom-right.
    DiagonalWipe = 2,
}

impl Transition {
    /// Numeric id, as used by `transition_on_next_update` callers.
    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// The transition with numeric `id`. Id 0 (no transition) and unknown ids give `None`.
    #[must_use]
    pub const fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Self::HorizontalWipe),
            2 => Some(Self::DiagonalWipe),
            _ => None,
        }
    }

    /// Number of steps on a logical `width` × `height` display.
    #[must_use]
    pub const fn step_count(self, width: usize, height: usize) -> usize {
        match self {
            Self::HorizontalWipe => width,
            Self::DiagonalWipe => width + height,
        }
    }

    /// Draw step `step` onto `frame`, restoring the dots behind the bar from `after`.
    pub fn apply_step<const W: usize, const H: usize>(
        self,
        step: usize,
        rotation: Rotation,
        after: &DotFrame<W, H>,
        frame: &mut DotFrame<W, H>,
    ) {
        let mut canvas = Canvas::new(frame, rotation);
        let height = canvas.height() as i32;
        let step = step as i32;
        for y_index in 0..height {
            let bar = match self {
                Self::HorizontalWipe => step,
                Self::DiagonalWipe => step - y_index,
            };
            canvas.draw_pixel(bar, y_index, DotColor::Light);
            canvas.draw_pixel(bar + 1, y_index, DotColor::Light);
            let behind = bar - 1;
            if behind >= 0 {
                let lit = after.get_rotated(rotation, behind, y_index);
                canvas.draw_pixel(behind, y_index, DotColor::from(lit));
            }
        }
    }
}
