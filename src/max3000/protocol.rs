//! Wire format of the MAX3000 driver board: one 16-bit shift register per panel.
//!
//! Words are shifted out most-significant bit first, one word per panel starting with panel 0,
//! then latched. The row and column decoders on each panel select a single dot. Which of the two
//! source bits is set decides whether the following pulse flips that dot to its lit or its dark
//! face.

use core::iter::FusedIterator;

/// Columns on one panel.
pub const PANEL_WIDTH: usize = 28;
/// Rows on one panel.
pub const PANEL_HEIGHT: usize = 16;
/// Dots on one panel.
pub const PANEL_DOTS: usize = PANEL_WIDTH * PANEL_HEIGHT;

/// Settle time between enabling the source and sink lines of a pulse, in microseconds.
pub const SOURCE_SETTLE_US: u32 = 5;

const COL_A2: u8 = 0;
const COL_A1: u8 = 1;
const COL_A0: u8 = 2;
const ROW_A0: u8 = 3;
const ROW_A1: u8 = 4;
const ROW_A2: u8 = 5;
const ROW_BANK: u8 = 6;
const COL_BANK0: u8 = 7;
const COL_SOURCE: u8 = 8;
const ROW_SOURCE: u8 = 10;
const COL_BANK1: u8 = 11;
const USER_LED: u8 = 13;

/// Decoder code for each panel column.
const COLUMN_CODES: [u8; PANEL_WIDTH] = [
    1, 0, 3, 2, 5, 4, 7, 6, 9, 8, 11, 10, 13, 12, 15, 14, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25,
    26, 27,
];

/// Decoder code for each panel row, indexed by `15 - row` (rows run bottom-up on the panel).
const ROW_CODES: [u8; PANEL_HEIGHT] = [14, 1, 15, 0, 12, 3, 13, 2, 10, 5, 11, 4, 8, 7, 9, 6];

/// The contents of one panel's shift register.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ShiftWord(u16);

impl ShiftWord {
    /// All bits low.
    pub const ZERO: Self = Self(0);

    /// Wrap a raw register value.
    #[must_use]
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    /// The raw register value.
    #[must_use]
    pub const fn bits(self) -> u16 {
        self.0
    }

    const fn with_bit(self, bit: u8, on: bool) -> Self {
        let mask = 1u16 << bit;
        if on {
            Self(self.0 | mask)
        } else {
            Self(self.0 & !mask)
        }
    }

    /// Whether `bit` is set.
    #[must_use]
    pub const fn bit(self, bit: u8) -> bool {
        self.0 & (1u16 << bit) != 0
    }

    /// Point the row and column decoders at one dot, preserving the source and LED bits.
    ///
    /// `row` must be below [`PANEL_HEIGHT`] and `column` below [`PANEL_WIDTH`].
    #[must_use]
    pub const fn select(self, row: usize, column: usize) -> Self {
        assert!(row < PANEL_HEIGHT, "row must be within the panel");
        assert!(column < PANEL_WIDTH, "column must be within the panel");
        let row_code = ROW_CODES[PANEL_HEIGHT - 1 - row];
        let column_code = COLUMN_CODES[column];

        let row_sub_code = row_code % 8;
        let row_bank = row_code / 8;
        let column_sub_code = column_code % 8;
        let column_bank = column_code / 8;

        self.with_bit(COL_A2, column_sub_code & 0b100 != 0)
            .with_bit(COL_A1, column_sub_code & 0b010 != 0)
            .with_bit(COL_A0, column_sub_code & 0b001 != 0)
            .with_bit(ROW_A2, row_sub_code & 0b100 != 0)
            .with_bit(ROW_A1, row_sub_code & 0b010 != 0)
            .with_bit(ROW_A0, row_sub_code & 0b001 != 0)
            .with_bit(ROW_BANK, row_bank & 0b01 != 0)
            .with_bit(COL_BANK1, column_bank & 0b10 != 0)
            .with_bit(COL_BANK0, column_bank & 0b01 != 0)
    }

    /// Choose which side sources current during the next pulse.
    ///
    /// Row source flips the selected dot lit; column source flips it dark. Neither leaves the
    /// dot alone.
    #[must_use]
    pub const fn set_sources(self, row_source: bool, column_source: bool) -> Self {
        self.with_bit(ROW_SOURCE, row_source)
            .with_bit(COL_SOURCE, column_source)
    }

    /// Turn the panel's user LED on or off.
    #[must_use]
    pub const fn set_user_led(self, on: bool) -> Self {
        self.with_bit(USER_LED, on)
    }

    /// Whether the user LED bit is set.
    #[must_use]
    pub const fn user_led(self) -> bool {
        self.bit(USER_LED)
    }

    /// The bits in shift order (MSB first).
    #[must_use]
    pub const fn msb_first(self) -> MsbFirst {
        MsbFirst {
            bits: self.0,
            mask: 0x8000,
        }
    }
}

/// Iterator over a [`ShiftWord`]'s bits, most-significant first.
#[derive(Clone, Debug)]
pub struct MsbFirst {
    bits: u16,
    mask: u16,
}

impl Iterator for MsbFirst {
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        if self.mask == 0 {
            return None;
        }
        let bit = self.bits & self.mask != 0;
        self.mask >>= 1;
        Some(bit)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = 16 - self.mask.leading_zeros() as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for MsbFirst {}
impl FusedIterator for MsbFirst {}

/// Which face a pulse flips the selected dots to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Flip {
    /// Row enable first, then column: dots turn lit.
    Set,
    /// Column enable first, then row: dots turn dark.
    Clear,
}

/// One of the two active-low enable lines a pulse drives.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EnableLine {
    /// `ROW_ENABLE_N`.
    Row,
    /// `COL_ENABLE_N`.
    Column,
}

impl Flip {
    /// The line that sources current, enabled first and released last.
    #[must_use]
    pub const fn source(self) -> EnableLine {
        match self {
            Self::Set => EnableLine::Row,
            Self::Clear => EnableLine::Column,
        }
    }

    /// The line that sinks current, enabled for the pulse duration.
    #[must_use]
    pub const fn sink(self) -> EnableLine {
        match self {
            Self::Set => EnableLine::Column,
            Self::Clear => EnableLine::Row,
        }
    }
}
