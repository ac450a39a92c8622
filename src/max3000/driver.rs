//! Bit-banged driver for chained MAX3000 panels over seven `embedded-hal` output pins.
//!
//! The driver owns two [`DotFrame`]s: the one being drawn and the one last sent to the panels.
//! [`Max3000Driver::display`] flips only the dots that differ, one panel position at a time,
//! across every chained panel at once.

use embedded_hal::digital::{OutputPin, PinState};
use embedded_hal_async::delay::DelayNs;
use rand::{SeedableRng, rngs::SmallRng, seq::SliceRandom};

use crate::{
    Error, Result,
    config::{BoardOrder, DISSOLVE_SEED_DEFAULT, MAX_BOARDS, PULSE_DURATION_US_DEFAULT, PinRole},
    max3000::{
        frame::{Canvas, DotColor, DotFrame, Rotation},
        protocol::{
            EnableLine, Flip, PANEL_DOTS, PANEL_HEIGHT, PANEL_WIDTH, SOURCE_SETTLE_US, ShiftWord,
        },
    },
};

/// One driver output with optional logic inversion.
pub struct OutputLine<P> {
    pin: P,
    role: PinRole,
    inverted: bool,
}

impl<P: OutputPin> OutputLine<P> {
    /// Drive the line to `high`, after inversion.
    fn write(&mut self, high: bool) -> Result<()> {
        let level = PinState::from(high != self.inverted);
        self.pin.set_state(level).map_err(|_| Error::Pin(self.role))
    }
}

/// The seven output pins of one MAX3000 driver board.
pub struct Max3000Pins<P> {
    lines: [OutputLine<P>; 7],
}

impl<P> Max3000Pins<P> {
    /// Collect the pins in [`PinRole::ALL`] order. No pin starts inverted.
    #[must_use]
    pub fn new(clk: P, mosi: P, col: P, row: P, pulse: P, latch: P, reset: P) -> Self {
        let line = |pin, role| OutputLine {
            pin,
            role,
            inverted: false,
        };
        Self {
            lines: [
                line(clk, PinRole::Clk),
                line(mosi, PinRole::Mosi),
                line(col, PinRole::Col),
                line(row, PinRole::Row),
                line(pulse, PinRole::Pulse),
                line(latch, PinRole::Latch),
                line(reset, PinRole::Reset),
            ],
        }
    }

    /// Drive `role` with inverted logic.
    #[must_use]
    pub fn with_inverted(mut self, role: PinRole) -> Self {
        self.lines[role.index()].inverted = true;
        self
    }

    /// Whether `role` is driven with inverted logic.
    #[must_use]
    pub fn is_inverted(&self, role: PinRole) -> bool {
        self.lines[role.index()].inverted
    }

    /// Give the pins back in [`PinRole::ALL`] order.
    #[must_use]
    pub fn release(self) -> [P; 7] {
        self.lines.map(|line| line.pin)
    }

    fn line(&mut self, role: PinRole) -> &mut OutputLine<P> {
        &mut self.lines[role.index()]
    }
}

/// Driver for a `W` × `H` display built from chained MAX3000 panels.
///
/// `W` must be a multiple of 28 and `H` a multiple of 16, with at most 16 panels in total.
/// Both are checked at compile time.
pub struct Max3000Driver<P, D, const W: usize, const H: usize> {
    pins: Max3000Pins<P>,
    delay: D,
    frame: DotFrame<W, H>,
    shown: DotFrame<W, H>,
    shift_words: [ShiftWord; MAX_BOARDS],
    shuffled_index: [u16; PANEL_DOTS],
    rotation: Rotation,
    board_order: BoardOrder,
    pulse_duration_us: u16,
    bitbang_delay_us: u32,
    dissolve_seed: u64,
    dissolve: bool,
    invert: bool,
    constant_frame_rate: bool,
    first_update: bool,
}

impl<P, D, const W: usize, const H: usize> Max3000Driver<P, D, W, H>
where
    P: OutputPin,
    D: DelayNs,
{
    /// Panels across.
    pub const BOARDS_WIDE: usize = W / PANEL_WIDTH;
    /// Panels down.
    pub const BOARDS_HIGH: usize = H / PANEL_HEIGHT;
    /// Panels in the chain.
    pub const BOARD_COUNT: usize = Self::BOARDS_WIDE * Self::BOARDS_HIGH;

    /// Wrap the pins and a delay provider. Nothing is driven until [`begin`](Self::begin).
    #[must_use]
    pub fn new(pins: Max3000Pins<P>, delay: D) -> Self {
        const {
            assert!(W > 0 && W % PANEL_WIDTH == 0, "width must be a multiple of 28");
            assert!(H > 0 && H % PANEL_HEIGHT == 0, "height must be a multiple of 16");
            assert!(
                (W / PANEL_WIDTH) * (H / PANEL_HEIGHT) <= MAX_BOARDS,
                "at most 16 panels may be chained"
            );
        };
        Self {
            pins,
            delay,
            frame: DotFrame::new(),
            shown: DotFrame::new(),
            shift_words: [ShiftWord::ZERO; MAX_BOARDS],
            shuffled_index: core::array::from_fn(|index| index as u16),
            rotation: Rotation::Deg0,
            board_order: BoardOrder::RowMajor,
            pulse_duration_us: PULSE_DURATION_US_DEFAULT,
            bitbang_delay_us: 1,
            dissolve_seed: DISSOLVE_SEED_DEFAULT,
            dissolve: false,
            invert: false,
            constant_frame_rate: false,
            first_update: true,
        }
    }

    /// Put the lines in their idle state and, when `reset` is set, pulse the driver's reset.
    ///
    /// Clears both frames and reshuffles the dissolve order. The next [`display`](Self::display)
    /// refreshes every dot.
    pub async fn begin(&mut self, reset: bool) -> Result<()> {
        info!(
            "max3000: begin with {} board(s), reset {}",
            Self::BOARD_COUNT,
            reset
        );
        self.frame.fill(false);
        self.shown.fill(false);
        self.shift_words = [ShiftWord::ZERO; MAX_BOARDS];
        self.first_update = true;
        self.shuffle_index();

        self.pins.line(PinRole::Clk).write(false)?;
        self.pins.line(PinRole::Pulse).write(false)?;
        self.pins.line(PinRole::Row).write(true)?;
        self.pins.line(PinRole::Col).write(true)?;

        if reset {
            self.pins.line(PinRole::Reset).write(true)?;
            self.delay.delay_ms(1).await;
            self.pins.line(PinRole::Reset).write(false)?;
            self.delay.delay_ms(10).await;
            self.pins.line(PinRole::Reset).write(true)?;
            self.delay.delay_ms(5).await;
        }
        Ok(())
    }

    fn shuffle_index(&mut self) {
        for (index, slot) in self.shuffled_index.iter_mut().enumerate() {
            *slot = index as u16;
        }
        let mut rng = SmallRng::seed_from_u64(self.dissolve_seed);
        self.shuffled_index.shuffle(&mut rng);
    }

    /// Send every changed dot to the panels. `force` resends every dot.
    ///
    /// Returns the number of dots flipped, counted per panel.
    pub async fn display(&mut self, force: bool) -> Result<usize> {
        let mut changed = 0;
        for step in 0..PANEL_DOTS {
            let index = if self.dissolve {
                usize::from(self.shuffled_index[step])
            } else {
                step
            };
            let column = index / PANEL_HEIGHT;
            let row = index % PANEL_HEIGHT;

            // All panels share the pulse lines, so decide every panel before pulsing.
            let mut to_set = [false; MAX_BOARDS];
            let mut to_clear = [false; MAX_BOARDS];
            for board in 0..Self::BOARD_COUNT {
                let (x_index, y_index) = self.dot_position(board, column, row);
                let new = self.frame.0[y_index][x_index];
                let old = self.shown.0[y_index][x_index];
                if !force && !self.first_update && new == old {
                    continue;
                }
                self.shift_words[board] = self.shift_words[board].select(row, column);
                let set = new != self.invert;
                to_set[board] = set;
                to_clear[board] = !set;
                changed += 1;
            }

            if self.load_sources(&to_set, Flip::Set) {
                self.shift_out().await?;
                self.pulse(Flip::Set).await?;
            }
            if self.load_sources(&to_clear, Flip::Clear) {
                self.shift_out().await?;
                self.pulse(Flip::Clear).await?;
            }
        }

        self.shown = self.frame;
        self.first_update = false;

        if self.constant_frame_rate {
            for _ in changed.min(PANEL_DOTS)..PANEL_DOTS {
                self.shift_out().await?;
                self.delay
                    .delay_us(2 * SOURCE_SETTLE_US + u32::from(self.pulse_duration_us))
                    .await;
            }
        }

        debug!("max3000: refreshed {} dot(s), force {}", changed, force);
        Ok(changed)
    }

    /// Physical frame position of panel-local `(column, row)` on chain index `board`.
    fn dot_position(&self, board: usize, column: usize, row: usize) -> (usize, usize) {
        let (board_x, board_y) = self
            .board_order
            .position(board, Self::BOARDS_WIDE, Self::BOARDS_HIGH);
        (board_x * PANEL_WIDTH + column, board_y * PANEL_HEIGHT + row)
    }

    /// Load the source bits for `flip` into every panel's word. Returns whether any panel flips.
    fn load_sources(&mut self, flips: &[bool; MAX_BOARDS], flip: Flip) -> bool {
        let mut any = false;
        for (word, marked) in self.shift_words[..Self::BOARD_COUNT]
            .iter_mut()
            .zip(flips.iter().copied())
        {
            *word = match flip {
                Flip::Set => word.set_sources(marked, false),
                Flip::Clear => word.set_sources(false, marked),
            };
            any |= marked;
        }
        any
    }

    /// Shift every panel's word into the chain, panel 0 first, then latch.
    async fn shift_out(&mut self) -> Result<()> {
        for board in 0..Self::BOARD_COUNT {
            for bit in self.shift_words[board].msb_first() {
                self.pins.line(PinRole::Mosi).write(bit)?;
                self.bitbang_delay().await;
                self.pins.line(PinRole::Clk).write(true)?;
                self.bitbang_delay().await;
                self.pins.line(PinRole::Clk).write(false)?;
                self.bitbang_delay().await;
            }
        }
        self.pins.line(PinRole::Latch).write(true)?;
        self.pins.line(PinRole::Latch).write(false)?;
        Ok(())
    }

    async fn bitbang_delay(&mut self) {
        if self.bitbang_delay_us > 0 {
            self.delay.delay_us(self.bitbang_delay_us).await;
        }
    }

    /// Fire one flip pulse. Source turns on first and off last; enables are active low.
    async fn pulse(&mut self, flip: Flip) -> Result<()> {
        let source = enable_role(flip.source());
        let sink = enable_role(flip.sink());

        self.pins.line(PinRole::Pulse).write(true)?;
        self.pins.line(source).write(false)?;
        self.delay.delay_us(SOURCE_SETTLE_US).await;
        self.pins.line(sink).write(false)?;

        self.delay
            .delay_us(u32::from(self.pulse_duration_us))
            .await;

        self.pins.line(sink).write(true)?;
        self.delay.delay_us(SOURCE_SETTLE_US).await;
        self.pins.line(source).write(true)?;
        self.pins.line(PinRole::Pulse).write(false)?;
        Ok(())
    }

    /// Turn the user LED on panel `board` on or off. Takes effect immediately.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`] if there is no such panel.
    pub async fn set_user_led(&mut self, board: usize, on: bool) -> Result<()> {
        if board >= Self::BOARD_COUNT {
            return Err(Error::IndexOutOfBounds);
        }
        self.shift_words[board] = self.shift_words[board].set_user_led(on);
        self.shift_out().await
    }

    /// Swap lit and dark faces on the whole display. Refreshes every dot immediately.
    pub async fn invert_display(&mut self, invert: bool) -> Result<usize> {
        self.invert = invert;
        self.display(true).await
    }

    /// Swap lit and dark faces from the next `display` on, without refreshing now.
    pub fn set_invert(&mut self, invert: bool) {
        self.invert = invert;
    }

    /// Whether lit and dark faces are swapped.
    #[must_use]
    pub const fn is_inverted(&self) -> bool {
        self.invert
    }

    /// Turn every dot dark in the drawing frame. Takes effect on the next `display`.
    pub fn clear_display(&mut self) {
        self.frame.fill(false);
    }

    /// Draw one dot in logical (rotated) coordinates. Out-of-range coordinates are ignored.
    pub fn draw_pixel(&mut self, x_index: i32, y_index: i32, color: DotColor) {
        self.canvas().draw_pixel(x_index, y_index, color);
    }

    /// Read one dot of the drawing frame in logical coordinates.
    #[must_use]
    pub fn get_pixel(&self, x_index: i32, y_index: i32) -> bool {
        self.frame.get_rotated(self.rotation, x_index, y_index)
    }

    /// A rotation-aware drawing surface over the drawing frame.
    pub fn canvas(&mut self) -> Canvas<'_, W, H> {
        Canvas::new(&mut self.frame, self.rotation)
    }

    /// The drawing frame, in physical coordinates.
    #[must_use]
    pub const fn frame(&self) -> &DotFrame<W, H> {
        &self.frame
    }

    /// Mutable access to the drawing frame, in physical coordinates.
    pub const fn frame_mut(&mut self) -> &mut DotFrame<W, H> {
        &mut self.frame
    }

    /// The frame the panels currently show.
    #[must_use]
    pub const fn shown_frame(&self) -> &DotFrame<W, H> {
        &self.shown
    }

    /// Replace the drawing frame.
    pub fn replace_frame(&mut self, frame: DotFrame<W, H>) {
        self.frame = frame;
    }

    /// Logical width after rotation.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.rotation.logical_size(W, H).0
    }

    /// Logical height after rotation.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.rotation.logical_size(W, H).1
    }

    /// Panels in the chain.
    #[must_use]
    pub const fn board_count(&self) -> usize {
        Self::BOARD_COUNT
    }

    /// Rotation between logical and physical coordinates.
    #[must_use]
    pub const fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Rotate what is drawn from now on. The drawing frame itself is not moved.
    pub fn set_rotation(&mut self, rotation: Rotation) {
        self.rotation = rotation;
    }

    /// Flip in a shuffled order instead of column by column.
    pub fn set_dissolve(&mut self, dissolve: bool) {
        self.dissolve = dissolve;
    }

    /// Seed for the dissolve order. Takes effect on the next [`begin`](Self::begin).
    pub fn set_dissolve_seed(&mut self, seed: u64) {
        self.dissolve_seed = seed;
    }

    /// Length of each flip pulse, in microseconds.
    pub fn set_pulse_duration_us(&mut self, pulse_duration_us: u16) {
        self.pulse_duration_us = pulse_duration_us;
    }

    /// Pad every `display` call to the time a full refresh takes.
    pub fn set_constant_frame_rate(&mut self, constant_frame_rate: bool) {
        self.constant_frame_rate = constant_frame_rate;
    }

    /// How the chained panels are wired.
    pub fn set_board_order(&mut self, board_order: BoardOrder) {
        self.board_order = board_order;
    }

    /// Delay around each shift clock edge, in microseconds. Zero skips the delay.
    pub fn set_bitbang_delay_us(&mut self, bitbang_delay_us: u32) {
        self.bitbang_delay_us = bitbang_delay_us;
    }

    /// Wait on the driver's delay provider.
    pub async fn delay_ms(&mut self, millis: u32) {
        self.delay.delay_ms(millis).await;
    }

    /// Give back the pins and the delay provider.
    pub fn release(self) -> (Max3000Pins<P>, D) {
        (self.pins, self.delay)
    }
}

const fn enable_role(line: EnableLine) -> PinRole {
    match line {
        EnableLine::Row => PinRole::Row,
        EnableLine::Column => PinRole::Col,
    }
}
