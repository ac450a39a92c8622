#![allow(dead_code)]
//! Recording pins, a recording delay, and a simulated chain of panels for host tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use embedded_hal::digital::{ErrorKind, ErrorType, OutputPin};
use embedded_hal_async::delay::DelayNs;
use max3000_kit::config::PinRole;
use max3000_kit::max3000::driver::Max3000Pins;
use max3000_kit::max3000::protocol::{PANEL_HEIGHT, PANEL_WIDTH, ShiftWord};

/// Something the driver did to the outside world, in order.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Event {
    /// A pin was driven to the given physical level.
    Pin(PinRole, bool),
    /// A delay, in nanoseconds.
    Delay(u64),
}

pub type EventLog = Rc<RefCell<Vec<Event>>>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PinFault;

impl embedded_hal::digital::Error for PinFault {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

pub struct RecordingPin {
    role: PinRole,
    log: EventLog,
    fail: bool,
}

impl ErrorType for RecordingPin {
    type Error = PinFault;
}

impl OutputPin for RecordingPin {
    fn set_low(&mut self) -> Result<(), PinFault> {
        self.record(false)
    }

    fn set_high(&mut self) -> Result<(), PinFault> {
        self.record(true)
    }
}

impl RecordingPin {
    fn record(&mut self, high: bool) -> Result<(), PinFault> {
        if self.fail {
            return Err(PinFault);
        }
        self.log.borrow_mut().push(Event::Pin(self.role, high));
        Ok(())
    }
}

pub struct RecordingDelay {
    log: EventLog,
}

impl DelayNs for RecordingDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.log.borrow_mut().push(Event::Delay(u64::from(ns)));
    }

    async fn delay_us(&mut self, us: u32) {
        self.log
            .borrow_mut()
            .push(Event::Delay(u64::from(us) * 1_000));
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.log
            .borrow_mut()
            .push(Event::Delay(u64::from(ms) * 1_000_000));
    }
}

/// Seven recording pins and a recording delay sharing one log.
pub fn recording_hardware() -> (Max3000Pins<RecordingPin>, RecordingDelay, EventLog) {
    recording_hardware_failing(None)
}

/// Like [`recording_hardware`], but every write to `failing` errors.
pub fn recording_hardware_failing(
    failing: Option<PinRole>,
) -> (Max3000Pins<RecordingPin>, RecordingDelay, EventLog) {
    let log = EventLog::default();
    let pin = |role| RecordingPin {
        role,
        log: Rc::clone(&log),
        fail: failing == Some(role),
    };
    let pins = Max3000Pins::new(
        pin(PinRole::Clk),
        pin(PinRole::Mosi),
        pin(PinRole::Col),
        pin(PinRole::Row),
        pin(PinRole::Pulse),
        pin(PinRole::Latch),
        pin(PinRole::Reset),
    );
    let delay = RecordingDelay {
        log: Rc::clone(&log),
    };
    (pins, delay, log)
}

const ADDRESS_MASK: u16 = 0x08FF;
const COL_SOURCE_BIT: u8 = 8;
const ROW_SOURCE_BIT: u8 = 10;

/// Panels as the hardware would see them, replayed from an event log.
pub struct PanelSim {
    levels: HashMap<PinRole, bool>,
    shifted: Vec<bool>,
    /// Latched word per board, in shift order.
    pub latched: Vec<ShiftWord>,
    /// Dot faces per board, indexed `[board][row][column]`.
    pub dots: Vec<[[bool; PANEL_WIDTH]; PANEL_HEIGHT]>,
    /// Set pulses fired.
    pub set_pulses: usize,
    /// Clear pulses fired.
    pub clear_pulses: usize,
    /// Latch edges seen.
    pub latches: usize,
    addresses: HashMap<u16, (usize, usize)>,
}

impl PanelSim {
    pub fn new(board_count: usize) -> Self {
        let mut addresses = HashMap::new();
        for row in 0..PANEL_HEIGHT {
            for column in 0..PANEL_WIDTH {
                addresses.insert(ShiftWord::ZERO.select(row, column).bits(), (row, column));
            }
        }
        Self {
            levels: HashMap::new(),
            shifted: Vec::new(),
            latched: vec![ShiftWord::ZERO; board_count],
            dots: vec![[[false; PANEL_WIDTH]; PANEL_HEIGHT]; board_count],
            set_pulses: 0,
            clear_pulses: 0,
            latches: 0,
            addresses,
        }
    }

    fn level(&self, role: PinRole) -> bool {
        self.levels.get(&role).copied().unwrap_or(false)
    }

    /// Replay every event in `log`, then empty it.
    pub fn replay(&mut self, log: &EventLog) {
        let events: Vec<Event> = log.borrow_mut().drain(..).collect();
        for event in events {
            if let Event::Pin(role, high) = event {
                self.apply(role, high);
            }
        }
    }

    fn apply(&mut self, role: PinRole, high: bool) {
        let was_high = self.level(role);
        self.levels.insert(role, high);
        let rising = high && !was_high;
        let falling = !high && was_high;
        match role {
            PinRole::Clk if rising => {
                let bit = self.level(PinRole::Mosi);
                self.shifted.push(bit);
            }
            PinRole::Latch if rising => self.latch(),
            PinRole::Row | PinRole::Col if falling && self.level(PinRole::Pulse) => {
                let other = if role == PinRole::Row {
                    PinRole::Col
                } else {
                    PinRole::Row
                };
                // The second enable to fall completes the circuit; the first is the source.
                if !self.level(other) {
                    self.fire(other);
                }
            }
            _ => {}
        }
    }

    fn latch(&mut self) {
        self.latches += 1;
        assert_eq!(
            self.shifted.len(),
            16 * self.latched.len(),
            "every latch must follow one word per board"
        );
        for (board, chunk) in self.shifted.chunks(16).enumerate() {
            let bits = chunk
                .iter()
                .fold(0u16, |word, bit| (word << 1) | u16::from(*bit));
            self.latched[board] = ShiftWord::from_bits(bits);
        }
        self.shifted.clear();
    }

    fn fire(&mut self, source: PinRole) {
        let (source_bit, lit) = if source == PinRole::Row {
            self.set_pulses += 1;
            (ROW_SOURCE_BIT, true)
        } else {
            self.clear_pulses += 1;
            (COL_SOURCE_BIT, false)
        };
        for (board, word) in self.latched.iter().enumerate() {
            if word.bit(source_bit) {
                let (row, column) = self.addresses[&(word.bits() & ADDRESS_MASK)];
                self.dots[board][row][column] = lit;
            }
        }
    }

    /// Dots of one board in physical `[row][column]` order.
    pub fn board(&self, board: usize) -> &[[bool; PANEL_WIDTH]; PANEL_HEIGHT] {
        &self.dots[board]
    }
}

/// Pin events only, dropping delays.
pub fn pin_events(events: &[Event]) -> Vec<(PinRole, bool)> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::Pin(role, high) => Some((*role, *high)),
            Event::Delay(_) => None,
        })
        .collect()
}
