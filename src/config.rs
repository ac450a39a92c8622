//! Configuration vocabulary shared by the device code and the build-time schema.
//!
//! On the device, [`Max3000Options`] carries the setter-level settings that a display applies at
//! construction. On the host, [`schema`] loads the full YAML-like component configuration and
//! validates it before [`codegen`](crate::codegen) turns it into firmware source.
//!
//! # Keys
//!
//! | Key | Type | Default |
//! |-----|------|---------|
//! | `clk_pin`, `mosi_pin`, `col_pin`, `row_pin`, `pulse_pin`, `latch_pin`, `reset_pin` | output pin | *required* |
//! | `dissolve` | bool | `true` |
//! | `update_interval` | time period or `never` | `1s` |
//! | `lambda` / `pages` | writer source (mutually exclusive) | none |

#[cfg(feature = "host")]
pub mod schema;

use embassy_time::Duration;
use serde::Deserialize;

pub use crate::max3000::frame::Rotation;

/// Highest GPIO number accepted in a pin reference (RP2350B has GPIO0-GPIO47).
pub const MAX_GPIO: u8 = 47;

/// Maximum number of pages a display can cycle through.
pub const MAX_PAGES: usize = 8;

/// Maximum number of chained panels.
pub const MAX_BOARDS: usize = 16;

/// Default dissolve shuffle seed ("MAX3").
pub const DISSOLVE_SEED_DEFAULT: u64 = 0x4D41_5833;

/// Default flip pulse length. Long enough for reliable flips without dragging the frame rate.
pub const PULSE_DURATION_US_DEFAULT: u16 = 150;

// ============================================================================
// PinRole - which driver line a pin feeds
// ============================================================================

/// The seven output lines of the MAX3000 driver board.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinRole {
    /// Shift register clock (MTX_CLK).
    Clk,
    /// Shift register data (MTX_DIN).
    Mosi,
    /// Column drive enable, active low (COL_ENABLE_N).
    Col,
    /// Row drive enable, active low (ROW_ENABLE_N).
    Row,
    /// Global flip pulse enable (PULSE_ENABLE).
    Pulse,
    /// Shift register latch (MTX_LAT).
    Latch,
    /// Driver reset (MTX_RST).
    Reset,
}

impl PinRole {
    /// Every role, in configuration order.
    pub const ALL: [Self; 7] = [
        Self::Clk,
        Self::Mosi,
        Self::Col,
        Self::Row,
        Self::Pulse,
        Self::Latch,
        Self::Reset,
    ];

    /// The configuration key for this role, e.g. `"clk_pin"`.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Clk => "clk_pin",
            Self::Mosi => "mosi_pin",
            Self::Col => "col_pin",
            Self::Row => "row_pin",
            Self::Pulse => "pulse_pin",
            Self::Latch => "latch_pin",
            Self::Reset => "reset_pin",
        }
    }

    /// The role's variant name as written in Rust source (`PinRole::Clk`).
    #[must_use]
    pub const fn variant_name(self) -> &'static str {
        match self {
            Self::Clk => "Clk",
            Self::Mosi => "Mosi",
            Self::Col => "Col",
            Self::Row => "Row",
            Self::Pulse => "Pulse",
            Self::Latch => "Latch",
            Self::Reset => "Reset",
        }
    }

    #[must_use]
    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

// ============================================================================
// OutputPinSpec - a reference to a GPIO line
// ============================================================================

/// A reference to an output-capable GPIO, as written in a configuration.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutputPinSpec {
    /// GPIO number.
    pub number: u8,
    /// Drive the line with inverted logic.
    pub inverted: bool,
    /// Permit another role to share this GPIO.
    pub allow_other_uses: bool,
}

impl OutputPinSpec {
    /// A plain, non-inverted reference to `number`.
    #[must_use]
    pub const fn new(number: u8) -> Self {
        Self {
            number,
            inverted: false,
            allow_other_uses: false,
        }
    }

    /// Same pin with inverted logic.
    #[must_use]
    pub const fn inverted(self) -> Self {
        Self {
            inverted: true,
            ..self
        }
    }

    /// Same pin, willing to share its GPIO with another role.
    #[must_use]
    pub const fn allow_other_uses(self) -> Self {
        Self {
            allow_other_uses: true,
            ..self
        }
    }

    /// Parse `GPIO5`, `gpio5`, `PIN_5`, or `5`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPin`] (tagged with `role`) for anything else, or a number
    /// above [`MAX_GPIO`].
    pub fn parse(text: &str, role: PinRole) -> Result<Self, ConfigError> {
        let text = text.trim();
        let digits = strip_prefix_ignore_case(text, "gpio")
            .or_else(|| strip_prefix_ignore_case(text, "pin_"))
            .unwrap_or(text);
        let number: u8 = digits.parse().map_err(|_| ConfigError::InvalidPin(role))?;
        Self::from_number(number, role)
    }

    /// Check `number` against [`MAX_GPIO`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPin`] when the GPIO does not exist.
    pub const fn from_number(number: u8, role: PinRole) -> Result<Self, ConfigError> {
        if number > MAX_GPIO {
            return Err(ConfigError::InvalidPin(role));
        }
        Ok(Self::new(number))
    }
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &text[prefix.len()..])
}

/// All seven pin references of one display, some possibly not yet assigned.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PinAssignment {
    pins: [Option<OutputPinSpec>; 7],
}

impl PinAssignment {
    /// An assignment with no pins set.
    #[must_use]
    pub const fn new() -> Self {
        Self { pins: [None; 7] }
    }

    /// Assign `role`, replacing any earlier assignment.
    pub fn set(&mut self, role: PinRole, spec: OutputPinSpec) {
        self.pins[role.index()] = Some(spec);
    }

    /// Builder-style [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, role: PinRole, spec: OutputPinSpec) -> Self {
        self.set(role, spec);
        self
    }

    /// The pin assigned to `role`, if any.
    #[must_use]
    pub const fn get(&self, role: PinRole) -> Option<OutputPinSpec> {
        self.pins[role.index()]
    }

    /// The pin assigned to `role`. Only meaningful after [`validate`](Self::validate).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingPin`] if the role is unassigned.
    pub fn require(&self, role: PinRole) -> Result<OutputPinSpec, ConfigError> {
        self.get(role).ok_or(ConfigError::MissingPin(role))
    }

    /// Check that every role is assigned and that no GPIO is shared without permission.
    ///
    /// Missing pins are reported in [`PinRole::ALL`] order.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingPin`] or [`ConfigError::DuplicatePin`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        for role in PinRole::ALL {
            self.require(role)?;
        }
        for (first_index, first) in PinRole::ALL.iter().enumerate() {
            let first_spec = self.require(*first)?;
            for second in &PinRole::ALL[first_index + 1..] {
                let second_spec = self.require(*second)?;
                let shared = first_spec.allow_other_uses && second_spec.allow_other_uses;
                if first_spec.number == second_spec.number && !shared {
                    return Err(ConfigError::DuplicatePin {
                        number: first_spec.number,
                        first: *first,
                        second: *second,
                    });
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// Time periods
// ============================================================================

/// How often a polling component redraws.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UpdateInterval {
    /// Redraw on a fixed period.
    Every(Duration),
    /// Redraw only when asked.
    Never,
}

impl UpdateInterval {
    /// Default polling period: one second.
    pub const DEFAULT: Self = Self::Every(Duration::from_secs(1));

    /// Parse a time period such as `500ms`, or `never`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTimePeriod`] if the text is neither.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        if text.trim().eq_ignore_ascii_case("never") {
            return Ok(Self::Never);
        }
        let period = parse_time_period(text)?;
        if period.as_ticks() == 0 {
            return Err(ConfigError::InvalidTimePeriod);
        }
        Ok(Self::Every(period))
    }

    /// The period, or `None` for [`Never`](Self::Never).
    #[must_use]
    pub const fn period(self) -> Option<Duration> {
        match self {
            Self::Every(period) => Some(period),
            Self::Never => None,
        }
    }
}

impl Default for UpdateInterval {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Parse a time period: a non-negative number with an optional fraction, then one of
/// `us`, `ms`, `s`, `min`, `h`, `d`. Whitespace between number and unit is allowed.
///
/// ```
/// use max3000_kit::config::parse_time_period;
/// use embassy_time::Duration;
///
/// assert_eq!(parse_time_period("1s").unwrap(), Duration::from_secs(1));
/// assert_eq!(parse_time_period("0.5 min").unwrap(), Duration::from_secs(30));
/// assert!(parse_time_period("5").is_err()); // a unit is required
/// ```
///
/// # Errors
///
/// Returns [`ConfigError::InvalidTimePeriod`] for a missing or unknown unit, a malformed
/// number, or overflow.
pub fn parse_time_period(text: &str) -> Result<Duration, ConfigError> {
    let text = text.trim();
    let split = text
        .find(|ch: char| !(ch.is_ascii_digit() || ch == '.'))
        .ok_or(ConfigError::InvalidTimePeriod)?;
    let (number, unit) = text.split_at(split);
    let micros_per_unit: u64 = match unit.trim() {
        "us" => 1,
        "ms" => 1_000,
        "s" => 1_000_000,
        "min" => 60_000_000,
        "h" => 3_600_000_000,
        "d" => 86_400_000_000,
        _ => return Err(ConfigError::InvalidTimePeriod),
    };

    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
    if whole.is_empty() && fraction.is_empty() {
        return Err(ConfigError::InvalidTimePeriod);
    }
    let whole: u64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| ConfigError::InvalidTimePeriod)?
    };
    let mut micros = whole
        .checked_mul(micros_per_unit)
        .ok_or(ConfigError::InvalidTimePeriod)?;

    // Fractional digits below one microsecond are dropped.
    let mut scale = micros_per_unit;
    for digit in fraction.chars() {
        let digit = u64::from(digit.to_digit(10).ok_or(ConfigError::InvalidTimePeriod)?);
        scale /= 10;
        micros = micros
            .checked_add(digit * scale)
            .ok_or(ConfigError::InvalidTimePeriod)?;
    }

    Ok(Duration::from_micros(micros))
}

// ============================================================================
// Board order
// ============================================================================

/// How chained panels are laid out, in shift-register order.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(rename_all = "snake_case")]
pub enum BoardOrder {
    /// Boards wired in rows, left to right on every row.
    #[default]
    RowMajor,
    /// Boards wired in rows, reversing direction on every other row.
    RowMajorBounce,
    /// Boards wired in columns, top to bottom on every column.
    ColumnMajor,
    /// Boards wired in columns, reversing direction on every other column.
    ColumnMajorBounce,
}

impl BoardOrder {
    /// Panel position `(column, row)` of chain index `board` in a grid `wide` × `high`.
    #[must_use]
    pub const fn position(self, board: usize, wide: usize, high: usize) -> (usize, usize) {
        match self {
            Self::RowMajor => (board % wide, board / wide),
            Self::RowMajorBounce => {
                let row = board / wide;
                let column = board % wide;
                if row % 2 == 1 {
                    (wide - 1 - column, row)
                } else {
                    (column, row)
                }
            }
            Self::ColumnMajor => (board / high, board % high),
            Self::ColumnMajorBounce => {
                let column = board / high;
                let row = board % high;
                if column % 2 == 1 {
                    (column, high - 1 - row)
                } else {
                    (column, row)
                }
            }
        }
    }

    /// The variant name as written in Rust source.
    #[must_use]
    pub const fn variant_name(self) -> &'static str {
        match self {
            Self::RowMajor => "RowMajor",
            Self::RowMajorBounce => "RowMajorBounce",
            Self::ColumnMajor => "ColumnMajor",
            Self::ColumnMajorBounce => "ColumnMajorBounce",
        }
    }
}

// ============================================================================
// Max3000Options - setter-level settings
// ============================================================================

/// Settings a [`Max3000Display`](crate::max3000::display::Max3000Display) applies when built.
///
/// These mirror the driver's setters. Defaults match the configuration schema: dissolve on,
/// redraw every second.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Max3000Options {
    /// Flip dots in a shuffled order.
    pub dissolve: bool,
    /// How often the writer is re-run.
    pub update_interval: UpdateInterval,
    /// Logical rotation applied to drawing.
    pub rotation: Rotation,
    /// Clear the frame before each writer call.
    pub auto_clear: bool,
    /// Panels across.
    pub panels_wide: u8,
    /// Panels down.
    pub panels_high: u8,
    /// Physical chain order of the panels.
    pub board_order: BoardOrder,
    /// Length of each flip pulse in microseconds.
    pub pulse_duration_us: u16,
    /// Pad every refresh to the same duration.
    pub constant_frame_rate: bool,
    /// Show dark dots as lit and lit dots as dark.
    pub invert: bool,
    /// Seed for the dissolve order.
    pub dissolve_seed: u64,
    /// Settle time around each shift-register clock edge, in microseconds.
    pub bitbang_delay_us: u32,
}

impl Max3000Options {
    /// Schema defaults.
    pub const DEFAULT: Self = Self {
        dissolve: true,
        update_interval: UpdateInterval::DEFAULT,
        rotation: Rotation::Deg0,
        auto_clear: true,
        panels_wide: 1,
        panels_high: 1,
        board_order: BoardOrder::RowMajor,
        pulse_duration_us: PULSE_DURATION_US_DEFAULT,
        constant_frame_rate: false,
        invert: false,
        dissolve_seed: DISSOLVE_SEED_DEFAULT,
        bitbang_delay_us: 1,
    };

    /// Check the panel grid and pulse length.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPanelCount`] or [`ConfigError::InvalidPulseDuration`].
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.panels_wide == 0 || self.panels_high == 0 {
            return Err(ConfigError::InvalidPanelCount);
        }
        if (self.panels_wide as usize) * (self.panels_high as usize) > MAX_BOARDS {
            return Err(ConfigError::InvalidPanelCount);
        }
        if self.pulse_duration_us == 0 {
            return Err(ConfigError::InvalidPulseDuration);
        }
        Ok(())
    }
}

impl Default for Max3000Options {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// ============================================================================
// ConfigError
// ============================================================================

/// Why a configuration was rejected.
#[derive(Clone, Copy, Debug, Eq, PartialEq, derive_more::Display, derive_more::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// A required pin key was absent.
    #[display("required key `{}` is missing", _0.key())]
    MissingPin(#[error(not(source))] PinRole),
    /// Both `pages` and `lambda` were given.
    #[display("cannot specify both `pages` and `lambda`")]
    PagesAndLambda,
    /// A pin reference was malformed or named a GPIO that does not exist.
    #[display("`{}` is not a valid output pin", _0.key())]
    InvalidPin(#[error(not(source))] PinRole),
    /// Two roles share one GPIO without `allow_other_uses`.
    #[display("GPIO{number} is used by both `{}` and `{}`", first.key(), second.key())]
    DuplicatePin {
        /// The shared GPIO.
        number: u8,
        /// The earlier role.
        first: PinRole,
        /// The later role.
        second: PinRole,
    },
    /// A time period had no unit, an unknown unit, or a malformed number.
    #[display("invalid time period")]
    InvalidTimePeriod,
    /// Rotation was not 0, 90, 180, or 270.
    #[display("rotation must be 0, 90, 180, or 270 degrees")]
    InvalidRotation,
    /// The panel grid was empty or had more than [`MAX_BOARDS`] panels.
    #[display("panel grid must have between 1 and {MAX_BOARDS} panels")]
    InvalidPanelCount,
    /// The flip pulse length was zero or too long.
    #[display("pulse_duration must be between 1us and 65535us")]
    InvalidPulseDuration,
    /// `pages` was given but empty.
    #[display("`pages` must list at least one page")]
    EmptyPages,
    /// More than [`MAX_PAGES`] pages.
    #[display("at most {MAX_PAGES} pages are supported")]
    TooManyPages,
    /// Two pages share an id.
    #[display("page ids must be unique")]
    DuplicatePageId,
    /// The component id cannot name a Rust item.
    #[display("`id` must be an identifier of letters, digits, and underscores that is not a Rust keyword")]
    InvalidId,
    /// A boolean option was not `true`/`false` or one of its word forms.
    #[display("expected a boolean: true/false, yes/no, on/off, or enable/disable")]
    InvalidBoolean,
    /// Two roles share one GPIO, which generated firmware cannot express.
    #[display(
        "GPIO{number} is shared by `{}` and `{}`; generated firmware needs one GPIO per role",
        first.key(),
        second.key()
    )]
    SharedPinInFirmware {
        /// The shared GPIO.
        number: u8,
        /// The earlier role.
        first: PinRole,
        /// The later role.
        second: PinRole,
    },
    /// `platform` named something other than `max3000`.
    #[display("`platform` must be `max3000`")]
    UnsupportedPlatform,
}
