//! Build-time configuration schema for one MAX3000 display component.
//!
//! A component is written as a YAML mapping:
//!
//! ```yaml
//! platform: max3000
//! id: hallway_sign
//! clk_pin: GPIO2
//! mosi_pin: GPIO3
//! col_pin: GPIO4
//! row_pin: GPIO5
//! pulse_pin: GPIO6
//! latch_pin: GPIO7
//! reset_pin:
//!   number: GPIO8
//!   inverted: true
//! dissolve: false
//! update_interval: 500ms
//! lambda: |-
//!   it.fill(DotColor::Light);
//! ```
//!
//! [`Max3000Config::from_yaml`] and [`Max3000ConfigBuilder::build`] apply the same checks, in
//! this order: required pins, `pages` versus `lambda`, pin references, time periods, rotation,
//! panel grid, pages.

use std::collections::HashSet;

use serde::Deserialize;

use crate::{
    Result,
    config::{
        BoardOrder, ConfigError, MAX_PAGES, Max3000Options, OutputPinSpec, PinAssignment, PinRole,
        Rotation, UpdateInterval, parse_time_period,
    },
};

/// Id used when a configuration does not give one.
pub const DEFAULT_ID: &str = "max3000";

/// Value of the `platform` key, when present.
pub const PLATFORM: &str = "max3000";

/// A validated MAX3000 component configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Max3000Config {
    /// Component id. Names the generated type and constructor.
    pub id: String,
    /// All seven pins, validated.
    pub pins: PinAssignment,
    /// Setter-level options.
    pub options: Max3000Options,
    /// What the display draws.
    pub content: ContentSpec,
}

/// Display content as written in a configuration. Writer bodies are opaque Rust source.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ContentSpec {
    /// Neither `lambda` nor `pages`.
    #[default]
    Blank,
    /// A single writer body.
    Lambda(String),
    /// One writer body per page.
    Pages(Vec<PageSpec>),
}

/// One entry of `pages`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageSpec {
    /// Page id. Defaults to `page1`, `page2`, ... by position.
    pub id: String,
    /// Writer body.
    pub lambda: String,
}

impl Max3000Config {
    /// Load one component mapping.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Yaml`](crate::Error::Yaml) for malformed text, unknown keys, or values of
    /// the wrong shape, and [`Error::Config`](crate::Error::Config) when a rule is broken.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let raw: RawConfig = serde_yaml::from_str(text)?;
        Ok(raw.validate()?)
    }

    /// Start building a configuration in code.
    #[must_use]
    pub fn builder() -> Max3000ConfigBuilder {
        Max3000ConfigBuilder::default()
    }

    /// Whether content comes from `lambda` or `pages`.
    #[must_use]
    pub const fn has_writer(&self) -> bool {
        !matches!(self.content, ContentSpec::Blank)
    }
}

// ============================================================================
// Raw (deserialized) form
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    platform: Option<String>,
    id: Option<String>,
    clk_pin: Option<RawPin>,
    mosi_pin: Option<RawPin>,
    col_pin: Option<RawPin>,
    row_pin: Option<RawPin>,
    pulse_pin: Option<RawPin>,
    latch_pin: Option<RawPin>,
    reset_pin: Option<RawPin>,
    dissolve: Option<RawBool>,
    update_interval: Option<RawScalar>,
    rotation: Option<RawScalar>,
    auto_clear_enabled: Option<RawBool>,
    panels_wide: Option<u8>,
    panels_high: Option<u8>,
    board_order: Option<BoardOrder>,
    pulse_duration: Option<RawScalar>,
    constant_frame_rate: Option<RawBool>,
    invert: Option<RawBool>,
    lambda: Option<String>,
    pages: Option<Vec<RawPage>>,
}

/// A YAML scalar that may arrive as a number or a string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawScalar {
    Integer(i64),
    Float(f64),
    Text(String),
}

/// A boolean, or one of the word forms configuration files use for one.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawBool {
    Bool(bool),
    Text(String),
}

impl RawBool {
    fn to_bool(&self) -> Result<bool, ConfigError> {
        let text = match self {
            Self::Bool(value) => return Ok(*value),
            Self::Text(text) => text.trim().to_ascii_lowercase(),
        };
        match text.as_str() {
            "true" | "yes" | "on" | "enable" => Ok(true),
            "false" | "no" | "off" | "disable" => Ok(false),
            _ => Err(ConfigError::InvalidBoolean),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPin {
    Number(u32),
    Name(String),
    Details(RawPinDetails),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPinDetails {
    number: RawPinNumber,
    #[serde(default)]
    inverted: bool,
    mode: Option<String>,
    #[serde(default)]
    allow_other_uses: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPinNumber {
    Number(u32),
    Name(String),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPage {
    id: Option<String>,
    lambda: String,
}

impl RawConfig {
    fn raw_pin(&self, role: PinRole) -> Option<&RawPin> {
        match role {
            PinRole::Clk => self.clk_pin.as_ref(),
            PinRole::Mosi => self.mosi_pin.as_ref(),
            PinRole::Col => self.col_pin.as_ref(),
            PinRole::Row => self.row_pin.as_ref(),
            PinRole::Pulse => self.pulse_pin.as_ref(),
            PinRole::Latch => self.latch_pin.as_ref(),
            PinRole::Reset => self.reset_pin.as_ref(),
        }
    }

    fn validate(self) -> Result<Max3000Config, ConfigError> {
        if self
            .platform
            .as_deref()
            .is_some_and(|platform| platform != PLATFORM)
        {
            return Err(ConfigError::UnsupportedPlatform);
        }

        // Presence first, so a missing pin is reported before anything else.
        for role in PinRole::ALL {
            if self.raw_pin(role).is_none() {
                return Err(ConfigError::MissingPin(role));
            }
        }
        if self.lambda.is_some() && self.pages.is_some() {
            return Err(ConfigError::PagesAndLambda);
        }

        let mut pins = PinAssignment::new();
        for role in PinRole::ALL {
            let raw = self.raw_pin(role).ok_or(ConfigError::MissingPin(role))?;
            pins.set(role, raw.to_spec(role)?);
        }
        pins.validate()?;

        let mut builder = Max3000ConfigBuilder {
            id: self.id,
            pins,
            ..Max3000ConfigBuilder::default()
        };
        let options = &mut builder.options;
        if let Some(dissolve) = &self.dissolve {
            options.dissolve = dissolve.to_bool()?;
        }
        if let Some(update_interval) = &self.update_interval {
            options.update_interval = UpdateInterval::parse(update_interval.time_text()?)?;
        }
        if let Some(pulse_duration) = &self.pulse_duration {
            let text = pulse_duration
                .time_text()
                .map_err(|_| ConfigError::InvalidPulseDuration)?;
            options.pulse_duration_us = parse_pulse_duration(text)?;
        }
        if let Some(rotation) = &self.rotation {
            options.rotation = rotation.to_rotation()?;
        }
        if let Some(auto_clear) = &self.auto_clear_enabled {
            options.auto_clear = auto_clear.to_bool()?;
        }
        if let Some(panels_wide) = self.panels_wide {
            options.panels_wide = panels_wide;
        }
        if let Some(panels_high) = self.panels_high {
            options.panels_high = panels_high;
        }
        if let Some(board_order) = self.board_order {
            options.board_order = board_order;
        }
        if let Some(constant_frame_rate) = &self.constant_frame_rate {
            options.constant_frame_rate = constant_frame_rate.to_bool()?;
        }
        if let Some(invert) = &self.invert {
            options.invert = invert.to_bool()?;
        }

        builder.lambda = self.lambda;
        builder.pages = self.pages.map(|pages| {
            pages
                .into_iter()
                .enumerate()
                .map(|(index, page)| PageSpec {
                    id: page.id.unwrap_or_else(|| default_page_id(index)),
                    lambda: page.lambda,
                })
                .collect()
        });
        builder.validate()
    }
}

impl RawScalar {
    /// Time periods must carry a unit, so only text is accepted.
    fn time_text(&self) -> Result<&str, ConfigError> {
        match self {
            Self::Text(text) => Ok(text),
            Self::Integer(_) | Self::Float(_) => Err(ConfigError::InvalidTimePeriod),
        }
    }

    fn to_rotation(&self) -> Result<Rotation, ConfigError> {
        let degrees = match self {
            Self::Integer(degrees) => *degrees,
            Self::Text(text) => text
                .trim()
                .trim_end_matches('°')
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidRotation)?,
            Self::Float(_) => return Err(ConfigError::InvalidRotation),
        };
        let degrees = u16::try_from(degrees).map_err(|_| ConfigError::InvalidRotation)?;
        Rotation::from_degrees(degrees)
    }
}

impl RawPin {
    fn to_spec(&self, role: PinRole) -> Result<OutputPinSpec, ConfigError> {
        match self {
            Self::Number(number) => pin_from_number(*number, role),
            Self::Name(name) => OutputPinSpec::parse(name, role),
            Self::Details(details) => {
                let output_mode = details
                    .mode
                    .as_deref()
                    .is_none_or(|mode| mode.trim().eq_ignore_ascii_case("output"));
                if !output_mode {
                    return Err(ConfigError::InvalidPin(role));
                }
                let spec = match &details.number {
                    RawPinNumber::Number(number) => pin_from_number(*number, role)?,
                    RawPinNumber::Name(name) => OutputPinSpec::parse(name, role)?,
                };
                Ok(OutputPinSpec {
                    inverted: details.inverted,
                    allow_other_uses: details.allow_other_uses,
                    ..spec
                })
            }
        }
    }
}

fn pin_from_number(number: u32, role: PinRole) -> Result<OutputPinSpec, ConfigError> {
    let number = u8::try_from(number).map_err(|_| ConfigError::InvalidPin(role))?;
    OutputPinSpec::from_number(number, role)
}

fn parse_pulse_duration(text: &str) -> Result<u16, ConfigError> {
    let period = parse_time_period(text).map_err(|_| ConfigError::InvalidPulseDuration)?;
    match u16::try_from(period.as_micros()) {
        Ok(0) | Err(_) => Err(ConfigError::InvalidPulseDuration),
        Ok(micros) => Ok(micros),
    }
}

fn default_page_id(index: usize) -> String {
    format!("page{}", index + 1)
}

const RUST_KEYWORDS: [&str; 52] = [
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "crate",
    "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl",
    "in", "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "self", "Self", "static", "struct", "super", "trait", "true", "try", "type",
    "typeof", "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

/// Whether `id` can name the generated type and constructor.
fn is_identifier(id: &str) -> bool {
    let mut chars = id.chars();
    let well_formed = chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_');
    if !well_formed || RUST_KEYWORDS.contains(&id) {
        return false;
    }
    let type_name = crate::codegen::type_name(id);
    type_name
        .chars()
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic())
        && !RUST_KEYWORDS.contains(&type_name.as_str())
}

// ============================================================================
// Builder
// ============================================================================

/// Build a [`Max3000Config`] in code, with the same checks as YAML loading.
///
/// ```
/// use max3000_kit::config::{OutputPinSpec, PinRole, UpdateInterval, schema::Max3000Config};
///
/// let mut builder = Max3000Config::builder().id("sign");
/// for (number, role) in (2..).zip(PinRole::ALL) {
///     builder = builder.pin(role, OutputPinSpec::new(number));
/// }
/// let config = builder.update_interval(UpdateInterval::Never).build()?;
/// assert!(config.options.dissolve);
/// assert_eq!(config.options.update_interval, UpdateInterval::Never);
/// # Ok::<(), max3000_kit::Error>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct Max3000ConfigBuilder {
    id: Option<String>,
    pins: PinAssignment,
    options: Max3000Options,
    lambda: Option<String>,
    pages: Option<Vec<PageSpec>>,
}

impl Max3000ConfigBuilder {
    /// Component id. Defaults to [`DEFAULT_ID`].
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Assign the pin for `role`.
    #[must_use]
    pub fn pin(mut self, role: PinRole, spec: OutputPinSpec) -> Self {
        self.pins.set(role, spec);
        self
    }

    /// Flip dots in a shuffled order.
    #[must_use]
    pub const fn dissolve(mut self, dissolve: bool) -> Self {
        self.options.dissolve = dissolve;
        self
    }

    /// How often the display redraws.
    #[must_use]
    pub const fn update_interval(mut self, update_interval: UpdateInterval) -> Self {
        self.options.update_interval = update_interval;
        self
    }

    /// Rotation applied to everything the writers draw.
    #[must_use]
    pub const fn rotation(mut self, rotation: Rotation) -> Self {
        self.options.rotation = rotation;
        self
    }

    /// Clear the frame before each update runs its writer.
    #[must_use]
    pub const fn auto_clear(mut self, auto_clear: bool) -> Self {
        self.options.auto_clear = auto_clear;
        self
    }

    /// Panel grid, across then down.
    #[must_use]
    pub const fn panels(mut self, panels_wide: u8, panels_high: u8) -> Self {
        self.options.panels_wide = panels_wide;
        self.options.panels_high = panels_high;
        self
    }

    /// How the chained panels are wired.
    #[must_use]
    pub const fn board_order(mut self, board_order: BoardOrder) -> Self {
        self.options.board_order = board_order;
        self
    }

    /// Length of each flip pulse, in microseconds.
    #[must_use]
    pub const fn pulse_duration_us(mut self, pulse_duration_us: u16) -> Self {
        self.options.pulse_duration_us = pulse_duration_us;
        self
    }

    /// Pad every refresh to the length of a full one.
    #[must_use]
    pub const fn constant_frame_rate(mut self, constant_frame_rate: bool) -> Self {
        self.options.constant_frame_rate = constant_frame_rate;
        self
    }

    /// Swap lit and dark faces.
    #[must_use]
    pub const fn invert(mut self, invert: bool) -> Self {
        self.options.invert = invert;
        self
    }

    /// Single writer body (Rust statements using `it`).
    #[must_use]
    pub fn lambda(mut self, body: impl Into<String>) -> Self {
        self.lambda = Some(body.into());
        self
    }

    /// Append a page. `None` gives it a positional default id.
    #[must_use]
    pub fn page(mut self, id: Option<&str>, body: impl Into<String>) -> Self {
        let pages = self.pages.get_or_insert_with(Vec::new);
        let id = id.map_or_else(|| default_page_id(pages.len()), str::to_owned);
        pages.push(PageSpec {
            id,
            lambda: body.into(),
        });
        self
    }

    /// Check every rule and produce the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) with the first rule broken.
    pub fn build(self) -> Result<Max3000Config> {
        Ok(self.validate()?)
    }

    fn validate(self) -> Result<Max3000Config, ConfigError> {
        for role in PinRole::ALL {
            self.pins.require(role)?;
        }
        if self.lambda.is_some() && self.pages.is_some() {
            return Err(ConfigError::PagesAndLambda);
        }
        self.pins.validate()?;
        self.options.validate()?;

        let id = self.id.unwrap_or_else(|| DEFAULT_ID.to_owned());
        if !is_identifier(&id) {
            return Err(ConfigError::InvalidId);
        }

        let content = match (self.lambda, self.pages) {
            (Some(lambda), _) => ContentSpec::Lambda(lambda),
            (None, Some(pages)) => {
                if pages.is_empty() {
                    return Err(ConfigError::EmptyPages);
                }
                if pages.len() > MAX_PAGES {
                    return Err(ConfigError::TooManyPages);
                }
                let mut seen = HashSet::new();
                if !pages.iter().all(|page| seen.insert(page.id.as_str())) {
                    return Err(ConfigError::DuplicatePageId);
                }
                ContentSpec::Pages(pages)
            }
            (None, None) => ContentSpec::Blank,
        };

        let config = Max3000Config {
            id,
            pins: self.pins,
            options: self.options,
            content,
        };
        info!(
            "max3000 config `{}`: {} page(s), dissolve {}",
            config.id.as_str(),
            match &config.content {
                ContentSpec::Pages(pages) => pages.len(),
                ContentSpec::Blank | ContentSpec::Lambda(_) => 0,
            },
            config.options.dissolve
        );
        Ok(config)
    }
}
