//! Turns a validated [`Max3000Config`] into firmware source.
//!
//! The output is meant for a firmware crate's `build.rs`: write it to `OUT_DIR` and `include!`
//! it. It declares the display type with [`max3000!`](crate::max3000) and a constructor that
//! takes the configured pins as `embassy_rp` peripherals, so a wrong pin fails to compile.
//!
//! ```
//! use max3000_kit::{codegen, config::schema::Max3000Config};
//!
//! let config = Max3000Config::from_yaml(
//!     "id: hallway_sign\n\
//!      clk_pin: GPIO2\nmosi_pin: GPIO3\ncol_pin: GPIO4\nrow_pin: GPIO5\n\
//!      pulse_pin: GPIO6\nlatch_pin: GPIO7\nreset_pin: GPIO8\n\
//!      lambda: it.fill(DotColor::Light);\n",
//! )?;
//! let code = codegen::to_code(&config)?;
//! assert!(code.contains("pub fn new_hallway_sign("));
//! assert!(code.contains("it.fill(DotColor::Light);"));
//! # Ok::<(), max3000_kit::Error>(())
//! ```
//!
//! A `build.rs` then looks like:
//!
//! ```rust,ignore
//! fn main() {
//!     let text = std::fs::read_to_string("max3000.yaml").expect("config must be readable");
//!     let config = max3000_kit::config::schema::Max3000Config::from_yaml(&text)
//!         .unwrap_or_else(|err| panic!("max3000.yaml: {err}"));
//!     let out_dir = std::env::var("OUT_DIR").expect("cargo sets OUT_DIR");
//!     let code = max3000_kit::codegen::to_code(&config)
//!         .unwrap_or_else(|err| panic!("max3000.yaml: {err}"));
//!     std::fs::write(format!("{out_dir}/max3000.rs"), code)
//!         .expect("generated source must be writable");
//!     println!("cargo:rerun-if-changed=max3000.yaml");
//! }
//! ```

use crate::{
    Result,
    config::{
        ConfigError, PinRole, UpdateInterval,
        schema::{ContentSpec, Max3000Config},
    },
};

/// Path generated code uses to reach this crate.
pub const CRATE_PATH: &str = "max3000_kit";

/// The display type name for `id`: `hallway_sign` becomes `HallwaySign`.
#[must_use]
pub fn type_name(id: &str) -> String {
    id.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_ascii_uppercase().to_string() + chars.as_str()
            })
        })
        .collect()
}

/// The constructor name for `id`: `hallway_sign` becomes `new_hallway_sign`.
#[must_use]
pub fn fn_name(id: &str) -> String {
    format!("new_{}", id.to_ascii_lowercase())
}

struct CodeWriter {
    out: String,
    indent: usize,
}

impl CodeWriter {
    fn line(&mut self, text: &str) {
        if !text.is_empty() {
            for _ in 0..self.indent {
                self.out.push_str("    ");
            }
            self.out.push_str(text);
        }
        self.out.push('\n');
    }

    fn open(&mut self, text: &str) {
        self.line(text);
        self.indent += 1;
    }

    fn close(&mut self, text: &str) {
        self.indent = self.indent.saturating_sub(1);
        self.line(text);
    }

    /// Paste an opaque writer body at the current level.
    ///
    /// Lines that start inside a string literal, and lines a string literal runs off the end
    /// of, are copied exactly so the literal's contents do not change.
    fn body(&mut self, body: &str) {
        let body = body.strip_suffix('\n').unwrap_or(body);
        let in_string = string_continuations(body);
        for (index, body_line) in body.split('\n').enumerate() {
            let starts_in_string = in_string.get(index).copied().unwrap_or(false);
            let ends_in_string = in_string.get(index + 1).copied().unwrap_or(false);
            if starts_in_string {
                self.out.push_str(body_line);
                self.out.push('\n');
            } else if ends_in_string {
                self.line(body_line);
            } else {
                self.line(body_line.trim_end());
            }
        }
    }
}

#[derive(Clone, Copy)]
enum Scan {
    Code,
    Str,
    RawStr(usize),
    LineComment,
    BlockComment(usize),
}

/// For each line of `source`, whether it begins inside a string literal.
fn string_continuations(source: &str) -> Vec<bool> {
    let mut starts = vec![false];
    let mut state = Scan::Code;
    let mut chars = source.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\n' {
            starts.push(matches!(state, Scan::Str | Scan::RawStr(_)));
            if matches!(state, Scan::LineComment) {
                state = Scan::Code;
            }
            continue;
        }
        state = match state {
            Scan::Code => match ch {
                '"' => Scan::Str,
                'r' if matches!(chars.peek(), Some('"' | '#')) => {
                    let mut hashes = 0;
                    while chars.next_if_eq(&'#').is_some() {
                        hashes += 1;
                    }
                    // `r#name` is a raw identifier, not a string.
                    if chars.next_if_eq(&'"').is_some() {
                        Scan::RawStr(hashes)
                    } else {
                        Scan::Code
                    }
                }
                '/' if chars.next_if_eq(&'/').is_some() => Scan::LineComment,
                '/' if chars.next_if_eq(&'*').is_some() => Scan::BlockComment(1),
                '\'' => {
                    // A char literal such as '"' or '\'', or else a lifetime.
                    if chars.next_if_eq(&'\\').is_some() {
                        chars.next();
                        while chars.next_if(|next| *next != '\'' && *next != '\n').is_some() {}
                        chars.next_if_eq(&'\'');
                    } else if chars.peek().is_some_and(|next| *next != '\n') {
                        let mut lookahead = chars.clone();
                        lookahead.next();
                        if lookahead.peek() == Some(&'\'') {
                            chars.next();
                            chars.next();
                        }
                    }
                    Scan::Code
                }
                _ => Scan::Code,
            },
            Scan::Str => match ch {
                '\\' => {
                    if chars.next_if_eq(&'\n').is_some() {
                        starts.push(true);
                    } else {
                        chars.next();
                    }
                    Scan::Str
                }
                '"' => Scan::Code,
                _ => Scan::Str,
            },
            Scan::RawStr(hashes) => {
                if ch == '"' {
                    let mut closing = 0;
                    while closing < hashes && chars.next_if_eq(&'#').is_some() {
                        closing += 1;
                    }
                    if closing == hashes {
                        Scan::Code
                    } else {
                        Scan::RawStr(hashes)
                    }
                } else {
                    Scan::RawStr(hashes)
                }
            }
            Scan::LineComment => Scan::LineComment,
            Scan::BlockComment(depth) => {
                if ch == '/' && chars.next_if_eq(&'*').is_some() {
                    Scan::BlockComment(depth + 1)
                } else if ch == '*' && chars.next_if_eq(&'/').is_some() {
                    if depth == 1 {
                        Scan::Code
                    } else {
                        Scan::BlockComment(depth - 1)
                    }
                } else {
                    Scan::BlockComment(depth)
                }
            }
        };
    }
    starts
}

/// The first two roles that share a GPIO, as `(number, first, second)`.
fn shared_pin(config: &Max3000Config) -> Option<(u8, PinRole, PinRole)> {
    PinRole::ALL.iter().enumerate().find_map(|(index, first)| {
        let first_spec = config.pins.get(*first)?;
        PinRole::ALL[index + 1..].iter().find_map(|second| {
            config
                .pins
                .get(*second)
                .filter(|second_spec| second_spec.number == first_spec.number)
                .map(|_| (first_spec.number, *first, *second))
        })
    })
}

/// Emit the Rust source that builds the display described by `config`.
///
/// The output holds one `max3000!` invocation and one constructor function:
/// - one `Output::new` per pin, in [`PinRole::ALL`] order, with `.with_inverted` for inverted pins;
/// - a `Max3000Options` literal carrying every option;
/// - the content, with writer bodies pasted into closures over `it`. Bodies are indented to
///   fit, but string literals inside them are copied unchanged.
///
/// # Errors
///
/// Returns [`ConfigError::SharedPinInFirmware`] when two roles share a GPIO. The schema allows
/// that with `allow_other_uses`, but each role needs its own `embassy_rp` peripheral.
pub fn to_code(config: &Max3000Config) -> Result<String> {
    if let Some((number, first, second)) = shared_pin(config) {
        return Err(ConfigError::SharedPinInFirmware {
            number,
            first,
            second,
        }
        .into());
    }

    let type_name = type_name(&config.id);
    let fn_name = fn_name(&config.id);
    let options = &config.options;
    let mut writer = CodeWriter {
        out: String::new(),
        indent: 0,
    };

    writer.line(&format!(
        "// Generated from the `{}` MAX3000 configuration. Do not edit.",
        config.id
    ));
    writer.line("");
    writer.open(&format!("{CRATE_PATH}::max3000! {{"));
    writer.open(&format!("pub {type_name} {{"));
    writer.line(&format!("panels_wide: {},", options.panels_wide));
    writer.line(&format!("panels_high: {},", options.panels_high));
    writer.close("}");
    writer.close("}");
    writer.line("");

    writer.line(&format!(
        "/// Build the `{}` display and spawn its background task.",
        config.id
    ));
    writer.line("#[allow(clippy::too_many_arguments)]");
    writer.open(&format!("pub fn {fn_name}("));
    for role in PinRole::ALL {
        // Validated configurations always have every pin.
        if let Some(spec) = config.pins.get(role) {
            writer.line(&format!(
                "{}: ::embassy_rp::Peri<'static, ::embassy_rp::peripherals::PIN_{}>,",
                role.key(),
                spec.number
            ));
        }
    }
    writer.line("spawner: ::embassy_executor::Spawner,");
    writer.close(&format!(") -> {CRATE_PATH}::Result<{type_name}> {{"));
    writer.indent += 1;

    writer.line("use ::embassy_rp::gpio::{Level, Output};");
    writer.line("#[allow(unused_imports)]");
    writer.line(&format!("use {CRATE_PATH}::max3000::frame::DotColor;"));
    writer.line("");

    writer.open(&format!(
        "let pins = {CRATE_PATH}::max3000::driver::Max3000Pins::new("
    ));
    for role in PinRole::ALL {
        writer.line(&format!("Output::new({}, Level::Low),", role.key()));
    }
    writer.close(")");
    writer.indent += 1;
    for role in PinRole::ALL {
        if config.pins.get(role).is_some_and(|spec| spec.inverted) {
            writer.line(&format!(
                ".with_inverted({CRATE_PATH}::config::PinRole::{})",
                role.variant_name()
            ));
        }
    }
    writer.indent -= 1;
    writer.line(";");
    writer.line("");

    writer.open(&format!("let options = {CRATE_PATH}::config::Max3000Options {{"));
    writer.line(&format!("dissolve: {},", options.dissolve));
    writer.line(&format!(
        "update_interval: {},",
        update_interval_expr(options.update_interval)
    ));
    writer.line(&format!(
        "rotation: {CRATE_PATH}::config::Rotation::Deg{},",
        options.rotation.degrees()
    ));
    writer.line(&format!("auto_clear: {},", options.auto_clear));
    writer.line(&format!("panels_wide: {},", options.panels_wide));
    writer.line(&format!("panels_high: {},", options.panels_high));
    writer.line(&format!(
        "board_order: {CRATE_PATH}::config::BoardOrder::{},",
        options.board_order.variant_name()
    ));
    writer.line(&format!(
        "pulse_duration_us: {},",
        options.pulse_duration_us
    ));
    writer.line(&format!(
        "constant_frame_rate: {},",
        options.constant_frame_rate
    ));
    writer.line(&format!("invert: {},", options.invert));
    writer.line(&format!("dissolve_seed: {:#X},", options.dissolve_seed));
    writer.line(&format!("bitbang_delay_us: {},", options.bitbang_delay_us));
    writer.close("};");
    writer.line("");

    match &config.content {
        ContentSpec::Blank => {
            writer.line(&format!("let content = {type_name}Content::Blank;"));
        }
        ContentSpec::Lambda(body) => {
            writer.open(&format!(
                "let content = {type_name}Content::Lambda(|it| {{"
            ));
            writer.body(body);
            writer.close("});");
        }
        ContentSpec::Pages(pages) => {
            writer.open(&format!("let content = {type_name}Content::pages(["));
            for page in pages {
                writer.open(&format!(
                    "{type_name}Page::new({:?}, |it| {{",
                    page.id
                ));
                writer.body(&page.lambda);
                writer.close("}),");
            }
            writer.close("])?;");
        }
    }
    writer.line("");
    writer.line(&format!("{type_name}::new(pins, &options, content, spawner)"));
    writer.close("}");

    debug!(
        "codegen: emitted {} line(s) for `{}`",
        writer.out.lines().count(),
        config.id.as_str()
    );
    Ok(writer.out)
}

fn update_interval_expr(update_interval: UpdateInterval) -> String {
    match update_interval {
        UpdateInterval::Every(period) => format!(
            "{CRATE_PATH}::config::UpdateInterval::Every(::embassy_time::Duration::from_micros({}))",
            period.as_micros()
        ),
        UpdateInterval::Never => format!("{CRATE_PATH}::config::UpdateInterval::Never"),
    }
}
