#![cfg(feature = "host")]
#![allow(missing_docs)]
//! Host-level tests for loading and validating MAX3000 configurations.

use embassy_time::Duration;
use max3000_kit::Error;
use max3000_kit::config::schema::{ContentSpec, DEFAULT_ID, Max3000Config, PageSpec};
use max3000_kit::config::{
    BoardOrder, ConfigError, Max3000Options, OutputPinSpec, PinRole, Rotation, UpdateInterval,
    parse_time_period,
};

const PINS: &str = "\
clk_pin: GPIO2
mosi_pin: GPIO3
col_pin: GPIO4
row_pin: GPIO5
pulse_pin: GPIO6
latch_pin: GPIO7
reset_pin: GPIO8
";

fn load(extra: &str) -> Result<Max3000Config, Error> {
    Max3000Config::from_yaml(&format!("{PINS}{extra}"))
}

fn config_error(result: Result<Max3000Config, Error>) -> ConfigError {
    match result {
        Err(Error::Config(error)) => error,
        Err(other) => panic!("expected a configuration error, got {other}"),
        Ok(config) => panic!("expected a configuration error, got {config:?}"),
    }
}

fn pins_without(role: PinRole) -> String {
    PINS.lines()
        .filter(|line| !line.starts_with(role.key()))
        .map(|line| format!("{line}\n"))
        .collect()
}

#[test]
fn minimal_config_takes_schema_defaults() {
    let config = load("").expect("pins alone are a valid configuration");
    assert_eq!(config.id, DEFAULT_ID);
    assert_eq!(config.options, Max3000Options::DEFAULT);
    assert!(config.options.dissolve);
    assert!(config.options.auto_clear);
    assert_eq!(
        config.options.update_interval,
        UpdateInterval::Every(Duration::from_secs(1))
    );
    assert_eq!(config.options.rotation, Rotation::Deg0);
    assert_eq!(config.content, ContentSpec::Blank);
    assert!(!config.has_writer());

    for (number, role) in (2..).zip(PinRole::ALL) {
        assert_eq!(config.pins.get(role), Some(OutputPinSpec::new(number)));
    }
}

#[test]
fn every_option_is_read() {
    let config = load(
        "\
id: hallway_sign
dissolve: false
update_interval: 250ms
rotation: 90
auto_clear_enabled: false
panels_wide: 2
panels_high: 3
board_order: column_major_bounce
pulse_duration: 200us
constant_frame_rate: true
invert: true
",
    )
    .expect("every option has a valid value");

    assert_eq!(config.id, "hallway_sign");
    let options = config.options;
    assert!(!options.dissolve);
    assert_eq!(
        options.update_interval,
        UpdateInterval::Every(Duration::from_millis(250))
    );
    assert_eq!(options.rotation, Rotation::Deg90);
    assert!(!options.auto_clear);
    assert_eq!((options.panels_wide, options.panels_high), (2, 3));
    assert_eq!(options.board_order, BoardOrder::ColumnMajorBounce);
    assert_eq!(options.pulse_duration_us, 200);
    assert!(options.constant_frame_rate);
    assert!(options.invert);
}

#[test]
fn missing_pin_is_reported_by_key() {
    for role in PinRole::ALL {
        let result = Max3000Config::from_yaml(&pins_without(role));
        assert_eq!(config_error(result), ConfigError::MissingPin(role));
    }
}

#[test]
fn first_missing_pin_wins() {
    let text: String = pins_without(PinRole::Row)
        .lines()
        .filter(|line| !line.starts_with("mosi_pin"))
        .map(|line| format!("{line}\n"))
        .collect();
    let result = Max3000Config::from_yaml(&text);
    assert_eq!(config_error(result), ConfigError::MissingPin(PinRole::Mosi));
}

#[test]
fn missing_pin_message_names_the_key() {
    let error = Max3000Config::from_yaml(&pins_without(PinRole::Latch))
        .expect_err("latch pin is required");
    assert!(error.to_string().contains("latch_pin"), "{error}");
}

#[test]
fn pages_and_lambda_are_exclusive() {
    let result = load(
        "\
lambda: it.clear();
pages:
  - lambda: it.clear();
",
    );
    assert_eq!(config_error(result), ConfigError::PagesAndLambda);
}

#[test]
fn pin_forms_are_accepted() {
    let text = "\
clk_pin: 2
mosi_pin: gpio3
col_pin: PIN_4
row_pin:
  number: GPIO5
  mode: output
pulse_pin:
  number: 6
latch_pin: GPIO7
reset_pin:
  number: GPIO8
  inverted: true
";
    let config = Max3000Config::from_yaml(text).expect("all pin forms are valid");
    assert_eq!(config.pins.get(PinRole::Clk), Some(OutputPinSpec::new(2)));
    assert_eq!(config.pins.get(PinRole::Col), Some(OutputPinSpec::new(4)));
    assert_eq!(
        config.pins.get(PinRole::Reset),
        Some(OutputPinSpec::new(8).inverted())
    );
}

#[test]
fn invalid_pins_are_rejected() {
    let text = PINS.replace("GPIO6", "GPIO99");
    let result = Max3000Config::from_yaml(&text);
    assert_eq!(config_error(result), ConfigError::InvalidPin(PinRole::Pulse));

    let text = PINS.replace("GPIO7", "LED");
    let result = Max3000Config::from_yaml(&text);
    assert_eq!(config_error(result), ConfigError::InvalidPin(PinRole::Latch));

    let text = PINS.replace("reset_pin: GPIO8", "reset_pin:\n  number: GPIO8\n  mode: input");
    let result = Max3000Config::from_yaml(&text);
    assert_eq!(config_error(result), ConfigError::InvalidPin(PinRole::Reset));
}

#[test]
fn shared_gpio_needs_permission_on_both_pins() {
    let text = PINS.replace("GPIO8", "GPIO3");
    let result = Max3000Config::from_yaml(&text);
    assert_eq!(
        config_error(result),
        ConfigError::DuplicatePin {
            number: 3,
            first: PinRole::Mosi,
            second: PinRole::Reset,
        }
    );

    let text = PINS
        .replace(
            "mosi_pin: GPIO3",
            "mosi_pin:\n  number: GPIO3\n  allow_other_uses: true",
        )
        .replace(
            "reset_pin: GPIO8",
            "reset_pin:\n  number: GPIO3\n  allow_other_uses: true",
        );
    Max3000Config::from_yaml(&text).expect("both pins allow sharing");
}

#[test]
fn update_interval_forms() {
    let config = load("update_interval: never\n").expect("never is valid");
    assert_eq!(config.options.update_interval, UpdateInterval::Never);
    assert_eq!(config.options.update_interval.period(), None);

    let config = load("update_interval: 1.5s\n").expect("fractions are valid");
    assert_eq!(
        config.options.update_interval,
        UpdateInterval::Every(Duration::from_millis(1500))
    );

    for bad in ["5", "0s", "fast", "10 parsecs"] {
        let result = load(&format!("update_interval: {bad}\n"));
        assert_eq!(config_error(result), ConfigError::InvalidTimePeriod, "{bad}");
    }
}

#[test]
fn rotation_forms() {
    for (text, rotation) in [
        ("0", Rotation::Deg0),
        ("90", Rotation::Deg90),
        ("180°", Rotation::Deg180),
        ("\"270\"", Rotation::Deg270),
    ] {
        let config = load(&format!("rotation: {text}\n")).expect("rotation is valid");
        assert_eq!(config.options.rotation, rotation, "{text}");
    }

    for bad in ["45", "-90", "360", "1.5", "sideways"] {
        let result = load(&format!("rotation: {bad}\n"));
        assert_eq!(config_error(result), ConfigError::InvalidRotation, "{bad}");
    }
}

#[test]
fn pulse_duration_must_fit_in_microseconds() {
    let config = load("pulse_duration: 1ms\n").expect("one millisecond is valid");
    assert_eq!(config.options.pulse_duration_us, 1000);

    for bad in ["0us", "100ms", "150"] {
        let result = load(&format!("pulse_duration: {bad}\n"));
        assert_eq!(
            config_error(result),
            ConfigError::InvalidPulseDuration,
            "{bad}"
        );
    }
}

#[test]
fn panel_grid_is_bounded() {
    let result = load("panels_wide: 0\n");
    assert_eq!(config_error(result), ConfigError::InvalidPanelCount);

    let result = load("panels_wide: 5\npanels_high: 4\n");
    assert_eq!(config_error(result), ConfigError::InvalidPanelCount);

    load("panels_wide: 4\npanels_high: 4\n").expect("sixteen panels are valid");
}

#[test]
fn pages_get_positional_default_ids() {
    let config = load(
        "\
pages:
  - lambda: it.clear();
  - id: clock
    lambda: |-
      it.fill(DotColor::Light);
      it.draw_pixel(0, 0, DotColor::Dark);
  - lambda: it.fill(DotColor::Inverse);
",
    )
    .expect("pages are valid");

    let ContentSpec::Pages(pages) = &config.content else {
        panic!("expected pages, got {:?}", config.content);
    };
    let ids: Vec<&str> = pages.iter().map(|page| page.id.as_str()).collect();
    assert_eq!(ids, ["page1", "clock", "page3"]);
    assert_eq!(
        pages[1],
        PageSpec {
            id: "clock".to_owned(),
            lambda: "it.fill(DotColor::Light);\nit.draw_pixel(0, 0, DotColor::Dark);".to_owned(),
        }
    );
}

#[test]
fn page_list_rules() {
    let result = load("pages: []\n");
    assert_eq!(config_error(result), ConfigError::EmptyPages);

    let result = load(
        "\
pages:
  - id: same
    lambda: it.clear();
  - id: same
    lambda: it.clear();
",
    );
    assert_eq!(config_error(result), ConfigError::DuplicatePageId);

    let nine_pages: String = (0..9).map(|_| "  - lambda: it.clear();\n").collect();
    let result = load(&format!("pages:\n{nine_pages}"));
    assert_eq!(config_error(result), ConfigError::TooManyPages);
}

#[test]
fn id_and_platform_are_checked() {
    let result = load("id: 9lives\n");
    assert_eq!(config_error(result), ConfigError::InvalidId);

    let result = load("platform: ssd1306\n");
    assert_eq!(config_error(result), ConfigError::UnsupportedPlatform);

    load("platform: max3000\n").expect("the matching platform is accepted");
}

#[test]
fn ids_must_yield_usable_rust_names() {
    for id in ["_", "_1", "__", "self", "crate", "fn", "self_", "Self"] {
        let result = load(&format!("id: {id}\n"));
        assert_eq!(config_error(result), ConfigError::InvalidId, "id `{id}`");
    }
    for id in ["_sign", "sign_2", "crate_sign", "Wall"] {
        load(&format!("id: {id}\n")).unwrap_or_else(|err| panic!("id `{id}`: {err}"));
    }
}

#[test]
fn booleans_accept_word_forms() {
    for (text, expected) in [
        ("yes", true),
        ("No", false),
        ("on", true),
        ("OFF", false),
        ("enable", true),
        ("disable", false),
        ("'true'", true),
        ("\"False\"", false),
    ] {
        let config = load(&format!(
            "dissolve: {text}\nauto_clear_enabled: {text}\nconstant_frame_rate: {text}\ninvert: {text}\n"
        ))
        .unwrap_or_else(|err| panic!("`{text}`: {err}"));
        let options = config.options;
        assert_eq!(options.dissolve, expected, "`{text}`");
        assert_eq!(options.auto_clear, expected, "`{text}`");
        assert_eq!(options.constant_frame_rate, expected, "`{text}`");
        assert_eq!(options.invert, expected, "`{text}`");
    }

    let result = load("dissolve: maybe\n");
    assert_eq!(config_error(result), ConfigError::InvalidBoolean);
    let result = load("invert: 1\n");
    assert!(matches!(result, Err(Error::Yaml(_))), "{result:?}");
}

#[test]
fn unknown_keys_are_yaml_errors() {
    let result = load("brightness: 7\n");
    assert!(matches!(result, Err(Error::Yaml(_))), "{result:?}");
}

#[test]
fn builder_matches_yaml() {
    let from_yaml = load(
        "\
id: wall
rotation: 180
lambda: it.fill(DotColor::Light);
",
    )
    .expect("valid yaml");

    let mut builder = Max3000Config::builder().id("wall");
    for (number, role) in (2..).zip(PinRole::ALL) {
        builder = builder.pin(role, OutputPinSpec::new(number));
    }
    let from_builder = builder
        .rotation(Rotation::Deg180)
        .lambda("it.fill(DotColor::Light);")
        .build()
        .expect("valid builder");

    assert_eq!(from_yaml, from_builder);
}

#[test]
fn builder_reports_first_missing_pin() {
    let error = Max3000Config::builder()
        .pin(PinRole::Clk, OutputPinSpec::new(2))
        .build()
        .expect_err("six pins are missing");
    assert!(matches!(
        error,
        Error::Config(ConfigError::MissingPin(PinRole::Mosi))
    ));
}

#[test]
fn time_periods_parse_with_units() {
    assert_eq!(parse_time_period("250 us"), Ok(Duration::from_micros(250)));
    assert_eq!(parse_time_period("2h"), Ok(Duration::from_secs(7200)));
    assert_eq!(parse_time_period("1d"), Ok(Duration::from_secs(86_400)));
    assert_eq!(parse_time_period(".5s"), Ok(Duration::from_millis(500)));
    for bad in ["", "s", "1", "1.2.3s", "1 sec", "99999999999999d"] {
        assert_eq!(
            parse_time_period(bad),
            Err(ConfigError::InvalidTimePeriod),
            "{bad}"
        );
    }
}

#[test]
fn board_order_positions() {
    let positions = |order: BoardOrder| -> Vec<(usize, usize)> {
        (0..6).map(|board| order.position(board, 3, 2)).collect()
    };
    assert_eq!(
        positions(BoardOrder::RowMajor),
        [(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (2, 1)]
    );
    assert_eq!(
        positions(BoardOrder::RowMajorBounce),
        [(0, 0), (1, 0), (2, 0), (2, 1), (1, 1), (0, 1)]
    );
    assert_eq!(
        positions(BoardOrder::ColumnMajor),
        [(0, 0), (0, 1), (1, 0), (1, 1), (2, 0), (2, 1)]
    );
    assert_eq!(
        positions(BoardOrder::ColumnMajorBounce),
        [(0, 0), (0, 1), (1, 1), (1, 0), (2, 0), (2, 1)]
    );
}
