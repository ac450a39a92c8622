#![cfg(feature = "host")]
#![allow(missing_docs)]
//! Host-level tests for generated firmware source.

use max3000_kit::codegen::{fn_name, to_code, type_name};
use max3000_kit::config::schema::Max3000Config;
use max3000_kit::Error;
use max3000_kit::config::{ConfigError, OutputPinSpec, PinRole, Rotation, UpdateInterval};

fn builder() -> max3000_kit::config::schema::Max3000ConfigBuilder {
    let mut builder = Max3000Config::builder().id("hallway_sign");
    for (number, role) in (10..).zip(PinRole::ALL) {
        builder = builder.pin(role, OutputPinSpec::new(number));
    }
    builder
}

#[test]
fn names_follow_the_id() {
    assert_eq!(type_name("hallway_sign"), "HallwaySign");
    assert_eq!(type_name("max3000"), "Max3000");
    assert_eq!(type_name("_wall__two"), "WallTwo");
    assert_eq!(fn_name("hallway_sign"), "new_hallway_sign");
    assert_eq!(fn_name("Wall"), "new_wall");
}

#[test]
fn declares_type_and_constructor() {
    let config = builder().panels(2, 1).build().expect("valid config");
    let code = to_code(&config).expect("pins are distinct");

    assert!(code.contains("max3000_kit::max3000! {"), "{code}");
    assert!(code.contains("    pub HallwaySign {"), "{code}");
    assert!(code.contains("panels_wide: 2,"), "{code}");
    assert!(code.contains("panels_high: 1,"), "{code}");
    assert!(code.contains("pub fn new_hallway_sign("), "{code}");
    assert!(
        code.contains("spawner: ::embassy_executor::Spawner,"),
        "{code}"
    );
    assert!(
        code.contains(") -> max3000_kit::Result<HallwaySign> {"),
        "{code}"
    );
    assert!(
        code.contains("HallwaySign::new(pins, &options, content, spawner)"),
        "{code}"
    );
}

#[test]
fn pins_are_typed_peripherals_in_role_order() {
    let config = builder().build().expect("valid config");
    let code = to_code(&config).expect("pins are distinct");

    let mut last_position = 0;
    for (number, role) in (10..).zip(PinRole::ALL) {
        let parameter = format!(
            "{}: ::embassy_rp::Peri<'static, ::embassy_rp::peripherals::PIN_{number}>,",
            role.key()
        );
        let position = code
            .find(&parameter)
            .unwrap_or_else(|| panic!("missing `{parameter}` in\n{code}"));
        assert!(position > last_position, "{} out of order", role.key());
        last_position = position;

        let output = format!("Output::new({}, Level::Low),", role.key());
        assert!(code.contains(&output), "missing `{output}`");
    }
}

#[test]
fn inverted_pins_are_marked() {
    let config = builder()
        .pin(PinRole::Reset, OutputPinSpec::new(16).inverted())
        .build()
        .expect("valid config");
    let code = to_code(&config).expect("pins are distinct");

    assert!(
        code.contains(".with_inverted(max3000_kit::config::PinRole::Reset)"),
        "{code}"
    );
    assert_eq!(code.matches(".with_inverted(").count(), 1);
}

#[test]
fn options_literal_carries_every_setting() {
    let config = builder()
        .dissolve(false)
        .update_interval(UpdateInterval::Never)
        .rotation(Rotation::Deg270)
        .auto_clear(false)
        .pulse_duration_us(220)
        .constant_frame_rate(true)
        .invert(true)
        .build()
        .expect("valid config");
    let code = to_code(&config).expect("pins are distinct");

    for expected in [
        "dissolve: false,",
        "update_interval: max3000_kit::config::UpdateInterval::Never,",
        "rotation: max3000_kit::config::Rotation::Deg270,",
        "auto_clear: false,",
        "board_order: max3000_kit::config::BoardOrder::RowMajor,",
        "pulse_duration_us: 220,",
        "constant_frame_rate: true,",
        "invert: true,",
        "dissolve_seed: 0x4D415833,",
        "bitbang_delay_us: 1,",
    ] {
        assert!(code.contains(expected), "missing `{expected}` in\n{code}");
    }
}

#[test]
fn update_period_is_emitted_in_microseconds() {
    let config = Max3000Config::from_yaml(
        "\
clk_pin: 2
mosi_pin: 3
col_pin: 4
row_pin: 5
pulse_pin: 6
latch_pin: 7
reset_pin: 8
update_interval: 2.5s
",
    )
    .expect("valid config");
    let code = to_code(&config).expect("pins are distinct");
    assert!(
        code.contains("UpdateInterval::Every(::embassy_time::Duration::from_micros(2500000))"),
        "{code}"
    );
}

#[test]
fn blank_content() {
    let config = builder().build().expect("valid config");
    let code = to_code(&config).expect("pins are distinct");
    assert!(code.contains("let content = HallwaySignContent::Blank;"), "{code}");
}

#[test]
fn lambda_body_is_pasted_verbatim() {
    let config = builder()
        .lambda("it.fill(DotColor::Light);\nit.draw_pixel(0, 0, DotColor::Dark);")
        .build()
        .expect("valid config");
    let code = to_code(&config).expect("pins are distinct");

    let expected = "\
    let content = HallwaySignContent::Lambda(|it| {
        it.fill(DotColor::Light);
        it.draw_pixel(0, 0, DotColor::Dark);
    });
";
    assert!(code.contains(expected), "{code}");
}

#[test]
fn pages_become_named_page_writers() {
    let config = builder()
        .page(Some("clock"), "it.fill(DotColor::Light);")
        .page(None, "it.clear();")
        .build()
        .expect("valid config");
    let code = to_code(&config).expect("pins are distinct");

    let expected = "\
    let content = HallwaySignContent::pages([
        HallwaySignPage::new(\"clock\", |it| {
            it.fill(DotColor::Light);
        }),
        HallwaySignPage::new(\"page2\", |it| {
            it.clear();
        }),
    ])?;
";
    assert!(code.contains(expected), "{code}");
}

#[test]
fn output_is_deterministic() {
    let config = builder()
        .page(None, "it.clear();")
        .build()
        .expect("valid config");
    let first = to_code(&config).expect("pins are distinct");
    let second = to_code(&config).expect("pins are distinct");
    assert_eq!(first, second);
}

#[test]
fn shared_gpio_cannot_become_firmware() {
    let shared = OutputPinSpec::new(2).allow_other_uses();
    let config = builder()
        .pin(PinRole::Clk, shared)
        .pin(PinRole::Mosi, shared)
        .build()
        .expect("the schema allows sharing when both pins opt in");

    let result = to_code(&config);
    assert!(
        matches!(
            result,
            Err(Error::Config(ConfigError::SharedPinInFirmware {
                number: 2,
                first: PinRole::Clk,
                second: PinRole::Mosi,
            }))
        ),
        "{result:?}"
    );
}

#[test]
fn string_literals_in_a_body_keep_their_contents() {
    let body = "let banner = \"first\n  second   \nthird\";\nit.fill(DotColor::Light);";
    let config = builder().lambda(body).build().expect("valid config");
    let code = to_code(&config).expect("pins are distinct");

    let expected = "\
    let content = HallwaySignContent::Lambda(|it| {
        let banner = \"first
  second   
third\";
        it.fill(DotColor::Light);
    });
";
    assert!(code.contains(expected), "{code}");
}

#[test]
fn quotes_in_comments_and_chars_do_not_start_strings() {
    let body = "let quote = '\"';\n// \"unclosed\nit.clear();\nlet raw = r#\"a\n  b\"#;";
    let config = builder().lambda(body).build().expect("valid config");
    let code = to_code(&config).expect("pins are distinct");

    let expected = "\
        let quote = '\"';
        // \"unclosed
        it.clear();
        let raw = r#\"a
  b\"#;
";
    assert!(code.contains(expected), "{code}");
}
