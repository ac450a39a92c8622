#![no_std]
#![no_main]
#![cfg(not(feature = "host"))]

use core::{convert::Infallible, panic};

use embassy_executor::Spawner;
use embassy_rp::gpio::{Level, Output};
use embassy_time::{Duration, Instant, Timer};
use embedded_graphics::{
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::{PrimitiveStyle, Rectangle},
};
use max3000_kit::{
    Result,
    config::{Max3000Options, UpdateInterval},
    max3000,
    max3000::{driver::Max3000Pins, frame::DotColor, transition::Transition},
};
use {defmt_rtt as _, panic_probe as _};

// One panel, 28 x 16 dots, redrawn twice a second.
max3000! {
    Sign {
        panels_wide: 1,
    }
}

// A bar that grows one dot per second and a row of minute ticks underneath.
fn seconds(it: &mut SignCanvas<'_>) {
    let elapsed = Instant::now().as_secs();
    let width = it.width() as i32;
    let filled = (elapsed % width as u64) as i32;
    for x_index in 0..=filled {
        for y_index in 4..12 {
            it.draw_pixel(x_index, y_index, DotColor::Light);
        }
    }
    let minutes = (elapsed / 60) as i32;
    for x_index in (0..width).filter(|x_index| x_index % 2 == 0).take(minutes as usize % 14) {
        it.draw_pixel(x_index, 14, DotColor::Light);
    }
}

// A frame around the panel, inverted every other second.
fn border(it: &mut SignCanvas<'_>) {
    let size = it.size();
    Rectangle::new(Point::zero(), size)
        .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 2))
        .draw(it)
        .unwrap_or_else(|never| match never {});
    if Instant::now().as_secs() % 2 == 1 {
        it.fill(DotColor::Inverse);
    }
}

#[embassy_executor::main]
async fn main(spawner: Spawner) -> ! {
    let err = inner_main(spawner).await.unwrap_err();
    panic!("{err}");
}

async fn inner_main(spawner: Spawner) -> Result<Infallible> {
    let p = embassy_rp::init(Default::default());

    let pins = Max3000Pins::new(
        Output::new(p.PIN_2, Level::Low),  // clk
        Output::new(p.PIN_3, Level::Low),  // mosi
        Output::new(p.PIN_4, Level::High), // col
        Output::new(p.PIN_5, Level::High), // row
        Output::new(p.PIN_6, Level::Low),  // pulse
        Output::new(p.PIN_7, Level::Low),  // latch
        Output::new(p.PIN_8, Level::Low),  // reset
    );
    let options = Max3000Options {
        update_interval: UpdateInterval::Every(Duration::from_millis(500)),
        ..Max3000Options::DEFAULT
    };
    let content = SignContent::pages([
        SignPage::new("seconds", seconds),
        SignPage::new("border", border),
    ])?;
    let sign = Sign::new(pins, &options, content, spawner)?;

    let mut led_on = false;
    loop {
        Timer::after_secs(10).await;
        sign.transition_on_next_update(Transition::DiagonalWipe).await;
        sign.next_page().await;
        sign.update_now().await;

        led_on = !led_on;
        sign.set_user_led(0, led_on).await?;
    }
}
