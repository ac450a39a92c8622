//! Compile-only verification that max3000! macro visibility modifiers work correctly.
//!
//! Each module declares a display at a different visibility level and panel grid.
//!
//! Run via: `cargo check-all` (xtask compiles this for thumbv6m-none-eabi)

#![cfg(not(feature = "host"))]
#![no_std]
#![no_main]
#![allow(dead_code, reason = "Compile-time verification only")]

use defmt_rtt as _;
use embassy_executor::Spawner;
use max3000_kit::max3000;
use panic_probe as _;

// Private visibility, default grid (one panel).
max3000! {
    TestSign
}

fn test_default_grid() {
    assert!(TestSign::WIDTH == 28 && TestSign::HEIGHT == 16);
    let _device_size = core::mem::size_of::<TestSign>();
    let _frame = TestSignFrame::new();
}

mod public_test {
    use super::*;

    max3000! {
        pub PublicSign {
            panels_wide: 2,
            panels_high: 2,
        }
    }

    fn test_pub_visibility() {
        assert!(PublicSign::WIDTH == 56 && PublicSign::HEIGHT == 32);
        let _content = PublicSignContent::Blank;
    }
}

mod crate_test {
    use super::*;

    max3000! {
        pub(crate) CrateSign {
            panels_high: 3,
        }
    }

    fn draw(it: &mut CrateSignCanvas<'_>) {
        it.clear();
    }

    fn test_crate_visibility() {
        assert!(CrateSign::PANELS_HIGH == 3);
        let _page = CrateSignPage::new("clear", draw);
    }
}

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    // The verification happens at compile time.
    test_default_grid();
}
