//! A device abstraction for Luminator MAX3000 flip-dot displays.
//!
//! Each MAX3000 panel is 28 columns by 16 rows of electromagnetic dots. Panels chain through
//! their shift registers, so one set of seven GPIO lines drives a whole grid of them.
//!
//! The layers, bottom-up:
//!
//! - [`protocol`]: shift-register words and pulse ordering.
//! - [`frame`]: [`DotFrame`](frame::DotFrame) buffers and the rotation-aware
//!   [`Canvas`](frame::Canvas).
//! - [`driver`]: [`Max3000Driver`](driver::Max3000Driver), which bit-bangs diffs to the panels.
//! - [`transition`]: wipe transitions between two frames.
//! - [`display`]: [`Max3000Display`](display::Max3000Display), the polling component with
//!   writers and pages.
//!
//! On the device, the [`max3000!`](crate::max3000!) macro generates a type that owns a
//! background task running the display, plus a cheap handle for sending it commands.
//!
//! # Example
//!
//! ```rust,ignore
//! # #![no_std]
//! # #![no_main]
//! # use panic_probe as _;
//! # use core::convert::Infallible;
//! # use core::future;
//! use embassy_executor::Spawner;
//! use embassy_rp::gpio::{Level, Output};
//! use max3000_kit::{
//!     Result,
//!     config::Max3000Options,
//!     max3000,
//!     max3000::{display::DisplayContent, driver::Max3000Pins, frame::DotColor, transition::Transition},
//! };
//!
//! // Two panels side by side: 56 × 16 dots.
//! max3000! {
//!     pub Wall {
//!         panels_wide: 2,
//!     }
//! }
//!
//! fn frame_border(it: &mut WallCanvas<'_>) {
//!     for x_index in 0..it.width() as i32 {
//!         it.draw_pixel(x_index, 0, DotColor::Light);
//!         it.draw_pixel(x_index, it.height() as i32 - 1, DotColor::Light);
//!     }
//! }
//!
//! # #[embassy_executor::main]
//! # pub async fn main(spawner: Spawner) -> ! {
//! #     let err = example(spawner).await.unwrap_err();
//! #     core::panic!("{err}");
//! # }
//! async fn example(spawner: Spawner) -> Result<Infallible> {
//!     let p = embassy_rp::init(Default::default());
//!     let pins = Max3000Pins::new(
//!         Output::new(p.PIN_2, Level::Low),  // clk
//!         Output::new(p.PIN_3, Level::Low),  // mosi
//!         Output::new(p.PIN_4, Level::High), // col
//!         Output::new(p.PIN_5, Level::High), // row
//!         Output::new(p.PIN_6, Level::Low),  // pulse
//!         Output::new(p.PIN_7, Level::Low),  // latch
//!         Output::new(p.PIN_8, Level::Low),  // reset
//!     );
//!     let options = Max3000Options {
//!         panels_wide: 2,
//!         ..Max3000Options::DEFAULT
//!     };
//!     let wall = Wall::new(pins, &options, DisplayContent::Lambda(frame_border), spawner)?;
//!
//!     wall.transition_on_next_update(Transition::DiagonalWipe).await;
//!     wall.update_now().await;
//!
//!     future::pending().await // run forever
//! }
//! ```

pub mod display;
pub mod driver;
pub mod frame;
pub mod protocol;
pub mod transition;

#[cfg(not(feature = "host"))]
use core::convert::Infallible;

use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, signal::Signal};
#[cfg(not(feature = "host"))]
use embassy_futures::select::{Either, select};
#[cfg(not(feature = "host"))]
use embassy_time::Ticker;

#[doc(hidden)] // Public for macro expansion in downstream crates.
pub use paste;

pub use protocol::{PANEL_HEIGHT, PANEL_WIDTH};

use crate::{Error, Result, max3000::transition::Transition};
#[cfg(not(feature = "host"))]
use crate::max3000::display::Max3000Display;

#[doc(hidden)]
// Public so macro expansions in downstream crates can share the command signal type.
pub type Max3000CommandSignal = Signal<CriticalSectionRawMutex, Command>;
#[doc(hidden)]
// Public so macro expansions in downstream crates can observe completion signals.
pub type Max3000CompletionSignal = Signal<CriticalSectionRawMutex, ()>;

/// Command for the MAX3000 device loop.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Redraw now instead of waiting for the next tick.
    UpdateNow,
    /// Play a transition before the next update's content appears.
    TransitionOnNextUpdate(Transition),
    /// Show a page from the next update on.
    ShowPage(usize),
    /// Advance one page, wrapping.
    NextPage,
    /// Go back one page, wrapping.
    PreviousPage,
    /// Swap lit and dark faces, refreshing immediately.
    Invert(bool),
    /// Turn one panel's user LED on or off.
    UserLed {
        /// Panel index in the chain.
        board: usize,
        /// LED state.
        on: bool,
    },
}

/// Static type for the [`Max3000`] device abstraction.
///
/// Most users should use the [`max3000!`](crate::max3000!) macro, which declares one of these
/// for each generated type.
pub struct Max3000Static {
    /// Commands for the device loop.
    pub command_signal: Max3000CommandSignal,
    /// Raised when the device loop has handled a command.
    pub completion_signal: Max3000CompletionSignal,
}

impl Max3000Static {
    /// Fresh signals, for use in a `static`.
    #[must_use]
    pub const fn new_static() -> Self {
        Self {
            command_signal: Signal::new(),
            completion_signal: Signal::new(),
        }
    }
}

/// Handle for sending commands to a running MAX3000 display task.
///
/// Every method waits until the device loop has handled the command.
#[derive(Clone, Copy)]
pub struct Max3000 {
    command_signal: &'static Max3000CommandSignal,
    completion_signal: &'static Max3000CompletionSignal,
    board_count: usize,
    page_count: usize,
}

impl Max3000 {
    /// Create a handle over `max3000_static` for a display with `board_count` panels and
    /// `page_count` pages.
    #[must_use]
    pub const fn new(
        max3000_static: &'static Max3000Static,
        board_count: usize,
        page_count: usize,
    ) -> Self {
        Self {
            command_signal: &max3000_static.command_signal,
            completion_signal: &max3000_static.completion_signal,
            board_count,
            page_count,
        }
    }

    async fn send(&self, command: Command) {
        self.command_signal.signal(command);
        self.completion_signal.wait().await;
    }

    /// Redraw now.
    pub async fn update_now(&self) {
        self.send(Command::UpdateNow).await;
    }

    /// Play `transition` before the next update's content appears.
    pub async fn transition_on_next_update(&self, transition: Transition) {
        self.send(Command::TransitionOnNextUpdate(transition)).await;
    }

    /// Show page `index` from the next update on.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`] if there is no such page.
    pub async fn show_page(&self, index: usize) -> Result<()> {
        if index >= self.page_count {
            return Err(Error::IndexOutOfBounds);
        }
        self.send(Command::ShowPage(index)).await;
        Ok(())
    }

    /// Advance one page, wrapping to the first.
    pub async fn next_page(&self) {
        self.send(Command::NextPage).await;
    }

    /// Go back one page, wrapping to the last.
    pub async fn previous_page(&self) {
        self.send(Command::PreviousPage).await;
    }

    /// Swap lit and dark faces. Refreshes every dot.
    pub async fn invert(&self, invert: bool) {
        self.send(Command::Invert(invert)).await;
    }

    /// Turn the user LED on panel `board` on or off.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`] if there is no such panel.
    pub async fn set_user_led(&self, board: usize, on: bool) -> Result<()> {
        if board >= self.board_count {
            return Err(Error::IndexOutOfBounds);
        }
        self.send(Command::UserLed { board, on }).await;
        Ok(())
    }

    /// Panels in the chain.
    #[must_use]
    pub const fn board_count(&self) -> usize {
        self.board_count
    }

    /// Pages in the display's content.
    #[must_use]
    pub const fn page_count(&self) -> usize {
        self.page_count
    }
}

// Must be `pub` (not `pub(crate)`) because called by macro-generated code that expands at the call site in downstream crates.
#[doc(hidden)]
/// Device loop for a MAX3000 display. Called by macro-generated code.
///
/// Since embassy tasks cannot be generic, [`max3000!`](crate::max3000!) generates a concrete
/// wrapper task that calls this function.
#[cfg(not(feature = "host"))]
pub async fn max3000_device_loop<const W: usize, const H: usize>(
    mut display: Max3000Display<embassy_rp::gpio::Output<'static>, embassy_time::Delay, W, H>,
    max3000_static: &'static Max3000Static,
) -> Result<Infallible> {
    info!("max3000_device_loop: task started");
    display.setup().await?;
    display.dump_config();

    let command_signal = &max3000_static.command_signal;
    let completion_signal = &max3000_static.completion_signal;
    let mut ticker = display.update_interval().period().map(Ticker::every);

    loop {
        let command = match ticker.as_mut() {
            Some(ticker) => match select(command_signal.wait(), ticker.next()).await {
                Either::First(command) => Some(command),
                Either::Second(()) => None,
            },
            None => Some(command_signal.wait().await),
        };

        let Some(command) = command else {
            display.update().await?;
            continue;
        };

        debug!("max3000_device_loop: handling command");
        match command {
            Command::UpdateNow => {
                display.update().await?;
            }
            Command::TransitionOnNextUpdate(transition) => {
                display.transition_on_next_update(transition);
            }
            Command::ShowPage(index) => {
                if display.show_page(index).is_err() {
                    warn!("max3000_device_loop: no page {}", index);
                }
            }
            Command::NextPage => display.show_next_page(),
            Command::PreviousPage => display.show_previous_page(),
            Command::Invert(invert) => {
                display.invert(invert).await?;
            }
            Command::UserLed { board, on } => {
                display.set_user_led(board, on).await?;
            }
        }
        completion_signal.signal(());
    }
}

/// Declare a MAX3000 display type for a grid of chained panels.
///
/// Fields (both optional, default 1):
///
/// - `panels_wide`: panels across.
/// - `panels_high`: panels down.
///
/// For a type named `Name`, this generates:
///
/// - `Name`, which derefs to [`Max3000`], with `Name::WIDTH`, `Name::HEIGHT`, and
///   `Name::new(pins, &options, content, spawner)`.
/// - `NameFrame`, `NameCanvas<'a>`, `NameContent`, and `NamePage` aliases at the display's size.
/// - A background embassy task that runs [`Max3000Display`](display::Max3000Display).
///
/// `options.panels_wide` and `options.panels_high` must match the macro's fields.
///
/// See the [module docs](mod@crate::max3000) for an example.
#[cfg(not(feature = "host"))]
#[macro_export]
macro_rules! max3000 {
    ($($tt:tt)*) => { $crate::__max3000_impl! { $($tt)* } };
}

// Public for macro expansion in downstream crates.
#[cfg(not(feature = "host"))]
#[doc(hidden)]
#[macro_export]
macro_rules! __max3000_impl {
    (@__fill_defaults
        ($($vis:tt)*) $name:ident,
        panels_wide: $panels_wide:expr,
        panels_high: $panels_high:expr,
        fields: [ ]
    ) => {
        $crate::__max3000_impl! {
            @__build
            ($($vis)*) $name,
            panels_wide: $panels_wide,
            panels_high: $panels_high
        }
    };

    (@__fill_defaults
        ($($vis:tt)*) $name:ident,
        panels_wide: $panels_wide:expr,
        panels_high: $panels_high:expr,
        fields: [ panels_wide: $value:expr $(, $($rest:tt)*)? ]
    ) => {
        $crate::__max3000_impl! {
            @__fill_defaults
            ($($vis)*) $name,
            panels_wide: $value,
            panels_high: $panels_high,
            fields: [ $($($rest)*)? ]
        }
    };

    (@__fill_defaults
        ($($vis:tt)*) $name:ident,
        panels_wide: $panels_wide:expr,
        panels_high: $panels_high:expr,
        fields: [ panels_high: $value:expr $(, $($rest:tt)*)? ]
    ) => {
        $crate::__max3000_impl! {
            @__fill_defaults
            ($($vis)*) $name,
            panels_wide: $panels_wide,
            panels_high: $value,
            fields: [ $($($rest)*)? ]
        }
    };

    (@__fill_defaults
        ($($vis:tt)*) $name:ident,
        panels_wide: $panels_wide:expr,
        panels_high: $panels_high:expr,
        fields: [ $field:ident : $($rest:tt)* ]
    ) => {
        compile_error!(concat!(
            "max3000! got unknown field `",
            stringify!($field),
            "`; expected `panels_wide` or `panels_high`"
        ));
    };

    (@__build
        ($($vis:tt)*) $name:ident,
        panels_wide: $panels_wide:expr,
        panels_high: $panels_high:expr
    ) => {
        $crate::max3000::paste::paste! {
            const [<$name:upper _PANELS_WIDE>]: usize = $panels_wide;
            const [<$name:upper _PANELS_HIGH>]: usize = $panels_high;
            const [<$name:upper _WIDTH>]: usize =
                [<$name:upper _PANELS_WIDE>] * $crate::max3000::PANEL_WIDTH;
            const [<$name:upper _HEIGHT>]: usize =
                [<$name:upper _PANELS_HIGH>] * $crate::max3000::PANEL_HEIGHT;

            /// Dot buffer at this display's size.
            #[allow(dead_code)]
            $($vis)* type [<$name Frame>] =
                $crate::max3000::frame::DotFrame<{ [<$name:upper _WIDTH>] }, { [<$name:upper _HEIGHT>] }>;
            /// Drawing surface handed to this display's writers.
            #[allow(dead_code)]
            $($vis)* type [<$name Canvas>]<'a> =
                $crate::max3000::frame::Canvas<'a, { [<$name:upper _WIDTH>] }, { [<$name:upper _HEIGHT>] }>;
            /// Content this display draws.
            #[allow(dead_code)]
            $($vis)* type [<$name Content>] =
                $crate::max3000::display::DisplayContent<{ [<$name:upper _WIDTH>] }, { [<$name:upper _HEIGHT>] }>;
            /// One page of this display's content.
            #[allow(dead_code)]
            $($vis)* type [<$name Page>] =
                $crate::max3000::display::Page<{ [<$name:upper _WIDTH>] }, { [<$name:upper _HEIGHT>] }>;

            #[embassy_executor::task]
            async fn [<$name:snake _device_loop>](
                display: $crate::max3000::display::Max3000Display<
                    ::embassy_rp::gpio::Output<'static>,
                    ::embassy_time::Delay,
                    { [<$name:upper _WIDTH>] },
                    { [<$name:upper _HEIGHT>] },
                >,
                max3000_static: &'static $crate::max3000::Max3000Static,
            ) {
                let err = $crate::max3000::max3000_device_loop(display, max3000_static)
                    .await
                    .unwrap_err();
                panic!("{err}");
            }

            /// MAX3000 display handle generated by `max3000!`.
            $($vis)* struct $name {
                max3000: $crate::max3000::Max3000,
            }

            #[allow(dead_code)]
            impl $name {
                /// Panels across.
                pub const PANELS_WIDE: usize = [<$name:upper _PANELS_WIDE>];
                /// Panels down.
                pub const PANELS_HIGH: usize = [<$name:upper _PANELS_HIGH>];
                /// Physical width in dots.
                pub const WIDTH: usize = [<$name:upper _WIDTH>];
                /// Physical height in dots.
                pub const HEIGHT: usize = [<$name:upper _HEIGHT>];

                /// Build the display and spawn its background task.
                pub fn new(
                    pins: $crate::max3000::driver::Max3000Pins<::embassy_rp::gpio::Output<'static>>,
                    options: &$crate::config::Max3000Options,
                    content: [<$name Content>],
                    spawner: ::embassy_executor::Spawner,
                ) -> $crate::Result<Self> {
                    static STATIC: $crate::max3000::Max3000Static =
                        $crate::max3000::Max3000Static::new_static();

                    let page_count = content.page_count();
                    let display = $crate::max3000::display::Max3000Display::new(
                        pins,
                        ::embassy_time::Delay,
                        options,
                    )?
                    .with_content(content);
                    let board_count = display.driver().board_count();

                    let token = [<$name:snake _device_loop>](display, &STATIC);
                    spawner.spawn(token).map_err($crate::Error::TaskSpawn)?;

                    Ok(Self {
                        max3000: $crate::max3000::Max3000::new(&STATIC, board_count, page_count),
                    })
                }
            }

            impl ::core::ops::Deref for $name {
                type Target = $crate::max3000::Max3000;

                fn deref(&self) -> &Self::Target {
                    &self.max3000
                }
            }
        }
    };

    (
        $vis:vis $name:ident { $($fields:tt)* }
    ) => {
        $crate::__max3000_impl! {
            @__fill_defaults
            ($vis) $name,
            panels_wide: 1,
            panels_high: 1,
            fields: [ $($fields)* ]
        }
    };

    (
        $vis:vis $name:ident
    ) => {
        $crate::__max3000_impl! { $vis $name { } }
    };
}
