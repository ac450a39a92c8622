//! Device abstractions for Luminator MAX3000 flip-dot panels on Pico 1 and 2, plus the
//! build-time configuration schema and code generator that wire them up.
//!
//! # Glossary
//!
//! - **Panel:** one MAX3000 board, 28 columns by 16 rows of electromagnetic dots. Panels chain
//!   through their shift registers to form larger displays.
//! - **Pin:** a logical identifier for a hardware output line. See [`config::PinRole`].
//! - **Polling component:** a unit re-invoked on a fixed timer interval. See
//!   [`max3000::display::Max3000Display`].
//! - **Dissolve:** flip dots in a shuffled order instead of sweeping column by column.
#![cfg_attr(not(feature = "host"), no_std)]
#![cfg_attr(not(feature = "host"), no_main)]
#![allow(async_fn_in_trait, reason = "single-threaded embedded")]

// Compile-time checks: exactly one board must be selected (unless building for the host)
#[cfg(all(not(any(feature = "pico1", feature = "pico2")), not(feature = "host")))]
compile_error!("Must enable exactly one board feature: 'pico1' or 'pico2'");

#[cfg(all(feature = "pico1", feature = "pico2"))]
compile_error!("Cannot enable both 'pico1' and 'pico2' features simultaneously");

#[cfg(all(not(feature = "arm"), not(feature = "host")))]
compile_error!("Must enable the 'arm' architecture feature");

// Must come first so the logging macros are visible to every module.
#[macro_use]
mod fmt;

#[cfg(feature = "host")]
pub mod codegen;
pub mod config;
mod error;
pub mod max3000;
#[cfg(feature = "host")]
pub mod to_png;

// Re-export error types and result (used throughout)
pub use crate::error::{Error, Result};
