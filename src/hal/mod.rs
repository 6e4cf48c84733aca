//! Hardware Abstraction Layer implementations.
//!
//! This module contains concrete implementations of the traits
//! defined in [`crate::traits`] for various platforms.
//!
//! # Available Implementations
//!
//! - `mock`: Test implementations for desktop development
//! - `console`: Log-backed LCD stand-in
//! - `esp32`: ESP32-C3 garage board: touch pad, photoresistor, SG90 servo,
//!   buzzer, LED (requires `esp32` feature)

pub mod console;
pub mod mock;

#[cfg(feature = "esp32")]
pub mod esp32;

pub use console::ConsoleDisplay;
pub use mock::*;

#[cfg(feature = "esp32")]
pub use esp32::*;
