//! Crate-wide error type.
//!
//! Only programming errors and hardware failures surface here. Transport
//! trouble (a socket that drops, an open that fails) is handled inside the
//! session loop and never escalates to an [`Error`] on its own.

use thiserror::Error;

/// Which end of the servo pulse calibration was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PulseBound {
    /// Pulse width producing 0 degrees.
    Min,
    /// Pulse width producing 180 degrees.
    Max,
}

/// Errors raised by the garage controller.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum Error {
    /// A servo position outside `0..=180` degrees was requested.
    #[error("servo angle {degrees} out of range, must be between 0 and 180 degrees")]
    AngleOutOfRange {
        /// The rejected angle.
        degrees: f32,
    },

    /// A servo pulse calibration value outside its documented bounds.
    #[error("{which:?} pulse calibration {value_ms}ms out of range, must be between {min_ms} and {max_ms}ms")]
    PulseCalibrationOutOfRange {
        /// Which calibration value was rejected.
        which: PulseBound,
        /// The rejected pulse width in milliseconds.
        value_ms: f32,
        /// Lowest accepted value.
        min_ms: f32,
        /// Highest accepted value.
        max_ms: f32,
    },

    /// An actuator driver failed to apply an output.
    #[error("actuator failure: {0}")]
    Actuator(&'static str),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;
