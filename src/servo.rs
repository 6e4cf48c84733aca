//! Hobby-servo angle to PWM duty-cycle conversion.
//!
//! A standard servo runs at 50 Hz (20 ms period). The pulse width maps
//! linearly from `min_pulse_ms` at 0 degrees to `max_pulse_ms` at 180.
//!
//! ```text
//! duty = (deg / 180) * (max/20 - min/20) + min/20
//! ```
//!
//! Out-of-range angles and calibrations are programming errors and are
//! rejected with an [`Error`] at the call site.

use crate::error::{Error, PulseBound, Result};

/// Servo PWM frequency.
pub const SERVO_FREQ_HZ: u32 = 50;

/// Servo PWM period in milliseconds.
pub const SERVO_PERIOD_MS: f32 = 20.0;

/// Largest accepted angle.
pub const MAX_ANGLE: f32 = 180.0;

const MIN_PULSE_RANGE: (f32, f32) = (0.1, 1.5);
const MAX_PULSE_RANGE: (f32, f32) = (1.6, 3.0);

/// Pulse-width calibration of a servo.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ServoCalibration {
    min_pulse_ms: f32,
    max_pulse_ms: f32,
}

impl Default for ServoCalibration {
    fn default() -> Self {
        Self {
            min_pulse_ms: 1.0,
            max_pulse_ms: 2.0,
        }
    }
}

impl ServoCalibration {
    /// Builds a calibration, validating both ends.
    ///
    /// # Errors
    ///
    /// [`Error::PulseCalibrationOutOfRange`] if `min_pulse_ms` is outside
    /// `0.1..=1.5` or `max_pulse_ms` is outside `1.6..=3.0`.
    pub fn new(min_pulse_ms: f32, max_pulse_ms: f32) -> Result<Self> {
        Self::default()
            .with_min_pulse_ms(min_pulse_ms)?
            .with_max_pulse_ms(max_pulse_ms)
    }

    /// Sets the 0 degree pulse width.
    pub fn with_min_pulse_ms(mut self, ms: f32) -> Result<Self> {
        check_pulse(PulseBound::Min, ms, MIN_PULSE_RANGE)?;
        self.min_pulse_ms = ms;
        Ok(self)
    }

    /// Sets the 180 degree pulse width.
    pub fn with_max_pulse_ms(mut self, ms: f32) -> Result<Self> {
        check_pulse(PulseBound::Max, ms, MAX_PULSE_RANGE)?;
        self.max_pulse_ms = ms;
        Ok(self)
    }

    /// The 0 degree pulse width in milliseconds.
    pub fn min_pulse_ms(&self) -> f32 {
        self.min_pulse_ms
    }

    /// The 180 degree pulse width in milliseconds.
    pub fn max_pulse_ms(&self) -> f32 {
        self.max_pulse_ms
    }

    /// Duty cycle (0.0 to 1.0) for the given angle.
    ///
    /// # Examples
    ///
    /// ```
    /// use garage_link::servo::ServoCalibration;
    ///
    /// let cal = ServoCalibration::default();
    /// assert!((cal.duty_for_angle(0.0).unwrap() - 0.05).abs() < 1e-6);
    /// assert!((cal.duty_for_angle(180.0).unwrap() - 0.10).abs() < 1e-6);
    /// assert!(cal.duty_for_angle(181.0).is_err());
    /// ```
    ///
    /// # Errors
    ///
    /// [`Error::AngleOutOfRange`] for angles outside `0..=180` (and NaN).
    pub fn duty_for_angle(&self, degrees: f32) -> Result<f32> {
        check_angle(degrees)?;
        let min = self.min_pulse_ms / SERVO_PERIOD_MS;
        let max = self.max_pulse_ms / SERVO_PERIOD_MS;
        Ok((degrees / MAX_ANGLE) * (max - min) + min)
    }
}

/// Rejects angles outside `0..=180`.
pub fn check_angle(degrees: f32) -> Result<()> {
    if (0.0..=MAX_ANGLE).contains(&degrees) {
        Ok(())
    } else {
        Err(Error::AngleOutOfRange { degrees })
    }
}

fn check_pulse(which: PulseBound, value_ms: f32, (min_ms, max_ms): (f32, f32)) -> Result<()> {
    if (min_ms..=max_ms).contains(&value_ms) {
        Ok(())
    } else {
        Err(Error::PulseCalibrationOutOfRange {
            which,
            value_ms,
            min_ms,
            max_ms,
        })
    }
}
