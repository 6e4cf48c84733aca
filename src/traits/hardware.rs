//! Hardware abstraction traits for the garage sensors and actuators.
//!
//! These are the simple synchronous operations the session loop needs
//! from the board. Drivers own their pins and timing details.
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`TouchSensor`] | Capacitive touch pad (digital level) |
//! | [`LightSensor`] | Ambient light as a 0-100 ratio |
//! | [`ServoMotor`] | Door actuator positioned in degrees |
//! | [`Buzzer`] | Short confirmation beep |
//! | [`StatusLed`] | Door-open indicator |
//! | [`CharacterDisplay`] | Text LCD with RGB backlight |
//! | [`Clock`] | Wall-clock time of day |
//!
//! Blocking waits use [`embedded_hal::delay::DelayNs`].
//!
//! # Implementation
//!
//! For testing and desktop development, use the mock implementations
//! from [`crate::hal::mock`]. For ESP32 hardware, use the
//! implementations from `hal::esp32` (requires `esp32` feature).
//!
//! # Example
//!
//! ```rust
//! use garage_link::traits::{ServoMotor, StatusLed};
//! use garage_link::hal::{MockLed, MockServo};
//! use embedded_hal::digital::PinState;
//!
//! let mut servo = MockServo::new();
//! servo.set_position(0.0).unwrap();
//! assert!(servo.set_position(200.0).is_err());
//!
//! let mut led = MockLed::new();
//! led.set(PinState::High);
//! assert!(led.is_on());
//! ```

use core::fmt;

use embedded_hal::digital::PinState;

use crate::error::Result;

/// Touch sensor read as a level.
pub trait TouchSensor {
    /// Returns true while the pad is touched.
    fn is_touched(&mut self) -> bool;
}

/// Ambient light sensor.
pub trait LightSensor {
    /// Light level as a ratio between 0 and 100.
    fn read_level(&mut self) -> f32;
}

/// Positional servo driving the door.
///
/// # Implementation Notes
///
/// - Angles outside `0..=180` must return
///   [`Error::AngleOutOfRange`](crate::Error::AngleOutOfRange) without
///   moving; use [`check_angle`](crate::servo::check_angle)
/// - The PWM output keeps running after positioning so the servo holds
pub trait ServoMotor {
    /// Moves to `degrees` (0 to 180).
    fn set_position(&mut self, degrees: f32) -> Result<()>;
}

/// Piezo buzzer.
pub trait Buzzer {
    /// Drives the buzzer on.
    fn turn_on(&mut self);

    /// Drives the buzzer off.
    fn turn_off(&mut self);

    /// Emits one short fixed-duration pulse.
    fn beep(&mut self);
}

/// Single indicator LED.
pub trait StatusLed {
    /// Drives the LED line.
    fn set(&mut self, state: PinState);

    /// Drives the LED high.
    fn on(&mut self) {
        self.set(PinState::High);
    }

    /// Drives the LED low.
    fn off(&mut self) {
        self.set(PinState::Low);
    }
}

/// Character LCD with an RGB backlight.
///
/// All operations are best effort: the session logs failures and carries on.
pub trait CharacterDisplay {
    /// Error type for display operations.
    type Error: fmt::Debug;

    /// Clears the screen and homes the cursor.
    fn clear(&mut self) -> core::result::Result<(), Self::Error>;

    /// Sets the backlight color.
    fn set_backlight_rgb(&mut self, r: u8, g: u8, b: u8) -> core::result::Result<(), Self::Error>;

    /// Moves the cursor to `col`, `row` (both zero-based).
    fn set_cursor(&mut self, col: u8, row: u8) -> core::result::Result<(), Self::Error>;

    /// Writes text at the cursor.
    fn write_str(&mut self, text: &str) -> core::result::Result<(), Self::Error>;
}

/// Wall-clock source.
pub trait Clock {
    /// Current UTC time of day, or `None` while the clock is not set.
    fn time_of_day(&self) -> Option<TimeOfDay>;
}

/// Time of day, rendered as `HH:MM:SS`.
///
/// # Example
///
/// ```rust
/// use garage_link::traits::TimeOfDay;
///
/// let t = TimeOfDay::from_unix_secs(1_700_000_000);
/// assert_eq!(t, TimeOfDay::new(22, 13, 20));
/// assert_eq!(format!("{}", TimeOfDay::new(7, 5, 9)), "07:05:09");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
    second: u8,
}

impl TimeOfDay {
    /// Creates a time of day. Fields wrap into their valid range.
    pub const fn new(hour: u8, minute: u8, second: u8) -> Self {
        Self {
            hour: hour % 24,
            minute: minute % 60,
            second: second % 60,
        }
    }

    /// Time of day (UTC) of a Unix timestamp.
    pub const fn from_unix_secs(secs: u64) -> Self {
        let of_day = secs % 86_400;
        Self {
            hour: (of_day / 3600) as u8,
            minute: ((of_day / 60) % 60) as u8,
            second: (of_day % 60) as u8,
        }
    }

    /// Hour, 0 to 23.
    #[inline]
    pub const fn hour(&self) -> u8 {
        self.hour
    }

    /// Minute, 0 to 59.
    #[inline]
    pub const fn minute(&self) -> u8 {
        self.minute
    }

    /// Second, 0 to 59.
    #[inline]
    pub const fn second(&self) -> u8 {
        self.second
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second)
    }
}
