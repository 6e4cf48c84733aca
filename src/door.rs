//! Door actuation: servo, buzzer and status LED driven by commands.
//!
//! [`Door`] owns the three actuators and the [`DoorState`] flag so they can
//! only change together. Every recognized command beeps, positions the
//! servo, then drives the LED.
//!
//! # Close asymmetry
//!
//! `close` moves the servo and drops the LED but, by default, leaves
//! `is_open` set, so the car-in-garage watch stays armed after a close.
//! Set [`DoorConfig::close_clears_open_flag`] to make `close` clear the
//! flag as well.
//!
//! # Example
//!
//! ```rust
//! use garage_link::{Command, Door, DoorConfig};
//! use garage_link::hal::{MockBuzzer, MockLed, MockServo};
//!
//! let mut door = Door::new(
//!     MockServo::new(),
//!     MockBuzzer::new(),
//!     MockLed::new(),
//!     DoorConfig::default(),
//! ).unwrap();
//!
//! door.dispatch(Command::Open).unwrap();
//! assert!(door.state().is_open);
//! assert_eq!(door.servo().position, Some(0.0));
//! assert!(door.led().is_on());
//! ```

use crate::command::Command;
use crate::config::DoorConfig;
use crate::error::Result;
use crate::servo::check_angle;
use crate::traits::{Buzzer, ServoMotor, StatusLed};

/// Door flag maintained by the dispatcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DoorState {
    /// Set by `open`. Cleared by `close` only when configured to.
    pub is_open: bool,
}

/// What a dispatch did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dispatched {
    /// Door driven open.
    Opened,
    /// Door driven closed.
    Closed,
    /// Unrecognized command, nothing moved.
    Ignored,
}

/// The door actuators and their state flag.
pub struct Door<S, B, L> {
    servo: S,
    buzzer: B,
    led: L,
    state: DoorState,
    config: DoorConfig,
}

impl<S, B, L> Door<S, B, L>
where
    S: ServoMotor,
    B: Buzzer,
    L: StatusLed,
{
    /// Creates the door with `is_open = false`.
    ///
    /// # Errors
    ///
    /// [`Error::AngleOutOfRange`](crate::Error::AngleOutOfRange) if either
    /// configured angle is outside `0..=180`.
    pub fn new(servo: S, buzzer: B, led: L, config: DoorConfig) -> Result<Self> {
        check_angle(config.open_angle)?;
        check_angle(config.closed_angle)?;
        Ok(Self {
            servo,
            buzzer,
            led,
            state: DoorState::default(),
            config,
        })
    }

    /// Puts the hardware in the closed position without beeping.
    pub fn park(&mut self) -> Result<()> {
        self.servo.set_position(self.config.closed_angle)?;
        self.led.off();
        Ok(())
    }

    /// Applies a command to the actuators.
    pub fn dispatch(&mut self, command: Command) -> Result<Dispatched> {
        match command {
            Command::Open => {
                self.buzzer.beep();
                self.servo.set_position(self.config.open_angle)?;
                self.led.on();
                self.state.is_open = true;
                log::info!("Door opened");
                Ok(Dispatched::Opened)
            }
            Command::Close => {
                self.buzzer.beep();
                self.servo.set_position(self.config.closed_angle)?;
                self.led.off();
                if self.config.close_clears_open_flag {
                    self.state.is_open = false;
                }
                log::info!("Door closed");
                Ok(Dispatched::Closed)
            }
            Command::Unknown => Ok(Dispatched::Ignored),
        }
    }

    /// Current door flag.
    #[inline]
    pub fn state(&self) -> DoorState {
        self.state
    }

    /// Returns true if the door flag is set.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.state.is_open
    }

    /// The servo driver.
    pub fn servo(&self) -> &S {
        &self.servo
    }

    /// The buzzer driver.
    pub fn buzzer(&self) -> &B {
        &self.buzzer
    }

    /// The LED driver.
    pub fn led(&self) -> &L {
        &self.led
    }
}
