//! ESP32-C3 SuperMini hardware abstraction layer for the garage board.
//!
//! # Hardware Configuration
//!
//! - **MCU**: ESP32-C3 SuperMini (RISC-V 160MHz, 4MB Flash)
//! - **Touch**: TTP223 capacitive pad (digital, active high)
//! - **Light**: Photoresistor divider on ADC1
//! - **Servo**: SG90 on LEDC PWM at 50Hz
//! - **Buzzer**: Active piezo buzzer
//! - **LED**: Door-open indicator
//!
//! # Pin Assignments
//!
//! See the [`pins`] module for GPIO assignments matching the SuperMini layout.

use core::marker::PhantomData;

use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{Gpio3, Gpio6, Gpio7};

use crate::hal::ConsoleDisplay;
use crate::session::Board;

mod clock;
mod light;
mod outputs;
mod servo;
mod touch;

pub use clock::Esp32Clock;
pub use light::Esp32Light;
pub use outputs::{Esp32Buzzer, Esp32Led};
pub use servo::Esp32Servo;
pub use touch::Esp32Touch;

#[cfg(feature = "wifi")]
mod wifi;
#[cfg(feature = "wifi")]
pub use wifi::{Esp32Transport, Esp32TransportError};

/// The garage board as wired in [`pins`].
pub struct Esp32Board<'d>(PhantomData<&'d ()>);

impl<'d> Board for Esp32Board<'d> {
    type Touch = Esp32Touch<'d, Gpio6>;
    type Light = Esp32Light<'d>;
    type Servo = Esp32Servo<'d>;
    type Buzzer = Esp32Buzzer<'d, Gpio3>;
    type Led = Esp32Led<'d, Gpio7>;
    type Display = ConsoleDisplay;
    type Clock = Esp32Clock;
    type Delay = FreeRtos;
}

/// Pin assignments for SuperMini ESP32-C3.
pub mod pins {
    // =========================================================================
    // Actuators
    // =========================================================================

    /// Servo PWM output (LEDC channel 0)
    pub const SERVO_PWM: i32 = 2;

    /// Buzzer drive
    pub const BUZZER: i32 = 3;

    /// Door-open LED
    pub const LED: i32 = 7;

    // =========================================================================
    // Sensors
    // =========================================================================

    /// Photoresistor divider (ADC1 channel 4)
    pub const LIGHT_ADC: i32 = 4;

    /// TTP223 touch pad output
    pub const TOUCH: i32 = 6;
}
