//! Buzzer and LED on plain GPIO outputs.

use crate::traits::{Buzzer, StatusLed};
use embedded_hal::digital::PinState;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{Output, OutputPin, PinDriver};
use esp_idf_hal::peripheral::Peripheral;

/// Active piezo buzzer.
pub struct Esp32Buzzer<'d, P: OutputPin> {
    pin: PinDriver<'d, P, Output>,
}

impl<'d, P: OutputPin> Esp32Buzzer<'d, P> {
    /// Length of one beep.
    pub const BEEP_MS: u32 = 10;

    /// Configures `pin` as an output, driven low.
    ///
    /// # Errors
    ///
    /// Returns an error if GPIO initialization fails.
    pub fn new(pin: impl Peripheral<P = P> + 'd) -> Result<Self, esp_idf_hal::sys::EspError> {
        let mut pin = PinDriver::output(pin)?;
        pin.set_low()?;
        Ok(Self { pin })
    }
}

impl<P: OutputPin> Buzzer for Esp32Buzzer<'_, P> {
    fn turn_on(&mut self) {
        if let Err(e) = self.pin.set_high() {
            log::warn!("Buzzer on failed: {:?}", e);
        }
    }

    fn turn_off(&mut self) {
        if let Err(e) = self.pin.set_low() {
            log::warn!("Buzzer off failed: {:?}", e);
        }
    }

    fn beep(&mut self) {
        self.turn_on();
        FreeRtos::delay_ms(Self::BEEP_MS);
        self.turn_off();
    }
}

/// Door-open indicator LED.
pub struct Esp32Led<'d, P: OutputPin> {
    pin: PinDriver<'d, P, Output>,
}

impl<'d, P: OutputPin> Esp32Led<'d, P> {
    /// Configures `pin` as an output, driven low.
    ///
    /// # Errors
    ///
    /// Returns an error if GPIO initialization fails.
    pub fn new(pin: impl Peripheral<P = P> + 'd) -> Result<Self, esp_idf_hal::sys::EspError> {
        let mut pin = PinDriver::output(pin)?;
        pin.set_low()?;
        Ok(Self { pin })
    }
}

impl<P: OutputPin> StatusLed for Esp32Led<'_, P> {
    fn set(&mut self, state: PinState) {
        let result = match state {
            PinState::High => self.pin.set_high(),
            PinState::Low => self.pin.set_low(),
        };
        if let Err(e) = result {
            log::warn!("LED write failed: {:?}", e);
        }
    }
}
