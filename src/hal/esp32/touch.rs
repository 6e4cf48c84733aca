//! TTP223 capacitive touch pad on a GPIO input.
//!
//! The module drives its output high while touched, so the pin is read
//! directly with a pull-down to keep it low when the module is unplugged.

use crate::traits::TouchSensor;
use esp_idf_hal::gpio::{Input, InputPin, OutputPin, PinDriver, Pull};
use esp_idf_hal::peripheral::Peripheral;

/// Touch pad for ESP32.
///
/// # Example
///
/// ```ignore
/// use garage_link::hal::esp32::Esp32Touch;
/// use garage_link::traits::TouchSensor;
///
/// let peripherals = Peripherals::take()?;
/// let mut touch = Esp32Touch::new(peripherals.pins.gpio6)?;
/// if touch.is_touched() {
///     log::info!("Someone at the door");
/// }
/// ```
pub struct Esp32Touch<'d, P>
where
    P: InputPin + OutputPin,
{
    pin: PinDriver<'d, P, Input>,
}

impl<'d, P> Esp32Touch<'d, P>
where
    P: InputPin + OutputPin,
{
    /// Configures `pin` as a pulled-down input.
    ///
    /// # Errors
    ///
    /// Returns an error if GPIO initialization fails.
    pub fn new(pin: impl Peripheral<P = P> + 'd) -> Result<Self, esp_idf_hal::sys::EspError> {
        let mut pin = PinDriver::input(pin)?;
        pin.set_pull(Pull::Down)?;
        Ok(Self { pin })
    }
}

impl<P> TouchSensor for Esp32Touch<'_, P>
where
    P: InputPin + OutputPin,
{
    #[inline]
    fn is_touched(&mut self) -> bool {
        self.pin.is_high()
    }
}
