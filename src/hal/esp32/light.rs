//! Photoresistor light sensing via ESP32 ADC.
//!
//! # Wiring
//!
//! - Photoresistor divider midpoint → GPIO4 (ADC1)
//!
//! The divider is arranged so the voltage rises as the sensor is covered.
//! Readings are scaled from the 12-bit raw range to a 0-100 ratio.

use crate::traits::LightSensor;
use esp_idf_hal::adc::attenuation::DB_11;
use esp_idf_hal::adc::oneshot::config::AdcChannelConfig;
use esp_idf_hal::adc::oneshot::{AdcChannelDriver, AdcDriver};
use esp_idf_hal::adc::ADC1;
use esp_idf_hal::gpio::Gpio4;
use esp_idf_hal::peripheral::Peripheral;

/// Light sensor on ADC1.
///
/// # Example
///
/// ```ignore
/// use garage_link::hal::esp32::Esp32Light;
/// use garage_link::traits::LightSensor;
///
/// let peripherals = Peripherals::take()?;
/// let mut light = Esp32Light::new(peripherals.adc1, peripherals.pins.gpio4)?;
/// log::info!("light {}", light.read_level());
/// ```
pub struct Esp32Light<'d> {
    channel: AdcChannelDriver<'d, Gpio4, AdcDriver<'d, ADC1>>,
    last_level: f32,
}

impl<'d> Esp32Light<'d> {
    /// Full-scale raw reading at 12-bit resolution.
    const RAW_FULL_SCALE: f32 = 4095.0;

    /// Creates the sensor, taking ownership of ADC1.
    ///
    /// # Errors
    ///
    /// Returns an error if ADC initialization fails.
    pub fn new(
        adc: impl Peripheral<P = ADC1> + 'd,
        pin: impl Peripheral<P = Gpio4> + 'd,
    ) -> Result<Self, esp_idf_hal::sys::EspError> {
        let adc = AdcDriver::new(adc)?;
        let config = AdcChannelConfig {
            attenuation: DB_11,
            ..Default::default()
        };
        let channel = AdcChannelDriver::new(adc, pin, &config)?;

        Ok(Self {
            channel,
            last_level: 0.0,
        })
    }

    fn raw_to_level(raw: u16) -> f32 {
        (f32::from(raw) / Self::RAW_FULL_SCALE * 100.0).clamp(0.0, 100.0)
    }
}

impl LightSensor for Esp32Light<'_> {
    /// Returns the previous level if the conversion fails.
    fn read_level(&mut self) -> f32 {
        match self.channel.read_raw() {
            Ok(raw) => self.last_level = Self::raw_to_level(raw),
            Err(e) => log::warn!("Light ADC read failed: {:?}", e),
        }
        self.last_level
    }
}
