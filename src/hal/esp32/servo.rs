//! SG90 servo driven by ESP32 LEDC PWM.
//!
//! The LEDC timer runs at 50Hz with 14-bit resolution. Pulse widths come
//! from [`ServoCalibration`]; the output keeps running after each move so
//! the servo holds its position.

use crate::error::{Error, Result};
use crate::servo::{ServoCalibration, SERVO_FREQ_HZ};
use crate::traits::ServoMotor;
use esp_idf_hal::ledc::{config::TimerConfig, LedcDriver, LedcTimerDriver, Resolution};
use esp_idf_hal::peripheral::Peripheral;
use esp_idf_hal::prelude::*;

/// Door servo for ESP32.
///
/// # Example
///
/// ```ignore
/// use garage_link::hal::esp32::Esp32Servo;
/// use garage_link::servo::ServoCalibration;
/// use garage_link::traits::ServoMotor;
///
/// let peripherals = Peripherals::take()?;
/// let mut servo = Esp32Servo::new(
///     peripherals.pins.gpio2,
///     peripherals.ledc.timer0,
///     peripherals.ledc.channel0,
///     ServoCalibration::default(),
/// )?;
/// servo.set_position(90.0)?;
/// ```
pub struct Esp32Servo<'d> {
    pwm: LedcDriver<'d>,
    calibration: ServoCalibration,
}

impl<'d> Esp32Servo<'d> {
    /// PWM resolution (14-bit = 16384 steps)
    const PWM_RESOLUTION: Resolution = Resolution::Bits14;

    /// Creates the servo driver. The output stays idle until the first
    /// [`set_position`](ServoMotor::set_position).
    ///
    /// # Errors
    ///
    /// Returns an error if PWM initialization fails.
    pub fn new<T, TI, C, CI, P, PI>(
        pin: P,
        timer: T,
        channel: C,
        calibration: ServoCalibration,
    ) -> core::result::Result<Self, esp_idf_hal::sys::EspError>
    where
        TI: esp_idf_hal::ledc::LedcTimer + 'd,
        T: Peripheral<P = TI> + 'd,
        CI: esp_idf_hal::ledc::LedcChannel<SpeedMode = TI::SpeedMode> + 'd,
        C: Peripheral<P = CI> + 'd,
        PI: esp_idf_hal::gpio::OutputPin + 'd,
        P: Peripheral<P = PI> + 'd,
    {
        let timer_config = TimerConfig::default()
            .frequency(SERVO_FREQ_HZ.Hz())
            .resolution(Self::PWM_RESOLUTION);
        let timer_driver = LedcTimerDriver::new(timer, &timer_config)?;
        let mut pwm = LedcDriver::new(channel, &timer_driver, pin)?;
        pwm.set_duty(0)?;

        Ok(Self {
            pwm,
            calibration,
        })
    }

    /// Calibration in use.
    #[inline]
    pub fn calibration(&self) -> &ServoCalibration {
        &self.calibration
    }
}

impl ServoMotor for Esp32Servo<'_> {
    fn set_position(&mut self, degrees: f32) -> Result<()> {
        let fraction = self.calibration.duty_for_angle(degrees)?;
        let duty = (fraction * self.pwm.get_max_duty() as f32) as u32;
        self.pwm.set_duty(duty).map_err(|e| {
            log::error!("Servo duty {} rejected: {:?}", duty, e);
            Error::Actuator("servo pwm")
        })
    }
}
