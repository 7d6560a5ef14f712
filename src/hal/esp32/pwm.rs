//! LEDC channel as a [`PwmChannel`].
//!
//! The LEDC hardware duty range depends on the timer resolution; callers
//! always work in 16-bit duty and this type rescales.

use esp_idf_hal::ledc::{LedcDriver, Resolution};
use esp_idf_hal::sys::EspError;

use crate::traits::{PwmChannel, MAX_DUTY};

/// PWM resolution (10-bit = 1024 steps)
pub const PWM_RESOLUTION: Resolution = Resolution::Bits10;

/// One LEDC channel.
///
/// # Example
///
/// ```ignore
/// use esp_idf_hal::ledc::{config::TimerConfig, LedcDriver, LedcTimerDriver};
/// use f01_rover::hal::esp32::Esp32Pwm;
///
/// let peripherals = Peripherals::take()?;
/// let timer_config = TimerConfig::default().frequency(1000.Hz()).resolution(PWM_RESOLUTION);
/// let timer = LedcTimerDriver::new(peripherals.ledc.timer0, &timer_config)?;
/// let in1 = Esp32Pwm::new(LedcDriver::new(
///     peripherals.ledc.channel0,
///     &timer,
///     peripherals.pins.gpio2,
/// )?)?;
/// ```
pub struct Esp32Pwm<'d> {
    driver: LedcDriver<'d>,
    max_duty: u32,
}

impl<'d> Esp32Pwm<'d> {
    /// Wrap a configured channel, forcing it to zero duty.
    pub fn new(mut driver: LedcDriver<'d>) -> Result<Self, EspError> {
        driver.set_duty(0)?;
        let max_duty = driver.get_max_duty();
        Ok(Self { driver, max_duty })
    }
}

impl PwmChannel for Esp32Pwm<'_> {
    type Error = EspError;

    fn set_duty_u16(&mut self, duty: u16) -> Result<(), EspError> {
        let scaled = duty as u64 * self.max_duty as u64 / MAX_DUTY as u64;
        self.driver.set_duty(scaled as u32)
    }

    fn duty_u16(&self) -> u16 {
        if self.max_duty == 0 {
            return 0;
        }
        let duty = self.driver.get_duty() as u64 * MAX_DUTY as u64 / self.max_duty as u64;
        duty.min(MAX_DUTY as u64) as u16
    }
}
