//! GPIO output as a [`BinaryOutput`].

use esp_idf_hal::gpio::{AnyOutputPin, Output, PinDriver};
use esp_idf_hal::sys::EspError;

use crate::traits::BinaryOutput;

/// On/off output for LEDs without a PWM channel.
pub struct Esp32Pin<'d> {
    driver: PinDriver<'d, AnyOutputPin, Output>,
    active_low: bool,
}

impl<'d> Esp32Pin<'d> {
    /// Output where high means on. Starts off.
    pub fn new(pin: AnyOutputPin) -> Result<Self, EspError> {
        Self::build(pin, false)
    }

    /// Output where low means on, like the SuperMini's onboard LED. Starts off.
    pub fn active_low(pin: AnyOutputPin) -> Result<Self, EspError> {
        Self::build(pin, true)
    }

    fn build(pin: AnyOutputPin, active_low: bool) -> Result<Self, EspError> {
        let driver = PinDriver::output(pin)?;
        let mut out = Self { driver, active_low };
        out.set_level(false)?;
        Ok(out)
    }
}

impl BinaryOutput for Esp32Pin<'_> {
    type Error = EspError;

    fn set_level(&mut self, on: bool) -> Result<(), EspError> {
        if on != self.active_low {
            self.driver.set_high()
        } else {
            self.driver.set_low()
        }
    }

    fn level(&self) -> bool {
        self.driver.is_set_high() != self.active_low
    }
}
