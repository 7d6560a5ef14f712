//! LED driver with instant and smoothed brightness changes.
//!
//! An LED is either on a PWM-capable output or, when no PWM channel could be
//! given to it, on a plain GPIO. The choice is made once when the driver is
//! built ([`LedOutput`]) and never re-detected. Binary LEDs keep working with
//! the same API, just without intermediate brightness.
//!
//! Brightness is always read back from the hardware rather than cached, so a
//! fade that starts while another is in flight continues from what the LED is
//! actually showing.
//!
//! # Example
//!
//! ```rust
//! use f01_rover::led::{LedDriver, LedOutput};
//! use f01_rover::hal::{MockPin, MockPwm};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(async {
//! let pwm = MockPwm::new();
//! let mut led: LedDriver<MockPwm, MockPin> = LedDriver::new(LedOutput::Pwm(pwm.clone()));
//!
//! led.on(50.0, 0.0).await.unwrap();
//! assert!((led.brightness() - 50.0).abs() < 0.01);
//!
//! led.toggle(100.0, 0.0).await.unwrap();
//! assert_eq!(led.brightness(), 0.0);
//! # });
//! ```

use core::convert::Infallible;
use core::fmt;
use core::future::Future;
use core::time::Duration;

use crate::traits::{BinaryOutput, PwmChannel, MAX_DUTY};
use crate::transition::{fade_duration, fade_frames, fade_step_delay};

/// Highest brightness, in percent.
pub const MAX_BRIGHTNESS: f32 = 100.0;

/// The output an LED is wired to, fixed at construction.
#[derive(Debug)]
pub enum LedOutput<P, B> {
    /// Dimmable output.
    Pwm(P),
    /// On/off only.
    Binary(B),
}

impl<P: PwmChannel, B: BinaryOutput> LedOutput<P, B> {
    /// Use the PWM output if it could be set up, otherwise fall back to a
    /// binary pin for the lifetime of the LED.
    pub fn detect<E: fmt::Debug>(pwm: Result<P, E>, fallback: impl FnOnce() -> B) -> Self {
        match pwm {
            Ok(pwm) => LedOutput::Pwm(pwm),
            Err(e) => {
                log::warn!("[LED] PWM unavailable ({:?}), using binary output", e);
                LedOutput::Binary(fallback())
            }
        }
    }
}

/// Error from an LED write.
#[derive(Debug, PartialEq, Eq)]
pub enum LedError<P, B> {
    /// The PWM write failed.
    Pwm(P),
    /// The binary write failed.
    Binary(B),
}

impl<P: fmt::Debug, B: fmt::Debug> fmt::Display for LedError<P, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedError::Pwm(e) => write!(f, "LED PWM write failed: {:?}", e),
            LedError::Binary(e) => write!(f, "LED level write failed: {:?}", e),
        }
    }
}

impl<P: fmt::Debug, B: fmt::Debug> std::error::Error for LedError<P, B> {}

/// Result of an LED operation.
pub type LedResult<P, B> =
    Result<(), LedError<<P as PwmChannel>::Error, <B as BinaryOutput>::Error>>;

/// Driver for one LED.
pub struct LedDriver<P, B> {
    output: LedOutput<P, B>,
}

impl<P: PwmChannel, B: BinaryOutput> LedDriver<P, B> {
    /// Create a driver for the given output.
    pub fn new(output: LedOutput<P, B>) -> Self {
        Self { output }
    }

    /// True if the LED can show intermediate brightness.
    pub fn is_pwm(&self) -> bool {
        matches!(self.output, LedOutput::Pwm(_))
    }

    /// Brightness currently output, in percent.
    ///
    /// A binary LED reports 0 or 100.
    pub fn brightness(&self) -> f32 {
        match &self.output {
            LedOutput::Pwm(pwm) => pwm.duty_u16() as f32 / MAX_DUTY as f32 * MAX_BRIGHTNESS,
            LedOutput::Binary(pin) => {
                if pin.level() {
                    MAX_BRIGHTNESS
                } else {
                    0.0
                }
            }
        }
    }

    /// Turn on at `bright` percent.
    ///
    /// `smooth` of 0 is instant; otherwise the change fades over
    /// `smooth * 10` milliseconds (one second at 100).
    pub async fn on(&mut self, bright: f32, smooth: f32) -> LedResult<P, B> {
        let bright = clamp_brightness(bright);
        if smooth == 0.0 {
            self.write(bright)
        } else {
            self.fade_to(bright, fade_duration(smooth)).await
        }
    }

    /// Turn off, instantly or fading over `smooth * 10` milliseconds.
    pub async fn off(&mut self, smooth: f32) -> LedResult<P, B> {
        if smooth == 0.0 {
            self.write(0.0)
        } else {
            self.fade_to(0.0, fade_duration(smooth)).await
        }
    }

    /// Turn on if currently dark, off otherwise.
    ///
    /// A binary LED just inverts its level.
    pub async fn toggle(&mut self, bright: f32, smooth: f32) -> LedResult<P, B> {
        let lit = match &mut self.output {
            LedOutput::Pwm(pwm) => pwm.duty_u16() != 0,
            LedOutput::Binary(pin) => return pin.toggle_level().map_err(LedError::Binary),
        };
        if lit {
            self.off(smooth).await
        } else {
            self.on(bright, smooth).await
        }
    }

    /// Toggle every `interval_ms` forever.
    ///
    /// Write errors are logged and blinking continues. Drop the future (or
    /// use [`blink_until`](Self::blink_until)) to stop; the LED is left at the
    /// last frame written.
    pub async fn blink(&mut self, interval_ms: u64, bright: f32, smooth: f32) -> Infallible {
        let interval = Duration::from_millis(interval_ms);
        loop {
            if let Err(e) = self.toggle(bright, smooth).await {
                log::warn!("[LED] blink: {}", e);
            }
            tokio::time::sleep(interval).await;
        }
    }

    /// Blink until `stop` completes.
    ///
    /// Cancellation is only observed at a suspension point, so the output is
    /// never left between the two halves of a write.
    pub async fn blink_until<F: Future>(
        &mut self,
        interval_ms: u64,
        bright: f32,
        smooth: f32,
        stop: F,
    ) {
        tokio::select! {
            _ = self.blink(interval_ms, bright, smooth) => {}
            _ = stop => {}
        }
    }

    /// Fade from the observed brightness to `target` over `duration`.
    async fn fade_to(&mut self, target: f32, duration: Duration) -> LedResult<P, B> {
        if let LedOutput::Binary(pin) = &mut self.output {
            // No intermediate levels: switch halfway through
            let half = duration / 2;
            tokio::time::sleep(half).await;
            pin.set_level(target > 0.0).map_err(LedError::Binary)?;
            tokio::time::sleep(duration - half).await;
            return Ok(());
        }

        let current = self.brightness();
        let delay = fade_step_delay(duration);
        for bright in fade_frames(current, target) {
            self.write(bright)?;
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    /// Instant write of a brightness in percent.
    fn write(&mut self, bright: f32) -> LedResult<P, B> {
        match &mut self.output {
            LedOutput::Pwm(pwm) => pwm
                .set_duty_u16(brightness_to_duty(bright))
                .map_err(LedError::Pwm),
            LedOutput::Binary(pin) => pin.set_level(bright > 0.0).map_err(LedError::Binary),
        }
    }
}

fn clamp_brightness(bright: f32) -> f32 {
    if bright.is_finite() {
        bright.clamp(0.0, MAX_BRIGHTNESS)
    } else {
        0.0
    }
}

/// Convert a brightness percentage to a 16-bit duty, truncating.
pub fn brightness_to_duty(bright: f32) -> u16 {
    (MAX_DUTY as f32 * (clamp_brightness(bright) / MAX_BRIGHTNESS)) as u16
}
