//! Hardware abstraction traits for PWM channels and binary outputs.
//!
//! This module defines the hardware seams that allow f01-rover to run on
//! the ESP32 and on desktop mocks with the same motor and LED logic.
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`PwmChannel`] | 16-bit duty output with read-back (motor inputs, dimmable LEDs) |
//! | [`BinaryOutput`] | On/off GPIO output with read-back (LEDs without a PWM slot) |
//!
//! # Example
//!
//! ```rust
//! use f01_rover::traits::PwmChannel;
//! use f01_rover::hal::MockPwm;
//!
//! let mut pwm = MockPwm::new();
//! pwm.set_duty_u16(32768).unwrap();
//! assert_eq!(pwm.duty_u16(), 32768);
//! ```

/// Full-scale 16-bit duty value.
pub const MAX_DUTY: u16 = u16::MAX;

/// Motion phase of one motor, derived from its duty pair.
///
/// # Default
///
/// Defaults to [`Stopped`](Self::Stopped) for safety.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MotorPhase {
    /// `in1` driven, `in2` at zero.
    Forward,
    /// `in2` driven, `in1` at zero.
    Backward,
    /// Both inputs at zero.
    #[default]
    Stopped,
}

impl MotorPhase {
    /// Returns the phase as a lowercase string.
    ///
    /// # Examples
    ///
    /// ```
    /// use f01_rover::MotorPhase;
    ///
    /// assert_eq!(MotorPhase::Forward.as_str(), "forward");
    /// assert_eq!(MotorPhase::Backward.as_str(), "backward");
    /// assert_eq!(MotorPhase::Stopped.as_str(), "stopped");
    /// ```
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            MotorPhase::Forward => "forward",
            MotorPhase::Backward => "backward",
            MotorPhase::Stopped => "stopped",
        }
    }

    /// Returns true if the motor is being driven in either direction.
    #[inline]
    pub const fn is_moving(&self) -> bool {
        !matches!(self, MotorPhase::Stopped)
    }
}

/// A single PWM output with a 16-bit duty cycle.
///
/// Implement this for whatever PWM peripheral drives a motor input or an LED.
/// Implementations scale the 16-bit value to their native resolution.
///
/// # Implementation Notes
///
/// - `duty_u16()` must report what the hardware is currently outputting, not
///   a cached request. LED smoothing starts from this value.
/// - Writes should be cheap and non-blocking; callers issue them from async
///   tasks between sleeps.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use f01_rover::traits::PwmChannel;
///
/// struct MyPwm { /* hardware handle */ }
///
/// impl PwmChannel for MyPwm {
///     type Error = ();
///
///     fn set_duty_u16(&mut self, duty: u16) -> Result<(), ()> {
///         // Scale to the timer's resolution and write the compare register...
///         Ok(())
///     }
///
///     fn duty_u16(&self) -> u16 {
///         // Read the compare register back...
///         0
///     }
/// }
/// ```
pub trait PwmChannel {
    /// Error type for PWM writes.
    type Error: core::fmt::Debug;

    /// Set the duty cycle, `0` = off, [`MAX_DUTY`] = fully on.
    fn set_duty_u16(&mut self, duty: u16) -> Result<(), Self::Error>;

    /// Read the duty cycle currently applied by the hardware.
    fn duty_u16(&self) -> u16;
}

/// A plain on/off output.
///
/// Used as the degraded fallback for LEDs on pins that could not be given a
/// PWM channel.
pub trait BinaryOutput {
    /// Error type for level writes.
    type Error: core::fmt::Debug;

    /// Drive the output high (`true`) or low (`false`).
    fn set_level(&mut self, high: bool) -> Result<(), Self::Error>;

    /// Read back the level currently driven.
    fn level(&self) -> bool;

    /// Invert the current level.
    fn toggle_level(&mut self) -> Result<(), Self::Error> {
        let level = self.level();
        self.set_level(!level)
    }
}
