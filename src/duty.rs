//! Speed-to-duty mapping and the per-motor duty pair.
//!
//! A motor is driven by two inputs (`in1` forward, `in2` backward). The pair
//! is modelled by [`DutyPair`], which can only be built from a signed duty and
//! therefore never has both inputs driven at once.
//!
//! # Example
//!
//! ```rust
//! use f01_rover::duty::{map_speed, DutyPair};
//! use f01_rover::MotorPhase;
//!
//! // 50% forward on a motor that needs no correction
//! let duty = map_speed(50, 1.0);
//! assert_eq!(duty, 32767);
//!
//! let pair = DutyPair::from_signed(-duty);
//! assert_eq!(pair.in1(), 0);
//! assert_eq!(pair.in2(), 32767);
//! assert_eq!(pair.phase(), MotorPhase::Backward);
//! ```

use crate::traits::{MotorPhase, MAX_DUTY};

/// Largest commanded speed magnitude, in percent.
pub const MAX_SPEED: i32 = 100;

/// Largest signed duty magnitude produced by [`map_speed`].
pub const MAX_SIGNED_DUTY: i32 = MAX_DUTY as i32;

/// Map a signed percentage speed to a signed 16-bit-range duty.
///
/// - `speed` is clamped to `[-100, 100]`
/// - `correction` scales the speed before mapping (truncated toward zero)
/// - a scaled speed of zero is a hard stop and maps to `0`
/// - any other scaled speed is clamped to a magnitude of `[1, 100]` so the
///   motor always gets at least its minimum duty, then scaled to `65535`
///
/// A non-finite correction is treated as zero.
///
/// # Examples
///
/// ```
/// use f01_rover::duty::map_speed;
///
/// assert_eq!(map_speed(100, 1.0), 65535);
/// assert_eq!(map_speed(-100, 0.5), -32767);
/// assert_eq!(map_speed(0, 0.8), 0);
/// assert_eq!(map_speed(250, 1.0), 65535); // clamped
/// ```
pub fn map_speed(speed: i32, correction: f32) -> i32 {
    let speed = speed.clamp(-MAX_SPEED, MAX_SPEED);
    let correction = if correction.is_finite() { correction } else { 0.0 };

    // `as` truncates toward zero and saturates
    let scaled = (speed as f32 * correction) as i32;
    if scaled == 0 {
        return 0;
    }

    let magnitude = scaled.abs().clamp(1, MAX_SPEED);
    let duty = magnitude * MAX_SIGNED_DUTY / MAX_SPEED;
    duty * scaled.signum()
}

/// Duty values for the two inputs of one motor.
///
/// At most one of `in1`/`in2` is non-zero. The fields are private and every
/// constructor goes through a signed duty, so the invariant holds by
/// construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DutyPair {
    in1: u16,
    in2: u16,
}

impl DutyPair {
    /// Both inputs at zero.
    pub const STOPPED: Self = Self { in1: 0, in2: 0 };

    /// Build a pair from a signed duty: positive drives `in1`, negative `in2`.
    ///
    /// The magnitude is clamped to `65535`.
    pub fn from_signed(duty: i32) -> Self {
        let magnitude = duty.unsigned_abs().min(MAX_DUTY as u32) as u16;
        if duty > 0 {
            Self {
                in1: magnitude,
                in2: 0,
            }
        } else if duty < 0 {
            Self {
                in1: 0,
                in2: magnitude,
            }
        } else {
            Self::STOPPED
        }
    }

    /// Forward-channel duty.
    #[inline]
    pub fn in1(&self) -> u16 {
        self.in1
    }

    /// Backward-channel duty.
    #[inline]
    pub fn in2(&self) -> u16 {
        self.in2
    }

    /// The pair as one signed duty (`in1 - in2`).
    #[inline]
    pub fn signed(&self) -> i32 {
        self.in1 as i32 - self.in2 as i32
    }

    /// Phase of motion this pair encodes.
    pub fn phase(&self) -> MotorPhase {
        match (self.in1, self.in2) {
            (0, 0) => MotorPhase::Stopped,
            (_, 0) => MotorPhase::Forward,
            _ => MotorPhase::Backward,
        }
    }
}
