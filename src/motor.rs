//! Ramped, direction-aware control of one DC motor.
//!
//! This module provides [`MotorController`], which owns the two PWM inputs of
//! a motor driver (`in1` forward, `in2` backward) and remembers the last duty
//! pair it wrote.
//!
//! # Ramp vs. snap
//!
//! Current spikes are largest when a motor starts, stops or reverses, so only
//! those edges are ramped. Speed changes while already moving in the same
//! direction are written in one step so steering follows the input closely.
//!
//! | Previous phase | Command | Write |
//! |----------------|---------|-------|
//! | Stopped | move | ramp |
//! | moving | deadzone | ramp |
//! | Forward | `< -25` | ramp (reversal) |
//! | Backward | `> 25` | ramp (reversal) |
//! | moving | same direction | snap |
//! | Stopped | deadzone | single zero write |
//!
//! # Example
//!
//! ```rust
//! use f01_rover::{MotorController, MotorPhase, Ramp};
//! use f01_rover::hal::MockPwm;
//!
//! # tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(async {
//! let in1 = MockPwm::new();
//! let in2 = MockPwm::new();
//! let mut motor = MotorController::new(in1.clone(), in2.clone(), 1.0);
//!
//! motor.throttle(80, Ramp::NONE).await.unwrap();
//! assert_eq!(motor.phase(), MotorPhase::Forward);
//! assert_eq!(in1.history(), vec![52428]);
//!
//! motor.throttle(10, Ramp::NONE).await.unwrap(); // deadzone
//! assert_eq!(motor.phase(), MotorPhase::Stopped);
//! # });
//! ```

use crate::duty::{map_speed, DutyPair, MAX_SPEED};
use crate::traits::{MotorPhase, PwmChannel};
use crate::transition::Ramp;

/// Commands strictly inside `(-DEADZONE, DEADZONE)` stop the motor.
pub const DEADZONE: i32 = 25;

/// Controller for one two-input DC motor.
///
/// # Type Parameter
///
/// - `P`: the PWM channel type driving each input ([`PwmChannel`] trait)
///
/// # Invariant
///
/// The recorded duty pair never has both inputs non-zero, including the
/// intermediate frames of a reversal ramp: ramps interpolate the signed duty,
/// which passes through zero.
pub struct MotorController<P: PwmChannel> {
    in1: P,
    in2: P,
    last: DutyPair,
    correction: f32,
}

impl<P: PwmChannel> MotorController<P> {
    /// Create a controller for a motor that is currently stopped.
    ///
    /// `correction` scales every commanded speed before mapping, to match a
    /// faster motor to a slower one. It is fixed for the controller's life.
    pub fn new(in1: P, in2: P, correction: f32) -> Self {
        Self {
            in1,
            in2,
            last: DutyPair::STOPPED,
            correction,
        }
    }

    /// The last duty pair written to the hardware.
    #[inline]
    pub fn last_duty(&self) -> DutyPair {
        self.last
    }

    /// Current phase, derived from the last duty pair.
    #[inline]
    pub fn phase(&self) -> MotorPhase {
        self.last.phase()
    }

    /// The speed correction factor.
    #[inline]
    pub fn correction(&self) -> f32 {
        self.correction
    }

    /// Drive forward at `|speed|` percent.
    ///
    /// Ramped when starting from a stop, snapped otherwise.
    pub async fn forward(&mut self, speed: i32, ramp: Ramp) -> Result<(), P::Error> {
        let duty = map_speed(speed.saturating_abs(), self.correction);
        self.drive(DutyPair::from_signed(duty), ramp).await
    }

    /// Drive backward at `|speed|` percent.
    ///
    /// Ramped when starting from a stop, snapped otherwise.
    pub async fn backward(&mut self, speed: i32, ramp: Ramp) -> Result<(), P::Error> {
        let duty = map_speed(speed.saturating_abs(), self.correction);
        self.drive(DutyPair::from_signed(-duty), ramp).await
    }

    /// Ramp both inputs down to zero.
    pub async fn stop(&mut self, ramp: Ramp) -> Result<(), P::Error> {
        self.ramp_to(DutyPair::STOPPED, ramp).await
    }

    /// Set speed and direction from one signed value in `[-100, 100]`.
    ///
    /// Values in the deadzone `(-25, 25)` stop the motor. Starts, stops and
    /// reversals are ramped; same-direction changes are snapped.
    pub async fn throttle(&mut self, value: i32, ramp: Ramp) -> Result<(), P::Error> {
        let value = value.clamp(-MAX_SPEED, MAX_SPEED);
        let previous = self.phase();

        if value > -DEADZONE && value < DEADZONE {
            return if previous.is_moving() {
                self.ramp_to(DutyPair::STOPPED, ramp).await
            } else {
                self.apply(DutyPair::STOPPED)
            };
        }

        let reversing = (previous == MotorPhase::Forward && value < -DEADZONE)
            || (previous == MotorPhase::Backward && value > DEADZONE);
        let target = DutyPair::from_signed(map_speed(value, self.correction));

        if !previous.is_moving() || reversing {
            log::debug!(
                "[Motor] ramp {} -> {} ({} steps)",
                self.last.signed(),
                target.signed(),
                ramp.steps
            );
            self.ramp_to(target, ramp).await
        } else {
            self.apply(target)
        }
    }

    /// Ramp from a stop, snap while already moving.
    async fn drive(&mut self, target: DutyPair, ramp: Ramp) -> Result<(), P::Error> {
        if self.phase().is_moving() {
            self.apply(target)
        } else {
            self.ramp_to(target, ramp).await
        }
    }

    /// Interpolate from the last pair to `target`, writing every frame.
    ///
    /// Each frame is recorded before sleeping, so a dropped future leaves
    /// `last` matching what the hardware is outputting.
    async fn ramp_to(&mut self, target: DutyPair, ramp: Ramp) -> Result<(), P::Error> {
        if ramp.is_instant() || self.last == target {
            return self.apply(target);
        }

        let delay = ramp.frame_delay();
        for duty in ramp.frames(self.last.signed(), target.signed()) {
            self.apply(DutyPair::from_signed(duty))?;
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    /// Write one pair to the hardware and record it.
    fn apply(&mut self, pair: DutyPair) -> Result<(), P::Error> {
        // Release the input going to zero first so both are never driven
        if pair.in1() == 0 {
            self.in1.set_duty_u16(0)?;
            self.in2.set_duty_u16(pair.in2())?;
        } else {
            self.in2.set_duty_u16(0)?;
            self.in1.set_duty_u16(pair.in1())?;
        }
        self.last = pair;
        Ok(())
    }
}
