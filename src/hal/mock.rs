//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for the hardware traits, enabling
//! development and testing on desktop without a robot attached.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockPwm`] | [`PwmChannel`] | Records every duty write |
//! | [`MockPin`] | [`BinaryOutput`] | Records every level write |
//!
//! Both mocks are cheap handles over shared state: a clone observes the same
//! channel, so a test can keep one handle after moving another into a
//! controller.
//!
//! # Example
//!
//! ```rust
//! use f01_rover::hal::MockPwm;
//! use f01_rover::traits::PwmChannel;
//!
//! let pwm = MockPwm::new();
//! let mut driven = pwm.clone();
//!
//! driven.set_duty_u16(1000).unwrap();
//! driven.set_duty_u16(2000).unwrap();
//!
//! assert_eq!(pwm.duty_u16(), 2000);
//! assert_eq!(pwm.history(), vec![1000, 2000]);
//! ```
//!
//! [`PwmChannel`]: crate::traits::PwmChannel
//! [`BinaryOutput`]: crate::traits::BinaryOutput

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::traits::{BinaryOutput, PwmChannel};

/// Error returned by a mock configured to fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MockError;

impl fmt::Display for MockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("mock hardware write failed")
    }
}

impl std::error::Error for MockError {}

fn lock<T>(state: &Mutex<T>) -> MutexGuard<'_, T> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// PWM
// ============================================================================

#[derive(Debug, Default)]
struct PwmState {
    duty: u16,
    history: Vec<u16>,
    failing: bool,
}

/// Mock PWM channel.
///
/// Records every successful write in order. Use [`MockPwm::set_failing`] to
/// make subsequent writes return [`MockError`].
#[derive(Clone, Debug, Default)]
pub struct MockPwm {
    state: Arc<Mutex<PwmState>>,
}

impl MockPwm {
    /// Creates a new channel at zero duty.
    pub fn new() -> Self {
        Self::default()
    }

    /// All duty values written so far, oldest first.
    pub fn history(&self) -> Vec<u16> {
        lock(&self.state).history.clone()
    }

    /// Number of writes so far.
    pub fn write_count(&self) -> usize {
        lock(&self.state).history.len()
    }

    /// Forget recorded writes, keeping the current duty.
    pub fn clear_history(&self) {
        lock(&self.state).history.clear();
    }

    /// Make writes fail (`true`) or succeed again (`false`).
    pub fn set_failing(&self, failing: bool) {
        lock(&self.state).failing = failing;
    }
}

impl PwmChannel for MockPwm {
    type Error = MockError;

    fn set_duty_u16(&mut self, duty: u16) -> Result<(), MockError> {
        let mut state = lock(&self.state);
        if state.failing {
            return Err(MockError);
        }
        state.duty = duty;
        state.history.push(duty);
        Ok(())
    }

    fn duty_u16(&self) -> u16 {
        lock(&self.state).duty
    }
}

// ============================================================================
// Binary output
// ============================================================================

#[derive(Debug, Default)]
struct PinState {
    level: bool,
    history: Vec<bool>,
}

/// Mock on/off output.
#[derive(Clone, Debug, Default)]
pub struct MockPin {
    state: Arc<Mutex<PinState>>,
}

impl MockPin {
    /// Creates a new pin driven low.
    pub fn new() -> Self {
        Self::default()
    }

    /// All levels written so far, oldest first.
    pub fn history(&self) -> Vec<bool> {
        lock(&self.state).history.clone()
    }

    /// Number of writes so far.
    pub fn write_count(&self) -> usize {
        lock(&self.state).history.len()
    }
}

impl BinaryOutput for MockPin {
    type Error = MockError;

    fn set_level(&mut self, high: bool) -> Result<(), MockError> {
        let mut state = lock(&self.state);
        state.level = high;
        state.history.push(high);
        Ok(())
    }

    fn level(&self) -> bool {
        lock(&self.state).level
    }
}
