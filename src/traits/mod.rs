//! Trait definitions for hardware abstraction.
//!
//! This module defines the seams that allow f01-rover to:
//! - Run on the ESP32 (LEDC PWM channels, GPIO pins)
//! - Run on desktop against recording mocks
//!
//! # Submodules
//!
//! - `hardware`: PWM channels, binary outputs, motor phase
//!
//! # Hardware Abstraction
//!
//! - [`PwmChannel`]: 16-bit duty output with read-back
//! - [`BinaryOutput`]: on/off output with read-back

pub mod hardware;

pub use hardware::*;
