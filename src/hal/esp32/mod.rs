//! ESP32-C3 SuperMini hardware abstraction layer for the F0.1 robot.
//!
//! # Hardware Configuration
//!
//! - **MCU**: ESP32-C3 SuperMini (RISC-V 160MHz, 4MB Flash)
//! - **Motor Driver**: dual H-bridge, two PWM inputs per motor
//! - **LEDs**: four marker LEDs plus the onboard blue LED as indicator
//!
//! The C3 has six LEDC channels. Four go to the motors and two to the front
//! marker LEDs; the back markers and the indicator run as plain GPIO.
//!
//! # Pin Assignments
//!
//! See the [`pins`] module for GPIO assignments matching the SuperMini layout.

mod pin;
mod pwm;

pub use pin::Esp32Pin;
pub use pwm::{Esp32Pwm, PWM_RESOLUTION};

#[cfg(feature = "wifi")]
mod wifi;
#[cfg(feature = "wifi")]
pub use wifi::{Esp32AccessPoint, Esp32Station};

/// Pin assignments for SuperMini ESP32-C3.
pub mod pins {
    // =========================================================================
    // Motors
    // =========================================================================

    /// Left motor forward input
    pub const LEFT_IN1: i32 = 2;

    /// Left motor backward input
    pub const LEFT_IN2: i32 = 3;

    /// Right motor forward input
    pub const RIGHT_IN1: i32 = 4;

    /// Right motor backward input
    pub const RIGHT_IN2: i32 = 5;

    // =========================================================================
    // LEDs
    // =========================================================================

    /// Front left marker (LEDC)
    pub const LED_FRONT_LEFT: i32 = 6;

    /// Front right marker (LEDC)
    pub const LED_FRONT_RIGHT: i32 = 7;

    /// Back left marker (GPIO)
    pub const LED_BACK_LEFT: i32 = 10;

    /// Back right marker (GPIO)
    pub const LED_BACK_RIGHT: i32 = 20;

    /// Onboard blue LED, active low
    pub const LED_INDICATOR: i32 = 8;
}
