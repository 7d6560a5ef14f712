//! # f01-rover
//!
//! Firmware for F0.1, a small two-motor wheeled robot driven from a phone
//! over a WiFi access point it hosts itself.
//!
//! ## Features
//!
//! - **Motor control**: signed speed to PWM duty with per-motor correction,
//!   ramped starts, stops and reversals, snapped steering changes
//! - **LEDs**: instant or smoothed brightness, blinking, automatic fallback to
//!   on/off when no PWM channel is free
//! - **Control server**: a two-request HTTP endpoint with a connection cap
//! - **Control loop**: polls the latest command, drives motors and marker
//!   LEDs only when something changed
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `traits` - PWM and on/off output abstractions
//! - `duty` - speed to duty mapping and the per-motor duty pair
//! - `transition` - ramp and fade schedules
//! - `motor` - the ramp/snap motor state machine
//! - `led` - the LED driver
//! - `services` - control server, control loop and their composition
//! - `hal` - concrete implementations (mock for testing, esp32 for hardware)
//!
//! ## Example
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
//! // Start from rest: three-frame ramp
//! motor.throttle(60, Ramp::DEFAULT).await.unwrap();
//! assert_eq!(in1.history().len(), 3);
//!
//! // Reverse: ramps back through zero
//! motor.throttle(-60, Ramp::DEFAULT).await.unwrap();
//! assert_eq!(motor.phase(), MotorPhase::Backward);
//! # });
//! ```

#![warn(missing_docs)]

/// Shared configuration for desktop and ESP32.
pub mod config;
/// Speed to duty mapping.
pub mod duty;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// LED driver with smoothing and blinking.
pub mod led;
/// Ramp/snap controller for one DC motor.
pub mod motor;
/// Request line and query parsing for the control server.
pub mod parsing;
/// Control server, control loop and robot composition.
pub mod services;
/// Core traits for hardware abstraction.
pub mod traits;
/// Ramp and fade schedules.
pub mod transition;

// Re-exports for convenience
pub use duty::{map_speed, DutyPair};
pub use led::{LedDriver, LedOutput};
pub use motor::MotorController;
pub use services::{Command, CommandCell, ControlLoop, ControlServer, Robot, RobotHardware};
pub use traits::{BinaryOutput, MotorPhase, PwmChannel};
pub use transition::Ramp;

// Config re-exports
pub use config::{
    AccessPointConfig, Config, DriveConfig, LedConfig, LoopConfig, ServerConfig, StationConfig,
    WifiMode,
};
