//! Async services that turn network input into motor and LED output.
//!
//! - `shared`: the latest-command cell and the connection counter
//! - `server`: the two-request HTTP control server
//! - `control`: the poll loop driving motors and marker LEDs
//! - `robot`: composition of all of the above
//!
//! Data flows one way:
//!
//! ```text
//! ControlServer ──publish──▶ CommandCell ──snapshot──▶ ControlLoop ──▶ motors / LEDs
//! ```

pub mod control;
pub mod page;
pub mod robot;
pub mod server;
pub mod shared;

// Re-exports
pub use control::*;
pub use page::*;
pub use robot::*;
pub use server::*;
pub use shared::*;
