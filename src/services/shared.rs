//! State shared between the control server, the control loop and the
//! connection indicator.
//!
//! - [`CommandCell`] holds the latest commanded speeds. Writers overwrite,
//!   readers take a copy; commands between two reads are dropped.
//! - [`ConnectionCounter`] bounds concurrent connections. A slot is held by a
//!   [`ConnectionGuard`] and given back when the guard is dropped, whichever
//!   way the connection task ends.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use f01_rover::services::{Command, CommandCell, ConnectionCounter};
//!
//! let cell = CommandCell::new();
//! cell.publish(Command { left: 60, right: 60 });
//! assert_eq!(cell.snapshot().left, 60);
//!
//! let counter = Arc::new(ConnectionCounter::new(2));
//! let a = counter.try_acquire().unwrap();
//! let _b = counter.try_acquire().unwrap();
//! assert!(counter.try_acquire().is_none());
//! drop(a);
//! assert_eq!(counter.active(), 1);
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

// ============================================================================
// Command
// ============================================================================

/// Commanded speeds for both wheels, each in `[-100, 100]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Command {
    /// Left wheel speed, positive is forward
    pub left: i32,
    /// Right wheel speed, positive is forward
    pub right: i32,
}

impl Command {
    /// Both wheels stopped.
    pub const STOP: Command = Command { left: 0, right: 0 };

    /// Create a command.
    #[inline]
    pub const fn new(left: i32, right: i32) -> Self {
        Self { left, right }
    }
}

// ============================================================================
// Command Cell
// ============================================================================

/// Single-slot, overwrite-on-write holder of the latest [`Command`].
///
/// Uses a `Mutex` rather than atomics so both sides are always read together.
/// The lock is only held for a copy, never across an await. A poisoned lock
/// is recovered, since a `Command` can't be left half-written.
#[derive(Debug, Default)]
pub struct CommandCell {
    latest: Mutex<Command>,
}

impl CommandCell {
    /// Create a cell holding [`Command::STOP`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the held command.
    pub fn publish(&self, cmd: Command) {
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner) = cmd;
    }

    /// Copy of the held command.
    pub fn snapshot(&self) -> Command {
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Read-modify-write under one lock. Returns the new command.
    pub fn update<F>(&self, f: F) -> Command
    where
        F: FnOnce(Command) -> Command,
    {
        let mut guard = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = f(*guard);
        *guard
    }
}

// ============================================================================
// Connection Counter
// ============================================================================

/// Bounded count of open client connections.
#[derive(Debug)]
pub struct ConnectionCounter {
    active: AtomicUsize,
    max: usize,
}

impl ConnectionCounter {
    /// Create a counter allowing `max` connections at once.
    pub fn new(max: usize) -> Self {
        Self {
            active: AtomicUsize::new(0),
            max,
        }
    }

    /// Take a slot, or `None` if all `max` are in use.
    pub fn try_acquire(self: &Arc<Self>) -> Option<ConnectionGuard> {
        self.active
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < self.max).then_some(n + 1)
            })
            .ok()
            .map(|_| ConnectionGuard {
                counter: Arc::clone(self),
            })
    }

    /// Connections currently open.
    #[inline]
    pub fn active(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    /// The connection cap.
    #[inline]
    pub fn max(&self) -> usize {
        self.max
    }
}

/// One held connection slot. Dropping it frees the slot.
#[derive(Debug)]
pub struct ConnectionGuard {
    counter: Arc<ConnectionCounter>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.counter.active.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // CommandCell tests
    // ========================================================================

    #[test]
    fn cell_starts_stopped() {
        assert_eq!(CommandCell::new().snapshot(), Command::STOP);
    }

    #[test]
    fn cell_overwrites() {
        let cell = CommandCell::new();
        cell.publish(Command::new(10, 20));
        cell.publish(Command::new(-30, 40));
        assert_eq!(cell.snapshot(), Command::new(-30, 40));
    }

    #[test]
    fn cell_update_sees_current() {
        let cell = CommandCell::new();
        cell.publish(Command::new(50, 0));

        let new = cell.update(|c| Command { right: 70, ..c });

        assert_eq!(new, Command::new(50, 70));
        assert_eq!(cell.snapshot(), new);
    }

    #[test]
    fn cell_survives_poisoning() {
        let cell = Arc::new(CommandCell::new());
        let poisoner = Arc::clone(&cell);

        let _ = std::thread::spawn(move || {
            poisoner.update(|_| panic!("writer died"));
        })
        .join();

        cell.publish(Command::new(1, 2));
        assert_eq!(cell.snapshot(), Command::new(1, 2));
    }

    // ========================================================================
    // ConnectionCounter tests
    // ========================================================================

    #[test]
    fn counter_bounded() {
        let counter = Arc::new(ConnectionCounter::new(2));

        let a = counter.try_acquire();
        let b = counter.try_acquire();
        let c = counter.try_acquire();

        assert!(a.is_some() && b.is_some());
        assert!(c.is_none());
        assert_eq!(counter.active(), 2);
    }

    #[test]
    fn guard_drop_frees_slot() {
        let counter = Arc::new(ConnectionCounter::new(1));

        let guard = counter.try_acquire().unwrap();
        assert!(counter.try_acquire().is_none());

        drop(guard);
        assert_eq!(counter.active(), 0);
        assert!(counter.try_acquire().is_some());
    }

    #[test]
    fn counter_concurrent_never_exceeds_max() {
        use std::thread;

        let counter = Arc::new(ConnectionCounter::new(2));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let counter = Arc::clone(&counter);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        if let Some(guard) = counter.try_acquire() {
                            assert!(counter.active() <= 2);
                            drop(guard);
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(counter.active(), 0);
    }

    #[test]
    fn zero_capacity_rejects_all() {
        let counter = Arc::new(ConnectionCounter::new(0));
        assert!(counter.try_acquire().is_none());
        assert_eq!(counter.max(), 0);
    }
}
