//! Live-connection presence tracking.
//!
//! A single process-wide counter, mutated only inside the connect/disconnect
//! transitions in the WebSocket lifecycle. The caller broadcasts the returned
//! count to all live connections after each mutation.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Process-wide presence counter with exactly two mutation paths.
#[derive(Debug, Default)]
pub struct PresenceTracker {
    count: AtomicUsize,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment on connect-complete. Returns the new count.
    pub fn connect(&self) -> usize {
        self.count.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Decrement on disconnect-complete. Returns the new count.
    ///
    /// Saturates at zero; the counter is never negative.
    pub fn disconnect(&self) -> usize {
        let mut current = self.count.load(Ordering::Relaxed);
        loop {
            let next = current.saturating_sub(1);
            match self.count.compare_exchange_weak(
                current,
                next,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return next,
                Err(actual) => current = actual,
            }
        }
    }

    /// Current live count.
    pub fn current(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }
}
