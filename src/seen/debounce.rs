//! Trailing debounce for background writes.
//!
//! The host drives the scheduler from its own loop: every mutation calls
//! [`FlushScheduler::schedule_at`], which pushes the deadline out by the quiet
//! window, and every tick asks [`FlushScheduler::is_due`]. Only the state at
//! the moment of the flush is written; intermediate states are never persisted.

use std::time::{Duration, Instant};

/// Default quiet window before a flush.
pub const DEFAULT_FLUSH_DELAY: Duration = Duration::from_millis(300);

/// Last-write-wins flush timer.
#[derive(Debug, Clone)]
pub struct FlushScheduler {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Default for FlushScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_FLUSH_DELAY)
    }
}

impl FlushScheduler {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Record a write at `now`, restarting the quiet window.
    pub fn schedule_at(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// A flush is pending and its quiet window has elapsed.
    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|d| now >= d)
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Time left until the pending flush, if any.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(now))
    }

    /// Forget the pending flush (after it ran).
    pub fn clear(&mut self) {
        self.deadline = None;
    }
}
