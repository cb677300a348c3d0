use std::time::{Duration, Instant};

use crate::schedule::Timeout;

/// Collapses bursts of save requests into one write of the latest state.
///
/// Each request pushes the deadline back by the full window, so only the
/// most recent pending write survives.
#[derive(Clone, Copy, Debug)]
pub struct DebouncedSave {
    window: Duration,
    pending: Timeout,
}

impl DebouncedSave {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: Timeout::default(),
        }
    }

    pub fn schedule(&mut self, now: Instant) {
        self.pending.arm(now, self.window);
    }

    /// True exactly once when the window has elapsed with no newer request.
    pub fn take_due(&mut self, now: Instant) -> bool {
        self.pending.fire_if_due(now)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_armed()
    }

    pub fn due(&self) -> Option<Instant> {
        self.pending.due()
    }

    /// Drop the pending write; returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        let was_pending = self.pending.is_armed();
        self.pending.cancel();
        was_pending
    }
}
