//! Lazily started phase timer.

use std::time::Duration;

/// Entry time of a phase, captured on first use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseTimer {
    entry: Option<Duration>,
}

impl PhaseTimer {
    pub const fn new() -> Self {
        Self { entry: None }
    }

    /// Time since entry, starting the timer at `now` if unset.
    pub fn elapsed(&mut self, now: Duration) -> Duration {
        let entry = *self.entry.get_or_insert(now);
        now.saturating_sub(entry)
    }

    /// Move the entry time to `now`.
    pub fn restart(&mut self, now: Duration) {
        self.entry = Some(now);
    }

    pub const fn entry(&self) -> Option<Duration> {
        self.entry
    }

    pub const fn is_started(&self) -> bool {
        self.entry.is_some()
    }
}
