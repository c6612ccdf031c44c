//! Monotonic time sources.
//!
//! Phases never read the wall clock themselves; the controller samples a
//! [`Clock`] once per cycle and passes the reading down. Tests drive a
//! [`ManualClock`] instead of sleeping.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Source of monotonic time since an arbitrary epoch.
pub trait Clock: Send {
    fn now(&self) -> Duration;
}

/// Real time since construction.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }
}

/// Hand-driven clock; clones share the same reading.
///
/// With a nonzero step, every `now()` call first advances the reading by
/// that step, so each controller cycle sees time move forward.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    micros: Arc<AtomicU64>,
    step_micros: u64,
}

impl ManualClock {
    /// Clock frozen at zero until advanced.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock that advances by `step` on every reading.
    pub fn stepping(step: Duration) -> Self {
        Self {
            micros: Arc::default(),
            step_micros: to_micros(step),
        }
    }

    pub fn set(&self, at: Duration) {
        self.micros.store(to_micros(at), Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.micros.fetch_add(to_micros(by), Ordering::SeqCst);
    }

    /// Current reading without stepping.
    pub fn peek(&self) -> Duration {
        Duration::from_micros(self.micros.load(Ordering::SeqCst))
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        let micros = if self.step_micros == 0 {
            self.micros.load(Ordering::SeqCst)
        } else {
            self.micros.fetch_add(self.step_micros, Ordering::SeqCst) + self.step_micros
        };
        Duration::from_micros(micros)
    }
}

fn to_micros(d: Duration) -> u64 {
    u64::try_from(d.as_micros()).unwrap_or(u64::MAX)
}
