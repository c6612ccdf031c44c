//! Prelude module for common re-exports.
//!
//! ```rust
//! use autopatch_common::prelude::*;
//! ```

use std::time::Duration;

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, SharedConfig};

// ─── Rig ────────────────────────────────────────────────────────────
pub use crate::rig::config::RigConfig;
pub use crate::rig::port::{RigError, RigFactory, SensorPort};

// ─── Analysis ───────────────────────────────────────────────────────
pub use crate::analysis::{AnalysisError, PulseWaveform};

/// Default controller cycle budget as Duration.
pub const DEFAULT_TICK_INTERVAL: Duration =
    Duration::from_millis(crate::consts::TICK_INTERVAL_MS);
