//! Phase state machine.
//!
//! Each phase owns only its own timers and counters. `evaluate` is called
//! once per controller cycle with the cycle's event, the clock reading and
//! a [`RigSession`]; it never blocks on time, it compares elapsed time
//! against thresholds instead.
//!
//! | Phase | Entry (once) | Leaves on |
//! |-------|--------------|-----------|
//! | Capture | holding pressure, capture channel | yes → Hunt, no → Clean |
//! | Hunt | baseline resistance | collapse → Abort, rise → Seal, cap → fatal |
//! | Seal | vent patch channel | gigaseal → BreakIn, timeout → Clean |
//! | BreakIn | vent patch channel | transient → WholeCell, attempts spent → Clean |
//! | WholeCell | none | pin entered → Clean |
//! | Clean | none | device locked → Capture |
//! | Abort | teardown | halt |

mod abort;
mod break_in;
mod capture;
mod hunt;
mod seal;
pub mod timer;
mod waiting;

pub use abort::Abort;
pub use break_in::BreakIn;
pub use capture::Capture;
pub use hunt::Hunt;
pub use seal::Seal;
pub use timer::PhaseTimer;
pub use waiting::{Clean, WholeCell};

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use autopatch_common::rig::port::RigError;
use serde::Serialize;

use crate::config::SequenceConfig;
use crate::error::FatalError;
use crate::event::Event;
use crate::session::RigSession;

/// Identity of a phase, without its state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    Capture,
    Hunt,
    Seal,
    BreakIn,
    WholeCell,
    Clean,
    Abort,
}

impl PhaseKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Capture => "capture",
            Self::Hunt => "hunt",
            Self::Seal => "seal",
            Self::BreakIn => "break_in",
            Self::WholeCell => "whole_cell",
            Self::Clean => "clean",
            Self::Abort => "abort",
        }
    }
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one evaluation.
#[derive(Debug)]
pub enum NextPhase {
    /// Stay in the current phase.
    Unchanged,
    /// Replace the current phase.
    Transition(Phase),
    /// Stop the run; the rig has been torn down.
    Terminal,
    /// Abandon the run.
    Fatal(FatalError),
}

/// The live phase with its state.
#[derive(Debug)]
pub enum Phase {
    Capture(Capture),
    Hunt(Hunt),
    Seal(Seal),
    BreakIn(BreakIn),
    WholeCell(WholeCell),
    Clean(Clean),
    Abort(Abort),
}

impl Phase {
    pub fn capture(config: Arc<SequenceConfig>) -> Self {
        Self::Capture(Capture::new(config))
    }

    pub fn hunt(config: Arc<SequenceConfig>) -> Self {
        Self::Hunt(Hunt::new(config))
    }

    pub fn seal(config: Arc<SequenceConfig>) -> Self {
        Self::Seal(Seal::new(config))
    }

    pub fn break_in(config: Arc<SequenceConfig>) -> Self {
        Self::BreakIn(BreakIn::new(config))
    }

    pub fn whole_cell(config: Arc<SequenceConfig>) -> Self {
        Self::WholeCell(WholeCell::new(config))
    }

    pub fn clean(config: Arc<SequenceConfig>) -> Self {
        Self::Clean(Clean::new(config))
    }

    pub fn abort() -> Self {
        Self::Abort(Abort::new())
    }

    pub const fn kind(&self) -> PhaseKind {
        match self {
            Self::Capture(_) => PhaseKind::Capture,
            Self::Hunt(_) => PhaseKind::Hunt,
            Self::Seal(_) => PhaseKind::Seal,
            Self::BreakIn(_) => PhaseKind::BreakIn,
            Self::WholeCell(_) => PhaseKind::WholeCell,
            Self::Clean(_) => PhaseKind::Clean,
            Self::Abort(_) => PhaseKind::Abort,
        }
    }

    /// Feed one event to the phase.
    ///
    /// # Errors
    /// Only rig failures leave as `Err`; every phase-local outcome,
    /// including the fatal displacement cap, is a [`NextPhase`].
    pub fn evaluate(
        &mut self,
        event: Event,
        now: Duration,
        rig: &mut RigSession<'_>,
    ) -> Result<NextPhase, RigError> {
        match self {
            Self::Capture(p) => p.evaluate(event, now, rig),
            Self::Hunt(p) => p.evaluate(event, now, rig),
            Self::Seal(p) => p.evaluate(event, now, rig),
            Self::BreakIn(p) => p.evaluate(event, now, rig),
            Self::WholeCell(p) => p.evaluate(event, now, rig),
            Self::Clean(p) => p.evaluate(event, now, rig),
            Self::Abort(p) => p.evaluate(event, now, rig),
        }
    }
}
