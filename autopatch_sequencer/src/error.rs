//! Run-level error types.

use crate::phase::PhaseKind;
use autopatch_common::rig::port::RigError;
use thiserror::Error;

/// Condition that abandons the run outright.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FatalError {
    /// Hunt advanced past its travel budget without touching a cell.
    #[error("hunt travelled {travelled_um:.1} µm without contact (cap {cap_um:.1} µm)")]
    DisplacementCapExceeded { travelled_um: f64, cap_um: f64 },
}

/// Why a run ended in failure.
///
/// Every variant except `Finished` is returned after the rig has been torn
/// down (or teardown has been attempted and logged).
#[derive(Debug, Error)]
pub enum RunError {
    /// A phase reported a fatal condition.
    #[error("fatal error in {phase}: {source}")]
    Fatal {
        phase: PhaseKind,
        source: FatalError,
    },

    /// A rig call failed while a phase was evaluating.
    #[error("rig error in {phase}: {source}")]
    Rig { phase: PhaseKind, source: RigError },

    /// The run ended normally but the rig could not be released.
    #[error("teardown failed: {0}")]
    Teardown(#[source] RigError),

    /// The controller already finished; no further cycles are accepted.
    #[error("controller has already finished")]
    Finished,
}

impl RunError {
    /// Phase that was live when the error occurred.
    pub fn phase(&self) -> Option<PhaseKind> {
        match self {
            Self::Fatal { phase, .. } | Self::Rig { phase, .. } => Some(*phase),
            Self::Teardown(_) | Self::Finished => None,
        }
    }
}
