//! Events delivered to the live phase.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One input to a controller cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Event {
    /// Periodic cycle with no external input.
    Tick,
    /// Synthetic event that arms the initial phase.
    Configure,
    /// Operator confirmed the prompt.
    UserYes,
    /// Operator declined the prompt.
    UserNo,
    /// Pipette holder pin entered (whole-cell recording finished).
    PinEntered,
    /// Cleaning station locked the device.
    DeviceLocked,
    /// Stop the run and release the rig.
    Cancel,
}

impl Event {
    /// Canonical kebab-case name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tick => "tick",
            Self::Configure => "configure",
            Self::UserYes => "user-yes",
            Self::UserNo => "user-no",
            Self::PinEntered => "pin-entered",
            Self::DeviceLocked => "device-locked",
            Self::Cancel => "cancel",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognised event name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown event '{0}'")]
pub struct UnknownEvent(pub String);

impl FromStr for Event {
    type Err = UnknownEvent;

    /// Accepts canonical names with `-` or `_` separators.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "tick" => Ok(Self::Tick),
            "configure" => Ok(Self::Configure),
            "user-yes" => Ok(Self::UserYes),
            "user-no" => Ok(Self::UserNo),
            "pin-entered" => Ok(Self::PinEntered),
            "device-locked" => Ok(Self::DeviceLocked),
            "cancel" => Ok(Self::Cancel),
            _ => Err(UnknownEvent(s.to_string())),
        }
    }
}
