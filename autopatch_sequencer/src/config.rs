//! Sequence and controller configuration with validation.
//!
//! `autopatch.toml` layout:
//!
//! ```toml
//! [shared]
//! log_level = "info"
//!
//! [rig]
//! driver = "simulation"
//!
//! [sequence.hunt]
//! displacement_cap_um = 120.0
//!
//! [sequence.seal]
//! threshold_mohm = 1500.0
//!
//! [controller]
//! tick_interval_ms = 100
//! ```
//!
//! Every section and field is optional; omitted values take the defaults
//! from `autopatch_common::consts`.

use std::path::Path;
use std::time::Duration;

use autopatch_common::config::{ConfigError, ConfigLoader, SharedConfig};
use autopatch_common::consts::*;
use autopatch_common::rig::config::RigConfig;
use serde::{Deserialize, Serialize};

// ─── Phase Sections ─────────────────────────────────────────────────

/// Capture pipette timing and pressures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Holding pressure issued on entry [kPa].
    pub baseline_kpa: f64,
    /// Suction engaged after `suction_delay_s` [kPa].
    pub suction_kpa: f64,
    /// [s]
    pub suction_delay_s: f64,
    /// Time before the operator is asked whether a cell was captured [s].
    pub decision_delay_s: f64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            baseline_kpa: CAPTURE_BASELINE_KPA,
            suction_kpa: CAPTURE_SUCTION_KPA,
            suction_delay_s: CAPTURE_SUCTION_DELAY_S,
            decision_delay_s: CAPTURE_DECISION_DELAY_S,
        }
    }
}

impl CaptureConfig {
    pub fn suction_delay(&self) -> Duration {
        Duration::from_secs_f64(self.suction_delay_s)
    }

    pub fn decision_delay(&self) -> Duration {
        Duration::from_secs_f64(self.decision_delay_s)
    }
}

/// Approach toward the cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HuntConfig {
    /// Manipulator axis stepped each tick.
    pub axis: u8,
    /// Signed step per tick [µm].
    pub step_um: f64,
    /// Manipulator speed preset.
    pub speed: u8,
    /// Accumulated travel beyond which the run is abandoned [µm].
    pub displacement_cap_um: f64,
    /// Probe pulses averaged into the baseline.
    pub baseline_pulses: u32,
    /// Below `abort_ratio × baseline` the tip is considered broken.
    pub abort_ratio: f64,
    /// Above `contact_ratio × baseline` the membrane is touched.
    pub contact_ratio: f64,
}

impl Default for HuntConfig {
    fn default() -> Self {
        Self {
            axis: HUNT_AXIS,
            step_um: HUNT_STEP_UM,
            speed: HUNT_SPEED,
            displacement_cap_um: HUNT_DISPLACEMENT_CAP_UM,
            baseline_pulses: HUNT_BASELINE_PULSES,
            abort_ratio: HUNT_ABORT_RATIO,
            contact_ratio: HUNT_CONTACT_RATIO,
        }
    }
}

/// Gigaseal formation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SealConfig {
    /// Delay between venting and engaging suction [s].
    pub suction_delay_s: f64,
    /// [kPa]
    pub suction_kpa: f64,
    /// Resistance that counts as a gigaseal [MΩ].
    pub threshold_mohm: f64,
    /// Time allowed after suction engages [s].
    pub timeout_s: f64,
}

impl Default for SealConfig {
    fn default() -> Self {
        Self {
            suction_delay_s: SEAL_SUCTION_DELAY_S,
            suction_kpa: SEAL_SUCTION_KPA,
            threshold_mohm: SEAL_THRESHOLD_MOHM,
            timeout_s: SEAL_TIMEOUT_S,
        }
    }
}

impl SealConfig {
    pub fn suction_delay(&self) -> Duration {
        Duration::from_secs_f64(self.suction_delay_s)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_s)
    }
}

/// Membrane rupture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakInConfig {
    /// Delay between venting and applying break-in pressure [s].
    pub pressure_delay_s: f64,
    /// [kPa]
    pub pressure_kpa: f64,
    /// Length of each break-in pulse [ms].
    pub pulse_ms: u64,
    /// Missed attempts tolerated before the cell is given up.
    pub max_attempts: u32,
}

impl Default for BreakInConfig {
    fn default() -> Self {
        Self {
            pressure_delay_s: BREAK_IN_PRESSURE_DELAY_S,
            pressure_kpa: BREAK_IN_PRESSURE_KPA,
            pulse_ms: BREAK_IN_PULSE_MS,
            max_attempts: BREAK_IN_MAX_ATTEMPTS,
        }
    }
}

impl BreakInConfig {
    pub fn pressure_delay(&self) -> Duration {
        Duration::from_secs_f64(self.pressure_delay_s)
    }

    pub fn pulse(&self) -> Duration {
        Duration::from_millis(self.pulse_ms)
    }
}

/// Thresholds and timings for every phase.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    pub capture: CaptureConfig,
    pub hunt: HuntConfig,
    pub seal: SealConfig,
    pub break_in: BreakInConfig,
}

impl SequenceConfig {
    /// Validate parameter bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let durations = [
            ("capture.suction_delay_s", self.capture.suction_delay_s),
            ("capture.decision_delay_s", self.capture.decision_delay_s),
            ("seal.suction_delay_s", self.seal.suction_delay_s),
            ("seal.timeout_s", self.seal.timeout_s),
            ("break_in.pressure_delay_s", self.break_in.pressure_delay_s),
        ];
        for (field, secs) in durations {
            if !(secs.is_finite() && secs > 0.0) {
                return Err(invalid(format!("sequence.{field} must be positive, got {secs}")));
            }
        }

        let hunt = &self.hunt;
        if !(hunt.step_um.is_finite() && hunt.step_um != 0.0) {
            return Err(invalid(format!(
                "sequence.hunt.step_um must be nonzero, got {}",
                hunt.step_um
            )));
        }
        if !(hunt.displacement_cap_um > hunt.step_um.abs()) {
            return Err(invalid(format!(
                "sequence.hunt.displacement_cap_um ({}) must exceed |step_um| ({})",
                hunt.displacement_cap_um,
                hunt.step_um.abs()
            )));
        }
        if hunt.baseline_pulses == 0 {
            return Err(invalid("sequence.hunt.baseline_pulses must be at least 1".into()));
        }
        if !(0.0 < hunt.abort_ratio && hunt.abort_ratio < 1.0 && hunt.contact_ratio > 1.0) {
            return Err(invalid(format!(
                "sequence.hunt ratios must satisfy 0 < abort_ratio ({}) < 1 < contact_ratio ({})",
                hunt.abort_ratio, hunt.contact_ratio
            )));
        }

        if !(self.seal.threshold_mohm.is_finite() && self.seal.threshold_mohm > 0.0) {
            return Err(invalid(format!(
                "sequence.seal.threshold_mohm must be positive, got {}",
                self.seal.threshold_mohm
            )));
        }

        if self.break_in.pulse_ms == 0 {
            return Err(invalid("sequence.break_in.pulse_ms must be positive".into()));
        }
        if self.break_in.max_attempts == 0 {
            return Err(invalid("sequence.break_in.max_attempts must be at least 1".into()));
        }
        Ok(())
    }
}

// ─── Controller ─────────────────────────────────────────────────────

fn default_tick_interval_ms() -> u64 {
    TICK_INTERVAL_MS
}

/// Controller loop settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// How long `run()` waits for an external event before ticking [ms].
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Stop after this many cycles. Unlimited when absent.
    #[serde(default)]
    pub max_ticks: Option<u64>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: TICK_INTERVAL_MS,
            max_ticks: None,
        }
    }
}

impl ControllerConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(invalid("controller.tick_interval_ms must be positive".into()));
        }
        if self.max_ticks == Some(0) {
            return Err(invalid("controller.max_ticks must be at least 1".into()));
        }
        Ok(())
    }
}

// ─── Top Level ──────────────────────────────────────────────────────

/// Complete `autopatch.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AutopatchConfig {
    #[serde(default)]
    pub shared: SharedConfig,
    #[serde(default)]
    pub rig: RigConfig,
    #[serde(default)]
    pub sequence: SequenceConfig,
    #[serde(default)]
    pub controller: ControllerConfig,
}

impl AutopatchConfig {
    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.rig.validate()?;
        self.sequence.validate()?;
        self.controller.validate()
    }
}

/// Load and validate `autopatch.toml`.
pub fn load_config(path: &Path) -> Result<AutopatchConfig, ConfigError> {
    let config = AutopatchConfig::load(path)?;
    config.validate()?;
    Ok(config)
}

fn invalid(message: String) -> ConfigError {
    ConfigError::ValidationError(message)
}
