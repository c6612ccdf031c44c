//! `SensorPort` trait and rig error types.
//!
//! This module defines:
//! - `SensorPort` trait - Measurements and actuation the sequencer relies on
//! - `RigError` enum - Error types for rig operations
//! - `RigFactory` type alias - Factory function type used by registries

use crate::analysis::AnalysisError;
use crate::rig::config::RigConfig;
use std::time::Duration;
use thiserror::Error;

/// Error types for rig operations.
#[derive(Debug, Clone, Error)]
pub enum RigError {
    /// Rig initialization failed
    #[error("Initialization failed: {0}")]
    InitFailed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Instrument communication error
    #[error("Rig communication error: {0}")]
    CommunicationError(String),

    /// Driver not found
    #[error("Driver not found: {0}")]
    DriverNotFound(String),

    /// Acquired waveform could not be analysed
    #[error("Invalid measurement: {0}")]
    InvalidMeasurement(String),

    /// A scripted reading queue ran dry
    #[error("Script exhausted: no more {0}")]
    ScriptExhausted(&'static str),

    /// Operation issued before `init()` or after `release()`
    #[error("Rig not initialized")]
    NotInitialized,
}

impl From<AnalysisError> for RigError {
    fn from(err: AnalysisError) -> Self {
        Self::InvalidMeasurement(err.to_string())
    }
}

/// Factory function type for creating rig instances.
pub type RigFactory = fn() -> Box<dyn SensorPort>;

/// Interface to the physical (or simulated) patch rig.
///
/// All calls are synchronous and may block: a manipulator move with
/// `wait = true` returns only once the axis has settled, a measurement
/// returns once the stimulus pulse has been played and acquired.
///
/// # Lifecycle
///
/// 1. `init()` - Called once before the first measurement
/// 2. measurement / actuation calls - Issued by the sequencer every tick
/// 3. `release()` - Called on teardown; must leave pressure vented and
///    instruments idle
///
/// # Units
///
/// | Quantity | Unit |
/// |----------|------|
/// | resistance | MΩ |
/// | displacement | µm |
/// | pressure | kPa (negative = suction) |
/// | frequency | Hz |
pub trait SensorPort: Send {
    /// Returns the driver's unique identifier (e.g., "simulation").
    fn name(&self) -> &'static str;

    /// Returns the driver's semantic version.
    fn version(&self) -> &'static str;

    /// Initialize the rig.
    ///
    /// # Errors
    /// Return `RigError::InitFailed` if an instrument cannot be brought up.
    fn init(&mut self, config: &RigConfig) -> Result<(), RigError>;

    /// Play one test pulse at `frequency_hz` and return one resistance
    /// magnitude per acquired period.
    fn measure_resistance(&mut self, frequency_hz: f64) -> Result<Vec<f64>, RigError>;

    /// Play one test pulse and report whether the current response shows a
    /// capacitive transient (membrane rupture).
    fn measure_transient(&mut self, frequency_hz: f64) -> Result<bool, RigError>;

    /// Move a manipulator axis by `delta_um`.
    ///
    /// With `wait = true` the call blocks until the move has completed.
    fn move_axis(
        &mut self,
        axis: u8,
        delta_um: f64,
        speed: u8,
        wait: bool,
    ) -> Result<(), RigError>;

    /// Set the regulator target for `channel` [kPa].
    fn apply_pressure(&mut self, kpa: f64, channel: u8) -> Result<(), RigError>;

    /// Vent `channel` to atmosphere.
    fn set_atmosphere(&mut self, channel: u8) -> Result<(), RigError>;

    /// Route `channel` to the pressure regulator.
    fn set_suction(&mut self, channel: u8) -> Result<(), RigError>;

    /// Open `channel` to the regulator for `duration`, then vent it again.
    fn pulse_pressure(&mut self, channel: u8, duration: Duration) -> Result<(), RigError>;

    /// Release every instrument.
    ///
    /// Must be safe to call on a rig that was never initialized.
    fn release(&mut self) -> Result<(), RigError>;
}
