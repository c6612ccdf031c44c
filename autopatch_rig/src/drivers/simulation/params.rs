//! Simulation parameters, read from `[rig.driver_config.simulation]`.

use autopatch_common::config::ConfigError;
use serde::{Deserialize, Serialize};

/// Injected failure for exercising abort paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultMode {
    /// Healthy pipette, a cell sits below the tip.
    #[default]
    None,
    /// The tip breaks on the first approach step; resistance collapses.
    BrokenTip,
    /// Nothing below the tip; the approach never makes contact.
    NoCell,
}

/// Tunable model of pipette, membrane and noise.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    /// RNG seed; identical seeds replay identical runs.
    pub seed: u64,
    /// Injected fault.
    pub fault: FaultMode,
    /// Open-tip pipette resistance [MΩ].
    pub pipette_mohm: f64,
    /// Resistance of a broken tip [MΩ].
    pub broken_tip_mohm: f64,
    /// Approach travel along `approach_axis` before the tip touches the membrane [µm].
    pub surface_depth_um: f64,
    /// Manipulator axis that approaches the cell.
    pub approach_axis: u8,
    /// Resistance added on membrane contact [MΩ].
    pub contact_mohm: f64,
    /// Seal resistance multiplier per probe while suction is engaged.
    pub seal_growth: f64,
    /// Upper bound for the seal resistance [MΩ].
    pub seal_ceiling_mohm: f64,
    /// Probability that one break-in pulse ruptures the membrane.
    pub break_in_probability: f64,
    /// Regulator target at or below which a pulse can rupture the membrane [kPa].
    pub rupture_pressure_kpa: f64,
    /// Cell input resistance after rupture [MΩ].
    pub cell_mohm: f64,
    /// Access resistance after rupture [MΩ].
    pub access_mohm: f64,
    /// Decay constant of capacitive spikes [samples].
    pub transient_decay_samples: f64,
    /// Test-pulse amplitude [V].
    pub probe_amplitude_v: f64,
    /// Per-sample current noise, relative to the resistive step.
    pub noise_fraction: f64,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            seed: 7,
            fault: FaultMode::None,
            pipette_mohm: 10.0,
            broken_tip_mohm: 0.05,
            surface_depth_um: 20.0,
            approach_axis: 2,
            contact_mohm: 3.0,
            seal_growth: 1.6,
            seal_ceiling_mohm: 5000.0,
            break_in_probability: 0.35,
            rupture_pressure_kpa: -300.0,
            cell_mohm: 300.0,
            access_mohm: 15.0,
            transient_decay_samples: 2.0,
            probe_amplitude_v: 0.05,
            noise_fraction: 0.01,
        }
    }
}

impl SimulationParams {
    /// Validate the parameters.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("pipette_mohm", self.pipette_mohm),
            ("broken_tip_mohm", self.broken_tip_mohm),
            ("surface_depth_um", self.surface_depth_um),
            ("seal_ceiling_mohm", self.seal_ceiling_mohm),
            ("cell_mohm", self.cell_mohm),
            ("access_mohm", self.access_mohm),
            ("transient_decay_samples", self.transient_decay_samples),
            ("probe_amplitude_v", self.probe_amplitude_v),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(field, "must be positive", value));
            }
        }
        if self.contact_mohm < 0.0 {
            return Err(invalid("contact_mohm", "cannot be negative", self.contact_mohm));
        }
        if self.seal_growth < 1.0 {
            return Err(invalid("seal_growth", "must be at least 1", self.seal_growth));
        }
        if !(0.0..=1.0).contains(&self.break_in_probability) {
            return Err(invalid(
                "break_in_probability",
                "must lie in [0, 1]",
                self.break_in_probability,
            ));
        }
        if !(0.0..1.0).contains(&self.noise_fraction) {
            return Err(invalid("noise_fraction", "must lie in [0, 1)", self.noise_fraction));
        }
        Ok(())
    }
}

fn invalid(field: &str, reason: &str, value: f64) -> ConfigError {
    ConfigError::ValidationError(format!("simulation.{field} {reason}, got {value}"))
}
