//! Simulation driver implementation.
//!
//! `SimulatedRig` implements `SensorPort` on top of [`CellModel`]. Every
//! probe synthesises a full stimulus/response waveform and runs it through
//! `autopatch_common::analysis`, so the analysis path is exercised exactly
//! as on a physical rig.

use super::cell::{CellModel, MembraneState};
use super::params::SimulationParams;
use super::waveform::synthesize_response;
use super::DRIVER_NAME;
use autopatch_common::analysis::{square_pulse, PulseWaveform};
use autopatch_common::consts::TRANSIENT_FLOOR_A;
use autopatch_common::rig::config::RigConfig;
use autopatch_common::rig::port::{RigError, SensorPort};
use std::time::Duration;
use tracing::{debug, info};

/// Simulated patch rig.
pub struct SimulatedRig {
    name: &'static str,
    version: &'static str,
    model: Option<CellModel>,
    probes: u64,
}

impl SimulatedRig {
    /// Create an uninitialized simulation rig.
    pub fn new() -> Self {
        Self {
            name: DRIVER_NAME,
            version: env!("CARGO_PKG_VERSION"),
            model: None,
            probes: 0,
        }
    }

    /// Membrane state, or `None` before `init()`.
    pub fn membrane(&self) -> Option<MembraneState> {
        self.model.as_ref().map(CellModel::state)
    }

    /// Number of probe pulses played so far.
    pub fn probes(&self) -> u64 {
        self.probes
    }

    fn model(&mut self) -> Result<&mut CellModel, RigError> {
        self.model.as_mut().ok_or(RigError::NotInitialized)
    }

    fn probe(&mut self, frequency_hz: f64) -> Result<PulseWaveform, RigError> {
        let model = self.model.as_mut().ok_or(RigError::NotInitialized)?;
        let command = square_pulse(model.probe_amplitude_v(), 0.0, frequency_hz);
        let shape = model.next_shape();
        let response = synthesize_response(&command, &shape, model.rng());
        self.probes += 1;
        Ok(PulseWaveform::new(command, response)?)
    }
}

impl Default for SimulatedRig {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for SimulatedRig {
    fn name(&self) -> &'static str {
        self.name
    }

    fn version(&self) -> &'static str {
        self.version
    }

    fn init(&mut self, config: &RigConfig) -> Result<(), RigError> {
        let params: SimulationParams = config
            .driver_section(DRIVER_NAME)
            .map_err(|e| RigError::ConfigError(e.to_string()))?;
        params
            .validate()
            .map_err(|e| RigError::ConfigError(e.to_string()))?;

        info!(
            "Initializing simulation rig: seed={}, fault={:?}, pipette={:.1} MΩ, patch channel {}",
            params.seed, params.fault, params.pipette_mohm, config.patch_channel
        );
        self.model = Some(CellModel::new(params, config.patch_channel));
        self.probes = 0;
        Ok(())
    }

    fn measure_resistance(&mut self, frequency_hz: f64) -> Result<Vec<f64>, RigError> {
        let readings = self.probe(frequency_hz)?.resistance(1)?;
        debug!("Simulated resistance: {readings:.2?} MΩ");
        Ok(readings)
    }

    fn measure_transient(&mut self, frequency_hz: f64) -> Result<bool, RigError> {
        Ok(self.probe(frequency_hz)?.has_transient(TRANSIENT_FLOOR_A)?)
    }

    fn move_axis(
        &mut self,
        axis: u8,
        delta_um: f64,
        speed: u8,
        wait: bool,
    ) -> Result<(), RigError> {
        debug!("Simulated move: axis {axis} by {delta_um:+.1} µm (speed {speed}, wait {wait})");
        self.model()?.on_move(axis, delta_um);
        Ok(())
    }

    fn apply_pressure(&mut self, kpa: f64, channel: u8) -> Result<(), RigError> {
        debug!("Simulated regulator: channel {channel} → {kpa:.0} kPa");
        self.model()?.on_pressure(channel, kpa);
        Ok(())
    }

    fn set_atmosphere(&mut self, channel: u8) -> Result<(), RigError> {
        debug!("Simulated vent: channel {channel}");
        self.model()?.on_atmosphere(channel);
        Ok(())
    }

    fn set_suction(&mut self, channel: u8) -> Result<(), RigError> {
        debug!("Simulated route to regulator: channel {channel}");
        self.model()?.on_suction(channel);
        Ok(())
    }

    fn pulse_pressure(&mut self, channel: u8, duration: Duration) -> Result<(), RigError> {
        self.model()?.on_pulse(channel, duration);
        Ok(())
    }

    fn release(&mut self) -> Result<(), RigError> {
        if let Some(model) = self.model.take() {
            info!(
                "Simulation rig released after {} probes (travel {:.1} µm, membrane {:?})",
                self.probes,
                model.travel_um(),
                model.state()
            );
        }
        Ok(())
    }
}
