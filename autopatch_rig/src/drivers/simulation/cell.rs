//! Pipette and membrane model.
//!
//! The model tracks approach travel, patch-channel pressure and membrane
//! state, and turns them into a [`ResponseShape`] for each probe.

use super::params::{FaultMode, SimulationParams};
use super::waveform::ResponseShape;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tracing::{debug, info};

/// Membrane state under the pipette tip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembraneState {
    /// Tip in the bath, no contact.
    Free,
    /// Tip pressed against the membrane; seal resistance grows under suction.
    Contact,
    /// Membrane ruptured under the tip; whole-cell access.
    Ruptured,
    /// Tip broken; resistance has collapsed.
    TipBroken,
}

/// Pressure state of the patch channel.
#[derive(Debug, Clone, Copy, Default)]
struct PatchLine {
    target_kpa: f64,
    routed: bool,
}

impl PatchLine {
    fn suction_engaged(&self) -> bool {
        self.routed && self.target_kpa < 0.0
    }
}

/// Seeded pipette/cell model.
pub struct CellModel {
    params: SimulationParams,
    patch_channel: u8,
    rng: StdRng,
    travel_um: f64,
    state: MembraneState,
    seal_mohm: f64,
    line: PatchLine,
}

impl CellModel {
    /// Build a model for a pipette fed by `patch_channel`.
    pub fn new(params: SimulationParams, patch_channel: u8) -> Self {
        Self {
            rng: StdRng::seed_from_u64(params.seed),
            seal_mohm: params.pipette_mohm,
            params,
            patch_channel,
            travel_um: 0.0,
            state: MembraneState::Free,
            line: PatchLine::default(),
        }
    }

    /// Current membrane state.
    pub fn state(&self) -> MembraneState {
        self.state
    }

    /// Approach travel so far [µm].
    pub fn travel_um(&self) -> f64 {
        self.travel_um
    }

    /// Current seal resistance [MΩ].
    pub fn seal_mohm(&self) -> f64 {
        self.seal_mohm
    }

    /// Random source shared with waveform synthesis.
    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Test-pulse amplitude [V].
    pub fn probe_amplitude_v(&self) -> f64 {
        self.params.probe_amplitude_v
    }

    /// Apply a manipulator move.
    pub fn on_move(&mut self, axis: u8, delta_um: f64) {
        if axis != self.params.approach_axis {
            return;
        }
        // Approach runs toward negative positions.
        self.travel_um += -delta_um;

        if self.params.fault == FaultMode::BrokenTip && self.state != MembraneState::TipBroken {
            info!("Simulated tip broke after {:.1} µm", self.travel_um);
            self.state = MembraneState::TipBroken;
            return;
        }

        if self.state == MembraneState::Free
            && self.params.fault != FaultMode::NoCell
            && self.travel_um >= self.params.surface_depth_um
        {
            self.seal_mohm = self.params.pipette_mohm + self.params.contact_mohm;
            self.state = MembraneState::Contact;
            info!(
                "Simulated membrane contact at {:.1} µm ({:.1} MΩ)",
                self.travel_um, self.seal_mohm
            );
        }
    }

    /// Set the regulator target for `channel`.
    pub fn on_pressure(&mut self, channel: u8, kpa: f64) {
        if channel == self.patch_channel {
            self.line.target_kpa = kpa;
        }
    }

    /// Route `channel` to the regulator.
    pub fn on_suction(&mut self, channel: u8) {
        if channel == self.patch_channel {
            self.line.routed = true;
        }
    }

    /// Vent `channel`.
    pub fn on_atmosphere(&mut self, channel: u8) {
        if channel == self.patch_channel {
            self.line.routed = false;
        }
    }

    /// Play a break-in pulse.
    pub fn on_pulse(&mut self, channel: u8, duration: Duration) {
        if channel != self.patch_channel || self.state != MembraneState::Contact {
            return;
        }
        if self.line.target_kpa > self.params.rupture_pressure_kpa {
            debug!(
                "Pulse at {:.0} kPa too weak to rupture (needs ≤ {:.0})",
                self.line.target_kpa, self.params.rupture_pressure_kpa
            );
            return;
        }
        if self.rng.gen_bool(self.params.break_in_probability) {
            info!("Simulated membrane ruptured ({} ms pulse)", duration.as_millis());
            self.state = MembraneState::Ruptured;
        }
    }

    /// Electrical picture for the next probe.
    ///
    /// Each probe taken while suction holds the membrane grows the seal.
    pub fn next_shape(&mut self) -> ResponseShape {
        if self.state == MembraneState::Contact && self.line.suction_engaged() {
            self.seal_mohm = (self.seal_mohm * self.params.seal_growth)
                .min(self.params.seal_ceiling_mohm);
        }

        let (resistance_mohm, access_mohm) = match self.state {
            MembraneState::Free => (self.params.pipette_mohm, None),
            MembraneState::Contact => (self.seal_mohm, None),
            MembraneState::Ruptured => (self.params.cell_mohm, Some(self.params.access_mohm)),
            MembraneState::TipBroken => (self.params.broken_tip_mohm, None),
        };

        ResponseShape {
            resistance_mohm,
            access_mohm,
            decay_samples: self.params.transient_decay_samples,
            noise_fraction: self.params.noise_fraction,
        }
    }
}
