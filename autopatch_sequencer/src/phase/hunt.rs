//! Hunt: step toward the cell until the resistance moves off baseline.

use std::sync::Arc;
use std::time::Duration;

use autopatch_common::rig::port::RigError;
use tracing::{info, warn};

use super::{NextPhase, Phase};
use crate::config::SequenceConfig;
use crate::error::FatalError;
use crate::event::Event;
use crate::session::RigSession;

#[derive(Debug)]
pub struct Hunt {
    config: Arc<SequenceConfig>,
    baseline_mohm: Option<f64>,
    displacement_um: f64,
}

impl Hunt {
    pub fn new(config: Arc<SequenceConfig>) -> Self {
        Self {
            config,
            baseline_mohm: None,
            displacement_um: 0.0,
        }
    }

    /// Baseline resistance, once captured [MΩ].
    pub fn baseline_mohm(&self) -> Option<f64> {
        self.baseline_mohm
    }

    /// Accumulated travel magnitude [µm].
    pub fn displacement_um(&self) -> f64 {
        self.displacement_um
    }

    pub(super) fn evaluate(
        &mut self,
        _event: Event,
        _now: Duration,
        rig: &mut RigSession<'_>,
    ) -> Result<NextPhase, RigError> {
        let cfg = self.config.hunt;

        let Some(baseline) = self.baseline_mohm else {
            let baseline = rig.mean_resistance(cfg.baseline_pulses)?;
            info!(
                "Hunt baseline {baseline:.2} MΩ over {} pulses",
                cfg.baseline_pulses
            );
            self.baseline_mohm = Some(baseline);
            return Ok(NextPhase::Unchanged);
        };

        rig.step_axis(cfg.axis, cfg.step_um, cfg.speed)?;
        self.displacement_um += cfg.step_um.abs();
        let reading = rig.resistance()?;

        if reading < cfg.abort_ratio * baseline {
            warn!(
                "Resistance collapsed to {reading:.3} MΩ (baseline {baseline:.2}); tip broken or clogged"
            );
            return Ok(NextPhase::Transition(Phase::abort()));
        }
        if reading > cfg.contact_ratio * baseline {
            info!(
                "Membrane contact at {:.1} µm: {reading:.2} MΩ (baseline {baseline:.2})",
                self.displacement_um
            );
            return Ok(NextPhase::Transition(Phase::seal(Arc::clone(&self.config))));
        }
        if self.displacement_um > cfg.displacement_cap_um {
            return Ok(NextPhase::Fatal(FatalError::DisplacementCapExceeded {
                travelled_um: self.displacement_um,
                cap_um: cfg.displacement_cap_um,
            }));
        }
        Ok(NextPhase::Unchanged)
    }
}
