//! Seal: suction on the patch pipette until a gigaseal forms.

use std::sync::Arc;
use std::time::Duration;

use autopatch_common::rig::port::RigError;
use tracing::{debug, info, warn};

use super::timer::PhaseTimer;
use super::{NextPhase, Phase};
use crate::config::SequenceConfig;
use crate::event::Event;
use crate::session::RigSession;

#[derive(Debug)]
pub struct Seal {
    config: Arc<SequenceConfig>,
    timer: PhaseTimer,
    configured: bool,
    suction_applied: bool,
}

impl Seal {
    pub fn new(config: Arc<SequenceConfig>) -> Self {
        Self {
            config,
            timer: PhaseTimer::new(),
            configured: false,
            suction_applied: false,
        }
    }

    pub fn suction_applied(&self) -> bool {
        self.suction_applied
    }

    /// Entry time, or suction time once suction is engaged.
    pub fn timer(&self) -> PhaseTimer {
        self.timer
    }

    pub(super) fn evaluate(
        &mut self,
        _event: Event,
        now: Duration,
        rig: &mut RigSession<'_>,
    ) -> Result<NextPhase, RigError> {
        let cfg = self.config.seal;
        let channel = rig.patch_channel();
        let elapsed = self.timer.elapsed(now);

        if !self.configured {
            rig.vent(channel)?;
            self.configured = true;
            debug!("Seal: channel {channel} vented");
            return Ok(NextPhase::Unchanged);
        }

        if !self.suction_applied {
            if elapsed >= cfg.suction_delay() {
                rig.apply_pressure(cfg.suction_kpa, channel)?;
                rig.engage_suction(channel)?;
                self.suction_applied = true;
                // The seal timeout counts from here.
                self.timer.restart(now);
                info!("Seal suction engaged: {:.0} kPa on channel {channel}", cfg.suction_kpa);
            }
            return Ok(NextPhase::Unchanged);
        }

        let reading = rig.resistance()?;
        if reading > cfg.threshold_mohm {
            info!(
                "Gigaseal: {reading:.0} MΩ after {:.1} s of suction",
                elapsed.as_secs_f64()
            );
            return Ok(NextPhase::Transition(Phase::break_in(Arc::clone(&self.config))));
        }
        if elapsed >= cfg.timeout() {
            warn!(
                "No seal after {:.1} s (last {reading:.1} MΩ, need > {:.0})",
                elapsed.as_secs_f64(),
                cfg.threshold_mohm
            );
            return Ok(NextPhase::Transition(Phase::clean(Arc::clone(&self.config))));
        }
        Ok(NextPhase::Unchanged)
    }
}
