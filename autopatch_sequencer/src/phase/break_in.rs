//! BreakIn: pulse strong suction until the membrane ruptures.

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
pub struct BreakIn {
    config: Arc<SequenceConfig>,
    timer: PhaseTimer,
    configured: bool,
    pressure_set: bool,
    attempts: u32,
}

impl BreakIn {
    pub fn new(config: Arc<SequenceConfig>) -> Self {
        Self {
            config,
            timer: PhaseTimer::new(),
            configured: false,
            pressure_set: false,
            attempts: 0,
        }
    }

    pub fn pressure_set(&self) -> bool {
        self.pressure_set
    }

    /// Pulses that produced no transient so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub(super) fn evaluate(
        &mut self,
        _event: Event,
        now: Duration,
        rig: &mut RigSession<'_>,
    ) -> Result<NextPhase, RigError> {
        let cfg = self.config.break_in;
        let channel = rig.patch_channel();
        let elapsed = self.timer.elapsed(now);

        if !self.configured {
            rig.vent(channel)?;
            self.configured = true;
            debug!("BreakIn: channel {channel} vented");
            return Ok(NextPhase::Unchanged);
        }

        if elapsed < cfg.pressure_delay() {
            return Ok(NextPhase::Unchanged);
        }

        if !self.pressure_set {
            rig.apply_pressure(cfg.pressure_kpa, channel)?;
            self.pressure_set = true;
            info!("Break-in pressure set: {:.0} kPa on channel {channel}", cfg.pressure_kpa);
            return Ok(NextPhase::Unchanged);
        }

        rig.pulse(channel, cfg.pulse())?;
        if rig.transient()? {
            info!("Membrane ruptured after {} missed pulses", self.attempts);
            return Ok(NextPhase::Transition(Phase::whole_cell(Arc::clone(&self.config))));
        }

        self.attempts += 1;
        if self.attempts > cfg.max_attempts {
            warn!("No break-in after {} pulses; cleaning pipette", self.attempts);
            return Ok(NextPhase::Transition(Phase::clean(Arc::clone(&self.config))));
        }
        debug!("Break-in attempt {}/{} missed", self.attempts, cfg.max_attempts);
        Ok(NextPhase::Unchanged)
    }
}
