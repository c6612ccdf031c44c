//! Capture: hold a cell on the capture pipette and ask the operator.

use std::sync::Arc;
use std::time::Duration;

use autopatch_common::rig::port::RigError;
use tracing::{debug, info};

use super::timer::PhaseTimer;
use super::{NextPhase, Phase};
use crate::config::SequenceConfig;
use crate::event::Event;
use crate::session::RigSession;

#[derive(Debug)]
pub struct Capture {
    config: Arc<SequenceConfig>,
    timer: PhaseTimer,
    configured: bool,
    suction_applied: bool,
    prompted: bool,
}

impl Capture {
    pub fn new(config: Arc<SequenceConfig>) -> Self {
        Self {
            config,
            timer: PhaseTimer::new(),
            configured: false,
            suction_applied: false,
            prompted: false,
        }
    }

    pub fn configured(&self) -> bool {
        self.configured
    }

    pub fn suction_applied(&self) -> bool {
        self.suction_applied
    }

    pub(super) fn evaluate(
        &mut self,
        event: Event,
        now: Duration,
        rig: &mut RigSession<'_>,
    ) -> Result<NextPhase, RigError> {
        let cfg = self.config.capture;
        let channel = rig.capture_channel();
        let elapsed = self.timer.elapsed(now);

        if !self.configured {
            rig.apply_pressure(cfg.baseline_kpa, channel)?;
            rig.engage_suction(channel)?;
            self.configured = true;
            debug!("Capture holding {:.0} kPa on channel {channel}", cfg.baseline_kpa);
            return Ok(NextPhase::Unchanged);
        }

        // Suction and the decision can open on the same cycle.
        if !self.suction_applied && elapsed >= cfg.suction_delay() {
            rig.apply_pressure(cfg.suction_kpa, channel)?;
            self.suction_applied = true;
            info!(
                "Capture suction engaged: {:.0} kPa on channel {channel}",
                cfg.suction_kpa
            );
        }

        if elapsed < cfg.decision_delay() {
            return Ok(NextPhase::Unchanged);
        }

        if !self.prompted {
            info!("Has the capture pipette acquired a cell? (y/n)");
            self.prompted = true;
        }

        Ok(match event {
            Event::UserYes => NextPhase::Transition(Phase::hunt(Arc::clone(&self.config))),
            Event::UserNo => NextPhase::Transition(Phase::clean(Arc::clone(&self.config))),
            _ => NextPhase::Unchanged,
        })
    }
}
