//! Phases that wait on an external device event.

use std::sync::Arc;
use std::time::Duration;

use autopatch_common::rig::port::RigError;
use tracing::info;

use super::{NextPhase, Phase};
use crate::config::SequenceConfig;
use crate::event::Event;
use crate::session::RigSession;

/// Whole-cell recording in progress; ends when the pin is entered.
#[derive(Debug)]
pub struct WholeCell {
    config: Arc<SequenceConfig>,
    announced: bool,
}

impl WholeCell {
    pub fn new(config: Arc<SequenceConfig>) -> Self {
        Self {
            config,
            announced: false,
        }
    }

    pub(super) fn evaluate(
        &mut self,
        event: Event,
        _now: Duration,
        _rig: &mut RigSession<'_>,
    ) -> Result<NextPhase, RigError> {
        if !self.announced {
            info!("Whole-cell access established; waiting for pin");
            self.announced = true;
        }
        Ok(match event {
            Event::PinEntered => NextPhase::Transition(Phase::clean(Arc::clone(&self.config))),
            _ => NextPhase::Unchanged,
        })
    }
}

/// Pipette cleaning; ends when the cleaning station locks the device.
#[derive(Debug)]
pub struct Clean {
    config: Arc<SequenceConfig>,
    announced: bool,
}

impl Clean {
    pub fn new(config: Arc<SequenceConfig>) -> Self {
        Self {
            config,
            announced: false,
        }
    }

    pub(super) fn evaluate(
        &mut self,
        event: Event,
        _now: Duration,
        _rig: &mut RigSession<'_>,
    ) -> Result<NextPhase, RigError> {
        if !self.announced {
            info!("Cleaning pipette; waiting for device lock");
            self.announced = true;
        }
        Ok(match event {
            Event::DeviceLocked => NextPhase::Transition(Phase::capture(Arc::clone(&self.config))),
            _ => NextPhase::Unchanged,
        })
    }
}
