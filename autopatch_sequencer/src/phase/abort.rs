//! Abort: release the rig and halt.

use std::time::Duration;

use autopatch_common::rig::port::RigError;
use tracing::warn;

use super::NextPhase;
use crate::event::Event;
use crate::session::RigSession;

#[derive(Debug, Default)]
pub struct Abort;

impl Abort {
    pub fn new() -> Self {
        Self
    }

    pub(super) fn evaluate(
        &mut self,
        _event: Event,
        _now: Duration,
        rig: &mut RigSession<'_>,
    ) -> Result<NextPhase, RigError> {
        warn!("Aborting run; releasing rig");
        rig.teardown()?;
        Ok(NextPhase::Terminal)
    }
}
