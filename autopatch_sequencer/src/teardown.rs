//! Rig teardown.
//!
//! Teardown vents both pressure channels and releases the rig. It runs on
//! Abort, cancellation, fatal errors, tick limits and controller drop. Each
//! step is recorded once it succeeds, so repeating a completed teardown is a
//! no-op and repeating a failed one resumes where it stopped.

use autopatch_common::rig::config::RigConfig;
use autopatch_common::rig::port::{RigError, SensorPort};
use bitflags::bitflags;
use tracing::{debug, error, info, warn};

bitflags! {
    /// Teardown steps already completed.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TeardownSteps: u8 {
        /// Patch and capture channels vented to atmosphere.
        const VENTED   = 0x01;
        /// `SensorPort::release()` succeeded.
        const RELEASED = 0x02;
    }
}

/// Idempotent teardown executor.
#[derive(Debug, Clone)]
pub struct Teardown {
    done: TeardownSteps,
    channels: [u8; 2],
    pressure_enabled: bool,
}

impl Teardown {
    pub fn new(rig: &RigConfig) -> Self {
        Self {
            done: TeardownSteps::empty(),
            channels: [rig.patch_channel, rig.capture_channel],
            pressure_enabled: rig.pressure_enabled,
        }
    }

    /// Steps completed so far.
    #[inline]
    pub const fn steps(&self) -> TeardownSteps {
        self.done
    }

    /// Whether the rig has been released.
    #[inline]
    pub const fn is_complete(&self) -> bool {
        self.done.contains(TeardownSteps::RELEASED)
    }

    /// Vent and release, skipping steps already done.
    ///
    /// A failed vent does not block release. Returns the first error.
    pub fn run(&mut self, rig: &mut dyn SensorPort) -> Result<(), RigError> {
        if self.is_complete() {
            debug!("Teardown already complete");
            return Ok(());
        }

        let mut first_error = None;

        if !self.done.contains(TeardownSteps::VENTED) {
            match self.vent(rig) {
                Ok(()) => self.done.insert(TeardownSteps::VENTED),
                Err(e) => {
                    warn!("Teardown: venting failed: {e}");
                    first_error = Some(e);
                }
            }
        }

        match rig.release() {
            Ok(()) => {
                self.done.insert(TeardownSteps::RELEASED);
                info!("Rig '{}' released", rig.name());
            }
            Err(e) => {
                error!("Teardown: release failed: {e}");
                first_error.get_or_insert(e);
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    fn vent(&self, rig: &mut dyn SensorPort) -> Result<(), RigError> {
        if !self.pressure_enabled {
            debug!("Teardown: pressure disabled, nothing to vent");
            return Ok(());
        }
        for channel in self.channels {
            rig.set_atmosphere(channel)?;
        }
        Ok(())
    }
}
