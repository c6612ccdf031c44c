//! Scripted driver: replays queued readings and records every call.
//!
//! Readings come from code (`push_resistance`, `push_transient`), from an
//! inline `[rig.driver_config.scripted]` table or from a script file named
//! by its `path` key:
//!
//! ```toml
//! [rig.driver_config.scripted]
//! resistance = [10.0, 10.1, 9.9, 10.0, 11.5]
//! transients = [false, false, true]
//! ```

use autopatch_common::config::ConfigLoader;
use autopatch_common::rig::config::RigConfig;
use autopatch_common::rig::port::{RigError, SensorPort};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info};

/// Registry name of the scripted driver.
pub const DRIVER_NAME: &str = "scripted";

/// Factory function to create a scripted rig instance.
pub fn create_driver() -> Box<dyn SensorPort> {
    Box::new(ScriptedRig::new())
}

/// Queued readings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RigScript {
    /// One resistance reading [MΩ] per `measure_resistance` call.
    #[serde(default)]
    pub resistance: Vec<f64>,
    /// One answer per `measure_transient` call.
    #[serde(default)]
    pub transients: Vec<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct ScriptSection {
    #[serde(default)]
    path: Option<PathBuf>,
    #[serde(default)]
    resistance: Vec<f64>,
    #[serde(default)]
    transients: Vec<bool>,
}

/// One recorded rig call.
#[derive(Debug, Clone, PartialEq)]
pub enum Actuation {
    Init,
    ResistanceProbe { frequency_hz: f64 },
    TransientProbe { frequency_hz: f64 },
    Move { axis: u8, delta_um: f64, speed: u8, wait: bool },
    Pressure { kpa: f64, channel: u8 },
    Atmosphere { channel: u8 },
    Suction { channel: u8 },
    Pulse { channel: u8, duration: Duration },
    Release,
}

impl Actuation {
    /// True for calls that change the physical state of the rig.
    pub fn is_physical(&self) -> bool {
        !matches!(
            self,
            Self::Init | Self::ResistanceProbe { .. } | Self::TransientProbe { .. }
        )
    }
}

/// Shared, cloneable record of every call made on a [`ScriptedRig`].
///
/// Clone the handle before the rig is boxed and moved into a controller.
#[derive(Debug, Clone, Default)]
pub struct ActuationLog {
    entries: Arc<Mutex<Vec<Actuation>>>,
}

impl ActuationLog {
    fn lock(&self) -> MutexGuard<'_, Vec<Actuation>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn push(&self, actuation: Actuation) {
        self.lock().push(actuation);
    }

    /// Copy of every recorded call, oldest first.
    pub fn entries(&self) -> Vec<Actuation> {
        self.lock().clone()
    }

    /// Recorded calls that changed the rig's physical state.
    pub fn physical(&self) -> Vec<Actuation> {
        self.lock().iter().filter(|a| a.is_physical()).cloned().collect()
    }

    /// Number of recorded calls matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&Actuation) -> bool) -> usize {
        self.lock().iter().filter(|a| predicate(a)).count()
    }

    /// Number of recorded calls.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True when nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Rig that answers from queues.
pub struct ScriptedRig {
    resistance: VecDeque<f64>,
    transients: VecDeque<bool>,
    log: ActuationLog,
    initialized: bool,
}

impl ScriptedRig {
    /// Create an empty scripted rig.
    pub fn new() -> Self {
        Self {
            resistance: VecDeque::new(),
            transients: VecDeque::new(),
            log: ActuationLog::default(),
            initialized: false,
        }
    }

    /// Create a rig preloaded with `script`.
    pub fn with_script(script: RigScript) -> Self {
        let mut rig = Self::new();
        rig.load(script);
        rig
    }

    /// Append queued readings.
    pub fn load(&mut self, script: RigScript) {
        self.resistance.extend(script.resistance);
        self.transients.extend(script.transients);
    }

    /// Queue one resistance reading [MΩ].
    pub fn push_resistance(&mut self, mohm: f64) -> &mut Self {
        self.resistance.push_back(mohm);
        self
    }

    /// Queue `count` copies of a resistance reading [MΩ].
    pub fn repeat_resistance(&mut self, mohm: f64, count: usize) -> &mut Self {
        self.resistance.extend(std::iter::repeat_n(mohm, count));
        self
    }

    /// Queue one transient answer.
    pub fn push_transient(&mut self, present: bool) -> &mut Self {
        self.transients.push_back(present);
        self
    }

    /// Handle onto the call log.
    pub fn log(&self) -> ActuationLog {
        self.log.clone()
    }

    fn record(&self, actuation: Actuation) -> Result<(), RigError> {
        if !self.initialized {
            return Err(RigError::NotInitialized);
        }
        self.log.push(actuation);
        Ok(())
    }
}

impl Default for ScriptedRig {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for ScriptedRig {
    fn name(&self) -> &'static str {
        DRIVER_NAME
    }

    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    fn init(&mut self, config: &RigConfig) -> Result<(), RigError> {
        let section: ScriptSection = config
            .driver_section(DRIVER_NAME)
            .map_err(|e| RigError::ConfigError(e.to_string()))?;

        if let Some(path) = &section.path {
            let script = RigScript::load(path)
                .map_err(|e| RigError::InitFailed(format!("{}: {e}", path.display())))?;
            self.load(script);
        }
        self.load(RigScript {
            resistance: section.resistance,
            transients: section.transients,
        });

        info!(
            "Scripted rig ready: {} resistance readings, {} transient answers",
            self.resistance.len(),
            self.transients.len()
        );
        self.initialized = true;
        self.log.push(Actuation::Init);
        Ok(())
    }

    fn measure_resistance(&mut self, frequency_hz: f64) -> Result<Vec<f64>, RigError> {
        self.record(Actuation::ResistanceProbe { frequency_hz })?;
        let reading = self
            .resistance
            .pop_front()
            .ok_or(RigError::ScriptExhausted("resistance readings"))?;
        debug!("Scripted resistance: {reading:.2} MΩ");
        Ok(vec![reading])
    }

    fn measure_transient(&mut self, frequency_hz: f64) -> Result<bool, RigError> {
        self.record(Actuation::TransientProbe { frequency_hz })?;
        self.transients
            .pop_front()
            .ok_or(RigError::ScriptExhausted("transient answers"))
    }

    fn move_axis(
        &mut self,
        axis: u8,
        delta_um: f64,
        speed: u8,
        wait: bool,
    ) -> Result<(), RigError> {
        self.record(Actuation::Move {
            axis,
            delta_um,
            speed,
            wait,
        })
    }

    fn apply_pressure(&mut self, kpa: f64, channel: u8) -> Result<(), RigError> {
        self.record(Actuation::Pressure { kpa, channel })
    }

    fn set_atmosphere(&mut self, channel: u8) -> Result<(), RigError> {
        self.record(Actuation::Atmosphere { channel })
    }

    fn set_suction(&mut self, channel: u8) -> Result<(), RigError> {
        self.record(Actuation::Suction { channel })
    }

    fn pulse_pressure(&mut self, channel: u8, duration: Duration) -> Result<(), RigError> {
        self.record(Actuation::Pulse { channel, duration })
    }

    fn release(&mut self) -> Result<(), RigError> {
        if self.initialized {
            self.initialized = false;
            self.log.push(Actuation::Release);
        }
        Ok(())
    }
}
