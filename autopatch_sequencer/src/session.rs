//! Narrow view of the rig handed to a phase for one evaluation.
//!
//! The controller owns the `SensorPort`; a phase only ever sees a
//! `RigSession`, which adds the probe frequency, channel assignments,
//! pressure gating and access to teardown.

use autopatch_common::rig::config::RigConfig;
use autopatch_common::rig::port::{RigError, SensorPort};
use std::time::Duration;
use tracing::{debug, warn};

use crate::teardown::Teardown;

/// Rig access for one `Phase::evaluate` call.
pub struct RigSession<'a> {
    rig: &'a mut dyn SensorPort,
    config: &'a RigConfig,
    teardown: &'a mut Teardown,
}

impl<'a> RigSession<'a> {
    pub fn new(
        rig: &'a mut dyn SensorPort,
        config: &'a RigConfig,
        teardown: &'a mut Teardown,
    ) -> Self {
        Self {
            rig,
            config,
            teardown,
        }
    }

    /// Pressure channel feeding the patch pipette.
    pub fn patch_channel(&self) -> u8 {
        self.config.patch_channel
    }

    /// Pressure channel feeding the capture pipette.
    pub fn capture_channel(&self) -> u8 {
        self.config.capture_channel
    }

    /// Mean resistance magnitude of one probe [MΩ].
    pub fn resistance(&mut self) -> Result<f64, RigError> {
        let readings = self.rig.measure_resistance(self.config.probe_frequency_hz)?;
        if readings.is_empty() {
            return Err(RigError::InvalidMeasurement(
                "probe returned no resistance readings".to_string(),
            ));
        }
        let mean = readings.iter().map(|r| r.abs()).sum::<f64>() / readings.len() as f64;
        debug!("Resistance {mean:.3} MΩ ({} readings)", readings.len());
        Ok(mean)
    }

    /// Mean of `pulses` consecutive probes [MΩ].
    pub fn mean_resistance(&mut self, pulses: u32) -> Result<f64, RigError> {
        let pulses = pulses.max(1);
        let mut total = 0.0;
        for _ in 0..pulses {
            total += self.resistance()?;
        }
        Ok(total / f64::from(pulses))
    }

    /// Whether one probe shows a rupture transient.
    pub fn transient(&mut self) -> Result<bool, RigError> {
        self.rig.measure_transient(self.config.probe_frequency_hz)
    }

    /// Move an axis and wait for it to settle.
    pub fn step_axis(&mut self, axis: u8, delta_um: f64, speed: u8) -> Result<(), RigError> {
        self.rig.move_axis(axis, delta_um, speed, true)
    }

    /// Set a regulator target [kPa].
    pub fn apply_pressure(&mut self, kpa: f64, channel: u8) -> Result<(), RigError> {
        if self.pressure_skipped("set", channel) {
            return Ok(());
        }
        self.rig.apply_pressure(kpa, channel)
    }

    /// Route `channel` to the regulator.
    pub fn engage_suction(&mut self, channel: u8) -> Result<(), RigError> {
        if self.pressure_skipped("route", channel) {
            return Ok(());
        }
        self.rig.set_suction(channel)
    }

    /// Vent `channel` to atmosphere.
    pub fn vent(&mut self, channel: u8) -> Result<(), RigError> {
        if self.pressure_skipped("vent", channel) {
            return Ok(());
        }
        self.rig.set_atmosphere(channel)
    }

    /// Play one pressure pulse on `channel`.
    pub fn pulse(&mut self, channel: u8, duration: Duration) -> Result<(), RigError> {
        if self.pressure_skipped("pulse", channel) {
            return Ok(());
        }
        self.rig.pulse_pressure(channel, duration)
    }

    /// Vent and release the rig. Repeated calls are no-ops.
    pub fn teardown(&mut self) -> Result<(), RigError> {
        self.teardown.run(&mut *self.rig)
    }

    fn pressure_skipped(&self, action: &str, channel: u8) -> bool {
        if self.config.pressure_enabled {
            return false;
        }
        warn!("Pressure control disabled: skipping {action} on channel {channel}");
        true
    }
}
