//! Rig configuration types.
//!
//! `RigConfig` is the `[rig]` section of `autopatch.toml`. Driver-specific
//! settings live under `[rig.driver_config.<driver>]` and are parsed by the
//! driver itself during `init()`.

use crate::config::ConfigError;
use crate::consts::{CAPTURE_CHANNEL, PATCH_CHANNEL, PROBE_FREQUENCY_HZ};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

fn default_driver() -> String {
    "simulation".to_string()
}

fn default_probe_frequency_hz() -> f64 {
    PROBE_FREQUENCY_HZ
}

fn default_true() -> bool {
    true
}

fn default_patch_channel() -> u8 {
    PATCH_CHANNEL
}

fn default_capture_channel() -> u8 {
    CAPTURE_CHANNEL
}

/// Configuration for the rig behind the `SensorPort`.
///
/// # TOML Example
///
/// ```toml
/// [rig]
/// driver = "simulation"
/// pressure_enabled = true
///
/// [rig.driver_config.simulation]
/// seed = 42
/// fault = "broken_tip"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RigConfig {
    /// Registered driver name ("simulation", "scripted").
    #[serde(default = "default_driver")]
    pub driver: String,

    /// Test-pulse frequency for every probe [Hz].
    #[serde(default = "default_probe_frequency_hz")]
    pub probe_frequency_hz: f64,

    /// When false, pressure/suction/vent commands are logged and skipped.
    #[serde(default = "default_true")]
    pub pressure_enabled: bool,

    /// Pressure channel feeding the patch pipette.
    #[serde(default = "default_patch_channel")]
    pub patch_channel: u8,

    /// Pressure channel feeding the capture pipette.
    #[serde(default = "default_capture_channel")]
    pub capture_channel: u8,

    /// Per-driver configuration sections.
    /// Key = driver name, Value = driver-specific TOML table.
    #[serde(default)]
    pub driver_config: HashMap<String, toml::Value>,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            driver: default_driver(),
            probe_frequency_hz: default_probe_frequency_hz(),
            pressure_enabled: true,
            patch_channel: PATCH_CHANNEL,
            capture_channel: CAPTURE_CHANNEL,
            driver_config: HashMap::new(),
        }
    }
}

impl RigConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` for an empty driver name, a
    /// non-positive probe frequency or a shared patch/capture channel.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.driver.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "rig.driver cannot be empty".to_string(),
            ));
        }
        if !(self.probe_frequency_hz.is_finite() && self.probe_frequency_hz > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "rig.probe_frequency_hz must be positive, got {}",
                self.probe_frequency_hz
            )));
        }
        if self.patch_channel == self.capture_channel {
            return Err(ConfigError::ValidationError(format!(
                "rig.patch_channel and rig.capture_channel must differ (both {})",
                self.patch_channel
            )));
        }
        Ok(())
    }

    /// Deserialize the driver-specific section for `driver`.
    ///
    /// A missing section yields `T::default()`.
    pub fn driver_section<T>(&self, driver: &str) -> Result<T, ConfigError>
    where
        T: serde::de::DeserializeOwned + Default,
    {
        match self.driver_config.get(driver) {
            Some(value) => value.clone().try_into().map_err(|e: toml::de::Error| {
                ConfigError::ParseError(format!("rig.driver_config.{driver}: {e}"))
            }),
            None => Ok(T::default()),
        }
    }
}
