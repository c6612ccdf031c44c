//! Rig driver implementations.
//!
//! - [`simulation`] - Cell/pipette model that synthesises probe waveforms
//! - [`scripted`] - Replays queued readings and records every actuation
//!
//! # Adding New Drivers
//!
//! 1. Create a new submodule under `drivers/`
//! 2. Implement `SensorPort` from `autopatch_common::rig::port`
//! 3. Register the factory in [`register_builtin`]

pub mod scripted;
pub mod simulation;

use crate::registry::RigRegistry;

/// Register all built-in drivers.
pub fn register_builtin(registry: &mut RigRegistry) {
    registry.register(simulation::DRIVER_NAME, simulation::create_driver);
    registry.register(scripted::DRIVER_NAME, scripted::create_driver);
}
