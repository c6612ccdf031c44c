//! Simulation driver module.
//!
//! Software rig for development and dry runs: a pipette/cell model drives
//! synthetic probe waveforms, which are analysed with the same heuristics
//! a physical rig would use.

mod cell;
mod driver;
mod params;
mod waveform;

pub use cell::{CellModel, MembraneState};
pub use driver::SimulatedRig;
pub use params::{FaultMode, SimulationParams};
pub use waveform::{ResponseShape, synthesize_response};

use autopatch_common::rig::port::SensorPort;

/// Registry name of the simulation driver.
pub const DRIVER_NAME: &str = "simulation";

/// Factory function to create a simulation rig instance.
pub fn create_driver() -> Box<dyn SensorPort> {
    Box::new(SimulatedRig::new())
}
