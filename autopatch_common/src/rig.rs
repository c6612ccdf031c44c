//! Rig collaborator interface and configuration.
//!
//! A "rig" is the set of instruments behind one [`port::SensorPort`]:
//! amplifier and DAQ for the test pulse, the micromanipulator and the
//! pressure controller.

pub mod config;
pub mod port;
