//! # Autopatch Rig Library
//!
//! Rig drivers behind the `SensorPort` trait defined in
//! `autopatch_common::rig::port`, plus the registry that maps driver names
//! to factories.
//!
//! # Module Structure
//!
//! - [`registry`] - Driver factory registration
//! - [`drivers`] - Built-in drivers (`simulation`, `scripted`)
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                      autopatch_rig                         │
//! │  ┌────────────────┐      ┌───────────────────────────────┐ │
//! │  │  RigRegistry   │─────►│ simulation  (cell model, rand)│ │
//! │  │ name → factory │      ├───────────────────────────────┤ │
//! │  └────────────────┘─────►│ scripted    (queues + log)    │ │
//! │                          └──────────────┬────────────────┘ │
//! │                                         ▼                  │
//! │                              Box<dyn SensorPort>           │
//! └────────────────────────────────────────────────────────────┘
//! ```

pub mod drivers;
pub mod registry;

pub use crate::drivers::scripted::{Actuation, ActuationLog, RigScript, ScriptedRig};
pub use crate::drivers::simulation::{FaultMode, SimulatedRig, SimulationParams};
pub use crate::registry::RigRegistry;
