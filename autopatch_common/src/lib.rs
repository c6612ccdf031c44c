//! Autopatch Common Library
//!
//! This crate provides shared constants, configuration loading utilities,
//! the rig collaborator interface and pulse-waveform analysis for all
//! autopatch workspace crates.
//!
//! # Module Structure
//!
//! - [`config`] - Configuration loading traits and types
//! - [`consts`] - Default thresholds and timings for the patching sequence
//! - [`rig`] - `SensorPort` trait, rig configuration and error types
//! - [`analysis`] - Resistance and transient extraction from stimulus pulses
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use autopatch_common::config::{ConfigLoader, SharedConfig};
//! use autopatch_common::rig::port::SensorPort;
//! ```

pub mod analysis;
pub mod config;
pub mod consts;
pub mod prelude;
pub mod rig;
