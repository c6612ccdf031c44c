//! # Autopatch Sequencer Library
//!
//! Drives the automated whole-cell patching sequence. A single live
//! [`phase::Phase`] is fed one event per cycle by the [`controller::Controller`];
//! it reads the rig through a narrow [`session::RigSession`] and answers with
//! a [`phase::NextPhase`].
//!
//! ## Phase graph
//!
//! ```text
//!            yes                 contact              gigaseal             transient
//! Capture ───────► Hunt ──────────────────► Seal ──────────────► BreakIn ─────────────► WholeCell
//!    ▲  │ no        │ tip collapse            │ timeout             │ attempts spent       │ pin entered
//!    │  ▼           ▼                         ▼                     ▼                      ▼
//!    └─ Clean ◄─────┼─────────────────────────┴─────────────────────┴──────────────────────┘
//!  device locked    ▼
//!                 Abort ──► teardown, halt
//! ```
//!
//! Hunt travel beyond the displacement cap is fatal: the controller tears
//! the rig down and reports [`error::FatalError`].

pub mod clock;
pub mod config;
pub mod controller;
pub mod error;
pub mod event;
pub mod operator;
pub mod phase;
pub mod queue;
pub mod session;
pub mod telemetry;
pub mod teardown;

pub use crate::controller::{Controller, RunOutcome};
pub use crate::error::{FatalError, RunError};
pub use crate::event::Event;
pub use crate::phase::{NextPhase, Phase, PhaseKind};
