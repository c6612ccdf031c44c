//! Per-cycle snapshots and run statistics.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use serde::{Serialize, Serializer};
use tracing::{debug, info};

use crate::event::Event;
use crate::phase::PhaseKind;

/// State of the controller after one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Snapshot {
    /// Cycle number, starting at 1.
    pub tick: u64,
    /// Clock reading for the cycle, serialized in seconds.
    #[serde(serialize_with = "as_secs")]
    pub at: Duration,
    /// Phase live after the cycle.
    pub phase: PhaseKind,
    /// Event the cycle consumed.
    pub event: Event,
}

fn as_secs<S: Serializer>(at: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(at.as_secs_f64())
}

/// Receiver of per-cycle snapshots.
///
/// Sink failures are logged by the controller and never end a run.
pub trait SnapshotSink: Send {
    fn record(&mut self, snapshot: &Snapshot) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Writes snapshots to the `tracing` log at DEBUG level.
#[derive(Debug, Default)]
pub struct LogSink;

impl SnapshotSink for LogSink {
    fn record(&mut self, s: &Snapshot) -> io::Result<()> {
        debug!(
            tick = s.tick,
            at_s = s.at.as_secs_f64(),
            phase = %s.phase,
            event = %s.event,
            "cycle"
        );
        Ok(())
    }
}

/// One JSON object per line.
pub struct JsonLinesSink<W: Write + Send> {
    writer: W,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl JsonLinesSink<BufWriter<File>> {
    /// Create (or truncate) `path`.
    pub fn create(path: &Path) -> io::Result<Self> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write + Send> SnapshotSink for JsonLinesSink<W> {
    fn record(&mut self, snapshot: &Snapshot) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, snapshot)?;
        self.writer.write_all(b"\n")
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Counters kept over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub ticks: u64,
    pub transitions: u64,
    /// Capture phases entered, including the first.
    pub captures: u64,
    /// Gigaseals reached (BreakIn entered).
    pub seals: u64,
    pub whole_cells: u64,
    pub cleans: u64,
    pub aborts: u64,
}

impl RunStats {
    /// Count entry into `kind`.
    pub fn record_entry(&mut self, kind: PhaseKind) {
        match kind {
            PhaseKind::Capture => self.captures += 1,
            PhaseKind::BreakIn => self.seals += 1,
            PhaseKind::WholeCell => self.whole_cells += 1,
            PhaseKind::Clean => self.cleans += 1,
            PhaseKind::Abort => self.aborts += 1,
            PhaseKind::Hunt | PhaseKind::Seal => {}
        }
    }

    /// Count a transition into `kind`.
    pub fn record_transition(&mut self, kind: PhaseKind) {
        self.transitions += 1;
        self.record_entry(kind);
    }

    pub fn log_summary(&self) {
        info!(
            "Run summary: {} cycles, {} transitions, {} captures, {} seals, {} whole-cell, {} cleans, {} aborts",
            self.ticks,
            self.transitions,
            self.captures,
            self.seals,
            self.whole_cells,
            self.cleans,
            self.aborts
        );
    }
}
