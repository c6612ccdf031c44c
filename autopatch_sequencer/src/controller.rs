//! Controller loop.
//!
//! The controller owns the live phase, the clock, the rig and the event
//! queue. Each cycle it samples the clock, hands the event to the phase and
//! applies the returned [`NextPhase`]. Every way out of the loop (Abort,
//! cancellation, tick limit, fatal or rig error, drop) goes through the same
//! idempotent [`Teardown`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use autopatch_common::rig::config::RigConfig;
use autopatch_common::rig::port::SensorPort;
use tracing::{debug, error, info, warn};

use crate::clock::Clock;
use crate::config::AutopatchConfig;
use crate::error::RunError;
use crate::event::Event;
use crate::phase::{NextPhase, Phase, PhaseKind};
use crate::queue::{EventQueue, EventSender};
use crate::session::RigSession;
use crate::telemetry::{LogSink, RunStats, Snapshot, SnapshotSink};
use crate::teardown::Teardown;

/// How a run ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// A phase returned Terminal (Abort).
    Halted,
    /// Cancelled by event or by the cancel flag.
    Cancelled,
    /// `max_ticks` cycles elapsed.
    TickLimitReached,
}

/// Phase sequencer over one rig.
pub struct Controller {
    phase: Phase,
    rig: Box<dyn SensorPort>,
    rig_config: RigConfig,
    clock: Box<dyn Clock>,
    queue: EventQueue,
    pending: Option<Event>,
    teardown: Teardown,
    cancel: Arc<AtomicBool>,
    sink: Box<dyn SnapshotSink>,
    stats: RunStats,
    tick_interval: Duration,
    max_ticks: Option<u64>,
    finished: bool,
}

impl Controller {
    /// Create a controller in Capture, armed with a `configure` event.
    ///
    /// `rig` must already be initialized; the controller releases it.
    pub fn new(config: &AutopatchConfig, rig: Box<dyn SensorPort>, clock: Box<dyn Clock>) -> Self {
        let sequence = Arc::new(config.sequence);
        let mut stats = RunStats::default();
        stats.record_entry(PhaseKind::Capture);

        info!(
            "Controller created: rig '{}' v{}, tick {} ms, max ticks {:?}",
            rig.name(),
            rig.version(),
            config.controller.tick_interval_ms,
            config.controller.max_ticks
        );

        Self {
            phase: Phase::capture(sequence),
            rig,
            rig_config: config.rig.clone(),
            clock,
            queue: EventQueue::new(),
            pending: Some(Event::Configure),
            teardown: Teardown::new(&config.rig),
            cancel: Arc::new(AtomicBool::new(false)),
            sink: Box::new(LogSink),
            stats,
            tick_interval: config.controller.tick_interval(),
            max_ticks: config.controller.max_ticks,
            finished: false,
        }
    }

    /// Replace the snapshot sink.
    pub fn with_sink(mut self, sink: Box<dyn SnapshotSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Producer handle for external events.
    pub fn sender(&self) -> EventSender {
        self.queue.sender()
    }

    /// Flag that cancels the run when set.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn phase_kind(&self) -> PhaseKind {
        self.phase.kind()
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn teardown_state(&self) -> &Teardown {
        &self.teardown
    }

    /// Run one cycle with `event`.
    ///
    /// Returns `Ok(Some(outcome))` when the run ends normally, `Ok(None)`
    /// while it continues.
    ///
    /// # Errors
    /// `Fatal` and `Rig` after tearing down, `Teardown` if releasing the
    /// rig failed, `Finished` once the run is over.
    pub fn tick(&mut self, event: Event) -> Result<Option<RunOutcome>, RunError> {
        if self.finished {
            return Err(RunError::Finished);
        }
        if event == Event::Cancel || self.cancel.load(Ordering::SeqCst) {
            info!("Run cancelled in {}", self.phase.kind());
            return self.finish(RunOutcome::Cancelled).map(Some);
        }

        let now = self.clock.now();
        self.stats.ticks += 1;
        let tick = self.stats.ticks;
        let kind = self.phase.kind();

        let result = {
            let mut session =
                RigSession::new(self.rig.as_mut(), &self.rig_config, &mut self.teardown);
            self.phase.evaluate(event, now, &mut session)
        };

        match result {
            Ok(NextPhase::Unchanged) => {}
            Ok(NextPhase::Transition(next)) => {
                let next_kind = next.kind();
                info!(
                    "Phase {kind} → {next_kind} at {:.2} s ({event})",
                    now.as_secs_f64()
                );
                self.stats.record_transition(next_kind);
                self.phase = next;
            }
            Ok(NextPhase::Terminal) => {
                self.record(tick, now, event);
                info!("Phase {kind} halted the run");
                return self.finish(RunOutcome::Halted).map(Some);
            }
            Ok(NextPhase::Fatal(source)) => {
                error!("Fatal in {kind}: {source}");
                self.record(tick, now, event);
                self.abandon();
                return Err(RunError::Fatal { phase: kind, source });
            }
            Err(source) => {
                error!("Rig error in {kind}: {source}");
                self.record(tick, now, event);
                self.abandon();
                return Err(RunError::Rig { phase: kind, source });
            }
        }

        self.record(tick, now, event);

        if self.max_ticks.is_some_and(|max| tick >= max) {
            warn!("Tick limit reached after {tick} cycles in {}", self.phase.kind());
            return self.finish(RunOutcome::TickLimitReached).map(Some);
        }
        Ok(None)
    }

    /// Loop until the run ends.
    ///
    /// Waits up to the tick interval for each external event and falls
    /// back to a plain tick.
    pub fn run(&mut self) -> Result<RunOutcome, RunError> {
        info!("Controller loop starting in {}", self.phase.kind());
        loop {
            let event = self.next_event();
            match self.tick(event) {
                Ok(Some(outcome)) => {
                    info!("Controller loop ended: {outcome:?}");
                    return Ok(outcome);
                }
                Ok(None) => {}
                Err(e) => return Err(e),
            }
        }
    }

    /// Tear the rig down now and refuse further cycles.
    ///
    /// Safe to repeat: a completed teardown issues nothing.
    pub fn teardown(&mut self) -> Result<(), RunError> {
        if !self.finished {
            self.finished = true;
            self.close_sink();
            self.stats.log_summary();
        }
        self.teardown
            .run(self.rig.as_mut())
            .map_err(RunError::Teardown)
    }

    fn next_event(&mut self) -> Event {
        if let Some(event) = self.pending.take() {
            return event;
        }
        if self.cancel.load(Ordering::SeqCst) {
            return Event::Cancel;
        }
        self.queue.next(self.tick_interval)
    }

    fn record(&mut self, tick: u64, at: Duration, event: Event) {
        let snapshot = Snapshot {
            tick,
            at,
            phase: self.phase.kind(),
            event,
        };
        if let Err(e) = self.sink.record(&snapshot) {
            warn!("Snapshot sink failed at tick {tick}: {e}");
        }
    }

    /// Normal end of run: teardown failure becomes the error.
    fn finish(&mut self, outcome: RunOutcome) -> Result<RunOutcome, RunError> {
        self.teardown()?;
        Ok(outcome)
    }

    /// Failed run: teardown failure is logged, the original error wins.
    fn abandon(&mut self) {
        self.finished = true;
        self.close_sink();
        self.stats.log_summary();
        if let Err(e) = self.teardown.run(self.rig.as_mut()) {
            error!("Teardown after failure also failed: {e}");
        }
    }

    fn close_sink(&mut self) {
        if let Err(e) = self.sink.flush() {
            warn!("Snapshot sink flush failed: {e}");
        }
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        if self.teardown.is_complete() {
            return;
        }
        debug!("Controller dropped before teardown");
        if let Err(e) = self.teardown.run(self.rig.as_mut()) {
            error!("Teardown on drop failed: {e}");
        }
    }
}
