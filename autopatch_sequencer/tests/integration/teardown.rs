//! Teardown through the controller: every exit path releases the rig once.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use autopatch_common::rig::config::RigConfig;
use autopatch_common::rig::port::{RigError, SensorPort};
use autopatch_rig::{Actuation, ScriptedRig};
use autopatch_sequencer::config::AutopatchConfig;
use autopatch_sequencer::teardown::TeardownSteps;
use autopatch_sequencer::{Event, PhaseKind, RunError, RunOutcome};

use super::harness::{Harness, controller_over};

fn releases(h: &Harness) -> usize {
    h.log.count(|a| *a == Actuation::Release)
}

#[test]
fn cancel_event_tears_down_once() {
    let mut h = Harness::scripted(ScriptedRig::new());
    h.cycle(0.0, Event::Configure);

    assert_eq!(h.at(1.0, Event::Cancel).unwrap(), Some(RunOutcome::Cancelled));
    assert_eq!(releases(&h), 1);
    assert_eq!(
        h.controller.teardown_state().steps(),
        TeardownSteps::VENTED | TeardownSteps::RELEASED
    );

    let issued = h.log.len();
    h.controller.teardown().unwrap();
    h.controller.teardown().unwrap();
    assert_eq!(h.log.len(), issued);
    assert!(matches!(h.at(2.0, Event::Tick), Err(RunError::Finished)));
}

#[test]
fn cancel_flag_stops_next_cycle() {
    let mut h = Harness::scripted(ScriptedRig::new());
    h.cycle(0.0, Event::Configure);

    h.controller.cancel_handle().store(true, Ordering::SeqCst);
    assert_eq!(h.at(1.0, Event::Tick).unwrap(), Some(RunOutcome::Cancelled));
    // The cancelled cycle never reached the phase.
    assert_eq!(h.controller.stats().ticks, 1);
    assert_eq!(releases(&h), 1);
}

#[test]
fn abort_then_explicit_teardown_issues_nothing() {
    let mut rig = ScriptedRig::new();
    rig.repeat_resistance(10.0, 3).push_resistance(0.01);
    let mut h = Harness::scripted(rig);
    h.enter_hunt();
    h.cycle(5.1, Event::Tick);
    h.cycle(5.2, Event::Tick);
    assert_eq!(h.phase(), PhaseKind::Abort);
    assert_eq!(h.at(5.3, Event::Tick).unwrap(), Some(RunOutcome::Halted));

    let issued = h.log.entries();
    h.controller.teardown().unwrap();
    assert_eq!(h.log.entries(), issued);
    assert_eq!(releases(&h), 1);
}

#[test]
fn tick_limit_tears_down() {
    let mut config = AutopatchConfig::default();
    config.controller.max_ticks = Some(3);
    let mut h = Harness::scripted_with(ScriptedRig::new(), config);

    h.cycle(0.0, Event::Configure);
    h.cycle(0.1, Event::Tick);
    assert_eq!(
        h.at(0.2, Event::Tick).unwrap(),
        Some(RunOutcome::TickLimitReached)
    );
    assert_eq!(h.phase(), PhaseKind::Capture);
    assert_eq!(releases(&h), 1);
}

#[test]
fn rig_error_tears_down_and_names_phase() {
    let mut rig = ScriptedRig::new();
    rig.repeat_resistance(10.0, 2);
    let mut h = Harness::scripted(rig);
    h.enter_hunt();

    let err = h.at(5.1, Event::Tick).unwrap_err();
    assert_eq!(err.phase(), Some(PhaseKind::Hunt));
    assert!(matches!(
        err,
        RunError::Rig {
            source: RigError::ScriptExhausted(_),
            ..
        }
    ));
    assert_eq!(h.log.entries().last(), Some(&Actuation::Release));
    assert!(h.controller.is_finished());
}

#[test]
fn drop_releases_unfinished_controller() {
    let h = Harness::scripted(ScriptedRig::new());
    let log = h.log.clone();
    drop(h);

    assert_eq!(
        log.physical(),
        vec![
            Actuation::Atmosphere { channel: 1 },
            Actuation::Atmosphere { channel: 2 },
            Actuation::Release,
        ]
    );
}

// ─── Failing release ────────────────────────────────────────────────

/// Rig whose `release` always fails; counts vents and releases.
#[derive(Default)]
struct StuckRig {
    vents: Arc<AtomicUsize>,
    releases: Arc<AtomicUsize>,
}

impl SensorPort for StuckRig {
    fn name(&self) -> &'static str {
        "stuck"
    }

    fn version(&self) -> &'static str {
        "0.0.0"
    }

    fn init(&mut self, _config: &RigConfig) -> Result<(), RigError> {
        Ok(())
    }

    fn measure_resistance(&mut self, _frequency_hz: f64) -> Result<Vec<f64>, RigError> {
        Ok(vec![10.0])
    }

    fn measure_transient(&mut self, _frequency_hz: f64) -> Result<bool, RigError> {
        Ok(false)
    }

    fn move_axis(
        &mut self,
        _axis: u8,
        _delta_um: f64,
        _speed: u8,
        _wait: bool,
    ) -> Result<(), RigError> {
        Ok(())
    }

    fn apply_pressure(&mut self, _kpa: f64, _channel: u8) -> Result<(), RigError> {
        Ok(())
    }

    fn set_atmosphere(&mut self, _channel: u8) -> Result<(), RigError> {
        self.vents.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn set_suction(&mut self, _channel: u8) -> Result<(), RigError> {
        Ok(())
    }

    fn pulse_pressure(&mut self, _channel: u8, _duration: Duration) -> Result<(), RigError> {
        Ok(())
    }

    fn release(&mut self) -> Result<(), RigError> {
        self.releases.fetch_add(1, Ordering::SeqCst);
        Err(RigError::CommunicationError("controller offline".to_string()))
    }
}

#[test]
fn failed_release_is_reported_and_retried_without_venting_again() {
    let rig = StuckRig::default();
    let vents = Arc::clone(&rig.vents);
    let release_calls = Arc::clone(&rig.releases);
    let (mut controller, _clock) = controller_over(Box::new(rig), &AutopatchConfig::default());

    let err = controller.tick(Event::Cancel).unwrap_err();
    assert!(matches!(
        err,
        RunError::Teardown(RigError::CommunicationError(_))
    ));
    assert_eq!(vents.load(Ordering::SeqCst), 2);
    assert_eq!(release_calls.load(Ordering::SeqCst), 1);
    assert_eq!(controller.teardown_state().steps(), TeardownSteps::VENTED);

    assert!(controller.teardown().is_err());
    assert_eq!(vents.load(Ordering::SeqCst), 2);
    assert_eq!(release_calls.load(Ordering::SeqCst), 2);
}
