//! Phase-by-phase scenarios over a scripted rig.

use std::time::Duration;

use autopatch_rig::{Actuation, ScriptedRig};
use autopatch_sequencer::config::AutopatchConfig;
use autopatch_sequencer::{Event, FatalError, Phase, PhaseKind, RunError, RunOutcome};
use proptest::prelude::*;

use super::harness::{Harness, script_to_seal};

fn pressure(kpa: f64, channel: u8) -> Actuation {
    Actuation::Pressure { kpa, channel }
}

fn hunt_move() -> Actuation {
    Actuation::Move {
        axis: 2,
        delta_um: -2.0,
        speed: 1,
        wait: true,
    }
}

fn pulse() -> Actuation {
    Actuation::Pulse {
        channel: 1,
        duration: Duration::from_millis(300),
    }
}

// ─── Capture ────────────────────────────────────────────────────────

#[test]
fn capture_configures_then_engages_suction_at_three_seconds() {
    let mut h = Harness::scripted(ScriptedRig::new());

    h.cycle(0.0, Event::Configure);
    assert_eq!(
        h.log.physical(),
        vec![pressure(15.0, 2), Actuation::Suction { channel: 2 }]
    );

    h.cycle(2.9, Event::Tick);
    assert_eq!(h.log.physical().len(), 2);

    h.cycle(3.0, Event::Tick);
    assert_eq!(h.log.physical().last(), Some(&pressure(-15.0, 2)));

    h.cycle(4.0, Event::Tick);
    assert_eq!(h.log.physical().len(), 3, "suction is applied once");
}

#[test]
fn capture_ignores_answers_before_decision_delay() {
    let mut h = Harness::scripted(ScriptedRig::new());

    h.cycle(0.0, Event::Configure);
    h.cycle(4.9, Event::UserYes);
    assert_eq!(h.phase(), PhaseKind::Capture);

    h.cycle(5.0, Event::UserYes);
    assert_eq!(h.phase(), PhaseKind::Hunt);
}

#[test]
fn capture_declined_goes_through_clean_and_back() {
    let mut h = Harness::scripted(ScriptedRig::new());

    h.cycle(0.0, Event::Configure);
    h.cycle(6.0, Event::UserNo);
    assert_eq!(h.phase(), PhaseKind::Clean);

    h.cycle(7.0, Event::UserYes);
    h.cycle(8.0, Event::PinEntered);
    assert_eq!(h.phase(), PhaseKind::Clean);

    h.cycle(9.0, Event::DeviceLocked);
    assert_eq!(h.phase(), PhaseKind::Capture);

    // The new Capture configures from scratch.
    h.cycle(10.0, Event::Tick);
    let holds = h.log.count(|a| *a == pressure(15.0, 2));
    assert_eq!(holds, 2);
    assert_eq!(h.controller.stats().captures, 2);
    assert_eq!(h.controller.stats().cleans, 1);
}

// ─── Hunt ───────────────────────────────────────────────────────────

#[test]
fn hunt_steps_until_contact() {
    let mut rig = ScriptedRig::new();
    rig.push_resistance(9.0)
        .push_resistance(10.0)
        .push_resistance(11.0)
        .push_resistance(10.5)
        .push_resistance(11.5);
    let mut h = Harness::scripted(rig);
    h.enter_hunt();

    h.cycle(5.1, Event::Tick);
    match h.controller.phase() {
        Phase::Hunt(hunt) => {
            assert_eq!(hunt.baseline_mohm(), Some(10.0));
            assert_eq!(hunt.displacement_um(), 0.0);
        }
        other => panic!("expected Hunt, got {other:?}"),
    }
    assert_eq!(h.log.count(|a| matches!(a, Actuation::Move { .. })), 0);

    h.cycle(5.2, Event::Tick);
    assert_eq!(h.phase(), PhaseKind::Hunt);

    h.cycle(5.3, Event::Tick);
    assert_eq!(h.phase(), PhaseKind::Seal);
    assert_eq!(h.log.count(|a| *a == hunt_move()), 2);
}

#[test]
fn hunt_collapse_aborts_and_halts() {
    let mut rig = ScriptedRig::new();
    rig.repeat_resistance(10.0, 3).push_resistance(0.05);
    let mut h = Harness::scripted(rig);
    h.enter_hunt();

    h.cycle(5.1, Event::Tick);
    h.cycle(5.2, Event::Tick);
    assert_eq!(h.phase(), PhaseKind::Abort);
    assert!(!h.controller.teardown_state().is_complete());

    let outcome = h.at(5.3, Event::Tick).unwrap();
    assert_eq!(outcome, Some(RunOutcome::Halted));
    assert!(h.controller.is_finished());
    assert_eq!(h.controller.stats().aborts, 1);

    let tail: Vec<_> = h.log.physical().into_iter().rev().take(3).collect();
    assert_eq!(
        tail,
        vec![
            Actuation::Release,
            Actuation::Atmosphere { channel: 2 },
            Actuation::Atmosphere { channel: 1 },
        ]
    );
}

#[test]
fn hunt_displacement_cap_is_fatal() {
    let mut rig = ScriptedRig::new();
    rig.repeat_resistance(10.0, 3).repeat_resistance(10.2, 60);
    let mut h = Harness::scripted(rig);
    h.enter_hunt();
    h.cycle(5.1, Event::Tick);

    // 50 steps of 2 µm reach the cap exactly without exceeding it.
    for i in 0..50_u32 {
        h.cycle(5.2 + f64::from(i) * 0.1, Event::Tick);
    }
    assert_eq!(h.phase(), PhaseKind::Hunt);

    let err = h.at(10.5, Event::Tick).unwrap_err();
    match err {
        RunError::Fatal {
            phase: PhaseKind::Hunt,
            source: FatalError::DisplacementCapExceeded {
                travelled_um,
                cap_um,
            },
        } => {
            assert_eq!(travelled_um, 102.0);
            assert_eq!(cap_um, 100.0);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    assert_eq!(h.log.count(|a| *a == hunt_move()), 51);
    assert!(h.controller.teardown_state().is_complete());
    assert_eq!(h.log.entries().last(), Some(&Actuation::Release));
    assert!(matches!(h.at(11.0, Event::Tick), Err(RunError::Finished)));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn hunt_travel_never_exceeds_cap_by_more_than_one_step(
        step in 0.5f64..10.0,
        cap in 20.0f64..120.0,
    ) {
        let mut config = AutopatchConfig::default();
        config.sequence.hunt.step_um = -step;
        config.sequence.hunt.displacement_cap_um = cap;

        let mut rig = ScriptedRig::new();
        rig.repeat_resistance(10.0, 3).repeat_resistance(10.0, 260);
        let mut h = Harness::scripted_with(rig, config);
        h.enter_hunt();

        let mut t = 5.0;
        let err = loop {
            t += 0.1;
            match h.at(t, Event::Tick) {
                Ok(None) => {}
                Ok(Some(outcome)) => panic!("run ended with {outcome:?}"),
                Err(e) => break e,
            }
        };
        prop_assert!(matches!(err, RunError::Fatal { phase: PhaseKind::Hunt, .. }), "got {err:?}");

        let moves = h.log.count(|a| matches!(a, Actuation::Move { .. })) as f64;
        prop_assert!(moves * step > cap - 1e-6);
        prop_assert!((moves - 1.0) * step <= cap + 1e-6);
    }
}

// ─── Seal ───────────────────────────────────────────────────────────

#[test]
fn seal_vents_then_waits_for_suction_delay() {
    let mut h = Harness::scripted(script_to_seal(&[1500.0]));
    h.enter_seal();
    let before = h.log.physical().len();
    let probes_before = h.log.count(|a| matches!(a, Actuation::ResistanceProbe { .. }));

    h.cycle(6.0, Event::Tick);
    assert_eq!(h.log.physical()[before..], [Actuation::Atmosphere { channel: 1 }]);

    h.cycle(7.9, Event::Tick);
    assert_eq!(h.log.physical().len(), before + 1);

    h.cycle(8.0, Event::Tick);
    assert_eq!(
        h.log.physical()[before + 1..],
        [pressure(-15.0, 1), Actuation::Suction { channel: 1 }]
    );
    // No reading is taken before suction engages.
    assert_eq!(
        h.log.count(|a| matches!(a, Actuation::ResistanceProbe { .. })),
        probes_before
    );

    h.cycle(8.5, Event::Tick);
    assert_eq!(h.phase(), PhaseKind::BreakIn);
    assert_eq!(h.controller.stats().seals, 1);
}

#[test]
fn seal_timeout_counts_from_suction() {
    // Exactly at threshold is not a seal.
    let mut h = Harness::scripted(script_to_seal(&[1000.0; 25]));
    h.enter_seal();
    h.cycle(6.0, Event::Tick);
    h.cycle(8.0, Event::Tick);

    for secs in 9..28_u32 {
        h.cycle(f64::from(secs), Event::Tick);
        assert_eq!(h.phase(), PhaseKind::Seal, "left Seal at {secs} s");
    }

    h.cycle(28.0, Event::Tick);
    assert_eq!(h.phase(), PhaseKind::Clean);
}

// ─── BreakIn ────────────────────────────────────────────────────────

#[test]
fn full_cycle_reaches_whole_cell_and_returns_to_capture() {
    let mut rig = script_to_seal(&[1500.0]);
    rig.push_transient(false)
        .push_transient(false)
        .push_transient(true);
    let mut h = Harness::scripted(rig);
    h.enter_break_in();

    h.cycle(10.0, Event::Tick);
    h.cycle(10.5, Event::Tick);
    match h.controller.phase() {
        Phase::BreakIn(b) => assert!(!b.pressure_set()),
        other => panic!("expected BreakIn, got {other:?}"),
    }

    h.cycle(11.0, Event::Tick);
    h.cycle(11.1, Event::Tick);
    h.cycle(11.2, Event::Tick);
    h.cycle(11.3, Event::Tick);
    assert_eq!(h.phase(), PhaseKind::WholeCell);

    h.cycle(12.0, Event::DeviceLocked);
    assert_eq!(h.phase(), PhaseKind::WholeCell);
    h.cycle(12.5, Event::PinEntered);
    assert_eq!(h.phase(), PhaseKind::Clean);
    h.cycle(13.0, Event::DeviceLocked);
    assert_eq!(h.phase(), PhaseKind::Capture);

    assert_eq!(
        h.log.physical(),
        vec![
            pressure(15.0, 2),
            Actuation::Suction { channel: 2 },
            pressure(-15.0, 2),
            hunt_move(),
            Actuation::Atmosphere { channel: 1 },
            pressure(-15.0, 1),
            Actuation::Suction { channel: 1 },
            Actuation::Atmosphere { channel: 1 },
            pressure(-600.0, 1),
            pulse(),
            pulse(),
            pulse(),
        ]
    );

    let stats = h.controller.stats();
    assert_eq!(stats.transitions, 6);
    assert_eq!(stats.captures, 2);
    assert_eq!(stats.seals, 1);
    assert_eq!(stats.whole_cells, 1);
    assert_eq!(stats.cleans, 1);
    assert_eq!(stats.aborts, 0);
}

#[test]
fn break_in_gives_up_on_eleventh_miss() {
    let mut rig = script_to_seal(&[1500.0]);
    for _ in 0..11 {
        rig.push_transient(false);
    }
    let mut h = Harness::scripted(rig);
    h.enter_break_in();
    h.cycle(10.0, Event::Tick);
    h.cycle(11.0, Event::Tick);

    for i in 1..=10 {
        h.cycle(11.0 + f64::from(i) * 0.1, Event::Tick);
        match h.controller.phase() {
            Phase::BreakIn(b) => assert_eq!(b.attempts(), i),
            other => panic!("expected BreakIn, got {other:?}"),
        }
    }

    h.cycle(12.5, Event::Tick);
    assert_eq!(h.phase(), PhaseKind::Clean);
    assert_eq!(h.log.count(|a| *a == pulse()), 11);
}

// ─── Pressure gating ────────────────────────────────────────────────

#[test]
fn disabled_pressure_skips_every_pressure_command() {
    let mut config = AutopatchConfig::default();
    config.rig.pressure_enabled = false;

    let mut rig = script_to_seal(&[1500.0]);
    rig.push_transient(true);
    let mut h = Harness::scripted_with(rig, config);
    h.enter_break_in();
    h.cycle(10.0, Event::Tick);
    h.cycle(11.0, Event::Tick);
    h.cycle(11.1, Event::Tick);
    assert_eq!(h.phase(), PhaseKind::WholeCell);

    assert_eq!(h.log.physical(), vec![hunt_move()]);

    assert_eq!(h.at(12.0, Event::Cancel).unwrap(), Some(RunOutcome::Cancelled));
    assert_eq!(h.log.physical(), vec![hunt_move(), Actuation::Release]);
}
