//! End-to-end runs against the simulated rig.

use std::time::Duration;

use autopatch_common::config::ConfigLoader;
use autopatch_common::rig::port::SensorPort;
use autopatch_rig::SimulatedRig;
use autopatch_sequencer::clock::ManualClock;
use autopatch_sequencer::config::AutopatchConfig;
use autopatch_sequencer::{Controller, Event, FatalError, PhaseKind, RunError, RunOutcome};

fn simulated(params: &str) -> (Controller, ManualClock) {
    let config = AutopatchConfig::from_toml_str(&format!(
        "[rig]\ndriver = \"simulation\"\n\n[rig.driver_config.simulation]\n{params}"
    ))
    .unwrap();
    config.validate().unwrap();

    let mut rig = SimulatedRig::new();
    rig.init(&config.rig).unwrap();
    let clock = ManualClock::new();
    let controller = Controller::new(&config, Box::new(rig), Box::new(clock.clone()));
    (controller, clock)
}

/// Operator that answers "yes" to capture and enters the pin in whole-cell.
fn operator(phase: PhaseKind) -> Event {
    match phase {
        PhaseKind::Capture => Event::UserYes,
        PhaseKind::WholeCell => Event::PinEntered,
        _ => Event::Tick,
    }
}

/// Tick every 500 ms until `phase` is live or the run ends.
fn run_until(
    controller: &mut Controller,
    clock: &ManualClock,
    phase: PhaseKind,
    max_cycles: u32,
) -> Result<Option<RunOutcome>, RunError> {
    controller.tick(Event::Configure)?;
    for _ in 0..max_cycles {
        if controller.phase_kind() == phase {
            return Ok(None);
        }
        clock.advance(Duration::from_millis(500));
        if let Some(outcome) = controller.tick(operator(controller.phase_kind()))? {
            return Ok(Some(outcome));
        }
    }
    panic!("{phase} not reached, stuck in {}", controller.phase_kind());
}

#[test]
fn healthy_cell_reaches_whole_cell() {
    let (mut controller, clock) = simulated("seed = 5\nbreak_in_probability = 1.0");

    let outcome = run_until(&mut controller, &clock, PhaseKind::WholeCell, 400).unwrap();
    assert_eq!(outcome, None);

    let stats = *controller.stats();
    assert_eq!(stats.seals, 1);
    assert_eq!(stats.whole_cells, 1);
    assert_eq!(stats.aborts, 0);
    assert!(clock.peek() < Duration::from_secs(60), "took {:?}", clock.peek());

    clock.advance(Duration::from_millis(500));
    controller.tick(Event::PinEntered).unwrap();
    assert_eq!(controller.phase_kind(), PhaseKind::Clean);
}

#[test]
fn broken_tip_aborts_and_halts() {
    let (mut controller, clock) = simulated("fault = \"broken_tip\"");

    let outcome = run_until(&mut controller, &clock, PhaseKind::WholeCell, 100).unwrap();
    assert_eq!(outcome, Some(RunOutcome::Halted));
    assert_eq!(controller.phase_kind(), PhaseKind::Abort);
    assert_eq!(controller.stats().aborts, 1);
    assert!(controller.teardown_state().is_complete());
}

#[test]
fn missing_cell_exhausts_hunt_travel() {
    let (mut controller, clock) = simulated("fault = \"no_cell\"");

    let err = run_until(&mut controller, &clock, PhaseKind::Seal, 200).unwrap_err();
    assert!(matches!(
        err,
        RunError::Fatal {
            phase: PhaseKind::Hunt,
            source: FatalError::DisplacementCapExceeded { .. },
        }
    ));
    assert!(controller.teardown_state().is_complete());
}

#[test]
fn weak_break_in_pressure_gives_up_on_cell() {
    let (mut controller, clock) =
        simulated("seed = 3\nbreak_in_probability = 1.0\nrupture_pressure_kpa = -900.0");

    run_until(&mut controller, &clock, PhaseKind::Clean, 400).unwrap();
    let stats = controller.stats();
    assert_eq!(stats.seals, 1);
    assert_eq!(stats.whole_cells, 0);
    assert_eq!(stats.cleans, 1);
}
