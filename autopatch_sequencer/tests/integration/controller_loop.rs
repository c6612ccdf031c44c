//! `Controller::run` over the real event queue.

use std::io;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use autopatch_common::rig::config::RigConfig;
use autopatch_common::rig::port::SensorPort;
use autopatch_rig::{Actuation, ActuationLog, RigRegistry, ScriptedRig};
use autopatch_sequencer::clock::ManualClock;
use autopatch_sequencer::config::AutopatchConfig;
use autopatch_sequencer::telemetry::{JsonLinesSink, Snapshot, SnapshotSink};
use autopatch_sequencer::{Controller, Event, PhaseKind, RunOutcome};

fn fast_config(max_ticks: Option<u64>) -> AutopatchConfig {
    let mut config = AutopatchConfig::default();
    config.controller.tick_interval_ms = 1;
    config.controller.max_ticks = max_ticks;
    config
}

fn scripted_controller(config: &AutopatchConfig, clock: ManualClock) -> (Controller, ActuationLog) {
    let mut rig = ScriptedRig::new();
    let log = rig.log();
    rig.init(&RigConfig::default()).unwrap();
    (Controller::new(config, Box::new(rig), Box::new(clock)), log)
}

/// Sink that keeps snapshots in memory.
#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<Snapshot>>>);

impl SnapshotSink for Recorder {
    fn record(&mut self, snapshot: &Snapshot) -> io::Result<()> {
        self.0.lock().unwrap().push(*snapshot);
        Ok(())
    }
}

#[test]
fn first_cycle_is_configure_then_queued_events() {
    let (controller, log) =
        scripted_controller(&fast_config(None), ManualClock::stepping(Duration::from_millis(100)));
    let recorder = Recorder::default();
    controller.sender().send(Event::Cancel);
    let mut controller = controller.with_sink(Box::new(recorder.clone()));

    assert_eq!(controller.run().unwrap(), RunOutcome::Cancelled);

    let snapshots = recorder.0.lock().unwrap();
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].event, Event::Configure);
    assert_eq!(snapshots[0].phase, PhaseKind::Capture);
    assert_eq!(snapshots[0].at, Duration::from_millis(100));

    assert_eq!(
        log.physical(),
        vec![
            Actuation::Pressure {
                kpa: 15.0,
                channel: 2
            },
            Actuation::Suction { channel: 2 },
            Actuation::Atmosphere { channel: 1 },
            Actuation::Atmosphere { channel: 2 },
            Actuation::Release,
        ]
    );
}

#[test]
fn idle_queue_falls_back_to_ticks_until_limit() {
    let (mut controller, log) =
        scripted_controller(&fast_config(Some(20)), ManualClock::stepping(Duration::from_millis(100)));

    assert_eq!(controller.run().unwrap(), RunOutcome::TickLimitReached);
    assert_eq!(controller.stats().ticks, 20);
    // Under 2 s of plain ticks: capture suction not yet applied.
    assert_eq!(controller.phase_kind(), PhaseKind::Capture);
    assert_eq!(
        log.count(|a| matches!(a, Actuation::Pressure { kpa, .. } if *kpa < 0.0)),
        0
    );
    assert_eq!(log.count(|a| *a == Actuation::Release), 1);
}

#[test]
fn operator_answer_from_another_thread_is_delivered() {
    let clock = ManualClock::stepping(Duration::from_secs(1));
    let (mut controller, _log) = scripted_controller(&fast_config(Some(5000)), clock.clone());
    let sender = controller.sender();

    let operator = thread::spawn(move || {
        while clock.peek() < Duration::from_secs(6) {
            thread::sleep(Duration::from_millis(1));
        }
        sender.send(Event::UserNo);
        thread::sleep(Duration::from_millis(20));
        sender.send(Event::Cancel);
    });

    assert_eq!(controller.run().unwrap(), RunOutcome::Cancelled);
    operator.join().unwrap();
    assert_eq!(controller.stats().cleans, 1);
}

#[test]
fn json_lines_sink_writes_one_object_per_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trace.jsonl");

    let (controller, _log) =
        scripted_controller(&fast_config(Some(4)), ManualClock::stepping(Duration::from_millis(250)));
    let mut controller = controller.with_sink(Box::new(JsonLinesSink::create(&path).unwrap()));
    assert_eq!(controller.run().unwrap(), RunOutcome::TickLimitReached);
    drop(controller);

    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<serde_json::Value> = text
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0]["event"], "configure");
    assert_eq!(lines[3]["tick"], 4);
    assert_eq!(lines[3]["phase"], "capture");
    assert_eq!(lines[3]["at"], 1.0);
}

#[test]
fn controller_accepts_any_sensor_port() {
    let mut rig = RigRegistry::with_builtin().create("scripted").unwrap();
    rig.init(&RigConfig::default()).unwrap();

    let mut controller = Controller::new(&fast_config(Some(1)), rig, Box::new(ManualClock::new()));
    assert_eq!(controller.run().unwrap(), RunOutcome::TickLimitReached);
}
