//! Shared harness: a controller over a scripted rig and a hand-set clock.

use std::time::Duration;

use autopatch_common::rig::port::SensorPort;
use autopatch_rig::{ActuationLog, ScriptedRig};
use autopatch_sequencer::clock::ManualClock;
use autopatch_sequencer::config::AutopatchConfig;
use autopatch_sequencer::{Controller, Event, PhaseKind, RunError, RunOutcome};

pub struct Harness {
    pub controller: Controller,
    pub clock: ManualClock,
    pub log: ActuationLog,
}

impl Harness {
    pub fn scripted(rig: ScriptedRig) -> Self {
        Self::scripted_with(rig, AutopatchConfig::default())
    }

    pub fn scripted_with(mut rig: ScriptedRig, config: AutopatchConfig) -> Self {
        let log = rig.log();
        rig.init(&config.rig).unwrap();
        let (controller, clock) = controller_over(Box::new(rig), &config);
        Self {
            controller,
            clock,
            log,
        }
    }

    /// One cycle at `secs` on the clock.
    pub fn at(&mut self, secs: f64, event: Event) -> Result<Option<RunOutcome>, RunError> {
        self.clock.set(Duration::from_secs_f64(secs));
        self.controller.tick(event)
    }

    /// One cycle that must neither fail nor end the run.
    pub fn cycle(&mut self, secs: f64, event: Event) {
        let outcome = self.at(secs, event).unwrap();
        assert_eq!(outcome, None, "run ended at {secs} s");
    }

    pub fn phase(&self) -> PhaseKind {
        self.controller.phase_kind()
    }

    /// Configure at 0 s, operator says yes at 5 s.
    pub fn enter_hunt(&mut self) {
        self.cycle(0.0, Event::Configure);
        self.cycle(5.0, Event::UserYes);
        assert_eq!(self.phase(), PhaseKind::Hunt);
    }

    /// Hunt with a baseline at 5.1 s and contact at 5.2 s.
    ///
    /// The script must start with three baseline readings and one contact
    /// reading.
    pub fn enter_seal(&mut self) {
        self.enter_hunt();
        self.cycle(5.1, Event::Tick);
        self.cycle(5.2, Event::Tick);
        assert_eq!(self.phase(), PhaseKind::Seal);
    }

    /// Seal vents at 6 s, engages suction at 8 s and reads a gigaseal at 9 s.
    ///
    /// The script must continue with one reading above the seal threshold.
    pub fn enter_break_in(&mut self) {
        self.enter_seal();
        self.cycle(6.0, Event::Tick);
        self.cycle(8.0, Event::Tick);
        self.cycle(9.0, Event::Tick);
        assert_eq!(self.phase(), PhaseKind::BreakIn);
    }
}

/// Controller over an already-initialized rig, with a frozen clock.
pub fn controller_over(
    rig: Box<dyn SensorPort>,
    config: &AutopatchConfig,
) -> (Controller, ManualClock) {
    let clock = ManualClock::new();
    let controller = Controller::new(config, rig, Box::new(clock.clone()));
    (controller, clock)
}

/// Three baseline readings of 10 MΩ, contact at 11.5 MΩ, then `rest`.
pub fn script_to_seal(rest: &[f64]) -> ScriptedRig {
    let mut rig = ScriptedRig::new();
    rig.repeat_resistance(10.0, 3).push_resistance(11.5);
    for &reading in rest {
        rig.push_resistance(reading);
    }
    rig
}
