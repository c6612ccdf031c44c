//! Workspace-wide constants for the autopatch sequence.
//!
//! Single source of truth for default thresholds, timings and channel
//! assignments. Config structs use these as serde defaults; every value
//! can be overridden from TOML.

// ─── Stimulus ───────────────────────────────────────────────────────

/// Test-pulse frequency used for every resistance/transient probe [Hz].
pub const PROBE_FREQUENCY_HZ: f64 = 60.0;

/// DAQ sample rate used when synthesising or analysing pulses [samples/s].
pub const SAMPLE_RATE_HZ: f64 = 20_000.0;

/// Minimum absolute overshoot of the transient peak above the "high"
/// window average [A].
pub const TRANSIENT_FLOOR_A: f64 = 1e-9;

/// Ratio of peak-to-peak range over the settled step above which a
/// discontinuity counts as a transient.
pub const TRANSIENT_RATIO: f64 = 2.0;

// ─── Pressure channels ──────────────────────────────────────────────

/// Pressure-controller channel feeding the patch pipette.
pub const PATCH_CHANNEL: u8 = 1;

/// Pressure-controller channel feeding the capture pipette.
pub const CAPTURE_CHANNEL: u8 = 2;

// ─── Capture ────────────────────────────────────────────────────────

/// Positive holding pressure issued on Capture entry [kPa].
pub const CAPTURE_BASELINE_KPA: f64 = 15.0;

/// Suction applied to the capture pipette [kPa].
pub const CAPTURE_SUCTION_KPA: f64 = -15.0;

/// Delay before capture suction engages [s].
pub const CAPTURE_SUCTION_DELAY_S: f64 = 3.0;

/// Delay before the operator is asked whether a cell was acquired [s].
pub const CAPTURE_DECISION_DELAY_S: f64 = 5.0;

// ─── Hunt ───────────────────────────────────────────────────────────

/// Manipulator axis advanced while hunting (0 = x, 1 = y, 2 = z).
pub const HUNT_AXIS: u8 = 2;

/// Signed step applied to the hunt axis each tick [µm].
pub const HUNT_STEP_UM: f64 = -2.0;

/// Manipulator speed preset used for hunt steps.
pub const HUNT_SPEED: u8 = 1;

/// Maximum accumulated hunt travel before the run is abandoned [µm].
pub const HUNT_DISPLACEMENT_CAP_UM: f64 = 100.0;

/// Number of probe pulses averaged into the Hunt baseline.
pub const HUNT_BASELINE_PULSES: u32 = 3;

/// Reading below `ratio × baseline` means a broken or clogged tip.
pub const HUNT_ABORT_RATIO: f64 = 0.01;

/// Reading above `ratio × baseline` means membrane contact.
pub const HUNT_CONTACT_RATIO: f64 = 1.1;

// ─── Seal ───────────────────────────────────────────────────────────

/// Delay between venting and engaging seal suction [s].
pub const SEAL_SUCTION_DELAY_S: f64 = 2.0;

/// Suction applied to the patch pipette to form a seal [kPa].
pub const SEAL_SUCTION_KPA: f64 = -15.0;

/// Resistance above which a gigaseal is declared [MΩ].
pub const SEAL_THRESHOLD_MOHM: f64 = 1.0e3;

/// Time allowed after suction engages for the seal to form [s].
pub const SEAL_TIMEOUT_S: f64 = 20.0;

// ─── Break-in ───────────────────────────────────────────────────────

/// Delay between venting and applying break-in pressure [s].
pub const BREAK_IN_PRESSURE_DELAY_S: f64 = 1.0;

/// Strong negative pressure held during break-in [kPa].
pub const BREAK_IN_PRESSURE_KPA: f64 = -600.0;

/// Duration of each break-in pressure pulse [ms].
pub const BREAK_IN_PULSE_MS: u64 = 300;

/// Break-in attempts allowed before giving up on the cell.
pub const BREAK_IN_MAX_ATTEMPTS: u32 = 10;

// ─── Controller ─────────────────────────────────────────────────────

/// Cycle budget: how long the loop waits for an external event before
/// issuing a plain tick [ms].
pub const TICK_INTERVAL_MS: u64 = 100;

/// Service name used in logs and snapshots.
pub const SERVICE_NAME: &str = "autopatch";
