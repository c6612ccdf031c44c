//! Resistance and transient extraction from test-pulse waveforms.
//!
//! A probe plays one square pulse per period on the command channel and
//! acquires the membrane current. The pulse is high over the middle half
//! of the period, so two short windows are averaged per period:
//!
//! ```text
//!            ┌──────────────────┐
//!  command   │   plateau window │              rest window
//!  ──────────┘        ▒▒        └──────────────────▒▒─────
//!  0        n/4      0.39 n    3n/4               0.89 n  n
//! ```
//!
//! Resistance is `|ΔV / ΔI|` between the windows. A ruptured membrane adds
//! capacitive spikes at the pulse edges; the transient heuristic compares
//! the peak-to-peak range with the settled step.

use crate::consts::{SAMPLE_RATE_HZ, TRANSIENT_RATIO};
use thiserror::Error;

/// Plateau window for resistance, as fractions of one period.
const RESISTANCE_PLATEAU: (f64, f64) = (0.39, 0.40);
/// Rest window for resistance.
const RESISTANCE_REST: (f64, f64) = (0.89, 0.90);
/// Plateau window for the transient heuristic.
const TRANSIENT_PLATEAU: (f64, f64) = (0.30, 0.40);
/// Rest window for the transient heuristic.
const TRANSIENT_REST: (f64, f64) = (0.80, 0.90);

const OHM_PER_MOHM: f64 = 1e6;

/// Error types for waveform analysis.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// No samples, or too few samples for the analysis windows.
    #[error("waveform has too few samples")]
    Empty,

    /// Command and response have different lengths.
    #[error("command has {command} samples, response has {response}")]
    LengthMismatch { command: usize, response: usize },

    /// Response current does not change across the pulse.
    #[error("response is flat across the pulse")]
    FlatResponse,
}

/// Number of DAQ samples in one period at `frequency_hz`.
pub fn samples_per_period(frequency_hz: f64) -> usize {
    if frequency_hz <= 0.0 {
        return 0;
    }
    (SAMPLE_RATE_HZ / frequency_hz) as usize
}

/// Build one period of the probe command [V].
///
/// The level is `offset` everywhere and `offset + amplitude` over samples
/// `[n/4 − 1, 3n/4 − 1)`.
pub fn square_pulse(amplitude: f64, offset: f64, frequency_hz: f64) -> Vec<f64> {
    let n = samples_per_period(frequency_hz);
    let rise = (n as f64 / 4.0 - 1.0) as usize;
    let fall = (n as f64 * 3.0 / 4.0 - 1.0) as usize;

    (0..n)
        .map(|i| {
            if (rise..fall).contains(&i) {
                offset + amplitude
            } else {
                offset
            }
        })
        .collect()
}

/// Command voltage [V] and acquired current [A] for one probe.
#[derive(Debug, Clone, PartialEq)]
pub struct PulseWaveform {
    command: Vec<f64>,
    response: Vec<f64>,
}

impl PulseWaveform {
    /// Pair a command with its response.
    pub fn new(command: Vec<f64>, response: Vec<f64>) -> Result<Self, AnalysisError> {
        if command.is_empty() || response.is_empty() {
            return Err(AnalysisError::Empty);
        }
        if command.len() != response.len() {
            return Err(AnalysisError::LengthMismatch {
                command: command.len(),
                response: response.len(),
            });
        }
        Ok(Self { command, response })
    }

    /// Command samples [V].
    pub fn command(&self) -> &[f64] {
        &self.command
    }

    /// Response samples [A].
    pub fn response(&self) -> &[f64] {
        &self.response
    }

    /// Resistance per period [MΩ].
    pub fn resistance(&self, periods: usize) -> Result<Vec<f64>, AnalysisError> {
        resistance(self, periods)
    }

    /// Transient check over the whole response.
    pub fn has_transient(&self, floor: f64) -> Result<bool, AnalysisError> {
        has_transient(&self.response, floor)
    }
}

/// Resistance magnitude for each of `periods` equal slices of `waveform` [MΩ].
///
/// # Errors
///
/// `Empty` when a slice is too short to hold both windows, `FlatResponse`
/// when the current is identical in both windows.
pub fn resistance(waveform: &PulseWaveform, periods: usize) -> Result<Vec<f64>, AnalysisError> {
    if periods == 0 {
        return Err(AnalysisError::Empty);
    }
    let per_period = waveform.response.len() / periods;

    (0..periods)
        .map(|i| {
            let span = i * per_period..(i + 1) * per_period;
            let voltage = &waveform.command[span.clone()];
            let current = &waveform.response[span];

            let dv = window_mean(voltage, RESISTANCE_REST)? - window_mean(voltage, RESISTANCE_PLATEAU)?;
            let di = window_mean(current, RESISTANCE_REST)? - window_mean(current, RESISTANCE_PLATEAU)?;
            if di == 0.0 {
                return Err(AnalysisError::FlatResponse);
            }
            Ok((dv / di).abs() / OHM_PER_MOHM)
        })
        .collect()
}

/// Whether `response` carries a capacitive transient.
///
/// True when the peak-to-peak range exceeds the settled step by more than
/// [`TRANSIENT_RATIO`] and the peak rises more than `floor` amperes above
/// the rest level. A response with no settled step but a nonzero range
/// counts as an unbounded ratio.
pub fn has_transient(response: &[f64], floor: f64) -> Result<bool, AnalysisError> {
    let rest = window_mean(response, TRANSIENT_REST)?;
    let plateau = window_mean(response, TRANSIENT_PLATEAU)?;

    let (min, max) = response
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
            (lo.min(x), hi.max(x))
        });
    let range = max - min;
    let step = (rest - plateau).abs();

    let ratio_exceeded = if step == 0.0 {
        range > 0.0
    } else {
        range / step > TRANSIENT_RATIO
    };

    Ok(ratio_exceeded && max - rest > floor)
}

/// Mean of the samples between two fractions of the slice length.
fn window_mean(samples: &[f64], (start, end): (f64, f64)) -> Result<f64, AnalysisError> {
    let len = samples.len() as f64;
    let window = samples
        .get((start * len) as usize..(end * len) as usize)
        .filter(|w| !w.is_empty())
        .ok_or(AnalysisError::Empty)?;
    Ok(window.iter().sum::<f64>() / window.len() as f64)
}
