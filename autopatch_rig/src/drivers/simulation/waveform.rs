//! Current-response synthesis for the simulated amplifier.

use rand::Rng;

const OHM_PER_MOHM: f64 = 1e6;

/// Electrical picture seen by one probe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResponseShape {
    /// Steady-state resistance between pipette and bath [MΩ].
    pub resistance_mohm: f64,
    /// Access resistance charging the membrane capacitance; `None` while
    /// the membrane is intact [MΩ].
    pub access_mohm: Option<f64>,
    /// Decay constant of capacitive spikes [samples].
    pub decay_samples: f64,
    /// Uniform per-sample noise, relative to the resistive step.
    pub noise_fraction: f64,
}

/// Current [A] acquired while `command` [V] is played into `shape`.
pub fn synthesize_response<R: Rng>(
    command: &[f64],
    shape: &ResponseShape,
    rng: &mut R,
) -> Vec<f64> {
    let ohms = shape.resistance_mohm * OHM_PER_MOHM;
    let (lo, hi) = command
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let noise = if command.is_empty() {
        0.0
    } else {
        shape.noise_fraction * (hi - lo) / ohms
    };
    let decay = (-1.0 / shape.decay_samples).exp();

    let mut spike = 0.0;
    let mut previous = command.first().copied().unwrap_or_default();
    command
        .iter()
        .map(|&v| {
            spike *= decay;
            if let Some(access) = shape.access_mohm {
                spike += (v - previous) / (access * OHM_PER_MOHM);
            }
            previous = v;

            let jitter = if noise > 0.0 {
                rng.gen_range(-noise..noise)
            } else {
                0.0
            };
            v / ohms + spike + jitter
        })
        .collect()
}
