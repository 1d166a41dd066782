//! Channelization filter design and zero-phase application
//!
//! The sweep pipeline isolates the band of interest with a lowpass FIR
//! filter before any statistics are computed. Filters are designed with the
//! windowed-sinc method and a Kaiser window, so the stopband-attenuation
//! target maps directly onto the window's β parameter and the filter order
//! follows from the transition width.
//!
//! Design is pure and deterministic: the same [`FilterSpec`] and sample rate
//! always produce bit-identical coefficients, which lets a compiled filter
//! be cached and reused across every segment of a sweep that shares a
//! sample rate.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use super::windows::{kaiser_beta_from_attenuation, kaiser_order, Window};
use crate::types::IQSample;

/// Largest filter order the designer will realize. A spec whose attenuation
/// and transition-width targets require more taps than this is rejected as
/// infeasible rather than silently degraded.
pub const MAX_TAPS: usize = 4097;

/// Passband/stopband requirements for the channelization lowpass filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Maximum passband ripple in dB
    pub passband_ripple_db: f64,
    /// Minimum stopband attenuation in dB
    pub stopband_atten_db: f64,
    /// Passband edge frequency in Hz
    pub passband_edge_hz: f64,
    /// Stopband edge frequency in Hz
    pub stopband_edge_hz: f64,
}

/// Reasons a [`FilterSpec`] cannot be realized at a given sample rate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InfeasibleFilterError {
    #[error("stopband edge {stopband_hz} Hz must lie above passband edge {passband_hz} Hz")]
    EdgesInverted { passband_hz: f64, stopband_hz: f64 },

    #[error("band edge {edge_hz} Hz outside (0, {nyquist_hz}) Hz at sample rate {sample_rate_hz} Hz")]
    EdgeOutOfRange {
        edge_hz: f64,
        nyquist_hz: f64,
        sample_rate_hz: f64,
    },

    #[error("ripple/attenuation targets must be positive (ripple {ripple_db} dB, attenuation {atten_db} dB)")]
    InvalidTargets { ripple_db: f64, atten_db: f64 },

    #[error("targets require {required_taps} taps, above the {max_taps}-tap limit")]
    AttenuationUnreachable {
        required_taps: usize,
        max_taps: usize,
    },

    #[error("sample rate must be positive, got {0} Hz")]
    InvalidSampleRate(f64),
}

/// A designed lowpass filter bound to the sample rate it was designed for.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFilter {
    coeffs: Vec<f64>,
    sample_rate_hz: f64,
}

impl CompiledFilter {
    /// Design a Kaiser-windowed-sinc lowpass filter satisfying `spec` at
    /// `sample_rate_hz`.
    ///
    /// The cutoff sits at the midpoint of the transition band; β comes from
    /// the stopband attenuation and the order from the normalized transition
    /// width. Tap count is forced odd so the filter is linear-phase with an
    /// integer group delay.
    pub fn design(spec: &FilterSpec, sample_rate_hz: f64) -> Result<Self, InfeasibleFilterError> {
        if !(sample_rate_hz > 0.0) {
            return Err(InfeasibleFilterError::InvalidSampleRate(sample_rate_hz));
        }
        let nyquist = sample_rate_hz / 2.0;
        if spec.stopband_edge_hz <= spec.passband_edge_hz {
            return Err(InfeasibleFilterError::EdgesInverted {
                passband_hz: spec.passband_edge_hz,
                stopband_hz: spec.stopband_edge_hz,
            });
        }
        for &edge in &[spec.passband_edge_hz, spec.stopband_edge_hz] {
            if !(edge > 0.0) || edge >= nyquist {
                return Err(InfeasibleFilterError::EdgeOutOfRange {
                    edge_hz: edge,
                    nyquist_hz: nyquist,
                    sample_rate_hz,
                });
            }
        }
        if !(spec.passband_ripple_db > 0.0) || !(spec.stopband_atten_db > 0.0) {
            return Err(InfeasibleFilterError::InvalidTargets {
                ripple_db: spec.passband_ripple_db,
                atten_db: spec.stopband_atten_db,
            });
        }

        let transition_width = (spec.stopband_edge_hz - spec.passband_edge_hz) / sample_rate_hz;
        let order = kaiser_order(transition_width, spec.stopband_atten_db);
        let num_taps = if order % 2 == 0 { order + 1 } else { order };
        if num_taps > MAX_TAPS {
            return Err(InfeasibleFilterError::AttenuationUnreachable {
                required_taps: num_taps,
                max_taps: MAX_TAPS,
            });
        }

        let beta = kaiser_beta_from_attenuation(spec.stopband_atten_db);
        let cutoff_hz = 0.5 * (spec.passband_edge_hz + spec.stopband_edge_hz);
        let coeffs = windowed_sinc_lowpass(cutoff_hz, sample_rate_hz, num_taps, Window::Kaiser(beta));

        Ok(Self {
            coeffs,
            sample_rate_hz,
        })
    }

    /// Filter coefficients (impulse response).
    pub fn coefficients(&self) -> &[f64] {
        &self.coeffs
    }

    /// Number of taps.
    pub fn num_taps(&self) -> usize {
        self.coeffs.len()
    }

    /// Sample rate this filter was designed for, in Hz.
    pub fn sample_rate_hz(&self) -> f64 {
        self.sample_rate_hz
    }

    /// Group delay in samples: (N-1)/2, exact for the odd tap count.
    pub fn group_delay_samples(&self) -> usize {
        (self.coeffs.len() - 1) / 2
    }

    /// True if this compiled filter is valid for `sample_rate_hz`.
    pub fn matches_rate(&self, sample_rate_hz: f64) -> bool {
        self.sample_rate_hz == sample_rate_hz
    }

    /// Apply the filter with group-delay compensation.
    ///
    /// Output sample `k` is the convolution centered on input sample `k`
    /// (zero-padded at the block edges), so the filtered block is the same
    /// length as the input and a tone's power envelope is not shifted by the
    /// filter's group delay. Block-boundary taps see zeros; the first
    /// time-domain window of the reduction stage absorbs that transient
    /// deterministically.
    pub fn apply(&self, input: &[IQSample]) -> Vec<IQSample> {
        let n = self.coeffs.len();
        let g = self.group_delay_samples() as isize;
        let len = input.len() as isize;

        (0..len)
            .map(|k| {
                let mut acc = Complex64::new(0.0, 0.0);
                for (j, &h) in self.coeffs.iter().enumerate() {
                    let idx = k + g - j as isize;
                    if idx >= 0 && idx < len {
                        acc += input[idx as usize] * h;
                    }
                }
                acc
            })
            .collect()
    }

    /// True when the impulse response is symmetric (linear phase).
    pub fn is_linear_phase(&self) -> bool {
        let n = self.coeffs.len();
        (0..n / 2).all(|i| (self.coeffs[i] - self.coeffs[n - 1 - i]).abs() < 1e-12)
    }
}

/// Windowed-sinc lowpass design, normalized to unity DC gain.
fn windowed_sinc_lowpass(
    cutoff_hz: f64,
    sample_rate: f64,
    num_taps: usize,
    window: Window,
) -> Vec<f64> {
    let fc = cutoff_hz / sample_rate;
    let mid = (num_taps - 1) as f64 / 2.0;
    let window_coeffs = window.generate(num_taps);

    let mut coeffs: Vec<f64> = (0..num_taps)
        .map(|i| {
            let n = i as f64 - mid;
            let sinc = if n.abs() < 1e-10 {
                2.0 * PI * fc
            } else {
                (2.0 * PI * fc * n).sin() / n
            };
            sinc * window_coeffs[i]
        })
        .collect();

    let sum: f64 = coeffs.iter().sum();
    if sum.abs() > 1e-10 {
        for c in coeffs.iter_mut() {
            *c /= sum;
        }
    }
    coeffs
}
