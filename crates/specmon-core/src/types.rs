//! Core types for swept-spectrum data-product computation
//!
//! Defines the complex-sample aliases, power-unit conversions, and the raw
//! acquisition block shared by every reduction. All statistics in this crate
//! accumulate in linear power (watts into the reference impedance) and convert
//! to dB only at the output boundary, so repeated runs over the same block are
//! bit-reproducible.

use num_complex::Complex64;
use std::time::SystemTime;

/// A single I/Q sample point
pub type IQSample = Complex64;

/// A buffer of I/Q samples
pub type IQBuffer = Vec<IQSample>;

/// Reference impedance used when interpreting sample amplitude as RF power.
///
/// Sample magnitudes are calibrated volts at the analyzer input, so
/// instantaneous power is `|s|^2 / 50` watts.
pub const REFERENCE_IMPEDANCE_OHMS: f64 = 50.0;

/// Instantaneous power of one sample in watts (50 ohm reference).
#[inline]
pub fn sample_power_watts(s: IQSample) -> f64 {
    s.norm_sqr() / REFERENCE_IMPEDANCE_OHMS
}

/// Convert power in watts to dBm: `10 * log10(watts * 1000)`.
///
/// Returns `f64::NEG_INFINITY` for non-positive watts.
pub fn watts_to_dbm(watts: f64) -> f64 {
    if watts <= 0.0 {
        f64::NEG_INFINITY
    } else {
        10.0 * (watts * 1000.0).log10()
    }
}

/// Convert dBm to watts: `10^(dbm/10) / 1000`.
pub fn dbm_to_watts(dbm: f64) -> f64 {
    10.0_f64.powf(dbm / 10.0) / 1000.0
}

/// Errors raised by the statistical reductions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReductionError {
    /// A reduction was handed a zero-length sample block. Surfaced as a
    /// defect rather than producing NaN statistics.
    #[error("cannot reduce an empty sample block")]
    EmptyBlock,
}

/// One bounded-duration capture at a single center frequency.
///
/// Produced by the segment acquirer and never mutated afterwards; the
/// channelization filter emits a new block rather than editing this one.
#[derive(Debug, Clone)]
pub struct RawBlock {
    samples: IQBuffer,
    sample_rate_hz: f64,
    acquisition_timestamp: SystemTime,
}

impl RawBlock {
    /// Wrap an acquired sample buffer with its acquisition metadata.
    pub fn new(samples: IQBuffer, sample_rate_hz: f64, acquisition_timestamp: SystemTime) -> Self {
        Self {
            samples,
            sample_rate_hz,
            acquisition_timestamp,
        }
    }

    /// The acquired samples, post skip-interval.
    pub fn samples(&self) -> &[IQSample] {
        &self.samples
    }

    /// Number of complex samples in the block.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True if the block holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample rate the block was captured at, in Hz.
    pub fn sample_rate_hz(&self) -> f64 {
        self.sample_rate_hz
    }

    /// Wall-clock time at which the capture was started.
    pub fn acquisition_timestamp(&self) -> SystemTime {
        self.acquisition_timestamp
    }

    /// Build a new block holding `samples`, keeping this block's metadata.
    ///
    /// Used by the channelization filter, which never edits in place.
    pub fn with_samples(&self, samples: IQBuffer) -> Self {
        Self {
            samples,
            sample_rate_hz: self.sample_rate_hz,
            acquisition_timestamp: self.acquisition_timestamp,
        }
    }
}
