//! Signal analyzer abstraction
//!
//! Defines the common interface the sweep pipeline drives. The analyzer is
//! a single shared physical resource: callers hold it by exclusive
//! reference, which is the single-writer token that keeps gain changes and
//! captures for different segments from ever overlapping.

use std::time::Duration;

use specmon_core::types::IQSample;

/// Result type for analyzer operations.
pub type AnalyzerResult<T> = Result<T, AnalyzerError>;

/// Errors reported by the analyzer hardware layer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalyzerError {
    #[error("{setting} value {value} out of range ({min}..{max})")]
    OutOfRange {
        setting: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("sample rate {0} samples/sec is not a supported rate")]
    UnsupportedSampleRate(f64),

    #[error("timed out waiting for {0}")]
    Timeout(String),

    #[error("hardware fault: {0}")]
    Hardware(String),

    #[error("device not connected")]
    NotConnected,
}

/// Sample rates the front end can deliver, paired with the IQ bandwidth
/// that selects each rate. Ordered from greatest to least; the bandwidth is
/// what the hardware actually configures, the sample rate follows from it.
pub const SAMPLE_RATE_BANDWIDTH_MAP: &[(f64, f64)] = &[
    (56.0e6, 40.0e6),
    (28.0e6, 20.0e6),
    (14.0e6, 10.0e6),
    (7.0e6, 5.0e6),
    (3.5e6, 2.5e6),
    (1.75e6, 1.25e6),
    (875.0e3, 625.0e3),
    (437.5e3, 312.5e3),
    (218.75e3, 156.25e3),
    (109.375e3, 78.125e3),
    (54_687.5, 39_062.5),
    (27_343.75, 19_531.25),
    (13_671.875, 9_765.625),
];

/// Static limits and supported rates of an analyzer front end.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerCapabilities {
    /// Lowest tunable center frequency in Hz
    pub min_frequency_hz: f64,
    /// Highest tunable center frequency in Hz
    pub max_frequency_hz: f64,
    /// Lowest settable reference level in dBm
    pub min_reference_level_dbm: f64,
    /// Highest settable reference level in dBm
    pub max_reference_level_dbm: f64,
    /// Maximum front-end attenuation in dB
    pub max_attenuation_db: f64,
    /// Supported sample rates in samples/sec
    pub sample_rates: Vec<f64>,
}

impl Default for AnalyzerCapabilities {
    fn default() -> Self {
        Self {
            min_frequency_hz: 9.0e3,
            max_frequency_hz: 6.2e9,
            min_reference_level_dbm: -130.0,
            max_reference_level_dbm: 30.0,
            max_attenuation_db: 51.0,
            sample_rates: SAMPLE_RATE_BANDWIDTH_MAP.iter().map(|&(sr, _)| sr).collect(),
        }
    }
}

impl AnalyzerCapabilities {
    /// True if `rate` is one of the supported sample rates.
    pub fn supports_sample_rate(&self, rate: f64) -> bool {
        self.sample_rates.iter().any(|&sr| sr == rate)
    }

    /// IQ bandwidth selecting the given sample rate, if supported.
    pub fn iq_bandwidth_for(rate: f64) -> Option<f64> {
        SAMPLE_RATE_BANDWIDTH_MAP
            .iter()
            .find(|&&(sr, _)| sr == rate)
            .map(|&(_, bw)| bw)
    }
}

/// Common interface for swept-spectrum analyzer front ends.
///
/// Every setter is fallible: hardware may refuse a value outright
/// (`OutOfRange`, `UnsupportedSampleRate`) or fail internally (`Hardware`).
/// Getters read back the device's view of its own state; the gain
/// controller relies on them for confirmation.
pub trait SignalAnalyzer: Send {
    /// Device name/description.
    fn name(&self) -> &str;

    /// Static device limits.
    fn capabilities(&self) -> &AnalyzerCapabilities;

    /// Tune the center frequency in Hz.
    fn set_center_frequency(&mut self, hz: f64) -> AnalyzerResult<()>;

    /// Current center frequency in Hz.
    fn center_frequency(&self) -> f64;

    /// Select the sample rate in samples/sec (via the paired IQ bandwidth).
    fn set_sample_rate(&mut self, rate: f64) -> AnalyzerResult<()>;

    /// Current sample rate in samples/sec.
    fn sample_rate(&self) -> f64;

    /// Set the reference level in dBm.
    fn set_reference_level(&mut self, dbm: f64) -> AnalyzerResult<()>;

    /// Reference level the device reports, in dBm.
    fn reference_level(&self) -> f64;

    /// Set front-end attenuation in dB.
    fn set_attenuation(&mut self, db: f64) -> AnalyzerResult<()>;

    /// Attenuation the device reports, in dB.
    fn attenuation(&self) -> f64;

    /// Enable or disable the preamp.
    fn set_preamp(&mut self, enabled: bool) -> AnalyzerResult<()>;

    /// Preamp state the device reports.
    fn preamp_enabled(&self) -> bool;

    /// Capture `num_samples` complex samples at the current tuning.
    ///
    /// Must return within `deadline` or fail with
    /// [`AnalyzerError::Timeout`]. May deliver fewer samples than requested
    /// on a buffer fault; the caller treats that as an underrun.
    fn acquire(&mut self, num_samples: usize, deadline: Duration) -> AnalyzerResult<Vec<IQSample>>;
}

/// Number of samples a health check captures.
const HEALTH_CHECK_SAMPLES: usize = 100_000;

/// Verify the analyzer delivers data by collecting a short IQ capture.
///
/// Returns the delivered sample count on success; a short block is a
/// hardware fault.
pub fn health_check(analyzer: &mut dyn SignalAnalyzer) -> AnalyzerResult<usize> {
    let rate = analyzer.sample_rate();
    let nominal_ms = (HEALTH_CHECK_SAMPLES as f64 / rate * 1000.0).ceil() as u64;
    let deadline = Duration::from_millis((2 * nominal_ms).max(100));

    let data = analyzer.acquire(HEALTH_CHECK_SAMPLES, deadline)?;
    if data.len() != HEALTH_CHECK_SAMPLES {
        return Err(AnalyzerError::Hardware(format!(
            "health check requested {} samples but got {}",
            HEALTH_CHECK_SAMPLES,
            data.len()
        )));
    }
    tracing::debug!(device = analyzer.name(), samples = data.len(), "health check passed");
    Ok(data.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities_default_limits() {
        let caps = AnalyzerCapabilities::default();
        assert_eq!(caps.min_reference_level_dbm, -130.0);
        assert_eq!(caps.max_reference_level_dbm, 30.0);
        assert_eq!(caps.sample_rates.len(), 13);
    }

    #[test]
    fn test_sample_rate_support() {
        let caps = AnalyzerCapabilities::default();
        assert!(caps.supports_sample_rate(14.0e6));
        assert!(caps.supports_sample_rate(13_671.875));
        assert!(!caps.supports_sample_rate(1.0e6));
    }

    #[test]
    fn test_bandwidth_pairing() {
        assert_eq!(AnalyzerCapabilities::iq_bandwidth_for(14.0e6), Some(10.0e6));
        assert_eq!(AnalyzerCapabilities::iq_bandwidth_for(56.0e6), Some(40.0e6));
        assert_eq!(AnalyzerCapabilities::iq_bandwidth_for(123.0), None);
    }
}
