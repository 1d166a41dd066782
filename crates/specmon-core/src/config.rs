//! Sweep configuration
//!
//! YAML-backed configuration document for one sweep, grouped the way the
//! acquisition pipeline consumes it: filter spec, per-reduction settings,
//! per-segment analyzer settings, and the sweep plan itself.
//!
//! The analyzer settings arrive as parallel arrays (one entry per sweep
//! frequency). Validation zips them into an ordered list of
//! [`FrequencySegment`] value objects up front, so a length mismatch is a
//! configuration error caught before any hardware is touched and the rest
//! of the pipeline never deals with index alignment.
//!
//! ## Example
//!
//! ```yaml
//! filter:
//!   passband_ripple_db: 0.1
//!   stopband_atten_db: 40.0
//!   passband_edge_hz: 5.0e6
//!   stopband_edge_hz: 7.0e6
//! psd:
//!   nffts: 64
//! pfp:
//!   pfp_frame_period_ms: 10.0
//! apd:
//!   apd_bin_size_db: 0.5
//!   apd_min_bin_dbm: -180.0
//!   apd_max_bin_dbm: -30.0
//! td:
//!   td_bin_size_ms: 100.0
//! analyzer:
//!   preamp_enable: true
//!   reference_level: [-25.0, -25.0]
//!   attenuation: [0.0, 0.0]
//! sweep:
//!   sample_rate: 14.0e6
//!   duration_ms: 4000
//!   nskip: 0
//!   frequency: [3545.0e6, 3555.0e6]
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::apd::ApdConfig;
use crate::filters::{FilterSpec, InfeasibleFilterError};
use crate::reduction::ReductionConfig;

/// Error type for configuration operations.
///
/// Configuration errors are fatal and pre-flight: they are reported before
/// any hardware call and never retried.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Failed to read the configuration file
    ReadError(String),
    /// Failed to parse the configuration document
    ParseError(String),
    /// A recognized field holds an invalid value or arrays disagree
    ValidationError(String),
    /// The filter spec cannot be realized at the configured sample rate
    Filter(InfeasibleFilterError),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(msg) => write!(f, "failed to read config: {}", msg),
            ConfigError::ParseError(msg) => write!(f, "failed to parse config: {}", msg),
            ConfigError::ValidationError(msg) => write!(f, "invalid config: {}", msg),
            ConfigError::Filter(err) => write!(f, "infeasible filter spec: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {}

/// One frequency/gain step of a sweep.
///
/// Immutable value object; one instance per sweep step, built by
/// [`SweepConfig::segments`] from the validated parallel arrays.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrequencySegment {
    /// Center frequency in Hz
    pub center_frequency_hz: f64,
    /// Sample rate in Hz
    pub sample_rate_hz: f64,
    /// Capture duration in ms
    pub duration_ms: u64,
    /// Leading samples to discard after retune (settling time)
    pub skip_samples: usize,
    /// Analyzer reference level in dBm
    pub reference_level_dbm: f64,
    /// Front-end attenuation in dB
    pub attenuation_db: f64,
    /// Preamp enabled for this segment
    pub preamp_enabled: bool,
}

impl FrequencySegment {
    /// Number of samples one capture of this segment delivers (post skip).
    pub fn num_samples(&self) -> usize {
        ((self.duration_ms as f64) * self.sample_rate_hz / 1000.0).round() as usize
    }
}

/// PSD settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PsdSettings {
    /// Number of FFT frames the block is split into
    pub nffts: usize,
}

/// PFP settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PfpSettings {
    /// Frame period in ms
    pub pfp_frame_period_ms: f64,
}

/// APD settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ApdSettings {
    /// Bin width in dB; `<= 0` disables downsampling
    #[serde(alias = "apd_bin_size_dB")]
    pub apd_bin_size_db: f64,
    /// Lower histogram edge in dBm
    pub apd_min_bin_dbm: f64,
    /// Upper histogram edge in dBm
    pub apd_max_bin_dbm: f64,
}

/// Time-domain power settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TdSettings {
    /// Window length in ms
    pub td_bin_size_ms: f64,
}

/// Per-segment analyzer settings, parallel to `sweep.frequency`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerSettings {
    /// Preamp enable, applied to every segment
    pub preamp_enable: bool,
    /// Reference level per segment, dBm
    pub reference_level: Vec<f64>,
    /// Attenuation per segment, dB
    pub attenuation: Vec<f64>,
}

fn default_max_attempts() -> usize {
    3
}

/// Sweep plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepSettings {
    /// Sample rate in Hz, shared by all segments
    pub sample_rate: f64,
    /// Capture duration per segment in ms
    pub duration_ms: u64,
    /// Leading samples to discard per capture
    pub nskip: usize,
    /// Center frequencies in Hz, in sweep order
    pub frequency: Vec<f64>,
    /// Per-segment retry budget for gain and acquisition failures
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
}

/// Complete sweep configuration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Channelization filter spec
    pub filter: FilterSpec,
    /// PSD settings
    pub psd: PsdSettings,
    /// PFP settings
    pub pfp: PfpSettings,
    /// APD settings
    pub apd: ApdSettings,
    /// Time-domain settings
    pub td: TdSettings,
    /// Per-segment analyzer settings
    pub analyzer: AnalyzerSettings,
    /// Sweep plan
    pub sweep: SweepSettings,
}

impl SweepConfig {
    /// Parse a configuration document from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Load a configuration document from a file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;
        Self::parse(&content)
    }

    /// Validate every recognized field.
    ///
    /// Checks array alignment, strictly positive rates/durations/periods,
    /// filter edge ordering, and APD span consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let nfreq = self.sweep.frequency.len();
        if nfreq == 0 {
            return Err(ConfigError::ValidationError(
                "sweep.frequency must list at least one center frequency".to_string(),
            ));
        }
        if self.analyzer.reference_level.len() != nfreq || self.analyzer.attenuation.len() != nfreq
        {
            return Err(ConfigError::ValidationError(format!(
                "parallel array lengths disagree: frequency[{}], reference_level[{}], attenuation[{}]",
                nfreq,
                self.analyzer.reference_level.len(),
                self.analyzer.attenuation.len()
            )));
        }
        if self.sweep.sample_rate <= 0.0 {
            return Err(ConfigError::ValidationError(
                "sweep.sample_rate must be positive".to_string(),
            ));
        }
        if self.sweep.duration_ms == 0 {
            return Err(ConfigError::ValidationError(
                "sweep.duration_ms must be positive".to_string(),
            ));
        }
        if self.sweep.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "sweep.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.psd.nffts == 0 {
            return Err(ConfigError::ValidationError(
                "psd.nffts must be at least 1".to_string(),
            ));
        }
        if self.td.td_bin_size_ms <= 0.0 {
            return Err(ConfigError::ValidationError(
                "td.td_bin_size_ms must be positive".to_string(),
            ));
        }
        if self.pfp.pfp_frame_period_ms <= 0.0 {
            return Err(ConfigError::ValidationError(
                "pfp.pfp_frame_period_ms must be positive".to_string(),
            ));
        }
        if self.apd.apd_bin_size_db > 0.0 && self.apd.apd_max_bin_dbm <= self.apd.apd_min_bin_dbm {
            return Err(ConfigError::ValidationError(
                "apd bin range is empty: apd_max_bin_dbm must exceed apd_min_bin_dbm".to_string(),
            ));
        }
        if self.filter.stopband_edge_hz <= self.filter.passband_edge_hz {
            return Err(ConfigError::ValidationError(format!(
                "filter stopband edge {} Hz must exceed passband edge {} Hz",
                self.filter.stopband_edge_hz, self.filter.passband_edge_hz
            )));
        }
        Ok(())
    }

    /// Validate and zip the parallel arrays into ordered segments.
    pub fn segments(&self) -> Result<Vec<FrequencySegment>, ConfigError> {
        self.validate()?;
        Ok(self
            .sweep
            .frequency
            .iter()
            .zip(self.analyzer.reference_level.iter())
            .zip(self.analyzer.attenuation.iter())
            .map(|((&freq, &ref_level), &atten)| FrequencySegment {
                center_frequency_hz: freq,
                sample_rate_hz: self.sweep.sample_rate,
                duration_ms: self.sweep.duration_ms,
                skip_samples: self.sweep.nskip,
                reference_level_dbm: ref_level,
                attenuation_db: atten,
                preamp_enabled: self.analyzer.preamp_enable,
            })
            .collect())
    }

    /// Reduction parameters for this sweep.
    pub fn reduction_config(&self) -> ReductionConfig {
        ReductionConfig {
            nffts: self.psd.nffts,
            apd: ApdConfig {
                bin_size_db: self.apd.apd_bin_size_db,
                min_bin_dbm: self.apd.apd_min_bin_dbm,
                max_bin_dbm: self.apd.apd_max_bin_dbm,
            },
            td_bin_size_ms: self.td.td_bin_size_ms,
            pfp_frame_period_ms: self.pfp.pfp_frame_period_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = r#"
filter:
  passband_ripple_db: 0.1
  stopband_atten_db: 40.0
  passband_edge_hz: 5.0e6
  stopband_edge_hz: 7.0e6
psd:
  nffts: 64
pfp:
  pfp_frame_period_ms: 10.0
apd:
  apd_bin_size_db: 0.5
  apd_min_bin_dbm: -180.0
  apd_max_bin_dbm: -30.0
td:
  td_bin_size_ms: 100.0
analyzer:
  preamp_enable: true
  reference_level: [-25.0, -25.0]
  attenuation: [0.0, 0.0]
sweep:
  sample_rate: 14.0e6
  duration_ms: 4000
  nskip: 0
  frequency: [3545.0e6, 3555.0e6]
"#;

    #[test]
    fn test_parse_example() {
        let config = SweepConfig::parse(EXAMPLE).unwrap();
        assert_eq!(config.psd.nffts, 64);
        assert_eq!(config.sweep.frequency.len(), 2);
        assert_eq!(config.sweep.max_attempts, 3); // default applied
        assert!(config.analyzer.preamp_enable);
        config.validate().unwrap();
    }

    #[test]
    fn test_segments_zip_parallel_arrays() {
        let config = SweepConfig::parse(EXAMPLE).unwrap();
        let segments = config.segments().unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].center_frequency_hz, 3545.0e6);
        assert_eq!(segments[1].center_frequency_hz, 3555.0e6);
        for s in &segments {
            assert_eq!(s.reference_level_dbm, -25.0);
            assert_eq!(s.attenuation_db, 0.0);
            assert_eq!(s.sample_rate_hz, 14.0e6);
            assert!(s.preamp_enabled);
        }
        // 4000 ms at 14 MS/s
        assert_eq!(segments[0].num_samples(), 56_000_000);
    }

    #[test]
    fn test_mismatched_array_lengths_rejected() {
        let mut config = SweepConfig::parse(EXAMPLE).unwrap();
        config.analyzer.attenuation.pop();
        let err = config.segments().unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
        assert!(err.to_string().contains("parallel array"));
    }

    #[test]
    fn test_nonpositive_values_rejected() {
        let mut config = SweepConfig::parse(EXAMPLE).unwrap();
        config.sweep.sample_rate = 0.0;
        assert!(config.validate().is_err());

        let mut config = SweepConfig::parse(EXAMPLE).unwrap();
        config.sweep.duration_ms = 0;
        assert!(config.validate().is_err());

        let mut config = SweepConfig::parse(EXAMPLE).unwrap();
        config.td.td_bin_size_ms = -1.0;
        assert!(config.validate().is_err());

        let mut config = SweepConfig::parse(EXAMPLE).unwrap();
        config.psd.nffts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_filter_edge_ordering_rejected() {
        let mut config = SweepConfig::parse(EXAMPLE).unwrap();
        config.filter.stopband_edge_hz = config.filter.passband_edge_hz;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_apd_degenerate_bin_size_accepted() {
        let mut config = SweepConfig::parse(EXAMPLE).unwrap();
        config.apd.apd_bin_size_db = 0.0;
        // Degenerate mode ignores the bin range
        config.apd.apd_max_bin_dbm = config.apd.apd_min_bin_dbm;
        config.validate().unwrap();
    }

    #[test]
    fn test_spec_style_field_alias() {
        // The capitalized dB spelling from the acquisition descriptor is
        // accepted as an alias
        let yaml = EXAMPLE.replace("apd_bin_size_db", "apd_bin_size_dB");
        let config = SweepConfig::parse(&yaml).unwrap();
        assert_eq!(config.apd.apd_bin_size_db, 0.5);
    }

    #[test]
    fn test_unparseable_document_is_parse_error() {
        assert!(matches!(
            SweepConfig::parse("nonsense: ["),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_roundtrip_serialization() {
        let config = SweepConfig::parse(EXAMPLE).unwrap();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed = SweepConfig::parse(&yaml).unwrap();
        assert_eq!(config, parsed);
    }
}
