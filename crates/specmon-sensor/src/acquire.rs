//! Segment acquisition
//!
//! Drives one bounded-duration capture at one segment's tuning. The sample
//! budget is the configured duration at the segment's sample rate plus the
//! skip interval, which covers front-end settling after a retune; only the
//! post-skip block is returned. The capture deadline is twice the nominal
//! duration with a floor so very short captures are not starved.

use std::time::{Duration, SystemTime};

use specmon_core::{FrequencySegment, RawBlock};

use crate::device::{AnalyzerError, SignalAnalyzer};

/// Minimum capture deadline regardless of nominal duration.
const MIN_DEADLINE_MS: u64 = 100;

/// Errors from acquiring one segment's block.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AcquisitionError {
    /// The analyzer did not deliver the block within the deadline.
    #[error("capture missed its {deadline_ms} ms deadline: {source}")]
    Timeout {
        deadline_ms: u64,
        #[source]
        source: AnalyzerError,
    },

    /// Fewer samples than requested arrived with no timeout (buffer fault).
    #[error("short capture: requested {requested} samples, analyzer delivered {delivered}")]
    Underrun { requested: usize, delivered: usize },

    /// Tuning or capture failed in the hardware layer.
    #[error("analyzer fault: {0}")]
    Device(#[from] AnalyzerError),
}

/// Capture deadline for a segment: 2x the nominal duration, floored.
pub fn capture_deadline(segment: &FrequencySegment) -> Duration {
    Duration::from_millis((2 * segment.duration_ms).max(MIN_DEADLINE_MS))
}

/// Tune the analyzer to the segment and capture its sample block.
///
/// Requests `skip_samples` extra leading samples and discards them, so the
/// returned block starts after the settling interval. Retry policy belongs
/// to the caller; this function performs exactly one capture.
pub fn acquire_segment(
    analyzer: &mut dyn SignalAnalyzer,
    segment: &FrequencySegment,
) -> Result<RawBlock, AcquisitionError> {
    analyzer.set_center_frequency(segment.center_frequency_hz)?;
    analyzer.set_sample_rate(segment.sample_rate_hz)?;

    let num_samples = segment.num_samples();
    let total_request = num_samples + segment.skip_samples;
    let deadline = capture_deadline(segment);

    tracing::debug!(
        center_mhz = segment.center_frequency_hz / 1e6,
        samples = total_request,
        skip = segment.skip_samples,
        deadline_ms = deadline.as_millis() as u64,
        "starting capture"
    );

    let acquisition_timestamp = SystemTime::now();
    let mut samples = analyzer
        .acquire(total_request, deadline)
        .map_err(|err| match err {
            AnalyzerError::Timeout(_) => AcquisitionError::Timeout {
                deadline_ms: deadline.as_millis() as u64,
                source: err,
            },
            other => AcquisitionError::Device(other),
        })?;

    if samples.len() < total_request {
        return Err(AcquisitionError::Underrun {
            requested: total_request,
            delivered: samples.len(),
        });
    }

    samples.drain(..segment.skip_samples);
    Ok(RawBlock::new(
        samples,
        segment.sample_rate_hz,
        acquisition_timestamp,
    ))
}
