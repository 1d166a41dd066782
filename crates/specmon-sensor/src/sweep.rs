//! Sweep orchestration
//!
//! Runs one sweep end to end: for each configured segment, in list order,
//! `Configuring → Acquiring → Reducing`, then assembles the per-segment
//! results into the final [`DataProduct`]. Segments are never reordered;
//! the analyzer is one physical resource and retune cost amortization
//! depends on the configured ordering.
//!
//! Failure policy: gain and acquisition errors are retried within the
//! per-segment attempt budget; exhaustion aborts the whole sweep and the
//! results collected so far ride along in the error, so upstream telemetry
//! is not lost. Reduction errors are defects and abort immediately.
//! Cancellation is honored at every segment boundary and again just before
//! each capture, so a long sweep stops without waiting out another
//! multi-second capture.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use specmon_core::config::{ConfigError, SweepConfig};
use specmon_core::filters::{CompiledFilter, FilterSpec, InfeasibleFilterError};
use specmon_core::reduction::{reduce_block, ReductionConfig};
use specmon_core::types::ReductionError;
use specmon_core::{ApdHistogram, FrameBins, FrequencySegment, PowerBin, PsdEstimate};

use crate::acquire::{acquire_segment, AcquisitionError};
use crate::device::SignalAnalyzer;
use crate::gain::{GainController, GainError};

/// Completed data products for one segment.
#[derive(Debug, Clone)]
pub struct SegmentResult {
    /// The segment that produced these statistics
    pub segment: FrequencySegment,
    /// PSD mean/max detectors
    pub psd: PsdEstimate,
    /// Amplitude probability distribution
    pub apd: ApdHistogram,
    /// Time-domain power statistics
    pub td_power: Vec<PowerBin>,
    /// Periodic frame power
    pub pfp: Vec<FrameBins>,
}

/// The sweep's final output: one result per completed segment, in sweep
/// order. Owned by the orchestrator until the sweep finishes, then handed
/// to the caller whole (inside the error on a partial sweep).
#[derive(Debug, Clone, Default)]
pub struct DataProduct {
    segments: Vec<SegmentResult>,
}

impl DataProduct {
    /// Completed segment results in sweep order.
    pub fn segments(&self) -> &[SegmentResult] {
        &self.segments
    }

    /// Number of completed segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// True when no segment completed.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Consume the product, yielding the segment results.
    pub fn into_segments(self) -> Vec<SegmentResult> {
        self.segments
    }

    fn push(&mut self, result: SegmentResult) {
        self.segments.push(result);
    }
}

/// Cooperative cancellation flag for an in-flight sweep.
///
/// Clone the token and hand one handle to the sweep caller; flipping it
/// stops the sweep at the next segment boundary or capture start.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Fresh, uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// True once cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Why a segment gave up.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SegmentFailure {
    #[error(transparent)]
    Gain(#[from] GainError),

    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),

    #[error(transparent)]
    Reduction(#[from] ReductionError),
}

/// Terminal sweep outcomes other than success.
#[derive(Debug, thiserror::Error)]
pub enum SweepError {
    /// Pre-flight configuration failure; no hardware was touched.
    #[error("configuration rejected: {0}")]
    Config(#[from] ConfigError),

    /// A segment exhausted its retry budget (or hit a defect); the results
    /// for segments completed before it are carried along.
    #[error("segment {segment_index} failed: {cause}")]
    SegmentFailed {
        segment_index: usize,
        cause: SegmentFailure,
        partial: DataProduct,
    },

    /// The cancel token fired; completed results are carried along.
    #[error("sweep cancelled at segment {segment_index}")]
    Cancelled {
        segment_index: usize,
        partial: DataProduct,
    },
}

/// Compiled-filter cache keyed by sample rate.
///
/// One design per sample rate per sweep; the compiled filter is reused for
/// every segment sharing the rate and re-designed when the rate changes.
#[derive(Debug)]
struct FilterCache {
    spec: FilterSpec,
    compiled: Option<CompiledFilter>,
}

impl FilterCache {
    fn new(spec: FilterSpec) -> Self {
        Self {
            spec,
            compiled: None,
        }
    }

    fn get_or_design(&mut self, sample_rate_hz: f64) -> Result<&CompiledFilter, InfeasibleFilterError> {
        let stale = match &self.compiled {
            Some(f) => !f.matches_rate(sample_rate_hz),
            None => true,
        };
        if stale {
            self.compiled = Some(CompiledFilter::design(&self.spec, sample_rate_hz)?);
        }
        Ok(self.compiled.as_ref().expect("designed above"))
    }
}

/// Run one sweep over the analyzer and assemble its data product.
///
/// Synchronous from the caller's point of view; reductions fan out
/// internally. The exclusive `&mut` analyzer reference is the single-writer
/// token guaranteeing segments never interleave on the hardware.
pub fn run_sweep(
    analyzer: &mut dyn SignalAnalyzer,
    config: &SweepConfig,
    cancel: Option<&CancelToken>,
) -> Result<DataProduct, SweepError> {
    // Pre-flight: array alignment, value ranges, and filter feasibility are
    // all checked before the first hardware command.
    let segments = config.segments()?;
    let reduction_config = config.reduction_config();
    let mut filter_cache = FilterCache::new(config.filter);
    filter_cache
        .get_or_design(config.sweep.sample_rate)
        .map_err(ConfigError::Filter)?;

    let gain = GainController::default();
    let mut product = DataProduct::default();
    let is_cancelled = || cancel.is_some_and(|t| t.is_cancelled());

    tracing::info!(
        device = analyzer.name(),
        segments = segments.len(),
        sample_rate = config.sweep.sample_rate,
        "sweep starting"
    );

    for (segment_index, segment) in segments.iter().enumerate() {
        if is_cancelled() {
            tracing::info!(segment_index, "sweep cancelled at segment boundary");
            return Err(SweepError::Cancelled {
                segment_index,
                partial: product,
            });
        }

        let span = tracing::info_span!(
            "segment",
            index = segment_index,
            center_mhz = segment.center_frequency_hz / 1e6
        );
        let _enter = span.enter();

        match run_segment(
            analyzer,
            segment,
            &gain,
            &mut filter_cache,
            &reduction_config,
            config.sweep.max_attempts,
            &is_cancelled,
        ) {
            SegmentOutcome::Complete(result) => product.push(*result),
            SegmentOutcome::Cancelled => {
                tracing::info!(segment_index, "sweep cancelled before capture");
                return Err(SweepError::Cancelled {
                    segment_index,
                    partial: product,
                });
            }
            SegmentOutcome::Failed(cause) => {
                tracing::error!(segment_index, %cause, "segment failed, aborting sweep");
                return Err(SweepError::SegmentFailed {
                    segment_index,
                    cause,
                    partial: product,
                });
            }
        }
    }

    tracing::info!(segments = product.len(), "sweep complete");
    Ok(product)
}

enum SegmentOutcome {
    Complete(Box<SegmentResult>),
    Cancelled,
    Failed(SegmentFailure),
}

fn run_segment(
    analyzer: &mut dyn SignalAnalyzer,
    segment: &FrequencySegment,
    gain: &GainController,
    filter_cache: &mut FilterCache,
    reduction_config: &ReductionConfig,
    max_attempts: usize,
    is_cancelled: &dyn Fn() -> bool,
) -> SegmentOutcome {
    let mut attempt = 0;
    let block = loop {
        attempt += 1;

        // Configuring
        if let Err(err) = gain.apply(analyzer, segment) {
            tracing::warn!(%err, attempt, "gain configuration failed");
            if attempt >= max_attempts {
                return SegmentOutcome::Failed(err.into());
            }
            continue;
        }

        // A capture can run for seconds; honor cancellation before starting
        // another one.
        if is_cancelled() {
            return SegmentOutcome::Cancelled;
        }

        // Acquiring
        match acquire_segment(analyzer, segment) {
            Ok(block) => break block,
            Err(err) => {
                tracing::warn!(%err, attempt, "acquisition failed");
                if attempt >= max_attempts {
                    return SegmentOutcome::Failed(err.into());
                }
            }
        }
    };

    // Reducing. The compiled filter is cached across segments at the same
    // rate; a rate change re-designs it. Filtering emits a new block.
    let filter = match filter_cache.get_or_design(block.sample_rate_hz()) {
        Ok(f) => f,
        Err(err) => {
            // Unreachable for a validated config (designed pre-flight at the
            // sweep rate), kept honest for defense in depth.
            return SegmentOutcome::Failed(SegmentFailure::Acquisition(
                AcquisitionError::Device(crate::device::AnalyzerError::Hardware(format!(
                    "filter redesign failed mid-sweep: {}",
                    err
                ))),
            ));
        }
    };
    let filtered = block.with_samples(filter.apply(block.samples()));

    match reduce_block(&filtered, reduction_config) {
        Ok(set) => SegmentOutcome::Complete(Box::new(SegmentResult {
            segment: *segment,
            psd: set.psd,
            apd: set.apd,
            td_power: set.td_power,
            pfp: set.pfp,
        })),
        // Never retried: an empty filtered block is a defect, not noise.
        Err(err) => SegmentOutcome::Failed(err.into()),
    }
}
