//! Front-end gain control
//!
//! Resolves one segment's analog settings and pushes them to the analyzer
//! in a fixed order (reference level, attenuation, preamp), then confirms
//! by reading the device state back. A front end that has not settled gets
//! a bounded number of re-apply/re-read attempts with a short fixed backoff
//! before the segment is declared unconfirmed.
//!
//! The controller is stateless between calls; a failure for one segment
//! leaves nothing behind to corrupt the next.

use std::thread;
use std::time::Duration;

use specmon_core::FrequencySegment;

use crate::device::{AnalyzerError, SignalAnalyzer};

/// Errors from applying a segment's gain state.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GainError {
    /// The analyzer refused a value outright.
    #[error("analyzer rejected {setting}: {source}")]
    Rejected {
        setting: &'static str,
        #[source]
        source: AnalyzerError,
    },

    /// Read-back never matched the requested state within the retry budget.
    /// For the preamp, requested/observed are encoded as 1.0/0.0.
    #[error("{setting} unconfirmed after {attempts} attempts: requested {requested}, observed {observed}")]
    Unconfirmed {
        setting: &'static str,
        requested: f64,
        observed: f64,
        attempts: usize,
    },
}

/// Applies per-segment analog front-end state with read-back confirmation.
#[derive(Debug, Clone)]
pub struct GainController {
    /// Apply/confirm attempts before giving up
    max_attempts: usize,
    /// Pause between attempts
    backoff: Duration,
    /// Read-back agreement tolerance in dB
    tolerance_db: f64,
}

impl Default for GainController {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(10),
            tolerance_db: 0.01,
        }
    }
}

impl GainController {
    /// Controller with an explicit retry budget and backoff.
    pub fn new(max_attempts: usize, backoff: Duration, tolerance_db: f64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
            tolerance_db,
        }
    }

    /// Apply the segment's gain state and confirm it.
    pub fn apply(
        &self,
        analyzer: &mut dyn SignalAnalyzer,
        segment: &FrequencySegment,
    ) -> Result<(), GainError> {
        for attempt in 1..=self.max_attempts {
            analyzer
                .set_reference_level(segment.reference_level_dbm)
                .map_err(|source| GainError::Rejected {
                    setting: "reference_level",
                    source,
                })?;
            analyzer
                .set_attenuation(segment.attenuation_db)
                .map_err(|source| GainError::Rejected {
                    setting: "attenuation",
                    source,
                })?;
            analyzer
                .set_preamp(segment.preamp_enabled)
                .map_err(|source| GainError::Rejected {
                    setting: "preamp",
                    source,
                })?;

            match self.confirm(analyzer, segment) {
                None => {
                    tracing::debug!(
                        reference_level_dbm = segment.reference_level_dbm,
                        attenuation_db = segment.attenuation_db,
                        preamp = segment.preamp_enabled,
                        attempt,
                        "gain state confirmed"
                    );
                    return Ok(());
                }
                Some((setting, requested, observed)) => {
                    tracing::warn!(setting, requested, observed, attempt, "gain read-back mismatch");
                    if attempt == self.max_attempts {
                        return Err(GainError::Unconfirmed {
                            setting,
                            requested,
                            observed,
                            attempts: self.max_attempts,
                        });
                    }
                    thread::sleep(self.backoff);
                }
            }
        }
        unreachable!("loop returns on the final attempt");
    }

    /// Read the device state back; `None` when everything matches, else the
    /// first mismatched setting as (name, requested, observed).
    fn confirm(
        &self,
        analyzer: &dyn SignalAnalyzer,
        segment: &FrequencySegment,
    ) -> Option<(&'static str, f64, f64)> {
        let observed_ref = analyzer.reference_level();
        if (observed_ref - segment.reference_level_dbm).abs() > self.tolerance_db {
            return Some(("reference_level", segment.reference_level_dbm, observed_ref));
        }
        let observed_atten = analyzer.attenuation();
        if (observed_atten - segment.attenuation_db).abs() > self.tolerance_db {
            return Some(("attenuation", segment.attenuation_db, observed_atten));
        }
        let observed_preamp = analyzer.preamp_enabled();
        if observed_preamp != segment.preamp_enabled {
            return Some((
                "preamp",
                if segment.preamp_enabled { 1.0 } else { 0.0 },
                if observed_preamp { 1.0 } else { 0.0 },
            ));
        }
        None
    }
}
