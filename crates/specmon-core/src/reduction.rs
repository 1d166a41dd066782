//! Reduction engine
//!
//! Runs the four statistical reductions over one filtered block. The
//! reductions share no mutable state, so they fan out onto the rayon pool
//! and join before the result set is assembled; a sweep only ever sees the
//! complete set or an error.

use crate::apd::{apd_histogram, ApdConfig, ApdHistogram};
use crate::pfp::{pfp_frames, FrameBins};
use crate::psd::{psd_mean_max, PsdEstimate};
use crate::td_power::{td_power_bins, PowerBin};
use crate::types::{RawBlock, ReductionError};

/// Parameters for all four reductions of a sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReductionConfig {
    /// Number of PSD frames per block
    pub nffts: usize,
    /// APD binning
    pub apd: ApdConfig,
    /// Time-domain window length in ms
    pub td_bin_size_ms: f64,
    /// PFP frame period in ms
    pub pfp_frame_period_ms: f64,
}

/// The four data products computed from one filtered block.
#[derive(Debug, Clone)]
pub struct ReductionSet {
    /// PSD mean/max detectors
    pub psd: PsdEstimate,
    /// Amplitude probability distribution
    pub apd: ApdHistogram,
    /// Time-domain power statistics
    pub td_power: Vec<PowerBin>,
    /// Periodic frame power
    pub pfp: Vec<FrameBins>,
}

/// Reduce one filtered block into the full [`ReductionSet`].
///
/// The four computations run concurrently and join here. An empty block is
/// rejected before any work is spawned.
pub fn reduce_block(
    block: &RawBlock,
    config: &ReductionConfig,
) -> Result<ReductionSet, ReductionError> {
    if block.is_empty() {
        return Err(ReductionError::EmptyBlock);
    }

    let samples = block.samples();
    let rate = block.sample_rate_hz();

    let (psd_result, (apd_result, (td_result, pfp_result))) = rayon::join(
        || psd_mean_max(samples, config.nffts),
        || {
            rayon::join(
                || apd_histogram(samples, &config.apd),
                || {
                    rayon::join(
                        || td_power_bins(samples, rate, config.td_bin_size_ms),
                        || pfp_frames(samples, rate, config.pfp_frame_period_ms),
                    )
                },
            )
        },
    );

    Ok(ReductionSet {
        psd: psd_result?,
        apd: apd_result?,
        td_power: td_result?,
        pfp: pfp_result?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;
    use std::time::SystemTime;

    fn config() -> ReductionConfig {
        ReductionConfig {
            nffts: 4,
            apd: ApdConfig {
                bin_size_db: 1.0,
                min_bin_dbm: -120.0,
                max_bin_dbm: 0.0,
            },
            td_bin_size_ms: 1.0,
            pfp_frame_period_ms: 0.5,
        }
    }

    fn block(n: usize) -> RawBlock {
        let samples = (0..n)
            .map(|i| {
                let phase = 2.0 * std::f64::consts::PI * 0.05 * i as f64;
                Complex64::new(phase.cos() * 0.01, phase.sin() * 0.01)
            })
            .collect();
        RawBlock::new(samples, 1e6, SystemTime::UNIX_EPOCH)
    }

    #[test]
    fn test_empty_block_rejected_before_fanout() {
        let empty = RawBlock::new(vec![], 1e6, SystemTime::UNIX_EPOCH);
        assert_eq!(
            reduce_block(&empty, &config()).unwrap_err(),
            ReductionError::EmptyBlock
        );
    }

    #[test]
    fn test_all_four_products_present_and_consistent() {
        let block = block(4000);
        let set = reduce_block(&block, &config()).unwrap();

        assert_eq!(set.psd.mean_dbm.len(), set.psd.max_dbm.len());
        assert!(!set.psd.mean_dbm.is_empty());
        assert_eq!(set.apd.total_count(), 4000);
        // 4 ms of data in 1 ms windows
        assert_eq!(set.td_power.len(), 4);
        // 4 ms of data in 0.5 ms frames
        assert_eq!(set.pfp.len(), 8);
    }

    #[test]
    fn test_reduction_is_deterministic() {
        let block = block(2048);
        let a = reduce_block(&block, &config()).unwrap();
        let b = reduce_block(&block, &config()).unwrap();
        assert_eq!(a.psd.mean_dbm, b.psd.mean_dbm);
        assert_eq!(a.psd.max_dbm, b.psd.max_dbm);
        assert_eq!(a.apd, b.apd);
        assert_eq!(a.td_power, b.td_power);
        assert_eq!(a.pfp, b.pfp);
    }
}
