//! Time-domain power reduction
//!
//! Partitions the filtered block into fixed-duration windows and reports
//! mean/max/min power per window in dBm. Windows are anchored to the block
//! start, so the channelization filter's start-up transient always lands in
//! the first window and never moves a window boundary.

use serde::Serialize;

use crate::types::{sample_power_watts, watts_to_dbm, IQSample, ReductionError};

/// Power statistics for one time-domain window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PowerBin {
    /// Window start offset from the block start, in ms
    pub window_start_ms: f64,
    /// Mean power over the window, dBm
    pub mean_dbm: f64,
    /// Peak sample power in the window, dBm
    pub max_dbm: f64,
    /// Minimum sample power in the window, dBm
    pub min_dbm: f64,
}

/// Compute per-window power statistics.
///
/// The window length in samples is `bin_size_ms * sample_rate / 1000`,
/// rounded to the nearest sample. The final window may be partial; it is
/// still emitted, so the bin count equals `ceil(duration / bin_size_ms)`.
pub fn td_power_bins(
    samples: &[IQSample],
    sample_rate_hz: f64,
    bin_size_ms: f64,
) -> Result<Vec<PowerBin>, ReductionError> {
    if samples.is_empty() {
        return Err(ReductionError::EmptyBlock);
    }

    let samples_per_bin = ((bin_size_ms * sample_rate_hz / 1000.0).round() as usize).max(1);

    let bins = samples
        .chunks(samples_per_bin)
        .enumerate()
        .map(|(i, chunk)| {
            let mut sum = 0.0f64;
            let mut max = f64::NEG_INFINITY;
            let mut min = f64::INFINITY;
            for &s in chunk {
                let p = sample_power_watts(s);
                sum += p;
                if p > max {
                    max = p;
                }
                if p < min {
                    min = p;
                }
            }
            PowerBin {
                window_start_ms: i as f64 * bin_size_ms,
                mean_dbm: watts_to_dbm(sum / chunk.len() as f64),
                max_dbm: watts_to_dbm(max),
                min_dbm: watts_to_dbm(min),
            }
        })
        .collect();

    Ok(bins)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use num_complex::Complex64;

    fn constant_block(n: usize, amplitude: f64) -> Vec<IQSample> {
        vec![Complex64::new(amplitude, 0.0); n]
    }

    #[test]
    fn test_empty_block_rejected() {
        assert!(matches!(
            td_power_bins(&[], 1e6, 10.0),
            Err(ReductionError::EmptyBlock)
        ));
    }

    #[test]
    fn test_bin_count_is_ceiling_of_duration_over_bin_size() {
        // 2500 samples at 1 MS/s = 2.5 ms; 1 ms bins -> ceil(2.5) = 3 bins
        let samples = constant_block(2500, 1.0);
        let bins = td_power_bins(&samples, 1e6, 1.0).unwrap();
        assert_eq!(bins.len(), 3);

        // Exact multiple: 2 ms in 1 ms bins -> 2 bins
        let samples = constant_block(2000, 1.0);
        let bins = td_power_bins(&samples, 1e6, 1.0).unwrap();
        assert_eq!(bins.len(), 2);
    }

    #[test]
    fn test_window_starts_are_spaced_by_bin_size() {
        let samples = constant_block(3000, 1.0);
        let bins = td_power_bins(&samples, 1e6, 0.5).unwrap();
        assert_eq!(bins.len(), 6);
        for (i, b) in bins.iter().enumerate() {
            assert_relative_eq!(b.window_start_ms, i as f64 * 0.5, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_constant_signal_mean_max_min_agree() {
        // amplitude 1 V into 50 ohm = 20 mW = ~13.01 dBm
        let samples = constant_block(1000, 1.0);
        let bins = td_power_bins(&samples, 1e6, 1.0).unwrap();
        let b = bins[0];
        let expected = watts_to_dbm(1.0 / 50.0);
        assert_relative_eq!(b.mean_dbm, expected, epsilon = 1e-9);
        assert_relative_eq!(b.max_dbm, expected, epsilon = 1e-9);
        assert_relative_eq!(b.min_dbm, expected, epsilon = 1e-9);
    }

    #[test]
    fn test_burst_shows_in_max_not_min() {
        // Quiet floor with one strong sample in the second window
        let mut samples = constant_block(2000, 0.001);
        samples[1500] = Complex64::new(1.0, 0.0);
        let bins = td_power_bins(&samples, 1e6, 1.0).unwrap();
        assert!(bins[1].max_dbm > bins[1].min_dbm + 50.0);
        assert!(bins[0].max_dbm < bins[1].max_dbm);
        // Ordering invariant within each bin
        for b in &bins {
            assert!(b.min_dbm <= b.mean_dbm && b.mean_dbm <= b.max_dbm);
        }
    }
}
