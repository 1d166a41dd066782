//! Amplitude probability distribution reduction
//!
//! Builds a histogram of per-sample instantaneous power in dBm. Bin counts
//! always sum to the number of samples processed: values outside the
//! configured span are clamped into the nearest edge bin rather than
//! dropped, so occupancy statistics derived downstream stay consistent with
//! the capture length.
//!
//! A non-positive bin width disables downsampling entirely: every distinct
//! observed power value becomes its own bin, which is the raw empirical
//! distribution at full granularity.

use serde::{Deserialize, Serialize};

use crate::types::{sample_power_watts, watts_to_dbm, IQSample, ReductionError};

/// APD binning parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ApdConfig {
    /// Histogram bin width in dB; `<= 0` selects the degenerate
    /// one-bin-per-value mode
    pub bin_size_db: f64,
    /// Lower histogram edge in dBm
    pub min_bin_dbm: f64,
    /// Upper histogram edge in dBm
    pub max_bin_dbm: f64,
}

/// Amplitude histogram over instantaneous sample power.
///
/// `levels_dbm` and `counts` are parallel and ascending. In binned mode the
/// levels are bin centers; in degenerate mode they are the distinct observed
/// values themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct ApdHistogram {
    levels_dbm: Vec<f64>,
    counts: Vec<u64>,
    total: u64,
}

impl ApdHistogram {
    /// Bin levels in dBm, ascending.
    pub fn levels_dbm(&self) -> &[f64] {
        &self.levels_dbm
    }

    /// Per-bin counts, parallel to [`levels_dbm`](Self::levels_dbm).
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Total samples accumulated. Always equals the sum of `counts`.
    pub fn total_count(&self) -> u64 {
        self.total
    }

    /// Number of bins.
    pub fn num_bins(&self) -> usize {
        self.counts.len()
    }

    /// Complementary cumulative fraction of samples at or above each level.
    ///
    /// This is the exceedance curve an APD plot displays.
    pub fn exceedance(&self) -> Vec<f64> {
        if self.total == 0 {
            return vec![0.0; self.counts.len()];
        }
        let mut remaining = self.total;
        self.counts
            .iter()
            .map(|&c| {
                let frac = remaining as f64 / self.total as f64;
                remaining -= c;
                frac
            })
            .collect()
    }
}

/// Accumulate the APD histogram for one filtered block.
pub fn apd_histogram(
    samples: &[IQSample],
    config: &ApdConfig,
) -> Result<ApdHistogram, ReductionError> {
    if samples.is_empty() {
        return Err(ReductionError::EmptyBlock);
    }

    let powers_dbm = samples
        .iter()
        .map(|&s| watts_to_dbm(sample_power_watts(s)));

    if config.bin_size_db <= 0.0 {
        return Ok(degenerate_histogram(powers_dbm));
    }

    let span = config.max_bin_dbm - config.min_bin_dbm;
    let num_bins = ((span / config.bin_size_db).ceil() as usize).max(1);
    let mut counts = vec![0u64; num_bins];
    let mut total = 0u64;

    for p in powers_dbm {
        total += 1;
        let bin = if p < config.min_bin_dbm {
            0
        } else if p >= config.max_bin_dbm {
            num_bins - 1
        } else {
            (((p - config.min_bin_dbm) / config.bin_size_db) as usize).min(num_bins - 1)
        };
        counts[bin] += 1;
    }

    let levels_dbm = (0..num_bins)
        .map(|i| config.min_bin_dbm + (i as f64 + 0.5) * config.bin_size_db)
        .collect();

    Ok(ApdHistogram {
        levels_dbm,
        counts,
        total,
    })
}

/// One bin per distinct observed value, ascending.
fn degenerate_histogram(powers_dbm: impl Iterator<Item = f64>) -> ApdHistogram {
    let mut values: Vec<f64> = powers_dbm.collect();
    let total = values.len() as u64;
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mut levels_dbm: Vec<f64> = Vec::new();
    let mut counts: Vec<u64> = Vec::new();
    for v in values {
        match (levels_dbm.last(), counts.last_mut()) {
            (Some(&last), Some(count)) if last == v => *count += 1,
            _ => {
                levels_dbm.push(v);
                counts.push(1);
            }
        }
    }

    ApdHistogram {
        levels_dbm,
        counts,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{dbm_to_watts, REFERENCE_IMPEDANCE_OHMS};
    use num_complex::Complex64;

    fn sample_at_dbm(dbm: f64) -> IQSample {
        // amplitude giving |s|^2 / 50 = p_watts
        let amp = (dbm_to_watts(dbm) * REFERENCE_IMPEDANCE_OHMS).sqrt();
        Complex64::new(amp, 0.0)
    }

    fn config() -> ApdConfig {
        ApdConfig {
            bin_size_db: 1.0,
            min_bin_dbm: -100.0,
            max_bin_dbm: -20.0,
        }
    }

    #[test]
    fn test_empty_block_rejected() {
        assert_eq!(
            apd_histogram(&[], &config()),
            Err(ReductionError::EmptyBlock)
        );
    }

    #[test]
    fn test_counts_conserve_sample_total() {
        let samples: Vec<IQSample> = (0..997)
            .map(|i| sample_at_dbm(-110.0 + (i % 120) as f64))
            .collect();
        let hist = apd_histogram(&samples, &config()).unwrap();
        assert_eq!(hist.total_count(), 997);
        assert_eq!(hist.counts().iter().sum::<u64>(), 997);
    }

    #[test]
    fn test_out_of_range_clamps_to_edge_bins() {
        let samples = vec![
            sample_at_dbm(-150.0), // below min
            sample_at_dbm(-150.0),
            sample_at_dbm(0.0), // above max
        ];
        let hist = apd_histogram(&samples, &config()).unwrap();
        assert_eq!(hist.counts()[0], 2);
        assert_eq!(*hist.counts().last().unwrap(), 1);
        assert_eq!(hist.total_count(), 3);
    }

    #[test]
    fn test_bin_placement_and_centers() {
        let samples = vec![sample_at_dbm(-99.5)];
        let hist = apd_histogram(&samples, &config()).unwrap();
        assert_eq!(hist.counts()[0], 1);
        assert!((hist.levels_dbm()[0] - (-99.5)).abs() < 1e-9);
        assert_eq!(hist.num_bins(), 80);
    }

    #[test]
    fn test_degenerate_mode_one_bin_per_distinct_value() {
        let cfg = ApdConfig {
            bin_size_db: 0.0,
            ..config()
        };
        let samples = vec![
            sample_at_dbm(-40.0),
            sample_at_dbm(-40.0),
            sample_at_dbm(-60.0),
            sample_at_dbm(-50.0),
        ];
        let hist = apd_histogram(&samples, &cfg).unwrap();
        assert_eq!(hist.num_bins(), 3);
        assert_eq!(hist.total_count(), 4);
        // Ascending order
        assert!(hist.levels_dbm().windows(2).all(|w| w[0] < w[1]));
        // The duplicated value accumulated into one bin
        assert_eq!(hist.counts().iter().max(), Some(&2));
    }

    #[test]
    fn test_zero_sample_maps_to_lowest_bin() {
        // |0|^2 -> -inf dBm -> clamps to the bottom edge bin
        let samples = vec![Complex64::new(0.0, 0.0)];
        let hist = apd_histogram(&samples, &config()).unwrap();
        assert_eq!(hist.counts()[0], 1);
    }

    #[test]
    fn test_exceedance_starts_at_one_and_decreases() {
        let samples: Vec<IQSample> =
            (0..100).map(|i| sample_at_dbm(-90.0 + i as f64 / 2.0)).collect();
        let hist = apd_histogram(&samples, &config()).unwrap();
        let exc = hist.exceedance();
        assert!((exc[0] - 1.0).abs() < 1e-12);
        assert!(exc.windows(2).all(|w| w[0] >= w[1]));
    }
}
