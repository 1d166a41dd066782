//! PSD mean/max reduction
//!
//! Splits the filtered block into `nffts` equal-length frames, applies a
//! Hann window and FFT per frame, and accumulates a per-bin running mean and
//! running max in linear power. Conversion to dBm happens once at the end,
//! so mean and max share identical binning and `mean <= max` holds for every
//! bin at any frame count.
//!
//! Partial-frame policy: the frame length is `block_len / nffts` and any
//! trailing remainder is truncated. This is deterministic for every block
//! length; the alternative (zero-padding the final frame) would bias the
//! mean detector low in the padded frame.

use num_complex::Complex64;

use crate::fft_utils::FftProcessor;
use crate::filters::windows::hann_window;
use crate::types::{IQSample, ReductionError, REFERENCE_IMPEDANCE_OHMS};

/// Mean and max power spectra of one segment, in dBm per bin.
///
/// Bins are FFT-shifted so the center frequency sits in the middle.
#[derive(Debug, Clone, PartialEq)]
pub struct PsdEstimate {
    /// Mean detector output, dBm per frequency bin
    pub mean_dbm: Vec<f64>,
    /// Max detector output, dBm per frequency bin
    pub max_dbm: Vec<f64>,
    /// Frame (FFT) length used
    pub fft_size: usize,
    /// Number of frames accumulated
    pub num_frames: usize,
}

impl PsdEstimate {
    /// Frequency offsets of each bin from the segment center, in Hz.
    pub fn bin_offsets_hz(&self, sample_rate_hz: f64) -> Vec<f64> {
        let resolution = sample_rate_hz / self.fft_size as f64;
        (0..self.fft_size)
            .map(|i| (i as f64 - (self.fft_size / 2) as f64) * resolution)
            .collect()
    }
}

/// Compute the PSD mean/max estimate over `nffts` frames.
///
/// Frames shorter than the block (the truncation remainder) are dropped. A
/// block shorter than `nffts` samples degrades to fewer, single-sample
/// frames rather than padded ones.
pub fn psd_mean_max(samples: &[IQSample], nffts: usize) -> Result<PsdEstimate, ReductionError> {
    if samples.is_empty() {
        return Err(ReductionError::EmptyBlock);
    }
    let nffts = nffts.max(1);

    let fft_size = (samples.len() / nffts).max(1);
    let num_frames = (samples.len() / fft_size).min(nffts);

    let window = hann_window(fft_size);
    let mut fft = FftProcessor::new(fft_size);

    let mut mean_accum = vec![0.0f64; fft_size];
    let mut max_accum = vec![f64::NEG_INFINITY; fft_size];
    let mut frame = vec![Complex64::new(0.0, 0.0); fft_size];

    for f in 0..num_frames {
        let offset = f * fft_size;
        for (i, slot) in frame.iter_mut().enumerate() {
            *slot = samples[offset + i] * window[i];
        }
        fft.fft_inplace(&mut frame);

        for (i, x) in frame.iter().enumerate() {
            let p = x.norm_sqr();
            mean_accum[i] += p;
            if p > max_accum[i] {
                max_accum[i] = p;
            }
        }
    }

    let to_dbm = |p: f64| -> f64 {
        // Pseudo-power |X|^2 to dBm: 50-ohm reference, +30 for dBW->dBm,
        // -3 for the double-sided spectrum, FFT-length normalization.
        10.0 * p.max(1e-30).log10() - 10.0 * REFERENCE_IMPEDANCE_OHMS.log10() + 30.0
            - 3.0
            - 20.0 * (fft_size as f64).log10()
    };

    let mean_dbm: Vec<f64> = mean_accum
        .iter()
        .map(|&p| to_dbm(p / num_frames as f64))
        .collect();
    let max_dbm: Vec<f64> = max_accum.iter().map(|&p| to_dbm(p)).collect();

    Ok(PsdEstimate {
        mean_dbm: FftProcessor::fft_shift(&mean_dbm),
        max_dbm: FftProcessor::fft_shift(&max_dbm),
        fft_size,
        num_frames,
    })
}
