//! Periodic frame power reduction
//!
//! Slices the filtered block into frames of one configured period, phase
//! zero at the first sample, and emits each frame's instantaneous power
//! series in acquisition order. Because every emitted frame has the same
//! sample count and the same phase alignment, the external consumer can
//! average frame `k` across sweeps coherently to pull periodic emitters
//! (radar pulse trains) out of the noise floor.

use crate::types::{sample_power_watts, watts_to_dbm, IQSample, ReductionError};

/// Power samples of one frame period.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBins {
    /// Frame start offset from the block start, in ms
    pub start_ms: f64,
    /// Instantaneous power per sample position in the frame, dBm
    pub power_dbm: Vec<f64>,
}

/// Partition the block into frames of `frame_period_ms`.
///
/// Only complete frames are emitted; a trailing partial frame is dropped so
/// every frame is the same length and positionwise averaging stays well
/// defined. A block shorter than one frame period yields no frames.
pub fn pfp_frames(
    samples: &[IQSample],
    sample_rate_hz: f64,
    frame_period_ms: f64,
) -> Result<Vec<FrameBins>, ReductionError> {
    if samples.is_empty() {
        return Err(ReductionError::EmptyBlock);
    }

    let samples_per_frame = ((frame_period_ms * sample_rate_hz / 1000.0).round() as usize).max(1);

    let frames = samples
        .chunks_exact(samples_per_frame)
        .enumerate()
        .map(|(i, chunk)| FrameBins {
            start_ms: i as f64 * frame_period_ms,
            power_dbm: chunk
                .iter()
                .map(|&s| watts_to_dbm(sample_power_watts(s)))
                .collect(),
        })
        .collect();

    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use num_complex::Complex64;

    #[test]
    fn test_empty_block_rejected() {
        assert!(matches!(
            pfp_frames(&[], 1e6, 1.0),
            Err(ReductionError::EmptyBlock)
        ));
    }

    #[test]
    fn test_frames_are_uniform_length_and_ordered() {
        let samples: Vec<IQSample> = vec![Complex64::new(0.1, 0.0); 5500];
        // 1 ms frames at 1 MS/s -> 1000 samples per frame, 5 complete frames
        let frames = pfp_frames(&samples, 1e6, 1.0).unwrap();
        assert_eq!(frames.len(), 5);
        for (i, f) in frames.iter().enumerate() {
            assert_eq!(f.power_dbm.len(), 1000);
            assert_relative_eq!(f.start_ms, i as f64, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_block_shorter_than_one_frame_yields_none() {
        let samples: Vec<IQSample> = vec![Complex64::new(0.1, 0.0); 10];
        let frames = pfp_frames(&samples, 1e6, 1.0).unwrap();
        assert!(frames.is_empty());
    }

    #[test]
    fn test_periodic_pulse_lands_at_same_frame_position() {
        // 100 us pulse period at 1 MS/s = 100-sample frames; pulse at
        // position 17 of every period
        let mut samples: Vec<IQSample> = vec![Complex64::new(1e-4, 0.0); 1000];
        for frame in 0..10 {
            samples[frame * 100 + 17] = Complex64::new(1.0, 0.0);
        }
        let frames = pfp_frames(&samples, 1e6, 0.1).unwrap();
        assert_eq!(frames.len(), 10);
        for f in &frames {
            let peak_pos = f
                .power_dbm
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
                .unwrap()
                .0;
            assert_eq!(peak_pos, 17);
        }
    }
}
