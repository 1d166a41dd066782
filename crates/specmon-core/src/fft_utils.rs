//! FFT helpers for the spectral reductions
//!
//! Thin wrapper over `rustfft` keeping the planned FFT and its scratch
//! buffer together so per-frame transforms inside a reduction do not
//! re-plan.

use rustfft::{num_complex::Complex64, Fft, FftPlanner};
use std::fmt;
use std::sync::Arc;

/// Planned forward FFT of a fixed size.
pub struct FftProcessor {
    size: usize,
    fft_forward: Arc<dyn Fft<f64>>,
    scratch: Vec<Complex64>,
}

impl fmt::Debug for FftProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FftProcessor").field("size", &self.size).finish()
    }
}

impl FftProcessor {
    /// Plan a forward FFT of the given size.
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft_forward = planner.plan_fft_forward(size);
        let scratch = vec![Complex64::new(0.0, 0.0); fft_forward.get_inplace_scratch_len()];
        Self {
            size,
            fft_forward,
            scratch,
        }
    }

    /// FFT size.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Compute the forward FFT in place.
    pub fn fft_inplace(&mut self, buffer: &mut [Complex64]) {
        assert_eq!(buffer.len(), self.size);
        self.fft_forward
            .process_with_scratch(buffer, &mut self.scratch);
    }

    /// Reorder a spectrum so the zero-frequency bin sits at the center.
    pub fn fft_shift<T: Copy>(data: &[T]) -> Vec<T> {
        let n = data.len();
        let mid = n - n / 2;
        let mut out = Vec::with_capacity(n);
        out.extend_from_slice(&data[mid..]);
        out.extend_from_slice(&data[..mid]);
        out
    }
}
