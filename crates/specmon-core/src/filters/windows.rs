//! Window functions for filter design and spectral estimation
//!
//! The channelization filter is designed with a Kaiser window, whose shape
//! parameter β trades main-lobe width against sidelobe level and can be
//! derived directly from a stopband-attenuation target. The PSD reduction
//! uses a Hann window per frame.

use std::f64::consts::PI;

/// Window function type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Window {
    /// Rectangular window (no tapering)
    Rectangular,
    /// Hann window: 0.5*(1 - cos(2πn/(N-1)))
    Hann,
    /// Blackman window: 0.42 - 0.5*cos(2πn/(N-1)) + 0.08*cos(4πn/(N-1))
    Blackman,
    /// Kaiser window with shape parameter β
    Kaiser(f64),
}

impl Window {
    /// Generate window coefficients for the given length.
    pub fn generate(&self, length: usize) -> Vec<f64> {
        match self {
            Window::Rectangular => vec![1.0; length],
            Window::Hann => hann_window(length),
            Window::Blackman => blackman_window(length),
            Window::Kaiser(beta) => kaiser_window(length, *beta),
        }
    }
}

/// Generate a Hann window.
pub fn hann_window(length: usize) -> Vec<f64> {
    if length == 0 {
        return vec![];
    }
    if length == 1 {
        return vec![1.0];
    }
    let n_minus_1 = (length - 1) as f64;
    (0..length)
        .map(|n| 0.5 * (1.0 - (2.0 * PI * n as f64 / n_minus_1).cos()))
        .collect()
}

/// Generate a Blackman window.
pub fn blackman_window(length: usize) -> Vec<f64> {
    if length == 0 {
        return vec![];
    }
    if length == 1 {
        return vec![1.0];
    }
    let n_minus_1 = (length - 1) as f64;
    (0..length)
        .map(|n| {
            let x = 2.0 * PI * n as f64 / n_minus_1;
            0.42 - 0.5 * x.cos() + 0.08 * (2.0 * x).cos()
        })
        .collect()
}

/// Generate a Kaiser window with shape parameter β.
pub fn kaiser_window(length: usize, beta: f64) -> Vec<f64> {
    if length == 0 {
        return vec![];
    }
    if length == 1 {
        return vec![1.0];
    }
    let n_minus_1 = (length - 1) as f64;
    let half = n_minus_1 / 2.0;
    let i0_beta = bessel_i0(beta);

    (0..length)
        .map(|n| {
            let x = (n as f64 - half) / half;
            bessel_i0(beta * (1.0 - x * x).sqrt()) / i0_beta
        })
        .collect()
}

/// Kaiser β parameter achieving the given stopband attenuation.
///
/// Kaiser's empirical formula; attenuation in positive dB.
pub fn kaiser_beta_from_attenuation(attenuation_db: f64) -> f64 {
    if attenuation_db > 50.0 {
        0.1102 * (attenuation_db - 8.7)
    } else if attenuation_db >= 21.0 {
        0.5842 * (attenuation_db - 21.0).powf(0.4) + 0.07886 * (attenuation_db - 21.0)
    } else {
        0.0
    }
}

/// Minimum Kaiser filter order for the given normalized transition width
/// (fraction of the sample rate, 0 to 0.5) and stopband attenuation.
pub fn kaiser_order(transition_width: f64, attenuation_db: f64) -> usize {
    let num = attenuation_db - 7.95;
    let denom = 14.36 * transition_width;
    ((num / denom).ceil() as usize).max(1)
}

/// Modified Bessel function of the first kind, order zero.
///
/// Abramowitz & Stegun polynomial approximations, accurate to ~1e-7.
fn bessel_i0(x: f64) -> f64 {
    if x.abs() < 1e-10 {
        return 1.0;
    }

    let ax = x.abs();
    if ax < 3.75 {
        let t = (x / 3.75).powi(2);
        1.0 + t
            * (3.5156229
                + t * (3.0899424
                    + t * (1.2067492 + t * (0.2659732 + t * (0.0360768 + t * 0.0045813)))))
    } else {
        let t = 3.75 / ax;
        (ax.exp() / ax.sqrt())
            * (0.39894228
                + t * (0.01328592
                    + t * (0.00225319
                        + t * (-0.00157565
                            + t * (0.00916281
                                + t * (-0.02057706
                                    + t * (0.02635537 + t * (-0.01647633 + t * 0.00392377))))))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hann_zero_at_edges_unity_at_center() {
        let w = hann_window(65);
        assert!(w[0].abs() < 1e-12);
        assert!(w[64].abs() < 1e-12);
        assert!((w[32] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_blackman_small_at_edges() {
        let w = blackman_window(33);
        assert!(w[0].abs() < 0.01);
        assert!(w[32].abs() < 0.01);
    }

    #[test]
    fn test_kaiser_symmetric() {
        let w = kaiser_window(31, 7.0);
        for i in 0..15 {
            assert!((w[i] - w[30 - i]).abs() < 1e-12, "asymmetry at tap {}", i);
        }
    }

    #[test]
    fn test_kaiser_beta_zero_is_rectangular() {
        let w = kaiser_window(16, 0.0);
        assert!(w.iter().all(|&v| (v - 1.0).abs() < 0.1));
    }

    #[test]
    fn test_beta_grows_with_attenuation() {
        assert_eq!(kaiser_beta_from_attenuation(15.0), 0.0);
        let b40 = kaiser_beta_from_attenuation(40.0);
        let b60 = kaiser_beta_from_attenuation(60.0);
        let b80 = kaiser_beta_from_attenuation(80.0);
        assert!(b40 > 0.0 && b60 > b40 && b80 > b60);
    }

    #[test]
    fn test_order_grows_with_tighter_transition() {
        assert!(kaiser_order(0.05, 60.0) > kaiser_order(0.2, 60.0));
        assert!(kaiser_order(0.1, 90.0) > kaiser_order(0.1, 40.0));
    }

    #[test]
    fn test_bessel_i0_monotonic() {
        assert!((bessel_i0(0.0) - 1.0).abs() < 1e-12);
        assert!(bessel_i0(2.0) > bessel_i0(1.0));
        assert!(bessel_i0(8.0) > bessel_i0(4.0));
    }

    #[test]
    fn test_degenerate_lengths() {
        assert!(hann_window(0).is_empty());
        assert_eq!(kaiser_window(1, 5.0), vec![1.0]);
        assert_eq!(Window::Rectangular.generate(4), vec![1.0; 4]);
    }
}
