//! # Spectrum Monitoring Core Library
//!
//! Core DSP and data-product computation for swept-frequency
//! spectrum-occupancy monitoring. Given a filtered block of complex samples
//! from one sweep segment, this crate produces four statistically
//! independent data products:
//!
//! - **PSD mean/max**: frame-averaged power spectral density with mean and
//!   max detectors sharing identical binning
//! - **APD**: amplitude probability distribution of instantaneous power
//! - **Time-domain power**: mean/max/min power per fixed-duration window
//! - **PFP**: periodic frame power, phase-aligned for coherent averaging of
//!   repeating emitters such as radar pulse trains
//!
//! It also holds the channelization-filter designer, the sweep
//! configuration model, and the observability plumbing. Everything
//! hardware-facing (analyzer trait, gain control, acquisition, sweep
//! orchestration) lives in `specmon-sensor`, which builds on this crate.
//!
//! ## Data flow
//!
//! ```text
//! raw block → channelization filter → ┬─ PSD mean/max ─┐
//!                                     ├─ APD           ├─ ReductionSet
//!                                     ├─ TD power      │
//!                                     └─ PFP frames  ──┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use num_complex::Complex64;
//! use specmon_core::{reduce_block, RawBlock, ReductionConfig, ApdConfig};
//! use std::time::SystemTime;
//!
//! let samples: Vec<Complex64> = (0..4000)
//!     .map(|i| {
//!         let phase = 2.0 * std::f64::consts::PI * 0.1 * i as f64;
//!         Complex64::new(phase.cos() * 0.01, phase.sin() * 0.01)
//!     })
//!     .collect();
//! let block = RawBlock::new(samples, 1.0e6, SystemTime::now());
//!
//! let config = ReductionConfig {
//!     nffts: 4,
//!     apd: ApdConfig { bin_size_db: 1.0, min_bin_dbm: -120.0, max_bin_dbm: 0.0 },
//!     td_bin_size_ms: 1.0,
//!     pfp_frame_period_ms: 0.5,
//! };
//! let products = reduce_block(&block, &config).unwrap();
//! assert_eq!(products.apd.total_count(), 4000);
//! ```

pub mod apd;
pub mod config;
pub mod fft_utils;
pub mod filters;
pub mod observe;
pub mod pfp;
pub mod psd;
pub mod reduction;
pub mod td_power;
pub mod types;

pub use apd::{apd_histogram, ApdConfig, ApdHistogram};
pub use config::{ConfigError, FrequencySegment, SweepConfig};
pub use filters::{CompiledFilter, FilterSpec, InfeasibleFilterError};
pub use pfp::{pfp_frames, FrameBins};
pub use psd::{psd_mean_max, PsdEstimate};
pub use reduction::{reduce_block, ReductionConfig, ReductionSet};
pub use td_power::{td_power_bins, PowerBin};
pub use types::{IQBuffer, IQSample, RawBlock, ReductionError};
