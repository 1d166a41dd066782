//! # Spectrum Monitoring Sensor Library
//!
//! The analyzer-facing half of the swept-spectrum monitoring pipeline:
//! the hardware collaborator trait, a software simulator, per-segment gain
//! control with read-back confirmation, bounded-duration acquisition, and
//! the sweep orchestrator that ties them to the reductions in
//! `specmon-core`.
//!
//! ## Sweep flow
//!
//! ```text
//! run_sweep
//!   └─ per segment, in configured order:
//!        Configuring  gain::GainController::apply      (ref level, atten, preamp)
//!        Acquiring    acquire::acquire_segment         (skip interval dropped)
//!        Reducing     channelization filter → reduce_block (4 products, joined)
//!   └─ Assembling → DataProduct (or SweepError carrying the partial product)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use specmon_core::SweepConfig;
//! use specmon_sensor::{run_sweep, SimulatedAnalyzer};
//!
//! let yaml = r#"
//! filter:
//!   passband_ripple_db: 0.1
//!   stopband_atten_db: 40.0
//!   passband_edge_hz: 5.0e6
//!   stopband_edge_hz: 7.0e6
//! psd: { nffts: 64 }
//! pfp: { pfp_frame_period_ms: 0.5 }
//! apd: { apd_bin_size_db: 0.5, apd_min_bin_dbm: -180.0, apd_max_bin_dbm: -30.0 }
//! td: { td_bin_size_ms: 1.0 }
//! analyzer:
//!   preamp_enable: false
//!   reference_level: [-25.0]
//!   attenuation: [0.0]
//! sweep:
//!   sample_rate: 14.0e6
//!   duration_ms: 4
//!   nskip: 0
//!   frequency: [3555.0e6]
//! "#;
//! let config = SweepConfig::parse(yaml).unwrap();
//! let mut analyzer = SimulatedAnalyzer::new(0);
//! let product = run_sweep(&mut analyzer, &config, None).unwrap();
//! assert_eq!(product.len(), 1);
//! ```

pub mod acquire;
pub mod device;
pub mod gain;
pub mod simulator;
pub mod sweep;

pub use acquire::{acquire_segment, AcquisitionError};
pub use device::{health_check, AnalyzerCapabilities, AnalyzerError, SignalAnalyzer};
pub use gain::{GainController, GainError};
pub use simulator::{AcquireFault, SimulatedAnalyzer};
pub use sweep::{run_sweep, CancelToken, DataProduct, SegmentFailure, SegmentResult, SweepError};
