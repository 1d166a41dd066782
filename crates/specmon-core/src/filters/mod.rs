//! Channelization filtering
//!
//! A sweep applies one lowpass filter to every acquired block before
//! reduction, isolating the band of interest from alias products at the
//! segment edges. [`fir`] holds the Kaiser windowed-sinc designer and the
//! zero-phase block application; [`windows`] the window functions it and the
//! PSD reduction draw from.

pub mod fir;
pub mod windows;

pub use fir::{CompiledFilter, FilterSpec, InfeasibleFilterError};
pub use windows::Window;
