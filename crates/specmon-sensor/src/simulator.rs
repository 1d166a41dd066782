//! Software analyzer simulator
//!
//! A pure-software stand-in for the analyzer front end, for development and
//! testing without hardware. Generates a seeded Gaussian noise floor with
//! an optional injected tone, honors the capability table of the real
//! device, and offers fault-injection hooks so the retry and confirmation
//! paths of the pipeline can be exercised deterministically.

use std::cell::Cell;
use std::collections::VecDeque;
use std::time::Duration;

use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use specmon_core::types::{dbm_to_watts, IQSample, REFERENCE_IMPEDANCE_OHMS};

use crate::device::{AnalyzerCapabilities, AnalyzerError, AnalyzerResult, SignalAnalyzer};

/// Scripted outcome for one `acquire` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireFault {
    /// The capture misses its deadline
    Timeout,
    /// The capture returns only `deliver` samples (buffer fault)
    Underrun { deliver: usize },
}

/// Software analyzer with deterministic sample generation.
pub struct SimulatedAnalyzer {
    name: String,
    caps: AnalyzerCapabilities,
    center_frequency_hz: f64,
    sample_rate_hz: f64,
    iq_bandwidth_hz: f64,
    reference_level_dbm: f64,
    attenuation_db: f64,
    preamp: bool,
    noise_floor_dbm: f64,
    /// Injected tone as (offset from center in Hz, power in dBm)
    tone: Option<(f64, f64)>,
    rng: StdRng,
    sample_counter: u64,
    /// Scripted per-call acquire outcomes; empty queue means success
    acquire_script: VecDeque<Option<AcquireFault>>,
    /// While positive, `reference_level()` reports `stale_reference_dbm`
    stale_reference_reads: Cell<usize>,
    stale_reference_dbm: f64,
    /// Count of commands issued to the device (setters + captures)
    commands_issued: u64,
}

impl SimulatedAnalyzer {
    /// Create a simulator with the default capability table and a seeded
    /// noise generator.
    pub fn new(seed: u64) -> Self {
        Self {
            name: "Simulated swept analyzer".to_string(),
            caps: AnalyzerCapabilities::default(),
            center_frequency_hz: 3.555e9,
            sample_rate_hz: 14.0e6,
            iq_bandwidth_hz: 10.0e6,
            reference_level_dbm: -25.0,
            attenuation_db: 0.0,
            preamp: false,
            noise_floor_dbm: -90.0,
            tone: None,
            rng: StdRng::seed_from_u64(seed),
            sample_counter: 0,
            acquire_script: VecDeque::new(),
            stale_reference_reads: Cell::new(0),
            stale_reference_dbm: 0.0,
            commands_issued: 0,
        }
    }

    /// Set the simulated noise floor in dBm per sample.
    pub fn set_noise_floor_dbm(&mut self, dbm: f64) {
        self.noise_floor_dbm = dbm;
    }

    /// Inject a CW tone at `offset_hz` from the center with the given power.
    pub fn inject_tone(&mut self, offset_hz: f64, power_dbm: f64) {
        self.tone = Some((offset_hz, power_dbm));
    }

    /// Remove the injected tone.
    pub fn clear_tone(&mut self) {
        self.tone = None;
    }

    /// Script the outcome of the next `acquire` call (FIFO). Queue `None`
    /// for an explicit success slot ahead of a fault.
    pub fn script_acquire(&mut self, outcome: Option<AcquireFault>) {
        self.acquire_script.push_back(outcome);
    }

    /// Make the next `reads` calls of `reference_level()` report
    /// `stale_dbm` instead of the configured value, simulating a front end
    /// that has not settled onto the commanded state.
    pub fn fail_reference_level_readbacks(&mut self, reads: usize, stale_dbm: f64) {
        self.stale_reference_reads.set(reads);
        self.stale_reference_dbm = stale_dbm;
    }

    /// Total setter/capture commands this device has received.
    pub fn commands_issued(&self) -> u64 {
        self.commands_issued
    }

    /// IQ bandwidth paired with the current sample rate.
    pub fn iq_bandwidth_hz(&self) -> f64 {
        self.iq_bandwidth_hz
    }

    fn generate(&mut self, num_samples: usize) -> Vec<IQSample> {
        // Per-component sigma for total sample power of the noise floor:
        // power_watts = (i^2 + q^2) / R, E[i^2 + q^2] = 2 sigma^2
        let noise_watts = dbm_to_watts(self.noise_floor_dbm);
        let sigma = (noise_watts * REFERENCE_IMPEDANCE_OHMS / 2.0).sqrt();
        let normal = Normal::new(0.0, sigma.max(1e-30)).expect("sigma is finite and positive");

        let tone = self.tone.map(|(offset_hz, power_dbm)| {
            let amp = (dbm_to_watts(power_dbm) * REFERENCE_IMPEDANCE_OHMS).sqrt();
            (offset_hz, amp)
        });

        let mut out = Vec::with_capacity(num_samples);
        for _ in 0..num_samples {
            let mut s = Complex64::new(normal.sample(&mut self.rng), normal.sample(&mut self.rng));
            if let Some((offset_hz, amp)) = tone {
                let phase = 2.0 * std::f64::consts::PI * offset_hz * self.sample_counter as f64
                    / self.sample_rate_hz;
                s += Complex64::new(amp * phase.cos(), amp * phase.sin());
            }
            self.sample_counter += 1;
            out.push(s);
        }
        out
    }
}

impl SignalAnalyzer for SimulatedAnalyzer {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> &AnalyzerCapabilities {
        &self.caps
    }

    fn set_center_frequency(&mut self, hz: f64) -> AnalyzerResult<()> {
        self.commands_issued += 1;
        if hz < self.caps.min_frequency_hz || hz > self.caps.max_frequency_hz {
            return Err(AnalyzerError::OutOfRange {
                setting: "center_frequency",
                value: hz,
                min: self.caps.min_frequency_hz,
                max: self.caps.max_frequency_hz,
            });
        }
        self.center_frequency_hz = hz;
        Ok(())
    }

    fn center_frequency(&self) -> f64 {
        self.center_frequency_hz
    }

    fn set_sample_rate(&mut self, rate: f64) -> AnalyzerResult<()> {
        self.commands_issued += 1;
        match AnalyzerCapabilities::iq_bandwidth_for(rate) {
            Some(bw) if self.caps.supports_sample_rate(rate) => {
                self.sample_rate_hz = rate;
                self.iq_bandwidth_hz = bw;
                Ok(())
            }
            _ => Err(AnalyzerError::UnsupportedSampleRate(rate)),
        }
    }

    fn sample_rate(&self) -> f64 {
        self.sample_rate_hz
    }

    fn set_reference_level(&mut self, dbm: f64) -> AnalyzerResult<()> {
        self.commands_issued += 1;
        if dbm < self.caps.min_reference_level_dbm || dbm > self.caps.max_reference_level_dbm {
            return Err(AnalyzerError::OutOfRange {
                setting: "reference_level",
                value: dbm,
                min: self.caps.min_reference_level_dbm,
                max: self.caps.max_reference_level_dbm,
            });
        }
        self.reference_level_dbm = dbm;
        Ok(())
    }

    fn reference_level(&self) -> f64 {
        let stale = self.stale_reference_reads.get();
        if stale > 0 {
            self.stale_reference_reads.set(stale - 1);
            return self.stale_reference_dbm;
        }
        self.reference_level_dbm
    }

    fn set_attenuation(&mut self, db: f64) -> AnalyzerResult<()> {
        self.commands_issued += 1;
        if db < 0.0 || db > self.caps.max_attenuation_db {
            return Err(AnalyzerError::OutOfRange {
                setting: "attenuation",
                value: db,
                min: 0.0,
                max: self.caps.max_attenuation_db,
            });
        }
        self.attenuation_db = db;
        Ok(())
    }

    fn attenuation(&self) -> f64 {
        self.attenuation_db
    }

    fn set_preamp(&mut self, enabled: bool) -> AnalyzerResult<()> {
        self.commands_issued += 1;
        self.preamp = enabled;
        Ok(())
    }

    fn preamp_enabled(&self) -> bool {
        self.preamp
    }

    fn acquire(&mut self, num_samples: usize, deadline: Duration) -> AnalyzerResult<Vec<IQSample>> {
        self.commands_issued += 1;
        match self.acquire_script.pop_front() {
            Some(Some(AcquireFault::Timeout)) => Err(AnalyzerError::Timeout(format!(
                "IQ capture of {} samples missed {:?} deadline",
                num_samples, deadline
            ))),
            Some(Some(AcquireFault::Underrun { deliver })) => {
                Ok(self.generate(deliver.min(num_samples)))
            }
            _ => Ok(self.generate(num_samples)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::health_check;
    use specmon_core::types::{sample_power_watts, watts_to_dbm};

    #[test]
    fn test_noise_floor_power_matches_setting() {
        let mut sim = SimulatedAnalyzer::new(7);
        sim.set_noise_floor_dbm(-60.0);
        let samples = sim.acquire(50_000, Duration::from_secs(1)).unwrap();
        let mean_watts =
            samples.iter().map(|&s| sample_power_watts(s)).sum::<f64>() / samples.len() as f64;
        let mean_dbm = watts_to_dbm(mean_watts);
        assert!(
            (mean_dbm - (-60.0)).abs() < 0.5,
            "noise floor off: {} dBm",
            mean_dbm
        );
    }

    #[test]
    fn test_same_seed_same_samples() {
        let a = SimulatedAnalyzer::new(42)
            .acquire(64, Duration::from_secs(1))
            .unwrap();
        let b = SimulatedAnalyzer::new(42)
            .acquire(64, Duration::from_secs(1))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_rejects_out_of_range_settings() {
        let mut sim = SimulatedAnalyzer::new(0);
        assert!(matches!(
            sim.set_reference_level(45.0),
            Err(AnalyzerError::OutOfRange { .. })
        ));
        assert!(matches!(
            sim.set_attenuation(-3.0),
            Err(AnalyzerError::OutOfRange { .. })
        ));
        assert!(matches!(
            sim.set_sample_rate(1.0e6),
            Err(AnalyzerError::UnsupportedSampleRate(_))
        ));
        assert!(matches!(
            sim.set_center_frequency(1.0),
            Err(AnalyzerError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_sample_rate_selects_paired_bandwidth() {
        let mut sim = SimulatedAnalyzer::new(0);
        sim.set_sample_rate(875.0e3).unwrap();
        assert_eq!(sim.sample_rate(), 875.0e3);
        assert_eq!(sim.iq_bandwidth_hz(), 625.0e3);
    }

    #[test]
    fn test_scripted_timeout_then_success() {
        let mut sim = SimulatedAnalyzer::new(0);
        sim.script_acquire(Some(AcquireFault::Timeout));
        assert!(matches!(
            sim.acquire(100, Duration::from_millis(10)),
            Err(AnalyzerError::Timeout(_))
        ));
        assert_eq!(sim.acquire(100, Duration::from_millis(10)).unwrap().len(), 100);
    }

    #[test]
    fn test_scripted_underrun_delivers_short_block() {
        let mut sim = SimulatedAnalyzer::new(0);
        sim.script_acquire(Some(AcquireFault::Underrun { deliver: 10 }));
        assert_eq!(sim.acquire(100, Duration::from_secs(1)).unwrap().len(), 10);
    }

    #[test]
    fn test_stale_reference_level_readback() {
        let mut sim = SimulatedAnalyzer::new(0);
        sim.set_reference_level(-30.0).unwrap();
        sim.fail_reference_level_readbacks(2, -7.5);
        assert_eq!(sim.reference_level(), -7.5);
        assert_eq!(sim.reference_level(), -7.5);
        assert_eq!(sim.reference_level(), -30.0);
    }

    #[test]
    fn test_injected_tone_raises_power() {
        let mut sim = SimulatedAnalyzer::new(3);
        sim.set_noise_floor_dbm(-90.0);
        let quiet = sim.acquire(10_000, Duration::from_secs(1)).unwrap();
        sim.inject_tone(1.0e6, -40.0);
        let loud = sim.acquire(10_000, Duration::from_secs(1)).unwrap();

        let mean = |v: &[IQSample]| {
            v.iter().map(|&s| sample_power_watts(s)).sum::<f64>() / v.len() as f64
        };
        assert!(watts_to_dbm(mean(&loud)) > watts_to_dbm(mean(&quiet)) + 40.0);
    }

    #[test]
    fn test_health_check_passes_and_counts_commands() {
        let mut sim = SimulatedAnalyzer::new(0);
        assert_eq!(sim.commands_issued(), 0);
        let n = health_check(&mut sim).unwrap();
        assert_eq!(n, 100_000);
        assert_eq!(sim.commands_issued(), 1);
    }

    #[test]
    fn test_health_check_flags_short_delivery() {
        let mut sim = SimulatedAnalyzer::new(0);
        sim.script_acquire(Some(AcquireFault::Underrun { deliver: 5 }));
        assert!(matches!(
            health_check(&mut sim),
            Err(AnalyzerError::Hardware(_))
        ));
    }
}
