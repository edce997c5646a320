use std::sync::Arc;

use rotor_core::params::OscillatorParameters;

use super::tables::{WavetableSet, normalize_phase, phase_increment};

/// Wavetable oscillator reading one table out of the shared set.
pub struct WavetableOscillator {
    tables: Arc<WavetableSet>,
    selection: OscillatorParameters,
    sample_rate: f64,
    frequency: f64,
    phase: f64,
    phase_inc: f64,
}

impl WavetableOscillator {
    pub fn new(tables: Arc<WavetableSet>) -> Self {
        Self {
            tables,
            selection: OscillatorParameters::default(),
            sample_rate: 0.0,
            frequency: 0.0,
            phase: 0.0,
            phase_inc: 0.0,
        }
    }

    pub fn reset(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.phase = 0.0;
        self.set_frequency(self.frequency);
    }

    pub fn update(&mut self, selection: &OscillatorParameters) {
        self.selection = *selection;
    }

    /// Restarts the cycle so every note starts at a zero crossing.
    pub fn note_on(&mut self) {
        self.phase = 0.0;
    }

    /// Frequencies are clamped to [0, nyquist].
    #[inline]
    pub fn set_frequency(&mut self, frequency: f64) {
        if self.sample_rate <= 0.0 {
            return;
        }
        self.frequency = frequency.clamp(0.0, self.sample_rate * 0.5);
        self.phase_inc = phase_increment(self.frequency, self.sample_rate);
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    #[inline]
    pub fn next_sample(&mut self) -> f64 {
        let table = self
            .tables
            .table(self.selection.bank_index, self.selection.waveform_index);
        let sample = table.read(self.phase) as f64;
        self.phase = normalize_phase(self.phase + self.phase_inc);
        sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sine_cycle() {
        let mut osc = WavetableOscillator::new(WavetableSet::shared());
        osc.reset(48000.0);
        osc.set_frequency(1000.0);
        // 48 samples per cycle
        let samples: Vec<f64> = (0..48).map(|_| osc.next_sample()).collect();
        assert!(samples[0].abs() < 1e-3);
        assert!((samples[12] - 1.0).abs() < 1e-3);
        assert!((samples[36] + 1.0).abs() < 1e-3);
        assert!(osc.next_sample().abs() < 1e-3);
    }

    #[test]
    fn test_frequency_clamped_to_nyquist() {
        let mut osc = WavetableOscillator::new(WavetableSet::shared());
        osc.reset(44100.0);
        osc.set_frequency(90_000.0);
        assert_eq!(osc.frequency(), 22050.0);
        osc.set_frequency(-5.0);
        assert_eq!(osc.frequency(), 0.0);
    }
}
