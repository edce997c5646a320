use std::f64::consts::PI;
use std::sync::{Arc, OnceLock};

use log::debug;

use super::noise::NoiseRegister;

// Power of 2 for fast masking
pub const WAVETABLE_LENGTH: usize = 2048;
const WAVETABLE_MASK: usize = WAVETABLE_LENGTH - 1;

pub const BANK_COUNT: usize = 4;
pub const WAVES_PER_BANK: usize = 32;

const MAX_HARMONICS: usize = 12;

static BUILTIN: OnceLock<Arc<WavetableSet>> = OnceLock::new();

/// One single-cycle table.
#[derive(Debug, Clone)]
pub struct Wavetable {
    name: String,
    samples: Box<[f32]>,
}

impl Wavetable {
    /// Builds a table from harmonic amplitudes (index 0 = fundamental),
    /// normalised to a peak of 1.
    pub fn from_harmonics(name: impl Into<String>, amplitudes: &[f64]) -> Self {
        let mut samples: Vec<f32> = (0..WAVETABLE_LENGTH)
            .map(|i| {
                let phase = i as f64 / WAVETABLE_LENGTH as f64;
                amplitudes
                    .iter()
                    .enumerate()
                    .map(|(h, amp)| amp * (2.0 * PI * (h + 1) as f64 * phase).sin())
                    .sum::<f64>() as f32
            })
            .collect();

        let peak = samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
        if peak > 0.0 {
            samples.iter_mut().for_each(|s| *s /= peak);
        }

        Self {
            name: name.into(),
            samples: samples.into_boxed_slice(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Linearly interpolated read; `phase` is in cycles, [0.0, 1.0).
    #[inline]
    pub fn read(&self, phase: f64) -> f32 {
        interpolated_lookup(&self.samples, phase as f32)
    }
}

#[derive(Debug, Clone)]
pub struct WavetableBank {
    name: String,
    tables: Vec<Wavetable>,
}

impl WavetableBank {
    pub fn new(name: impl Into<String>, tables: Vec<Wavetable>) -> Self {
        Self {
            name: name.into(),
            tables,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Immutable bank -> waveform -> table store shared by every oscillator.
///
/// Built once and handed to the engine as an `Arc`; the audio thread only
/// ever reads from it.
#[derive(Debug, Clone)]
pub struct WavetableSet {
    banks: Vec<WavetableBank>,
}

impl WavetableSet {
    /// Wraps caller-supplied banks. Empty banks are dropped; an empty set
    /// falls back to a single sine table so lookups always resolve.
    pub fn new(banks: Vec<WavetableBank>) -> Self {
        let mut banks: Vec<WavetableBank> = banks.into_iter().filter(|b| !b.is_empty()).collect();
        if banks.is_empty() {
            banks.push(WavetableBank::new(
                "Sine",
                vec![Wavetable::from_harmonics("sine", &[1.0])],
            ));
        }
        Self { banks }
    }

    /// The procedurally generated factory set.
    pub fn builtin() -> Self {
        let harmonic = (0..WAVES_PER_BANK)
            .map(|w| {
                let count = harmonic_count(w);
                let amps: Vec<f64> = (1..=count).map(|h| 1.0 / h as f64).collect();
                Wavetable::from_harmonics(format!("harmonic {w}"), &amps)
            })
            .collect();

        let odd = (0..WAVES_PER_BANK)
            .map(|w| {
                let count = harmonic_count(w);
                let amps: Vec<f64> = (1..=count)
                    .map(|h| if h % 2 == 1 { 1.0 / h as f64 } else { 0.0 })
                    .collect();
                Wavetable::from_harmonics(format!("odd {w}"), &amps)
            })
            .collect();

        let formant = (0..WAVES_PER_BANK)
            .map(|w| {
                let centre = 1.0 + (w as f64 / (WAVES_PER_BANK - 1) as f64) * (MAX_HARMONICS - 1) as f64;
                let amps: Vec<f64> = (1..=MAX_HARMONICS)
                    .map(|h| {
                        let distance = h as f64 - centre;
                        (-distance * distance / 2.0).exp()
                    })
                    .collect();
                Wavetable::from_harmonics(format!("formant {w}"), &amps)
            })
            .collect();

        let random = (0..WAVES_PER_BANK)
            .map(|w| {
                let mut register = NoiseRegister::new(0xA5A5_0000 ^ w as u32);
                let mut amps: Vec<f64> = (0..MAX_HARMONICS)
                    .map(|_| register.next_random().abs())
                    .collect();
                amps[0] = 1.0;
                Wavetable::from_harmonics(format!("rand {w}"), &amps)
            })
            .collect();

        let set = Self::new(vec![
            WavetableBank::new("Harmonic", harmonic),
            WavetableBank::new("Odd", odd),
            WavetableBank::new("Formant", formant),
            WavetableBank::new("Rand", random),
        ]);
        debug!(
            "built wavetable set: {} banks, {} samples per table",
            set.bank_count(),
            WAVETABLE_LENGTH
        );
        set
    }

    /// Process-wide copy of [`builtin`](Self::builtin), built on first use.
    pub fn shared() -> Arc<WavetableSet> {
        Arc::clone(BUILTIN.get_or_init(|| Arc::new(Self::builtin())))
    }

    pub fn bank_count(&self) -> usize {
        self.banks.len()
    }

    pub fn bank(&self, bank: usize) -> &WavetableBank {
        &self.banks[bank.min(self.banks.len() - 1)]
    }

    /// Resolves a selection, clamping both indices into range.
    pub fn table(&self, bank: usize, waveform: usize) -> &Wavetable {
        let bank = self.bank(bank);
        &bank.tables[waveform.min(bank.tables.len() - 1)]
    }
}

fn harmonic_count(wave: usize) -> usize {
    1 + wave * (MAX_HARMONICS - 1) / (WAVES_PER_BANK - 1)
}

/// Generic interpolated table lookup; `phase` should be in [0.0, 1.0).
#[inline]
pub fn interpolated_lookup(table: &[f32], phase: f32) -> f32 {
    let scaled_phase = phase * WAVETABLE_LENGTH as f32;
    let index = scaled_phase as usize & WAVETABLE_MASK;
    let frac = scaled_phase - (scaled_phase as usize as f32);

    let sample1 = table[index];
    let sample2 = table[(index + 1) & WAVETABLE_MASK];

    sample1 + frac * (sample2 - sample1)
}

/// Normalize phase to [0.0, 1.0) to prevent accumulation errors
#[inline]
pub fn normalize_phase(phase: f64) -> f64 {
    phase - phase.floor()
}

#[inline]
pub fn phase_increment(frequency: f64, sample_rate: f64) -> f64 {
    frequency / sample_rate
}
