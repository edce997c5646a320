use rotor_core::params::{LfoMode, LfoParameters, LfoWaveform, RotorParameters};

use super::{ModOutputData, Modulator, SynthLfo};

/// Two free-running sine LFOs combined into one modulation source.
///
/// Bipolar taps are the sum of both LFOs; the unipolar taps are their mean
/// so they stay in [0, 1].
pub struct Rotor {
    lfo1: SynthLfo,
    lfo2: SynthLfo,
    params: RotorParameters,
}

impl Rotor {
    pub fn new(seed: u32) -> Self {
        Self {
            lfo1: SynthLfo::new(seed),
            lfo2: SynthLfo::new(seed.wrapping_add(1)),
            params: RotorParameters::default(),
        }
    }

    pub fn params(&self) -> &RotorParameters {
        &self.params
    }

    pub fn lfos(&self) -> (&SynthLfo, &SynthLfo) {
        (&self.lfo1, &self.lfo2)
    }

    fn lfo_params(rate: f64, depth: f64) -> LfoParameters {
        LfoParameters {
            waveform: LfoWaveform::Sine,
            mode: LfoMode::FreeRun,
            frequency_hz: rate,
            output_amplitude: depth,
            ..LfoParameters::default()
        }
    }
}

impl Modulator for Rotor {
    type Params = RotorParameters;

    fn reset(&mut self, sample_rate: f64) -> bool {
        self.lfo1.reset(sample_rate) && self.lfo2.reset(sample_rate)
    }

    fn update(&mut self, params: &RotorParameters, update_all_mod_routings: bool) -> bool {
        self.params = *params;
        let first = Self::lfo_params(params.rate1, params.depth1);
        let second = Self::lfo_params(params.rate2, params.depth2);
        self.lfo1.update(&first, update_all_mod_routings)
            && self.lfo2.update(&second, update_all_mod_routings)
    }

    fn render_modulator_output(&mut self) -> ModOutputData {
        let a = self.lfo1.render_modulator_output();
        let b = self.lfo2.render_modulator_output();
        ModOutputData {
            normal: a.normal + b.normal,
            normal_inverted: a.normal_inverted + b.normal_inverted,
            quad_phase: a.quad_phase + b.quad_phase,
            quad_phase_inverted: a.quad_phase_inverted + b.quad_phase_inverted,
            unipolar_from_max: 0.5 * (a.unipolar_from_max + b.unipolar_from_max),
            unipolar_from_min: 0.5 * (a.unipolar_from_min + b.unipolar_from_min),
        }
    }

    fn note_on(&mut self, pitch: f64, note: u8, velocity: u8) -> bool {
        self.lfo1.note_on(pitch, note, velocity) && self.lfo2.note_on(pitch, note, velocity)
    }

    fn note_off(&mut self, pitch: f64, note: u8, velocity: u8) -> bool {
        self.lfo1.note_off(pitch, note, velocity) && self.lfo2.note_off(pitch, note, velocity)
    }
}
