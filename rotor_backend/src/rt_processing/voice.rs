//! One polyphonic voice: four wavetable oscillators, an amp envelope, two
//! LFOs and the rotor, tied together by a small modulation matrix.

use std::array;
use std::sync::Arc;

use rotor_core::midi::{midi_note_to_hz, velocity_to_unit};
use rotor_core::params::{
    EngineParameters, MAX_MOD_ROUTES, ModDestination, ModRoute, ModSource, OSCILLATORS_PER_VOICE,
};

use super::modulation::{ModOutputData, Modulator, Rotor, SynthLfo};
use super::waveform::{EnvelopeGenerator, EnvelopeState, WavetableOscillator, WavetableSet};

/// Oscillators are summed at this gain so four in phase cannot clip.
pub const OSC_MIX_GAIN: f64 = 0.25;

/// Destination totals for one sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModAccumulator {
    pub pitch_semitones: f64,
    pub amplitude_gain: f64,
}

impl Default for ModAccumulator {
    fn default() -> Self {
        Self {
            pitch_semitones: 0.0,
            amplitude_gain: 1.0,
        }
    }
}

/// Fixed-size routing table from modulation taps to destinations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModMatrix {
    routes: [Option<ModRoute>; MAX_MOD_ROUTES],
}

impl ModMatrix {
    pub fn new(routes: [Option<ModRoute>; MAX_MOD_ROUTES]) -> Self {
        Self { routes }
    }

    pub fn routes(&self) -> &[Option<ModRoute>; MAX_MOD_ROUTES] {
        &self.routes
    }

    /// Replaces the routing; returns true if anything changed.
    pub fn set_routes(&mut self, routes: &[Option<ModRoute>; MAX_MOD_ROUTES]) -> bool {
        let changed = self.routes != *routes;
        self.routes = *routes;
        changed
    }

    /// Pitch routes add `value * intensity` semitones; amplitude routes
    /// multiply by `1 + intensity * (value - 1)`, so intensity 0 is unity.
    #[inline]
    pub fn apply(
        &self,
        lfo1: &ModOutputData,
        lfo2: &ModOutputData,
        rotor: &ModOutputData,
    ) -> ModAccumulator {
        let mut acc = ModAccumulator::default();
        for route in self.routes.iter().flatten() {
            let source = match route.source {
                ModSource::Lfo1 => lfo1,
                ModSource::Lfo2 => lfo2,
                ModSource::Rotor => rotor,
            };
            let value = source.tap(route.tap);
            match route.destination {
                ModDestination::Pitch => acc.pitch_semitones += value * route.intensity,
                ModDestination::Amplitude => {
                    acc.amplitude_gain *= 1.0 + route.intensity * (value - 1.0)
                }
            }
        }
        acc
    }
}

pub struct SynthVoice {
    oscillators: [WavetableOscillator; OSCILLATORS_PER_VOICE],
    amp_eg: EnvelopeGenerator,
    lfo1: SynthLfo,
    lfo2: SynthLfo,
    rotor: Rotor,
    mod_matrix: ModMatrix,

    tuning_semitones: f64,
    bend_range_semitones: f64,

    note: Option<u8>,
    velocity_gain: f64,
    // note-on order, used to pick the oldest voice to steal
    started_at: u64,
}

impl SynthVoice {
    pub fn new(tables: Arc<WavetableSet>, seed: u32) -> Self {
        Self {
            oscillators: array::from_fn(|_| WavetableOscillator::new(Arc::clone(&tables))),
            amp_eg: EnvelopeGenerator::new(),
            lfo1: SynthLfo::new(seed),
            lfo2: SynthLfo::new(seed.wrapping_add(1)),
            rotor: Rotor::new(seed.wrapping_add(2)),
            mod_matrix: ModMatrix::new([None; MAX_MOD_ROUTES]),
            tuning_semitones: 0.0,
            bend_range_semitones: 0.0,
            note: None,
            velocity_gain: 0.0,
            started_at: 0,
        }
    }

    pub fn reset(&mut self, sample_rate: f64) -> bool {
        self.note = None;
        self.velocity_gain = 0.0;
        self.oscillators.iter_mut().for_each(|osc| osc.reset(sample_rate));
        self.amp_eg.reset(sample_rate);
        self.lfo1.reset(sample_rate) && self.lfo2.reset(sample_rate) && self.rotor.reset(sample_rate)
    }

    /// Pushes a parameter snapshot into every component. A routing change
    /// is forwarded to the modulators as a full re-route.
    pub fn update(&mut self, params: &EngineParameters) -> bool {
        let voice = &params.voice;
        let update_all = self.mod_matrix.set_routes(&voice.mod_routes);

        self.tuning_semitones = params.master_tuning_semitones();
        self.bend_range_semitones = params.pitch_bend_range_semitones();

        for (osc, selection) in self.oscillators.iter_mut().zip(voice.oscillators.iter()) {
            osc.update(selection);
        }
        self.amp_eg.update(&voice.amp_eg);

        self.lfo1.update(&voice.lfo1, update_all)
            && self.lfo2.update(&voice.lfo2, update_all)
            && self.rotor.update(&voice.rotor, update_all)
    }

    pub fn note_on(&mut self, note: u8, velocity: u8, started_at: u64) {
        let pitch = midi_note_to_hz(note as f64);
        self.note = Some(note);
        self.velocity_gain = velocity_to_unit(velocity);
        self.started_at = started_at;

        self.oscillators.iter_mut().for_each(WavetableOscillator::note_on);
        self.amp_eg.note_on();
        self.lfo1.note_on(pitch, note, velocity);
        self.lfo2.note_on(pitch, note, velocity);
        self.rotor.note_on(pitch, note, velocity);
    }

    /// Moves the voice into release; it stays allocated until the
    /// envelope finishes.
    pub fn note_off(&mut self, velocity: u8) {
        let Some(note) = self.note else {
            return;
        };
        let pitch = midi_note_to_hz(note as f64);
        self.amp_eg.note_off();
        self.lfo1.note_off(pitch, note, velocity);
        self.lfo2.note_off(pitch, note, velocity);
        self.rotor.note_off(pitch, note, velocity);
    }

    pub fn is_active(&self) -> bool {
        self.note.is_some() && self.amp_eg.is_active()
    }

    /// The note this voice is sounding, if it is active.
    pub fn note(&self) -> Option<u8> {
        self.note.filter(|_| self.amp_eg.is_active())
    }

    /// True while the note is held (not yet in release).
    pub fn is_held(&self) -> bool {
        self.is_active() && self.amp_eg.state() != EnvelopeState::Release
    }

    pub fn started_at(&self) -> u64 {
        self.started_at
    }

    pub fn lfo1(&self) -> &SynthLfo {
        &self.lfo1
    }

    /// Renders one mono sample. `pitch_bend` is the channel bend in [-1, 1].
    #[inline]
    pub fn render(&mut self, pitch_bend: f64) -> f64 {
        let Some(note) = self.note else {
            return 0.0;
        };
        if !self.amp_eg.is_active() {
            self.note = None;
            return 0.0;
        }

        let lfo1 = self.lfo1.render_modulator_output();
        let lfo2 = self.lfo2.render_modulator_output();
        let rotor = self.rotor.render_modulator_output();
        let mods = self.mod_matrix.apply(&lfo1, &lfo2, &rotor);

        let semitones = note as f64
            + self.tuning_semitones
            + pitch_bend * self.bend_range_semitones
            + mods.pitch_semitones;
        let frequency = midi_note_to_hz(semitones);

        let mut mix = 0.0;
        for osc in self.oscillators.iter_mut() {
            osc.set_frequency(frequency);
            mix += osc.next_sample();
        }

        let envelope = self.amp_eg.next_value();
        mix * OSC_MIX_GAIN * envelope * self.velocity_gain * mods.amplitude_gain
    }
}
