//! The synth engine: a fixed voice pool behind the per-sample render call.

use std::sync::Arc;

use log::{debug, info};
use rotor_core::config::{EngineConfig, validate_sample_rate};
use rotor_core::midi::{MidiEvent, MidiMessage, pitch_bend_to_bipolar};
use rotor_core::params::EngineParameters;
use rotor_core::render::SynthRenderData;

use super::voice::SynthVoice;
use super::waveform::WavetableSet;
use crate::error::{EngineError, EngineResult};

pub struct SynthEngine {
    config: EngineConfig,
    voices: Vec<SynthVoice>,
    params: EngineParameters,
    master_gain: f64,
    sample_rate: Option<f64>,
    pitch_bend: f64,
    // monotonically increasing note-on stamp
    note_counter: u64,
}

impl SynthEngine {
    /// Builds the voice pool. Every allocation the engine will ever make
    /// happens here.
    pub fn new(config: EngineConfig, wavetables: Arc<WavetableSet>) -> EngineResult<Self> {
        config.validate()?;
        let voices = (0..config.max_voices)
            .map(|index| {
                let seed = config.seed.wrapping_add((index as u32).wrapping_mul(0x9E37_79B9));
                SynthVoice::new(Arc::clone(&wavetables), seed)
            })
            .collect();
        let params = EngineParameters::default();
        debug!("engine created with {} voices", config.max_voices);
        Ok(Self {
            config,
            voices,
            master_gain: params.master_gain(),
            params,
            sample_rate: None,
            pitch_bend: 0.0,
            note_counter: 0,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Prepares every voice for `sample_rate`, silencing anything sounding.
    pub fn reset(&mut self, sample_rate: f64) -> EngineResult<()> {
        let sample_rate = validate_sample_rate(sample_rate)?;
        self.sample_rate = Some(sample_rate);
        self.pitch_bend = 0.0;
        let params = self.params;
        for voice in self.voices.iter_mut() {
            voice.reset(sample_rate);
            voice.update(&params);
        }
        info!("engine reset at {sample_rate} Hz ({} voices)", self.voices.len());
        Ok(())
    }

    pub fn sample_rate(&self) -> EngineResult<f64> {
        self.sample_rate.ok_or(EngineError::NotReset)
    }

    pub fn is_ready(&self) -> bool {
        self.sample_rate.is_some()
    }

    /// Installs a new snapshot and pushes it to every voice.
    pub fn set_parameters(&mut self, params: &EngineParameters) {
        self.params = *params;
        self.master_gain = params.master_gain();
        if self.sample_rate.is_none() {
            return;
        }
        for voice in self.voices.iter_mut() {
            voice.update(params);
        }
    }

    pub fn get_parameters(&self) -> EngineParameters {
        self.params
    }

    /// Dispatches one MIDI message. Returns false before `reset`.
    pub fn process_midi_event(&mut self, event: &MidiEvent) -> bool {
        if self.sample_rate.is_none() {
            return false;
        }
        match event.message {
            MidiMessage::NoteOn { note, velocity } => self.start_note(note, velocity),
            MidiMessage::NoteOff { note, velocity } => {
                for voice in self.voices.iter_mut().filter(|v| v.note() == Some(note)) {
                    voice.note_off(velocity);
                }
            }
            MidiMessage::PitchBend { value } => self.pitch_bend = pitch_bend_to_bipolar(value),
            MidiMessage::AllNotesOff => {
                for voice in self.voices.iter_mut().filter(|v| v.is_active()) {
                    voice.note_off(0);
                }
            }
            MidiMessage::ControlChange { .. } => {}
        }
        true
    }

    /// Retrigger a voice already on this note, else take a free voice,
    /// else steal the oldest.
    fn start_note(&mut self, note: u8, velocity: u8) {
        self.note_counter += 1;
        let index = self
            .voices
            .iter()
            .position(|v| v.note() == Some(note))
            .or_else(|| self.voices.iter().position(|v| !v.is_active()))
            .or_else(|| {
                self.voices
                    .iter()
                    .enumerate()
                    .min_by_key(|(_, v)| v.started_at())
                    .map(|(i, _)| i)
            });
        if let Some(index) = index {
            self.voices[index].note_on(note, velocity, self.note_counter);
        }
    }

    /// Renders one frame into `output`. Writes silence and returns false
    /// before `reset`.
    #[inline]
    pub fn render_audio_output(&mut self, output: &mut SynthRenderData) -> bool {
        if self.sample_rate.is_none() {
            *output = SynthRenderData::SILENCE;
            return false;
        }
        let bend = self.pitch_bend;
        let mix: f64 = self.voices.iter_mut().map(|voice| voice.render(bend)).sum();
        *output = SynthRenderData::from_mono(mix * self.master_gain);
        true
    }

    pub fn active_voice_count(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }

    pub fn voices(&self) -> &[SynthVoice] {
        &self.voices
    }
}
