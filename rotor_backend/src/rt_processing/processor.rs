//! Per-buffer pipeline between the host callback and the engine.
//!
//! Each buffer walks the same states in order:
//!
//! 1. `Idle` -> `ParametersSynced`: the bound controls are copied out of the
//!    shared slot with a try-lock. If the control thread holds the lock the
//!    previous copy is reused, so a buffer never sees a half-written edit.
//! 2. `ParametersApplied`: the copy is cooked into an `EngineParameters`
//!    snapshot and pushed to the voices.
//! 3. `RenderingFrames`: queued MIDI is drained once; for every frame, the
//!    events due at or before it fire first, then the engine renders it.
//! 4. `BufferComplete`: meters are published for the control thread.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam::atomic::AtomicCell;
use crossbeam::queue::ArrayQueue;
use log::{debug, info};
use rotor_core::controls::{BoundControls, ControlId};
use rotor_core::error::ConfigResult;
use rotor_core::midi::MidiEvent;
use rotor_core::preset::Preset;
use rotor_core::render::SynthRenderData;

use super::callback::AudioCallback;
use super::engine::SynthEngine;
use super::performance::{LoadSnapshot, RenderLoadMonitor};
use crate::error::{EngineError, EngineResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferState {
    Idle,
    ParametersSynced,
    ParametersApplied,
    RenderingFrames,
    BufferComplete,
}

/// State shared between the audio thread and the control thread.
struct SharedState {
    controls: spin::Mutex<BoundControls>,
    midi_in: ArrayQueue<MidiEvent>,
    peaks: [AtomicCell<f32>; 2],
    dropped_events: AtomicU64,
    state: AtomicCell<BufferState>,
    monitor: RenderLoadMonitor,
}

/// Control-thread handle: parameter edits, presets, MIDI input, meters.
#[derive(Clone)]
pub struct SynthController {
    shared: Arc<SharedState>,
}

impl SynthController {
    /// Clamps and stores one control value; picked up at the next buffer.
    pub fn set_control(&self, id: ControlId, value: f64) -> ConfigResult<f64> {
        self.shared.controls.lock().set(id, value)
    }

    pub fn set_control_raw(&self, raw_id: u32, value: f64) -> ConfigResult<f64> {
        self.shared.controls.lock().set_raw(raw_id, value)
    }

    pub fn control(&self, id: ControlId) -> f64 {
        self.shared.controls.lock().get(id)
    }

    /// Runs several edits under one lock so the audio thread sees all of
    /// them or none of them.
    pub fn edit_controls<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut BoundControls) -> R,
    {
        let mut guard = self.shared.controls.lock();
        f(&mut guard)
    }

    pub fn apply_preset(&self, preset: &Preset) -> usize {
        let applied = self.edit_controls(|controls| preset.apply(controls));
        info!("loaded preset '{}'", preset.name);
        applied
    }

    pub fn capture_preset(&self, name: &str) -> Preset {
        let controls = *self.shared.controls.lock();
        Preset::capture(name, &controls)
    }

    /// Queues an event for the next buffer; `sample_offset` is relative to
    /// that buffer's first frame.
    pub fn send_midi(&self, event: MidiEvent) -> EngineResult<()> {
        self.shared
            .midi_in
            .push(event)
            .map_err(|_| EngineError::MidiQueueFull)
    }

    /// Peak absolute level of each channel over the last completed buffer.
    pub fn peak_levels(&self) -> [f32; 2] {
        [self.shared.peaks[0].load(), self.shared.peaks[1].load()]
    }

    /// Events discarded because their offset fell outside their buffer.
    pub fn dropped_events(&self) -> u64 {
        self.shared.dropped_events.load(Ordering::Relaxed)
    }

    pub fn buffer_state(&self) -> BufferState {
        self.shared.state.load()
    }

    pub fn load_snapshot(&self, reset_peaks: bool) -> LoadSnapshot {
        self.shared.monitor.snapshot(reset_peaks)
    }
}

/// Audio-thread side: owns the engine and runs the buffer pipeline.
pub struct SynthProcessor {
    engine: SynthEngine,
    shared: Arc<SharedState>,
    // last copy taken from the shared controls
    bound: BoundControls,
    pending: Vec<MidiEvent>,
    frame: SynthRenderData,
    state: BufferState,
}

impl SynthProcessor {
    pub fn new(engine: SynthEngine) -> (Self, SynthController) {
        let config = *engine.config();
        let shared = Arc::new(SharedState {
            controls: spin::Mutex::new(BoundControls::default()),
            midi_in: ArrayQueue::new(config.midi_queue_capacity),
            peaks: [AtomicCell::new(0.0), AtomicCell::new(0.0)],
            dropped_events: AtomicU64::new(0),
            state: AtomicCell::new(BufferState::Idle),
            monitor: RenderLoadMonitor::new(config.load_ema_alpha),
        });
        let processor = Self {
            engine,
            shared: Arc::clone(&shared),
            bound: BoundControls::default(),
            pending: Vec::with_capacity(config.midi_queue_capacity),
            frame: SynthRenderData::SILENCE,
            state: BufferState::Idle,
        };
        (processor, SynthController { shared })
    }

    /// Resets the engine for `sample_rate` and applies the current controls.
    /// Control path: call before the stream starts or while it is stopped.
    pub fn prepare(&mut self, sample_rate: f64) -> EngineResult<()> {
        self.engine.reset(sample_rate)?;
        self.bound = *self.shared.controls.lock();
        let params = self.bound.cook_into(&self.engine.get_parameters());
        self.engine.set_parameters(&params);
        self.set_state(BufferState::Idle);
        debug!("processor prepared at {sample_rate} Hz");
        Ok(())
    }

    pub fn engine(&self) -> &SynthEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut SynthEngine {
        &mut self.engine
    }

    pub fn state(&self) -> BufferState {
        self.state
    }

    /// Frames in an interleaved buffer of `len` samples.
    pub fn check_layout(&self, len: usize, channels: usize) -> EngineResult<usize> {
        let config = self.engine.config();
        if channels != config.output_channels || len % channels != 0 {
            return Err(EngineError::BufferLayout { len, channels });
        }
        let frames = len / channels;
        if frames > config.max_block_frames {
            return Err(EngineError::BlockTooLarge { frames, max: config.max_block_frames });
        }
        Ok(frames)
    }

    #[inline]
    fn set_state(&mut self, state: BufferState) {
        self.state = state;
        self.shared.state.store(state);
    }

    /// Renders one interleaved buffer. Misuse (bad layout, engine not
    /// prepared) fills silence and returns false.
    pub fn process_buffer(&mut self, output: &mut [f32], channels: usize) -> bool {
        let (frames, sample_rate) = match (
            self.check_layout(output.len(), channels),
            self.engine.sample_rate(),
        ) {
            (Ok(frames), Ok(sample_rate)) => (frames, sample_rate),
            _ => {
                output.fill(0.0);
                self.shared.monitor.increment_silent_buffer_count();
                return false;
            }
        };
        let shared = Arc::clone(&self.shared);
        let _timer = shared.monitor.scoped_buffer(frames, sample_rate);

        self.set_state(BufferState::Idle);

        if let Some(controls) = shared.controls.try_lock() {
            self.bound = *controls;
        }
        self.set_state(BufferState::ParametersSynced);

        let params = self.bound.cook_into(&self.engine.get_parameters());
        self.engine.set_parameters(&params);
        self.set_state(BufferState::ParametersApplied);

        self.pending.clear();
        let mut dropped = 0;
        while self.pending.len() < self.pending.capacity() {
            match shared.midi_in.pop() {
                Some(event) if (event.sample_offset as usize) < frames => self.pending.push(event),
                Some(_) => dropped += 1,
                None => break,
            }
        }
        self.set_state(BufferState::RenderingFrames);

        let mut next_event = 0;
        let mut peaks = [0.0f32; 2];
        for (index, out) in output.chunks_exact_mut(channels).enumerate() {
            while let Some(event) = self.pending.get(next_event) {
                if event.sample_offset as usize > index {
                    break;
                }
                self.engine.process_midi_event(event);
                next_event += 1;
            }
            self.engine.render_audio_output(&mut self.frame);
            self.frame.write_interleaved(out, channels);
            peaks[0] = peaks[0].max(self.frame.left().abs());
            peaks[1] = peaks[1].max(self.frame.right().abs());
        }

        shared.peaks[0].store(peaks[0]);
        shared.peaks[1].store(peaks[1]);
        if dropped > 0 {
            shared.dropped_events.fetch_add(dropped, Ordering::Relaxed);
        }
        self.set_state(BufferState::BufferComplete);
        true
    }
}

impl AudioCallback for SynthProcessor {
    fn process(&mut self, output: &mut [f32], sample_rate: f32, channels: usize, _frames: usize) -> bool {
        // a rate change needs `prepare` on the control thread first
        let prepared = self
            .engine
            .sample_rate()
            .is_ok_and(|rate| rate as f32 == sample_rate);
        if !prepared {
            output.fill(0.0);
            self.shared.monitor.increment_silent_buffer_count();
            return false;
        }
        self.process_buffer(output, channels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rt_processing::waveform::WavetableSet;
    use rotor_core::config::EngineConfig;

    fn processor() -> (SynthProcessor, SynthController) {
        let engine = SynthEngine::new(EngineConfig::default(), WavetableSet::shared()).unwrap();
        let (mut processor, controller) = SynthProcessor::new(engine);
        processor.prepare(48000.0).unwrap();
        (processor, controller)
    }

    #[test]
    fn test_unprepared_processor_outputs_silence() {
        let engine = SynthEngine::new(EngineConfig::default(), WavetableSet::shared()).unwrap();
        let (mut processor, controller) = SynthProcessor::new(engine);
        let mut out = [1.0f32; 64];
        assert!(!processor.process_buffer(&mut out, 2));
        assert!(out.iter().all(|&s| s == 0.0));
        assert_eq!(controller.load_snapshot(false).silent_buffer_count, 1);
    }

    #[test]
    fn test_layout_checks() {
        let (processor, _) = processor();
        assert_eq!(processor.check_layout(128, 2).unwrap(), 64);
        assert!(matches!(
            processor.check_layout(127, 2),
            Err(EngineError::BufferLayout { len: 127, channels: 2 })
        ));
        assert!(matches!(processor.check_layout(128, 1), Err(EngineError::BufferLayout { .. })));
        assert!(matches!(
            processor.check_layout(2 * 5000, 2),
            Err(EngineError::BlockTooLarge { frames: 5000, max: 4096 })
        ));
    }

    #[test]
    fn test_buffer_walks_to_complete() {
        let (mut processor, controller) = processor();
        let mut out = [0.0f32; 128];
        assert!(processor.process_buffer(&mut out, 2));
        assert_eq!(processor.state(), BufferState::BufferComplete);
        assert_eq!(controller.buffer_state(), BufferState::BufferComplete);
    }

    #[test]
    fn test_control_edits_reach_engine_next_buffer() {
        let (mut processor, controller) = processor();
        controller.set_control(ControlId::Lfo1Frequency, 5.0).unwrap();
        let mut out = [0.0f32; 128];
        processor.process_buffer(&mut out, 2);
        assert_eq!(processor.engine().get_parameters().voice.lfo1.frequency_hz, 5.0);
    }

    #[test]
    fn test_locked_controls_keep_previous_snapshot() {
        let (mut contended, contended_ctl) = processor();
        let (mut reference, reference_ctl) = processor();
        let mut scratch = [0.0f32; 128];
        for (processor, controller) in [(&mut contended, &contended_ctl), (&mut reference, &reference_ctl)] {
            controller.set_control(ControlId::MasterVolumeDb, -6.0).unwrap();
            processor.process_buffer(&mut scratch, 2);
            controller.send_midi(MidiEvent::note_on(69, 127, 0)).unwrap();
        }

        let mut held = [0.0f32; 128];
        contended_ctl.edit_controls(|controls| {
            controls.set(ControlId::MasterVolumeDb, -20.0).unwrap();
            contended.process_buffer(&mut held, 2);
        });
        let mut expected = [0.0f32; 128];
        reference.process_buffer(&mut expected, 2);

        assert_eq!(contended.engine().get_parameters().master_volume_db, -6.0);
        assert!(expected.iter().any(|&s| s != 0.0));
        assert_eq!(held, expected);

        contended.process_buffer(&mut held, 2);
        reference.process_buffer(&mut expected, 2);
        assert_eq!(contended.engine().get_parameters().master_volume_db, -20.0);
        let quieter = held.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
        let louder = expected.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
        assert!(quieter < louder, "{quieter} vs {louder}");
    }

    #[test]
    fn test_midi_fires_on_its_offset() {
        let (mut processor, controller) = processor();
        controller.send_midi(MidiEvent::note_on(69, 127, 10)).unwrap();
        let mut out = [0.0f32; 128];
        processor.process_buffer(&mut out, 2);
        assert!(out[..20].iter().all(|&s| s == 0.0));
        assert!(out[20..].iter().any(|&s| s != 0.0));
        assert!(controller.peak_levels()[0] > 0.0);
    }

    #[test]
    fn test_out_of_buffer_events_are_dropped() {
        let (mut processor, controller) = processor();
        controller.send_midi(MidiEvent::note_on(60, 100, 64)).unwrap();
        controller.send_midi(MidiEvent::note_on(62, 100, 1_000)).unwrap();
        let mut out = [0.0f32; 128];
        processor.process_buffer(&mut out, 2);
        assert_eq!(controller.dropped_events(), 2);
        assert_eq!(processor.engine().active_voice_count(), 0);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_midi_queue_full() {
        let config = EngineConfig { midi_queue_capacity: 1, ..EngineConfig::default() };
        let engine = SynthEngine::new(config, WavetableSet::shared()).unwrap();
        let (_processor, controller) = SynthProcessor::new(engine);
        controller.send_midi(MidiEvent::note_on(60, 100, 0)).unwrap();
        assert!(matches!(
            controller.send_midi(MidiEvent::note_on(61, 100, 0)),
            Err(EngineError::MidiQueueFull)
        ));
    }

    #[test]
    fn test_callback_rejects_unprepared_rate() {
        let (mut processor, _) = processor();
        let mut out = [1.0f32; 64];
        assert!(!processor.process(&mut out, 44100.0, 2, 32));
        assert!(out.iter().all(|&s| s == 0.0));
        assert!(processor.process(&mut out, 48000.0, 2, 32));
    }
}
