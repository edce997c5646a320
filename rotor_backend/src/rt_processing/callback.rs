//! Hot-swappable processor slot for the host's audio callback.
//!
//! The audio thread reaches the processor through a `spin::Mutex`
//! try-lock only; if a control thread is mid-swap the buffer is answered
//! with silence instead of waiting.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use log::info;
use spin::Mutex;

/// Anything the host's audio callback can drive.
///
/// `process` runs on the audio thread: it must not block, allocate or log.
pub trait AudioCallback: Send + 'static {
    /// Fills the interleaved `output` (`frames * channels` samples).
    /// Returns false when the processor could not render and wrote silence.
    fn process(&mut self, output: &mut [f32], sample_rate: f32, channels: usize, frames: usize) -> bool;
}

pub struct CallbackSlot {
    processor: Arc<Mutex<Box<dyn AudioCallback>>>,
    // frames handed to the host so far
    frame_clock: Arc<AtomicU64>,
    contended_buffers: Arc<AtomicU64>,
    sample_rate: f32,
    channels: usize,
}

impl CallbackSlot {
    pub fn new(initial_processor: Box<dyn AudioCallback>, sample_rate: f32, channels: usize) -> Self {
        Self {
            processor: Arc::new(Mutex::new(initial_processor)),
            frame_clock: Arc::new(AtomicU64::new(0)),
            contended_buffers: Arc::new(AtomicU64::new(0)),
            sample_rate,
            channels: channels.max(1),
        }
    }

    /// Replaces the processor. Control thread only; spins until the audio
    /// thread lets go of the current one.
    pub fn swap_processor(&self, new_processor: Box<dyn AudioCallback>) {
        let mut guard = self.processor.lock();
        *guard = new_processor;
        info!("audio processor swapped");
    }

    /// Runs `f` against the processor under the lock. Control thread only.
    pub fn with_processor_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Box<dyn AudioCallback>) -> R,
    {
        let mut guard = self.processor.lock();
        f(&mut guard)
    }

    /// Audio-thread entry point. Returns true if the processor rendered;
    /// false if the buffer was filled with silence.
    pub fn process_realtime(&self, output: &mut [f32]) -> bool {
        let frames = output.len() / self.channels;
        if frames == 0 {
            return false;
        }
        self.frame_clock.fetch_add(frames as u64, Ordering::Relaxed);

        match self.processor.try_lock() {
            Some(mut guard) => guard.process(output, self.sample_rate, self.channels, frames),
            None => {
                output.fill(0.0);
                self.contended_buffers.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Playback position in seconds.
    pub fn playback_time(&self) -> f64 {
        self.frame_clock.load(Ordering::Relaxed) as f64 / self.sample_rate as f64
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_clock.load(Ordering::Relaxed)
    }

    /// Buffers answered with silence because the lock was held.
    pub fn contended_buffers(&self) -> u64 {
        self.contended_buffers.load(Ordering::Relaxed)
    }

    pub fn processor_handle(&self) -> Arc<Mutex<Box<dyn AudioCallback>>> {
        Arc::clone(&self.processor)
    }

    /// Control thread only; the audio stream must be restarted around this.
    pub fn set_runtime_config(&mut self, sample_rate: f32, channels: usize) {
        self.sample_rate = sample_rate;
        self.channels = channels.max(1);
    }

    pub fn silent(sample_rate: f32, channels: usize) -> Self {
        Self::new(Box::new(SilentProcessor), sample_rate, channels)
    }
}

struct SilentProcessor;

impl AudioCallback for SilentProcessor {
    fn process(&mut self, output: &mut [f32], _sample_rate: f32, _channels: usize, _frames: usize) -> bool {
        output.fill(0.0);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Constant(f32);

    impl AudioCallback for Constant {
        fn process(&mut self, output: &mut [f32], _: f32, _: usize, _: usize) -> bool {
            output.fill(self.0);
            true
        }
    }

    #[test]
    fn test_runs_processor_and_counts_frames() {
        let slot = CallbackSlot::new(Box::new(Constant(0.5)), 48000.0, 2);
        let mut out = [0.0f32; 128];
        assert!(slot.process_realtime(&mut out));
        assert!(out.iter().all(|&s| s == 0.5));
        assert_eq!(slot.frame_count(), 64);
    }

    #[test]
    fn test_contended_lock_yields_silence() {
        let slot = CallbackSlot::new(Box::new(Constant(0.5)), 48000.0, 2);
        let handle = slot.processor_handle();
        let _held = handle.lock();
        let mut out = [1.0f32; 16];
        assert!(!slot.process_realtime(&mut out));
        assert!(out.iter().all(|&s| s == 0.0));
        assert_eq!(slot.contended_buffers(), 1);
    }

    #[test]
    fn test_swap_processor() {
        let slot = CallbackSlot::silent(48000.0, 1);
        slot.swap_processor(Box::new(Constant(-0.25)));
        let mut out = [0.0f32; 4];
        slot.process_realtime(&mut out);
        assert_eq!(out, [-0.25; 4]);
    }

    #[test]
    fn test_processor_access_and_runtime_config() {
        let mut slot = CallbackSlot::new(Box::new(Constant(0.75)), 48000.0, 2);
        let mut scratch = [0.0f32; 2];
        assert!(slot.with_processor_mut(|p| p.process(&mut scratch, 48000.0, 2, 1)));
        assert_eq!(scratch, [0.75; 2]);

        slot.set_runtime_config(44100.0, 1);
        let mut out = [0.0f32; 441];
        slot.process_realtime(&mut out);
        assert_eq!(slot.frame_count(), 441);
        assert!((slot.playback_time() - 0.01).abs() < 1e-9);
    }
}
