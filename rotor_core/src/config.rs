//! Engine configuration, fixed for the engine's lifetime.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

pub const MAX_VOICES: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Size of the voice pool; allocated once, never grown.
    pub max_voices: usize,
    /// 1 = mono, 2 = stereo (mono synthesis duplicated).
    pub output_channels: usize,
    /// Largest buffer the host will ask for.
    pub max_block_frames: usize,
    /// Capacity of the MIDI ingress and per-buffer event queues.
    pub midi_queue_capacity: usize,
    /// Smoothing factor for the render-load average.
    pub load_ema_alpha: f64,
    /// Base seed for the per-voice random registers.
    pub seed: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_voices: 16,
            output_channels: 2,
            max_block_frames: 4096,
            midi_queue_capacity: 512,
            load_ema_alpha: 0.1,
            seed: 0x5EED_1234,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_voices == 0 || self.max_voices > MAX_VOICES {
            return Err(ConfigError::InvalidVoiceCount(self.max_voices));
        }
        if !(1..=2).contains(&self.output_channels) {
            return Err(ConfigError::InvalidChannelCount(self.output_channels));
        }
        if self.max_block_frames == 0 {
            return Err(ConfigError::InvalidBlockSize(self.max_block_frames));
        }
        if self.midi_queue_capacity == 0 {
            return Err(ConfigError::InvalidQueueCapacity(self.midi_queue_capacity));
        }
        if !(self.load_ema_alpha > 0.0 && self.load_ema_alpha <= 1.0) {
            return Err(ConfigError::InvalidSmoothing(self.load_ema_alpha));
        }
        Ok(())
    }

    /// Parses and validates a JSON config; missing fields take defaults.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate().inspect_err(|err| warn!("rejected engine config: {err}"))?;
        Ok(config)
    }
}

/// Rejects sample rates the generators cannot run at.
pub fn validate_sample_rate(sample_rate: f64) -> ConfigResult<f64> {
    if sample_rate.is_finite() && sample_rate > 0.0 {
        Ok(sample_rate)
    } else {
        Err(ConfigError::InvalidSampleRate(sample_rate))
    }
}
