use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised at the configuration and parameter-binding boundary.
///
/// Nothing in the render path produces these; values are validated or
/// clamped here before they can reach a generator.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid sample rate: {0} Hz (must be finite and > 0)")]
    InvalidSampleRate(f64),

    #[error("invalid voice count: {0} (expected 1..={max})", max = crate::config::MAX_VOICES)]
    InvalidVoiceCount(usize),

    #[error("invalid output channel count: {0} (expected 1 or 2)")]
    InvalidChannelCount(usize),

    #[error("invalid block size: {0} frames")]
    InvalidBlockSize(usize),

    #[error("invalid MIDI queue capacity: {0}")]
    InvalidQueueCapacity(usize),

    #[error("load monitor smoothing must be in (0, 1], got {0}")]
    InvalidSmoothing(f64),

    #[error("unknown control id: {0}")]
    UnknownControl(u32),

    #[error("control {id} received a non-finite value")]
    NonFiniteValue { id: u32 },

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}
