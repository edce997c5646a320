use rotor_core::ConfigError;
use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

/// Control-path errors. The render path reports misuse with `bool` flags
/// instead and never surfaces these.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("engine has not been reset with a sample rate")]
    NotReset,

    #[error("output buffer of {len} samples does not hold whole {channels}-channel frames")]
    BufferLayout { len: usize, channels: usize },

    #[error("block of {frames} frames exceeds the configured maximum of {max}")]
    BlockTooLarge { frames: usize, max: usize },

    #[error("MIDI ingress queue is full")]
    MidiQueueFull,
}
