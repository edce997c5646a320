//! Everything that runs on (or feeds) the audio thread.
//!
//! Nothing below `engine` allocates, locks or logs once the engine has been
//! reset; the processor and callback slot are the only places that touch
//! shared state, and they do it with try-locks and lock-free queues.

pub mod callback;
pub mod engine;
pub mod modulation;
pub mod performance;
pub mod processor;
pub mod timer;
pub mod voice;
pub mod waveform;
