pub mod error;
pub mod rt_processing;

pub use error::{EngineError, EngineResult};
pub use rt_processing::callback::{AudioCallback, CallbackSlot};
pub use rt_processing::engine::SynthEngine;
pub use rt_processing::modulation::{ModOutputData, Modulator, Rotor, SynthLfo};
pub use rt_processing::performance::{LoadSnapshot, RenderLoadMonitor};
pub use rt_processing::processor::{BufferState, SynthController, SynthProcessor};
pub use rt_processing::waveform::tables::WavetableSet;
