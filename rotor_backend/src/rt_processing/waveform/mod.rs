pub mod envelopes;
pub mod noise;
pub mod oscillators;
pub mod tables;

pub use envelopes::{EnvelopeGenerator, EnvelopeState};
pub use noise::NoiseRegister;
pub use oscillators::WavetableOscillator;
pub use tables::WavetableSet;
