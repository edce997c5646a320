pub mod config;
pub mod controls;
pub mod cook;
pub mod error;
pub mod midi;
pub mod params;
pub mod preset;
pub mod render;

pub use config::EngineConfig;
pub use controls::{BoundControls, ControlId, ControlSpec};
pub use error::{ConfigError, ConfigResult};
pub use midi::{MidiEvent, MidiMessage};
pub use params::{
    EgContour, EgParameters, EngineParameters, LfoMode, LfoParameters, LfoWaveform, ModDestination,
    ModRoute, ModSource, ModTap, RotorParameters, VoiceParameters,
};
pub use preset::Preset;
pub use render::SynthRenderData;
