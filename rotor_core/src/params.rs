//! Parameter blocks handed from the engine to its voices.
//!
//! Everything here is `Copy`: the engine owns one tree, voices receive a
//! borrow for the duration of an `update` call and copy what they need.

use serde::{Deserialize, Serialize};

/// Maps a list-control value (a float carrying an index) onto a table,
/// falling back to the table's first entry for anything out of range.
fn lookup<T: Copy>(table: &[T], value: f64) -> T {
    let index = if value.is_finite() && value >= 0.0 {
        value.round() as usize
    } else {
        usize::MAX
    };
    table.get(index).copied().unwrap_or(table[0])
}

/// LFO waveform selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LfoWaveform {
    #[default]
    Triangle,
    Sine,
    Saw,
    /// Random sample-and-hold.
    RandomSampleHold,
    /// Quasi-random (LFSR) sample-and-hold.
    QuasiRandomSampleHold,
    Noise,
    QuasiRandomNoise,
}

impl LfoWaveform {
    pub const ALL: [LfoWaveform; 7] = [
        LfoWaveform::Triangle,
        LfoWaveform::Sine,
        LfoWaveform::Saw,
        LfoWaveform::RandomSampleHold,
        LfoWaveform::QuasiRandomSampleHold,
        LfoWaveform::Noise,
        LfoWaveform::QuasiRandomNoise,
    ];

    /// Bounds-checked conversion from a list control; out of range gives `Triangle`.
    pub fn from_control(value: f64) -> Self {
        lookup(&Self::ALL, value)
    }
}

/// LFO behaviour on note events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LfoMode {
    /// Restarts with each note-on.
    #[default]
    Sync,
    /// Runs a single cycle after each note-on, then holds.
    OneShot,
    /// Keeps running across notes.
    FreeRun,
}

impl LfoMode {
    pub const ALL: [LfoMode; 3] = [LfoMode::Sync, LfoMode::OneShot, LfoMode::FreeRun];

    pub fn from_control(value: f64) -> Self {
        lookup(&Self::ALL, value)
    }

    /// Whether a note-on restarts the phase and the delay/ramp timers.
    pub fn restarts_on_note(self) -> bool {
        matches!(self, LfoMode::Sync | LfoMode::OneShot)
    }
}

/// Settings for one LFO.
///
/// `wave_shape_x` and `wave_shape_y` double as note-on overrides in the
/// restarting modes: X is the start phase in cycles, Y (when non-zero) a
/// normalized rate that replaces `frequency_hz` until the next note-on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LfoParameters {
    pub waveform: LfoWaveform,
    pub mode: LfoMode,
    pub frequency_hz: f64,
    pub output_amplitude: f64,
    pub delay_ms: f64,
    pub ramp_ms: f64,
    pub wave_shape_x: f64,
    pub wave_shape_y: f64,
}

impl Default for LfoParameters {
    fn default() -> Self {
        Self {
            waveform: LfoWaveform::Triangle,
            mode: LfoMode::Sync,
            frequency_hz: 2.0,
            output_amplitude: 1.0,
            delay_ms: 0.0,
            ramp_ms: 0.0,
            wave_shape_x: 0.0,
            wave_shape_y: 0.0,
        }
    }
}

/// Rate and depth of the two LFOs inside the rotor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RotorParameters {
    pub rate1: f64,
    pub rate2: f64,
    pub depth1: f64,
    pub depth2: f64,
}

impl Default for RotorParameters {
    fn default() -> Self {
        Self {
            rate1: 0.5,
            rate2: 0.5,
            depth1: 0.0,
            depth2: 0.0,
        }
    }
}

/// Envelope contour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EgContour {
    #[default]
    Adsr,
    Ahdsr,
    /// Attack, hold, release; releases on its own after the hold.
    Ahr,
    /// AHR that restarts from its current level on retrigger.
    AhrRetrigger,
}

impl EgContour {
    pub const ALL: [EgContour; 4] = [
        EgContour::Adsr,
        EgContour::Ahdsr,
        EgContour::Ahr,
        EgContour::AhrRetrigger,
    ];

    pub fn from_control(value: f64) -> Self {
        lookup(&Self::ALL, value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EgParameters {
    pub attack_ms: f64,
    pub decay_ms: f64,
    pub sustain_level: f64,
    pub release_ms: f64,
    pub hold_ms: f64,
    pub delay_ms: f64,
    pub contour: EgContour,
}

impl Default for EgParameters {
    fn default() -> Self {
        Self {
            attack_ms: 1.0,
            decay_ms: 100.0,
            sustain_level: 0.707,
            release_ms: 1000.0,
            hold_ms: 0.0,
            delay_ms: 0.0,
            contour: EgContour::Adsr,
        }
    }
}

/// Wavetable selection for one oscillator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OscillatorParameters {
    pub bank_index: usize,
    pub waveform_index: usize,
}

/// Where a modulation route reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModSource {
    Lfo1,
    Lfo2,
    Rotor,
}

/// One of the six output channels of a modulation source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ModTap {
    #[default]
    Normal,
    NormalInverted,
    QuadPhase,
    QuadPhaseInverted,
    /// Behaves like an inverted envelope falling from max and returning to max.
    UnipolarFromMax,
    /// Behaves like an envelope rising from zero to max.
    UnipolarFromMin,
}

/// What a modulation route drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModDestination {
    /// Additive, in semitones per unit of source output.
    Pitch,
    /// Multiplicative gain; intensity blends between unity and the source value.
    Amplitude,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModRoute {
    pub source: ModSource,
    pub tap: ModTap,
    pub destination: ModDestination,
    pub intensity: f64,
}

pub const MAX_MOD_ROUTES: usize = 8;
pub const OSCILLATORS_PER_VOICE: usize = 4;

/// Everything a voice needs to render.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoiceParameters {
    pub lfo1: LfoParameters,
    pub lfo2: LfoParameters,
    pub rotor: RotorParameters,
    pub amp_eg: EgParameters,
    pub oscillators: [OscillatorParameters; OSCILLATORS_PER_VOICE],
    pub mod_routes: [Option<ModRoute>; MAX_MOD_ROUTES],
}

impl VoiceParameters {
    /// The fixed routing a fresh engine starts with.
    pub fn default_routes() -> [Option<ModRoute>; MAX_MOD_ROUTES] {
        let mut routes = [None; MAX_MOD_ROUTES];
        routes[0] = Some(ModRoute {
            source: ModSource::Lfo1,
            tap: ModTap::Normal,
            destination: ModDestination::Pitch,
            intensity: 1.0,
        });
        routes[1] = Some(ModRoute {
            source: ModSource::Lfo2,
            tap: ModTap::Normal,
            destination: ModDestination::Pitch,
            intensity: 0.0,
        });
        routes[2] = Some(ModRoute {
            source: ModSource::Rotor,
            tap: ModTap::UnipolarFromMax,
            destination: ModDestination::Amplitude,
            intensity: 1.0,
        });
        routes
    }
}

impl Default for VoiceParameters {
    fn default() -> Self {
        Self {
            lfo1: LfoParameters::default(),
            lfo2: LfoParameters::default(),
            rotor: RotorParameters::default(),
            amp_eg: EgParameters::default(),
            oscillators: [OscillatorParameters::default(); OSCILLATORS_PER_VOICE],
            mod_routes: Self::default_routes(),
        }
    }
}

/// The engine-wide snapshot: master settings plus the voice tree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineParameters {
    /// Pitch bend range, whole semitones.
    pub master_pitch_bend_sens_coarse: u32,
    /// Pitch bend range, additional cents.
    pub master_pitch_bend_sens_fine: u32,
    pub master_tuning_coarse: i32,
    pub master_tuning_fine: i32,
    pub master_volume_db: f64,
    pub voice: VoiceParameters,
}

impl EngineParameters {
    /// Pitch-bend range as fractional semitones.
    pub fn pitch_bend_range_semitones(&self) -> f64 {
        self.master_pitch_bend_sens_coarse as f64 + self.master_pitch_bend_sens_fine as f64 / 100.0
    }

    /// Master tuning offset as fractional semitones.
    pub fn master_tuning_semitones(&self) -> f64 {
        self.master_tuning_coarse as f64 + self.master_tuning_fine as f64 / 100.0
    }

    pub fn master_gain(&self) -> f64 {
        10f64.powf(self.master_volume_db / 20.0)
    }
}

impl Default for EngineParameters {
    fn default() -> Self {
        Self {
            master_pitch_bend_sens_coarse: 7,
            master_pitch_bend_sens_fine: 0,
            master_tuning_coarse: 0,
            master_tuning_fine: 0,
            master_volume_db: -3.0,
            voice: VoiceParameters::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_conversion_fails_closed() {
        assert_eq!(LfoWaveform::from_control(2.0), LfoWaveform::Saw);
        assert_eq!(LfoWaveform::from_control(6.0), LfoWaveform::QuasiRandomNoise);
        assert_eq!(LfoWaveform::from_control(7.0), LfoWaveform::Triangle);
        assert_eq!(LfoWaveform::from_control(-1.0), LfoWaveform::Triangle);
        assert_eq!(LfoWaveform::from_control(f64::NAN), LfoWaveform::Triangle);
        assert_eq!(LfoMode::from_control(1.0), LfoMode::OneShot);
        assert_eq!(LfoMode::from_control(40.0), LfoMode::Sync);
        assert_eq!(EgContour::from_control(3.0), EgContour::AhrRetrigger);
        assert_eq!(EgContour::from_control(1e12), EgContour::Adsr);
    }

    #[test]
    fn test_derived_master_values() {
        let params = EngineParameters {
            master_pitch_bend_sens_coarse: 2,
            master_pitch_bend_sens_fine: 50,
            master_tuning_coarse: -3,
            master_tuning_fine: -50,
            master_volume_db: 0.0,
            ..EngineParameters::default()
        };
        assert!((params.pitch_bend_range_semitones() - 2.5).abs() < 1e-12);
        assert!((params.master_tuning_semitones() + 3.5).abs() < 1e-12);
        assert!((params.master_gain() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_default_routes() {
        let routes = VoiceParameters::default_routes();
        assert_eq!(routes.iter().flatten().count(), 3);
        assert_eq!(routes[0].map(|r| r.source), Some(ModSource::Lfo1));
    }
}
