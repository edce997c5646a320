//! Modulation sources and the interface voices drive them through.

pub mod lfo;
pub mod rotor;

pub use lfo::SynthLfo;
pub use rotor::Rotor;

use rotor_core::params::ModTap;

/// The six correlated outputs a modulation source produces per tick.
///
/// Built fresh by every render call; consumers read it, nothing mutates it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ModOutputData {
    pub normal: f64,
    pub normal_inverted: f64,
    pub quad_phase: f64,
    pub quad_phase_inverted: f64,
    /// As if an envelope ran from max down and back up to max.
    pub unipolar_from_max: f64,
    /// As if an envelope ran from zero up to max.
    pub unipolar_from_min: f64,
}

impl ModOutputData {
    /// Derives every tap from a bipolar sample pair and an output amplitude.
    #[inline]
    pub fn from_samples(normal: f64, quad_phase: f64, amplitude: f64) -> Self {
        let unipolar_from_min = amplitude * (normal + 1.0) * 0.5;
        Self {
            normal: amplitude * normal,
            normal_inverted: -amplitude * normal,
            quad_phase: amplitude * quad_phase,
            quad_phase_inverted: -amplitude * quad_phase,
            unipolar_from_max: 1.0 - unipolar_from_min,
            unipolar_from_min,
        }
    }

    /// What the taps read with the output amplitude at zero.
    #[inline]
    pub fn silent() -> Self {
        Self::from_samples(0.0, 0.0, 0.0)
    }

    #[inline]
    pub fn tap(&self, tap: ModTap) -> f64 {
        match tap {
            ModTap::Normal => self.normal,
            ModTap::NormalInverted => self.normal_inverted,
            ModTap::QuadPhase => self.quad_phase,
            ModTap::QuadPhaseInverted => self.quad_phase_inverted,
            ModTap::UnipolarFromMax => self.unipolar_from_max,
            ModTap::UnipolarFromMin => self.unipolar_from_min,
        }
    }
}

/// A per-voice modulation generator.
///
/// Voices hold concrete modulators and call through this trait with static
/// dispatch. `update` borrows the parameter block for the duration of the
/// call only; implementations copy what they keep.
pub trait Modulator {
    type Params;

    /// Must be called before the first render and on every sample-rate change.
    fn reset(&mut self, sample_rate: f64) -> bool;

    /// Refreshes from `params`. `update_all_mod_routings` is set when the
    /// voice's routing changed since the last call rather than just values.
    fn update(&mut self, params: &Self::Params, update_all_mod_routings: bool) -> bool;

    /// Advances one sample.
    fn render_modulator_output(&mut self) -> ModOutputData;

    fn note_on(&mut self, pitch: f64, note: u8, velocity: u8) -> bool;

    fn note_off(&mut self, pitch: f64, note: u8, velocity: u8) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_taps_are_correlated() {
        let out = ModOutputData::from_samples(0.5, -0.25, 1.0);
        assert_eq!(out.normal, 0.5);
        assert_eq!(out.normal_inverted, -0.5);
        assert_eq!(out.quad_phase, -0.25);
        assert_eq!(out.quad_phase_inverted, 0.25);
        assert_eq!(out.unipolar_from_min, 0.75);
        assert_eq!(out.unipolar_from_max, 0.25);
        assert_eq!(out.tap(ModTap::UnipolarFromMax), 0.25);
    }

    #[test]
    fn test_silent_output() {
        let out = ModOutputData::silent();
        assert_eq!(out.normal, 0.0);
        assert_eq!(out.unipolar_from_min, 0.0);
        assert_eq!(out.unipolar_from_max, 1.0);
    }
}
