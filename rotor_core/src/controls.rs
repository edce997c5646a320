//! The parameter-binding boundary.
//!
//! Host automation, presets and the UI all land here as `(ControlId, f64)`
//! pairs. Values are clamped to the control's range on the way in, so the
//! engine and its generators never see out-of-range input. Once per buffer
//! the bound values are cooked into an [`EngineParameters`] snapshot.

use serde::{Deserialize, Serialize};

use crate::cook::split_semitones;
use crate::error::{ConfigError, ConfigResult};
use crate::params::{EgContour, EngineParameters, LfoMode, LfoWaveform};

/// Stable identifiers for every bound control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
#[repr(u32)]
pub enum ControlId {
    MasterPitchBend = 0,
    MasterTune = 1,
    MasterVolumeDb = 2,
    Lfo1Waveform = 3,
    Lfo1Mode = 4,
    Lfo1Frequency = 5,
    Lfo1DelayMs = 6,
    Lfo1RampMs = 7,
    Lfo2Frequency = 8,
    WaveShapeX = 9,
    WaveShapeY = 10,
    Osc1Waveform = 11,
    Osc1Bank = 12,
    Osc2Waveform = 13,
    Osc2Bank = 14,
    Osc3Waveform = 15,
    Osc3Bank = 16,
    Osc4Waveform = 17,
    Osc4Bank = 18,
    Eg1AttackMs = 19,
    Eg1DecayMs = 20,
    Eg1Sustain = 21,
    Eg1ReleaseMs = 22,
    Eg1HoldMs = 23,
    Eg1DelayMs = 24,
    Eg1Mode = 25,
    RotorRate1 = 26,
    RotorRate2 = 27,
    RotorDepth1 = 28,
    RotorDepth2 = 29,
}

pub const CONTROL_COUNT: usize = 30;

impl ControlId {
    pub const ALL: [ControlId; CONTROL_COUNT] = [
        ControlId::MasterPitchBend,
        ControlId::MasterTune,
        ControlId::MasterVolumeDb,
        ControlId::Lfo1Waveform,
        ControlId::Lfo1Mode,
        ControlId::Lfo1Frequency,
        ControlId::Lfo1DelayMs,
        ControlId::Lfo1RampMs,
        ControlId::Lfo2Frequency,
        ControlId::WaveShapeX,
        ControlId::WaveShapeY,
        ControlId::Osc1Waveform,
        ControlId::Osc1Bank,
        ControlId::Osc2Waveform,
        ControlId::Osc2Bank,
        ControlId::Osc3Waveform,
        ControlId::Osc3Bank,
        ControlId::Osc4Waveform,
        ControlId::Osc4Bank,
        ControlId::Eg1AttackMs,
        ControlId::Eg1DecayMs,
        ControlId::Eg1Sustain,
        ControlId::Eg1ReleaseMs,
        ControlId::Eg1HoldMs,
        ControlId::Eg1DelayMs,
        ControlId::Eg1Mode,
        ControlId::RotorRate1,
        ControlId::RotorRate2,
        ControlId::RotorDepth1,
        ControlId::RotorDepth2,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn spec(self) -> &'static ControlSpec {
        &CONTROL_SPECS[self.index()]
    }
}

impl TryFrom<u32> for ControlId {
    type Error = ConfigError;

    fn try_from(raw: u32) -> ConfigResult<Self> {
        ControlId::ALL
            .get(raw as usize)
            .copied()
            .ok_or(ConfigError::UnknownControl(raw))
    }
}

impl From<ControlId> for u32 {
    fn from(id: ControlId) -> u32 {
        id as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlKind {
    Continuous,
    /// An index into a list of named entries.
    List(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlSpec {
    pub id: ControlId,
    pub name: &'static str,
    pub units: &'static str,
    pub min: f64,
    pub max: f64,
    pub default: f64,
    pub kind: ControlKind,
}

impl ControlSpec {
    const fn continuous(
        id: ControlId,
        name: &'static str,
        units: &'static str,
        min: f64,
        max: f64,
        default: f64,
    ) -> Self {
        Self { id, name, units, min, max, default, kind: ControlKind::Continuous }
    }

    const fn list(id: ControlId, name: &'static str, entries: &'static [&'static str]) -> Self {
        Self {
            id,
            name,
            units: "",
            min: 0.0,
            max: (entries.len() - 1) as f64,
            default: 0.0,
            kind: ControlKind::List(entries),
        }
    }

    /// Clamps `value` into range; list controls also snap to a whole index.
    pub fn clamp(&self, value: f64) -> f64 {
        let clamped = value.clamp(self.min, self.max);
        match self.kind {
            ControlKind::Continuous => clamped,
            ControlKind::List(_) => clamped.round(),
        }
    }
}

const LFO_WAVEFORM_NAMES: &[&str] = &["Triangle", "Sin", "Saw", "RSH", "QRSH", "Noise", "QRNoise"];
const LFO_MODE_NAMES: &[&str] = &["Sync", "One Shot", "Free Run"];
const EG_MODE_NAMES: &[&str] = &["ADSR", "AHDSR", "AHR", "AHR RT"];
const BANK_NAMES: &[&str] = &["Bank 0", "Bank 1", "Bank 2", "Bank 3"];
const WAVE_NAMES: &[&str] = &[
    "wave0", "wave1", "wave2", "wave3", "wave4", "wave5", "wave6", "wave7", "wave8", "wave9",
    "wave10", "wave11", "wave12", "wave13", "wave14", "wave15", "wave16", "wave17", "wave18",
    "wave19", "wave20", "wave21", "wave22", "wave23", "wave24", "wave25", "wave26", "wave27",
    "wave28", "wave29", "wave30", "wave31",
];

/// Range and default for every control, indexed by `ControlId`.
pub static CONTROL_SPECS: [ControlSpec; CONTROL_COUNT] = [
    ControlSpec::continuous(ControlId::MasterPitchBend, "PB Range", "semi", 1.0, 24.0, 7.0),
    ControlSpec::continuous(ControlId::MasterTune, "Master Tune", "semi", -12.0, 12.0, 0.0),
    ControlSpec::continuous(ControlId::MasterVolumeDb, "Master Volume", "dB", -60.0, 12.0, -3.0),
    ControlSpec::list(ControlId::Lfo1Waveform, "LFO1 Wave", LFO_WAVEFORM_NAMES),
    ControlSpec::list(ControlId::Lfo1Mode, "LFO1 Mode", LFO_MODE_NAMES),
    ControlSpec::continuous(ControlId::Lfo1Frequency, "LFO1 fo", "Hz", 0.02, 20.0, 0.5),
    ControlSpec::continuous(ControlId::Lfo1DelayMs, "LFO1 Dly", "mSec", 0.0, 2000.0, 0.0),
    ControlSpec::continuous(ControlId::Lfo1RampMs, "LFO1 Ramp", "mSec", 0.0, 2000.0, 0.0),
    ControlSpec::continuous(ControlId::Lfo2Frequency, "LFO2 fo", "Hz", 0.02, 20.0, 0.5),
    ControlSpec::continuous(ControlId::WaveShapeX, "Shape X", "", 0.0, 1.0, 0.0),
    ControlSpec::continuous(ControlId::WaveShapeY, "Shape Y", "", 0.0, 1.0, 0.0),
    ControlSpec::list(ControlId::Osc1Waveform, "Osc1 Wave", WAVE_NAMES),
    ControlSpec::list(ControlId::Osc1Bank, "Osc1 Bank", BANK_NAMES),
    ControlSpec::list(ControlId::Osc2Waveform, "Osc2 Wave", WAVE_NAMES),
    ControlSpec::list(ControlId::Osc2Bank, "Osc2 Bank", BANK_NAMES),
    ControlSpec::list(ControlId::Osc3Waveform, "Osc3 Wave", WAVE_NAMES),
    ControlSpec::list(ControlId::Osc3Bank, "Osc3 Bank", BANK_NAMES),
    ControlSpec::list(ControlId::Osc4Waveform, "Osc4 Wave", WAVE_NAMES),
    ControlSpec::list(ControlId::Osc4Bank, "Osc4 Bank", BANK_NAMES),
    ControlSpec::continuous(ControlId::Eg1AttackMs, "EG1 Attack", "mSec", 0.0, 2000.0, 1.0),
    ControlSpec::continuous(ControlId::Eg1DecayMs, "EG1 Decay", "mSec", 0.0, 5000.0, 100.0),
    ControlSpec::continuous(ControlId::Eg1Sustain, "EG1 Sustain", "", 0.0, 1.0, 0.707),
    ControlSpec::continuous(ControlId::Eg1ReleaseMs, "EG1 Release", "mSec", 0.0, 10000.0, 1000.0),
    ControlSpec::continuous(ControlId::Eg1HoldMs, "EG1 Hold", "mSec", 0.0, 40000.0, 0.0),
    ControlSpec::continuous(ControlId::Eg1DelayMs, "EG1 Delay", "mSec", 0.0, 4000.0, 0.0),
    ControlSpec::list(ControlId::Eg1Mode, "EG1 Mode", EG_MODE_NAMES),
    ControlSpec::continuous(ControlId::RotorRate1, "Rotor Rate 1", "Hz", 0.02, 20.0, 0.5),
    ControlSpec::continuous(ControlId::RotorRate2, "Rotor Rate 2", "Hz", 0.02, 20.0, 0.5),
    ControlSpec::continuous(ControlId::RotorDepth1, "Rotor Depth 1", "", 0.0, 1.0, 0.0),
    ControlSpec::continuous(ControlId::RotorDepth2, "Rotor Depth 2", "", 0.0, 1.0, 0.0),
];

/// The bound variables: one clamped value per control.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundControls {
    values: [f64; CONTROL_COUNT],
}

impl Default for BoundControls {
    fn default() -> Self {
        let mut values = [0.0; CONTROL_COUNT];
        for spec in CONTROL_SPECS.iter() {
            values[spec.id.index()] = spec.default;
        }
        Self { values }
    }
}

impl BoundControls {
    #[inline]
    pub fn get(&self, id: ControlId) -> f64 {
        self.values[id.index()]
    }

    /// Stores `value` clamped to the control's range and returns what was stored.
    pub fn set(&mut self, id: ControlId, value: f64) -> ConfigResult<f64> {
        if !value.is_finite() {
            return Err(ConfigError::NonFiniteValue { id: id.into() });
        }
        let clamped = id.spec().clamp(value);
        self.values[id.index()] = clamped;
        Ok(clamped)
    }

    /// Same as [`set`](Self::set) but addressed by raw id, as hosts do.
    pub fn set_raw(&mut self, raw_id: u32, value: f64) -> ConfigResult<f64> {
        let id = ControlId::try_from(raw_id)?;
        self.set(id, value)
    }

    /// Transfers the bound values into a copy of `base`, cooking derived fields.
    ///
    /// Mod routes and anything else not backed by a control are carried
    /// over from `base` untouched.
    pub fn cook_into(&self, base: &EngineParameters) -> EngineParameters {
        let mut params = *base;

        let bend = split_semitones(self.get(ControlId::MasterPitchBend));
        params.master_pitch_bend_sens_coarse = bend.coarse.max(0) as u32;
        params.master_pitch_bend_sens_fine = bend.fine_cents.max(0) as u32;

        let tune = split_semitones(self.get(ControlId::MasterTune));
        params.master_tuning_coarse = tune.coarse;
        params.master_tuning_fine = tune.fine_cents;

        params.master_volume_db = self.get(ControlId::MasterVolumeDb);

        let voice = &mut params.voice;
        voice.lfo1.frequency_hz = self.get(ControlId::Lfo1Frequency);
        voice.lfo1.waveform = LfoWaveform::from_control(self.get(ControlId::Lfo1Waveform));
        voice.lfo1.mode = LfoMode::from_control(self.get(ControlId::Lfo1Mode));
        voice.lfo1.delay_ms = self.get(ControlId::Lfo1DelayMs);
        voice.lfo1.ramp_ms = self.get(ControlId::Lfo1RampMs);
        voice.lfo1.wave_shape_x = self.get(ControlId::WaveShapeX);
        voice.lfo1.wave_shape_y = self.get(ControlId::WaveShapeY);

        voice.lfo2.frequency_hz = self.get(ControlId::Lfo2Frequency);

        let oscillator_controls = [
            (ControlId::Osc1Waveform, ControlId::Osc1Bank),
            (ControlId::Osc2Waveform, ControlId::Osc2Bank),
            (ControlId::Osc3Waveform, ControlId::Osc3Bank),
            (ControlId::Osc4Waveform, ControlId::Osc4Bank),
        ];
        for (osc, (wave_id, bank_id)) in voice.oscillators.iter_mut().zip(oscillator_controls) {
            osc.waveform_index = self.get(wave_id) as usize;
            osc.bank_index = self.get(bank_id) as usize;
        }

        let eg = &mut voice.amp_eg;
        eg.attack_ms = self.get(ControlId::Eg1AttackMs);
        eg.decay_ms = self.get(ControlId::Eg1DecayMs);
        eg.sustain_level = self.get(ControlId::Eg1Sustain);
        eg.release_ms = self.get(ControlId::Eg1ReleaseMs);
        eg.hold_ms = self.get(ControlId::Eg1HoldMs);
        eg.delay_ms = self.get(ControlId::Eg1DelayMs);
        eg.contour = EgContour::from_control(self.get(ControlId::Eg1Mode));

        voice.rotor.rate1 = self.get(ControlId::RotorRate1);
        voice.rotor.rate2 = self.get(ControlId::RotorRate2);
        voice.rotor.depth1 = self.get(ControlId::RotorDepth1);
        voice.rotor.depth2 = self.get(ControlId::RotorDepth2);

        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_table_is_indexed_by_id() {
        for (index, spec) in CONTROL_SPECS.iter().enumerate() {
            assert_eq!(spec.id.index(), index, "{} is out of place", spec.name);
            assert!(spec.min <= spec.default && spec.default <= spec.max, "{}", spec.name);
        }
    }

    #[test]
    fn test_set_clamps_to_range() {
        let mut controls = BoundControls::default();
        assert_eq!(controls.set(ControlId::Lfo1Frequency, 100.0).unwrap(), 20.0);
        assert_eq!(controls.set(ControlId::Lfo1Frequency, 0.0).unwrap(), 0.02);
        assert_eq!(controls.set(ControlId::Lfo1Waveform, 2.4).unwrap(), 2.0);
        assert_eq!(controls.set(ControlId::Lfo1Waveform, 99.0).unwrap(), 6.0);
        assert!(controls.set(ControlId::MasterTune, f64::INFINITY).is_err());
        assert_eq!(controls.get(ControlId::MasterTune), 0.0);
    }

    #[test]
    fn test_raw_ids() {
        let mut controls = BoundControls::default();
        assert!(controls.set_raw(5, 3.0).is_ok());
        assert_eq!(controls.get(ControlId::Lfo1Frequency), 3.0);
        assert!(matches!(controls.set_raw(999, 1.0), Err(ConfigError::UnknownControl(999))));
    }

    #[test]
    fn test_cook_splits_master_values() {
        let mut controls = BoundControls::default();
        controls.set(ControlId::MasterPitchBend, 7.35).unwrap();
        controls.set(ControlId::MasterTune, -3.5).unwrap();
        let params = controls.cook_into(&EngineParameters::default());
        assert_eq!(params.master_pitch_bend_sens_coarse, 7);
        assert_eq!(params.master_pitch_bend_sens_fine, 35);
        assert_eq!(params.master_tuning_coarse, -3);
        assert_eq!(params.master_tuning_fine, -50);
    }

    #[test]
    fn test_shape_x_and_y_are_independent() {
        let mut controls = BoundControls::default();
        controls.set(ControlId::WaveShapeX, 0.25).unwrap();
        controls.set(ControlId::WaveShapeY, 0.75).unwrap();
        let params = controls.cook_into(&EngineParameters::default());
        assert_eq!(params.voice.lfo1.wave_shape_x, 0.25);
        assert_eq!(params.voice.lfo1.wave_shape_y, 0.75);
    }

    #[test]
    fn test_cook_maps_lists_and_keeps_routes() {
        let mut controls = BoundControls::default();
        controls.set(ControlId::Lfo1Waveform, 1.0).unwrap();
        controls.set(ControlId::Lfo1Mode, 2.0).unwrap();
        controls.set(ControlId::Osc3Bank, 3.0).unwrap();
        controls.set(ControlId::Osc3Waveform, 17.0).unwrap();
        controls.set(ControlId::Eg1Mode, 2.0).unwrap();

        let mut base = EngineParameters::default();
        base.voice.mod_routes[1] = None;
        let params = controls.cook_into(&base);

        assert_eq!(params.voice.lfo1.waveform, LfoWaveform::Sine);
        assert_eq!(params.voice.lfo1.mode, LfoMode::FreeRun);
        assert_eq!(params.voice.oscillators[2].bank_index, 3);
        assert_eq!(params.voice.oscillators[2].waveform_index, 17);
        assert_eq!(params.voice.amp_eg.contour, EgContour::Ahr);
        assert_eq!(params.voice.mod_routes, base.voice.mod_routes);
    }
}
