//! Presets as a flat list of control-id / value pairs.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::controls::{BoundControls, ControlId};
use crate::error::ConfigResult;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlValue {
    pub id: ControlId,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub values: Vec<ControlValue>,
}

impl Preset {
    /// The preset shipped with the instrument.
    pub fn factory() -> Self {
        let values = [
            (ControlId::MasterPitchBend, 7.0),
            (ControlId::MasterTune, 0.0),
            (ControlId::MasterVolumeDb, -3.0),
            (ControlId::Lfo1Waveform, 0.0),
            (ControlId::Lfo1Mode, 0.0),
            (ControlId::Lfo1Frequency, 0.5),
            (ControlId::Lfo1DelayMs, 0.0),
            (ControlId::Lfo1RampMs, 0.0),
            (ControlId::Lfo2Frequency, 0.5),
            (ControlId::WaveShapeX, 0.0),
            (ControlId::WaveShapeY, 0.0),
            (ControlId::Osc1Waveform, 0.0),
            (ControlId::Osc1Bank, 0.0),
            (ControlId::Osc2Waveform, 0.0),
            (ControlId::Osc2Bank, 0.0),
            (ControlId::Osc3Waveform, 0.0),
            (ControlId::Osc3Bank, 0.0),
            (ControlId::Osc4Waveform, 0.0),
            (ControlId::Osc4Bank, 0.0),
            (ControlId::Eg1AttackMs, 1.0),
            (ControlId::Eg1DecayMs, 100.0),
            (ControlId::Eg1Sustain, 0.707),
            (ControlId::Eg1ReleaseMs, 1000.0),
            (ControlId::Eg1HoldMs, 0.0),
            (ControlId::Eg1DelayMs, 0.0),
            (ControlId::Eg1Mode, 0.0),
        ];
        Self {
            name: "Factory Preset".to_string(),
            values: values
                .into_iter()
                .map(|(id, value)| ControlValue { id, value })
                .collect(),
        }
    }

    /// Captures the current bound values of every control.
    pub fn capture(name: impl Into<String>, controls: &BoundControls) -> Self {
        Self {
            name: name.into(),
            values: ControlId::ALL
                .iter()
                .map(|&id| ControlValue { id, value: controls.get(id) })
                .collect(),
        }
    }

    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let preset: Preset = serde_json::from_str(json)?;
        debug!("parsed preset '{}' ({} values)", preset.name, preset.values.len());
        Ok(preset)
    }

    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes every value through the clamping boundary. Non-finite values
    /// are skipped; the count of applied values is returned.
    pub fn apply(&self, controls: &mut BoundControls) -> usize {
        let mut applied = 0;
        for entry in &self.values {
            match controls.set(entry.id, entry.value) {
                Ok(_) => applied += 1,
                Err(err) => warn!("preset '{}': {}", self.name, err),
            }
        }
        debug!("applied preset '{}' ({applied} values)", self.name);
        applied
    }
}
