use rotor_core::params::{EgContour, EgParameters};

/// Envelope stages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeState {
    Idle,
    Delay,
    Attack,
    Hold,
    Decay,
    Sustain,
    Release,
}

/// Linear-segment amplitude envelope: delay, attack, hold, decay, sustain,
/// release, shaped by an [`EgContour`].
#[derive(Debug, Clone)]
pub struct EnvelopeGenerator {
    params: EgParameters,
    sample_rate: f64,

    state: EnvelopeState,
    level: f64,
    // samples spent in the current stage
    stage_sample: u64,
    // level the current attack or release started from
    stage_start: f64,
}

impl EnvelopeGenerator {
    pub fn new() -> Self {
        Self {
            params: EgParameters::default(),
            sample_rate: 0.0,
            state: EnvelopeState::Idle,
            level: 0.0,
            stage_sample: 0,
            stage_start: 0.0,
        }
    }

    pub fn reset(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.state = EnvelopeState::Idle;
        self.level = 0.0;
        self.stage_sample = 0;
        self.stage_start = 0.0;
    }

    /// Takes new timings; stages already running pick them up on the next sample.
    pub fn update(&mut self, params: &EgParameters) {
        self.params = *params;
        self.params.sustain_level = self.params.sustain_level.clamp(0.0, 1.0);
    }

    pub fn note_on(&mut self) {
        // AHR-RT climbs from wherever it is; everything else restarts from zero
        if self.params.contour != EgContour::AhrRetrigger {
            self.level = 0.0;
        }
        self.stage_start = self.level;
        self.stage_sample = 0;
        self.state = if self.samples(self.params.delay_ms) > 0 {
            EnvelopeState::Delay
        } else {
            EnvelopeState::Attack
        };
    }

    pub fn note_off(&mut self) {
        if matches!(self.state, EnvelopeState::Idle | EnvelopeState::Release) {
            return;
        }
        self.enter(EnvelopeState::Release);
    }

    pub fn is_active(&self) -> bool {
        self.state != EnvelopeState::Idle
    }

    pub fn state(&self) -> EnvelopeState {
        self.state
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    /// Advances one sample and returns the new level.
    pub fn next_value(&mut self) -> f64 {
        // zero-length stages fall straight through; bounded by the stage count
        for _ in 0..8 {
            match self.state {
                EnvelopeState::Idle => {
                    self.level = 0.0;
                    return self.level;
                }
                EnvelopeState::Delay => {
                    let length = self.samples(self.params.delay_ms);
                    if self.stage_sample >= length {
                        self.enter(EnvelopeState::Attack);
                        continue;
                    }
                    self.stage_sample += 1;
                    return self.level;
                }
                EnvelopeState::Attack => {
                    let length = self.samples(self.params.attack_ms);
                    if self.stage_sample >= length {
                        self.level = 1.0;
                        self.enter(self.after_attack());
                        continue;
                    }
                    self.stage_sample += 1;
                    self.level = self.ramp(self.stage_start, 1.0, length);
                    return self.level;
                }
                EnvelopeState::Hold => {
                    let length = self.samples(self.params.hold_ms);
                    if self.stage_sample >= length {
                        self.enter(self.after_hold());
                        continue;
                    }
                    self.stage_sample += 1;
                    return self.level;
                }
                EnvelopeState::Decay => {
                    let length = self.samples(self.params.decay_ms);
                    if self.stage_sample >= length {
                        self.enter(EnvelopeState::Sustain);
                        continue;
                    }
                    self.stage_sample += 1;
                    self.level = self.ramp(1.0, self.params.sustain_level, length);
                    return self.level;
                }
                EnvelopeState::Sustain => {
                    self.level = self.params.sustain_level;
                    return self.level;
                }
                EnvelopeState::Release => {
                    let length = self.samples(self.params.release_ms);
                    if self.stage_sample >= length {
                        self.enter(EnvelopeState::Idle);
                        continue;
                    }
                    self.stage_sample += 1;
                    self.level = self.ramp(self.stage_start, 0.0, length);
                    return self.level;
                }
            }
        }
        self.level
    }

    fn enter(&mut self, state: EnvelopeState) {
        self.state = state;
        self.stage_sample = 0;
        self.stage_start = self.level;
    }

    fn after_attack(&self) -> EnvelopeState {
        match self.params.contour {
            EgContour::Adsr => EnvelopeState::Decay,
            EgContour::Ahdsr | EgContour::Ahr | EgContour::AhrRetrigger => EnvelopeState::Hold,
        }
    }

    fn after_hold(&self) -> EnvelopeState {
        match self.params.contour {
            EgContour::Adsr | EgContour::Ahdsr => EnvelopeState::Decay,
            EgContour::Ahr | EgContour::AhrRetrigger => EnvelopeState::Release,
        }
    }

    #[inline]
    fn ramp(&self, from: f64, to: f64, length: u64) -> f64 {
        from + (to - from) * (self.stage_sample as f64 / length as f64)
    }

    #[inline]
    fn samples(&self, ms: f64) -> u64 {
        let samples = ms.max(0.0) * self.sample_rate / 1000.0;
        if samples.is_finite() { samples.round() as u64 } else { 0 }
    }
}

impl Default for EnvelopeGenerator {
    fn default() -> Self {
        Self::new()
    }
}
