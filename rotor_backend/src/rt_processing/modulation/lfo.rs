//! The per-voice LFO.
//!
//! A phase accumulator in [0, 1) drives the periodic waveforms, a second
//! accumulator a quarter cycle ahead drives the quadrature taps, and a
//! private [`NoiseRegister`] feeds the random ones. Delay and ramp windows
//! are counted in samples by two [`Timer`]s.
//!
//! Render order per tick: compute the waveform at the current phase, emit,
//! then advance both accumulators. A freshly reset LFO therefore emits the
//! waveform's value at phase 0 first (0.0 for the triangle).

use rotor_core::params::{LfoMode, LfoParameters, LfoWaveform};

use super::{ModOutputData, Modulator};
use crate::rt_processing::timer::Timer;
use crate::rt_processing::waveform::noise::NoiseRegister;

/// Rate reached by a shape-Y override of 1.0.
pub const MAX_LFO_HZ: f64 = 20.0;

const QUAD_PHASE_OFFSET: f64 = 0.25;

// parabolic sine, angle in [-pi, pi]
const B: f64 = 4.0 / std::f64::consts::PI;
const C: f64 = -4.0 / (std::f64::consts::PI * std::f64::consts::PI);
const P: f64 = 0.225;

#[inline]
fn parabolic_sine(angle: f64) -> f64 {
    let y = B * angle + C * angle * angle.abs();
    P * (y * y.abs() - y) + y
}

/// Adds `inc` and wraps in the direction of travel. Returns true when the
/// counter crossed the cycle boundary.
#[inline]
pub fn advance_and_wrap(counter: &mut f64, inc: f64) -> bool {
    let start = *counter;
    *counter += inc;
    let wrapped = if inc > 0.0 && *counter >= 1.0 {
        *counter -= 1.0;
        true
    } else if inc < 0.0 && *counter <= 0.0 {
        *counter += 1.0;
        // starting exactly on 0.0 is the cycle start, not a completed cycle
        start > 0.0
    } else {
        false
    };
    if !(0.0..1.0).contains(counter) {
        *counter = counter.rem_euclid(1.0);
        if *counter >= 1.0 {
            *counter = 0.0;
        }
    }
    wrapped
}

#[inline]
fn triangle(phase: f64) -> f64 {
    if phase < 0.25 {
        4.0 * phase
    } else if phase < 0.75 {
        2.0 - 4.0 * phase
    } else {
        4.0 * phase - 4.0
    }
}

#[inline]
fn sine(phase: f64) -> f64 {
    let angle = if phase <= 0.5 {
        phase * 2.0 * std::f64::consts::PI
    } else {
        phase * 2.0 * std::f64::consts::PI - 2.0 * std::f64::consts::PI
    };
    parabolic_sine(angle)
}

#[inline]
fn saw(phase: f64) -> f64 {
    2.0 * phase - 1.0
}

pub struct SynthLfo {
    params: LfoParameters,
    sample_rate: f64,

    phase_inc: f64,
    // shape-Y rate latched at note-on; wins over `frequency_hz` until the next note-on
    rate_override: Option<f64>,
    mod_counter: f64,
    mod_counter_qp: f64,

    noise: NoiseRegister,
    // -1 = take a fresh value on the next tick
    sh_counter: i64,
    sh_value: f64,

    render_complete: bool,
    frozen: ModOutputData,
    // note-off with a ramp configured: hold at zero until the next note-on
    silenced: bool,

    delay: Timer,
    ramp: Timer,
}

impl SynthLfo {
    pub fn new(seed: u32) -> Self {
        Self {
            params: LfoParameters::default(),
            sample_rate: 0.0,
            phase_inc: 0.0,
            rate_override: None,
            mod_counter: 0.0,
            mod_counter_qp: QUAD_PHASE_OFFSET,
            noise: NoiseRegister::new(seed),
            sh_counter: -1,
            sh_value: 0.0,
            render_complete: false,
            frozen: ModOutputData::default(),
            silenced: false,
            delay: Timer::default(),
            ramp: Timer::default(),
        }
    }

    pub fn phase_inc(&self) -> f64 {
        self.phase_inc
    }

    pub fn phase(&self) -> f64 {
        self.mod_counter
    }

    pub fn quad_phase(&self) -> f64 {
        self.mod_counter_qp
    }

    /// Set once a one-shot cycle has finished; cleared by note-on.
    pub fn render_complete(&self) -> bool {
        self.render_complete
    }

    pub fn params(&self) -> &LfoParameters {
        &self.params
    }

    fn recompute_timing(&mut self) {
        if self.sample_rate <= 0.0 {
            return;
        }
        self.phase_inc = self
            .rate_override
            .unwrap_or(self.params.frequency_hz / self.sample_rate);
        self.delay.set_target_ms(self.params.delay_ms, self.sample_rate);
        self.ramp.set_target_ms(self.params.ramp_ms, self.sample_rate);
    }

    /// Ticks to hold a sample-and-hold value at the current rate.
    #[inline]
    fn hold_samples(&self) -> i64 {
        let inc = self.phase_inc.abs();
        if inc > 0.0 {
            ((1.0 / inc).round() as i64).max(1)
        } else {
            i64::MAX
        }
    }

    #[inline]
    fn sample_and_hold(&mut self, quasi: bool) -> f64 {
        let refresh = if self.sh_counter < 0 {
            true
        } else {
            self.sh_counter += 1;
            self.sh_counter >= self.hold_samples()
        };
        if refresh {
            self.sh_value = if quasi {
                self.noise.next_quasi_random()
            } else {
                self.noise.next_random()
            };
            self.sh_counter = 0;
        }
        self.sh_value
    }

    /// Bipolar (normal, quadrature) pair at the current phase.
    #[inline]
    fn waveform_samples(&mut self) -> (f64, f64) {
        match self.params.waveform {
            LfoWaveform::Triangle => (triangle(self.mod_counter), triangle(self.mod_counter_qp)),
            LfoWaveform::Sine => (sine(self.mod_counter), sine(self.mod_counter_qp)),
            LfoWaveform::Saw => (saw(self.mod_counter), saw(self.mod_counter_qp)),
            // phaseless waveforms have no quarter-cycle to lead by
            LfoWaveform::RandomSampleHold => {
                let v = self.sample_and_hold(false);
                (v, v)
            }
            LfoWaveform::QuasiRandomSampleHold => {
                let v = self.sample_and_hold(true);
                (v, v)
            }
            LfoWaveform::Noise => {
                let v = self.noise.next_random();
                (v, v)
            }
            LfoWaveform::QuasiRandomNoise => {
                let v = self.noise.next_quasi_random();
                (v, v)
            }
        }
    }

    #[inline]
    fn amplitude(&self) -> f64 {
        if self.silenced {
            0.0
        } else {
            self.params.output_amplitude * self.ramp.progress()
        }
    }
}

impl Modulator for SynthLfo {
    type Params = LfoParameters;

    fn reset(&mut self, sample_rate: f64) -> bool {
        self.sample_rate = sample_rate;
        self.rate_override = None;
        self.mod_counter = 0.0;
        self.mod_counter_qp = QUAD_PHASE_OFFSET;
        self.sh_counter = -1;
        self.render_complete = false;
        self.silenced = false;
        self.recompute_timing();
        self.delay.reset_timer();
        self.ramp.reset_timer();
        true
    }

    fn update(&mut self, params: &LfoParameters, _update_all_mod_routings: bool) -> bool {
        self.params = *params;
        self.recompute_timing();
        true
    }

    fn render_modulator_output(&mut self) -> ModOutputData {
        if self.render_complete {
            return self.frozen;
        }

        if !self.delay.timer_expired() {
            self.delay.advance();
            return ModOutputData::silent();
        }

        let (normal, quad) = self.waveform_samples();
        let output = ModOutputData::from_samples(normal, quad, self.amplitude());

        let wrapped = advance_and_wrap(&mut self.mod_counter, self.phase_inc);
        advance_and_wrap(&mut self.mod_counter_qp, self.phase_inc);
        self.ramp.advance();

        if wrapped && self.params.mode == LfoMode::OneShot {
            self.render_complete = true;
            self.frozen = output;
        }
        output
    }

    fn note_on(&mut self, _pitch: f64, _note: u8, _velocity: u8) -> bool {
        if self.params.mode.restarts_on_note() {
            // shape X is the start phase, shape Y (when non-zero) a rate override
            self.mod_counter = self.params.wave_shape_x.rem_euclid(1.0);
            if self.mod_counter >= 1.0 {
                self.mod_counter = 0.0;
            }
            self.mod_counter_qp = (self.mod_counter + QUAD_PHASE_OFFSET).rem_euclid(1.0);
            self.rate_override = if self.params.wave_shape_y > 0.0 && self.sample_rate > 0.0 {
                let direction = if self.params.frequency_hz < 0.0 { -1.0 } else { 1.0 };
                Some(direction * self.params.wave_shape_y * MAX_LFO_HZ / self.sample_rate)
            } else {
                None
            };
            self.recompute_timing();
            self.delay.reset_timer();
            self.ramp.reset_timer();
        } else if self.silenced {
            self.ramp.reset_timer();
        }

        self.silenced = false;
        self.sh_counter = -1;
        self.render_complete = false;
        true
    }

    fn note_off(&mut self, _pitch: f64, _note: u8, _velocity: u8) -> bool {
        if self.params.ramp_ms > 0.0 {
            self.silenced = true;
        }
        true
    }
}
