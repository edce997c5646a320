//! Behavioural properties of the per-voice LFO, driven through the public
//! `Modulator` interface.

use float_cmp::approx_eq;
use proptest::prelude::*;
use rotor_backend::rt_processing::modulation::lfo::advance_and_wrap;
use rotor_backend::{Modulator, SynthLfo};
use rotor_core::params::{LfoMode, LfoParameters, LfoWaveform};

const SAMPLE_RATE: f64 = 48000.0;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn started_lfo(params: LfoParameters) -> SynthLfo {
    init_logging();
    let mut lfo = SynthLfo::new(0xACE1);
    lfo.update(&params, true);
    lfo.reset(SAMPLE_RATE);
    lfo.note_on(440.0, 69, 100);
    lfo
}

proptest! {
    #[test]
    fn counter_stays_in_unit_interval(start in 0.0f64..1.0, inc in -0.5f64..0.5, steps in 1usize..500) {
        let mut counter = start;
        for _ in 0..steps {
            advance_and_wrap(&mut counter, inc);
            prop_assert!((0.0..1.0).contains(&counter), "counter {} after inc {}", counter, inc);
        }
    }

    #[test]
    fn phase_increment_is_frequency_over_rate(freq in -20.0f64..20.0, rate in 8000.0f64..192000.0) {
        let mut lfo = SynthLfo::new(1);
        lfo.update(&LfoParameters { frequency_hz: freq, ..LfoParameters::default() }, true);
        lfo.reset(rate);
        prop_assert_eq!(lfo.phase_inc(), freq / rate);
    }

    #[test]
    fn quadrature_leads_by_a_quarter(freq in -20.0f64..20.0, ticks in 0usize..4000) {
        let mut lfo = started_lfo(LfoParameters { frequency_hz: freq, ..LfoParameters::default() });
        for _ in 0..ticks {
            lfo.render_modulator_output();
        }
        let lead = (lfo.quad_phase() - lfo.phase()).rem_euclid(1.0);
        prop_assert!(approx_eq!(f64, lead, 0.25, epsilon = 1e-9), "lead {}", lead);
    }
}

#[test]
fn triangle_cycle_at_half_hertz() {
    let mut lfo = started_lfo(LfoParameters {
        waveform: LfoWaveform::Triangle,
        mode: LfoMode::FreeRun,
        frequency_hz: 0.5,
        ..LfoParameters::default()
    });
    let outputs: Vec<f64> = (0..=96000).map(|_| lfo.render_modulator_output().normal).collect();

    assert_eq!(outputs[0], 0.0);
    assert!(outputs[1] > outputs[0]);
    assert!(approx_eq!(f64, outputs[24000], 1.0, epsilon = 1e-6));
    assert!(approx_eq!(f64, outputs[72000], -1.0, epsilon = 1e-6));
    assert!(approx_eq!(f64, outputs[96000], 0.0, epsilon = 1e-6));
}

#[test]
fn one_shot_completes_and_note_on_clears_it() {
    let mut lfo = started_lfo(LfoParameters {
        waveform: LfoWaveform::Saw,
        mode: LfoMode::OneShot,
        frequency_hz: 7.0,
        ..LfoParameters::default()
    });
    let ticks = (1.0 / lfo.phase_inc()).ceil() as usize;
    assert_eq!(ticks, 6858);

    for _ in 0..ticks - 1 {
        lfo.render_modulator_output();
    }
    assert!(!lfo.render_complete());
    let last = lfo.render_modulator_output();
    assert!(lfo.render_complete());

    // frozen until the next note-on
    for _ in 0..100 {
        assert_eq!(lfo.render_modulator_output(), last);
    }

    lfo.note_on(440.0, 69, 100);
    assert!(!lfo.render_complete());
    assert_eq!(lfo.phase(), 0.0);
    assert!(approx_eq!(f64, lfo.render_modulator_output().normal, -1.0, epsilon = 1e-12));
}

#[test]
fn sample_and_hold_spacing() {
    for waveform in [LfoWaveform::RandomSampleHold, LfoWaveform::QuasiRandomSampleHold] {
        let mut lfo = started_lfo(LfoParameters {
            waveform,
            mode: LfoMode::FreeRun,
            frequency_hz: 2.0,
            ..LfoParameters::default()
        });
        let mut previous = lfo.render_modulator_output().normal;
        let mut last_change = 0usize;
        let mut changes = 0;
        for tick in 1..(10 * SAMPLE_RATE as usize) {
            let value = lfo.render_modulator_output().normal;
            if value != previous {
                assert!(tick - last_change >= 24000, "{waveform:?} changed after {} ticks", tick - last_change);
                last_change = tick;
                changes += 1;
            }
            previous = value;
        }
        assert!(changes >= 15, "{waveform:?} only changed {changes} times");
    }
}

#[test]
fn random_waveforms_stay_bipolar() {
    for waveform in [LfoWaveform::Noise, LfoWaveform::QuasiRandomNoise] {
        let mut lfo = started_lfo(LfoParameters { waveform, ..LfoParameters::default() });
        for _ in 0..10_000 {
            let out = lfo.render_modulator_output();
            assert!((-1.0..=1.0).contains(&out.normal), "{waveform:?}: {}", out.normal);
            assert_eq!(out.normal, out.quad_phase);
            assert!(approx_eq!(f64, out.unipolar_from_min + out.unipolar_from_max, 1.0, epsilon = 1e-12));
        }
    }
}

#[test]
fn reverse_rate_runs_backwards() {
    let mut lfo = started_lfo(LfoParameters {
        waveform: LfoWaveform::Saw,
        frequency_hz: -1.0,
        ..LfoParameters::default()
    });
    assert_eq!(lfo.render_modulator_output().normal, -1.0);
    // first step from 0.0 wraps to the top of the cycle
    let second = lfo.render_modulator_output().normal;
    assert!(second > 0.99);
    assert!(lfo.render_modulator_output().normal < second);
}
