//! Derived-field cooking applied when a snapshot is taken.

/// A fractional semitone value split into whole semitones and cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SemitoneSplit {
    pub coarse: i32,
    pub fine_cents: i32,
}

/// Splits `semitones` into coarse semitones and fine cents.
///
/// The coarse part truncates toward zero; the residual is rounded to cents
/// and held within one semitone, so both parts share the input's sign:
/// `7.35 -> (7, 35)`, `-3.5 -> (-3, -50)`, `7.999 -> (7, 99)`.
pub fn split_semitones(semitones: f64) -> SemitoneSplit {
    if !semitones.is_finite() {
        return SemitoneSplit { coarse: 0, fine_cents: 0 };
    }
    let coarse = semitones.trunc();
    let fine = ((semitones - coarse) * 100.0).round().clamp(-99.0, 99.0);
    SemitoneSplit {
        coarse: coarse as i32,
        fine_cents: fine as i32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_pitch_bend_range_split() {
        assert_eq!(split_semitones(7.35), SemitoneSplit { coarse: 7, fine_cents: 35 });
        assert_eq!(split_semitones(24.0), SemitoneSplit { coarse: 24, fine_cents: 0 });
        assert_eq!(split_semitones(1.01), SemitoneSplit { coarse: 1, fine_cents: 1 });
    }

    #[test]
    fn test_negative_split_truncates_toward_zero() {
        assert_eq!(split_semitones(-3.5), SemitoneSplit { coarse: -3, fine_cents: -50 });
        assert_eq!(split_semitones(-0.25), SemitoneSplit { coarse: 0, fine_cents: -25 });
        assert_eq!(split_semitones(-12.0), SemitoneSplit { coarse: -12, fine_cents: 0 });
    }

    #[test]
    fn test_coarse_never_rounds_up() {
        assert_eq!(split_semitones(7.999), SemitoneSplit { coarse: 7, fine_cents: 99 });
        assert_eq!(split_semitones(0.996), SemitoneSplit { coarse: 0, fine_cents: 99 });
        assert_eq!(split_semitones(-3.996), SemitoneSplit { coarse: -3, fine_cents: -99 });
        assert_eq!(split_semitones(23.9999), SemitoneSplit { coarse: 23, fine_cents: 99 });
    }

    #[test]
    fn test_non_finite_is_zero() {
        assert_eq!(split_semitones(f64::NAN), SemitoneSplit { coarse: 0, fine_cents: 0 });
    }

    proptest! {
        #[test]
        fn split_recombines_and_shares_sign(value in -24.0f64..24.0) {
            let split = split_semitones(value);
            let recombined = split.coarse as f64 + split.fine_cents as f64 / 100.0;
            prop_assert_eq!(split.coarse as f64, value.trunc());
            prop_assert!((recombined - value).abs() <= 0.01 + 1e-9);
            prop_assert!(split.fine_cents.abs() < 100);
            prop_assert!(split.coarse == 0 || split.fine_cents == 0
                || split.coarse.signum() == split.fine_cents.signum());
        }
    }
}
