/// Sample-counting countdown used for the LFO delay and ramp windows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timer {
    elapsed: u64,
    target: u64,
}

impl Timer {
    /// Sets the duration without disturbing the elapsed count.
    pub fn set_target_ms(&mut self, ms: f64, sample_rate: f64) {
        let samples = ms.max(0.0) * sample_rate / 1000.0;
        self.target = if samples.is_finite() { samples.round() as u64 } else { 0 };
    }

    /// Rearms the timer from zero.
    #[inline]
    pub fn reset_timer(&mut self) {
        self.elapsed = 0;
    }

    #[inline]
    pub fn advance(&mut self) {
        if self.elapsed < self.target {
            self.elapsed += 1;
        }
    }

    #[inline]
    pub fn timer_expired(&self) -> bool {
        self.elapsed >= self.target
    }

    /// Fraction of the window that has passed, 1.0 once expired.
    #[inline]
    pub fn progress(&self) -> f64 {
        if self.target == 0 {
            1.0
        } else {
            (self.elapsed as f64 / self.target as f64).min(1.0)
        }
    }

    pub fn target_samples(&self) -> u64 {
        self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_target_is_expired() {
        let timer = Timer::default();
        assert!(timer.timer_expired());
        assert_eq!(timer.progress(), 1.0);
    }

    #[test]
    fn test_countdown() {
        let mut timer = Timer::default();
        timer.set_target_ms(1.0, 48000.0);
        assert_eq!(timer.target_samples(), 48);
        for _ in 0..47 {
            timer.advance();
        }
        assert!(!timer.timer_expired());
        timer.advance();
        assert!(timer.timer_expired());
        timer.advance();
        assert_eq!(timer.progress(), 1.0);

        timer.reset_timer();
        assert!(!timer.timer_expired());
        assert_eq!(timer.progress(), 0.0);
    }
}
