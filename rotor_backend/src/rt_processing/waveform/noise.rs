//! The 32-bit register behind the random and quasi-random LFO waveforms.
//!
//! One register drives both flavours: `next_random` steps it as a linear
//! congruential generator, `next_quasi_random` as a maximal-style LFSR.
//! Each LFO owns its own register, so there is no shared state to lock.

/// Pseudo-random 32-bit register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoiseRegister {
    state: u32,
}

impl NoiseRegister {
    pub fn new(seed: u32) -> Self {
        Self {
            // a zero register locks the LFSR at zero forever
            state: if seed == 0 { 1 } else { seed },
        }
    }

    #[inline]
    pub fn state(&self) -> u32 {
        self.state
    }

    /// LCG step, bipolar output in [-1, 1].
    #[inline]
    pub fn next_random(&mut self) -> f64 {
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        if self.state == 0 {
            self.state = 1;
        }
        Self::to_bipolar(self.state)
    }

    /// LFSR step (taps 0, 1, 27, 28 fed back into bit 31), bipolar output.
    #[inline]
    pub fn next_quasi_random(&mut self) -> f64 {
        let s = self.state;
        let feedback = (s ^ (s >> 1) ^ (s >> 27) ^ (s >> 28)) & 1;
        self.state = (s >> 1) | (feedback << 31);
        if self.state == 0 {
            self.state = 1;
        }
        Self::to_bipolar(self.state)
    }

    #[inline]
    fn to_bipolar(value: u32) -> f64 {
        (value as f64 / u32::MAX as f64) * 2.0 - 1.0
    }
}

impl Default for NoiseRegister {
    fn default() -> Self {
        Self::new(0x1234_5678)
    }
}
