use dasp::frame::Stereo;
use dasp::{Frame, Sample};

/// One rendered frame. Mono engines carry the same value on both channels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SynthRenderData {
    pub frame: Stereo<f32>,
}

impl SynthRenderData {
    pub const SILENCE: SynthRenderData = SynthRenderData { frame: [0.0, 0.0] };

    pub fn from_mono(sample: f64) -> Self {
        let sample: f32 = sample.to_sample();
        Self { frame: Stereo::<f32>::from_fn(|_| sample) }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.frame[0]
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.frame[1]
    }

    pub fn is_silent(&self) -> bool {
        self.frame.channels().all(|s| s == <f32 as Sample>::EQUILIBRIUM)
    }

    /// Writes the frame into an interleaved slice of `channels` samples.
    pub fn write_interleaved(&self, out: &mut [f32], channels: usize) {
        match channels {
            1 => out[0] = self.frame[0],
            _ => {
                out[0] = self.frame[0];
                out[1] = self.frame[1];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mono_is_duplicated() {
        let data = SynthRenderData::from_mono(0.25);
        assert_eq!(data.left(), 0.25);
        assert_eq!(data.right(), 0.25);
        assert!(!data.is_silent());
        assert!(SynthRenderData::SILENCE.is_silent());
    }

    #[test]
    fn test_interleaved_write() {
        let data = SynthRenderData::from_mono(-0.5);
        let mut out = [0.0f32; 2];
        data.write_interleaved(&mut out, 2);
        assert_eq!(out, [-0.5, -0.5]);
        let mut mono = [0.0f32; 1];
        data.write_interleaved(&mut mono, 1);
        assert_eq!(mono, [-0.5]);
    }
}
