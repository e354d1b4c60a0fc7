use crate::error::Error;

/// Converts native-rate `f32` blocks to a lower rate of signed 16-bit PCM.
///
/// This is plain decimation: output index `i` takes the source sample at
/// `floor(i * ratio)` as-is, with no interpolation and no anti-alias
/// filtering. Scaling clamps to [-1, 1] and truncates toward zero
/// (`sample * 32767` cast), so -1.0 maps to -32767, not -32768.
#[derive(Debug, Clone)]
pub struct Resampler {
    input_rate: u32,
    target_rate: u32,
    ratio: f64,
}

impl Resampler {
    /// Fails when `target_rate >= input_rate`; downsampling requires a
    /// strict rate reduction.
    pub fn new(input_rate: u32, target_rate: u32) -> Result<Self, Error> {
        if target_rate >= input_rate {
            return Err(Error::Configuration {
                input: input_rate,
                target: target_rate,
            });
        }

        Ok(Self {
            input_rate,
            target_rate,
            ratio: f64::from(input_rate) / f64::from(target_rate),
        })
    }

    pub fn input_rate(&self) -> u32 {
        self.input_rate
    }

    pub fn target_rate(&self) -> u32 {
        self.target_rate
    }

    /// Downsample one block. Output length is `floor(len / ratio)`.
    pub fn downsample(&self, samples: &[f32]) -> Vec<i16> {
        let out_len = (samples.len() as f64 / self.ratio) as usize;
        let mut out = Vec::with_capacity(out_len);

        for i in 0..out_len {
            let src = ((i as f64 * self.ratio) as usize).min(samples.len() - 1);
            let clamped = samples[src].clamp(-1.0, 1.0);
            out.push((clamped * 32767.0) as i16);
        }

        out
    }
}
