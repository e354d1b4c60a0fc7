/// RMS level below which a capture block is treated as silence.
pub const SILENCE_RMS_THRESHOLD: f32 = 0.01;

/// Energy-based silence gate.
///
/// RMS is computed over the raw floating-point samples before any
/// downsampling. A silent block is dropped whole; nothing is retained for
/// later, so the first voiced block after a gap starts a fresh run.
#[derive(Debug, Clone)]
pub struct SilenceGate {
    threshold: f32,
}

impl SilenceGate {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    /// Root-mean-square level of a block; 0.0 for an empty block.
    pub fn rms(samples: &[f32]) -> f32 {
        if samples.is_empty() {
            return 0.0;
        }

        let sum_sq: f64 = samples.iter().map(|&s| f64::from(s) * f64::from(s)).sum();
        (sum_sq / samples.len() as f64).sqrt() as f32
    }

    pub fn is_silent(&self, samples: &[f32]) -> bool {
        Self::rms(samples) < self.threshold
    }
}

impl Default for SilenceGate {
    fn default() -> Self {
        Self::new(SILENCE_RMS_THRESHOLD)
    }
}
