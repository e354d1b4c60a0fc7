use tokio::sync::mpsc;

use crate::error::Error;

/// A single block of raw audio as delivered by a capture callback.
///
/// Samples are normalized `f32` in `[-1.0, 1.0]` at the device's native
/// rate. Blocks are produced once per callback and not retained.
#[derive(Debug, Clone)]
pub struct AudioBlock {
    /// Mono PCM samples in `[-1.0, 1.0]`
    pub samples: Vec<f32>,
    /// Sample rate in Hz (e.g. 48000)
    pub sample_rate: u32,
    /// Number of channels (always 1 after capture downmix)
    pub channels: u16,
}

/// Configuration for audio capture
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Samples per capture block (set by the audio subsystem, not tunable
    /// per-pipeline)
    pub block_size: usize,
    /// Capture channel count (1 = mono)
    pub channels: u16,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            block_size: 4096, // common ScriptProcessor/cpal callback size
            channels: 1,      // Mono
        }
    }
}

/// A running capture stream: the block channel plus the native format
/// reported by the device.
pub struct CaptureStream {
    /// Channel of capture blocks; closes when the source stops
    pub blocks: mpsc::Receiver<AudioBlock>,
    /// Native sample rate in Hz (commonly 48000)
    pub sample_rate: u32,
    /// Channel count of the emitted blocks
    pub channels: u16,
}

/// Audio capture source trait
///
/// Implementations:
/// - Microphone: cpal default input device
/// - File: read from a WAV file (for testing/batch processing)
#[async_trait::async_trait]
pub trait AudioSource: Send + Sync {
    /// Start capturing audio
    ///
    /// Returns the block channel together with the native capture format.
    async fn start(&mut self) -> Result<CaptureStream, Error>;

    /// Stop capturing audio; the block channel closes afterwards
    async fn stop(&mut self) -> Result<(), Error>;

    /// Check if the source is currently capturing
    fn is_capturing(&self) -> bool;

    /// Get source name for logging
    fn name(&self) -> &str;
}

/// Audio source kind
#[derive(Debug, Clone)]
pub enum SourceKind {
    /// Microphone input (default input device)
    Microphone,
    /// File input (for testing/batch processing)
    File(String),
}

/// Audio source factory
pub struct SourceFactory;

impl SourceFactory {
    /// Create a capture source for the given kind
    pub fn create(kind: SourceKind, config: CaptureConfig) -> Result<Box<dyn AudioSource>, Error> {
        match kind {
            SourceKind::Microphone => {
                let source = super::microphone::MicrophoneSource::new(config);
                Ok(Box::new(source))
            }
            SourceKind::File(path) => {
                let source = super::file::FileSource::new(path, config);
                Ok(Box::new(source))
            }
        }
    }
}
