use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use hound::WavReader;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::source::{AudioBlock, AudioSource, CaptureConfig, CaptureStream};
use crate::error::Error;

/// WAV-file capture source.
///
/// Reads the whole file up front, normalizes to `f32` mono, and replays it
/// as fixed-size capture blocks. Used for testing and batch processing.
pub struct FileSource {
    path: String,
    config: CaptureConfig,
    capturing: Arc<AtomicBool>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl FileSource {
    pub fn new(path: String, config: CaptureConfig) -> Self {
        Self {
            path,
            config,
            capturing: Arc::new(AtomicBool::new(false)),
            task: None,
        }
    }
}

#[async_trait::async_trait]
impl AudioSource for FileSource {
    async fn start(&mut self) -> Result<CaptureStream, Error> {
        let reader = WavReader::open(&self.path)
            .map_err(|e| Error::Device(format!("failed to open WAV file {}: {}", self.path, e)))?;

        let spec = reader.spec();
        if spec.bits_per_sample != 16 || spec.sample_format != hound::SampleFormat::Int {
            return Err(Error::Device(format!(
                "unsupported WAV format in {} (expected 16-bit integer PCM)",
                self.path
            )));
        }

        let samples: Vec<i16> = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| Error::Device(format!("failed to read samples from {}: {}", self.path, e)))?;

        // Normalize to [-1, 1] and downmix interleaved channels to mono.
        let channels = spec.channels as usize;
        let mono: Vec<f32> = if channels <= 1 {
            samples.iter().map(|&s| f32::from(s) / 32768.0).collect()
        } else {
            samples
                .chunks_exact(channels)
                .map(|frame| {
                    frame.iter().map(|&s| f32::from(s) / 32768.0).sum::<f32>() / channels as f32
                })
                .collect()
        };

        info!(
            "Loaded {}: {} Hz, {} channels, {} mono samples",
            self.path,
            spec.sample_rate,
            spec.channels,
            mono.len()
        );

        let (tx, rx) = mpsc::channel(64);
        let block_size = self.config.block_size;
        let sample_rate = spec.sample_rate;
        let capturing = Arc::clone(&self.capturing);
        capturing.store(true, Ordering::SeqCst);

        let task = tokio::spawn(async move {
            for window in mono.chunks(block_size) {
                if !capturing.load(Ordering::SeqCst) {
                    break;
                }

                let block = AudioBlock {
                    samples: window.to_vec(),
                    sample_rate,
                    channels: 1,
                };

                if tx.send(block).await.is_err() {
                    warn!("Capture receiver dropped before file playback finished");
                    break;
                }
            }

            capturing.store(false, Ordering::SeqCst);
        });

        self.task = Some(task);

        Ok(CaptureStream {
            blocks: rx,
            sample_rate,
            channels: 1,
        })
    }

    async fn stop(&mut self) -> Result<(), Error> {
        self.capturing.store(false, Ordering::SeqCst);

        if let Some(task) = self.task.take() {
            let _ = task.await;
        }

        info!("File capture stopped");
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "file"
    }
}
