//! Microphone capture via cpal.
//!
//! The cpal stream is not `Send`, so it lives on a dedicated capture
//! thread for the lifetime of the recording; each hardware callback is
//! downmixed to mono and forwarded to the async pipeline over a channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info};

use super::source::{AudioBlock, AudioSource, CaptureConfig, CaptureStream};
use crate::error::Error;

/// Microphone capture source using the system default input device.
///
/// The capture block size is whatever the audio subsystem delivers per
/// callback (commonly 4096 samples); it is not chosen here.
pub struct MicrophoneSource {
    capturing: Arc<AtomicBool>,
    stop_tx: Option<std::sync::mpsc::Sender<()>>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl MicrophoneSource {
    pub fn new(_config: CaptureConfig) -> Self {
        Self {
            capturing: Arc::new(AtomicBool::new(false)),
            stop_tx: None,
            thread: None,
        }
    }
}

#[async_trait::async_trait]
impl AudioSource for MicrophoneSource {
    async fn start(&mut self) -> Result<CaptureStream, Error> {
        if self.capturing.load(Ordering::SeqCst) {
            return Err(Error::Device("microphone capture already started".to_string()));
        }

        let (block_tx, block_rx) = mpsc::channel::<AudioBlock>(64);
        let (ready_tx, ready_rx) = oneshot::channel::<Result<u32, Error>>();
        let (stop_tx, stop_rx) = std::sync::mpsc::channel::<()>();

        let capturing = Arc::clone(&self.capturing);

        let thread = std::thread::spawn(move || {
            let host = cpal::default_host();
            let device = match host.default_input_device() {
                Some(d) => d,
                None => {
                    let _ = ready_tx.send(Err(Error::Device(
                        "no input device available".to_string(),
                    )));
                    return;
                }
            };

            let supported = match device.default_input_config() {
                Ok(c) => c,
                Err(e) => {
                    let _ = ready_tx.send(Err(Error::Device(format!(
                        "failed to query input config: {}",
                        e
                    ))));
                    return;
                }
            };

            let channels = supported.channels();
            let sample_rate = supported.sample_rate().0;
            let stream_config: cpal::StreamConfig = supported.into();

            let stream = match device.build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let block = AudioBlock {
                        samples: downmix(data, channels),
                        sample_rate,
                        channels: 1,
                    };
                    // The audio thread must never block; if the pipeline is
                    // behind or gone, the block is dropped.
                    let _ = block_tx.try_send(block);
                },
                |err: cpal::StreamError| {
                    error!("cpal stream error: {}", err);
                },
                None,
            ) {
                Ok(s) => s,
                Err(e) => {
                    let _ = ready_tx.send(Err(Error::Device(format!(
                        "failed to build input stream: {}",
                        e
                    ))));
                    return;
                }
            };

            if let Err(e) = stream.play() {
                let _ = ready_tx.send(Err(Error::Device(format!(
                    "failed to start input stream: {}",
                    e
                ))));
                return;
            }

            capturing.store(true, Ordering::SeqCst);
            let _ = ready_tx.send(Ok(sample_rate));

            // Park until stop() drops its end; dropping the stream stops
            // the hardware capture.
            let _ = stop_rx.recv();
            drop(stream);
            capturing.store(false, Ordering::SeqCst);
        });

        let sample_rate = ready_rx
            .await
            .map_err(|_| Error::Device("capture thread exited during setup".to_string()))??;

        self.stop_tx = Some(stop_tx);
        self.thread = Some(thread);

        info!("Microphone capture started ({} Hz native)", sample_rate);

        Ok(CaptureStream {
            blocks: block_rx,
            sample_rate,
            channels: 1,
        })
    }

    async fn stop(&mut self) -> Result<(), Error> {
        if let Some(stop_tx) = self.stop_tx.take() {
            drop(stop_tx);
        }

        if let Some(thread) = self.thread.take() {
            // The capture thread only has to drop the stream, so the join
            // is short; run it off the async runtime anyway.
            let _ = tokio::task::spawn_blocking(move || thread.join()).await;
        }

        self.capturing.store(false, Ordering::SeqCst);
        info!("Microphone capture stopped");

        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "microphone"
    }
}

/// Average interleaved frames down to a single mono channel.
fn downmix(data: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return data.to_vec();
    }

    let ch = channels as usize;
    data.chunks_exact(ch)
        .map(|frame| frame.iter().sum::<f32>() / ch as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downmix_mono_is_identity() {
        let data = vec![0.1, -0.2, 0.3];
        assert_eq!(downmix(&data, 1), data);
    }

    #[test]
    fn downmix_stereo_averages_frames() {
        let data = vec![0.2, 0.4, -1.0, 1.0];
        let mono = downmix(&data, 2);
        assert_eq!(mono.len(), 2);
        assert!((mono[0] - 0.3).abs() < 1e-6);
        assert!(mono[1].abs() < 1e-6);
    }
}
