// Session lifecycle tests against a local WebSocket stub.
//
// These cover the state machine at the session boundary: start/stop,
// transcript accumulation, peer-initiated close, connect failure, and
// the no-op send outside of streaming.

use anyhow::Result;
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;
use vox_relay::{
    CaptureConfig, ChunkBuffer, FileSource, SessionConfig, SessionState, StreamSession,
    CHUNK_SAMPLES,
};

fn write_wav(dir: &tempfile::TempDir, name: &str, sample_rate: u32, samples: &[i16]) -> String {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let path = dir.path().join(name);
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for &sample in samples {
        writer.write_sample(sample).unwrap();
    }
    writer.finalize().unwrap();

    path.to_string_lossy().into_owned()
}

fn sine_samples(len: usize) -> Vec<i16> {
    (0..len)
        .map(|i| ((i as f32 * 0.0576).sin() * 16000.0) as i16)
        .collect()
}

/// Backend stub that sends the given text frames once the first binary
/// frame arrives, then keeps the connection open.
async fn spawn_backend(replies: Vec<String>) -> Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        let Ok((stream, _)) = listener.accept().await else {
            return;
        };
        let Ok(ws) = tokio_tungstenite::accept_async(stream).await else {
            return;
        };
        let (mut write, mut read) = ws.split();
        let mut sent = false;

        while let Some(Ok(msg)) = read.next().await {
            if matches!(msg, Message::Binary(_)) && !sent {
                for text in &replies {
                    let _ = write.send(Message::Text(text.clone())).await;
                }
                sent = true;
            }
        }
    });

    Ok(format!("ws://{}/ws-asr", addr))
}

/// Backend stub that closes the connection right after the handshake.
async fn spawn_closing_backend() -> Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        let Ok((stream, _)) = listener.accept().await else {
            return;
        };
        let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else {
            return;
        };
        let _ = ws.close(None).await;
    });

    Ok(format!("ws://{}/ws-asr", addr))
}

fn voiced_session(dir: &tempfile::TempDir, endpoint: String) -> StreamSession {
    let path = write_wav(dir, "voice.wav", 48_000, &sine_samples(30_720));
    let source = FileSource::new(path, CaptureConfig::default());
    let config = SessionConfig {
        session_id: "session-test".to_string(),
        endpoint,
        ..SessionConfig::default()
    };
    StreamSession::new(config, Box::new(source))
}

fn silent_session(dir: &tempfile::TempDir, endpoint: String) -> StreamSession {
    let path = write_wav(dir, "quiet.wav", 48_000, &vec![0i16; 30_720]);
    let source = FileSource::new(path, CaptureConfig::default());
    let config = SessionConfig {
        session_id: "quiet-test".to_string(),
        endpoint,
        ..SessionConfig::default()
    };
    StreamSession::new(config, Box::new(source))
}

#[tokio::test]
async fn start_reaches_streaming_with_projections() -> Result<()> {
    let dir = tempfile::TempDir::new()?;
    let endpoint = spawn_backend(Vec::new()).await?;
    let session = voiced_session(&dir, endpoint);

    assert_eq!(session.state().await, SessionState::Idle);

    session.start().await?;

    assert_eq!(session.state().await, SessionState::Streaming);
    assert!(session.is_recording().await);
    assert!(!session.is_connecting().await);
    assert!(session
        .current_text()
        .await
        .starts_with("Recording started..."));

    // Starting again is a logged no-op.
    session.start().await?;
    assert_eq!(session.state().await, SessionState::Streaming);

    session.stop().await?;
    Ok(())
}

#[tokio::test]
async fn transcripts_accumulate_one_per_line() -> Result<()> {
    let dir = tempfile::TempDir::new()?;
    let endpoint = spawn_backend(vec![
        r#"{"transcription": "hello world"}"#.to_string(),
        r#"{"transcription": "   "}"#.to_string(),
        r#"{"transcription": "second line", "confidence": 0.8}"#.to_string(),
        r#"{"other": "ignored"}"#.to_string(),
    ])
    .await?;
    let session = voiced_session(&dir, endpoint);

    session.start().await?;

    // Wait for the fragments to arrive.
    let mut text = String::new();
    for _ in 0..100 {
        text = session.current_text().await;
        if text.contains("second line") {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    assert!(text.contains("hello world\n"));
    assert!(text.contains("second line\n"));

    // The blank fragment and the message without a transcription field
    // are ignored.
    assert_eq!(session.stats().await.fragments_received, 2);

    let stats = session.stop().await?;
    assert_eq!(stats.fragments_received, 2);
    assert_eq!(session.state().await, SessionState::Closed);

    let text = session.current_text().await;
    assert!(text.contains("\nRecording stopped."));
    assert!(text.contains("\nConnection closed."));

    Ok(())
}

#[tokio::test]
async fn peer_close_moves_session_to_closed() -> Result<()> {
    let dir = tempfile::TempDir::new()?;
    let endpoint = spawn_closing_backend().await?;
    let session = voiced_session(&dir, endpoint);

    session.start().await?;

    let mut state = session.state().await;
    for _ in 0..100 {
        state = session.state().await;
        if state == SessionState::Closed {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    assert_eq!(state, SessionState::Closed);
    assert!(session.current_text().await.contains("Connection closed."));
    assert!(!session.is_recording().await);

    // stop() after the close is a logged no-op.
    let stats = session.stop().await?;
    assert!(!stats.is_recording);
    assert_eq!(session.state().await, SessionState::Closed);

    Ok(())
}

#[tokio::test]
async fn connect_failure_fails_the_session() -> Result<()> {
    // Reserve a port, then free it so the connect is refused.
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);

    let dir = tempfile::TempDir::new()?;
    let session = voiced_session(&dir, format!("ws://{}/ws-asr", addr));

    let result = session.start().await;
    assert!(result.is_err());
    assert_eq!(session.state().await, SessionState::Failed);

    // Failure overwrites the transcript area instead of appending.
    assert_eq!(session.current_text().await, "Error connecting to server.");

    // Terminal: a later start request does not revive the session.
    session.start().await?;
    assert_eq!(session.state().await, SessionState::Failed);

    Ok(())
}

#[tokio::test]
async fn missing_capture_device_reverts_to_idle() -> Result<()> {
    let endpoint = spawn_backend(Vec::new()).await?;

    let source = FileSource::new(
        "/nonexistent/capture.wav".to_string(),
        CaptureConfig::default(),
    );
    let config = SessionConfig {
        session_id: "device-test".to_string(),
        endpoint,
        ..SessionConfig::default()
    };
    let session = StreamSession::new(config, Box::new(source));

    let result = session.start().await;
    assert!(result.is_err());
    assert_eq!(session.state().await, SessionState::Idle);
    assert_eq!(session.current_text().await, "Microphone unavailable.");

    Ok(())
}

#[tokio::test]
async fn send_chunk_outside_streaming_is_a_noop() -> Result<()> {
    let dir = tempfile::TempDir::new()?;
    let endpoint = spawn_backend(Vec::new()).await?;
    let session = silent_session(&dir, endpoint);

    let mut buffer = ChunkBuffer::new();
    buffer.append(&vec![0i16; CHUNK_SAMPLES]);
    let chunk = buffer.drain_ready().remove(0);

    // Idle: dropped with a warning, not an error.
    session.send_chunk(&chunk).await;
    assert_eq!(session.stats().await.chunks_sent, 0);

    session.start().await?;

    // Streaming: delivered. The silent capture source contributes no
    // chunks of its own.
    session.send_chunk(&chunk).await;
    assert_eq!(session.stats().await.chunks_sent, 1);

    session.stop().await?;

    // Closed: dropped again.
    session.send_chunk(&chunk).await;
    assert_eq!(session.stats().await.chunks_sent, 1);

    Ok(())
}
