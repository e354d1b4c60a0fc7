use serde::{Deserialize, Serialize};

use crate::audio::SILENCE_RMS_THRESHOLD;

/// Configuration for a streaming session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Unique session identifier (e.g. "session-2026-08-06-standup")
    pub session_id: String,

    /// WebSocket endpoint of the recognition backend
    pub endpoint: String,

    /// Wire sample rate; the backend consumes 16 kHz PCM
    pub target_sample_rate: u32,

    /// RMS level below which a capture block is dropped as silence
    pub silence_threshold: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: format!("session-{}", uuid::Uuid::new_v4()),
            endpoint: "ws://localhost:8080/ws-asr".to_string(),
            target_sample_rate: 16000,
            silence_threshold: SILENCE_RMS_THRESHOLD,
        }
    }
}
