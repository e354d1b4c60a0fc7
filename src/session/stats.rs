use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Statistics about a streaming session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    /// Whether audio is currently being streamed
    pub is_recording: bool,

    /// Whether the transport handshake is still in progress
    pub is_connecting: bool,

    /// When the session started
    pub started_at: DateTime<Utc>,

    /// Total duration in seconds
    pub duration_secs: f64,

    /// Number of chunks delivered to the transport so far
    pub chunks_sent: usize,

    /// Number of non-empty transcript fragments received
    pub fragments_received: usize,
}
