//! Streaming session management
//!
//! This module provides the `StreamSession` abstraction that manages:
//! - Audio capture and the resample/gate/chunk pipeline
//! - Chunk delivery over the WebSocket transport
//! - Transcript collection and status text
//! - Session statistics and lifecycle state

mod config;
mod session;
mod state;
mod stats;
mod transcript;

pub use config::SessionConfig;
pub use session::StreamSession;
pub use state::{transition, Effect, SessionEvent, SessionState};
pub use stats::SessionStats;
pub use transcript::TranscriptLog;
