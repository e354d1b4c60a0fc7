//! HTTP API server for external control (the rendering collaborator)
//!
//! This module provides a REST API for controlling streaming sessions:
//! - POST /sessions/start - Start a new streaming session
//! - POST /sessions/stop/:id - Stop a session
//! - GET /sessions/:id/status - Query session status
//! - GET /sessions/:id/transcript - Get accumulated transcript text
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
