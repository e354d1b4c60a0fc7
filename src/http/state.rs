use crate::session::{SessionConfig, StreamSession};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Active streaming sessions (session_id → session)
    pub sessions: Arc<RwLock<HashMap<String, Arc<StreamSession>>>>,

    /// Template applied to new sessions; the session id is replaced per
    /// session and the endpoint may be overridden by the request
    pub session_defaults: SessionConfig,
}

impl AppState {
    pub fn new(session_defaults: SessionConfig) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            session_defaults,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}
