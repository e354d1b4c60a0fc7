//! Session lifecycle state machine.
//!
//! All transitions go through [`transition`], which returns the next state
//! plus the effects to execute. The transition logic is synchronous and
//! free of I/O; the session runner performs the effects.

/// Connection lifecycle of a streaming session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Streaming,
    /// Transient sub-step of an explicit stop: capture is disconnected,
    /// then the transport closed, then Closed is reached.
    Stopping,
    Closed,
    Failed,
}

impl SessionState {
    /// Projection read by the rendering collaborator.
    pub fn is_recording(&self) -> bool {
        matches!(self, SessionState::Streaming)
    }

    /// Projection read by the rendering collaborator.
    pub fn is_connecting(&self) -> bool {
        matches!(self, SessionState::Connecting)
    }

    /// Closed and Failed are terminal; no event leaves them.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Closed | SessionState::Failed)
    }
}

/// Events that drive the session lifecycle.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// User asked to start streaming
    StartRequested,
    /// Transport handshake completed
    Open,
    /// Inbound transcript payload (the extracted text field)
    Message(String),
    /// Transport error, either at connect or mid-stream
    Error(String),
    /// Transport closed, by the peer or locally
    Closed,
    /// User asked to stop streaming
    StopRequested,
    /// Microphone access failed while bringing the pipeline up
    CaptureFailed(String),
}

/// Side effects the session runner executes after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Open the transport connection
    OpenTransport,
    /// Request microphone access and start the capture pipeline
    BeginCapture,
    /// Disconnect the capture pipeline
    StopCapture,
    /// Close the transport connection
    CloseTransport,
    /// Replace the whole transcript area with a status line
    OverwriteLog(String),
    /// Append a transcript fragment (empty fragments are dropped by the log)
    AppendTranscript(String),
    /// Append a status marker on its own line
    AppendMarker(String),
}

/// Compute the next state and effects for `event` in `state`.
///
/// Terminal states absorb every event; no transition fires twice out of
/// Closed or Failed. Out-of-order events in non-terminal states leave the
/// state unchanged with no effects.
pub fn transition(state: SessionState, event: &SessionEvent) -> (SessionState, Vec<Effect>) {
    use SessionState::*;

    if state.is_terminal() {
        return (state, Vec::new());
    }

    match (state, event) {
        (Idle, SessionEvent::StartRequested) => (
            Connecting,
            vec![
                Effect::OverwriteLog("Connecting to server...".to_string()),
                Effect::OpenTransport,
            ],
        ),

        (Connecting, SessionEvent::Open) => (
            Streaming,
            vec![
                Effect::OverwriteLog("Recording started...".to_string()),
                Effect::BeginCapture,
            ],
        ),

        (Streaming, SessionEvent::Message(text)) => {
            (Streaming, vec![Effect::AppendTranscript(text.clone())])
        }

        // Failure replaces the transcript area with the error status
        // instead of appending a marker.
        (Connecting, SessionEvent::Error(_)) | (Streaming, SessionEvent::Error(_)) => (
            Failed,
            vec![
                Effect::StopCapture,
                Effect::CloseTransport,
                Effect::OverwriteLog("Error connecting to server.".to_string()),
            ],
        ),

        (Connecting, SessionEvent::Closed)
        | (Streaming, SessionEvent::Closed)
        | (Stopping, SessionEvent::Closed) => (
            Closed,
            vec![
                Effect::StopCapture,
                Effect::CloseTransport,
                Effect::AppendMarker("Connection closed.".to_string()),
            ],
        ),

        (Streaming, SessionEvent::StopRequested) => (
            Stopping,
            vec![
                Effect::StopCapture,
                Effect::AppendMarker("Recording stopped.".to_string()),
                Effect::CloseTransport,
            ],
        ),

        // Microphone failure reverts the session; the error itself
        // propagates to the start() caller.
        (Connecting, SessionEvent::CaptureFailed(_))
        | (Streaming, SessionEvent::CaptureFailed(_)) => (
            Idle,
            vec![
                Effect::CloseTransport,
                Effect::OverwriteLog("Microphone unavailable.".to_string()),
            ],
        ),

        _ => (state, Vec::new()),
    }
}
