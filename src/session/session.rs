use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::config::SessionConfig;
use super::state::{Effect, SessionEvent, SessionState};
use super::stats::SessionStats;
use super::transcript::TranscriptLog;
use crate::audio::{AudioSource, Chunk, ChunkBuffer, Resampler, SilenceGate};
use crate::error::Error;
use crate::ws::{TranscriptMessage, TransportEvent, WsTransport};

/// A streaming session that manages audio capture, the
/// resample/gate/chunk pipeline, chunk delivery over the transport, and
/// transcript collection
pub struct StreamSession {
    /// Session configuration
    config: SessionConfig,

    /// Lifecycle state; mutated only through [`apply_event`]
    state: Arc<Mutex<SessionState>>,

    /// Accumulated transcript and status text
    transcript: Arc<Mutex<TranscriptLog>>,

    /// Open transport, present between connect and close
    transport: Arc<Mutex<Option<WsTransport>>>,

    /// Capture source for this session
    source: Arc<Mutex<Box<dyn AudioSource>>>,

    /// When the session was created
    started_at: chrono::DateTime<Utc>,

    /// Number of chunks delivered to the transport
    chunks_sent: Arc<AtomicUsize>,

    /// Number of non-empty transcript fragments received
    fragments_received: Arc<AtomicUsize>,

    /// Handle for the audio pipeline task
    audio_task_handle: Arc<Mutex<Option<JoinHandle<()>>>>,

    /// Handle for the transport event task
    event_task_handle: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl StreamSession {
    /// Create a new streaming session around a capture source
    pub fn new(config: SessionConfig, source: Box<dyn AudioSource>) -> Self {
        info!("Creating streaming session: {}", config.session_id);

        Self {
            config,
            state: Arc::new(Mutex::new(SessionState::Idle)),
            transcript: Arc::new(Mutex::new(TranscriptLog::new())),
            transport: Arc::new(Mutex::new(None)),
            source: Arc::new(Mutex::new(source)),
            started_at: Utc::now(),
            chunks_sent: Arc::new(AtomicUsize::new(0)),
            fragments_received: Arc::new(AtomicUsize::new(0)),
            audio_task_handle: Arc::new(Mutex::new(None)),
            event_task_handle: Arc::new(Mutex::new(None)),
        }
    }

    /// Start the session: open the transport, then bring up the capture
    /// pipeline once the connection is established.
    ///
    /// Transport failures move the session to Failed and are returned;
    /// microphone failures revert it to Idle and are returned.
    pub async fn start(&self) -> Result<(), Error> {
        {
            let state = self.state.lock().await;
            if *state != SessionState::Idle {
                warn!("Session already started (state: {:?})", *state);
                return Ok(());
            }
        }

        info!("Starting streaming session: {}", self.config.session_id);

        // Idle -> Connecting
        let effects =
            apply_event(&self.state, &self.transcript, SessionEvent::StartRequested).await;
        debug_assert!(effects.contains(&Effect::OpenTransport));

        let mut transport = match WsTransport::connect(&self.config.endpoint).await {
            Ok(t) => t,
            Err(e) => {
                error!("Transport connect failed: {}", e);
                let effects = apply_event(
                    &self.state,
                    &self.transcript,
                    SessionEvent::Error(e.to_string()),
                )
                .await;
                run_shutdown_effects(effects, &self.source, &self.transport).await;
                return Err(e);
            }
        };

        let events = match transport.take_events() {
            Some(rx) => rx,
            None => {
                let e = Error::Transport("transport event channel unavailable".to_string());
                let effects = apply_event(
                    &self.state,
                    &self.transcript,
                    SessionEvent::Error(e.to_string()),
                )
                .await;
                run_shutdown_effects(effects, &self.source, &self.transport).await;
                return Err(e);
            }
        };

        // Connecting -> Streaming; the completed handshake is the open event.
        let effects = apply_event(&self.state, &self.transcript, SessionEvent::Open).await;
        debug_assert!(effects.contains(&Effect::BeginCapture));

        // Request microphone access.
        let capture = {
            let mut source = self.source.lock().await;
            source.start().await
        };

        let capture = match capture {
            Ok(c) => c,
            Err(e) => {
                error!("Capture start failed: {}", e);
                let effects = apply_event(
                    &self.state,
                    &self.transcript,
                    SessionEvent::CaptureFailed(e.to_string()),
                )
                .await;
                if effects.contains(&Effect::CloseTransport) {
                    transport.close().await;
                }
                return Err(e);
            }
        };

        // Fail fast on a bad rate pairing before any block is processed.
        let resampler = match Resampler::new(capture.sample_rate, self.config.target_sample_rate)
        {
            Ok(r) => r,
            Err(e) => {
                error!("Resampler misconfigured: {}", e);
                {
                    let mut source = self.source.lock().await;
                    if let Err(stop_err) = source.stop().await {
                        error!("Failed to stop capture: {}", stop_err);
                    }
                }
                let effects = apply_event(
                    &self.state,
                    &self.transcript,
                    SessionEvent::CaptureFailed(e.to_string()),
                )
                .await;
                if effects.contains(&Effect::CloseTransport) {
                    transport.close().await;
                }
                return Err(e);
            }
        };

        {
            let mut slot = self.transport.lock().await;
            *slot = Some(transport);
        }

        // Spawn the audio pipeline task: capture blocks in, chunks out.
        let state = Arc::clone(&self.state);
        let transport_slot = Arc::clone(&self.transport);
        let chunks_sent = Arc::clone(&self.chunks_sent);
        let gate = SilenceGate::new(self.config.silence_threshold);
        let mut blocks = capture.blocks;

        let audio_task = tokio::spawn(async move {
            info!("Audio pipeline task started");

            let mut buffer = ChunkBuffer::new();

            while let Some(block) = blocks.recv().await {
                if block.samples.is_empty() {
                    warn!("Empty capture block, skipping");
                    continue;
                }

                // Silence is gated on the raw block, before downsampling;
                // the whole block is dropped, nothing is retained.
                if gate.is_silent(&block.samples) {
                    debug!(
                        "Silent block dropped (rms {:.4})",
                        SilenceGate::rms(&block.samples)
                    );
                    continue;
                }

                buffer.append(&resampler.downsample(&block.samples));

                for chunk in buffer.drain_ready() {
                    deliver_chunk(&state, &transport_slot, &chunks_sent, &chunk).await;
                }
            }

            if buffer.pending_len() > 0 {
                // The sub-chunk remainder is discarded, not transmitted.
                debug!(
                    "Discarding {} buffered samples below the chunk boundary",
                    buffer.pending_len()
                );
            }

            info!("Audio pipeline task stopped");
        });

        {
            let mut handle = self.audio_task_handle.lock().await;
            *handle = Some(audio_task);
        }

        // Spawn the transport event task: transcripts and lifecycle in
        // arrival order.
        let state = Arc::clone(&self.state);
        let transcript = Arc::clone(&self.transcript);
        let transport_slot = Arc::clone(&self.transport);
        let source_slot = Arc::clone(&self.source);
        let fragments_received = Arc::clone(&self.fragments_received);
        let mut events = events;

        let event_task = tokio::spawn(async move {
            info!("Transport event task started");

            while let Some(event) = events.recv().await {
                match event {
                    TransportEvent::Message(text) => {
                        let msg: TranscriptMessage = match serde_json::from_str(&text) {
                            Ok(m) => m,
                            Err(e) => {
                                warn!("Failed to parse transcript message: {}", e);
                                continue;
                            }
                        };

                        if msg.transcription.trim().is_empty() {
                            debug!("Empty transcript fragment ignored");
                            continue;
                        }

                        fragments_received.fetch_add(1, Ordering::SeqCst);
                        apply_event(
                            &state,
                            &transcript,
                            SessionEvent::Message(msg.transcription),
                        )
                        .await;
                    }
                    TransportEvent::Closed => {
                        info!("Transport closed");
                        let effects =
                            apply_event(&state, &transcript, SessionEvent::Closed).await;
                        run_shutdown_effects(effects, &source_slot, &transport_slot).await;
                        break;
                    }
                    TransportEvent::Error(reason) => {
                        error!("Transport error: {}", reason);
                        let effects =
                            apply_event(&state, &transcript, SessionEvent::Error(reason)).await;
                        run_shutdown_effects(effects, &source_slot, &transport_slot).await;
                        break;
                    }
                }
            }

            info!("Transport event task stopped");
        });

        {
            let mut handle = self.event_task_handle.lock().await;
            *handle = Some(event_task);
        }

        info!("Streaming session started successfully");

        Ok(())
    }

    /// Stop streaming: disconnect capture, close the transport, wait for
    /// the background tasks to finish.
    ///
    /// The buffered sub-chunk remainder is discarded; chunks already
    /// handed to the transport are not recalled.
    pub async fn stop(&self) -> Result<SessionStats, Error> {
        {
            let state = self.state.lock().await;
            if *state != SessionState::Streaming {
                warn!("Stop requested while not streaming (state: {:?})", *state);
                drop(state);
                return Ok(self.stats().await);
            }
        }

        info!("Stopping streaming session: {}", self.config.session_id);

        // Streaming -> Stopping (transient)
        let effects =
            apply_event(&self.state, &self.transcript, SessionEvent::StopRequested).await;
        run_shutdown_effects(effects, &self.source, &self.transport).await;

        // Stopping -> Closed; the local close surfaces like any other.
        let effects = apply_event(&self.state, &self.transcript, SessionEvent::Closed).await;
        run_shutdown_effects(effects, &self.source, &self.transport).await;

        // The capture channel has closed, so the pipeline task drains and
        // exits; the event channel ends with the transport.
        {
            let mut handle = self.audio_task_handle.lock().await;
            if let Some(task) = handle.take() {
                if let Err(e) = task.await {
                    error!("Audio pipeline task panicked: {}", e);
                }
            }
        }

        {
            let mut handle = self.event_task_handle.lock().await;
            if let Some(task) = handle.take() {
                if let Err(e) = task.await {
                    error!("Transport event task panicked: {}", e);
                }
            }
        }

        info!("Streaming session stopped");

        Ok(self.stats().await)
    }

    /// Send one chunk directly. Valid only while Streaming; anywhere else
    /// this is a logged no-op, not an error.
    pub async fn send_chunk(&self, chunk: &Chunk) {
        deliver_chunk(&self.state, &self.transport, &self.chunks_sent, chunk).await;
    }

    /// Current lifecycle state
    pub async fn state(&self) -> SessionState {
        *self.state.lock().await
    }

    /// Whether audio is being streamed (projection of the state)
    pub async fn is_recording(&self) -> bool {
        self.state().await.is_recording()
    }

    /// Whether the transport handshake is in progress (projection)
    pub async fn is_connecting(&self) -> bool {
        self.state().await.is_connecting()
    }

    /// Snapshot of the accumulated transcript and status text
    pub async fn current_text(&self) -> String {
        self.transcript.lock().await.current_text().to_string()
    }

    pub fn session_id(&self) -> &str {
        &self.config.session_id
    }

    /// Current session statistics
    pub async fn stats(&self) -> SessionStats {
        let state = self.state().await;
        let duration = Utc::now().signed_duration_since(self.started_at);

        SessionStats {
            is_recording: state.is_recording(),
            is_connecting: state.is_connecting(),
            started_at: self.started_at,
            duration_secs: duration.num_milliseconds() as f64 / 1000.0,
            chunks_sent: self.chunks_sent.load(Ordering::SeqCst),
            fragments_received: self.fragments_received.load(Ordering::SeqCst),
        }
    }
}

/// Apply one lifecycle event: run the pure transition, store the new
/// state, execute the log effects in place, and hand the resource effects
/// back to the caller.
async fn apply_event(
    state: &Mutex<SessionState>,
    transcript: &Mutex<TranscriptLog>,
    event: SessionEvent,
) -> Vec<Effect> {
    let effects = {
        let mut state = state.lock().await;
        let (next, effects) = super::state::transition(*state, &event);
        if next != *state {
            debug!("Session state {:?} -> {:?}", *state, next);
            *state = next;
        }
        effects
    };

    let mut remaining = Vec::new();
    for effect in effects {
        match effect {
            Effect::OverwriteLog(status) => transcript.lock().await.overwrite(&status),
            Effect::AppendTranscript(fragment) => transcript.lock().await.append(&fragment),
            Effect::AppendMarker(marker) => transcript.lock().await.append_marker(&marker),
            other => remaining.push(other),
        }
    }

    remaining
}

/// Execute the StopCapture/CloseTransport effects emitted by a transition.
async fn run_shutdown_effects(
    effects: Vec<Effect>,
    source: &Mutex<Box<dyn AudioSource>>,
    transport: &Mutex<Option<WsTransport>>,
) {
    for effect in effects {
        match effect {
            Effect::StopCapture => {
                let mut source = source.lock().await;
                if source.is_capturing() {
                    if let Err(e) = source.stop().await {
                        error!("Failed to stop capture: {}", e);
                    }
                }
            }
            Effect::CloseTransport => {
                let taken = { transport.lock().await.take() };
                if let Some(t) = taken {
                    t.close().await;
                }
            }
            other => debug!("Effect {:?} has no runner here", other),
        }
    }
}

/// Deliver one chunk, best effort: outside Streaming, or with the
/// transport gone, the chunk is dropped with a warning. At-most-once, no
/// retry buffer.
async fn deliver_chunk(
    state: &Mutex<SessionState>,
    transport: &Mutex<Option<WsTransport>>,
    chunks_sent: &AtomicUsize,
    chunk: &Chunk,
) {
    {
        let state = state.lock().await;
        if *state != SessionState::Streaming {
            warn!("Chunk ready while not streaming ({:?}), dropping", *state);
            return;
        }
    }

    let mut transport = transport.lock().await;
    match transport.as_mut() {
        Some(t) => {
            if let Err(e) = t.send_chunk(chunk).await {
                warn!("Failed to send chunk: {}", e);
            } else {
                chunks_sent.fetch_add(1, Ordering::SeqCst);
            }
        }
        None => warn!("Chunk ready with no open transport, dropping"),
    }
}
