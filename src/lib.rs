pub mod audio;
pub mod config;
pub mod error;
pub mod http;
pub mod session;
pub mod ws;

pub use audio::{
    AudioBlock, AudioSource, CaptureConfig, CaptureStream, Chunk, ChunkBuffer, FileSource,
    MicrophoneSource, Resampler, SilenceGate, SourceFactory, SourceKind, CHUNK_BYTES,
    CHUNK_SAMPLES, SILENCE_RMS_THRESHOLD,
};
pub use config::Config;
pub use error::Error;
pub use http::{create_router, AppState};
pub use session::{
    SessionConfig, SessionEvent, SessionState, SessionStats, StreamSession, TranscriptLog,
};
pub use ws::{TranscriptMessage, TransportEvent, WsTransport};
