pub mod chunk;
pub mod file;
pub mod gate;
pub mod microphone;
pub mod resample;
pub mod source;

pub use chunk::{Chunk, ChunkBuffer, CHUNK_BYTES, CHUNK_SAMPLES};
pub use file::FileSource;
pub use gate::{SilenceGate, SILENCE_RMS_THRESHOLD};
pub use microphone::MicrophoneSource;
pub use resample::Resampler;
pub use source::{AudioBlock, AudioSource, CaptureConfig, CaptureStream, SourceFactory, SourceKind};
