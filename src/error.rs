use thiserror::Error;

/// Errors surfaced by the capture-to-stream pipeline.
///
/// `Configuration` is a structural error and fails fast before any audio is
/// processed. `Transport` and `Device` are environmental: they are caught at
/// the session boundary and converted to user-visible status text.
#[derive(Debug, Error)]
pub enum Error {
    #[error("target sample rate {target} Hz must be below the input rate {input} Hz")]
    Configuration { input: u32, target: u32 },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("audio device error: {0}")]
    Device(String),
}
