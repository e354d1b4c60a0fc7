pub mod client;
pub mod messages;

pub use client::{TransportEvent, WsTransport};
pub use messages::TranscriptMessage;
