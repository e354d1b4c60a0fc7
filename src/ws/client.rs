//! WebSocket transport to the recognition backend.
//!
//! Outbound traffic is raw binary frames of little-endian PCM16 (no
//! envelope); inbound traffic is JSON text frames. A background reader
//! task turns the socket into a channel of [`TransportEvent`]s that the
//! session consumes in arrival order.

use futures::stream::{SplitSink, StreamExt};
use futures::SinkExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::audio::Chunk;
use crate::error::Error;

/// Events surfaced by the transport reader task, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Inbound text frame (JSON transcript payload)
    Message(String),
    /// The peer closed the connection, or the stream ended
    Closed,
    /// Mid-stream socket error
    Error(String),
}

/// A connected duplex transport.
///
/// The successful return of [`WsTransport::connect`] corresponds to the
/// transport "open" event.
pub struct WsTransport {
    write: SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>,
    events: Option<mpsc::Receiver<TransportEvent>>,
    reader_task: tokio::task::JoinHandle<()>,
}

impl WsTransport {
    /// Open the connection and spawn the reader task.
    pub async fn connect(url: &str) -> Result<Self, Error> {
        info!("Connecting to recognition endpoint at {}", url);

        let (ws_stream, _response) = connect_async(url)
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        info!("WebSocket connection established");

        let (write, mut read) = ws_stream.split();
        let (event_tx, event_rx) = mpsc::channel(64);

        let reader_task = tokio::spawn(async move {
            loop {
                match read.next().await {
                    Some(Ok(Message::Text(text))) => {
                        if event_tx.send(TransportEvent::Message(text)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        let _ = event_tx.send(TransportEvent::Closed).await;
                        break;
                    }
                    Some(Ok(_)) => {
                        // Binary/ping/pong frames from the backend carry no
                        // transcript data.
                    }
                    Some(Err(e)) => {
                        let _ = event_tx.send(TransportEvent::Error(e.to_string())).await;
                        break;
                    }
                }
            }

            debug!("Transport reader task exiting");
        });

        Ok(Self {
            write,
            events: Some(event_rx),
            reader_task,
        })
    }

    /// Send one chunk as a binary frame: exactly the 5120 little-endian
    /// PCM bytes, nothing else.
    pub async fn send_chunk(&mut self, chunk: &Chunk) -> Result<(), Error> {
        self.write
            .send(Message::Binary(chunk.to_le_bytes()))
            .await
            .map_err(|e| Error::Transport(e.to_string()))
    }

    /// Take ownership of the inbound event channel.
    ///
    /// Returns `None` if already taken.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<TransportEvent>> {
        self.events.take()
    }

    /// Close the connection.
    pub async fn close(mut self) {
        self.reader_task.abort();

        if let Err(e) = self.write.close().await {
            warn!("Error closing WebSocket: {}", e);
        }
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        // The reader task must not outlive the transport.
        self.reader_task.abort();
    }
}
