//! WebSocket client implementation.
//!
//! Provides the chat client for joining a room and exchanging messages.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{header, HeaderValue};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use super::config::WsConfig;
use super::error::WsError;
use super::messages::ChatMessage;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// A connection to one chat room.
pub struct ChatClient {
    config: WsConfig,
    sink: Mutex<WsSink>,
    events: Mutex<mpsc::Receiver<ChatMessage>>,
    connected: Arc<AtomicBool>,
    reader: JoinHandle<()>,
}

impl ChatClient {
    /// Connects to the configured room.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the handshake is
    /// rejected, or the server does not answer within the connect timeout.
    pub async fn connect(config: WsConfig) -> Result<Self, WsError> {
        config.validate()?;

        let mut request = config.room_url().into_client_request()?;
        let origin = HeaderValue::from_str(&config.origin_header()?)
            .map_err(|e| WsError::InvalidConfig(format!("invalid origin: {}", e)))?;
        request.headers_mut().insert(header::ORIGIN, origin);

        let (ws_stream, _) =
            tokio::time::timeout(config.connect_timeout, tokio_tungstenite::connect_async(request))
                .await
                .map_err(|_| WsError::Timeout)??;

        let (sink, source) = ws_stream.split();
        let (event_tx, event_rx) = mpsc::channel(config.event_buffer);
        let connected = Arc::new(AtomicBool::new(true));
        let reader = spawn_reader(source, event_tx, Arc::clone(&connected));

        Ok(Self {
            config,
            sink: Mutex::new(sink),
            events: Mutex::new(event_rx),
            connected,
            reader,
        })
    }

    /// Joins `room` on the server at `base_url` with default settings.
    ///
    /// # Errors
    ///
    /// See [`connect`](Self::connect).
    pub async fn join(base_url: impl Into<String>, room: impl Into<String>) -> Result<Self, WsError> {
        Self::connect(WsConfig::new(base_url, room)).await
    }

    /// Returns the client configuration.
    #[must_use]
    pub fn config(&self) -> &WsConfig {
        &self.config
    }

    /// Returns true until the server closes the connection.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Sends a chat message to the room.
    ///
    /// # Errors
    ///
    /// Returns an error if the message cannot be written.
    pub async fn send(&self, message: impl Into<String>) -> Result<(), WsError> {
        let json = serde_json::to_string(&ChatMessage::new(message))
            .map_err(|e| WsError::Serialization(e.to_string()))?;
        self.send_raw(json).await
    }

    /// Sends a raw text frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame cannot be written.
    pub async fn send_raw(&self, text: impl Into<String>) -> Result<(), WsError> {
        if !self.is_connected() {
            return Err(WsError::Closed);
        }

        self.sink
            .lock()
            .await
            .send(Message::Text(text.into().into()))
            .await
            .map_err(|e| WsError::SendFailed(e.to_string()))
    }

    /// Returns the next chat message from the room.
    ///
    /// # Errors
    ///
    /// Returns [`WsError::Closed`] once the connection is closed and all
    /// buffered messages have been read.
    pub async fn next_message(&self) -> Result<ChatMessage, WsError> {
        self.events.lock().await.recv().await.ok_or(WsError::Closed)
    }

    /// Waits up to `timeout` for the next chat message.
    ///
    /// Returns `Ok(None)` if nothing arrived in time.
    ///
    /// # Errors
    ///
    /// Returns [`WsError::Closed`] if the connection closed.
    pub async fn next_message_timeout(
        &self,
        timeout: Duration,
    ) -> Result<Option<ChatMessage>, WsError> {
        match tokio::time::timeout(timeout, self.next_message()).await {
            Ok(result) => result.map(Some),
            Err(_) => Ok(None),
        }
    }

    /// Closes the connection gracefully.
    ///
    /// # Errors
    ///
    /// Returns an error if the close frame cannot be sent.
    pub async fn close(&self) -> Result<(), WsError> {
        if !self.connected.swap(false, Ordering::AcqRel) {
            return Ok(());
        }

        self.sink
            .lock()
            .await
            .send(Message::Close(None))
            .await
            .map_err(WsError::from)
    }
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("config", &self.config)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

impl Drop for ChatClient {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

/// Spawns the message reader task.
fn spawn_reader(
    mut source: WsSource,
    event_tx: mpsc::Sender<ChatMessage>,
    connected: Arc<AtomicBool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(result) = source.next().await {
            match result {
                Ok(Message::Text(text)) => {
                    if let Ok(msg) = serde_json::from_str::<ChatMessage>(text.as_str()) {
                        if event_tx.send(msg).await.is_err() {
                            break;
                        }
                    }
                }
                Ok(Message::Close(_)) | Err(_) => break,
                _ => {}
            }
        }
        connected.store(false, Ordering::Release);
    })
}
