//! WebSocket connection handler.
//!
//! Provides the upgrade handler for `/ws/chat/{room_name}/` and the
//! per-connection loop.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::connection::Connection;
use super::messages::{ChatMessage, Envelope};
use super::metrics::WsMetrics;
use super::origin::OriginValidator;
use super::registry::{GroupRegistry, InMemoryGroupRegistry};
use super::room::{RoomName, RoomNamePolicy};
use crate::config::ServerConfig;
use crate::error::ChatError;

/// WebSocket state shared across connections.
#[derive(Clone)]
pub struct WsState {
    /// Group registry.
    pub registry: Arc<dyn GroupRegistry>,
    /// Metrics.
    pub metrics: Arc<WsMetrics>,
    /// Handshake origin check.
    pub origins: Arc<OriginValidator>,
    /// Room name validation.
    pub room_name_policy: RoomNamePolicy,
    /// Per-connection queue capacity.
    pub mailbox_capacity: usize,
}

impl WsState {
    /// Creates a WebSocket state with an in-memory registry.
    #[must_use]
    pub fn new(config: &ServerConfig) -> Self {
        Self::with_registry(config, Arc::new(InMemoryGroupRegistry::new()))
    }

    /// Creates a WebSocket state on top of an existing registry.
    #[must_use]
    pub fn with_registry(config: &ServerConfig, registry: Arc<dyn GroupRegistry>) -> Self {
        Self {
            registry,
            metrics: Arc::new(WsMetrics::new()),
            origins: Arc::new(OriginValidator::new(config.allowed_hosts.clone())),
            room_name_policy: config.room_name_policy,
            mailbox_capacity: config.mailbox_capacity.max(1),
        }
    }
}

/// WebSocket upgrade handler.
///
/// Checks the origin and room name, joins the room's group, and only then
/// accepts the upgrade. Rejections answer with a plain HTTP status:
/// 403 for a disallowed origin, 400 for an invalid room name and 503 when
/// the registry is unavailable.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(room_name): Path<String>,
    headers: HeaderMap,
    State(state): State<WsState>,
) -> Response {
    let origin = headers
        .get(header::ORIGIN)
        .and_then(|value| value.to_str().ok());

    if !state.origins.is_allowed(origin) {
        state.metrics.record_connection_rejected();
        let err = ChatError::OriginRejected(origin.unwrap_or("<none>").to_string());
        warn!(code = err.code(), "{}", err);
        return (StatusCode::FORBIDDEN, err.to_string()).into_response();
    }

    let room = match RoomName::parse(&room_name, state.room_name_policy) {
        Ok(room) => room,
        Err(e) => {
            state.metrics.record_connection_rejected();
            warn!(code = e.code(), "{}", e);
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };

    let (mailbox, mailbox_rx) = mpsc::channel::<Envelope>(state.mailbox_capacity);
    let (outbound, outbound_rx) = mpsc::channel::<ChatMessage>(state.mailbox_capacity);

    let mut connection = Connection::new(room, Arc::clone(&state.registry), mailbox, outbound);
    if let Err(e) = connection.on_connect().await {
        state.metrics.record_connection_rejected();
        error!(code = e.code(), room = %connection.room(), "Rejecting handshake: {}", e);
        return (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response();
    }
    state.metrics.record_connection_opened();

    let registry = Arc::clone(&state.registry);
    let metrics = Arc::clone(&state.metrics);
    let group = connection.group().clone();
    let connection_id = connection.id();

    ws.on_failed_upgrade(move |e| {
        warn!(connection_id, "WebSocket upgrade failed: {}", e);
        metrics.record_error();
        metrics.record_connection_closed();
        tokio::spawn(async move {
            registry.unsubscribe(&group, connection_id).await;
        });
    })
    .on_upgrade(move |socket| handle_connection(socket, connection, mailbox_rx, outbound_rx, state))
}

/// Handles an accepted WebSocket connection.
async fn handle_connection(
    socket: WebSocket,
    mut connection: Connection,
    mut mailbox_rx: mpsc::Receiver<Envelope>,
    mut outbound_rx: mpsc::Receiver<ChatMessage>,
    state: WsState,
) {
    let connection_id = connection.id();
    info!(connection_id, room = %connection.room(), "WebSocket connection opened");

    let (mut ws_sender, mut ws_receiver) = socket.split();

    // Forward outbound chat messages to the socket
    let metrics = Arc::clone(&state.metrics);
    let sender_task = tokio::spawn(async move {
        while let Some(msg) = outbound_rx.recv().await {
            let json = match msg.encode() {
                Ok(j) => j,
                Err(e) => {
                    error!("Failed to serialize message: {}", e);
                    continue;
                }
            };

            if ws_sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
            metrics.record_message_sent();
        }
    });

    let mut close_code = None;
    loop {
        tokio::select! {
            frame = ws_receiver.next() => {
                let msg = match frame {
                    Some(Ok(msg)) => msg,
                    Some(Err(e)) => {
                        warn!(connection_id, "WebSocket error: {}", e);
                        state.metrics.record_error();
                        break;
                    }
                    None => break,
                };

                match msg {
                    Message::Text(text) => {
                        state.metrics.record_message_received();
                        handle_text_message(text.as_str(), &connection, &state).await;
                    }
                    Message::Binary(_) => {
                        debug!(connection_id, "Ignoring binary frame");
                    }
                    Message::Ping(_) | Message::Pong(_) => {}
                    Message::Close(frame) => {
                        close_code = frame.map(|f| f.code);
                        debug!(connection_id, code = ?close_code, "WebSocket close requested");
                        break;
                    }
                }
            }
            Some(envelope) = mailbox_rx.recv() => {
                handle_group_event(envelope, &connection, &state).await;
            }
        }
    }

    // Cleanup
    connection.on_disconnect(close_code).await;
    state.metrics.record_connection_closed();
    sender_task.abort();

    info!(connection_id, "WebSocket connection closed");
}

/// Publishes a text frame to the connection's group.
///
/// Malformed frames are dropped and the connection stays open.
async fn handle_text_message(text: &str, connection: &Connection, state: &WsState) {
    match connection.on_receive(text).await {
        Ok(delivered) => state.metrics.record_publish(delivered),
        Err(ChatError::MalformedPayload(reason)) => {
            state.metrics.record_malformed();
            warn!(
                connection_id = connection.id(),
                "Dropping malformed payload: {}", reason
            );
        }
        Err(e) => {
            state.metrics.record_error();
            error!(
                connection_id = connection.id(),
                code = e.code(),
                "Failed to publish message: {}", e
            );
        }
    }
}

/// Delivers a group event to the client.
async fn handle_group_event(envelope: Envelope, connection: &Connection, state: &WsState) {
    match connection.on_group_event(envelope).await {
        Ok(()) => {}
        Err(ChatError::UnknownEventType(event_type)) => {
            debug!(
                connection_id = connection.id(),
                event_type = %event_type,
                "Ignoring unknown group event"
            );
        }
        Err(e) => {
            state.metrics.record_error();
            warn!(
                connection_id = connection.id(),
                code = e.code(),
                "Dropping group event: {}", e
            );
        }
    }
}
