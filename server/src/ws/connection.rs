//! WebSocket connection state machine.
//!
//! A connection moves `Pending -> Open -> Closed` and never re-opens.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use super::messages::{ChatMessage, Envelope, GroupEvent};
use super::registry::{GroupRegistry, Mailbox};
use super::room::{GroupName, RoomName};
use crate::error::ChatError;

/// Global connection ID counter.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Generates a unique connection ID.
#[must_use]
pub fn next_connection_id() -> u64 {
    CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Lifecycle state of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Handshake not yet accepted.
    Pending,
    /// Subscribed to its group.
    Open,
    /// Terminal.
    Closed,
}

/// Per-socket chat connection.
pub struct Connection {
    id: u64,
    room: RoomName,
    group: GroupName,
    state: ConnectionState,
    registry: Arc<dyn GroupRegistry>,
    /// Handed to the registry on subscribe.
    mailbox: Mailbox,
    /// Frames for the client; drained by the socket writer.
    outbound: mpsc::Sender<ChatMessage>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("room", &self.room)
            .field("group", &self.group)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Connection {
    /// Creates a pending connection for a room.
    #[must_use]
    pub fn new(
        room: RoomName,
        registry: Arc<dyn GroupRegistry>,
        mailbox: Mailbox,
        outbound: mpsc::Sender<ChatMessage>,
    ) -> Self {
        let group = GroupName::for_room(&room);
        Self {
            id: next_connection_id(),
            room,
            group,
            state: ConnectionState::Pending,
            registry,
            mailbox,
            outbound,
        }
    }

    /// Returns the connection ID.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Returns the room this connection joined.
    #[must_use]
    pub const fn room(&self) -> &RoomName {
        &self.room
    }

    /// Returns the registry group.
    #[must_use]
    pub const fn group(&self) -> &GroupName {
        &self.group
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    /// Returns true while the connection is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    /// Joins the room's group and opens the connection.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::RegistryUnavailable`] if the registry refuses the
    /// subscription; the connection is then closed with nothing registered.
    /// Returns [`ChatError::ConnectionClosed`] if the connection is not pending.
    pub async fn on_connect(&mut self) -> Result<(), ChatError> {
        if self.state != ConnectionState::Pending {
            return Err(ChatError::ConnectionClosed);
        }

        if let Err(e) = self
            .registry
            .subscribe(&self.group, self.id, self.mailbox.clone())
            .await
        {
            self.state = ConnectionState::Closed;
            return Err(e);
        }

        self.state = ConnectionState::Open;
        info!(connection_id = self.id, group = %self.group, "Joined group");
        Ok(())
    }

    /// Leaves the group and closes the connection.
    ///
    /// Returns false if the connection was already closed.
    pub async fn on_disconnect(&mut self, code: Option<u16>) -> bool {
        match self.state {
            ConnectionState::Closed => false,
            ConnectionState::Pending => {
                self.state = ConnectionState::Closed;
                true
            }
            ConnectionState::Open => {
                self.registry.unsubscribe(&self.group, self.id).await;
                self.state = ConnectionState::Closed;
                info!(
                    connection_id = self.id,
                    group = %self.group,
                    code = ?code,
                    "Left group"
                );
                true
            }
        }
    }

    /// Publishes a client frame to the group.
    ///
    /// Returns the number of members the message reached.
    ///
    /// # Errors
    ///
    /// - [`ChatError::ConnectionClosed`] if the connection is not open.
    /// - [`ChatError::MalformedPayload`] if the frame is not a chat message;
    ///   the connection stays open and nothing is published.
    /// - [`ChatError::RegistryUnavailable`] if the publish was dropped.
    pub async fn on_receive(&self, text: &str) -> Result<usize, ChatError> {
        if !self.is_open() {
            return Err(ChatError::ConnectionClosed);
        }

        let chat = ChatMessage::decode(text)?;
        let delivered = self
            .registry
            .publish(&self.group, Envelope::chat_message(chat.message))
            .await?;

        debug!(
            connection_id = self.id,
            group = %self.group,
            delivered,
            "Published chat message"
        );
        Ok(delivered)
    }

    /// Pushes a group event to the client.
    ///
    /// # Errors
    ///
    /// - [`ChatError::ConnectionClosed`] if the connection is not open or the
    ///   client writer has gone away.
    /// - [`ChatError::UnknownEventType`] for events other than chat messages.
    /// - [`ChatError::MalformedPayload`] for a chat event without a message.
    pub async fn on_group_event(&self, envelope: Envelope) -> Result<(), ChatError> {
        if !self.is_open() {
            return Err(ChatError::ConnectionClosed);
        }

        match envelope.event()? {
            GroupEvent::ChatMessage(chat) => self
                .outbound
                .send(chat)
                .await
                .map_err(|_| ChatError::ConnectionClosed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ws::registry::InMemoryGroupRegistry;
    use crate::ws::room::RoomNamePolicy;

    struct Harness {
        connection: Connection,
        mailbox_rx: mpsc::Receiver<Envelope>,
        outbound_rx: mpsc::Receiver<ChatMessage>,
    }

    fn harness(registry: &Arc<InMemoryGroupRegistry>, room: &str) -> Harness {
        let room = RoomName::parse(room, RoomNamePolicy::Strict).expect("room");
        let (mailbox, mailbox_rx) = mpsc::channel(16);
        let (outbound, outbound_rx) = mpsc::channel(16);
        let registry: Arc<dyn GroupRegistry> = Arc::clone(registry) as Arc<dyn GroupRegistry>;
        Harness {
            connection: Connection::new(room, registry, mailbox, outbound),
            mailbox_rx,
            outbound_rx,
        }
    }

    #[test]
    fn test_next_connection_id() {
        let id1 = next_connection_id();
        let id2 = next_connection_id();
        assert!(id2 > id1);
    }

    #[tokio::test]
    async fn test_connection_new_is_pending() {
        let registry = Arc::new(InMemoryGroupRegistry::new());
        let h = harness(&registry, "room_1");
        assert_eq!(h.connection.state(), ConnectionState::Pending);
        assert_eq!(h.connection.group().as_str(), "chat_room_1");
        assert_eq!(h.connection.room().as_str(), "room_1");
        assert_eq!(registry.group_count().await, 0);
    }

    #[tokio::test]
    async fn test_on_connect_subscribes() {
        let registry = Arc::new(InMemoryGroupRegistry::new());
        let mut h = harness(&registry, "room_1");

        h.connection.on_connect().await.expect("connect");

        assert!(h.connection.is_open());
        assert_eq!(registry.member_count(h.connection.group()).await, 1);
    }

    #[tokio::test]
    async fn test_on_connect_registry_unavailable() {
        let registry = Arc::new(InMemoryGroupRegistry::new());
        registry.close().await;
        let mut h = harness(&registry, "room_1");

        let err = h.connection.on_connect().await.expect_err("unavailable");

        assert_eq!(err, ChatError::RegistryUnavailable);
        assert_eq!(h.connection.state(), ConnectionState::Closed);
        assert_eq!(registry.group_count().await, 0);
    }

    #[tokio::test]
    async fn test_on_connect_twice_rejected() {
        let registry = Arc::new(InMemoryGroupRegistry::new());
        let mut h = harness(&registry, "room_1");

        h.connection.on_connect().await.expect("connect");
        let err = h.connection.on_connect().await.expect_err("second connect");
        assert_eq!(err, ChatError::ConnectionClosed);
        assert!(h.connection.is_open());
    }

    #[tokio::test]
    async fn test_on_receive_publishes_to_group_including_self() {
        let registry = Arc::new(InMemoryGroupRegistry::new());
        let mut a = harness(&registry, "room_1");
        let mut b = harness(&registry, "room_1");
        a.connection.on_connect().await.expect("connect");
        b.connection.on_connect().await.expect("connect");

        let delivered = a
            .connection
            .on_receive(r#"{"message":"hello"}"#)
            .await
            .expect("receive");

        assert_eq!(delivered, 2);
        assert_eq!(
            a.mailbox_rx.recv().await,
            Some(Envelope::chat_message("hello"))
        );
        assert_eq!(
            b.mailbox_rx.recv().await,
            Some(Envelope::chat_message("hello"))
        );
    }

    #[tokio::test]
    async fn test_on_receive_malformed_keeps_connection_open() {
        let registry = Arc::new(InMemoryGroupRegistry::new());
        let mut a = harness(&registry, "room_1");
        a.connection.on_connect().await.expect("connect");

        for frame in ["not json", r#"{"msg":"hi"}"#, r#"{"message":null}"#] {
            let err = a.connection.on_receive(frame).await.expect_err("malformed");
            assert!(matches!(err, ChatError::MalformedPayload(_)));
        }

        assert!(a.connection.is_open());
        assert!(a.mailbox_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_on_receive_array_frame_not_published() {
        let registry = Arc::new(InMemoryGroupRegistry::new());
        let mut a = harness(&registry, "room_1");
        let mut b = harness(&registry, "room_1");
        a.connection.on_connect().await.expect("connect");
        b.connection.on_connect().await.expect("connect");

        let err = a
            .connection
            .on_receive(r#"["pwned"]"#)
            .await
            .expect_err("array frame");

        assert!(matches!(err, ChatError::MalformedPayload(_)));
        assert!(a.mailbox_rx.try_recv().is_err());
        assert!(b.mailbox_rx.try_recv().is_err());
        assert!(a.connection.is_open());
    }

    #[tokio::test]
    async fn test_on_receive_after_close() {
        let registry = Arc::new(InMemoryGroupRegistry::new());
        let mut a = harness(&registry, "room_1");
        a.connection.on_connect().await.expect("connect");
        a.connection.on_disconnect(None).await;

        let err = a
            .connection
            .on_receive(r#"{"message":"late"}"#)
            .await
            .expect_err("closed");
        assert_eq!(err, ChatError::ConnectionClosed);
    }

    #[tokio::test]
    async fn test_on_receive_pending_rejected() {
        let registry = Arc::new(InMemoryGroupRegistry::new());
        let a = harness(&registry, "room_1");

        let err = a
            .connection
            .on_receive(r#"{"message":"early"}"#)
            .await
            .expect_err("pending");
        assert_eq!(err, ChatError::ConnectionClosed);
    }

    #[tokio::test]
    async fn test_on_receive_registry_unavailable() {
        let registry = Arc::new(InMemoryGroupRegistry::new());
        let mut a = harness(&registry, "room_1");
        a.connection.on_connect().await.expect("connect");
        registry.close().await;

        let err = a
            .connection
            .on_receive(r#"{"message":"hello"}"#)
            .await
            .expect_err("unavailable");
        assert_eq!(err, ChatError::RegistryUnavailable);
        assert!(a.connection.is_open());
    }

    #[tokio::test]
    async fn test_on_disconnect_is_idempotent() {
        let registry = Arc::new(InMemoryGroupRegistry::new());
        let mut a = harness(&registry, "room_1");
        a.connection.on_connect().await.expect("connect");

        assert!(a.connection.on_disconnect(Some(1000)).await);
        assert!(!a.connection.on_disconnect(Some(1000)).await);
        assert_eq!(a.connection.state(), ConnectionState::Closed);
        assert_eq!(registry.group_count().await, 0);
    }

    #[tokio::test]
    async fn test_on_disconnect_from_pending() {
        let registry = Arc::new(InMemoryGroupRegistry::new());
        let mut a = harness(&registry, "room_1");

        assert!(a.connection.on_disconnect(None).await);
        assert_eq!(a.connection.state(), ConnectionState::Closed);

        let err = a.connection.on_connect().await.expect_err("closed");
        assert_eq!(err, ChatError::ConnectionClosed);
    }

    #[tokio::test]
    async fn test_disconnected_member_gets_no_further_messages() {
        let registry = Arc::new(InMemoryGroupRegistry::new());
        let mut a = harness(&registry, "room_1");
        let mut b = harness(&registry, "room_1");
        a.connection.on_connect().await.expect("connect");
        b.connection.on_connect().await.expect("connect");

        b.connection.on_disconnect(None).await;
        let delivered = a
            .connection
            .on_receive(r#"{"message":"bye"}"#)
            .await
            .expect("receive");

        assert_eq!(delivered, 1);
        assert!(b.mailbox_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_on_group_event_forwards_message() {
        let registry = Arc::new(InMemoryGroupRegistry::new());
        let mut a = harness(&registry, "room_1");
        a.connection.on_connect().await.expect("connect");

        a.connection
            .on_group_event(Envelope::chat_message("hello"))
            .await
            .expect("deliver");

        assert_eq!(a.outbound_rx.recv().await, Some(ChatMessage::new("hello")));
    }

    #[tokio::test]
    async fn test_on_group_event_unknown_type() {
        let registry = Arc::new(InMemoryGroupRegistry::new());
        let mut a = harness(&registry, "room_1");
        a.connection.on_connect().await.expect("connect");

        let err = a
            .connection
            .on_group_event(Envelope::new("chat.typing"))
            .await
            .expect_err("unknown");

        assert_eq!(err, ChatError::UnknownEventType("chat.typing".to_string()));
        assert!(a.outbound_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_on_group_event_after_close_is_dropped() {
        let registry = Arc::new(InMemoryGroupRegistry::new());
        let mut a = harness(&registry, "room_1");
        a.connection.on_connect().await.expect("connect");
        a.connection.on_disconnect(None).await;

        let err = a
            .connection
            .on_group_event(Envelope::chat_message("late"))
            .await
            .expect_err("closed");

        assert_eq!(err, ChatError::ConnectionClosed);
        assert!(a.outbound_rx.try_recv().is_err());
    }
}
