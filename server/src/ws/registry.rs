//! Group registry for room membership and fan-out.
//!
//! Keeps the mapping from group to subscribed connections and delivers
//! envelopes to each member's mailbox.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::messages::Envelope;
use super::room::GroupName;
use crate::error::ChatError;

/// Queue a registry delivers envelopes into for one connection.
pub type Mailbox = mpsc::Sender<Envelope>;

/// Membership and publish operations the connection handler relies on.
#[async_trait]
pub trait GroupRegistry: Send + Sync {
    /// Registers a connection's mailbox under a group.
    ///
    /// Subscribing the same pair again replaces the mailbox.
    async fn subscribe(
        &self,
        group: &GroupName,
        connection_id: u64,
        mailbox: Mailbox,
    ) -> Result<(), ChatError>;

    /// Removes a connection from a group. No-op if it is not a member.
    async fn unsubscribe(&self, group: &GroupName, connection_id: u64);

    /// Delivers an envelope to every current member of a group, the
    /// publisher included.
    ///
    /// Returns the number of mailboxes that accepted the envelope.
    async fn publish(&self, group: &GroupName, envelope: Envelope) -> Result<usize, ChatError>;

    /// Returns the number of non-empty groups.
    async fn group_count(&self) -> usize;

    /// Returns the number of members in a group.
    async fn member_count(&self, group: &GroupName) -> usize;

    /// Returns false once the registry stops accepting work.
    fn is_available(&self) -> bool;

    /// Stops accepting subscriptions and publishes.
    async fn close(&self);
}

/// In-process registry guarded by an async read-write lock.
#[derive(Debug, Default)]
pub struct InMemoryGroupRegistry {
    /// Map from group to member mailboxes keyed by connection ID.
    groups: Arc<RwLock<HashMap<GroupName, HashMap<u64, Mailbox>>>>,

    /// Set once the registry stops accepting work.
    closed: AtomicBool,
}

impl InMemoryGroupRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true once the registry has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> Result<(), ChatError> {
        if self.is_closed() {
            return Err(ChatError::RegistryUnavailable);
        }
        Ok(())
    }
}

#[async_trait]
impl GroupRegistry for InMemoryGroupRegistry {
    async fn subscribe(
        &self,
        group: &GroupName,
        connection_id: u64,
        mailbox: Mailbox,
    ) -> Result<(), ChatError> {
        self.ensure_open()?;

        let mut groups = self.groups.write().await;
        groups
            .entry(group.clone())
            .or_default()
            .insert(connection_id, mailbox);
        Ok(())
    }

    async fn unsubscribe(&self, group: &GroupName, connection_id: u64) {
        let mut groups = self.groups.write().await;
        if let Some(members) = groups.get_mut(group) {
            members.remove(&connection_id);
            if members.is_empty() {
                groups.remove(group);
            }
        }
    }

    async fn publish(&self, group: &GroupName, envelope: Envelope) -> Result<usize, ChatError> {
        self.ensure_open()?;

        let groups = self.groups.read().await;
        let Some(members) = groups.get(group) else {
            return Ok(0);
        };

        let mut delivered = 0;
        for (connection_id, mailbox) in members {
            match mailbox.try_send(envelope.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    warn!(
                        group = %group,
                        connection_id,
                        "Mailbox full, dropping event"
                    );
                }
                Err(TrySendError::Closed(_)) => {
                    debug!(
                        group = %group,
                        connection_id,
                        "Mailbox closed, skipping member"
                    );
                }
            }
        }

        Ok(delivered)
    }

    async fn group_count(&self) -> usize {
        self.groups.read().await.len()
    }

    async fn member_count(&self, group: &GroupName) -> usize {
        let groups = self.groups.read().await;
        groups.get(group).map(HashMap::len).unwrap_or(0)
    }

    fn is_available(&self) -> bool {
        !self.is_closed()
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.groups.write().await.clear();
        debug!("Group registry closed");
    }
}
