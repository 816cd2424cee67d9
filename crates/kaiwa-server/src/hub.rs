//! Connection registry and broadcast router.
//!
//! Every live WebSocket connection registers here with a snapshot of its
//! bound identity and an unbounded outbox; fan-out walks the registry and
//! filters recipients through the [`ChannelGuard`], keeping the authorization
//! policy out of the call sites. Delivery is best-effort synchronous fire at
//! the moment of the call; connections that join afterwards do not
//! retroactively receive anything.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{mpsc, RwLock};
use tracing::trace;

use kaiwa_core::{Channel, Identity, ServerEvent};

use crate::guard::{ChannelAction, ChannelGuard};

/// Opaque identifier for one live connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

#[cfg(test)]
impl ConnectionId {
    pub fn test_id() -> Self {
        Self(0)
    }
}

struct ConnectionHandle {
    /// Snapshot of the identity bound at handshake. None for unauthenticated
    /// connections, which receive presence updates but nothing channel-scoped.
    identity: Option<Identity>,
    sender: mpsc::UnboundedSender<ServerEvent>,
}

/// Registry of live connections with guarded subset broadcast.
#[derive(Default)]
pub struct ConnectionRegistry {
    next_id: AtomicU64,
    connections: RwLock<HashMap<ConnectionId, ConnectionHandle>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection, returning its id and the receiving end of its
    /// outbox.
    pub async fn register(
        &self,
        identity: Option<Identity>,
    ) -> (ConnectionId, mpsc::UnboundedReceiver<ServerEvent>) {
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::unbounded_channel();
        self.connections
            .write()
            .await
            .insert(id, ConnectionHandle { identity, sender: tx });
        (id, rx)
    }

    /// Drop a connection from the registry. Further broadcasts skip it.
    pub async fn remove(&self, id: ConnectionId) {
        self.connections.write().await.remove(&id);
    }

    /// Number of registered connections.
    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Connection ids whose handle satisfies `predicate`.
    pub async fn subset_where(
        &self,
        predicate: impl Fn(Option<&Identity>) -> bool,
    ) -> Vec<ConnectionId> {
        self.connections
            .read()
            .await
            .iter()
            .filter(|(_, handle)| predicate(handle.identity.as_ref()))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Deliver an event to one connection. Returns false if it is gone.
    pub async fn send_to(&self, id: ConnectionId, event: ServerEvent) -> bool {
        let connections = self.connections.read().await;
        match connections.get(&id) {
            Some(handle) => handle.sender.send(event).is_ok(),
            None => false,
        }
    }

    /// Emit to exactly the connections whose identity passes the guard for
    /// `channel` + `ReceiveBroadcast`. Returns the recipient count.
    pub async fn broadcast(
        &self,
        guard: &ChannelGuard,
        channel: Channel,
        event: ServerEvent,
    ) -> usize {
        let connections = self.connections.read().await;
        let mut recipients = 0;
        for (id, handle) in connections.iter() {
            if !guard.allowed(
                handle.identity.as_ref(),
                channel,
                ChannelAction::ReceiveBroadcast,
            ) {
                continue;
            }
            if handle.sender.send(event.clone()).is_ok() {
                recipients += 1;
            } else {
                trace!(connection_id = id.0, "Outbox closed, skipping");
            }
        }
        recipients
    }

    /// Emit to every live connection, authenticated or not (presence counts).
    pub async fn broadcast_all(&self, event: ServerEvent) -> usize {
        let connections = self.connections.read().await;
        connections
            .values()
            .filter(|handle| handle.sender.send(event.clone()).is_ok())
            .count()
    }

    /// Emit to every live connection except `sender` (facilitator relay).
    pub async fn broadcast_except(&self, sender: ConnectionId, event: ServerEvent) -> usize {
        let connections = self.connections.read().await;
        connections
            .iter()
            .filter(|(id, _)| **id != sender)
            .filter(|(_, handle)| handle.sender.send(event.clone()).is_ok())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kaiwa_core::Role;
    use uuid::Uuid;

    fn identity(role: Role) -> Identity {
        Identity {
            id: Uuid::new_v4(),
            display_name: "t".to_string(),
            avatar_url: None,
            role,
        }
    }

    fn presence(count: usize) -> ServerEvent {
        ServerEvent::PresenceCount { count }
    }

    #[tokio::test]
    async fn test_broadcast_admin_reaches_admins_only() {
        let registry = ConnectionRegistry::new();
        let guard = ChannelGuard::new();
        let (_, mut admin_rx) = registry.register(Some(identity(Role::Admin))).await;
        let (_, mut member_rx) = registry.register(Some(identity(Role::Member))).await;
        let (_, mut anon_rx) = registry.register(None).await;

        let count = registry
            .broadcast(&guard, Channel::Admin, presence(0))
            .await;
        assert_eq!(count, 1);
        assert!(admin_rx.try_recv().is_ok());
        assert!(member_rx.try_recv().is_err());
        assert!(anon_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_general_skips_unauthenticated() {
        let registry = ConnectionRegistry::new();
        let guard = ChannelGuard::new();
        let (_, mut member_rx) = registry.register(Some(identity(Role::Member))).await;
        let (_, mut anon_rx) = registry.register(None).await;

        let count = registry
            .broadcast(&guard, Channel::General, presence(0))
            .await;
        assert_eq!(count, 1);
        assert!(member_rx.try_recv().is_ok());
        assert!(anon_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_all_includes_unauthenticated() {
        let registry = ConnectionRegistry::new();
        let (_, mut member_rx) = registry.register(Some(identity(Role::Member))).await;
        let (_, mut anon_rx) = registry.register(None).await;

        assert_eq!(registry.broadcast_all(presence(2)).await, 2);
        assert!(member_rx.try_recv().is_ok());
        assert!(anon_rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_broadcast_except_skips_sender() {
        let registry = ConnectionRegistry::new();
        let (sender_id, mut sender_rx) = registry.register(Some(identity(Role::Member))).await;
        let (_, mut other_rx) = registry.register(Some(identity(Role::Member))).await;

        let count = registry.broadcast_except(sender_id, presence(0)).await;
        assert_eq!(count, 1);
        assert!(sender_rx.try_recv().is_err());
        assert!(other_rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_removed_connection_receives_nothing() {
        let registry = ConnectionRegistry::new();
        let guard = ChannelGuard::new();
        let (id, mut rx) = registry.register(Some(identity(Role::Member))).await;
        registry.remove(id).await;

        let count = registry
            .broadcast(&guard, Channel::General, presence(0))
            .await;
        assert_eq!(count, 0);
        assert!(rx.try_recv().is_err());
        assert_eq!(registry.len().await, 0);
    }

    #[tokio::test]
    async fn test_subset_where_filters_on_identity() {
        let registry = ConnectionRegistry::new();
        registry.register(Some(identity(Role::Admin))).await;
        registry.register(Some(identity(Role::Member))).await;
        registry.register(None).await;

        let admins = registry
            .subset_where(|id| id.map(|i| i.is_admin()).unwrap_or(false))
            .await;
        assert_eq!(admins.len(), 1);
    }
}
