// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Observer connection registry and fan-out.
//!
//! Every mutation (connect, register, disconnect, heartbeat reap) takes the
//! write lock; broadcasts iterate under the read lock, so a broadcast never
//! sees a half-removed connection.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::envelope::Envelope;

/// Per-connection outbound buffer.
pub const CONNECTION_BUFFER: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// What the socket task writes to the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Text(Arc<str>),
    Ping,
    Close,
}

#[derive(Debug)]
struct Connection {
    community: Option<String>,
    awaiting_pong: bool,
    tx: mpsc::Sender<Frame>,
}

#[derive(Debug, Default)]
struct RegistryState {
    connections: HashMap<ConnectionId, Connection>,
    by_community: HashMap<String, HashSet<ConnectionId>>,
}

impl RegistryState {
    fn unindex(&mut self, id: ConnectionId, community: &str) {
        if let Some(set) = self.by_community.get_mut(community) {
            set.remove(&id);
            if set.is_empty() {
                self.by_community.remove(community);
            }
        }
    }

    fn remove(&mut self, id: ConnectionId) -> Option<Connection> {
        let conn = self.connections.remove(&id)?;
        if let Some(community) = conn.community.as_deref() {
            self.unindex(id, community);
        }
        Some(conn)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HubCounts {
    pub connections: usize,
    pub registrations: usize,
    pub communities: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeartbeatReport {
    pub pinged: usize,
    pub reaped: usize,
}

/// Cloneable handle to the shared observer registry.
#[derive(Debug, Clone, Default)]
pub struct BroadcastHub {
    state: Arc<RwLock<RegistryState>>,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a fresh, unregistered connection and returns the receiving end
    /// of its outbound frame queue.
    pub async fn connect(&self) -> (ConnectionId, mpsc::Receiver<Frame>) {
        let id = ConnectionId::new();
        let (tx, rx) = mpsc::channel(CONNECTION_BUFFER);
        self.state.write().await.connections.insert(
            id,
            Connection {
                community: None,
                awaiting_pong: false,
                tx,
            },
        );
        debug!(connection = %id, "observer connected");
        (id, rx)
    }

    /// Subscribes a connection to one community, replacing any earlier
    /// subscription. Returns false when the connection is gone.
    pub async fn register(&self, id: ConnectionId, community_id: &str) -> bool {
        let mut guard = self.state.write().await;
        let state = &mut *guard;
        let Some(conn) = state.connections.get_mut(&id) else {
            return false;
        };
        let previous = conn.community.replace(community_id.to_string());
        if let Some(previous) = previous.as_deref()
            && previous != community_id
        {
            state.unindex(id, previous);
        }
        state
            .by_community
            .entry(community_id.to_string())
            .or_default()
            .insert(id);
        info!(connection = %id, community_id, "observer registered");
        true
    }

    pub async fn disconnect(&self, id: ConnectionId) {
        if self.state.write().await.remove(id).is_some() {
            debug!(connection = %id, "observer disconnected");
        }
    }

    /// Records a pong (or any other sign of life) from the connection.
    pub async fn mark_alive(&self, id: ConnectionId) {
        if let Some(conn) = self.state.write().await.connections.get_mut(&id) {
            conn.awaiting_pong = false;
        }
    }

    /// Sends to exactly the connections registered for `community_id`.
    /// Returns how many accepted the frame; zero when nobody is watching.
    pub async fn broadcast_to_community(&self, community_id: &str, envelope: &Envelope) -> usize {
        let state = self.state.read().await;
        let Some(ids) = state.by_community.get(community_id) else {
            return 0;
        };
        let frame = Frame::Text(Arc::from(envelope.to_json()));
        ids.iter()
            .filter_map(|id| state.connections.get(id).map(|c| (id, c)))
            .filter(|(id, conn)| offer(**id, conn, frame.clone()))
            .count()
    }

    /// Sends to every live connection, registered or not.
    pub async fn broadcast_to_all(&self, envelope: &Envelope) -> usize {
        let state = self.state.read().await;
        let frame = Frame::Text(Arc::from(envelope.to_json()));
        state
            .connections
            .iter()
            .filter(|(id, conn)| offer(**id, conn, frame.clone()))
            .count()
    }

    pub async fn send_to(&self, id: ConnectionId, envelope: &Envelope) -> bool {
        let state = self.state.read().await;
        state
            .connections
            .get(&id)
            .is_some_and(|conn| offer(id, conn, Frame::Text(Arc::from(envelope.to_json()))))
    }

    /// One heartbeat round: connections that never answered the previous
    /// ping are closed and deregistered, every survivor is marked as
    /// awaiting a pong and pinged.
    pub async fn heartbeat_round(&self) -> HeartbeatReport {
        let mut state = self.state.write().await;
        let stale: Vec<ConnectionId> = state
            .connections
            .iter()
            .filter(|(_, conn)| conn.awaiting_pong)
            .map(|(id, _)| *id)
            .collect();

        for id in &stale {
            if let Some(conn) = state.remove(*id) {
                let _ = conn.tx.try_send(Frame::Close);
                info!(connection = %id, "reaped unresponsive observer");
            }
        }

        let mut pinged = 0;
        for (id, conn) in state.connections.iter_mut() {
            conn.awaiting_pong = true;
            if offer(*id, conn, Frame::Ping) {
                pinged += 1;
            }
        }

        HeartbeatReport {
            pinged,
            reaped: stale.len(),
        }
    }

    pub async fn counts(&self) -> HubCounts {
        let state = self.state.read().await;
        HubCounts {
            connections: state.connections.len(),
            registrations: state.by_community.values().map(HashSet::len).sum(),
            communities: state.by_community.len(),
        }
    }

    pub async fn community_of(&self, id: ConnectionId) -> Option<String> {
        self.state
            .read()
            .await
            .connections
            .get(&id)
            .and_then(|c| c.community.clone())
    }
}

/// Non-blocking enqueue; a full buffer drops the frame for that observer only.
fn offer(id: ConnectionId, conn: &Connection, frame: Frame) -> bool {
    match conn.tx.try_send(frame) {
        Ok(()) => true,
        Err(mpsc::error::TrySendError::Full(_)) => {
            warn!(connection = %id, "observer buffer full, dropping frame");
            false
        }
        Err(mpsc::error::TrySendError::Closed(_)) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(kind: &str, community: &str) -> Envelope {
        Envelope::new(kind, community, serde_json::json!({}))
    }

    fn drain(rx: &mut mpsc::Receiver<Frame>) -> Vec<Frame> {
        let mut out = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            out.push(frame);
        }
        out
    }

    #[tokio::test]
    async fn community_broadcast_skips_other_communities() {
        let hub = BroadcastHub::new();
        let (c1, mut rx1) = hub.connect().await;
        assert!(hub.register(c1, "C1").await);

        assert_eq!(hub.broadcast_to_community("C2", &env("x", "C2")).await, 0);
        assert!(drain(&mut rx1).is_empty());

        assert_eq!(hub.broadcast_to_community("C1", &env("x", "C1")).await, 1);
        assert_eq!(drain(&mut rx1).len(), 1);
    }

    #[tokio::test]
    async fn reregistering_moves_the_connection() {
        let hub = BroadcastHub::new();
        let (id, mut rx) = hub.connect().await;
        hub.register(id, "C1").await;
        hub.register(id, "C2").await;

        assert_eq!(hub.broadcast_to_community("C1", &env("x", "C1")).await, 0);
        assert_eq!(hub.broadcast_to_community("C2", &env("x", "C2")).await, 1);
        assert_eq!(drain(&mut rx).len(), 1);
        assert_eq!(
            hub.counts().await,
            HubCounts {
                connections: 1,
                registrations: 1,
                communities: 1
            }
        );
    }

    #[tokio::test]
    async fn broadcast_to_all_includes_unregistered() {
        let hub = BroadcastHub::new();
        let (a, _rx_a) = hub.connect().await;
        let (_b, _rx_b) = hub.connect().await;
        hub.register(a, "C1").await;
        assert_eq!(hub.broadcast_to_all(&env("health", "watchtower")).await, 2);
    }

    #[tokio::test]
    async fn register_unknown_connection_fails() {
        let hub = BroadcastHub::new();
        assert!(!hub.register(ConnectionId::new(), "C1").await);
        assert_eq!(hub.counts().await.registrations, 0);
    }

    #[tokio::test]
    async fn disconnect_clears_index() {
        let hub = BroadcastHub::new();
        let (id, _rx) = hub.connect().await;
        hub.register(id, "C1").await;
        hub.disconnect(id).await;
        assert_eq!(hub.counts().await, HubCounts::default());
        assert!(hub.community_of(id).await.is_none());
    }

    #[tokio::test]
    async fn heartbeat_reaps_connections_that_missed_a_ping() {
        let hub = BroadcastHub::new();
        let (lively, mut lively_rx) = hub.connect().await;
        let (silent, mut silent_rx) = hub.connect().await;
        hub.register(silent, "C1").await;

        let first = hub.heartbeat_round().await;
        assert_eq!(first, HeartbeatReport { pinged: 2, reaped: 0 });
        assert_eq!(drain(&mut lively_rx), vec![Frame::Ping]);
        assert_eq!(drain(&mut silent_rx), vec![Frame::Ping]);

        hub.mark_alive(lively).await;
        let second = hub.heartbeat_round().await;
        assert_eq!(second, HeartbeatReport { pinged: 1, reaped: 1 });
        assert_eq!(drain(&mut silent_rx), vec![Frame::Close]);
        assert_eq!(drain(&mut lively_rx), vec![Frame::Ping]);

        let counts = hub.counts().await;
        assert_eq!(counts.connections, 1);
        assert_eq!(counts.registrations, 0);
        assert_eq!(hub.broadcast_to_community("C1", &env("x", "C1")).await, 0);
    }

    #[tokio::test]
    async fn full_buffer_drops_only_that_frame() {
        let hub = BroadcastHub::new();
        let (id, mut rx) = hub.connect().await;
        hub.register(id, "C1").await;
        for _ in 0..CONNECTION_BUFFER {
            assert_eq!(hub.broadcast_to_community("C1", &env("x", "C1")).await, 1);
        }
        assert_eq!(hub.broadcast_to_community("C1", &env("x", "C1")).await, 0);
        assert_eq!(drain(&mut rx).len(), CONNECTION_BUFFER);
        assert_eq!(hub.broadcast_to_community("C1", &env("x", "C1")).await, 1);
    }
}
