// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Live broadcast hub for external observers.
//!
//! Observers connect over WebSocket, register for one community, and
//! receive analysis envelopes for it. Control messages other than
//! registration are handed to a [`HubHandler`] supplied by the pipeline.

pub mod auth;
pub mod envelope;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod ws;

use async_trait::async_trait;
use watchtower_core::WatchtowerError;

pub use auth::AuthConfig;
pub use envelope::{Envelope, message_types};
pub use protocol::{AnalysisKind, ControlMessage, parse_control};
pub use registry::{BroadcastHub, ConnectionId, Frame, HeartbeatReport, HubCounts};
pub use server::{HubServer, HubState, router, spawn_heartbeat};

/// Receives the control messages the hub does not handle itself.
#[async_trait]
pub trait HubHandler: Send + Sync + 'static {
    /// Handles a `message_stream` or `analysis_request` from `connection`.
    /// A returned envelope is sent back to that connection only.
    async fn handle(
        &self,
        connection: ConnectionId,
        message: ControlMessage,
    ) -> Result<Option<Envelope>, WatchtowerError>;

    /// Current health snapshot, served at `GET /health`.
    async fn health(&self) -> serde_json::Value;
}
