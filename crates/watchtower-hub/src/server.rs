// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hub HTTP server built on axum.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{Json, Router, extract::State, routing::get};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};
use watchtower_core::WatchtowerError;

use crate::auth::AuthConfig;
use crate::registry::BroadcastHub;
use crate::{HubHandler, ws};

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct HubState {
    pub hub: BroadcastHub,
    pub auth: AuthConfig,
    pub handler: Arc<dyn HubHandler>,
    /// `serverId` used on envelopes that are not community-scoped.
    pub server_name: String,
}

/// Routes:
/// - GET /health (public)
/// - GET /ws (auth during handshake)
pub fn router(state: HubState) -> Router {
    Router::new()
        .route("/health", get(get_health))
        .route("/ws", get(ws::ws_handler))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn get_health(State(state): State<HubState>) -> Json<serde_json::Value> {
    Json(state.handler.health().await)
}

/// A bound, not yet serving, hub listener.
pub struct HubServer {
    listener: tokio::net::TcpListener,
}

impl HubServer {
    pub async fn bind(host: &str, port: u16) -> Result<Self, WatchtowerError> {
        let addr = format!("{host}:{port}");
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| WatchtowerError::Channel {
                message: format!("failed to bind hub to {addr}: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, WatchtowerError> {
        self.listener.local_addr().map_err(|e| WatchtowerError::Channel {
            message: format!("hub listener has no local address: {e}"),
            source: Some(Box::new(e)),
        })
    }

    /// Serves until `shutdown` is cancelled.
    pub async fn serve(
        self,
        state: HubState,
        shutdown: CancellationToken,
    ) -> Result<(), WatchtowerError> {
        if state.auth.is_open() {
            warn!("hub has no bearer token configured, observers are unauthenticated");
        }
        let addr = self.local_addr()?;
        info!("Hub server listening on {addr}");

        axum::serve(self.listener, router(state))
            .with_graceful_shutdown(shutdown.cancelled_owned())
            .await
            .map_err(|e| WatchtowerError::Channel {
                message: format!("hub server error: {e}"),
                source: Some(Box::new(e)),
            })
    }
}

/// Runs [`BroadcastHub::heartbeat_round`] every `interval` until cancelled.
pub fn spawn_heartbeat(
    hub: BroadcastHub,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let start = tokio::time::Instant::now() + interval;
        let mut ticker = tokio::time::interval_at(start, interval);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let report = hub.heartbeat_round().await;
                    debug!(pinged = report.pinged, reaped = report.reaped, "heartbeat round");
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Frame;

    #[tokio::test(start_paused = true)]
    async fn heartbeat_task_reaps_after_two_missed_rounds() {
        let hub = BroadcastHub::new();
        let (_id, mut rx) = hub.connect().await;
        let cancel = CancellationToken::new();
        let task = spawn_heartbeat(hub.clone(), Duration::from_secs(30), cancel.clone());

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(rx.recv().await, Some(Frame::Ping));
        assert_eq!(hub.counts().await.connections, 1);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(rx.recv().await, Some(Frame::Close));
        assert_eq!(hub.counts().await.connections, 0);

        cancel.cancel();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn answered_pings_keep_the_connection() {
        let hub = BroadcastHub::new();
        let (id, mut rx) = hub.connect().await;
        let cancel = CancellationToken::new();
        let task = spawn_heartbeat(hub.clone(), Duration::from_secs(30), cancel.clone());

        for _ in 0..3 {
            tokio::time::sleep(Duration::from_secs(30)).await;
            assert_eq!(rx.recv().await, Some(Frame::Ping));
            hub.mark_alive(id).await;
        }
        assert_eq!(hub.counts().await.connections, 1);

        cancel.cancel();
        task.await.unwrap();
    }
}
