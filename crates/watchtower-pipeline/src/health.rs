// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Health snapshots and the periodic health broadcast.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};
use tracing::debug;
use watchtower_hub::{Envelope, HubCounts, message_types};
use watchtower_scheduler::QueueStats;

use crate::Services;

/// Informational only; observers may ignore any field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSnapshot {
    pub status: &'static str,
    pub service: String,
    pub queues: BTreeMap<String, QueueStats>,
    pub hub: HubCounts,
    pub uptime_secs: u64,
    /// Resident set size, when the platform reports it.
    pub memory_bytes: Option<u64>,
    pub timestamp: DateTime<Utc>,
}

pub(crate) async fn snapshot(services: &Services) -> HealthSnapshot {
    let queues = services
        .scheduler
        .stats()
        .into_iter()
        .map(|(queue, stats)| (queue.to_string(), stats))
        .collect();
    HealthSnapshot {
        status: if services.scheduler.is_draining() {
            "draining"
        } else {
            "ok"
        },
        service: services.config.service.name.clone(),
        queues,
        hub: services.hub.counts().await,
        uptime_secs: services.started_at.elapsed().as_secs(),
        memory_bytes: resident_memory(),
        timestamp: Utc::now(),
    }
}

fn resident_memory() -> Option<u64> {
    let pid = sysinfo::get_current_pid().ok()?;
    let mut system = System::new();
    system.refresh_processes_specifics(
        ProcessesToUpdate::Some(&[pid]),
        true,
        ProcessRefreshKind::nothing().with_memory(),
    );
    system.process(pid).map(|p| p.memory())
}

/// Every `hub.health_interval_secs`: broadcast a snapshot to all observers
/// and prune idle per-key state.
pub(crate) fn spawn_broadcast(services: &Arc<Services>) {
    let interval = Duration::from_secs(services.config.hub.health_interval_secs.max(1));
    let services = Arc::clone(services);
    services.tasks.clone().spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // Skip the first immediate tick.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = services.stop.cancelled() => break,
                _ = ticker.tick() => {
                    let health = snapshot(&services).await;
                    let data = serde_json::to_value(&health).unwrap_or_default();
                    let envelope = Envelope::new(
                        message_types::HEALTH,
                        services.config.service.name.clone(),
                        data,
                    );
                    let delivered = services.hub.broadcast_to_all(&envelope).await;
                    services.responder.prune();
                    services.behavior_locks.prune();
                    services.community_locks.prune();
                    debug!(delivered, "health broadcast");
                }
            }
        }
    });
}
