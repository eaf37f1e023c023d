// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `watchtower serve` command implementation.
//!
//! Opens SQLite storage, builds the optional completion adapter, wires the
//! pipeline over the observer bridge and serves the hub until a shutdown
//! signal arrives. On shutdown the scheduler drains first, then the hub
//! stops, then storage closes.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use watchtower_config::WatchtowerConfig;
use watchtower_core::{CompletionAdapter, StorageAdapter, ThreadRandom, WatchtowerError};
use watchtower_hub::{AuthConfig, BroadcastHub, HubServer, HubState, spawn_heartbeat};
use watchtower_openai::OpenAiCompletion;
use watchtower_pipeline::{Pipeline, PipelineDeps};
use watchtower_storage::SqliteStorage;

use crate::bridge::ObserverChannel;
use crate::shutdown;

pub async fn run_serve(config: WatchtowerConfig) -> Result<(), WatchtowerError> {
    init_tracing(&config.service.log_level);

    info!(service = %config.service.name, "starting watchtower serve");

    // Startup failures here are fatal.
    let storage = {
        let storage = SqliteStorage::new(config.storage.clone());
        storage.initialize().await?;
        Arc::new(storage)
    };
    info!(path = %config.storage.database_path, "storage ready");

    let completion: Option<Arc<dyn CompletionAdapter>> = if config.completion.enabled {
        let adapter = OpenAiCompletion::new(&config.completion)?;
        info!(model = %config.completion.model, "completion adapter enabled");
        Some(Arc::new(adapter))
    } else {
        info!("completion adapter disabled, replies use templates only");
        None
    };

    let hub = BroadcastHub::new();
    let pipeline = Pipeline::with_hub(
        config.clone(),
        PipelineDeps {
            storage: storage.clone(),
            channel: Arc::new(ObserverChannel::new(hub.clone())),
            completion,
            random: Arc::new(ThreadRandom),
        },
        hub.clone(),
    );
    pipeline.start();

    let cancel = shutdown::install_signal_handler();
    let hub_stop = CancellationToken::new();

    let server = if config.hub.enabled {
        let server = HubServer::bind(&config.hub.host, config.hub.port).await?;
        let state = HubState {
            hub: hub.clone(),
            auth: AuthConfig {
                bearer_token: config.hub.bearer_token.clone(),
            },
            handler: Arc::new(pipeline.clone()),
            server_name: config.service.name.clone(),
        };
        spawn_heartbeat(
            hub.clone(),
            Duration::from_secs(config.hub.heartbeat_interval_secs.max(1)),
            hub_stop.clone(),
        );
        let stop = hub_stop.clone();
        let fatal = cancel.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = server.serve(state, stop).await {
                error!(error = %e, "hub server failed, shutting down");
                fatal.cancel();
            }
        }))
    } else {
        info!("hub disabled, no observers can connect");
        None
    };

    cancel.cancelled().await;

    let report = pipeline
        .shutdown(Duration::from_secs(config.scheduler.shutdown_timeout_secs))
        .await;
    if !report.drained {
        warn!(
            active = report.active.len(),
            waiting = report.waiting.len(),
            delayed = report.delayed.len(),
            "jobs left unfinished at shutdown"
        );
    }

    hub_stop.cancel();
    if let Some(server) = server {
        if let Err(e) = server.await {
            warn!(error = %e, "hub server task ended abnormally");
        }
    }

    if let Err(e) = storage.close().await {
        warn!(error = %e, "storage close failed");
    }

    info!("watchtower serve shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("watchtower={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
