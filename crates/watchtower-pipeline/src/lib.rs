// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service wiring for the analysis pipeline.
//!
//! A [`Pipeline`] is constructed once at process start from the
//! configuration and the external collaborators. It owns the scheduler, the
//! broadcast hub and the event bus, registers one job processor for every
//! queue, and exposes the ingest entry point plus the operator actions.

pub mod analysis;
mod behavior;
mod control;
mod discovery;
pub mod health;
pub mod jobs;
mod relay;

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};
use watchtower_analyzer::{AnalysisResult, Analyzer};
use watchtower_behavior::BehaviorScorer;
use watchtower_bus::EventBus;
use watchtower_config::model::WatchtowerConfig;
use watchtower_core::types::{BehaviorKey, IngestedMessage, UserBehaviorProfile};
use watchtower_core::{
    ChannelAdapter, CompletionAdapter, KeyedLocks, RandomSource, StorageAdapter, WatchtowerError,
};
use watchtower_hub::BroadcastHub;
use watchtower_profiler::CommunityProfiler;
use watchtower_responder::ContextualResponder;
use watchtower_scheduler::job::{JobHandle, JobRequest, JobType, QueueName};
use watchtower_scheduler::{Scheduler, ShutdownReport};

pub use health::HealthSnapshot;
pub use jobs::{BehaviorJob, ProfileJob};

/// External collaborators the pipeline is built over.
pub struct PipelineDeps {
    pub storage: Arc<dyn StorageAdapter>,
    pub channel: Arc<dyn ChannelAdapter>,
    pub completion: Option<Arc<dyn CompletionAdapter>>,
    pub random: Arc<dyn RandomSource>,
}

/// The two jobs created for one ingested message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestReceipt {
    pub realtime: JobHandle,
    pub analysis: JobHandle,
}

pub(crate) struct Services {
    pub config: WatchtowerConfig,
    pub storage: Arc<dyn StorageAdapter>,
    pub channel: Arc<dyn ChannelAdapter>,
    pub analyzer: Analyzer,
    pub scorer: BehaviorScorer,
    pub profiler: CommunityProfiler,
    pub responder: ContextualResponder,
    pub scheduler: Scheduler,
    pub hub: BroadcastHub,
    pub bus: EventBus,
    pub behavior_locks: KeyedLocks<BehaviorKey>,
    pub community_locks: KeyedLocks<String>,
    /// Communities with a profiling job queued or running.
    pub pending_discovery: Mutex<HashSet<String>>,
    pub io_timeout: Duration,
    pub started_at: Instant,
    /// Background loops and delayed reply deliveries.
    pub tasks: TaskTracker,
    pub stop: CancellationToken,
}

impl Services {
    /// Bounds a storage or channel call by the configured I/O timeout.
    pub(crate) async fn bounded<T>(
        &self,
        fut: impl Future<Output = Result<T, WatchtowerError>>,
    ) -> Result<T, WatchtowerError> {
        tokio::time::timeout(self.io_timeout, fut)
            .await
            .map_err(|_| WatchtowerError::Timeout {
                duration: self.io_timeout,
            })?
    }

    /// Enqueues work spawned by another job. Failures (usually a draining
    /// scheduler) are logged and do not fail the originating job.
    pub(crate) fn enqueue_follow_up(&self, request: JobRequest) -> Option<JobHandle> {
        let job_type = request.job_type;
        match self.scheduler.enqueue(request) {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(job_type = %job_type, error = %e, "follow-up job not enqueued");
                None
            }
        }
    }
}

/// Cloneable handle to the running pipeline.
#[derive(Clone)]
pub struct Pipeline {
    services: Arc<Services>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("scheduler", &self.services.scheduler)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    pub fn new(config: WatchtowerConfig, deps: PipelineDeps) -> Self {
        Self::with_hub(config, deps, BroadcastHub::new())
    }

    /// Builds over an existing hub, for channel adapters that deliver
    /// through observers.
    pub fn with_hub(config: WatchtowerConfig, deps: PipelineDeps, hub: BroadcastHub) -> Self {
        let bus = EventBus::default();
        let scheduler = Scheduler::new(&config.scheduler, Some(bus.clone()));
        let io_timeout = Duration::from_secs(config.scheduler.io_timeout_secs);

        let mut responder = ContextualResponder::new(
            &config.responder,
            &config.completion,
            config.service.bot_user_id.clone(),
            deps.storage.clone(),
            deps.random,
        );
        if let Some(completion) = deps.completion {
            responder = responder.with_completion(completion);
        }

        let services = Arc::new(Services {
            analyzer: Analyzer::new(),
            scorer: BehaviorScorer::new(&config.behavior),
            profiler: CommunityProfiler::new(io_timeout),
            responder,
            scheduler,
            hub,
            bus,
            behavior_locks: KeyedLocks::new(),
            community_locks: KeyedLocks::new(),
            pending_discovery: Mutex::new(HashSet::new()),
            io_timeout,
            started_at: Instant::now(),
            tasks: TaskTracker::new(),
            stop: CancellationToken::new(),
            storage: deps.storage,
            channel: deps.channel,
            config,
        });

        let router = Arc::new(jobs::JobRouter::new(Arc::downgrade(&services)));
        for queue in QueueName::ALL {
            services.scheduler.register(queue, router.clone());
        }

        Self { services }
    }

    /// Starts the scheduler workers, the event relay and the periodic
    /// health broadcast.
    pub fn start(&self) {
        self.services.scheduler.start();
        relay::spawn(&self.services);
        health::spawn_broadcast(&self.services);
        info!("pipeline started");
    }

    /// Entry point for every message from the chat platform: a real-time
    /// broadcast job and an analysis job.
    pub fn ingest(&self, message: IngestedMessage) -> Result<IngestReceipt, WatchtowerError> {
        for (field, value) in [
            ("id", &message.id),
            ("communityId", &message.community_id),
            ("channelId", &message.channel_id),
            ("authorId", &message.author_id),
        ] {
            if value.trim().is_empty() {
                return Err(WatchtowerError::Validation(format!(
                    "ingested message has empty {field}"
                )));
            }
        }

        let payload = serde_json::to_value(&message)?;
        let realtime = self.services.scheduler.enqueue(
            JobRequest::new(JobType::RealtimeBroadcast, payload.clone())
                .priority(jobs::REALTIME_PRIORITY),
        )?;
        let analysis = self.services.scheduler.enqueue(
            JobRequest::new(JobType::AnalyzeMessage, payload).priority(jobs::ANALYSIS_PRIORITY),
        )?;
        Ok(IngestReceipt { realtime, analysis })
    }

    /// Feature extraction only, nothing stored.
    pub fn analyze_text(&self, content: &str) -> AnalysisResult {
        self.services.analyzer.analyze(content)
    }

    pub fn request_behavior_analysis(
        &self,
        user_id: &str,
        community_id: &str,
    ) -> Result<JobHandle, WatchtowerError> {
        jobs::enqueue_behavior(&self.services.scheduler, user_id, community_id)
    }

    /// Queues a profiling pass unless one is already pending.
    pub fn request_profiling(&self, community_id: &str) -> Result<Option<JobHandle>, WatchtowerError> {
        self.services.request_discovery(community_id)
    }

    /// Moderator soft reset for a user in a community.
    pub async fn mark_user_trusted(
        &self,
        user_id: &str,
        community_id: &str,
    ) -> Result<UserBehaviorProfile, WatchtowerError> {
        self.services
            .mark_trusted(&BehaviorKey::new(user_id, community_id))
            .await
    }

    pub async fn health_snapshot(&self) -> HealthSnapshot {
        health::snapshot(&self.services).await
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.services.scheduler
    }

    pub fn hub(&self) -> &BroadcastHub {
        &self.services.hub
    }

    pub fn bus(&self) -> &EventBus {
        &self.services.bus
    }

    pub fn config(&self) -> &WatchtowerConfig {
        &self.services.config
    }

    /// Drains the scheduler, then stops background loops and waits for
    /// pending reply deliveries, all within `deadline`.
    pub async fn shutdown(&self, deadline: Duration) -> ShutdownReport {
        let started = tokio::time::Instant::now();
        let report = self.services.scheduler.shutdown(deadline).await;

        self.services.stop.cancel();
        self.services.tasks.close();
        let remaining = deadline.saturating_sub(started.elapsed());
        if tokio::time::timeout(remaining, self.services.tasks.wait())
            .await
            .is_err()
        {
            warn!(
                pending = self.services.tasks.len(),
                "background tasks still running at shutdown deadline"
            );
        }

        info!(
            drained = report.drained,
            active = report.active.len(),
            waiting = report.waiting.len(),
            delayed = report.delayed.len(),
            "pipeline shut down"
        );
        report
    }
}
