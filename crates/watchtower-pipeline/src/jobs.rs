// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Job payloads, priorities and the processor registered on every queue.

use std::sync::Weak;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use watchtower_core::WatchtowerError;
use watchtower_core::types::{BehaviorKey, IngestedMessage};
use watchtower_scheduler::job::{JobContext, JobHandle, JobRequest, JobType};
use watchtower_scheduler::{JobProcessor, Scheduler};

use crate::Services;

pub const REALTIME_PRIORITY: i32 = 10;
pub const ANALYSIS_PRIORITY: i32 = 5;
pub const BEHAVIOR_PRIORITY: i32 = 3;
pub const PROFILING_PRIORITY: i32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorJob {
    pub user_id: String,
    pub community_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileJob {
    pub community_id: String,
}

pub(crate) fn behavior_request(
    user_id: &str,
    community_id: &str,
) -> Result<JobRequest, WatchtowerError> {
    let payload = serde_json::to_value(BehaviorJob {
        user_id: user_id.to_string(),
        community_id: community_id.to_string(),
    })?;
    Ok(JobRequest::new(JobType::AnalyzeBehavior, payload).priority(BEHAVIOR_PRIORITY))
}

pub(crate) fn profile_request(community_id: &str) -> Result<JobRequest, WatchtowerError> {
    let payload = serde_json::to_value(ProfileJob {
        community_id: community_id.to_string(),
    })?;
    Ok(JobRequest::new(JobType::ProfileCommunity, payload).priority(PROFILING_PRIORITY))
}

pub(crate) fn enqueue_behavior(
    scheduler: &Scheduler,
    user_id: &str,
    community_id: &str,
) -> Result<JobHandle, WatchtowerError> {
    scheduler.enqueue(behavior_request(user_id, community_id)?)
}

/// Dispatches by job type, so a job submitted to a non-default queue
/// still runs the right work.
pub(crate) struct JobRouter {
    services: Weak<Services>,
}

impl JobRouter {
    pub(crate) fn new(services: Weak<Services>) -> Self {
        Self { services }
    }
}

#[async_trait]
impl JobProcessor for JobRouter {
    async fn process(&self, job: JobContext) -> Result<(), WatchtowerError> {
        let Some(services) = self.services.upgrade() else {
            return Err(WatchtowerError::ShuttingDown);
        };
        match job.job_type {
            JobType::RealtimeBroadcast => {
                let message: IngestedMessage = job.payload_as()?;
                services.broadcast_realtime(&message).await
            }
            JobType::AnalyzeMessage => {
                let message: IngestedMessage = job.payload_as()?;
                services.analyze_message(message).await
            }
            JobType::AnalyzeBehavior => {
                let payload: BehaviorJob = job.payload_as()?;
                let key = BehaviorKey::new(payload.user_id, payload.community_id);
                services.analyze_behavior(&key).await.map(|_| ())
            }
            JobType::ProfileCommunity => {
                let payload: ProfileJob = job.payload_as()?;
                let last_attempt = job.attempt >= job.max_attempts;
                services
                    .profile_community(&payload.community_id, last_attempt)
                    .await
                    .map(|_| ())
            }
        }
    }
}
