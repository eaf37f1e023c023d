// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Job model: queue names, job types, states, requests and snapshots.

use std::cmp::Ordering;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;
use watchtower_core::WatchtowerError;

/// The four named queues.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum QueueName {
    Analysis,
    Profiling,
    Behavior,
    Realtime,
}

impl QueueName {
    pub const ALL: [QueueName; 4] = [
        QueueName::Analysis,
        QueueName::Profiling,
        QueueName::Behavior,
        QueueName::Realtime,
    ];

    /// Parses a queue name, rejecting unknown names as a permanent error.
    pub fn parse(name: &str) -> Result<Self, WatchtowerError> {
        QueueName::from_str(name).map_err(|_| WatchtowerError::UnknownQueue(name.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobType {
    AnalyzeMessage,
    ProfileCommunity,
    AnalyzeBehavior,
    RealtimeBroadcast,
}

impl JobType {
    /// The queue this job type is normally submitted to.
    pub fn default_queue(self) -> QueueName {
        match self {
            JobType::AnalyzeMessage => QueueName::Analysis,
            JobType::ProfileCommunity => QueueName::Profiling,
            JobType::AnalyzeBehavior => QueueName::Behavior,
            JobType::RealtimeBroadcast => QueueName::Realtime,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobState {
    Waiting,
    Active,
    Completed,
    Failed,
    Delayed,
}

impl JobState {
    pub fn is_finished(self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

/// A job submission.
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub queue: QueueName,
    pub job_type: JobType,
    pub payload: serde_json::Value,
    /// Higher dispatches sooner.
    pub priority: i32,
    /// Overrides the queue's configured attempts.
    pub attempts: Option<u32>,
    /// Hold the job as delayed for this long before it becomes eligible.
    pub delay: Option<Duration>,
}

impl JobRequest {
    /// A request on the job type's default queue at priority 0.
    pub fn new(job_type: JobType, payload: serde_json::Value) -> Self {
        Self {
            queue: job_type.default_queue(),
            job_type,
            payload,
            priority: 0,
            attempts: None,
            delay: None,
        }
    }

    pub fn on_queue(mut self, queue: QueueName) -> Self {
        self.queue = queue;
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn attempts(mut self, attempts: u32) -> Self {
        self.attempts = Some(attempts);
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// Stable reference to a submitted job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobHandle {
    pub id: Uuid,
    pub queue: QueueName,
}

/// Read-only view of a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub id: Uuid,
    pub queue: QueueName,
    pub job_type: JobType,
    pub priority: i32,
    pub state: JobState,
    pub attempts: u32,
    pub max_attempts: u32,
    pub last_error: Option<String>,
    pub enqueued_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// What a processor sees of the job it runs.
#[derive(Debug, Clone)]
pub struct JobContext {
    pub id: Uuid,
    pub queue: QueueName,
    pub job_type: JobType,
    pub payload: serde_json::Value,
    /// 1-based attempt number.
    pub attempt: u32,
    pub max_attempts: u32,
}

impl JobContext {
    /// Deserializes the payload, mapping failures to a permanent error.
    pub fn payload_as<T: serde::de::DeserializeOwned>(&self) -> Result<T, WatchtowerError> {
        Ok(serde_json::from_value(self.payload.clone())?)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Job {
    pub id: Uuid,
    pub queue: QueueName,
    pub job_type: JobType,
    pub payload: serde_json::Value,
    pub priority: i32,
    pub seq: u64,
    pub state: JobState,
    pub attempts: u32,
    pub max_attempts: u32,
    pub last_error: Option<String>,
    pub enqueued_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            id: self.id,
            queue: self.queue,
            job_type: self.job_type,
            priority: self.priority,
            state: self.state,
            attempts: self.attempts,
            max_attempts: self.max_attempts,
            last_error: self.last_error.clone(),
            enqueued_at: self.enqueued_at,
            finished_at: self.finished_at,
        }
    }

    pub fn context(&self) -> JobContext {
        JobContext {
            id: self.id,
            queue: self.queue,
            job_type: self.job_type,
            payload: self.payload.clone(),
            attempt: self.attempts,
            max_attempts: self.max_attempts,
        }
    }
}

/// Heap entry: higher priority first, then lower sequence (FIFO).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Ready {
    pub priority: i32,
    pub seq: u64,
    pub id: Uuid,
}

impl Ord for Ready {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Ready {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BinaryHeap;

    #[test]
    fn queue_names_parse() {
        assert_eq!(QueueName::parse("realtime").unwrap(), QueueName::Realtime);
        assert_eq!(QueueName::Behavior.to_string(), "behavior");
        let err = QueueName::parse("bogus").unwrap_err();
        assert!(matches!(err, WatchtowerError::UnknownQueue(ref q) if q == "bogus"));
        assert!(!err.is_transient());
    }

    #[test]
    fn ready_orders_by_priority_then_fifo() {
        let mut heap = BinaryHeap::new();
        let ids: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        heap.push(Ready { priority: 1, seq: 0, id: ids[0] });
        heap.push(Ready { priority: 5, seq: 1, id: ids[1] });
        heap.push(Ready { priority: 5, seq: 2, id: ids[2] });
        heap.push(Ready { priority: 1, seq: 3, id: ids[3] });
        let order: Vec<Uuid> = std::iter::from_fn(|| heap.pop().map(|r| r.id)).collect();
        assert_eq!(order, vec![ids[1], ids[2], ids[0], ids[3]]);
    }

    #[test]
    fn request_builder_defaults_queue_from_type() {
        let r = JobRequest::new(JobType::ProfileCommunity, serde_json::json!({}));
        assert_eq!(r.queue, QueueName::Profiling);
        let r = r.on_queue(QueueName::Analysis).priority(3).attempts(2);
        assert_eq!(r.queue, QueueName::Analysis);
        assert_eq!(r.priority, 3);
        assert_eq!(r.attempts, Some(2));
    }
}
