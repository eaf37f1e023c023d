// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Multi-queue priority job scheduler.
//!
//! Each named queue holds a priority heap of waiting jobs (higher priority
//! first, FIFO within a priority) and runs `concurrency` worker tasks that
//! dispatch to the queue's [`JobProcessor`]. Failures are retried with the
//! queue's backoff while attempts remain and the error is transient;
//! permanent errors and exhausted jobs end in `failed`. Job state changes
//! follow `waiting -> active -> completed | failed`, with retries and
//! explicit delays passing through `delayed` back to `waiting`.
//!
//! Shutdown stops dispatch, waits for in-flight jobs up to a deadline and
//! reports anything left unfinished. Unfinished jobs stay queryable.

pub mod job;
pub mod policy;

use std::collections::{BinaryHeap, HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use watchtower_bus::{EventBus, WatchtowerEvent};
use watchtower_config::model::SchedulerConfig;
use watchtower_core::WatchtowerError;

pub use job::{JobContext, JobHandle, JobRequest, JobSnapshot, JobState, JobType, QueueName};
pub use policy::RetryPolicy;

use job::{Job, Ready};

/// Runs jobs for one queue.
#[async_trait]
pub trait JobProcessor: Send + Sync + 'static {
    async fn process(&self, job: JobContext) -> Result<(), WatchtowerError>;
}

/// Per-queue counters at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub waiting: usize,
    pub active: usize,
    /// Total completed since start.
    pub completed: u64,
    /// Total failed since start.
    pub failed: u64,
    pub delayed: usize,
    pub paused: bool,
}

/// Outcome of [`Scheduler::shutdown`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ShutdownReport {
    /// True when every in-flight job finished before the deadline.
    pub drained: bool,
    /// Jobs still running when the deadline hit.
    pub active: Vec<Uuid>,
    pub waiting: Vec<Uuid>,
    pub delayed: Vec<Uuid>,
}

#[derive(Default)]
struct QueueInner {
    waiting: BinaryHeap<Ready>,
    jobs: HashMap<Uuid, Job>,
    finished_completed: VecDeque<Uuid>,
    finished_failed: VecDeque<Uuid>,
    active: usize,
    delayed: usize,
    completed_total: u64,
    failed_total: u64,
}

struct Queue {
    name: QueueName,
    policy: RetryPolicy,
    paused: AtomicBool,
    inner: Mutex<QueueInner>,
    /// Signalled when work becomes eligible.
    ready: Notify,
    /// Signalled whenever a job finishes.
    finished: Notify,
}

impl Queue {
    fn lock(&self) -> MutexGuard<'_, QueueInner> {
        // A poisoned lock means a panic mid-update; the counters are still usable.
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }
}

struct Inner {
    queues: HashMap<QueueName, Arc<Queue>>,
    processors: Mutex<HashMap<QueueName, Arc<dyn JobProcessor>>>,
    seq: AtomicU64,
    draining: AtomicBool,
    started: AtomicBool,
    keep_completed: usize,
    keep_failed: usize,
    /// Stops dispatch of new jobs.
    stop: CancellationToken,
    /// Abandons in-flight jobs once the drain deadline passes.
    abort: CancellationToken,
    tracker: TaskTracker,
    bus: Option<EventBus>,
}

/// Cloneable handle to the scheduler.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("draining", &self.inner.draining.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl Scheduler {
    pub fn new(config: &SchedulerConfig, bus: Option<EventBus>) -> Self {
        let queue_configs = [
            (QueueName::Analysis, &config.analysis),
            (QueueName::Profiling, &config.profiling),
            (QueueName::Behavior, &config.behavior),
            (QueueName::Realtime, &config.realtime),
        ];
        let queues = queue_configs
            .into_iter()
            .map(|(name, cfg)| {
                let queue = Queue {
                    name,
                    policy: RetryPolicy::for_queue(name, cfg),
                    paused: AtomicBool::new(false),
                    inner: Mutex::new(QueueInner::default()),
                    ready: Notify::new(),
                    finished: Notify::new(),
                };
                (name, Arc::new(queue))
            })
            .collect();

        Self {
            inner: Arc::new(Inner {
                queues,
                processors: Mutex::new(HashMap::new()),
                seq: AtomicU64::new(0),
                draining: AtomicBool::new(false),
                started: AtomicBool::new(false),
                keep_completed: config.keep_completed,
                keep_failed: config.keep_failed,
                stop: CancellationToken::new(),
                abort: CancellationToken::new(),
                tracker: TaskTracker::new(),
                bus,
            }),
        }
    }

    /// Registers the processor for a queue. Must be called before [`start`](Self::start).
    pub fn register(&self, queue: QueueName, processor: Arc<dyn JobProcessor>) {
        self.inner
            .processors
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(queue, processor);
    }

    /// Spawns the worker pools. Calling it twice is a no-op.
    pub fn start(&self) {
        if self.inner.started.swap(true, Ordering::SeqCst) {
            return;
        }
        for queue in self.inner.queues.values() {
            for worker in 0..queue.policy.concurrency {
                let inner = self.inner.clone();
                let queue = queue.clone();
                self.inner
                    .tracker
                    .spawn(async move { worker_loop(inner, queue, worker).await });
            }
            info!(
                queue = %queue.name,
                concurrency = queue.policy.concurrency,
                attempts = queue.policy.max_attempts,
                "queue started"
            );
        }
    }

    fn queue(&self, name: QueueName) -> &Arc<Queue> {
        // Every QueueName variant is inserted in `new`.
        &self.inner.queues[&name]
    }

    /// Submits a job. Never waits for dispatch.
    pub fn enqueue(&self, request: JobRequest) -> Result<JobHandle, WatchtowerError> {
        if self.inner.draining.load(Ordering::SeqCst) {
            return Err(WatchtowerError::ShuttingDown);
        }
        let queue = self.queue(request.queue).clone();
        let id = Uuid::new_v4();
        let seq = self.inner.seq.fetch_add(1, Ordering::SeqCst);
        let delayed = request.delay.filter(|d| !d.is_zero());

        let job = Job {
            id,
            queue: request.queue,
            job_type: request.job_type,
            payload: request.payload,
            priority: request.priority,
            seq,
            state: if delayed.is_some() {
                JobState::Delayed
            } else {
                JobState::Waiting
            },
            attempts: 0,
            max_attempts: queue.policy.attempts_for(request.queue, request.attempts),
            last_error: None,
            enqueued_at: Utc::now(),
            finished_at: None,
        };
        let ready = Ready {
            priority: job.priority,
            seq,
            id,
        };

        {
            let mut inner = queue.lock();
            inner.jobs.insert(id, job);
            if delayed.is_some() {
                inner.delayed += 1;
            } else {
                inner.waiting.push(ready);
            }
        }

        match delayed {
            Some(delay) => schedule_promotion(&self.inner, queue, ready, delay),
            None => queue.ready.notify_one(),
        }
        debug!(queue = %request.queue, job_id = %id, job_type = %request.job_type, priority = request.priority, "job enqueued");
        Ok(JobHandle {
            id,
            queue: request.queue,
        })
    }

    /// Submits a job to a queue given by name.
    pub fn enqueue_named(
        &self,
        queue: &str,
        request: JobRequest,
    ) -> Result<JobHandle, WatchtowerError> {
        let queue = QueueName::parse(queue)?;
        self.enqueue(request.on_queue(queue))
    }

    /// Stops dispatch from a queue. In-flight jobs continue.
    pub fn pause(&self, queue: QueueName) {
        self.queue(queue).paused.store(true, Ordering::SeqCst);
        info!(queue = %queue, "queue paused");
    }

    pub fn resume(&self, queue: QueueName) {
        let q = self.queue(queue);
        q.paused.store(false, Ordering::SeqCst);
        q.ready.notify_waiters();
        info!(queue = %queue, "queue resumed");
    }

    pub fn stats(&self) -> HashMap<QueueName, QueueStats> {
        self.inner
            .queues
            .iter()
            .map(|(name, q)| {
                let inner = q.lock();
                let stats = QueueStats {
                    waiting: inner.waiting.len(),
                    active: inner.active,
                    completed: inner.completed_total,
                    failed: inner.failed_total,
                    delayed: inner.delayed,
                    paused: q.paused.load(Ordering::SeqCst),
                };
                (*name, stats)
            })
            .collect()
    }

    pub fn queue_stats(&self, queue: QueueName) -> QueueStats {
        self.stats().remove(&queue).unwrap_or_default()
    }

    /// Snapshot of a live or retained job.
    pub fn job(&self, id: Uuid) -> Option<JobSnapshot> {
        self.inner
            .queues
            .values()
            .find_map(|q| q.lock().jobs.get(&id).map(Job::snapshot))
    }

    /// Waits until the job completes or fails, up to `timeout`.
    pub async fn wait_for(&self, handle: JobHandle, timeout: Duration) -> Option<JobSnapshot> {
        let queue = self.queue(handle.queue).clone();
        let wait = async {
            loop {
                let notified = queue.finished.notified();
                tokio::pin!(notified);
                notified.as_mut().enable();
                let snapshot = queue.lock().jobs.get(&handle.id).map(Job::snapshot);
                match snapshot {
                    Some(snap) if snap.state.is_finished() => return Some(snap),
                    None => return None,
                    Some(_) => {}
                }
                notified.await;
            }
        };
        tokio::time::timeout(timeout, wait).await.ok().flatten()
    }

    pub fn is_draining(&self) -> bool {
        self.inner.draining.load(Ordering::SeqCst)
    }

    /// Stops accepting and dispatching jobs, then waits up to `deadline`
    /// for in-flight jobs. Jobs still running at the deadline are abandoned
    /// and left `active`.
    pub async fn shutdown(&self, deadline: Duration) -> ShutdownReport {
        self.inner.draining.store(true, Ordering::SeqCst);
        self.inner.stop.cancel();
        self.inner.tracker.close();
        for q in self.inner.queues.values() {
            q.ready.notify_waiters();
        }

        let drained = tokio::time::timeout(deadline, self.inner.tracker.wait())
            .await
            .is_ok();
        if !drained {
            warn!(?deadline, "scheduler drain deadline reached, abandoning in-flight jobs");
            self.inner.abort.cancel();
            self.inner.tracker.wait().await;
        }

        let mut report = ShutdownReport {
            drained,
            ..ShutdownReport::default()
        };
        for q in self.inner.queues.values() {
            let inner = q.lock();
            for job in inner.jobs.values() {
                match job.state {
                    JobState::Active => report.active.push(job.id),
                    JobState::Waiting => report.waiting.push(job.id),
                    JobState::Delayed => report.delayed.push(job.id),
                    JobState::Completed | JobState::Failed => {}
                }
            }
        }
        info!(
            drained,
            active = report.active.len(),
            waiting = report.waiting.len(),
            delayed = report.delayed.len(),
            "scheduler stopped"
        );
        report
    }
}

/// Moves a delayed job back to waiting once `delay` elapses.
fn schedule_promotion(inner: &Arc<Inner>, queue: Arc<Queue>, ready: Ready, delay: Duration) {
    let stop = inner.stop.clone();
    // Spawned outside the tracker: the timer must not hold up a drain.
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = stop.cancelled() => return,
        }
        {
            let mut guard = queue.lock();
            let Some(job) = guard.jobs.get_mut(&ready.id) else {
                return;
            };
            if job.state != JobState::Delayed {
                return;
            }
            job.state = JobState::Waiting;
            guard.delayed -= 1;
            guard.waiting.push(ready);
        }
        queue.ready.notify_one();
    });
}

/// Pops the next eligible job and marks it active.
fn take_next(queue: &Queue) -> Option<JobContext> {
    if queue.paused.load(Ordering::SeqCst) {
        return None;
    }
    let mut inner = queue.lock();
    while let Some(ready) = inner.waiting.pop() {
        let Some(job) = inner.jobs.get_mut(&ready.id) else {
            continue;
        };
        if job.state != JobState::Waiting || job.attempts >= job.max_attempts {
            continue;
        }
        job.state = JobState::Active;
        job.attempts += 1;
        let ctx = job.context();
        inner.active += 1;
        return Some(ctx);
    }
    None
}

async fn worker_loop(inner: Arc<Inner>, queue: Arc<Queue>, worker: usize) {
    debug!(queue = %queue.name, worker, "worker started");
    loop {
        let ctx = loop {
            if inner.stop.is_cancelled() {
                debug!(queue = %queue.name, worker, "worker stopped");
                return;
            }
            let notified = queue.ready.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if let Some(ctx) = take_next(&queue) {
                break ctx;
            }
            tokio::select! {
                _ = &mut notified => {}
                _ = inner.stop.cancelled() => {}
            }
        };

        // Pass the wake-up on in case more work is waiting.
        queue.ready.notify_one();

        let processor = inner
            .processors
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(&queue.name)
            .cloned();
        let Some(processor) = processor else {
            finish(
                &inner,
                &queue,
                &ctx,
                Err(WatchtowerError::Scheduler(format!(
                    "no processor registered for queue {}",
                    queue.name
                ))),
            );
            continue;
        };

        let id = ctx.id;
        let outcome = tokio::select! {
            result = processor.process(ctx.clone()) => Some(result),
            _ = inner.abort.cancelled() => None,
        };
        match outcome {
            Some(result) => finish(&inner, &queue, &ctx, result),
            None => {
                warn!(queue = %queue.name, job_id = %id, "job abandoned at shutdown deadline");
                return;
            }
        }
    }
}

/// Applies a processor result to the job's state.
fn finish(
    inner: &Arc<Inner>,
    queue: &Arc<Queue>,
    ctx: &JobContext,
    result: Result<(), WatchtowerError>,
) {
    let mut retry_after = None;
    let mut failure = None;
    {
        let mut guard = queue.lock();
        let state = &mut *guard;
        state.active = state.active.saturating_sub(1);
        let Some(job) = state.jobs.get_mut(&ctx.id) else {
            return;
        };

        match result {
            Ok(()) => {
                job.state = JobState::Completed;
                job.finished_at = Some(Utc::now());
                state.completed_total += 1;
                state.finished_completed.push_back(ctx.id);
                debug!(queue = %queue.name, job_id = %ctx.id, attempt = ctx.attempt, "job completed");
            }
            Err(err) => {
                job.last_error = Some(err.to_string());
                let retryable = err.is_transient() && job.attempts < job.max_attempts;
                if retryable {
                    job.state = JobState::Delayed;
                    let delay = queue.policy.backoff_delay(job.attempts);
                    retry_after = Some((
                        Ready {
                            priority: job.priority,
                            seq: job.seq,
                            id: job.id,
                        },
                        delay,
                    ));
                    state.delayed += 1;
                    warn!(
                        queue = %queue.name,
                        job_id = %ctx.id,
                        attempt = ctx.attempt,
                        max_attempts = ctx.max_attempts,
                        ?delay,
                        error = %err,
                        "job failed, retrying"
                    );
                } else {
                    job.state = JobState::Failed;
                    job.finished_at = Some(Utc::now());
                    state.failed_total += 1;
                    state.finished_failed.push_back(ctx.id);
                    failure = Some(err.to_string());
                    if queue.name == QueueName::Realtime {
                        warn!(job_id = %ctx.id, error = %err, "real-time job dropped");
                    } else {
                        error!(
                            queue = %queue.name,
                            job_id = %ctx.id,
                            attempts = ctx.attempt,
                            error = %err,
                            "job failed permanently"
                        );
                    }
                }
            }
        }
        prune_finished(state, inner.keep_completed, inner.keep_failed);
    }

    if let Some((ready, delay)) = retry_after {
        schedule_promotion(inner, queue.clone(), ready, delay);
    }
    if let (Some(error), Some(bus)) = (failure, &inner.bus) {
        bus.publish(WatchtowerEvent::JobFailed {
            queue: queue.name.to_string(),
            job_id: ctx.id,
            error,
        });
    }
    queue.finished.notify_waiters();
}

fn prune_finished(inner: &mut QueueInner, keep_completed: usize, keep_failed: usize) {
    while inner.finished_completed.len() > keep_completed {
        if let Some(id) = inner.finished_completed.pop_front() {
            inner.jobs.remove(&id);
        }
    }
    while inner.finished_failed.len() > keep_failed {
        if let Some(id) = inner.finished_failed.pop_front() {
            inner.jobs.remove(&id);
        }
    }
}
