// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retry policy derived from queue configuration.

use std::time::Duration;

use watchtower_config::model::{BackoffKind, QueueConfig};

use crate::job::QueueName;

/// Longest exponential backoff step.
const MAX_BACKOFF: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub concurrency: usize,
    pub max_attempts: u32,
    pub backoff: BackoffKind,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Builds the policy for `queue`. The real-time queue never retries,
    /// whatever the configuration says.
    pub fn for_queue(queue: QueueName, config: &QueueConfig) -> Self {
        let max_attempts = match queue {
            QueueName::Realtime => 1,
            _ => config.attempts.max(1),
        };
        Self {
            concurrency: config.concurrency.max(1),
            max_attempts,
            backoff: config.backoff.kind,
            base_delay: Duration::from_millis(config.backoff.delay_ms),
        }
    }

    /// Attempts allowed for one job, honouring a per-request override.
    pub fn attempts_for(&self, queue: QueueName, requested: Option<u32>) -> u32 {
        match queue {
            QueueName::Realtime => 1,
            _ => requested.unwrap_or(self.max_attempts).max(1),
        }
    }

    /// Delay before retry number `failed_attempts` (1 after the first failure).
    pub fn backoff_delay(&self, failed_attempts: u32) -> Duration {
        match self.backoff {
            BackoffKind::Fixed => self.base_delay,
            BackoffKind::Exponential => {
                let exp = failed_attempts.saturating_sub(1).min(20);
                self.base_delay
                    .checked_mul(1 << exp)
                    .unwrap_or(MAX_BACKOFF)
                    .min(MAX_BACKOFF)
            }
        }
    }
}
