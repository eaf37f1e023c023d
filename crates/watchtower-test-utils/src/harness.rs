// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles SQLite storage in a temp directory, mock chat
//! and completion adapters, and a configuration tuned for fast tests.

use std::sync::Arc;

use watchtower_config::model::{StorageConfig, WatchtowerConfig};
use watchtower_core::{StorageAdapter, WatchtowerError};
use watchtower_storage::SqliteStorage;

use crate::mock_channel::MockChannel;
use crate::mock_completion::MockCompletion;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    replies: Vec<String>,
    failing_completion: bool,
    config: WatchtowerConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        let mut config = WatchtowerConfig::default();
        config.service.bot_user_id = Some("watchtower-bot".to_string());
        config.responder.min_delay_ms = 0;
        config.responder.max_delay_ms = 0;
        config.scheduler.analysis.backoff.delay_ms = 10;
        config.scheduler.profiling.backoff.delay_ms = 10;
        config.scheduler.behavior.backoff.delay_ms = 10;
        config.hub.enabled = false;
        Self {
            replies: Vec::new(),
            failing_completion: false,
            config,
        }
    }

    /// Queue completion replies.
    pub fn with_completion_replies(mut self, replies: Vec<String>) -> Self {
        self.replies = replies;
        self
    }

    /// Make every completion request fail.
    pub fn with_failing_completion(mut self) -> Self {
        self.failing_completion = true;
        self
    }

    /// Adjust the configuration before build.
    pub fn configure(mut self, f: impl FnOnce(&mut WatchtowerConfig)) -> Self {
        f(&mut self.config);
        self
    }

    pub async fn build(self) -> Result<TestHarness, WatchtowerError> {
        let temp_dir = tempfile::TempDir::new().map_err(WatchtowerError::storage)?;
        let db_path = temp_dir.path().join("test.db");

        let mut config = self.config;
        config.storage = StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: true,
        };

        let storage = SqliteStorage::new(config.storage.clone());
        storage.initialize().await?;
        let storage: Arc<dyn StorageAdapter> = Arc::new(storage);

        let completion = Arc::new(if self.failing_completion {
            MockCompletion::failing()
        } else {
            MockCompletion::with_replies(self.replies)
        });

        Ok(TestHarness {
            channel: Arc::new(MockChannel::new()),
            completion,
            storage,
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with mock adapters and temp storage.
pub struct TestHarness {
    pub channel: Arc<MockChannel>,
    pub completion: Arc<MockCompletion>,
    /// SQLite storage adapter (temp DB, cleaned up on drop).
    pub storage: Arc<dyn StorageAdapter>,
    pub config: WatchtowerConfig,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use watchtower_core::types::MessageRecord;

    #[tokio::test]
    async fn harness_storage_is_live() {
        let harness = TestHarness::builder()
            .configure(|c| c.behavior.alert_threshold = 5)
            .build()
            .await
            .unwrap();
        assert_eq!(harness.config.behavior.alert_threshold, 5);
        let rec = MessageRecord::unanalyzed(&crate::message("m", "c", "ch", "u", "hello", 0));
        harness.storage.save_message(&rec).await.unwrap();
        assert_eq!(harness.storage.community_messages("c", 5).await.unwrap().len(), 1);
    }
}
