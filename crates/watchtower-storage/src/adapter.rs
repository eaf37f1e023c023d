// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use watchtower_config::model::StorageConfig;
use watchtower_core::types::{BehaviorKey, CommunityProfile, MessageRecord, UserBehaviorProfile};
use watchtower_core::{AdapterType, HealthStatus, PluginAdapter, StorageAdapter, WatchtowerError};

use crate::database::Database;
use crate::queries;

/// SQLite-backed storage adapter.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is opened on the first call to
/// [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// The database connection is not opened until `initialize` is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, WatchtowerError> {
        self.db.get().ok_or_else(|| WatchtowerError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, WatchtowerError> {
        let Ok(db) = self.db() else {
            return Ok(HealthStatus::Unhealthy("not initialized".into()));
        };
        let probe = db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await;
        Ok(match probe {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        })
    }

    async fn shutdown(&self) -> Result<(), WatchtowerError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), WatchtowerError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| WatchtowerError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), WatchtowerError> {
        self.db()?.checkpoint().await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    async fn save_message(&self, record: &MessageRecord) -> Result<(), WatchtowerError> {
        queries::messages::insert_message(self.db()?, record).await
    }

    async fn user_messages(
        &self,
        key: &BehaviorKey,
        limit: usize,
    ) -> Result<Vec<MessageRecord>, WatchtowerError> {
        queries::messages::user_messages(self.db()?, &key.community_id, &key.user_id, limit).await
    }

    async fn channel_messages(
        &self,
        community_id: &str,
        channel_id: &str,
        limit: usize,
    ) -> Result<Vec<MessageRecord>, WatchtowerError> {
        queries::messages::channel_messages(self.db()?, community_id, channel_id, limit).await
    }

    async fn community_messages(
        &self,
        community_id: &str,
        limit: usize,
    ) -> Result<Vec<MessageRecord>, WatchtowerError> {
        queries::messages::community_messages(self.db()?, community_id, limit).await
    }

    async fn get_community_profile(
        &self,
        community_id: &str,
    ) -> Result<Option<CommunityProfile>, WatchtowerError> {
        queries::profiles::get_community_profile(self.db()?, community_id).await
    }

    async fn upsert_community_profile(
        &self,
        profile: &CommunityProfile,
    ) -> Result<(), WatchtowerError> {
        queries::profiles::upsert_community_profile(self.db()?, profile).await
    }

    async fn get_behavior_profile(
        &self,
        key: &BehaviorKey,
    ) -> Result<Option<UserBehaviorProfile>, WatchtowerError> {
        queries::profiles::get_behavior_profile(self.db()?, key).await
    }

    async fn upsert_behavior_profile(
        &self,
        profile: &UserBehaviorProfile,
    ) -> Result<(), WatchtowerError> {
        queries::profiles::upsert_behavior_profile(self.db()?, profile).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
            wal_mode: true,
        }
    }

    #[tokio::test]
    async fn sqlite_storage_implements_plugin_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        assert_eq!(storage.name(), "sqlite");
        assert_eq!(storage.adapter_type(), AdapterType::Storage);
        assert!(matches!(
            storage.health_check().await.unwrap(),
            HealthStatus::Unhealthy(_)
        ));
    }

    #[tokio::test]
    async fn initialize_opens_database_at_configured_path() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("init_test.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        storage.initialize().await.unwrap();
        assert!(db_path.exists(), "database file should be created");
        assert_eq!(storage.health_check().await.unwrap(), HealthStatus::Healthy);
        assert!(storage.initialize().await.is_err());
        storage.close().await.unwrap();
    }

    #[tokio::test]
    async fn operations_before_initialize_fail() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::new(make_config(dir.path().join("x.db").to_str().unwrap()));
        let err = storage.community_messages("c1", 5).await.unwrap_err();
        assert!(err.is_transient());
    }
}
