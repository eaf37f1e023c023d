// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory storage adapter with the same ordering rules as SQLite storage.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use watchtower_core::traits::adapter::PluginAdapter;
use watchtower_core::traits::storage::StorageAdapter;
use watchtower_core::types::{
    AdapterType, BehaviorKey, CommunityProfile, HealthStatus, MessageRecord, UserBehaviorProfile,
};
use watchtower_core::WatchtowerError;

#[derive(Default)]
struct Tables {
    /// Insertion order is kept so equal timestamps sort stably.
    messages: Vec<MessageRecord>,
    communities: HashMap<String, CommunityProfile>,
    behavior: HashMap<BehaviorKey, UserBehaviorProfile>,
}

#[derive(Default)]
pub struct MemoryStorage {
    tables: RwLock<Tables>,
    failing: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent operation fail with a storage error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn message_count(&self) -> usize {
        self.tables.read().await.messages.len()
    }

    fn check(&self) -> Result<(), WatchtowerError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(WatchtowerError::storage(std::io::Error::other(
                "memory storage set to fail",
            )));
        }
        Ok(())
    }
}

/// The `limit` newest matching records, returned oldest first.
fn newest<'a>(
    records: impl Iterator<Item = &'a MessageRecord>,
    limit: usize,
) -> Vec<MessageRecord> {
    let mut matched: Vec<&MessageRecord> = records.collect();
    matched.sort_by_key(|r| r.timestamp);
    let skip = matched.len().saturating_sub(limit);
    matched.into_iter().skip(skip).cloned().collect()
}

#[async_trait]
impl PluginAdapter for MemoryStorage {
    fn name(&self) -> &str {
        "memory-storage"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, WatchtowerError> {
        if self.failing.load(Ordering::SeqCst) {
            return Ok(HealthStatus::Unhealthy("set to fail".into()));
        }
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), WatchtowerError> {
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for MemoryStorage {
    async fn initialize(&self) -> Result<(), WatchtowerError> {
        self.check()
    }

    async fn close(&self) -> Result<(), WatchtowerError> {
        Ok(())
    }

    async fn save_message(&self, record: &MessageRecord) -> Result<(), WatchtowerError> {
        self.check()?;
        let mut tables = self.tables.write().await;
        if !tables.messages.iter().any(|m| m.id == record.id) {
            tables.messages.push(record.clone());
        }
        Ok(())
    }

    async fn user_messages(
        &self,
        key: &BehaviorKey,
        limit: usize,
    ) -> Result<Vec<MessageRecord>, WatchtowerError> {
        self.check()?;
        let tables = self.tables.read().await;
        Ok(newest(
            tables
                .messages
                .iter()
                .filter(|m| m.author_id == key.user_id && m.community_id == key.community_id),
            limit,
        ))
    }

    async fn channel_messages(
        &self,
        community_id: &str,
        channel_id: &str,
        limit: usize,
    ) -> Result<Vec<MessageRecord>, WatchtowerError> {
        self.check()?;
        let tables = self.tables.read().await;
        Ok(newest(
            tables
                .messages
                .iter()
                .filter(|m| m.community_id == community_id && m.channel_id == channel_id),
            limit,
        ))
    }

    async fn community_messages(
        &self,
        community_id: &str,
        limit: usize,
    ) -> Result<Vec<MessageRecord>, WatchtowerError> {
        self.check()?;
        let tables = self.tables.read().await;
        Ok(newest(
            tables.messages.iter().filter(|m| m.community_id == community_id),
            limit,
        ))
    }

    async fn get_community_profile(
        &self,
        community_id: &str,
    ) -> Result<Option<CommunityProfile>, WatchtowerError> {
        self.check()?;
        Ok(self.tables.read().await.communities.get(community_id).cloned())
    }

    async fn upsert_community_profile(
        &self,
        profile: &CommunityProfile,
    ) -> Result<(), WatchtowerError> {
        self.check()?;
        self.tables
            .write()
            .await
            .communities
            .insert(profile.community_id.clone(), profile.clone());
        Ok(())
    }

    async fn get_behavior_profile(
        &self,
        key: &BehaviorKey,
    ) -> Result<Option<UserBehaviorProfile>, WatchtowerError> {
        self.check()?;
        Ok(self.tables.read().await.behavior.get(key).cloned())
    }

    async fn upsert_behavior_profile(
        &self,
        profile: &UserBehaviorProfile,
    ) -> Result<(), WatchtowerError> {
        self.check()?;
        self.tables
            .write()
            .await
            .behavior
            .insert(profile.key(), profile.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message;

    #[tokio::test]
    async fn duplicate_ids_are_ignored() {
        let storage = MemoryStorage::new();
        let rec = MessageRecord::unanalyzed(&message("m1", "c", "ch", "u", "hi", 0));
        storage.save_message(&rec).await.unwrap();
        let mut changed = rec.clone();
        changed.content = "changed".into();
        storage.save_message(&changed).await.unwrap();
        assert_eq!(storage.message_count().await, 1);
        let msgs = storage.community_messages("c", 10).await.unwrap();
        assert_eq!(msgs[0].content, "hi");
    }

    #[tokio::test]
    async fn newest_messages_oldest_first() {
        let storage = MemoryStorage::new();
        for (i, offset) in [30, 10, 20, 40].into_iter().enumerate() {
            let m = message(&format!("m{i}"), "c", "ch", "u", "x", offset);
            storage.save_message(&MessageRecord::unanalyzed(&m)).await.unwrap();
        }
        let key = BehaviorKey::new("u", "c");
        let ids: Vec<String> = storage
            .user_messages(&key, 3)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec!["m2", "m0", "m3"]);
    }

    #[tokio::test]
    async fn failing_storage_errors_transiently() {
        let storage = MemoryStorage::new();
        storage.set_failing(true);
        let err = storage.get_community_profile("c").await.unwrap_err();
        assert!(err.is_transient());
    }
}
