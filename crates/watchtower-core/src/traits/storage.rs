// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for persistence backends (SQLite, in-memory).

use async_trait::async_trait;

use crate::error::WatchtowerError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{BehaviorKey, CommunityProfile, MessageRecord, UserBehaviorProfile};

/// Document-style persistence for messages and profiles.
///
/// Message reads return records ordered oldest first. Profile writes replace
/// the stored document for the key.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connections).
    async fn initialize(&self) -> Result<(), WatchtowerError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), WatchtowerError>;

    /// Persists an analysed message. Writing an existing id is a no-op.
    async fn save_message(&self, record: &MessageRecord) -> Result<(), WatchtowerError>;

    /// The author's `limit` most recent messages in the community.
    async fn user_messages(
        &self,
        key: &BehaviorKey,
        limit: usize,
    ) -> Result<Vec<MessageRecord>, WatchtowerError>;

    /// The `limit` most recent messages in one channel.
    async fn channel_messages(
        &self,
        community_id: &str,
        channel_id: &str,
        limit: usize,
    ) -> Result<Vec<MessageRecord>, WatchtowerError>;

    /// The `limit` most recent messages anywhere in the community.
    async fn community_messages(
        &self,
        community_id: &str,
        limit: usize,
    ) -> Result<Vec<MessageRecord>, WatchtowerError>;

    async fn get_community_profile(
        &self,
        community_id: &str,
    ) -> Result<Option<CommunityProfile>, WatchtowerError>;

    async fn upsert_community_profile(
        &self,
        profile: &CommunityProfile,
    ) -> Result<(), WatchtowerError>;

    async fn get_behavior_profile(
        &self,
        key: &BehaviorKey,
    ) -> Result<Option<UserBehaviorProfile>, WatchtowerError>;

    async fn upsert_behavior_profile(
        &self,
        profile: &UserBehaviorProfile,
    ) -> Result<(), WatchtowerError>;
}
