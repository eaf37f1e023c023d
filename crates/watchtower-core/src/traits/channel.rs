// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel adapter trait for the chat platform (Discord or similar).

use async_trait::async_trait;

use crate::error::WatchtowerError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{CommunityMetadata, MessageId, OutboundMessage};

/// Read and send access to the chat platform.
///
/// Connection, login and raw event delivery live outside Watchtower; the
/// platform pushes messages in through the pipeline's ingest entry point.
/// This trait covers the pull-style calls made during discovery and the
/// send capability used for replies and moderator notifications.
#[async_trait]
pub trait ChannelAdapter: PluginAdapter {
    /// Fetches structural metadata (name, description, channels, roles) for a community.
    async fn fetch_community(&self, community_id: &str)
    -> Result<CommunityMetadata, WatchtowerError>;

    /// Fetches the content of up to `limit` recent messages in a channel.
    async fn fetch_recent_messages(
        &self,
        channel_id: &str,
        limit: usize,
    ) -> Result<Vec<String>, WatchtowerError>;

    /// Fetches the content of pinned messages in a channel.
    async fn fetch_pinned_messages(&self, channel_id: &str)
    -> Result<Vec<String>, WatchtowerError>;

    /// Sends a message through the platform.
    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, WatchtowerError>;
}
