// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock chat platform for deterministic testing.
//!
//! `MockChannel` implements `ChannelAdapter` with scripted community
//! metadata and channel contents, per-channel failure and hang injection,
//! and captured outbound messages for assertion in tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use watchtower_core::traits::adapter::PluginAdapter;
use watchtower_core::traits::channel::ChannelAdapter;
use watchtower_core::types::{
    AdapterType, CommunityMetadata, HealthStatus, MessageId, OutboundMessage,
};
use watchtower_core::WatchtowerError;

#[derive(Default)]
struct State {
    communities: HashMap<String, CommunityMetadata>,
    recent: HashMap<String, Vec<String>>,
    pinned: HashMap<String, Vec<String>>,
    failing: HashSet<String>,
    hanging: HashSet<String>,
    fail_sends: bool,
    sent: Vec<OutboundMessage>,
    fetches: usize,
}

/// A mock chat platform for testing.
#[derive(Default)]
pub struct MockChannel {
    state: Mutex<State>,
}

impl MockChannel {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Registers metadata returned by `fetch_community`.
    pub fn set_community(&self, metadata: CommunityMetadata) {
        self.state().communities.insert(metadata.id.clone(), metadata);
    }

    pub fn set_recent(&self, channel_id: &str, messages: Vec<String>) {
        self.state().recent.insert(channel_id.to_string(), messages);
    }

    pub fn set_pinned(&self, channel_id: &str, messages: Vec<String>) {
        self.state().pinned.insert(channel_id.to_string(), messages);
    }

    /// Makes every fetch for `channel_id` fail.
    pub fn fail_channel(&self, channel_id: &str) {
        self.state().failing.insert(channel_id.to_string());
    }

    /// Makes every fetch for `channel_id` never return.
    pub fn hang_channel(&self, channel_id: &str) {
        self.state().hanging.insert(channel_id.to_string());
    }

    pub fn fail_sends(&self, fail: bool) {
        self.state().fail_sends = fail;
    }

    /// Messages passed to `send`, in order.
    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.state().sent.clone()
    }

    /// Number of `fetch_community` calls.
    pub fn community_fetches(&self) -> usize {
        self.state().fetches
    }

    async fn channel_fetch(
        &self,
        channel_id: &str,
        pinned: bool,
    ) -> Result<Vec<String>, WatchtowerError> {
        let (hang, result) = {
            let state = self.state();
            let hang = state.hanging.contains(channel_id);
            let result = if state.failing.contains(channel_id) {
                Err(WatchtowerError::channel(format!("fetch failed for {channel_id}")))
            } else {
                let source = if pinned { &state.pinned } else { &state.recent };
                Ok(source.get(channel_id).cloned().unwrap_or_default())
            };
            (hang, result)
        };
        if hang {
            std::future::pending::<()>().await;
        }
        result
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        "mock-channel"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, WatchtowerError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), WatchtowerError> {
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for MockChannel {
    async fn fetch_community(
        &self,
        community_id: &str,
    ) -> Result<CommunityMetadata, WatchtowerError> {
        let mut state = self.state();
        state.fetches += 1;
        state
            .communities
            .get(community_id)
            .cloned()
            .ok_or_else(|| WatchtowerError::channel(format!("unknown community {community_id}")))
    }

    async fn fetch_recent_messages(
        &self,
        channel_id: &str,
        limit: usize,
    ) -> Result<Vec<String>, WatchtowerError> {
        let mut messages = self.channel_fetch(channel_id, false).await?;
        messages.truncate(limit);
        Ok(messages)
    }

    async fn fetch_pinned_messages(
        &self,
        channel_id: &str,
    ) -> Result<Vec<String>, WatchtowerError> {
        self.channel_fetch(channel_id, true).await
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, WatchtowerError> {
        let mut state = self.state();
        if state.fail_sends {
            return Err(WatchtowerError::channel("send rejected"));
        }
        state.sent.push(msg);
        Ok(MessageId(format!("mock-msg-{}", uuid::Uuid::new_v4())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn outbound(text: &str) -> OutboundMessage {
        OutboundMessage {
            community_id: "c1".into(),
            channel_id: "general".into(),
            content: text.into(),
            reply_to: None,
        }
    }

    #[tokio::test]
    async fn send_captures_outbound_messages() {
        let channel = MockChannel::new();
        let id = channel.send(outbound("hello")).await.unwrap();
        assert!(id.0.starts_with("mock-msg-"));
        assert_eq!(channel.sent().len(), 1);
        assert_eq!(channel.sent()[0].content, "hello");
    }

    #[tokio::test]
    async fn failing_sends_are_not_captured() {
        let channel = MockChannel::new();
        channel.fail_sends(true);
        assert!(channel.send(outbound("x")).await.is_err());
        assert!(channel.sent().is_empty());
    }

    #[tokio::test]
    async fn scripted_fetches() {
        let channel = MockChannel::new();
        channel.set_recent("a", vec!["1".into(), "2".into(), "3".into()]);
        channel.fail_channel("b");
        assert_eq!(channel.fetch_recent_messages("a", 2).await.unwrap(), vec!["1", "2"]);
        assert!(channel.fetch_pinned_messages("a").await.unwrap().is_empty());
        assert!(channel.fetch_recent_messages("b", 10).await.is_err());
        assert!(channel.fetch_community("missing").await.is_err());
        assert_eq!(channel.community_fetches(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_channel_never_returns() {
        let channel = MockChannel::new();
        channel.hang_channel("slow");
        let res = tokio::time::timeout(
            Duration::from_secs(5),
            channel.fetch_recent_messages("slow", 10),
        )
        .await;
        assert!(res.is_err());
    }
}
