// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel adapter that delivers through bridging observers.
//!
//! The platform connection runs outside this process: a bridge observer
//! registers for its community, streams messages in with `message_stream`
//! and posts every `outbound_message` envelope it receives. Metadata pulls
//! have no platform to ask, so discovery sees a bare community and relies
//! on traffic for its metrics.

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;
use watchtower_core::types::{CommunityMetadata, OutboundMessage};
use watchtower_core::{
    AdapterType, ChannelAdapter, HealthStatus, MessageId, PluginAdapter, WatchtowerError,
};
use watchtower_hub::{BroadcastHub, Envelope, message_types};

pub struct ObserverChannel {
    hub: BroadcastHub,
}

impl ObserverChannel {
    pub fn new(hub: BroadcastHub) -> Self {
        Self { hub }
    }
}

#[async_trait]
impl PluginAdapter for ObserverChannel {
    fn name(&self) -> &str {
        "observer-bridge"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, WatchtowerError> {
        let counts = self.hub.counts().await;
        Ok(if counts.registrations > 0 {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded("no bridging observer registered".to_string())
        })
    }

    async fn shutdown(&self) -> Result<(), WatchtowerError> {
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for ObserverChannel {
    async fn fetch_community(
        &self,
        community_id: &str,
    ) -> Result<CommunityMetadata, WatchtowerError> {
        debug!(community_id, "no platform metadata available, using bare community");
        Ok(CommunityMetadata {
            id: community_id.to_string(),
            name: community_id.to_string(),
            ..CommunityMetadata::default()
        })
    }

    async fn fetch_recent_messages(
        &self,
        _channel_id: &str,
        _limit: usize,
    ) -> Result<Vec<String>, WatchtowerError> {
        Ok(Vec::new())
    }

    async fn fetch_pinned_messages(
        &self,
        _channel_id: &str,
    ) -> Result<Vec<String>, WatchtowerError> {
        Ok(Vec::new())
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, WatchtowerError> {
        let id = Uuid::new_v4().to_string();
        let envelope = Envelope::new(
            message_types::OUTBOUND_MESSAGE,
            msg.community_id.clone(),
            serde_json::json!({
                "messageId": id,
                "channelId": msg.channel_id,
                "content": msg.content,
                "replyTo": msg.reply_to,
            }),
        );
        let delivered = self
            .hub
            .broadcast_to_community(&msg.community_id, &envelope)
            .await;
        if delivered == 0 {
            return Err(WatchtowerError::channel(format!(
                "no observer is bridging community {}",
                msg.community_id
            )));
        }
        Ok(MessageId(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use watchtower_hub::Frame;

    fn outbound(community: &str) -> OutboundMessage {
        OutboundMessage {
            community_id: community.to_string(),
            channel_id: "general".to_string(),
            content: "gm".to_string(),
            reply_to: Some("m1".to_string()),
        }
    }

    #[tokio::test]
    async fn send_reaches_the_bridging_observer() {
        let hub = BroadcastHub::new();
        let (conn, mut rx) = hub.connect().await;
        hub.register(conn, "C1").await;
        let channel = ObserverChannel::new(hub);

        let id = channel.send(outbound("C1")).await.unwrap();
        let Some(Frame::Text(text)) = rx.recv().await else {
            panic!("expected a text frame");
        };
        let envelope: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(envelope["type"], "outbound_message");
        assert_eq!(envelope["serverId"], "C1");
        assert_eq!(envelope["data"]["messageId"], id.0);
        assert_eq!(envelope["data"]["replyTo"], "m1");
    }

    #[tokio::test]
    async fn send_without_bridge_is_a_channel_error() {
        let channel = ObserverChannel::new(BroadcastHub::new());
        let err = channel.send(outbound("C9")).await.unwrap_err();
        assert!(matches!(err, WatchtowerError::Channel { .. }));
        assert!(err.is_transient());
        assert!(matches!(
            channel.health_check().await.unwrap(),
            HealthStatus::Degraded(_)
        ));
    }

    #[tokio::test]
    async fn metadata_is_bare() {
        let channel = ObserverChannel::new(BroadcastHub::new());
        let meta = channel.fetch_community("C1").await.unwrap();
        assert_eq!(meta.id, "C1");
        assert!(meta.channels.is_empty());
        assert!(channel.fetch_pinned_messages("general").await.unwrap().is_empty());
    }
}
