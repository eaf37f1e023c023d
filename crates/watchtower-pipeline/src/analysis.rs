// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message analysis and reply delivery.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use watchtower_analyzer::AnalysisResult;
use watchtower_bus::WatchtowerEvent;
use watchtower_core::WatchtowerError;
use watchtower_core::types::{CommunityProfile, IngestedMessage, MessageRecord, OutboundMessage};
use watchtower_hub::{Envelope, message_types};
use watchtower_profiler::record_activity;

use crate::Services;
use crate::jobs;

/// Recent community traffic used to count active users.
pub const ACTIVE_USER_WINDOW: usize = 200;

impl Services {
    /// Real-time path: forward the raw message to the community's observers.
    pub(crate) async fn broadcast_realtime(
        &self,
        message: &IngestedMessage,
    ) -> Result<(), WatchtowerError> {
        let envelope = Envelope::new(
            message_types::REALTIME_MESSAGE,
            message.community_id.clone(),
            serde_json::to_value(message)?,
        );
        let delivered = self
            .hub
            .broadcast_to_community(&message.community_id, &envelope)
            .await;
        debug!(message_id = %message.id, delivered, "real-time broadcast");
        Ok(())
    }

    /// Full analysis of one message: persist, update community metrics (or
    /// trigger discovery), announce, queue behavior scoring, and maybe reply.
    pub(crate) async fn analyze_message(
        self: &Arc<Self>,
        message: IngestedMessage,
    ) -> Result<(), WatchtowerError> {
        let (record, analysis) = self.analyzer.annotate(&message);
        self.bounded(self.storage.save_message(&record)).await?;
        let profile = self.track_community(&record).await?;

        // Announced only after the storage steps a retry would repeat.
        self.responder.observe(&record);
        self.bus.publish(WatchtowerEvent::MessageAnalyzed {
            community_id: record.community_id.clone(),
            channel_id: record.channel_id.clone(),
            message_id: record.id.clone(),
            author_id: record.author_id.clone(),
            sentiment: record.sentiment,
            topics: record.topics.clone(),
        });

        if !record.is_bot {
            let request = jobs::behavior_request(&record.author_id, &record.community_id)?;
            self.enqueue_follow_up(request);
        }

        if self.config.responder.enabled {
            self.respond(&record, &analysis, profile.as_ref()).await;
        }
        Ok(())
    }

    /// Incremental metric update under the community lock. Returns the
    /// updated profile, or `None` after triggering discovery for a
    /// community that has none yet.
    async fn track_community(
        &self,
        record: &MessageRecord,
    ) -> Result<Option<CommunityProfile>, WatchtowerError> {
        let community_id = &record.community_id;
        let guard = self.community_locks.lock(community_id).await;
        let Some(mut profile) = self
            .bounded(self.storage.get_community_profile(community_id))
            .await?
        else {
            drop(guard);
            if let Err(e) = self.request_discovery(community_id) {
                warn!(community_id, error = %e, "discovery not triggered");
            }
            return Ok(None);
        };

        let recent = self
            .bounded(self.storage.community_messages(community_id, ACTIVE_USER_WINDOW))
            .await?;
        record_activity(&mut profile, &recent, Utc::now());
        self.bounded(self.storage.upsert_community_profile(&profile))
            .await?;
        Ok(Some(profile))
    }

    /// Gates and drafts a reply; delivery happens after the human-like
    /// delay on a tracked task so the analysis worker is not held.
    async fn respond(
        self: &Arc<Self>,
        record: &MessageRecord,
        analysis: &AnalysisResult,
        profile: Option<&CommunityProfile>,
    ) {
        let decision = self.responder.decide(record, analysis, profile).await;
        if !decision.should_deliver() {
            debug!(
                message_id = %record.id,
                should_respond = decision.should_respond,
                confidence = decision.confidence,
                "reply not delivered"
            );
            return;
        }
        let Some(content) = decision.response else {
            return;
        };

        // Claimed now so concurrent decisions see it before the delay ends.
        if !self
            .responder
            .claim_send(&record.community_id, &record.channel_id)
        {
            debug!(message_id = %record.id, "spam cap reached, reply dropped");
            return;
        }

        let outbound = OutboundMessage {
            community_id: record.community_id.clone(),
            channel_id: record.channel_id.clone(),
            content,
            reply_to: Some(record.id.clone()),
        };
        let delay = self.responder.delivery_delay();
        let services = Arc::clone(self);
        self.tasks.spawn(async move {
            tokio::time::sleep(delay).await;
            match services.bounded(services.channel.send(outbound)).await {
                Ok(id) => info!(message_id = %id.0, delay_ms = delay.as_millis() as u64, "reply delivered"),
                Err(e) => warn!(error = %e, "reply delivery failed"),
            }
        });
    }
}
