// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bus -> observer relay and moderator escalation.
//!
//! Delivery failures here are logged and dropped; they never reach the
//! job that published the event.

use std::sync::Arc;

use tracing::{debug, info, warn};
use watchtower_bus::{SuspicionAlert, WatchtowerEvent};
use watchtower_core::types::OutboundMessage;
use watchtower_hub::{Envelope, message_types};

use crate::Services;

/// Subscribes immediately, then relays until the pipeline stops.
pub(crate) fn spawn(services: &Arc<Services>) {
    let mut events = services.bus.subscribe();
    let services = Arc::clone(services);
    services.tasks.clone().spawn(async move {
        loop {
            tokio::select! {
                biased;
                envelope = events.recv() => match envelope {
                    Some(envelope) => services.relay(envelope.event).await,
                    None => break,
                },
                _ = services.stop.cancelled() => break,
            }
        }
        debug!("event relay stopped");
    });
}

impl Services {
    async fn relay(&self, event: WatchtowerEvent) {
        match event {
            WatchtowerEvent::MessageAnalyzed {
                community_id,
                channel_id,
                message_id,
                author_id,
                sentiment,
                topics,
            } => {
                let data = serde_json::json!({
                    "messageId": message_id,
                    "channelId": channel_id,
                    "authorId": author_id,
                    "sentiment": sentiment,
                    "topics": topics,
                });
                let envelope =
                    Envelope::new(message_types::MESSAGE_ANALYZED, community_id.clone(), data);
                self.hub.broadcast_to_community(&community_id, &envelope).await;
            }
            WatchtowerEvent::SuspiciousActivity(alert) => self.forward_alert(alert).await,
            WatchtowerEvent::CommunityProfiled {
                community_id,
                project_type,
            } => {
                let envelope = Envelope::new(
                    message_types::COMMUNITY_PROFILED,
                    community_id.clone(),
                    serde_json::json!({ "projectType": project_type }),
                );
                self.hub.broadcast_to_community(&community_id, &envelope).await;
            }
            WatchtowerEvent::JobFailed { .. } => {}
        }
    }

    async fn forward_alert(&self, alert: SuspicionAlert) {
        let data = match serde_json::to_value(&alert) {
            Ok(data) => data,
            Err(e) => {
                warn!(error = %e, "alert not serializable");
                return;
            }
        };
        let envelope = Envelope::new(
            message_types::SUSPICIOUS_ACTIVITY,
            alert.community_id.clone(),
            data,
        );
        let delivered = self
            .hub
            .broadcast_to_community(&alert.community_id, &envelope)
            .await;
        debug!(user_id = %alert.user_id, delivered, "alert broadcast");

        if alert.suspicion_score >= self.config.behavior.escalation_threshold {
            self.escalate(&alert).await;
        }
    }

    async fn escalate(&self, alert: &SuspicionAlert) {
        let Some(channel_id) = self.config.behavior.moderator_channel_id.clone() else {
            info!(
                user_id = %alert.user_id,
                score = alert.suspicion_score,
                "no moderator channel configured, escalation skipped"
            );
            return;
        };
        let notice = OutboundMessage {
            community_id: alert.community_id.clone(),
            channel_id,
            content: moderator_notice(alert),
            reply_to: None,
        };
        match self.bounded(self.channel.send(notice)).await {
            Ok(_) => info!(user_id = %alert.user_id, "moderators notified"),
            Err(e) => warn!(user_id = %alert.user_id, error = %e, "alert delivery failed"),
        }
    }
}

fn moderator_notice(alert: &SuspicionAlert) -> String {
    let factors = if alert.risk_factors.is_empty() {
        "none recorded".to_string()
    } else {
        alert.risk_factors.join(", ")
    };
    format!(
        "Suspicious activity: user <@{}> scored {}/10. Risk factors: {factors}.",
        alert.user_id, alert.suspicion_score
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn notice_lists_risk_factors() {
        let alert = SuspicionAlert {
            user_id: "u1".into(),
            community_id: "C1".into(),
            suspicion_score: 10,
            risk_factors: vec!["generic_responses".into(), "high_content_repetition".into()],
            timestamp: Utc::now(),
        };
        let text = moderator_notice(&alert);
        assert!(text.contains("<@u1>"));
        assert!(text.contains("10/10"));
        assert!(text.contains("generic_responses, high_content_repetition"));
    }

    #[test]
    fn notice_without_factors() {
        let alert = SuspicionAlert {
            user_id: "u1".into(),
            community_id: "C1".into(),
            suspicion_score: 9,
            risk_factors: vec![],
            timestamp: Utc::now(),
        };
        assert!(moderator_notice(&alert).contains("none recorded"));
    }
}
