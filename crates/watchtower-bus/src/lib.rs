// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed event bus for cross-component notifications.
//!
//! Components publish [`WatchtowerEvent`]s; subscribers (alert forwarder,
//! broadcast relays, tests) each receive every event published after they
//! subscribed. Publishing never blocks and never fails the publisher: with
//! no subscribers the event is dropped, and slow subscribers observe a lag.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, warn};
use uuid::Uuid;

/// Default channel capacity per bus.
pub const DEFAULT_CAPACITY: usize = 1024;

/// A published event with its envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_id: Uuid,
    pub published_at: DateTime<Utc>,
    pub event: WatchtowerEvent,
}

/// Everything components announce to each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WatchtowerEvent {
    /// A message finished feature extraction.
    MessageAnalyzed {
        community_id: String,
        channel_id: String,
        message_id: String,
        author_id: String,
        sentiment: f64,
        topics: Vec<String>,
    },
    /// A user's suspicion score reached the alert threshold.
    SuspiciousActivity(SuspicionAlert),
    /// A community profile was (re)discovered.
    CommunityProfiled {
        community_id: String,
        project_type: String,
    },
    /// A job exhausted its attempts or failed permanently.
    JobFailed {
        queue: String,
        job_id: Uuid,
        error: String,
    },
}

impl WatchtowerEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            WatchtowerEvent::MessageAnalyzed { .. } => "message_analyzed",
            WatchtowerEvent::SuspiciousActivity(_) => "suspicious_activity",
            WatchtowerEvent::CommunityProfiled { .. } => "community_profiled",
            WatchtowerEvent::JobFailed { .. } => "job_failed",
        }
    }
}

/// Alert payload, also the body of the community-scoped alert broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuspicionAlert {
    pub user_id: String,
    pub community_id: String,
    pub suspicion_score: u8,
    pub risk_factors: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// Cloneable handle to the shared bus.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all current subscribers.
    pub fn publish(&self, event: WatchtowerEvent) {
        let kind = event.kind();
        let envelope = EventEnvelope {
            event_id: Uuid::new_v4(),
            published_at: Utc::now(),
            event,
        };
        match self.tx.send(envelope) {
            Ok(receivers) => debug!(kind, receivers, "event published"),
            Err(_) => debug!(kind, "event dropped, no subscribers"),
        }
    }

    pub fn subscribe(&self) -> EventSubscriber {
        EventSubscriber {
            rx: self.tx.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// Receiving half of a bus subscription.
#[derive(Debug)]
pub struct EventSubscriber {
    rx: broadcast::Receiver<EventEnvelope>,
}

impl EventSubscriber {
    /// Next event, or `None` once the bus is dropped. Lagged events are
    /// skipped with a warning.
    pub async fn recv(&mut self) -> Option<EventEnvelope> {
        loop {
            match self.rx.recv().await {
                Ok(envelope) => return Some(envelope),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event subscriber lagged, events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking poll used by tests and drain loops.
    pub fn try_recv(&mut self) -> Option<EventEnvelope> {
        loop {
            match self.rx.try_recv() {
                Ok(envelope) => return Some(envelope),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alert(score: u8) -> WatchtowerEvent {
        WatchtowerEvent::SuspiciousActivity(SuspicionAlert {
            user_id: "u1".into(),
            community_id: "c1".into(),
            suspicion_score: score,
            risk_factors: vec!["generic_responses".into()],
            timestamp: Utc::now(),
        })
    }

    #[tokio::test]
    async fn every_subscriber_receives_events() {
        let bus = EventBus::new(16);
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();
        bus.publish(alert(8));

        assert_eq!(a.recv().await.unwrap().event, b.recv().await.unwrap().event);
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_harmless() {
        let bus = EventBus::new(4);
        bus.publish(alert(7));
        let mut late = bus.subscribe();
        assert!(late.try_recv().is_none());
    }

    #[tokio::test]
    async fn lagged_subscriber_skips_to_newest() {
        let bus = EventBus::new(2);
        let mut sub = bus.subscribe();
        for score in 0..5 {
            bus.publish(alert(score));
        }
        let first = sub.recv().await.unwrap();
        match first.event {
            WatchtowerEvent::SuspiciousActivity(a) => assert!(a.suspicion_score >= 3),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn alert_serializes_camel_case() {
        let WatchtowerEvent::SuspiciousActivity(a) = alert(9) else {
            unreachable!()
        };
        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(json["suspicionScore"], 9);
        assert!(json["riskFactors"].is_array());
    }

    #[test]
    fn event_kind_tags() {
        assert_eq!(alert(1).kind(), "suspicious_activity");
        let json = serde_json::to_value(alert(1)).unwrap();
        assert_eq!(json["kind"], "suspicious_activity");
    }
}
