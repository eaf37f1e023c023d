// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation context: the recent window of a channel, its participants,
//! ranked topics and mood. Contexts are cached per channel with a TTL and
//! rebuilt from storage on a miss.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde::Serialize;
use strum::Display;
use tokio::time::Instant;
use tracing::{debug, warn};
use watchtower_core::StorageAdapter;
use watchtower_core::types::MessageRecord;

const MAX_CONTEXT_TOPICS: usize = 5;

/// Five-level community mood derived from average recent sentiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Mood {
    Bullish,
    Optimistic,
    Neutral,
    Cautious,
    Bearish,
}

impl Mood {
    pub fn from_sentiment(average: f64) -> Self {
        if average > 2.0 {
            Mood::Bullish
        } else if average > 0.0 {
            Mood::Optimistic
        } else if average > -2.0 {
            Mood::Neutral
        } else if average > -4.0 {
            Mood::Cautious
        } else {
            Mood::Bearish
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationContext {
    pub community_id: String,
    pub channel_id: String,
    /// Oldest first.
    pub messages: Vec<MessageRecord>,
    pub participants: BTreeSet<String>,
    pub topics: Vec<String>,
    pub average_sentiment: f64,
    pub mood: Mood,
}

impl ConversationContext {
    pub fn from_window(community_id: &str, channel_id: &str, messages: Vec<MessageRecord>) -> Self {
        let participants = messages
            .iter()
            .filter(|m| !m.is_bot)
            .map(|m| m.author_id.clone())
            .collect();
        let average_sentiment = if messages.is_empty() {
            0.0
        } else {
            messages.iter().map(|m| m.sentiment).sum::<f64>() / messages.len() as f64
        };
        Self {
            community_id: community_id.to_string(),
            channel_id: channel_id.to_string(),
            topics: rank_topics(&messages),
            participants,
            average_sentiment,
            mood: Mood::from_sentiment(average_sentiment),
            messages,
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Topics ranked by how many window messages carry them; ties alphabetical.
fn rank_topics(messages: &[MessageRecord]) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for topic in messages.iter().flat_map(|m| m.topics.iter()) {
        *counts.entry(topic.as_str()).or_default() += 1;
    }
    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked
        .into_iter()
        .take(MAX_CONTEXT_TOPICS)
        .map(|(t, _)| t.to_string())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ChannelKey {
    community_id: String,
    channel_id: String,
}

struct Cached {
    context: Arc<ConversationContext>,
    built_at: Instant,
}

/// Per-channel context cache.
pub struct ContextCache {
    entries: DashMap<ChannelKey, Cached>,
    window: usize,
    ttl: Duration,
}

impl ContextCache {
    pub fn new(window: usize, ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            window: window.max(1),
            ttl,
        }
    }

    /// Returns the cached context, rebuilding it from storage when missing
    /// or expired. A failed fetch yields an empty context that is not cached.
    pub async fn get(
        &self,
        storage: &dyn StorageAdapter,
        community_id: &str,
        channel_id: &str,
    ) -> Arc<ConversationContext> {
        let key = ChannelKey {
            community_id: community_id.to_string(),
            channel_id: channel_id.to_string(),
        };
        if let Some(entry) = self.entries.get(&key)
            && entry.built_at.elapsed() < self.ttl
        {
            return entry.context.clone();
        }

        match storage
            .channel_messages(community_id, channel_id, self.window)
            .await
        {
            Ok(messages) => {
                debug!(community_id, channel_id, messages = messages.len(), "context rebuilt");
                let context = Arc::new(ConversationContext::from_window(
                    community_id,
                    channel_id,
                    messages,
                ));
                self.entries.insert(
                    key,
                    Cached {
                        context: context.clone(),
                        built_at: Instant::now(),
                    },
                );
                context
            }
            Err(e) => {
                warn!(community_id, channel_id, error = %e, "context fetch failed, using empty window");
                Arc::new(ConversationContext::from_window(community_id, channel_id, Vec::new()))
            }
        }
    }

    /// Appends a fresh message to a cached window. No-op when the channel
    /// is not cached; the next miss will load it from storage.
    pub fn observe(&self, record: &MessageRecord) {
        let key = ChannelKey {
            community_id: record.community_id.clone(),
            channel_id: record.channel_id.clone(),
        };
        if let Some(mut entry) = self.entries.get_mut(&key) {
            if entry.context.messages.iter().any(|m| m.id == record.id) {
                return;
            }
            let mut messages = entry.context.messages.clone();
            messages.push(record.clone());
            let excess = messages.len().saturating_sub(self.window);
            messages.drain(..excess);
            entry.context = Arc::new(ConversationContext::from_window(
                &record.community_id,
                &record.channel_id,
                messages,
            ));
        }
    }

    /// Drops expired entries.
    pub fn prune(&self) {
        self.entries.retain(|_, c| c.built_at.elapsed() < self.ttl);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use watchtower_test_utils::{MemoryStorage, message};

    fn rec(id: &str, author: &str, sentiment: f64, topics: &[&str]) -> MessageRecord {
        let mut r = MessageRecord::unanalyzed(&message(id, "c1", "general", author, "x", 0));
        r.sentiment = sentiment;
        r.topics = topics.iter().map(|t| t.to_string()).collect();
        r
    }

    #[test]
    fn mood_buckets() {
        assert_eq!(Mood::from_sentiment(2.5), Mood::Bullish);
        assert_eq!(Mood::from_sentiment(2.0), Mood::Optimistic);
        assert_eq!(Mood::from_sentiment(0.0), Mood::Neutral);
        assert_eq!(Mood::from_sentiment(-2.0), Mood::Cautious);
        assert_eq!(Mood::from_sentiment(-4.0), Mood::Bearish);
    }

    #[test]
    fn window_summary() {
        let ctx = ConversationContext::from_window(
            "c1",
            "general",
            vec![
                rec("1", "alice", 3.0, &["staking", "vault"]),
                rec("2", "bob", 1.0, &["staking"]),
                rec("3", "alice", 2.0, &["airdrop"]),
            ],
        );
        assert_eq!(ctx.participants.len(), 2);
        assert_eq!(ctx.topics, vec!["staking", "airdrop", "vault"]);
        assert!((ctx.average_sentiment - 2.0).abs() < 1e-9);
        assert_eq!(ctx.mood, Mood::Optimistic);
    }

    #[tokio::test(start_paused = true)]
    async fn cache_rebuilds_after_ttl() {
        let storage = MemoryStorage::new();
        storage.save_message(&rec("1", "alice", 0.0, &[])).await.unwrap();
        let cache = ContextCache::new(10, Duration::from_secs(60));

        assert_eq!(cache.get(&storage, "c1", "general").await.len(), 1);
        let mut second = rec("2", "bob", 0.0, &[]);
        second.timestamp += chrono::Duration::seconds(5);
        storage.save_message(&second).await.unwrap();
        assert_eq!(cache.get(&storage, "c1", "general").await.len(), 1);

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(cache.get(&storage, "c1", "general").await.len(), 2);
    }

    #[tokio::test]
    async fn observe_extends_cached_window() {
        let storage = MemoryStorage::new();
        let cache = ContextCache::new(2, Duration::from_secs(60));
        assert!(cache.get(&storage, "c1", "general").await.is_empty());
        for id in ["a", "b", "c"] {
            cache.observe(&rec(id, "alice", 0.0, &[]));
        }
        cache.observe(&rec("c", "alice", 0.0, &[]));
        let ids: Vec<String> = cache
            .get(&storage, "c1", "general")
            .await
            .messages
            .iter()
            .map(|m| m.id.clone())
            .collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[tokio::test]
    async fn storage_failure_gives_empty_uncached_context() {
        let storage = MemoryStorage::new();
        storage.set_failing(true);
        let cache = ContextCache::new(10, Duration::from_secs(60));
        assert!(cache.get(&storage, "c1", "general").await.is_empty());
        assert!(cache.is_empty());
    }
}
