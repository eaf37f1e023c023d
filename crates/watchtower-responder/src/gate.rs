// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Response gating: whether the bot should answer a message at all.

use std::collections::VecDeque;
use std::time::Duration;

use dashmap::DashMap;
use serde::Serialize;
use strum::Display;
use tokio::time::Instant;
use watchtower_analyzer::AnalysisResult;
use watchtower_config::model::ResponderConfig;
use watchtower_core::RandomSource;
use watchtower_core::types::{MentionKind, MessageRecord};

/// Why the gate decided the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GateReason {
    BotAuthor,
    RateLimited,
    Mentioned,
    Question,
    Technical,
    Baseline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GateDecision {
    pub respond: bool,
    pub reason: GateReason,
}

/// Bot replies sent per channel inside a sliding window.
pub struct RecentResponses {
    sent: DashMap<(String, String), VecDeque<Instant>>,
    window: Duration,
}

impl RecentResponses {
    pub fn new(window: Duration) -> Self {
        Self {
            sent: DashMap::new(),
            window,
        }
    }

    pub fn record(&self, community_id: &str, channel_id: &str) {
        self.try_record(community_id, channel_id, usize::MAX);
    }

    /// Records a send unless the channel already holds more than `limit`
    /// live sends. Check and insert happen under the same entry lock.
    pub fn try_record(&self, community_id: &str, channel_id: &str, limit: usize) -> bool {
        let mut entry = self
            .sent
            .entry((community_id.to_string(), channel_id.to_string()))
            .or_default();
        let window = self.window;
        while entry.front().is_some_and(|t| t.elapsed() >= window) {
            entry.pop_front();
        }
        if entry.len() > limit {
            return false;
        }
        entry.push_back(Instant::now());
        true
    }

    pub fn count(&self, community_id: &str, channel_id: &str) -> usize {
        self.sent
            .get(&(community_id.to_string(), channel_id.to_string()))
            .map_or(0, |q| q.iter().filter(|t| t.elapsed() < self.window).count())
    }

    /// Drops expired sends and forgets channels left with none.
    pub fn prune(&self) {
        let window = self.window;
        self.sent.retain(|_, q| {
            while q.front().is_some_and(|t| t.elapsed() >= window) {
                q.pop_front();
            }
            !q.is_empty()
        });
    }

    pub fn tracked_channels(&self) -> usize {
        self.sent.len()
    }
}

/// Probabilities and the spam cap for the gate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GatePolicy {
    pub recent_limit: usize,
    pub question_probability: f64,
    pub technical_probability: f64,
    pub baseline_probability: f64,
}

impl From<&ResponderConfig> for GatePolicy {
    fn from(cfg: &ResponderConfig) -> Self {
        Self {
            recent_limit: cfg.recent_response_limit,
            question_probability: cfg.question_probability,
            technical_probability: cfg.technical_probability,
            baseline_probability: cfg.baseline_probability,
        }
    }
}

fn mentions_bot(analysis: &AnalysisResult, bot_user_id: Option<&str>) -> bool {
    bot_user_id.is_some_and(|bot| {
        analysis
            .mentions
            .iter()
            .any(|m| m.kind == MentionKind::User && m.id == bot)
    })
}

/// Decides whether to respond. Only the probabilistic branches consume
/// a value from `rng`.
pub fn should_respond(
    record: &MessageRecord,
    analysis: &AnalysisResult,
    recent_sends: usize,
    bot_user_id: Option<&str>,
    policy: &GatePolicy,
    rng: &dyn RandomSource,
) -> GateDecision {
    let decide = |respond, reason| GateDecision { respond, reason };

    if record.is_bot || bot_user_id.is_some_and(|b| b == record.author_id) {
        return decide(false, GateReason::BotAuthor);
    }
    if recent_sends > policy.recent_limit {
        return decide(false, GateReason::RateLimited);
    }
    if mentions_bot(analysis, bot_user_id) {
        return decide(true, GateReason::Mentioned);
    }
    if analysis.is_question || record.content.contains('?') {
        return decide(rng.chance(policy.question_probability), GateReason::Question);
    }
    if analysis.domain.is_technical() {
        return decide(rng.chance(policy.technical_probability), GateReason::Technical);
    }
    decide(rng.chance(policy.baseline_probability), GateReason::Baseline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use watchtower_analyzer::Analyzer;
    use watchtower_test_utils::{ScriptedRandom, message};

    fn policy() -> GatePolicy {
        GatePolicy::from(&ResponderConfig::default())
    }

    fn gate(content: &str, recent: usize, rng: f64) -> GateDecision {
        let analyzer = Analyzer::new();
        let (record, analysis) = analyzer.annotate(&message("m", "c", "ch", "alice", content, 0));
        should_respond(&record, &analysis, recent, Some("999"), &policy(), &ScriptedRandom::constant(rng))
    }

    #[test]
    fn bots_never_get_replies() {
        let analyzer = Analyzer::new();
        let mut msg = message("m", "c", "ch", "other-bot", "<@999> hi?", 0);
        msg.is_bot = true;
        let (record, analysis) = analyzer.annotate(&msg);
        let d = should_respond(&record, &analysis, 0, Some("999"), &policy(), &ScriptedRandom::constant(0.0));
        assert_eq!(d, GateDecision { respond: false, reason: GateReason::BotAuthor });
    }

    #[test]
    fn spam_cap_beats_mentions() {
        let d = gate("<@999> hello", 4, 0.0);
        assert_eq!(d.reason, GateReason::RateLimited);
        assert!(!d.respond);
        assert!(gate("<@999> hello", 3, 0.99).respond);
    }

    #[test]
    fn mention_is_unconditional() {
        let d = gate("<@999> hello", 0, 0.99);
        assert_eq!(d, GateDecision { respond: true, reason: GateReason::Mentioned });
    }

    #[test]
    fn probabilistic_branches() {
        assert!(gate("wen token?", 0, 0.69).respond);
        assert!(!gate("wen token?", 0, 0.70).respond);
        assert_eq!(gate("wen token?", 0, 0.0).reason, GateReason::Question);

        assert!(gate("the validator node is syncing", 0, 0.39).respond);
        assert!(!gate("the validator node is syncing", 0, 0.41).respond);

        assert!(gate("nice weather", 0, 0.09).respond);
        assert!(!gate("nice weather", 0, 0.11).respond);
        assert_eq!(gate("nice weather", 0, 0.5).reason, GateReason::Baseline);
    }

    #[tokio::test(start_paused = true)]
    async fn recent_responses_expire() {
        let recent = RecentResponses::new(Duration::from_secs(300));
        recent.record("c", "ch");
        recent.record("c", "ch");
        assert_eq!(recent.count("c", "ch"), 2);
        assert_eq!(recent.count("c", "other"), 0);
        tokio::time::advance(Duration::from_secs(301)).await;
        assert_eq!(recent.count("c", "ch"), 0);
    }

    #[test]
    fn concurrent_claims_respect_the_cap() {
        let recent = RecentResponses::new(Duration::from_secs(300));
        let granted = std::sync::atomic::AtomicUsize::new(0);
        std::thread::scope(|scope| {
            for _ in 0..16 {
                scope.spawn(|| {
                    if recent.try_record("c", "ch", 3) {
                        granted.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                    }
                });
            }
        });
        assert_eq!(granted.into_inner(), 4);
        assert_eq!(recent.count("c", "ch"), 4);
        assert!(!recent.try_record("c", "ch", 3));
    }

    #[tokio::test(start_paused = true)]
    async fn prune_forgets_idle_channels() {
        let recent = RecentResponses::new(Duration::from_secs(300));
        recent.record("c", "old");
        tokio::time::advance(Duration::from_secs(200)).await;
        recent.record("c", "live");
        assert_eq!(recent.tracked_channels(), 2);

        tokio::time::advance(Duration::from_secs(101)).await;
        recent.prune();
        assert_eq!(recent.tracked_channels(), 1);
        assert_eq!(recent.count("c", "live"), 1);
    }
}
