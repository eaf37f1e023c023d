// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user behavior scoring.
//!
//! [`BehaviorScorer::score`] turns a user's time-ordered message history
//! into aggregate statistics and a 0..=10 suspicion score. It is a pure
//! function of its inputs. [`apply`] folds the result into the stored
//! profile, and [`mark_trusted`] performs the moderator soft reset.

pub mod patterns;
pub mod score;
pub mod timing;

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use watchtower_config::model::BehaviorConfig;
use watchtower_core::types::{MessageRecord, ResponsePattern, UserBehaviorProfile};

pub use score::ScoreInputs;

pub const HIGH_REPLY_RATE: &str = "high_reply_rate";
pub const HIGH_REACTION_USAGE: &str = "high_reaction_usage";
pub const FREQUENT_CONVERSATION_STARTER: &str = "frequent_conversation_starter";

/// Result of one scoring pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BehaviorAnalysis {
    pub message_count: usize,
    pub message_frequency: f64,
    pub average_message_length: f64,
    pub topic_consistency: f64,
    pub interaction_patterns: Vec<String>,
    pub hourly_activity: [u32; 24],
    pub activity_unusual: bool,
    pub response_patterns: ResponsePattern,
    pub repetition_rate: f64,
    pub generic_rate: f64,
    pub common_phrases: Vec<String>,
    pub suspicion_score: u8,
    pub risk_factors: Vec<String>,
}

/// Signal raised when the score reaches the alert threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct SuspicionSignal {
    pub user_id: String,
    pub community_id: String,
    pub score: u8,
    pub risk_factors: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct BehaviorScorer {
    alert_threshold: u8,
    trusted_decrement: u8,
}

impl BehaviorScorer {
    pub fn new(config: &BehaviorConfig) -> Self {
        Self {
            alert_threshold: config.alert_threshold,
            trusted_decrement: config.trusted_score_decrement,
        }
    }

    pub fn alert_threshold(&self) -> u8 {
        self.alert_threshold
    }

    /// Scores `history` (the user's own messages, oldest first).
    ///
    /// `context` is the surrounding time-ordered community traffic used for
    /// response latency; pass `history` again when nothing wider is known.
    /// A verified prior profile has the trusted decrement applied to the
    /// numeric score.
    pub fn score(
        &self,
        prior: &UserBehaviorProfile,
        history: &[MessageRecord],
        context: &[MessageRecord],
    ) -> BehaviorAnalysis {
        if history.is_empty() {
            return BehaviorAnalysis::default();
        }

        let count = history.len();
        let total = count as f64;

        let average_message_length = history
            .iter()
            .map(|m| m.content.chars().count())
            .sum::<usize>() as f64
            / total;
        let unique_topics: HashSet<&str> = history
            .iter()
            .flat_map(|m| m.topics.iter().map(String::as_str))
            .collect();
        let topic_consistency = (1.0 - unique_topics.len() as f64 / total).max(0.0);

        let content = patterns::content_pattern(history);
        let hourly_activity = timing::hourly_histogram(history);
        let activity_unusual = timing::is_unusual_activity(&hourly_activity);
        let response_patterns = timing::response_pattern(&prior.user_id, context);
        let message_frequency = timing::message_frequency(history);

        let reply_rate = history
            .iter()
            .filter(|m| m.reply_to.is_some() || !m.mentions.is_empty())
            .count() as f64
            / total;
        let mut interaction_patterns = Vec::new();
        if reply_rate > 0.8 {
            interaction_patterns.push(HIGH_REPLY_RATE.to_string());
        }
        if content.reaction_rate > 0.5 {
            interaction_patterns.push(HIGH_REACTION_USAGE.to_string());
        }
        if timing::burst_start_rate(history) > 0.3 {
            interaction_patterns.push(FREQUENT_CONVERSATION_STARTER.to_string());
        }

        let inputs = ScoreInputs {
            message_frequency,
            average_message_length,
            repetition_rate: content.repetition_rate,
            generic_rate: content.generic_rate,
            activity_unusual,
            fast_response_fraction: response_patterns.fast_fraction(),
            topic_consistency,
        };
        let mut suspicion_score = score::suspicion_score(&inputs);
        if prior.verified {
            suspicion_score = suspicion_score.saturating_sub(self.trusted_decrement);
        }

        BehaviorAnalysis {
            message_count: count,
            message_frequency,
            average_message_length,
            topic_consistency,
            interaction_patterns,
            hourly_activity,
            activity_unusual,
            response_patterns,
            repetition_rate: content.repetition_rate,
            generic_rate: content.generic_rate,
            common_phrases: content.common_phrases,
            suspicion_score,
            risk_factors: score::risk_factors(&inputs),
        }
    }

    /// The alert signal for `analysis`, if its score reaches the threshold.
    pub fn signal(
        &self,
        profile: &UserBehaviorProfile,
        analysis: &BehaviorAnalysis,
    ) -> Option<SuspicionSignal> {
        (analysis.suspicion_score >= self.alert_threshold).then(|| SuspicionSignal {
            user_id: profile.user_id.clone(),
            community_id: profile.community_id.clone(),
            score: analysis.suspicion_score,
            risk_factors: analysis.risk_factors.clone(),
        })
    }

    /// Moderator soft reset: lowers the score and marks the user verified.
    pub fn mark_trusted(&self, profile: &mut UserBehaviorProfile) {
        profile.suspicion_score = profile.suspicion_score.saturating_sub(self.trusted_decrement);
        profile.verified = true;
    }
}

/// Folds an analysis into the stored profile. Derived fields are replaced;
/// identity and the verified flag are kept.
pub fn apply(profile: &mut UserBehaviorProfile, analysis: &BehaviorAnalysis, now: DateTime<Utc>) {
    profile.message_frequency = analysis.message_frequency;
    profile.average_message_length = analysis.average_message_length;
    profile.topic_consistency = analysis.topic_consistency;
    profile.interaction_patterns = analysis.interaction_patterns.clone();
    profile.suspicion_score = analysis.suspicion_score;
    profile.hourly_activity = analysis.hourly_activity;
    profile.common_phrases = analysis.common_phrases.clone();
    profile.response_patterns = analysis.response_patterns.clone();
    profile.risk_factors = analysis.risk_factors.clone();
    profile.last_analysis = Some(now);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;
    use watchtower_core::types::{BehaviorKey, DomainAnalysis};

    fn scorer() -> BehaviorScorer {
        BehaviorScorer::new(&BehaviorConfig::default())
    }

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 9, 0, 0).unwrap()
    }

    fn record(author: &str, content: &str, offset_secs: i64, topics: &[&str]) -> MessageRecord {
        MessageRecord {
            id: format!("{author}-{offset_secs}"),
            community_id: "c1".into(),
            channel_id: "general".into(),
            author_id: author.into(),
            content: content.into(),
            timestamp: base() + Duration::seconds(offset_secs),
            is_moderator: false,
            is_bot: false,
            reply_to: None,
            sentiment: 0.0,
            topics: topics.iter().map(|t| t.to_string()).collect(),
            mentions: vec![],
            domain: DomainAnalysis::default(),
        }
    }

    fn profile() -> UserBehaviorProfile {
        UserBehaviorProfile::new(&BehaviorKey::new("u1", "c1"))
    }

    #[test]
    fn empty_history_is_all_zero() {
        let a = scorer().score(&profile(), &[], &[]);
        assert_eq!(a, BehaviorAnalysis::default());
        assert_eq!(a.suspicion_score, 0);
        assert!(scorer().signal(&profile(), &a).is_none());
    }

    #[test]
    fn spam_burst_scores_maximum() {
        // 25 messages inside one hour, two distinct contents, avg length 8.
        let history: Vec<_> = (0..25)
            .map(|i| {
                let content = if i % 9 == 4 { "any news" } else { "gm frens" };
                record("u1", content, i * 120, &[])
            })
            .collect();
        let a = scorer().score(&profile(), &history, &history);

        assert_eq!(a.message_frequency, 25.0);
        assert!((a.average_message_length - 8.0).abs() < 1e-9);
        assert!(a.repetition_rate > 0.9);
        assert!(a.generic_rate > 0.8);
        assert_eq!(a.suspicion_score, 10);
        for factor in [
            score::EXCESSIVE_MESSAGING,
            score::HIGH_REPETITION,
            score::GENERIC_RESPONSES,
            score::SHORT_MESSAGES,
        ] {
            assert!(a.risk_factors.iter().any(|f| f == factor), "missing {factor}");
        }
        let signal = scorer().signal(&profile(), &a).unwrap();
        assert_eq!(signal.score, 10);
        assert_eq!(signal.user_id, "u1");
    }

    #[test]
    fn ordinary_conversation_scores_low() {
        let lines = [
            ("how does the bridge handle reorgs on the source chain?", &["bridge", "reorgs"][..]),
            ("I read the audit report, the oracle findings look resolved", &["audit", "oracle"]),
            ("anyone staking on the new validator set yet?", &["staking", "validator"]),
            ("the governance proposal for fee switch passed yesterday", &["governance", "fee"]),
        ];
        let history: Vec<_> = lines
            .iter()
            .enumerate()
            .map(|(i, (c, t))| record("u1", c, i as i64 * 7200, t))
            .collect();
        let a = scorer().score(&profile(), &history, &history);
        assert!(a.suspicion_score <= 3, "score {}", a.suspicion_score);
        assert!(!a.risk_factors.iter().any(|f| f == score::HIGH_REPETITION));
        assert_eq!(a.interaction_patterns, vec![FREQUENT_CONVERSATION_STARTER]);
    }

    #[test]
    fn reply_and_reaction_tags() {
        let mut history: Vec<_> = (0..5).map(|i| record("u1", "🚀🚀", i * 10, &[])).collect();
        for m in &mut history {
            m.reply_to = Some("parent".into());
        }
        let a = scorer().score(&profile(), &history, &history);
        assert!(a.interaction_patterns.iter().any(|p| p == HIGH_REPLY_RATE));
        assert!(a.interaction_patterns.iter().any(|p| p == HIGH_REACTION_USAGE));
    }

    #[test]
    fn fast_responder_is_flagged() {
        let mut context = Vec::new();
        let mut history = Vec::new();
        for i in 0..10 {
            context.push(record("other", "question about staking rewards?", i * 600, &[]));
            let reply = record("u1", "check the pinned docs for details", i * 600 + 3, &[]);
            context.push(reply.clone());
            history.push(reply);
        }
        let a = scorer().score(&profile(), &history, &context);
        assert_eq!(a.response_patterns.total_gaps, 10);
        assert_eq!(a.response_patterns.fast_responses, 10);
        assert!(a.risk_factors.iter().any(|f| f == score::AUTOMATED_TIMING));
    }

    #[test]
    fn verified_users_get_decrement() {
        let history: Vec<_> = (0..25).map(|i| record("u1", "gm", i * 60, &[])).collect();
        let mut trusted = profile();
        trusted.verified = true;
        let raw = scorer().score(&profile(), &history, &history).suspicion_score;
        let adjusted = scorer().score(&trusted, &history, &history).suspicion_score;
        assert_eq!(adjusted, raw - 3);
    }

    #[test]
    fn mark_trusted_soft_resets() {
        let mut p = profile();
        p.suspicion_score = 8;
        scorer().mark_trusted(&mut p);
        assert_eq!(p.suspicion_score, 5);
        assert!(p.verified);

        p.suspicion_score = 1;
        scorer().mark_trusted(&mut p);
        assert_eq!(p.suspicion_score, 0);
    }

    #[test]
    fn apply_keeps_identity_and_verification() {
        let mut p = profile();
        p.verified = true;
        let history: Vec<_> = (0..3).map(|i| record("u1", "hello there friend", i, &[])).collect();
        let a = scorer().score(&p, &history, &history);
        apply(&mut p, &a, base());
        assert!(p.verified);
        assert_eq!(p.user_id, "u1");
        assert_eq!(p.last_analysis, Some(base()));
        assert_eq!(p.hourly_activity[9], 3);
    }

    fn arb_history() -> impl Strategy<Value = Vec<MessageRecord>> {
        prop::collection::vec(
            (
                prop::sample::select(vec!["gm", "wen moon", "🚀", "how do I stake?", "nice", "a much longer message about validator economics"]),
                0i64..20_000,
                prop::bool::ANY,
            ),
            0..60,
        )
        .prop_map(|items| {
            let mut offsets: Vec<_> = items.iter().map(|(_, o, _)| *o).collect();
            offsets.sort_unstable();
            items
                .into_iter()
                .zip(offsets)
                .map(|((content, _, other), offset)| {
                    record(if other { "u2" } else { "u1" }, content, offset, &[])
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn score_is_bounded(history in arb_history()) {
            let own: Vec<_> = history.iter().filter(|m| m.author_id == "u1").cloned().collect();
            let a = scorer().score(&profile(), &own, &history);
            prop_assert!(a.suspicion_score <= 10);
        }

        #[test]
        fn score_is_deterministic(history in arb_history()) {
            let own: Vec<_> = history.iter().filter(|m| m.author_id == "u1").cloned().collect();
            let first = scorer().score(&profile(), &own, &history);
            let second = scorer().score(&profile(), &own, &history);
            prop_assert_eq!(first, second);
        }
    }
}
