// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stateless per-message feature extraction.
//!
//! [`Analyzer::analyze`] is a pure function of message content. It never
//! fails: empty or unparseable input yields [`AnalysisResult::default`].

pub mod domain;
pub mod sentiment;
pub mod tokenize;
pub mod topics;

use serde::{Deserialize, Serialize};
use watchtower_core::types::{DomainAnalysis, IngestedMessage, Mention, MessageRecord};

pub use sentiment::SentimentScore;

/// Upper bound for the technical-level and urgency scores.
pub const MAX_LEVEL: f64 = 10.0;

/// Lexical complexity of a message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Complexity {
    /// Unique tokens over total tokens.
    pub lexical_diversity: f64,
    /// Mean token length in characters.
    pub average_token_length: f64,
}

/// Everything extracted from one message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub sentiment: SentimentScore,
    pub topics: Vec<String>,
    pub mentions: Vec<Mention>,
    pub domain: DomainAnalysis,
    /// Share of technical tokens, scaled to 0..=10.
    pub technical_level: f64,
    pub complexity: Complexity,
    /// Twice the urgent keyword count, capped at 10.
    pub urgency: f64,
    pub is_question: bool,
    pub token_count: usize,
}

/// Feature extractor. Holds no state; cheap to clone and share.
#[derive(Debug, Clone, Copy, Default)]
pub struct Analyzer;

impl Analyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, content: &str) -> AnalysisResult {
        if content.trim().is_empty() {
            return AnalysisResult::default();
        }

        let mentions = domain::extract_mentions(content);
        let text = domain::strip_mentions(content);
        let tokens = tokenize::tokenize(&text);
        if tokens.is_empty() {
            return AnalysisResult {
                mentions,
                is_question: content.contains('?'),
                ..AnalysisResult::default()
            };
        }

        let total = tokens.len() as f64;
        let technical_level =
            (domain::technical_token_count(&tokens) as f64 / total * MAX_LEVEL).clamp(0.0, MAX_LEVEL);
        let unique = tokens
            .iter()
            .collect::<std::collections::HashSet<_>>()
            .len();
        let complexity = Complexity {
            lexical_diversity: unique as f64 / total,
            average_token_length: tokens.iter().map(|t| t.chars().count()).sum::<usize>() as f64
                / total,
        };
        let urgency = (2.0 * domain::urgent_keyword_count(&tokens) as f64).min(MAX_LEVEL);

        AnalysisResult {
            sentiment: sentiment::score_tokens(&tokens),
            topics: topics::extract_topics(&tokens),
            mentions,
            domain: domain::analyze_domain(&text, &tokens),
            technical_level,
            complexity,
            urgency,
            is_question: content.contains('?'),
            token_count: tokens.len(),
        }
    }

    /// Analyses an ingested message into its persistable record.
    pub fn annotate(&self, msg: &IngestedMessage) -> (MessageRecord, AnalysisResult) {
        let result = self.analyze(&msg.content);
        let mut record = MessageRecord::unanalyzed(msg);
        record.sentiment = result.sentiment.score;
        record.topics = result.topics.clone();
        record.mentions = result.mentions.clone();
        record.domain = result.domain.clone();
        (record, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;
    use watchtower_core::types::MentionKind;

    #[test]
    fn empty_content_is_zero() {
        let r = Analyzer::new().analyze("");
        assert_eq!(r.sentiment.score, 0.0);
        assert!(r.topics.is_empty());
        assert!(r.mentions.is_empty());
        assert!(r.domain.crypto_mentions.is_empty());
        assert!(r.domain.technical_terms.is_empty());
        assert!(r.domain.trading_signals.is_empty());
        assert!(r.domain.update_keywords.is_empty());
        assert!(!r.domain.price_discussion);
        assert_eq!(r.technical_level, 0.0);
        assert_eq!(r, AnalysisResult::default());
    }

    #[test]
    fn mention_only_message() {
        let r = Analyzer::new().analyze("<@123>");
        assert_eq!(r.mentions.len(), 1);
        assert_eq!(r.mentions[0].kind, MentionKind::User);
        assert!(r.topics.is_empty());
        assert_eq!(r.token_count, 0);
    }

    #[test]
    fn mention_ids_do_not_become_topics() {
        let r = Analyzer::new().analyze("<@987654321> staking question?");
        assert!(r.topics.iter().all(|t| !t.contains("987654321")));
        assert!(r.is_question);
    }

    #[test]
    fn technical_level_is_share_of_tokens() {
        // 2 of 4 tokens are technical.
        let r = Analyzer::new().analyze("deploy the contract now");
        assert!((r.technical_level - 5.0).abs() < 1e-9);
    }

    #[test]
    fn urgency_is_capped() {
        let r = Analyzer::new().analyze("help help help help help help urgent");
        assert_eq!(r.urgency, 10.0);
        let r = Analyzer::new().analyze("need help");
        assert_eq!(r.urgency, 2.0);
    }

    #[test]
    fn complexity_measures() {
        let r = Analyzer::new().analyze("moon moon moon moon");
        assert!((r.complexity.lexical_diversity - 0.25).abs() < 1e-9);
        assert!((r.complexity.average_token_length - 4.0).abs() < 1e-9);
    }

    #[test]
    fn annotate_copies_analysis_into_record() {
        let msg = IngestedMessage {
            id: "m1".into(),
            community_id: "c1".into(),
            channel_id: "ch1".into(),
            author_id: "u1".into(),
            content: "bullish on eth staking".into(),
            timestamp: Utc::now(),
            is_moderator: false,
            is_bot: false,
            reply_to: None,
        };
        let (record, result) = Analyzer::new().annotate(&msg);
        assert_eq!(record.sentiment, result.sentiment.score);
        assert_eq!(record.topics, result.topics);
        assert!(record.domain.crypto_mentions.contains(&"eth".to_string()));
        assert_eq!(record.id, "m1");
    }

    proptest! {
        #[test]
        fn never_panics_and_stays_bounded(s in ".{0,400}") {
            let r = Analyzer::new().analyze(&s);
            prop_assert!(r.topics.len() <= topics::MAX_TOPICS);
            prop_assert!((0.0..=MAX_LEVEL).contains(&r.technical_level));
            prop_assert!((0.0..=MAX_LEVEL).contains(&r.urgency));
            prop_assert!(r.sentiment.positive >= 0.0 && r.sentiment.negative >= 0.0);
        }

        #[test]
        fn pure_function_of_content(s in "[a-z $?<@>0-9]{0,120}") {
            let a = Analyzer::new().analyze(&s);
            let b = Analyzer::new().analyze(&s);
            prop_assert_eq!(a, b);
        }
    }
}
