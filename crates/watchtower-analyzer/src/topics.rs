// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Frequency-weighted topic extraction over stemmed tokens.

use std::collections::HashMap;

use crate::tokenize::{is_stopword, stem};

/// Maximum topics returned per message.
pub const MAX_TOPICS: usize = 5;

const MIN_TOPIC_LEN: usize = 3;

/// Ranked topics for a token stream.
///
/// Each candidate stem is weighted by term frequency times `log2(1 + len)`,
/// so longer, more specific words outrank short ones at equal frequency.
/// The surface form reported is the first unstemmed token that produced the
/// stem. Ties break alphabetically, so the ranking is fully deterministic.
pub fn extract_topics(tokens: &[String]) -> Vec<String> {
    let candidates: Vec<&String> = tokens
        .iter()
        .filter(|t| {
            t.chars().count() >= MIN_TOPIC_LEN
                && !is_stopword(t)
                && !t.chars().all(|c| c.is_ascii_digit() || c == '$')
        })
        .collect();
    if candidates.is_empty() {
        return Vec::new();
    }

    let total = candidates.len() as f64;
    let mut stats: HashMap<String, (usize, &str)> = HashMap::new();
    for token in &candidates {
        let entry = stats.entry(stem(token)).or_insert((0, token.as_str()));
        entry.0 += 1;
    }

    let mut ranked: Vec<(f64, &str)> = stats
        .iter()
        .map(|(stem, (count, surface))| {
            let tf = *count as f64 / total;
            let weight = tf * (1.0 + stem.chars().count() as f64).log2();
            (weight, *surface)
        })
        .collect();
    ranked.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));

    ranked
        .into_iter()
        .take(MAX_TOPICS)
        .map(|(_, surface)| surface.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenize::tokenize;

    fn topics(text: &str) -> Vec<String> {
        extract_topics(&tokenize(text))
    }

    #[test]
    fn frequent_terms_rank_first() {
        let t = topics("staking rewards staking pools staking apy rewards");
        assert_eq!(t[0], "staking");
        assert_eq!(t[1], "rewards");
    }

    #[test]
    fn stems_merge_inflections() {
        let t = topics("validator validators validating");
        // All three share the stem "validat" or "validator"; at most two survive.
        assert!(t.len() <= 2);
        assert_eq!(t[0], "validator");
    }

    #[test]
    fn caps_at_five() {
        let t = topics("alpha bravo charlie delta echo foxtrot golf hotel");
        assert_eq!(t.len(), MAX_TOPICS);
    }

    #[test]
    fn stopwords_and_short_tokens_dropped() {
        assert!(topics("the and of to a is").is_empty());
        assert!(topics("gm gn ok").is_empty());
        assert!(topics("1000 $100").is_empty());
    }

    #[test]
    fn deterministic_order_on_ties() {
        let a = topics("zebra apple mango");
        let b = topics("mango zebra apple");
        assert_eq!(a, b);
    }
}
