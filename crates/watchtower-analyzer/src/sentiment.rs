// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lexicon sentiment scoring with single-token negation.

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

/// Word valences on a -5..=5 scale. General English plus community slang.
const LEXICON: &[(&str, i32)] = &[
    // general positive
    ("good", 3), ("great", 3), ("awesome", 4), ("amazing", 4), ("excellent", 3),
    ("love", 3), ("like", 2), ("nice", 3), ("happy", 3), ("excited", 3), ("thanks", 2),
    ("thank", 2), ("cool", 1), ("best", 3), ("win", 4), ("winning", 4), ("wow", 4),
    ("fantastic", 4), ("helpful", 2), ("solid", 2), ("strong", 2), ("success", 2),
    ("congrats", 2), ("congratulations", 2), ("impressive", 3), ("legit", 2),
    ("profit", 2), ("gain", 2), ("gains", 2), ("safe", 1), ("welcome", 2), ("glad", 3),
    // community positive slang
    ("bullish", 3), ("moon", 3), ("mooning", 3), ("pump", 2), ("pumping", 2), ("ath", 2),
    ("lfg", 3), ("wagmi", 3), ("gem", 3), ("hodl", 1), ("based", 2), ("alpha", 2),
    ("rocket", 2), ("lambo", 2), ("undervalued", 2), ("gm", 1),
    // general negative
    ("bad", -3), ("terrible", -3), ("awful", -3), ("horrible", -3), ("hate", -3),
    ("worst", -3), ("sad", -2), ("angry", -3), ("wrong", -2), ("problem", -2),
    ("issue", -1), ("broken", -1), ("bug", -2), ("fail", -2), ("failed", -2),
    ("loss", -3), ("lost", -3), ("losing", -3), ("worried", -3), ("fear", -2),
    ("scared", -2), ("stupid", -2), ("useless", -2), ("disappointed", -2), ("slow", -2),
    ("down", -1), ("crash", -2), ("crashed", -2), ("hack", -2), ("hacked", -3),
    ("exploit", -2), ("stolen", -3), ("delay", -1), ("delayed", -1), ("dead", -3),
    // community negative slang
    ("bearish", -3), ("dump", -2), ("dumping", -2), ("rug", -4), ("rugged", -4),
    ("rugpull", -4), ("scam", -4), ("scammer", -4), ("ponzi", -4), ("fud", -2),
    ("rekt", -3), ("ngmi", -3), ("jeet", -2), ("overvalued", -2), ("honeypot", -4),
];

const NEGATORS: &[&str] = &[
    "not", "no", "never", "isn't", "isnt", "don't", "dont", "doesn't", "doesnt", "didn't",
    "didnt", "can't", "cant", "won't", "wont", "wasn't", "wasnt", "aren't", "arent", "ain't",
];

static VALENCES: LazyLock<HashMap<&'static str, i32>> =
    LazyLock::new(|| LEXICON.iter().copied().collect());

/// Sentiment totals for a token stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentScore {
    /// Signed sum of token valences.
    pub score: f64,
    /// Sum of positive contributions.
    pub positive: f64,
    /// Sum of negative contributions, as a positive magnitude.
    pub negative: f64,
    /// `score` divided by token count.
    pub comparative: f64,
}

/// Scores lowercased tokens. A negator immediately before a scored word
/// flips that word's sign.
pub fn score_tokens(tokens: &[String]) -> SentimentScore {
    if tokens.is_empty() {
        return SentimentScore::default();
    }

    let mut positive = 0i32;
    let mut negative = 0i32;
    for (idx, token) in tokens.iter().enumerate() {
        let Some(&valence) = VALENCES.get(token.as_str()) else {
            continue;
        };
        let negated = idx > 0 && NEGATORS.contains(&tokens[idx - 1].as_str());
        let valence = if negated { -valence } else { valence };
        if valence > 0 {
            positive += valence;
        } else {
            negative -= valence;
        }
    }

    let score = f64::from(positive - negative);
    SentimentScore {
        score,
        positive: f64::from(positive),
        negative: f64::from(negative),
        comparative: score / tokens.len() as f64,
    }
}
