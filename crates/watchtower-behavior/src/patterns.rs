// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Content pattern statistics: repetition, filler phrases, reactions.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use watchtower_core::types::MessageRecord;

/// Minimum length for a repeated phrase to be reported.
const PHRASE_MIN_CHARS: usize = 10;
/// A phrase must occur more than this many times.
const PHRASE_MIN_REPEATS: usize = 2;
const MAX_COMMON_PHRASES: usize = 5;

static GENERIC_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^(gm|gn|gmgm|good morning|good night)\b",
        r"^(hi|hello|hey|yo|sup)( (all|guys|everyone|frens|fam|team))?[!.\s]*$",
        r"^(nice|great|cool|awesome|amazing|wow|lol|lmao|based|true|facts)[!.\s]*$",
        r"^(lfg|wagmi|lets go|let's go)\b",
        r"\b(to the moon|wen moon|wen lambo|moon soon)\b",
        r"^(thanks|thank you|thx|ty|ok|okay|\+1|agreed|same)[!.\s]*$",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static CUSTOM_EMOJI: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<a?:\w+:\d+>").unwrap());

/// Lowercased, trimmed, whitespace-collapsed content.
pub fn normalize(content: &str) -> String {
    content
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub fn is_generic(content: &str) -> bool {
    let normalized = normalize(content);
    !normalized.is_empty() && GENERIC_PATTERNS.iter().any(|re| re.is_match(&normalized))
}

fn is_emoji_char(c: char) -> bool {
    matches!(u32::from(c),
        0x1F300..=0x1FAFF | 0x2600..=0x27BF | 0x1F000..=0x1F2FF | 0xFE0F | 0x200D | 0x2B50 | 0x2764)
}

/// A message made only of emoji (unicode or custom markup).
pub fn is_reaction(content: &str) -> bool {
    let stripped = CUSTOM_EMOJI.replace_all(content, "\u{2B50}");
    let mut saw_emoji = false;
    for c in stripped.chars() {
        if c.is_whitespace() {
            continue;
        }
        if !is_emoji_char(c) {
            return false;
        }
        saw_emoji = true;
    }
    saw_emoji
}

/// Aggregate content statistics for a message history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentPattern {
    /// `1 - unique contents / total`.
    pub repetition_rate: f64,
    /// Fraction of messages matching a filler phrase.
    pub generic_rate: f64,
    pub reaction_rate: f64,
    pub common_phrases: Vec<String>,
}

pub fn content_pattern(history: &[MessageRecord]) -> ContentPattern {
    if history.is_empty() {
        return ContentPattern::default();
    }
    let total = history.len() as f64;

    let normalized: Vec<String> = history.iter().map(|m| normalize(&m.content)).collect();
    let unique = normalized.iter().collect::<HashSet<_>>().len() as f64;
    let generic = history.iter().filter(|m| is_generic(&m.content)).count() as f64;
    let reactions = history.iter().filter(|m| is_reaction(&m.content)).count() as f64;

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for phrase in &normalized {
        if phrase.chars().count() > PHRASE_MIN_CHARS {
            *counts.entry(phrase.as_str()).or_default() += 1;
        }
    }
    let mut repeated: Vec<(&str, usize)> = counts
        .into_iter()
        .filter(|(_, n)| *n > PHRASE_MIN_REPEATS)
        .collect();
    repeated.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    ContentPattern {
        repetition_rate: (1.0 - unique / total).max(0.0),
        generic_rate: generic / total,
        reaction_rate: reactions / total,
        common_phrases: repeated
            .into_iter()
            .take(MAX_COMMON_PHRASES)
            .map(|(p, _)| p.to_string())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_filler_detected() {
        for s in ["gm", "GM frens", "hello everyone!", "nice", "LFG!!!", "wen moon ser", "thanks", "+1"] {
            assert!(is_generic(s), "{s}");
        }
        for s in ["", "how do I bridge to arbitrum?", "nice tokenomics breakdown here"] {
            assert!(!is_generic(s), "{s}");
        }
    }

    #[test]
    fn reactions_detected() {
        assert!(is_reaction("🚀🚀🚀"));
        assert!(is_reaction("🔥 ❤️"));
        assert!(is_reaction("<:pepe:12345> <a:dance:678>"));
        assert!(!is_reaction("🚀 lfg"));
        assert!(!is_reaction("   "));
    }

    #[test]
    fn normalize_collapses_whitespace() {
        assert_eq!(normalize("  Hello   WORLD \n"), "hello world");
    }
}
