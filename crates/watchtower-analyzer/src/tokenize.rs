// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tokenization, stopword filtering and a light suffix stemmer.

/// English stopwords plus chat filler that never makes a useful topic.
const STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "all", "am", "an", "and", "any", "are", "as", "at",
    "be", "because", "been", "before", "being", "below", "between", "both", "but", "by", "can",
    "could", "did", "do", "does", "doing", "down", "during", "each", "few", "for", "from",
    "further", "had", "has", "have", "having", "he", "her", "here", "hers", "him", "his", "how",
    "i", "if", "in", "into", "is", "it", "its", "just", "me", "more", "most", "my", "no", "nor",
    "not", "now", "of", "off", "on", "once", "only", "or", "other", "our", "ours", "out", "over",
    "own", "same", "she", "should", "so", "some", "such", "than", "that", "the", "their",
    "theirs", "them", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "would", "you", "your", "yours", "im", "dont",
    "get", "got", "like", "also", "really", "yeah", "yes", "ok", "okay", "lol", "gonna", "u",
];

/// Lowercased word tokens. Punctuation splits tokens; `$`, `'` and `-` are
/// kept inside words so `$eth`, `don't` and `layer-2` survive.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '$' || c == '\'' || c == '-'))
        .map(|t| t.trim_matches(|c: char| c == '\'' || c == '-'))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(&token)
}

/// Strips common English inflections. Deliberately conservative: only
/// suffixes that leave a stem of at least three characters are removed.
pub fn stem(token: &str) -> String {
    const SUFFIXES: &[&str] = &["ations", "ation", "ings", "ing", "edly", "ies", "ed", "es", "ly", "s"];

    if token.starts_with('$') || token.chars().any(|c| c.is_ascii_digit()) {
        return token.to_string();
    }
    for suffix in SUFFIXES {
        if let Some(stem) = token.strip_suffix(suffix)
            && stem.chars().count() >= 3
        {
            if *suffix == "ies" {
                return format!("{stem}y");
            }
            if *suffix == "s" && stem.ends_with('s') {
                return token.to_string();
            }
            return stem.to_string();
        }
    }
    token.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_on_punctuation() {
        assert_eq!(
            tokenize("Hello, WORLD! $ETH to the moon..."),
            vec!["hello", "world", "$eth", "to", "the", "moon"]
        );
    }

    #[test]
    fn keeps_inner_hyphen_and_apostrophe() {
        assert_eq!(tokenize("layer-2 isn't -dead-"), vec!["layer-2", "isn't", "dead"]);
    }

    #[test]
    fn empty_and_whitespace() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \n\t ").is_empty());
        assert!(tokenize("!!! ???").is_empty());
    }

    #[test]
    fn stems_common_suffixes() {
        assert_eq!(stem("staking"), "stak");
        assert_eq!(stem("validators"), "validator");
        assert_eq!(stem("bridges"), "bridg");
        assert_eq!(stem("tokenomics"), "tokenomic");
        assert_eq!(stem("communities"), "community");
        assert_eq!(stem("pass"), "pass");
    }

    #[test]
    fn short_and_symbol_tokens_untouched() {
        assert_eq!(stem("is"), "is");
        assert_eq!(stem("$eths"), "$eths");
        assert_eq!(stem("web3s"), "web3s");
    }

    #[test]
    fn stopwords() {
        assert!(is_stopword("the"));
        assert!(is_stopword("lol"));
        assert!(!is_stopword("staking"));
    }
}
