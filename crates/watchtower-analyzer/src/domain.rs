// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixed-vocabulary detectors: mentions, crypto and technical jargon,
//! price talk, trading signals, project updates, urgency.

use std::sync::LazyLock;

use regex::Regex;
use watchtower_core::types::{DomainAnalysis, Mention, MentionKind};

pub const CRYPTO_TERMS: &[&str] = &[
    "bitcoin", "btc", "ethereum", "eth", "solana", "sol", "crypto", "token", "tokens", "coin",
    "altcoin", "stablecoin", "usdt", "usdc", "defi", "nft", "nfts", "dao", "dex", "cex",
    "wallet", "airdrop", "staking", "stake", "yield", "liquidity", "blockchain", "web3",
    "metamask", "ledger", "memecoin", "whitelist", "mint", "tokenomics", "presale", "ico",
];

pub const TECHNICAL_TERMS: &[&str] = &[
    "smart", "contract", "contracts", "protocol", "consensus", "validator", "validators",
    "node", "nodes", "rpc", "api", "sdk", "gas", "gwei", "mainnet", "testnet", "devnet",
    "layer", "l1", "l2", "rollup", "rollups", "zk", "zkevm", "evm", "solidity", "rust",
    "bridge", "oracle", "sharding", "merkle", "hash", "signature", "audit", "deploy",
    "deployment", "bytecode", "abi", "latency", "throughput", "tps", "finality", "slashing",
];

pub const TRADING_SIGNALS: &[&str] = &[
    "buy", "sell", "long", "short", "entry", "exit", "target", "stop loss", "take profit",
    "support", "resistance", "breakout", "dip", "pump", "dump", "leverage", "chart", "ta",
];

pub const UPDATE_KEYWORDS: &[&str] = &[
    "update", "announcement", "release", "launch", "launched", "upgrade", "roadmap",
    "partnership", "listing", "milestone", "v2", "migration", "maintenance", "patch",
];

pub const URGENT_KEYWORDS: &[&str] = &[
    "urgent", "asap", "emergency", "help", "immediately", "critical", "hacked", "stolen",
    "scam", "lost", "stuck", "now",
];

static USER_MENTION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<@!?(\d+)>").unwrap());
static CHANNEL_MENTION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<#(\d+)>").unwrap());
static ROLE_MENTION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<@&(\d+)>").unwrap());

static PRICE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(\$\d[\d,]*(\.\d+)?[kmb]?\b|\b\d[\d,]*(\.\d+)?\s?(usd|usdt|usdc|dollars?|eth|btc|sol)\b|\b(price|market ?cap|mcap|ath|atl)\b|\b\d+(\.\d+)?x\b)",
    )
    .unwrap()
});

/// The three mention classes, each matched independently.
pub fn extract_mentions(content: &str) -> Vec<Mention> {
    let mut mentions = Vec::new();
    for (regex, kind) in [
        (&*USER_MENTION, MentionKind::User),
        (&*CHANNEL_MENTION, MentionKind::Channel),
        (&*ROLE_MENTION, MentionKind::Role),
    ] {
        mentions.extend(regex.captures_iter(content).map(|cap| Mention {
            kind,
            id: cap[1].to_string(),
        }));
    }
    mentions
}

/// Mention markup removed, so ids do not leak into topics or term counts.
pub fn strip_mentions(content: &str) -> String {
    let s = USER_MENTION.replace_all(content, " ");
    let s = CHANNEL_MENTION.replace_all(&s, " ");
    ROLE_MENTION.replace_all(&s, " ").into_owned()
}

pub fn is_price_discussion(content: &str) -> bool {
    PRICE_PATTERN.is_match(content)
}

/// Vocabulary members present in `tokens`, deduplicated, in first-seen order.
fn set_members(tokens: &[String], vocab: &[&str]) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for token in tokens {
        let bare = token.trim_start_matches('$');
        if vocab.contains(&bare) && !found.iter().any(|f| f == bare) {
            found.push(bare.to_string());
        }
    }
    found
}

/// Keyword-list members present in lowercased `text`, phrase-aware.
fn keyword_hits(lower: &str, tokens: &[String], keywords: &[&str]) -> Vec<String> {
    keywords
        .iter()
        .filter(|kw| {
            if kw.contains(' ') {
                lower.contains(*kw)
            } else {
                tokens.iter().any(|t| t == *kw)
            }
        })
        .map(|kw| kw.to_string())
        .collect()
}

/// Count of tokens that belong to the technical vocabulary (with repeats).
pub fn technical_token_count(tokens: &[String]) -> usize {
    tokens
        .iter()
        .filter(|t| TECHNICAL_TERMS.contains(&t.as_str()))
        .count()
}

pub fn urgent_keyword_count(tokens: &[String]) -> usize {
    tokens
        .iter()
        .filter(|t| URGENT_KEYWORDS.contains(&t.as_str()))
        .count()
}

pub fn analyze_domain(content: &str, tokens: &[String]) -> DomainAnalysis {
    let lower = content.to_lowercase();
    DomainAnalysis {
        crypto_mentions: set_members(tokens, CRYPTO_TERMS),
        technical_terms: set_members(tokens, TECHNICAL_TERMS),
        price_discussion: is_price_discussion(content),
        trading_signals: keyword_hits(&lower, tokens, TRADING_SIGNALS),
        update_keywords: keyword_hits(&lower, tokens, UPDATE_KEYWORDS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenize::tokenize;

    #[test]
    fn mentions_all_three_classes() {
        let m = extract_mentions("hey <@123> and <@!456>, see <#789> ping <@&42>");
        let users: Vec<_> = m.iter().filter(|m| m.kind == MentionKind::User).collect();
        assert_eq!(users.len(), 2);
        assert_eq!(users[1].id, "456");
        assert!(m.iter().any(|m| m.kind == MentionKind::Channel && m.id == "789"));
        assert!(m.iter().any(|m| m.kind == MentionKind::Role && m.id == "42"));
        // Role markup is not also counted as a user mention.
        assert_eq!(m.len(), 4);
    }

    #[test]
    fn strip_mentions_removes_markup() {
        assert_eq!(strip_mentions("<@1>hi<#2>").trim(), "hi");
    }

    #[test]
    fn price_patterns() {
        assert!(is_price_discussion("eth at $3,200 today"));
        assert!(is_price_discussion("what's the market cap?"));
        assert!(is_price_discussion("this will 10x"));
        assert!(is_price_discussion("sold 2.5 eth"));
        assert!(!is_price_discussion("gm everyone"));
    }

    #[test]
    fn domain_sets_are_deduplicated() {
        let text = "Staking ETH on the new validator node, $eth staking rewards";
        let d = analyze_domain(text, &tokenize(text));
        assert_eq!(d.crypto_mentions, vec!["staking", "eth"]);
        assert_eq!(d.technical_terms, vec!["validator", "node"]);
    }

    #[test]
    fn trading_and_update_keywords() {
        let text = "Set a stop loss before the breakout. Roadmap update tomorrow";
        let d = analyze_domain(text, &tokenize(text));
        assert!(d.trading_signals.contains(&"stop loss".to_string()));
        assert!(d.trading_signals.contains(&"breakout".to_string()));
        assert_eq!(d.update_keywords, vec!["update", "roadmap"]);
    }

    #[test]
    fn urgency_counts_repeats() {
        assert_eq!(urgent_keyword_count(&tokenize("help help urgent")), 3);
    }
}
