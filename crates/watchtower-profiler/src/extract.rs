// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Structural extraction from community metadata and announcement text.

use std::sync::LazyLock;

use regex::Regex;
use watchtower_core::types::{
    ChannelMetadata, DiscoveredLink, LinkType, ModeratorPattern, RoleMetadata, Tokenomics,
};

const ANNOUNCEMENT_MARKERS: &[&str] = &[
    "announce", "news", "update", "changelog", "release", "roadmap", "official",
];

const MODERATOR_MARKERS: &[&str] = &["admin", "mod", "staff", "support", "guardian", "security"];

const TEAM_MARKERS: &[&str] = &[
    "team", "core", "dev", "founder", "ceo", "cto", "engineer", "contributor", "ambassador",
];

pub const PROTOCOLS: &[&str] = &[
    "uniswap", "sushiswap", "curve", "aave", "compound", "maker", "balancer", "pancakeswap",
    "lido", "yearn", "convex", "gmx", "dydx", "raydium", "jupiter", "orca", "chainlink",
];

pub const MARKETPLACES: &[&str] = &[
    "opensea", "blur", "magic eden", "magiceden", "tensor", "looksrare", "rarible", "foundation",
    "x2y2", "element",
];

pub const BLOCKCHAINS: &[&str] = &[
    "ethereum", "solana", "polygon", "arbitrum", "optimism", "avalanche", "bsc", "bnb chain",
    "cosmos", "polkadot", "near", "aptos", "sui", "base", "zksync", "starknet", "cardano",
];

static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s<>()"'\]\[]+"#).unwrap());

static TOKEN_SYMBOL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([A-Z][A-Z0-9]{1,9})\b").unwrap());

static TOTAL_SUPPLY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:total|max)\s+supply\s*(?:of|is|:|=)?\s*([\d][\d,.]*\s*(?:k|m|b|t|thousand|million|billion|trillion)?)\b",
    )
    .unwrap()
});

static PARTNERSHIP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bpartner(?:ship|ed|ing|s)?\s+with\s+@?([A-Za-z0-9][\w.\-]*(?:\s[A-Z][\w.\-]*)?)")
        .unwrap()
});

fn name_contains_any(name: &str, markers: &[&str]) -> bool {
    let lower = name.to_lowercase();
    markers.iter().any(|m| lower.contains(m))
}

/// Channels whose names look like official announcement feeds.
pub fn announcement_channels(channels: &[ChannelMetadata]) -> Vec<&ChannelMetadata> {
    channels
        .iter()
        .filter(|c| name_contains_any(&c.name, ANNOUNCEMENT_MARKERS))
        .collect()
}

/// Roles that look like moderation authority.
pub fn moderator_patterns(roles: &[RoleMetadata]) -> Vec<ModeratorPattern> {
    roles
        .iter()
        .filter(|r| name_contains_any(&r.name, MODERATOR_MARKERS))
        .map(|r| ModeratorPattern {
            role_name: r.name.clone(),
            member_count: r.member_count,
        })
        .collect()
}

/// Roles that look like project team membership.
pub fn team_roles(roles: &[RoleMetadata]) -> Vec<String> {
    roles
        .iter()
        .filter(|r| name_contains_any(&r.name, TEAM_MARKERS))
        .map(|r| r.name.clone())
        .collect()
}

pub fn categorize_link(url: &str) -> LinkType {
    let lower = url.to_lowercase();
    let host = lower
        .split("://")
        .nth(1)
        .unwrap_or(&lower)
        .split('/')
        .next()
        .unwrap_or("");
    let rules: &[(&[&str], LinkType)] = &[
        (&["twitter.com", "x.com"], LinkType::Twitter),
        (&["t.me", "telegram"], LinkType::Telegram),
        (&["discord.gg", "discord.com"], LinkType::Discord),
        (&["github.com", "gitlab.com"], LinkType::Github),
        (&["medium.com", "mirror.xyz", "substack.com"], LinkType::Medium),
        (&["docs.", "gitbook", "readme.io", "notion.site"], LinkType::Docs),
        (&["etherscan", "solscan", "bscscan", "polygonscan", "arbiscan", "explorer"], LinkType::Explorer),
        (&["coingecko", "coinmarketcap", "dexscreener", "dextools", "birdeye"], LinkType::PriceTracker),
    ];
    rules
        .iter()
        .find(|(markers, _)| {
            markers.iter().any(|m| {
                if m.contains('.') && !m.ends_with('.') {
                    host == *m || host.ends_with(&format!(".{m}"))
                } else {
                    host.contains(m)
                }
            })
        })
        .map(|(_, ty)| *ty)
        .unwrap_or(LinkType::Website)
}

/// Distinct URLs in `texts`, categorized, in first-seen order.
pub fn extract_links<S: AsRef<str>>(texts: &[S]) -> Vec<DiscoveredLink> {
    let mut links: Vec<DiscoveredLink> = Vec::new();
    for text in texts {
        for m in URL.find_iter(text.as_ref()) {
            let url = m.as_str().trim_end_matches(['.', ',', ';', ':', '!', '?']);
            if !links.iter().any(|l| l.url == url) {
                links.push(DiscoveredLink {
                    url: url.to_string(),
                    link_type: categorize_link(url),
                });
            }
        }
    }
    links
}

/// Token symbol (most frequent `$SYMBOL`) and total supply, if stated.
pub fn tokenomics<S: AsRef<str>>(texts: &[S]) -> Tokenomics {
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut total_supply = None;
    for text in texts {
        let text = text.as_ref();
        for cap in TOKEN_SYMBOL.captures_iter(text) {
            let sym = cap[1].to_string();
            match counts.iter_mut().find(|(s, _)| *s == sym) {
                Some(entry) => entry.1 += 1,
                None => counts.push((sym, 1)),
            }
        }
        if total_supply.is_none() {
            total_supply = TOTAL_SUPPLY
                .captures(text)
                .map(|cap| cap[1].trim().to_string());
        }
    }
    // Highest count wins; ties go to the alphabetically first symbol.
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    Tokenomics {
        token_symbol: counts.into_iter().next().map(|(s, _)| s),
        total_supply,
    }
}

/// Vocabulary entries found in `texts`, in vocabulary order.
pub fn match_names<S: AsRef<str>>(texts: &[S], vocabulary: &[&str]) -> Vec<String> {
    let lowered: Vec<String> = texts.iter().map(|t| t.as_ref().to_lowercase()).collect();
    vocabulary
        .iter()
        .filter(|name| {
            lowered.iter().any(|text| {
                text.match_indices(*name).any(|(idx, _)| {
                    let before = text[..idx].chars().next_back();
                    let after = text[idx + name.len()..].chars().next();
                    !before.is_some_and(char::is_alphanumeric)
                        && !after.is_some_and(char::is_alphanumeric)
                })
            })
        })
        .map(|name| name.to_string())
        .collect()
}

pub fn partnerships<S: AsRef<str>>(texts: &[S]) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for text in texts {
        for cap in PARTNERSHIP.captures_iter(text.as_ref()) {
            let name = cap[1].trim_end_matches(['.', ',', '!']).to_string();
            if !found.iter().any(|f| f.eq_ignore_ascii_case(&name)) {
                found.push(name);
            }
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(name: &str) -> ChannelMetadata {
        ChannelMetadata {
            id: name.into(),
            name: name.into(),
            topic: None,
        }
    }

    fn role(name: &str, members: u64) -> RoleMetadata {
        RoleMetadata {
            id: name.into(),
            name: name.into(),
            member_count: members,
        }
    }

    #[test]
    fn finds_announcement_channels() {
        let chans = [channel("general"), channel("📢-announcements"), channel("project-updates"), channel("memes")];
        let names: Vec<_> = announcement_channels(&chans).iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["📢-announcements", "project-updates"]);
    }

    #[test]
    fn splits_moderators_and_team() {
        let roles = [role("Admin", 2), role("Moderator", 5), role("Core Team", 4), role("OG", 100)];
        let mods = moderator_patterns(&roles);
        assert_eq!(mods.len(), 2);
        assert_eq!(mods[1].member_count, 5);
        assert_eq!(team_roles(&roles), vec!["Core Team"]);
    }

    #[test]
    fn link_categories() {
        assert_eq!(categorize_link("https://twitter.com/proj"), LinkType::Twitter);
        assert_eq!(categorize_link("https://x.com/proj"), LinkType::Twitter);
        assert_eq!(categorize_link("https://t.me/proj"), LinkType::Telegram);
        assert_eq!(categorize_link("https://docs.proj.io/intro"), LinkType::Docs);
        assert_eq!(categorize_link("https://etherscan.io/token/0xabc"), LinkType::Explorer);
        assert_eq!(categorize_link("https://www.coingecko.com/en/coins/x"), LinkType::PriceTracker);
        assert_eq!(categorize_link("https://proj.fi"), LinkType::Website);
        // "x.com" must not match arbitrary hosts ending in "x.com".
        assert_eq!(categorize_link("https://dex.com"), LinkType::Website);
    }

    #[test]
    fn extracts_links_once() {
        let links = extract_links(&[
            "Site: https://proj.fi. Docs https://docs.proj.fi/start",
            "again https://proj.fi",
        ]);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].url, "https://proj.fi");
        assert_eq!(links[1].link_type, LinkType::Docs);
    }

    #[test]
    fn tokenomics_from_text() {
        let t = tokenomics(&[
            "Introducing $FARM, total supply: 1,000,000,000",
            "$FARM staking is live, bridge $ETH",
        ]);
        assert_eq!(t.token_symbol.as_deref(), Some("FARM"));
        assert_eq!(t.total_supply.as_deref(), Some("1,000,000,000"));
        assert_eq!(tokenomics::<&str>(&[]), Tokenomics::default());
    }

    #[test]
    fn name_matching_respects_word_edges() {
        let found = match_names(&["Now live on Arbitrum and Base", "basement"], BLOCKCHAINS);
        assert_eq!(found, vec!["arbitrum", "base"]);
        assert!(match_names(&["basement"], BLOCKCHAINS).is_empty());
    }

    #[test]
    fn partnership_names() {
        let p = partnerships(&["Excited to announce our partnership with Chainlink!", "We partnered with @LayerZero."]);
        assert_eq!(p, vec!["Chainlink", "LayerZero"]);
    }
}
