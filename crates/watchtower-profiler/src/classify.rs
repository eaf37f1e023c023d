// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyword-scored classification of project type and roadmap stage.
//!
//! Scores are sums of per-segment keyword counts, so the result does not
//! depend on the order segments are supplied in. Only a strictly highest
//! score wins; ties and all-zero scores fall back to the default label.

use watchtower_core::types::{ProjectType, RoadmapStatus};

const DEFI_KEYWORDS: &[&str] = &[
    "defi", "yield", "farming", "farm", "staking", "stake", "liquidity", "swap", "amm", "dex",
    "lending", "borrow", "vault", "vaults", "apy", "apr", "tvl", "pool", "pools", "lp",
];

const NFT_KEYWORDS: &[&str] = &[
    "nft", "nfts", "mint", "minting", "collection", "collectibles", "pfp", "art", "artist",
    "opensea", "rarity", "traits", "holders", "whitelist", "wl", "gallery",
];

const GAMING_KEYWORDS: &[&str] = &[
    "game", "games", "gaming", "play", "p2e", "gamefi", "guild", "quest", "quests", "arena",
    "battle", "esports", "tournament", "metaverse", "rpg", "pvp",
];

const INFRASTRUCTURE_KEYWORDS: &[&str] = &[
    "infrastructure", "infra", "node", "nodes", "validator", "validators", "layer", "l1", "l2",
    "rollup", "chain", "protocol", "bridge", "rpc", "oracle", "sdk", "developers", "devs",
    "testnet", "mainnet",
];

const MEME_KEYWORDS: &[&str] = &[
    "meme", "memes", "memecoin", "doge", "shib", "pepe", "inu", "wojak", "frog", "moon",
    "degen", "degens", "ape", "apes", "lambo", "wagmi",
];

const PRE_LAUNCH_KEYWORDS: &[&str] = &[
    "presale", "pre-launch", "prelaunch", "whitelist", "waitlist", "coming soon", "stealth",
    "fair launch", "ido",
];

const DEVELOPMENT_KEYWORDS: &[&str] = &[
    "development", "developing", "building", "in progress", "prototype", "alpha", "audit",
    "roadmap", "sprint", "wip",
];

const TESTNET_KEYWORDS: &[&str] = &[
    "testnet", "devnet", "beta", "incentivized", "faucet", "test network", "public test",
];

const MAINNET_KEYWORDS: &[&str] = &[
    "mainnet", "live on", "launched", "now live", "is live", "production", "v1 live",
    "mainnet launch",
];

pub fn keywords_for(ty: ProjectType) -> &'static [&'static str] {
    match ty {
        ProjectType::Defi => DEFI_KEYWORDS,
        ProjectType::Nft => NFT_KEYWORDS,
        ProjectType::Gaming => GAMING_KEYWORDS,
        ProjectType::Infrastructure => INFRASTRUCTURE_KEYWORDS,
        ProjectType::Meme => MEME_KEYWORDS,
        ProjectType::Unknown => &[],
    }
}

/// Lowercased word tokens; hyphens and underscores split words.
fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Occurrences of `keyword` in `segment`. Single words match whole tokens;
/// keywords with spaces or hyphens match as phrases over normalized text.
fn occurrences(segment_words: &[String], keyword: &str) -> usize {
    let parts = words(keyword);
    match parts.len() {
        0 => 0,
        1 => segment_words.iter().filter(|w| **w == parts[0]).count(),
        n => segment_words
            .windows(n)
            .filter(|window| window.iter().zip(&parts).all(|(w, p)| w == p))
            .count(),
    }
}

/// Total keyword occurrences across all segments.
pub fn keyword_score<S: AsRef<str>>(segments: &[S], keywords: &[&str]) -> usize {
    segments
        .iter()
        .map(|s| {
            let w = words(s.as_ref());
            keywords.iter().map(|k| occurrences(&w, k)).sum::<usize>()
        })
        .sum()
}

/// The label whose score is strictly greater than every other, else `fallback`.
fn strict_winner<T: Copy>(scores: &[(T, usize)], fallback: T) -> T {
    let best = scores.iter().map(|(_, s)| *s).max().unwrap_or(0);
    if best == 0 {
        return fallback;
    }
    let mut leaders = scores.iter().filter(|(_, s)| *s == best);
    match (leaders.next(), leaders.next()) {
        (Some((label, _)), None) => *label,
        _ => fallback,
    }
}

pub fn project_type_scores<S: AsRef<str>>(segments: &[S]) -> Vec<(ProjectType, usize)> {
    ProjectType::CANDIDATES
        .iter()
        .map(|ty| (*ty, keyword_score(segments, keywords_for(*ty))))
        .collect()
}

pub fn classify_project_type<S: AsRef<str>>(segments: &[S]) -> ProjectType {
    strict_winner(&project_type_scores(segments), ProjectType::Unknown)
}

pub fn classify_roadmap<S: AsRef<str>>(segments: &[S]) -> RoadmapStatus {
    let scores = [
        (RoadmapStatus::PreLaunch, keyword_score(segments, PRE_LAUNCH_KEYWORDS)),
        (RoadmapStatus::Development, keyword_score(segments, DEVELOPMENT_KEYWORDS)),
        (RoadmapStatus::Testnet, keyword_score(segments, TESTNET_KEYWORDS)),
        (RoadmapStatus::Mainnet, keyword_score(segments, MAINNET_KEYWORDS)),
    ];
    strict_winner(&scores, RoadmapStatus::PreLaunch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn defi_hub_example() {
        let segments = ["DeFi Yield Farming Hub", "general", "yield-farming", "staking-info"];
        let scores = project_type_scores(&segments);
        let defi = scores.iter().find(|(t, _)| *t == ProjectType::Defi).unwrap().1;
        assert_eq!(defi, 6);
        assert!(scores.iter().filter(|(t, _)| *t != ProjectType::Defi).all(|(_, s)| *s < defi));
        assert_eq!(classify_project_type(&segments), ProjectType::Defi);
    }

    #[test]
    fn ties_resolve_to_unknown() {
        // One DeFi keyword, one NFT keyword.
        assert_eq!(classify_project_type(&["staking", "mint"]), ProjectType::Unknown);
    }

    #[test]
    fn no_keywords_is_unknown() {
        assert_eq!(classify_project_type(&["general", "off-topic"]), ProjectType::Unknown);
        assert_eq!(classify_project_type::<&str>(&[]), ProjectType::Unknown);
    }

    #[test]
    fn whole_words_only() {
        // "start" and "party" must not count as "art".
        assert_eq!(keyword_score(&["start the party"], NFT_KEYWORDS), 0);
    }

    #[test]
    fn phrases_match_across_separators() {
        assert_eq!(keyword_score(&["Coming-Soon: presale"], PRE_LAUNCH_KEYWORDS), 2);
    }

    #[test]
    fn roadmap_stages() {
        assert_eq!(classify_roadmap(&["Mainnet is live! We launched today"]), RoadmapStatus::Mainnet);
        assert_eq!(classify_roadmap(&["incentivized testnet phase 2, faucet open"]), RoadmapStatus::Testnet);
        assert_eq!(classify_roadmap(&["gm"]), RoadmapStatus::PreLaunch);
        // testnet vs mainnet tie
        assert_eq!(classify_roadmap(&["testnet", "mainnet"]), RoadmapStatus::PreLaunch);
    }

    proptest! {
        #[test]
        fn classification_is_order_independent(
            mut names in prop::collection::vec(
                prop::sample::select(vec![
                    "general", "yield-farming", "staking-info", "nft-mint", "art-gallery",
                    "game-lobby", "quests", "validators", "node-ops", "memes", "doge-army",
                    "announcements", "liquidity",
                ]),
                0..12,
            ),
            seed in any::<u64>(),
        ) {
            let original = classify_project_type(&names);
            // Deterministic shuffle driven by the seed.
            let len = names.len();
            let mut state = seed;
            for i in (1..len).rev() {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                let j = (state >> 33) as usize % (i + 1);
                names.swap(i, j);
            }
            prop_assert_eq!(original, classify_project_type(&names));
        }
    }
}
