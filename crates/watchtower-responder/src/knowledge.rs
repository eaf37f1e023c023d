// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-project-type knowledge and fallback replies.

use watchtower_core::types::ProjectType;

/// Vocabulary the templates draw placeholder values from.
#[derive(Debug, Clone, Copy)]
pub struct KnowledgeEntry {
    pub topics: &'static [&'static str],
    pub metrics: &'static [&'static str],
    pub comparisons: &'static [&'static str],
}

const DEFI: KnowledgeEntry = KnowledgeEntry {
    topics: &["yield strategies", "liquidity pools", "impermanent loss", "staking rewards", "governance votes"],
    metrics: &["TVL", "APY", "pool depth", "utilization rate"],
    comparisons: &["Uniswap", "Aave", "Curve", "Compound"],
};

const NFT: KnowledgeEntry = KnowledgeEntry {
    topics: &["the next drop", "trait rarity", "holder perks", "the art reveal"],
    metrics: &["floor price", "volume", "unique holders", "listing ratio"],
    comparisons: &["Azuki", "Pudgy Penguins", "Doodles"],
};

const GAMING: KnowledgeEntry = KnowledgeEntry {
    topics: &["the next season", "guild quests", "tournament brackets", "item crafting"],
    metrics: &["daily players", "match count", "leaderboard rank"],
    comparisons: &["Axie Infinity", "Illuvium", "Big Time"],
};

const MEME: KnowledgeEntry = KnowledgeEntry {
    topics: &["the memes", "the next raid", "community art", "the chart"],
    metrics: &["holders", "volume", "market cap"],
    comparisons: &["DOGE", "PEPE", "BONK"],
};

/// Knowledge for a project type. Infrastructure and unknown communities
/// have no entry.
pub fn knowledge_for(project_type: ProjectType) -> Option<&'static KnowledgeEntry> {
    match project_type {
        ProjectType::Defi => Some(&DEFI),
        ProjectType::Nft => Some(&NFT),
        ProjectType::Gaming => Some(&GAMING),
        ProjectType::Meme => Some(&MEME),
        ProjectType::Infrastructure | ProjectType::Unknown => None,
    }
}

/// Fixed replies used when text completion fails. Never empty.
pub fn fallback_replies(project_type: ProjectType) -> &'static [&'static str] {
    match project_type {
        ProjectType::Defi => &[
            "Always DYOR and check the docs before aping into a pool.",
            "Good question, the docs cover the vault mechanics in detail.",
            "Keep an eye on the governance forum for updates on this.",
        ],
        ProjectType::Nft => &[
            "The team usually posts drop details in announcements first.",
            "Love seeing the community artwork, keep it coming.",
            "Check the collection page for the latest trait info.",
        ],
        ProjectType::Gaming => &[
            "See you in game, the next season is going to be good.",
            "The patch notes channel has the latest changes.",
            "Guilds are a great way to get started, ask around here.",
        ],
        ProjectType::Infrastructure => &[
            "The developer docs are the best place to start on that.",
            "Worth checking the status page and the latest release notes.",
            "The core devs usually answer these in the dev channel.",
        ],
        ProjectType::Meme => &["wagmi", "vibes are immaculate today", "stay comfy frens"],
        ProjectType::Unknown => &[
            "Thanks for sharing, appreciate it.",
            "Interesting point, curious what others think.",
            "Good question, the pinned messages might help.",
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_type_has_fallbacks() {
        for t in ProjectType::CANDIDATES.iter().copied().chain([ProjectType::Unknown]) {
            assert!(!fallback_replies(t).is_empty(), "{t}");
            assert!(fallback_replies(t).iter().all(|r| !r.is_empty()));
        }
        assert!(knowledge_for(ProjectType::Unknown).is_none());
        assert!(knowledge_for(ProjectType::Defi).is_some());
    }
}
