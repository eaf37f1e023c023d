// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Community structural discovery and classification.
//!
//! [`CommunityProfiler::discover`] builds a [`CommunityProfile`] from
//! platform metadata plus announcement-channel content. Every step runs
//! independently: a channel whose messages cannot be read is skipped and
//! the rest of the pass continues.

pub mod classify;
pub mod extract;

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use watchtower_core::types::{
    CommunityMetadata, CommunityProfile, MessageRecord, ProjectType, TechnologyProfile,
};
use watchtower_core::{ChannelAdapter, WatchtowerError};

pub use classify::{classify_project_type, classify_roadmap};

/// Recent messages read from each announcement channel.
pub const DEFAULT_RECENT_LIMIT: usize = 50;

#[derive(Debug, Clone)]
pub struct CommunityProfiler {
    recent_limit: usize,
    fetch_timeout: Duration,
}

impl CommunityProfiler {
    pub fn new(fetch_timeout: Duration) -> Self {
        Self {
            recent_limit: DEFAULT_RECENT_LIMIT,
            fetch_timeout,
        }
    }

    pub fn with_recent_limit(mut self, limit: usize) -> Self {
        self.recent_limit = limit;
        self
    }

    /// Runs a full discovery pass.
    ///
    /// `prior` supplies identity timestamps and the incrementally maintained
    /// activity metrics; all structural fields are replaced.
    pub async fn discover(
        &self,
        metadata: &CommunityMetadata,
        channel: &dyn ChannelAdapter,
        prior: Option<&CommunityProfile>,
        now: DateTime<Utc>,
    ) -> CommunityProfile {
        let mut profile = match prior {
            Some(p) => p.clone(),
            None => CommunityProfile::new(&metadata.id, &metadata.name, now),
        };
        profile.name = metadata.name.clone();
        profile.updated_at = now;
        profile.metrics.member_count = metadata.member_count;

        // Step 1: announcement corpus.
        let announcements = extract::announcement_channels(&metadata.channels);
        profile.announcement_channels = announcements.iter().map(|c| c.id.clone()).collect();
        let mut corpus: Vec<String> = Vec::new();
        for chan in &announcements {
            corpus.extend(self.channel_corpus(channel, &chan.id).await);
        }
        debug!(
            community_id = %metadata.id,
            channels = announcements.len(),
            corpus = corpus.len(),
            "announcement corpus collected"
        );

        // Step 2: roles.
        profile.moderator_patterns = extract::moderator_patterns(&metadata.roles);
        profile.team_roles = extract::team_roles(&metadata.roles);

        // Step 3: links from description and channel topics.
        let mut link_sources: Vec<&str> = Vec::new();
        if let Some(desc) = &metadata.description {
            link_sources.push(desc);
        }
        link_sources.extend(metadata.channels.iter().filter_map(|c| c.topic.as_deref()));
        profile.links = extract::extract_links(&link_sources);

        // Step 4: classification over name, description and channel names.
        let mut segments: Vec<&str> = vec![metadata.name.as_str()];
        if let Some(desc) = &metadata.description {
            segments.push(desc);
        }
        segments.extend(metadata.channels.iter().map(|c| c.name.as_str()));
        profile.project_type = classify::classify_project_type(&segments);

        // Step 5: type-specific technology matching.
        let mut text: Vec<&str> = link_sources.clone();
        text.extend(corpus.iter().map(String::as_str));
        profile.technology = TechnologyProfile::default();
        profile.partnerships = Vec::new();
        match profile.project_type {
            ProjectType::Defi => {
                profile.technology.protocols = extract::match_names(&text, extract::PROTOCOLS);
                profile.partnerships = extract::partnerships(&text);
            }
            ProjectType::Nft => {
                profile.technology.marketplaces = extract::match_names(&text, extract::MARKETPLACES);
            }
            ProjectType::Infrastructure => {
                profile.technology.blockchains = extract::match_names(&text, extract::BLOCKCHAINS);
            }
            ProjectType::Gaming | ProjectType::Meme | ProjectType::Unknown => {}
        }
        profile.tokenomics = extract::tokenomics(&text);

        // Step 6: roadmap stage from announcements.
        profile.roadmap_status = classify::classify_roadmap(&corpus);

        refresh_engagement(&mut profile);
        profile
    }

    /// Recent and pinned content of one channel. Failures are logged and
    /// produce an empty (or partial) result.
    async fn channel_corpus(&self, channel: &dyn ChannelAdapter, channel_id: &str) -> Vec<String> {
        let mut out = Vec::new();
        match self
            .bounded(channel.fetch_recent_messages(channel_id, self.recent_limit))
            .await
        {
            Ok(messages) => out.extend(messages),
            Err(e) => warn!(channel_id, error = %e, "skipping recent messages"),
        }
        match self.bounded(channel.fetch_pinned_messages(channel_id)).await {
            Ok(messages) => out.extend(messages),
            Err(e) => warn!(channel_id, error = %e, "skipping pinned messages"),
        }
        out
    }

    async fn bounded<T>(
        &self,
        fut: impl std::future::Future<Output = Result<T, WatchtowerError>>,
    ) -> Result<T, WatchtowerError> {
        tokio::time::timeout(self.fetch_timeout, fut)
            .await
            .map_err(|_| WatchtowerError::Timeout {
                duration: self.fetch_timeout,
            })?
    }
}

/// Incremental activity update after a new message in the community.
///
/// `recent` is the community's recent traffic used to count active users.
pub fn record_activity(profile: &mut CommunityProfile, recent: &[MessageRecord], now: DateTime<Utc>) {
    profile.metrics.message_volume += 1;
    profile.metrics.active_users = recent
        .iter()
        .filter(|m| !m.is_bot)
        .map(|m| m.author_id.as_str())
        .collect::<HashSet<_>>()
        .len() as u64;
    profile.updated_at = now;
    refresh_engagement(profile);
}

/// Active users as a percentage of members, within 0..=100.
fn refresh_engagement(profile: &mut CommunityProfile) {
    let members = profile.metrics.member_count.max(1) as f64;
    profile.metrics.engagement_score =
        (profile.metrics.active_users as f64 / members * 100.0).clamp(0.0, 100.0);
}
