// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared data model used across adapter traits and Watchtower services.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unique identifier for a message delivered through a channel adapter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a [`PluginAdapter`](crate::PluginAdapter).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Completion,
    Storage,
}

// --- Messages ---

/// The three independent mention pattern classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MentionKind {
    User,
    Channel,
    Role,
}

/// A single mention extracted from message content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mention {
    pub kind: MentionKind,
    pub id: String,
}

/// Domain-vocabulary findings for one message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainAnalysis {
    pub crypto_mentions: Vec<String>,
    pub technical_terms: Vec<String>,
    pub price_discussion: bool,
    pub trading_signals: Vec<String>,
    pub update_keywords: Vec<String>,
}

impl DomainAnalysis {
    /// True when the message carries any technical vocabulary.
    pub fn is_technical(&self) -> bool {
        !self.technical_terms.is_empty()
    }
}

/// A message as received from the chat platform, before analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestedMessage {
    pub id: String,
    pub community_id: String,
    pub channel_id: String,
    pub author_id: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub is_moderator: bool,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub reply_to: Option<String>,
}

/// A persisted, analysed message. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: String,
    pub community_id: String,
    pub channel_id: String,
    pub author_id: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub is_moderator: bool,
    pub is_bot: bool,
    pub reply_to: Option<String>,
    pub sentiment: f64,
    pub topics: Vec<String>,
    pub mentions: Vec<Mention>,
    pub domain: DomainAnalysis,
}

impl MessageRecord {
    /// A record with empty analysis fields, mostly useful for tests and fixtures.
    pub fn unanalyzed(msg: &IngestedMessage) -> Self {
        Self {
            id: msg.id.clone(),
            community_id: msg.community_id.clone(),
            channel_id: msg.channel_id.clone(),
            author_id: msg.author_id.clone(),
            content: msg.content.clone(),
            timestamp: msg.timestamp,
            is_moderator: msg.is_moderator,
            is_bot: msg.is_bot,
            reply_to: msg.reply_to.clone(),
            sentiment: 0.0,
            topics: Vec::new(),
            mentions: Vec::new(),
            domain: DomainAnalysis::default(),
        }
    }
}

// --- Communities ---

/// Classification label for a community's subject domain.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProjectType {
    Defi,
    Nft,
    Gaming,
    Infrastructure,
    Meme,
    #[default]
    Unknown,
}

impl ProjectType {
    /// Every classifiable type, excluding `Unknown`.
    pub const CANDIDATES: [ProjectType; 5] = [
        ProjectType::Defi,
        ProjectType::Nft,
        ProjectType::Gaming,
        ProjectType::Infrastructure,
        ProjectType::Meme,
    ];

    pub fn is_known(self) -> bool {
        self != ProjectType::Unknown
    }
}

/// Coarse roadmap stage inferred from announcement vocabulary.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum RoadmapStatus {
    #[default]
    PreLaunch,
    Development,
    Testnet,
    Mainnet,
}

/// Category of an external link found in community metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LinkType {
    Twitter,
    Telegram,
    Discord,
    Github,
    Medium,
    Docs,
    Explorer,
    PriceTracker,
    Website,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredLink {
    pub url: String,
    pub link_type: LinkType,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechnologyProfile {
    pub blockchains: Vec<String>,
    pub protocols: Vec<String>,
    pub marketplaces: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tokenomics {
    pub token_symbol: Option<String>,
    pub total_supply: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommunityMetrics {
    pub member_count: u64,
    pub active_users: u64,
    pub message_volume: u64,
    pub engagement_score: f64,
}

/// A role that looks like it carries moderation or team authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeratorPattern {
    pub role_name: String,
    pub member_count: u64,
}

/// Persisted per-community profile, keyed by `community_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityProfile {
    pub community_id: String,
    pub name: String,
    pub project_type: ProjectType,
    pub technology: TechnologyProfile,
    pub tokenomics: Tokenomics,
    pub partnerships: Vec<String>,
    pub roadmap_status: RoadmapStatus,
    pub metrics: CommunityMetrics,
    pub moderator_patterns: Vec<ModeratorPattern>,
    pub team_roles: Vec<String>,
    pub announcement_channels: Vec<String>,
    pub links: Vec<DiscoveredLink>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CommunityProfile {
    /// An empty, unclassified profile for a newly seen community.
    pub fn new(community_id: impl Into<String>, name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            community_id: community_id.into(),
            name: name.into(),
            project_type: ProjectType::Unknown,
            technology: TechnologyProfile::default(),
            tokenomics: Tokenomics::default(),
            partnerships: Vec::new(),
            roadmap_status: RoadmapStatus::PreLaunch,
            metrics: CommunityMetrics::default(),
            moderator_patterns: Vec::new(),
            team_roles: Vec::new(),
            announcement_channels: Vec::new(),
            links: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Structural metadata for a community, supplied by the chat platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityMetadata {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub member_count: u64,
    #[serde(default)]
    pub channels: Vec<ChannelMetadata>,
    #[serde(default)]
    pub roles: Vec<RoleMetadata>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelMetadata {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub topic: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleMetadata {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub member_count: u64,
}

// --- Users ---

/// Composite key for per-user, per-community state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BehaviorKey {
    pub user_id: String,
    pub community_id: String,
}

impl BehaviorKey {
    pub fn new(user_id: impl Into<String>, community_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            community_id: community_id.into(),
        }
    }
}

impl std::fmt::Display for BehaviorKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.user_id, self.community_id)
    }
}

/// Response-latency statistics for a user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponsePattern {
    pub average_gap_secs: f64,
    pub fast_responses: u32,
    pub total_gaps: u32,
}

impl ResponsePattern {
    /// Fraction of gaps under the fast-response cut-off. Zero when no gaps exist.
    pub fn fast_fraction(&self) -> f64 {
        if self.total_gaps == 0 {
            0.0
        } else {
            f64::from(self.fast_responses) / f64::from(self.total_gaps)
        }
    }
}

/// Maximum suspicion score.
pub const MAX_SUSPICION_SCORE: u8 = 10;

/// Persisted per-user profile, keyed by [`BehaviorKey`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserBehaviorProfile {
    pub user_id: String,
    pub community_id: String,
    pub message_frequency: f64,
    pub average_message_length: f64,
    pub topic_consistency: f64,
    pub interaction_patterns: Vec<String>,
    pub suspicion_score: u8,
    pub verified: bool,
    pub hourly_activity: [u32; 24],
    pub common_phrases: Vec<String>,
    pub response_patterns: ResponsePattern,
    pub risk_factors: Vec<String>,
    pub last_analysis: Option<DateTime<Utc>>,
}

impl UserBehaviorProfile {
    pub fn new(key: &BehaviorKey) -> Self {
        Self {
            user_id: key.user_id.clone(),
            community_id: key.community_id.clone(),
            message_frequency: 0.0,
            average_message_length: 0.0,
            topic_consistency: 0.0,
            interaction_patterns: Vec::new(),
            suspicion_score: 0,
            verified: false,
            hourly_activity: [0; 24],
            common_phrases: Vec::new(),
            response_patterns: ResponsePattern::default(),
            risk_factors: Vec::new(),
            last_analysis: None,
        }
    }

    pub fn key(&self) -> BehaviorKey {
        BehaviorKey::new(self.user_id.clone(), self.community_id.clone())
    }
}

// --- Outbound + completion ---

/// A reply to be delivered through the chat platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub community_id: String,
    pub channel_id: String,
    pub content: String,
    pub reply_to: Option<String>,
}

/// A single text-completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system_prompt: Option<String>,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Text returned by a completion adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn project_type_display_round_trip() {
        for ty in ProjectType::CANDIDATES.iter().chain([ProjectType::Unknown].iter()) {
            let parsed = ProjectType::from_str(&ty.to_string()).unwrap();
            assert_eq!(*ty, parsed);
        }
        assert_eq!(ProjectType::Defi.to_string(), "defi");
    }

    #[test]
    fn roadmap_status_serializes_kebab_case() {
        let json = serde_json::to_string(&RoadmapStatus::PreLaunch).unwrap();
        assert_eq!(json, "\"pre-launch\"");
        assert_eq!(RoadmapStatus::default(), RoadmapStatus::PreLaunch);
    }

    #[test]
    fn behavior_key_does_not_collide_on_delimiters() {
        let a = BehaviorKey::new("a_b", "c");
        let b = BehaviorKey::new("a", "b_c");
        assert_ne!(a, b);
    }

    #[test]
    fn fast_fraction_handles_no_gaps() {
        let pattern = ResponsePattern::default();
        assert_eq!(pattern.fast_fraction(), 0.0);

        let pattern = ResponsePattern {
            average_gap_secs: 4.0,
            fast_responses: 3,
            total_gaps: 4,
        };
        assert!((pattern.fast_fraction() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn ingested_message_accepts_camel_case() {
        let json = r#"{
            "id": "m1", "communityId": "c1", "channelId": "ch1", "authorId": "u1",
            "content": "gm", "timestamp": "2026-01-01T00:00:00Z"
        }"#;
        let msg: IngestedMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.community_id, "c1");
        assert!(!msg.is_bot);
        assert!(msg.reply_to.is_none());
    }

    #[test]
    fn new_behavior_profile_is_zeroed() {
        let key = BehaviorKey::new("u1", "c1");
        let profile = UserBehaviorProfile::new(&key);
        assert_eq!(profile.key(), key);
        assert_eq!(profile.suspicion_score, 0);
        assert!(!profile.verified);
        assert_eq!(profile.hourly_activity.iter().sum::<u32>(), 0);
    }
}
