// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Watchtower.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Watchtower configuration.
///
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WatchtowerConfig {
    /// Service identity and logging.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Job queue settings.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Behavior scoring and alerting.
    #[serde(default)]
    pub behavior: BehaviorConfig,

    /// Auto-response engine.
    #[serde(default)]
    pub responder: ResponderConfig,

    /// Live observer hub.
    #[serde(default)]
    pub hub: HubConfig,

    /// Text-completion backend.
    #[serde(default)]
    pub completion: CompletionConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Identifier stamped on every broadcast envelope.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// The bot's own user id, used to detect explicit mentions.
    #[serde(default)]
    pub bot_user_id: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
            bot_user_id: None,
        }
    }
}

fn default_service_name() -> String {
    "watchtower".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("watchtower").join("watchtower.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("watchtower.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Retry delay growth between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    Fixed,
    Exponential,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BackoffConfig {
    pub kind: BackoffKind,
    /// Base delay; exponential backoff doubles it per retry.
    pub delay_ms: u64,
}

/// Concurrency and retry policy for one named queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QueueConfig {
    pub concurrency: usize,
    pub attempts: u32,
    pub backoff: BackoffConfig,
}

impl QueueConfig {
    const fn new(concurrency: usize, attempts: u32, kind: BackoffKind, delay_ms: u64) -> Self {
        Self {
            concurrency,
            attempts,
            backoff: BackoffConfig { kind, delay_ms },
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulerConfig {
    #[serde(default = "default_analysis_queue")]
    pub analysis: QueueConfig,

    #[serde(default = "default_profiling_queue")]
    pub profiling: QueueConfig,

    #[serde(default = "default_behavior_queue")]
    pub behavior: QueueConfig,

    #[serde(default = "default_realtime_queue")]
    pub realtime: QueueConfig,

    /// Completed jobs retained per queue for lookup.
    #[serde(default = "default_keep_completed")]
    pub keep_completed: usize,

    /// Failed jobs retained per queue for lookup.
    #[serde(default = "default_keep_failed")]
    pub keep_failed: usize,

    /// Upper bound on the shutdown drain.
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,

    /// Bound applied to storage and platform calls made by job processors.
    #[serde(default = "default_io_timeout_secs")]
    pub io_timeout_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            analysis: default_analysis_queue(),
            profiling: default_profiling_queue(),
            behavior: default_behavior_queue(),
            realtime: default_realtime_queue(),
            keep_completed: default_keep_completed(),
            keep_failed: default_keep_failed(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
            io_timeout_secs: default_io_timeout_secs(),
        }
    }
}

fn default_analysis_queue() -> QueueConfig {
    QueueConfig::new(5, 3, BackoffKind::Exponential, 2000)
}

fn default_profiling_queue() -> QueueConfig {
    QueueConfig::new(2, 2, BackoffKind::Fixed, 5000)
}

fn default_behavior_queue() -> QueueConfig {
    QueueConfig::new(3, 3, BackoffKind::Exponential, 1000)
}

fn default_realtime_queue() -> QueueConfig {
    QueueConfig::new(10, 1, BackoffKind::Fixed, 0)
}

fn default_keep_completed() -> usize {
    100
}

fn default_keep_failed() -> usize {
    50
}

fn default_shutdown_timeout_secs() -> u64 {
    30
}

fn default_io_timeout_secs() -> u64 {
    15
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BehaviorConfig {
    /// Recent messages fed to each scoring pass.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Score at or above which an alert is raised.
    #[serde(default = "default_alert_threshold")]
    pub alert_threshold: u8,

    /// Score at or above which the alert is escalated to moderators.
    #[serde(default = "default_escalation_threshold")]
    pub escalation_threshold: u8,

    /// Points removed from the score when a moderator marks a user trusted.
    #[serde(default = "default_trusted_score_decrement")]
    pub trusted_score_decrement: u8,

    /// Channel that receives escalation notices. `None` disables escalation delivery.
    #[serde(default)]
    pub moderator_channel_id: Option<String>,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            alert_threshold: default_alert_threshold(),
            escalation_threshold: default_escalation_threshold(),
            trusted_score_decrement: default_trusted_score_decrement(),
            moderator_channel_id: None,
        }
    }
}

fn default_history_limit() -> usize {
    100
}

fn default_alert_threshold() -> u8 {
    7
}

fn default_escalation_threshold() -> u8 {
    9
}

fn default_trusted_score_decrement() -> u8 {
    3
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ResponderConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Replies are only delivered above this confidence.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,

    /// Bot replies allowed per channel inside the recent window before the cap applies.
    #[serde(default = "default_recent_response_limit")]
    pub recent_response_limit: usize,

    #[serde(default = "default_recent_response_window_secs")]
    pub recent_response_window_secs: u64,

    /// Messages kept in each channel's conversation context.
    #[serde(default = "default_context_window")]
    pub context_window: usize,

    #[serde(default = "default_context_ttl_secs")]
    pub context_ttl_secs: u64,

    #[serde(default = "default_completion_timeout_secs")]
    pub completion_timeout_secs: u64,

    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    #[serde(default = "default_question_probability")]
    pub question_probability: f64,

    #[serde(default = "default_technical_probability")]
    pub technical_probability: f64,

    #[serde(default = "default_baseline_probability")]
    pub baseline_probability: f64,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            confidence_threshold: default_confidence_threshold(),
            recent_response_limit: default_recent_response_limit(),
            recent_response_window_secs: default_recent_response_window_secs(),
            context_window: default_context_window(),
            context_ttl_secs: default_context_ttl_secs(),
            completion_timeout_secs: default_completion_timeout_secs(),
            min_delay_ms: default_min_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            question_probability: default_question_probability(),
            technical_probability: default_technical_probability(),
            baseline_probability: default_baseline_probability(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_confidence_threshold() -> f64 {
    0.7
}

fn default_recent_response_limit() -> usize {
    3
}

fn default_recent_response_window_secs() -> u64 {
    300
}

fn default_context_window() -> usize {
    50
}

fn default_context_ttl_secs() -> u64 {
    300
}

fn default_completion_timeout_secs() -> u64 {
    10
}

fn default_min_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    4000
}

fn default_question_probability() -> f64 {
    0.7
}

fn default_technical_probability() -> f64 {
    0.4
}

fn default_baseline_probability() -> f64 {
    0.1
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HubConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_hub_host")]
    pub host: String,

    #[serde(default = "default_hub_port")]
    pub port: u16,

    /// When set, observers must present `Authorization: Bearer <token>`.
    #[serde(default)]
    pub bearer_token: Option<String>,

    #[serde(default = "default_heartbeat_interval_secs")]
    pub heartbeat_interval_secs: u64,

    #[serde(default = "default_health_interval_secs")]
    pub health_interval_secs: u64,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: default_hub_host(),
            port: default_hub_port(),
            bearer_token: None,
            heartbeat_interval_secs: default_heartbeat_interval_secs(),
            health_interval_secs: default_health_interval_secs(),
        }
    }
}

fn default_hub_host() -> String {
    "127.0.0.1".to_string()
}

fn default_hub_port() -> u16 {
    8081
}

fn default_heartbeat_interval_secs() -> u64 {
    30
}

fn default_health_interval_secs() -> u64 {
    60
}

/// OpenAI-compatible completion endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CompletionConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_completion_base_url")]
    pub base_url: String,

    /// API key. `None` sends no Authorization header (local servers).
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_completion_model")]
    pub model: String,

    #[serde(default = "default_completion_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_completion_temperature")]
    pub temperature: f32,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_completion_base_url(),
            api_key: None,
            model: default_completion_model(),
            max_tokens: default_completion_max_tokens(),
            temperature: default_completion_temperature(),
        }
    }
}

fn default_completion_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_completion_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_completion_max_tokens() -> u32 {
    150
}

fn default_completion_temperature() -> f32 {
    0.8
}
