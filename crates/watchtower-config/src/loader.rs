// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Lookup order: `./watchtower.toml` > `~/.config/watchtower/watchtower.toml`
//! > `/etc/watchtower/watchtower.toml`, with `WATCHTOWER_` environment overrides.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::WatchtowerConfig;

const SYSTEM_CONFIG: &str = "/etc/watchtower/watchtower.toml";
const LOCAL_CONFIG: &str = "watchtower.toml";

/// Load configuration from the standard hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/watchtower/watchtower.toml`
/// 3. `~/.config/watchtower/watchtower.toml`
/// 4. `./watchtower.toml`
/// 5. `WATCHTOWER_*` environment variables
pub fn load_config() -> Result<WatchtowerConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no file lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<WatchtowerConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(WatchtowerConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<WatchtowerConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(WatchtowerConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The Figment used by [`load_config`], before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(WatchtowerConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG))
        .merge(env_provider())
}

pub(crate) fn user_config_path() -> Option<std::path::PathBuf> {
    dirs::config_dir().map(|d| d.join("watchtower/watchtower.toml"))
}

pub(crate) fn config_file_candidates() -> Vec<std::path::PathBuf> {
    let mut paths = vec![std::path::PathBuf::from(LOCAL_CONFIG)];
    if let Some(user) = user_config_path() {
        paths.push(user);
    }
    paths.push(std::path::PathBuf::from(SYSTEM_CONFIG));
    paths
}

/// Environment provider with explicit section mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `WATCHTOWER_BEHAVIOR_ALERT_THRESHOLD` must become
/// `behavior.alert_threshold`, and `WATCHTOWER_SCHEDULER_ANALYSIS_CONCURRENCY`
/// must become `scheduler.analysis.concurrency`.
fn env_provider() -> Env {
    Env::prefixed("WATCHTOWER_").map(|key| map_env_key(key.as_str()).into())
}

pub(crate) fn map_env_key(key: &str) -> String {
    const SECTIONS: [&str; 7] = [
        "service", "storage", "scheduler", "behavior", "responder", "hub", "completion",
    ];
    const QUEUES: [&str; 4] = ["analysis", "profiling", "behavior", "realtime"];

    let Some(section) = SECTIONS
        .iter()
        .find(|s| key.starts_with(&format!("{s}_")))
    else {
        return key.to_string();
    };
    let rest = &key[section.len() + 1..];

    if *section == "scheduler" {
        if let Some(queue) = QUEUES.iter().find(|q| rest.starts_with(&format!("{q}_"))) {
            let field = &rest[queue.len() + 1..];
            if let Some(backoff_field) = field.strip_prefix("backoff_") {
                return format!("scheduler.{queue}.backoff.{backoff_field}");
            }
            return format!("scheduler.{queue}.{field}");
        }
    }
    format!("{section}.{rest}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_underscore_keys_to_sections() {
        assert_eq!(map_env_key("behavior_alert_threshold"), "behavior.alert_threshold");
        assert_eq!(map_env_key("hub_bearer_token"), "hub.bearer_token");
        assert_eq!(map_env_key("service_bot_user_id"), "service.bot_user_id");
    }

    #[test]
    fn maps_nested_queue_keys() {
        assert_eq!(
            map_env_key("scheduler_analysis_concurrency"),
            "scheduler.analysis.concurrency"
        );
        assert_eq!(
            map_env_key("scheduler_profiling_backoff_delay_ms"),
            "scheduler.profiling.backoff.delay_ms"
        );
        assert_eq!(
            map_env_key("scheduler_shutdown_timeout_secs"),
            "scheduler.shutdown_timeout_secs"
        );
    }

    #[test]
    fn unknown_prefix_is_left_alone() {
        assert_eq!(map_env_key("bogus_key"), "bogus_key");
    }
}
