// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::{QueueConfig, WatchtowerConfig};

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure rather than stopping at the first.
pub fn validate_config(config: &WatchtowerConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.service.name.trim().is_empty() {
        errors.push(ConfigError::validation("service.name must not be empty"));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "storage.database_path must not be empty",
        ));
    }

    let sched = &config.scheduler;
    for (name, queue) in [
        ("analysis", &sched.analysis),
        ("profiling", &sched.profiling),
        ("behavior", &sched.behavior),
        ("realtime", &sched.realtime),
    ] {
        validate_queue(name, queue, &mut errors);
    }
    if sched.realtime.attempts != 1 {
        errors.push(ConfigError::validation(format!(
            "scheduler.realtime.attempts must be exactly 1, got {}",
            sched.realtime.attempts
        )));
    }
    if sched.shutdown_timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "scheduler.shutdown_timeout_secs must be at least 1",
        ));
    }
    if sched.io_timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "scheduler.io_timeout_secs must be at least 1",
        ));
    }

    let behavior = &config.behavior;
    if behavior.history_limit == 0 {
        errors.push(ConfigError::validation(
            "behavior.history_limit must be at least 1",
        ));
    }
    if behavior.alert_threshold > 10 || behavior.escalation_threshold > 10 {
        errors.push(ConfigError::validation(
            "behavior thresholds must be within 0..=10",
        ));
    }
    if behavior.escalation_threshold < behavior.alert_threshold {
        errors.push(ConfigError::validation(format!(
            "behavior.escalation_threshold ({}) must not be below behavior.alert_threshold ({})",
            behavior.escalation_threshold, behavior.alert_threshold
        )));
    }

    let responder = &config.responder;
    for (name, p) in [
        ("confidence_threshold", responder.confidence_threshold),
        ("question_probability", responder.question_probability),
        ("technical_probability", responder.technical_probability),
        ("baseline_probability", responder.baseline_probability),
    ] {
        if !(0.0..=1.0).contains(&p) {
            errors.push(ConfigError::validation(format!(
                "responder.{name} must be within [0, 1], got {p}"
            )));
        }
    }
    if responder.min_delay_ms > responder.max_delay_ms {
        errors.push(ConfigError::validation(format!(
            "responder.min_delay_ms ({}) must not exceed responder.max_delay_ms ({})",
            responder.min_delay_ms, responder.max_delay_ms
        )));
    }
    if responder.completion_timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "responder.completion_timeout_secs must be at least 1",
        ));
    }

    let hub = &config.hub;
    if hub.enabled {
        if hub.host.trim().is_empty() {
            errors.push(ConfigError::validation("hub.host must not be empty"));
        }
        if hub.heartbeat_interval_secs == 0 {
            errors.push(ConfigError::validation(
                "hub.heartbeat_interval_secs must be at least 1",
            ));
        }
    }

    let completion = &config.completion;
    if completion.enabled {
        if completion.model.trim().is_empty() {
            errors.push(ConfigError::validation(
                "completion.model must not be empty when completion is enabled",
            ));
        }
        if !completion.base_url.starts_with("http://") && !completion.base_url.starts_with("https://")
        {
            errors.push(ConfigError::validation(format!(
                "completion.base_url `{}` must be an http(s) URL",
                completion.base_url
            )));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_queue(name: &str, queue: &QueueConfig, errors: &mut Vec<ConfigError>) {
    if queue.concurrency == 0 {
        errors.push(ConfigError::validation(format!(
            "scheduler.{name}.concurrency must be at least 1"
        )));
    }
    if queue.attempts == 0 {
        errors.push(ConfigError::validation(format!(
            "scheduler.{name}.attempts must be at least 1"
        )));
    }
}
