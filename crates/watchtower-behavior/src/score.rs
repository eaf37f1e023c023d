// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Suspicion score and risk factors from aggregate statistics.
//!
//! Thresholds for the same signal are additive: a repetition rate of 0.95
//! earns both the 0.7 and the 0.9 contribution. Risk factors use their own
//! cut points and are only an explanation of the numbers, so they can
//! disagree with the score.

use watchtower_core::types::MAX_SUSPICION_SCORE;

/// The statistics the score is computed from.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoreInputs {
    pub message_frequency: f64,
    pub average_message_length: f64,
    pub repetition_rate: f64,
    pub generic_rate: f64,
    pub activity_unusual: bool,
    pub fast_response_fraction: f64,
    pub topic_consistency: f64,
}

pub const EXCESSIVE_MESSAGING: &str = "excessive_messaging_frequency";
pub const HIGH_REPETITION: &str = "high_content_repetition";
pub const GENERIC_RESPONSES: &str = "generic_responses";
pub const AUTOMATED_TIMING: &str = "automated_response_timing";
pub const SHORT_MESSAGES: &str = "extremely_short_messages";
pub const UNUSUAL_ACTIVITY: &str = "unusual_activity_pattern";

pub fn suspicion_score(s: &ScoreInputs) -> u8 {
    let mut score: u32 = 0;

    if s.message_frequency > 10.0 {
        score += 2;
    }
    if s.message_frequency > 20.0 {
        score += 3;
    }
    if s.average_message_length < 10.0 || s.average_message_length > 500.0 {
        score += 1;
    }
    if s.repetition_rate > 0.7 {
        score += 3;
    }
    if s.repetition_rate > 0.9 {
        score += 5;
    }
    if s.generic_rate > 0.8 {
        score += 2;
    }
    if s.activity_unusual {
        score += 2;
    }
    if s.fast_response_fraction > 0.8 {
        score += 3;
    }
    if s.topic_consistency < 0.2 {
        score += 1;
    }

    score.min(u32::from(MAX_SUSPICION_SCORE)) as u8
}

pub fn risk_factors(s: &ScoreInputs) -> Vec<String> {
    let checks = [
        (s.message_frequency > 15.0, EXCESSIVE_MESSAGING),
        (s.repetition_rate > 0.8, HIGH_REPETITION),
        (s.generic_rate > 0.7, GENERIC_RESPONSES),
        (s.fast_response_fraction > 0.7, AUTOMATED_TIMING),
        (s.average_message_length < 10.0, SHORT_MESSAGES),
        (s.activity_unusual, UNUSUAL_ACTIVITY),
    ];
    checks
        .into_iter()
        .filter(|(hit, _)| *hit)
        .map(|(_, name)| name.to_string())
        .collect()
}
