// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Time-based statistics: frequency, hourly histogram, bursts, response gaps.

use chrono::Timelike;
use watchtower_core::types::{MessageRecord, ResponsePattern};

/// Gap after which a message starts a new conversation burst.
pub const BURST_GAP_SECS: i64 = 5 * 60;
/// Cross-author pairs further apart than this are not responses.
pub const RESPONSE_WINDOW_SECS: i64 = 5 * 60;
/// Responses faster than this count as fast.
pub const FAST_RESPONSE_SECS: i64 = 10;
/// The peak hour must exceed the mean bucket by this factor to be unusual.
const UNUSUAL_PEAK_FACTOR: f64 = 5.0;

/// Messages per hour, with spans under an hour treated as one hour.
pub fn message_frequency(history: &[MessageRecord]) -> f64 {
    let (Some(first), Some(last)) = (history.first(), history.last()) else {
        return 0.0;
    };
    let hours = (last.timestamp - first.timestamp).num_seconds() as f64 / 3600.0;
    history.len() as f64 / hours.max(1.0)
}

pub fn hourly_histogram(history: &[MessageRecord]) -> [u32; 24] {
    let mut buckets = [0u32; 24];
    for msg in history {
        buckets[msg.timestamp.hour() as usize] += 1;
    }
    buckets
}

pub fn is_unusual_activity(buckets: &[u32; 24]) -> bool {
    let total: u32 = buckets.iter().sum();
    if total == 0 {
        return false;
    }
    let mean = f64::from(total) / 24.0;
    let peak = buckets.iter().copied().max().unwrap_or(0);
    f64::from(peak) > UNUSUAL_PEAK_FACTOR * mean
}

/// Fraction of messages that open a new burst.
///
/// The first message has no predecessor and is not counted as a starter.
pub fn burst_start_rate(history: &[MessageRecord]) -> f64 {
    if history.is_empty() {
        return 0.0;
    }
    let starters = history
        .windows(2)
        .filter(|w| (w[1].timestamp - w[0].timestamp).num_seconds() > BURST_GAP_SECS)
        .count();
    starters as f64 / history.len() as f64
}

/// Latencies of `user_id` answering someone else in the same channel.
///
/// `context` must be time-ordered; it may span several channels.
pub fn response_pattern(user_id: &str, context: &[MessageRecord]) -> ResponsePattern {
    let mut last_in_channel: std::collections::HashMap<&str, &MessageRecord> =
        std::collections::HashMap::new();
    let mut gaps: Vec<i64> = Vec::new();

    for msg in context {
        if let Some(prev) = last_in_channel.get(msg.channel_id.as_str())
            && msg.author_id == user_id
            && prev.author_id != user_id
        {
            let gap = (msg.timestamp - prev.timestamp).num_seconds();
            if (0..RESPONSE_WINDOW_SECS).contains(&gap) {
                gaps.push(gap);
            }
        }
        last_in_channel.insert(msg.channel_id.as_str(), msg);
    }

    if gaps.is_empty() {
        return ResponsePattern::default();
    }
    ResponsePattern {
        average_gap_secs: gaps.iter().sum::<i64>() as f64 / gaps.len() as f64,
        fast_responses: gaps.iter().filter(|g| **g < FAST_RESPONSE_SECS).count() as u32,
        total_gaps: gaps.len() as u32,
    }
}
