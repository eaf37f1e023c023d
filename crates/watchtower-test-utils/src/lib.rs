// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Watchtower integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockChannel`] - Scriptable chat platform with sent-message capture
//! - [`MockCompletion`] - Completion adapter with canned replies, failures and hangs
//! - [`MemoryStorage`] - In-memory [`StorageAdapter`](watchtower_core::StorageAdapter)
//! - [`ScriptedRandom`] - Random source replaying fixed values
//! - [`TestHarness`] - Temp SQLite storage plus mocks and a test configuration

pub mod harness;
pub mod memory_storage;
pub mod mock_channel;
pub mod mock_completion;
pub mod scripted_random;

pub use harness::TestHarness;
pub use memory_storage::MemoryStorage;
pub use mock_channel::MockChannel;
pub use mock_completion::MockCompletion;
pub use scripted_random::ScriptedRandom;

use chrono::{DateTime, Duration, TimeZone, Utc};
use watchtower_core::types::IngestedMessage;

/// Fixed reference instant for fixtures.
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 5, 12, 0, 0)
        .single()
        .unwrap_or_default()
}

/// A human message `offset_secs` after [`epoch`].
pub fn message(
    id: &str,
    community: &str,
    channel: &str,
    author: &str,
    content: &str,
    offset_secs: i64,
) -> IngestedMessage {
    IngestedMessage {
        id: id.to_string(),
        community_id: community.to_string(),
        channel_id: channel.to_string(),
        author_id: author.to_string(),
        content: content.to_string(),
        timestamp: epoch() + Duration::seconds(offset_secs),
        is_moderator: false,
        is_bot: false,
        reply_to: None,
    }
}
