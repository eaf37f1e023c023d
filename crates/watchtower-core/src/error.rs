// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for Watchtower.

use thiserror::Error;

/// The primary error type used across all Watchtower services and adapter traits.
#[derive(Debug, Error)]
pub enum WatchtowerError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Chat platform errors (fetch failure, send failure, missing community).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Text-completion capability errors (HTTP failure, malformed reply).
    #[error("completion error: {message}")]
    Completion {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Malformed input that will never succeed on retry.
    #[error("validation error: {0}")]
    Validation(String),

    /// A job was submitted to a queue name the scheduler does not know.
    #[error("unknown queue: {0}")]
    UnknownQueue(String),

    /// Scheduler state errors (job payload mismatch, missing processor).
    #[error("scheduler error: {0}")]
    Scheduler(String),

    /// The scheduler is draining and no longer accepts jobs.
    #[error("scheduler is shutting down")]
    ShuttingDown,

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl WatchtowerError {
    /// Whether retrying the failed operation could plausibly succeed.
    ///
    /// Infrastructure failures are transient; malformed input and unknown
    /// queue names are permanent and must never be retried.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            WatchtowerError::Storage { .. }
                | WatchtowerError::Channel { .. }
                | WatchtowerError::Completion { .. }
                | WatchtowerError::Timeout { .. }
                | WatchtowerError::Internal(_)
        )
    }

    /// Wraps any storage-layer error.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        WatchtowerError::Storage {
            source: Box::new(err),
        }
    }

    /// Channel error without an underlying source.
    pub fn channel(message: impl Into<String>) -> Self {
        WatchtowerError::Channel {
            message: message.into(),
            source: None,
        }
    }

    /// Completion error without an underlying source.
    pub fn completion(message: impl Into<String>) -> Self {
        WatchtowerError::Completion {
            message: message.into(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for WatchtowerError {
    fn from(err: serde_json::Error) -> Self {
        WatchtowerError::Validation(format!("malformed payload: {err}"))
    }
}
