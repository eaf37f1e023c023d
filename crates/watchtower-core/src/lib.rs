// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for Watchtower.
//!
//! This crate provides the error type, the shared data model, and the
//! adapter traits for the external collaborators (chat platform, text
//! completion, storage). Every other crate in the workspace depends on it.

pub mod error;
pub mod keyed;
pub mod random;
pub mod traits;
pub mod types;

pub use error::WatchtowerError;
pub use keyed::KeyedLocks;
pub use random::{RandomSource, SeededRandom, ThreadRandom};
pub use types::{AdapterType, BehaviorKey, HealthStatus, MessageId};

pub use traits::{ChannelAdapter, CompletionAdapter, PluginAdapter, StorageAdapter};
