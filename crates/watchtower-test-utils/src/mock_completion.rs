// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock completion adapter for deterministic testing.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use watchtower_core::traits::adapter::PluginAdapter;
use watchtower_core::traits::completion::CompletionAdapter;
use watchtower_core::types::{AdapterType, CompletionRequest, CompletionResponse, HealthStatus};
use watchtower_core::WatchtowerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Mode {
    #[default]
    Reply,
    Fail,
    Hang,
}

#[derive(Default)]
struct State {
    replies: VecDeque<String>,
    mode: Mode,
    requests: Vec<CompletionRequest>,
}

/// Returns queued replies in order, then a default reply.
#[derive(Default)]
pub struct MockCompletion {
    state: Mutex<State>,
}

impl MockCompletion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_replies(replies: Vec<String>) -> Self {
        let mock = Self::new();
        mock.state().replies.extend(replies);
        mock
    }

    /// Every request fails with a completion error.
    pub fn failing() -> Self {
        let mock = Self::new();
        mock.state().mode = Mode::Fail;
        mock
    }

    /// Every request waits forever.
    pub fn hanging() -> Self {
        let mock = Self::new();
        mock.state().mode = Mode::Hang;
        mock
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        self.state().replies.push_back(reply.into());
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.state().requests.clone()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }
}

#[async_trait]
impl PluginAdapter for MockCompletion {
    fn name(&self) -> &str {
        "mock-completion"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Completion
    }

    async fn health_check(&self) -> Result<HealthStatus, WatchtowerError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), WatchtowerError> {
        Ok(())
    }
}

#[async_trait]
impl CompletionAdapter for MockCompletion {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, WatchtowerError> {
        let (mode, reply) = {
            let mut state = self.state();
            state.requests.push(request);
            (state.mode, state.replies.pop_front())
        };
        match mode {
            Mode::Fail => Err(WatchtowerError::completion("mock completion failure")),
            Mode::Hang => {
                std::future::pending::<()>().await;
                Err(WatchtowerError::completion("unreachable"))
            }
            Mode::Reply => Ok(CompletionResponse {
                content: reply.unwrap_or_else(|| "sounds good".to_string()),
                model: "mock-model".to_string(),
            }),
        }
    }
}
