// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text-completion adapter trait (OpenAI-compatible services, local models).

use async_trait::async_trait;

use crate::error::WatchtowerError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{CompletionRequest, CompletionResponse};

/// Pluggable text generation used by the contextual responder.
#[async_trait]
pub trait CompletionAdapter: PluginAdapter {
    /// Produces a single completion for the request.
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, WatchtowerError>;
}
