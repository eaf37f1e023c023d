// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI-compatible completion adapter.
//!
//! Implements [`CompletionAdapter`] over the Chat Completions endpoint. Any
//! server speaking the same wire format can be targeted through
//! `completion.base_url`.

pub mod client;
pub mod types;

use async_trait::async_trait;
use tracing::debug;
use watchtower_config::model::CompletionConfig;
use watchtower_core::types::{CompletionRequest, CompletionResponse};
use watchtower_core::{
    AdapterType, CompletionAdapter, HealthStatus, PluginAdapter, WatchtowerError,
};

use crate::client::OpenAiClient;
use crate::types::{ChatMessage, ChatRequest};

pub struct OpenAiCompletion {
    client: OpenAiClient,
    model: String,
}

impl OpenAiCompletion {
    pub fn new(config: &CompletionConfig) -> Result<Self, WatchtowerError> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        Ok(Self {
            client: OpenAiClient::new(&config.base_url, api_key.as_deref())?,
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl PluginAdapter for OpenAiCompletion {
    fn name(&self) -> &str {
        "openai"
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
impl CompletionAdapter for OpenAiCompletion {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, WatchtowerError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system_prompt {
            messages.push(ChatMessage::system(system));
        }
        messages.push(ChatMessage::user(request.prompt));

        let chat = ChatRequest {
            model: self.model.clone(),
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };
        let response = self.client.chat(&chat).await?;
        let content = response
            .choices
            .into_iter()
            .find_map(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| WatchtowerError::completion("completion returned no text"))?;
        debug!(model = %response.model, chars = content.len(), "completion received");
        Ok(CompletionResponse {
            content,
            model: response.model,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer) -> CompletionConfig {
        CompletionConfig {
            enabled: true,
            base_url: format!("{}/v1", server.uri()),
            api_key: Some("sk-test".into()),
            ..CompletionConfig::default()
        }
    }

    #[tokio::test]
    async fn complete_sends_system_and_user_messages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4o-mini",
                "messages": [
                    {"role": "system", "content": "be casual"},
                    {"role": "user", "content": "wen moon"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "model": "gpt-4o-mini",
                "choices": [{"message": {"role": "assistant", "content": "  soon ser  "}}]
            })))
            .mount(&server)
            .await;

        let adapter = OpenAiCompletion::new(&config(&server)).unwrap();
        let resp = adapter
            .complete(CompletionRequest {
                system_prompt: Some("be casual".into()),
                prompt: "wen moon".into(),
                max_tokens: 50,
                temperature: 0.8,
            })
            .await
            .unwrap();
        assert_eq!(resp.content, "soon ser");
    }

    #[tokio::test]
    async fn empty_completion_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "model": "gpt-4o-mini",
                "choices": [{"message": {"role": "assistant", "content": null}}]
            })))
            .mount(&server)
            .await;

        let adapter = OpenAiCompletion::new(&config(&server)).unwrap();
        let err = adapter
            .complete(CompletionRequest {
                system_prompt: None,
                prompt: "hi".into(),
                max_tokens: 10,
                temperature: 0.5,
            })
            .await
            .unwrap_err();
        assert!(err.is_transient());
    }
}
