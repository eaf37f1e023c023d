// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Observer control messages handled by the pipeline.

use async_trait::async_trait;
use tracing::debug;
use watchtower_core::WatchtowerError;
use watchtower_core::types::IngestedMessage;
use watchtower_hub::{AnalysisKind, ConnectionId, ControlMessage, Envelope, HubHandler, message_types};

use crate::Pipeline;

#[async_trait]
impl HubHandler for Pipeline {
    async fn handle(
        &self,
        connection: ConnectionId,
        message: ControlMessage,
    ) -> Result<Option<Envelope>, WatchtowerError> {
        match message {
            // The socket layer registers before dispatching.
            ControlMessage::RegisterServer { .. } => Ok(None),
            ControlMessage::MessageStream { server_id, data } => {
                let message = streamed_message(&server_id, data)?;
                let receipt = self.ingest(message)?;
                debug!(connection = %connection, job_id = %receipt.analysis.id, "observer message ingested");
                Ok(None)
            }
            ControlMessage::AnalysisRequest {
                server_id,
                analysis_type,
                data,
            } => {
                let kind = AnalysisKind::parse(&analysis_type)?;
                let result = match kind {
                    AnalysisKind::Message => {
                        let content = data
                            .get("content")
                            .and_then(|c| c.as_str())
                            .ok_or_else(|| {
                                WatchtowerError::Validation(
                                    "message analysis requires data.content".to_string(),
                                )
                            })?;
                        serde_json::json!({ "result": self.analyze_text(content) })
                    }
                    AnalysisKind::Behavior => {
                        let user_id = data.get("userId").and_then(|u| u.as_str()).ok_or_else(|| {
                            WatchtowerError::Validation(
                                "behavior analysis requires data.userId".to_string(),
                            )
                        })?;
                        let handle = self.request_behavior_analysis(user_id, &server_id)?;
                        serde_json::json!({ "userId": user_id, "jobId": handle.id, "queued": true })
                    }
                    AnalysisKind::Community => {
                        let handle = self.request_profiling(&server_id)?;
                        serde_json::json!({
                            "jobId": handle.map(|h| h.id),
                            "queued": handle.is_some(),
                        })
                    }
                };
                let mut data = result;
                data["analysisType"] = serde_json::Value::String(kind.to_string());
                Ok(Some(Envelope::new(
                    message_types::ANALYSIS_RESPONSE,
                    server_id,
                    data,
                )))
            }
        }
    }

    async fn health(&self) -> serde_json::Value {
        serde_json::to_value(self.health_snapshot().await).unwrap_or_default()
    }
}

/// An observer-pushed message. `communityId` defaults to the envelope's
/// `serverId` and must agree with it when present.
fn streamed_message(
    server_id: &str,
    mut data: serde_json::Value,
) -> Result<IngestedMessage, WatchtowerError> {
    let Some(object) = data.as_object_mut() else {
        return Err(WatchtowerError::Validation(
            "message_stream data must be an object".to_string(),
        ));
    };
    object
        .entry("communityId")
        .or_insert_with(|| serde_json::Value::String(server_id.to_string()));
    let message: IngestedMessage = serde_json::from_value(data)?;
    if message.community_id != server_id {
        return Err(WatchtowerError::Validation(format!(
            "message for community {} streamed under serverId {server_id}",
            message.community_id
        )));
    }
    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn streamed_message_defaults_community() {
        let msg = streamed_message(
            "C1",
            serde_json::json!({
                "id": "m1",
                "channelId": "general",
                "authorId": "u1",
                "content": "gm",
                "timestamp": "2026-01-05T12:00:00Z",
            }),
        )
        .unwrap();
        assert_eq!(msg.community_id, "C1");
        assert!(!msg.is_bot);
    }

    #[test]
    fn streamed_message_rejects_mismatch_and_garbage() {
        let mismatch = streamed_message(
            "C1",
            serde_json::json!({
                "id": "m1",
                "communityId": "C2",
                "channelId": "general",
                "authorId": "u1",
                "content": "gm",
                "timestamp": "2026-01-05T12:00:00Z",
            }),
        );
        assert!(matches!(mismatch, Err(WatchtowerError::Validation(_))));
        assert!(matches!(
            streamed_message("C1", serde_json::json!("gm")),
            Err(WatchtowerError::Validation(_))
        ));
        assert!(matches!(
            streamed_message("C1", serde_json::json!({"id": "m1"})),
            Err(WatchtowerError::Validation(_))
        ));
    }
}
