// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Observer -> hub control messages.
//!
//! ```json
//! {"type": "register_server", "serverId": "C1"}
//! {"type": "message_stream", "serverId": "C1", "data": {...}}
//! {"type": "analysis_request", "serverId": "C1", "analysisType": "message", "data": {...}}
//! ```

use serde::Deserialize;
use strum::{Display, EnumString};
use tracing::warn;
use watchtower_core::WatchtowerError;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlMessage {
    #[serde(rename_all = "camelCase")]
    RegisterServer { server_id: String },
    #[serde(rename_all = "camelCase")]
    MessageStream {
        server_id: String,
        #[serde(default)]
        data: serde_json::Value,
    },
    #[serde(rename_all = "camelCase")]
    AnalysisRequest {
        server_id: String,
        analysis_type: String,
        #[serde(default)]
        data: serde_json::Value,
    },
}

const KNOWN_TYPES: [&str; 3] = ["register_server", "message_stream", "analysis_request"];

/// What an `analysis_request` asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum AnalysisKind {
    Message,
    Behavior,
    Community,
}

impl AnalysisKind {
    pub fn parse(raw: &str) -> Result<Self, WatchtowerError> {
        raw.parse()
            .map_err(|_| WatchtowerError::Validation(format!("unknown analysisType '{raw}'")))
    }
}

/// Parses one text frame from an observer.
///
/// Returns `Ok(None)` for a well-formed object whose `type` is not one we
/// handle; those are logged and ignored. Malformed frames are validation
/// errors.
pub fn parse_control(text: &str) -> Result<Option<ControlMessage>, WatchtowerError> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    let Some(kind) = value.get("type").and_then(|t| t.as_str()) else {
        return Err(WatchtowerError::Validation(
            "control message has no string `type`".to_string(),
        ));
    };
    if !KNOWN_TYPES.contains(&kind) {
        warn!(kind, "ignoring unrecognized control message");
        return Ok(None);
    }
    Ok(Some(serde_json::from_value(value)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_register() {
        let msg = parse_control(r#"{"type":"register_server","serverId":"C1"}"#)
            .unwrap()
            .unwrap();
        assert_eq!(
            msg,
            ControlMessage::RegisterServer {
                server_id: "C1".into()
            }
        );
    }

    #[test]
    fn parses_analysis_request() {
        let msg = parse_control(
            r#"{"type":"analysis_request","serverId":"C1","analysisType":"behavior","data":{"userId":"u1"}}"#,
        )
        .unwrap()
        .unwrap();
        let ControlMessage::AnalysisRequest {
            analysis_type,
            data,
            ..
        } = msg
        else {
            panic!("wrong variant");
        };
        assert_eq!(AnalysisKind::parse(&analysis_type).unwrap(), AnalysisKind::Behavior);
        assert_eq!(data["userId"], "u1");
    }

    #[test]
    fn message_stream_data_defaults_to_null() {
        let msg = parse_control(r#"{"type":"message_stream","serverId":"C1"}"#)
            .unwrap()
            .unwrap();
        assert!(matches!(
            msg,
            ControlMessage::MessageStream { data: serde_json::Value::Null, .. }
        ));
    }

    #[test]
    fn unknown_type_is_ignored() {
        assert!(parse_control(r#"{"type":"subscribe_all"}"#).unwrap().is_none());
    }

    #[test]
    fn malformed_frames_are_validation_errors() {
        for raw in ["not json", r#"{"serverId":"C1"}"#, r#"{"type":"register_server"}"#] {
            let err = parse_control(raw).unwrap_err();
            assert!(matches!(err, WatchtowerError::Validation(_)), "{raw}");
            assert!(!err.is_transient());
        }
    }

    #[test]
    fn unknown_analysis_kind_is_rejected() {
        assert!(AnalysisKind::parse("sentiment").is_err());
        assert_eq!(AnalysisKind::parse("community").unwrap(), AnalysisKind::Community);
    }
}
