// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire envelope for everything the hub sends to observers.
//!
//! ```json
//! {"type": "suspicious_activity", "serverId": "C1", "data": {...}, "timestamp": "2026-01-05T12:00:00Z"}
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server -> observer message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    pub server_id: String,
    pub data: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl Envelope {
    /// Builds an envelope stamped with the current server time.
    ///
    /// Any `timestamp` field inside `data` is left alone; the envelope's own
    /// timestamp is always the hub's clock.
    pub fn new(
        kind: impl Into<String>,
        server_id: impl Into<String>,
        data: serde_json::Value,
    ) -> Self {
        Self {
            kind: kind.into(),
            server_id: server_id.into(),
            data,
            timestamp: Utc::now(),
        }
    }

    pub fn to_json(&self) -> String {
        // Value-backed structs cannot fail to serialize.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Envelope `type` values emitted by the server.
pub mod message_types {
    pub const REGISTERED: &str = "registered";
    pub const REALTIME_MESSAGE: &str = "realtime_message";
    pub const MESSAGE_ANALYZED: &str = "message_analyzed";
    pub const SUSPICIOUS_ACTIVITY: &str = "suspicious_activity";
    pub const COMMUNITY_PROFILED: &str = "community_profiled";
    pub const ANALYSIS_RESPONSE: &str = "analysis_response";
    /// A reply or notice for a bridging observer to post on the platform.
    pub const OUTBOUND_MESSAGE: &str = "outbound_message";
    pub const HEALTH: &str = "health";
    pub const ERROR: &str = "error";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_wire_field_names() {
        let env = Envelope::new("health", "watchtower", serde_json::json!({"ok": true}));
        let value: serde_json::Value = serde_json::from_str(&env.to_json()).unwrap();
        assert_eq!(value["type"], "health");
        assert_eq!(value["serverId"], "watchtower");
        assert_eq!(value["data"]["ok"], true);
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn client_timestamp_does_not_replace_server_stamp() {
        let before = Utc::now();
        let env = Envelope::new(
            "message_analyzed",
            "C1",
            serde_json::json!({"timestamp": "1999-01-01T00:00:00Z"}),
        );
        assert!(env.timestamp >= before);
        assert_eq!(env.data["timestamp"], "1999-01-01T00:00:00Z");
    }
}
