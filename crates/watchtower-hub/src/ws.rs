// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket handler for observer connections.

use axum::{
    body::Bytes,
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::envelope::{Envelope, message_types};
use crate::protocol::{ControlMessage, parse_control};
use crate::registry::{ConnectionId, Frame};
use crate::server::HubState;

#[derive(Debug, Default, Deserialize)]
pub struct WsParams {
    #[serde(default)]
    token: Option<String>,
}

/// Authenticates the handshake, then upgrades.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    Query(params): Query<WsParams>,
    State(state): State<HubState>,
) -> Response {
    if !state.auth.authorize(&headers, params.token.as_deref()) {
        debug!("rejected observer handshake");
        return StatusCode::UNAUTHORIZED.into_response();
    }
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Runs one observer connection until either side closes or the heartbeat
/// reaps it.
async fn handle_socket(socket: WebSocket, state: HubState) {
    let (mut sink, mut stream) = socket.split();
    let (id, mut rx) = state.hub.connect().await;

    let mut writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            let message = match frame {
                Frame::Text(text) => Message::Text(text.as_ref().into()),
                Frame::Ping => Message::Ping(Bytes::new()),
                Frame::Close => {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
            };
            if sink.send(message).await.is_err() {
                break;
            }
        }
    });

    loop {
        tokio::select! {
            _ = &mut writer => break,
            incoming = stream.next() => {
                let Some(Ok(message)) = incoming else { break };
                match message {
                    Message::Text(text) => on_text(&state, id, text.as_str()).await,
                    Message::Pong(_) => state.hub.mark_alive(id).await,
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    }

    state.hub.disconnect(id).await;
    writer.abort();
}

async fn on_text(state: &HubState, id: ConnectionId, text: &str) {
    let reply = match parse_control(text) {
        Ok(None) => None,
        Ok(Some(ControlMessage::RegisterServer { server_id })) => {
            state.hub.register(id, &server_id).await;
            Some(Envelope::new(
                message_types::REGISTERED,
                server_id,
                serde_json::json!({ "connectionId": id.to_string() }),
            ))
        }
        Ok(Some(message)) => match state.handler.handle(id, message).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(connection = %id, error = %e, "control message failed");
                Some(error_envelope(state, &e))
            }
        },
        Err(e) => {
            warn!(connection = %id, error = %e, "rejected control message");
            Some(error_envelope(state, &e))
        }
    };

    if let Some(reply) = reply {
        state.hub.send_to(id, &reply).await;
    }
}

fn error_envelope(state: &HubState, err: &watchtower_core::WatchtowerError) -> Envelope {
    Envelope::new(
        message_types::ERROR,
        state.server_name.clone(),
        serde_json::json!({ "message": err.to_string() }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_default_to_no_token() {
        let params: WsParams = serde_json::from_str("{}").unwrap();
        assert!(params.token.is_none());
    }
}
