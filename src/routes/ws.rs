//! WebSocket handler — the transport for the sync protocol.
//!
//! DESIGN
//! ======
//! Connecting is joining: the upgrade seats the connection via the registry
//! before the relay loop starts, and the socket closing is the leave. The
//! loop `select!`s between inbound client messages and broadcast messages
//! queued by room peers on this connection's channel.
//!
//! Successful mutations are answered only through the room broadcast (the
//! sender is a room member and receives the same `update` as its peer);
//! rejections are sent straight back on the socket to the requester alone.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → registry join → `init` + `update` queued on the channel
//! 2. Client messages → parse → registry call → errors replied directly
//! 3. Close or send failure → registry leave → peer notified if mid-game

use std::collections::HashMap;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::protocol::{ClientMessage, ServerMessage};
use crate::registry;
use crate::registry::RegistryError;
use crate::session::SessionError;
use crate::state::AppState;

/// Outbound queue depth per connection. A full queue drops broadcasts for
/// that client; the next snapshot reconciles it.
const CLIENT_CHANNEL_CAPACITY: usize = 64;

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    ws: WebSocketUpgrade,
) -> Response {
    // Optional `?room=<uuid>`: rejoin a known room instead of being paired.
    let requested = match params.get("room").map(|raw| raw.parse::<Uuid>()) {
        None => None,
        Some(Ok(room_id)) => Some(room_id),
        Some(Err(_)) => return (StatusCode::BAD_REQUEST, "invalid room id").into_response(),
    };

    ws.on_upgrade(move |socket| run_ws(socket, state, requested))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState, requested: Option<Uuid>) {
    let client_id = Uuid::new_v4();
    let (client_tx, mut client_rx) = mpsc::channel::<ServerMessage>(CLIENT_CHANNEL_CAPACITY);

    let (room_id, symbol) = match registry::join(&state, requested, client_id, client_tx).await {
        Ok(seated) => seated,
        Err(e) => {
            warn!(%client_id, error = %e, "ws: join rejected");
            let reply = match &e {
                RegistryError::Session(SessionError::RoomFull) => {
                    ServerMessage::RoomFull { message: e.to_string() }
                }
                _ => ServerMessage::error_from(&e),
            };
            let _ = send_message(&mut socket, &reply).await;
            return;
        }
    };
    info!(%client_id, %room_id, %symbol, "ws: client connected");

    'conn: loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        for reply in process_inbound_text(&state, room_id, client_id, &text).await {
                            if send_message(&mut socket, &reply).await.is_err() {
                                break 'conn;
                            }
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(message) = client_rx.recv() => {
                if send_message(&mut socket, &message).await.is_err() {
                    break;
                }
            }
        }
    }

    registry::leave(&state, room_id, client_id).await;
    info!(%client_id, %room_id, "ws: client disconnected");
}

// =============================================================================
// DISPATCH
// =============================================================================

/// Parse and process one inbound text message, returning replies owed to the
/// sender alone. Split from the socket loop so tests can drive dispatch
/// without a live websocket.
async fn process_inbound_text(
    state: &AppState,
    room_id: Uuid,
    client_id: Uuid,
    text: &str,
) -> Vec<ServerMessage> {
    let message: ClientMessage = match serde_json::from_str(text) {
        Ok(m) => m,
        Err(e) => {
            warn!(%client_id, error = %e, "ws: malformed inbound message");
            return vec![ServerMessage::Error {
                code: "E_BAD_MESSAGE".into(),
                message: format!("invalid message: {e}"),
            }];
        }
    };

    let result = match message {
        ClientMessage::Move { index } => registry::play(state, room_id, client_id, index)
            .await
            .map(|_| ()),
        ClientMessage::Reset => registry::reset(state, room_id, client_id).await.map(|_| ()),
        ClientMessage::Chat { text } => registry::chat(state, room_id, client_id, &text).await,
    };

    match result {
        // Accepted mutations flow back through the room broadcast channel.
        Ok(()) => vec![],
        Err(e) => {
            warn!(%client_id, %room_id, error = %e, "ws: request rejected");
            vec![ServerMessage::error_from(&e)]
        }
    }
}

// =============================================================================
// HELPERS
// =============================================================================

async fn send_message(socket: &mut WebSocket, message: &ServerMessage) -> Result<(), ()> {
    let json = match serde_json::to_string(message) {
        Ok(j) => j,
        Err(e) => {
            warn!(error = %e, "ws: failed to serialize message");
            return Err(());
        }
    };
    socket.send(Message::Text(json.into())).await.map_err(|_| ())
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
