//! Session registry — room pairing, routing, and snapshot fan-out.
//!
//! DESIGN
//! ======
//! Every operation takes the room-map write lock for its whole duration.
//! That single lock is what the protocol's guarantees lean on: two
//! connections racing to join are paired instead of seeding separate rooms,
//! a third join can never slip past capacity, and the `update` broadcasts
//! for one room reach both members in the order the session produced them
//! because mutation and fan-out happen inside the same critical section.
//!
//! ERROR HANDLING
//! ==============
//! Rejections are returned to the caller (the websocket layer) and surfaced
//! to the requesting client only; peers never see another client's errors.

use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

use crate::board::Symbol;
use crate::protocol::{ChatMessage, ErrorCode, ServerMessage};
use crate::session::{MatchSnapshot, SessionError};
use crate::state::{AppState, Room};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("room not found: {0}")]
    NotFound(Uuid),
    #[error("chat text must not be empty")]
    EmptyChat,
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl ErrorCode for RegistryError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "E_ROOM_NOT_FOUND",
            Self::EmptyChat => "E_EMPTY_CHAT",
            Self::Session(e) => e.error_code(),
        }
    }
}

// =============================================================================
// JOIN / LEAVE
// =============================================================================

/// Seat a connection in a room and register its outbound channel.
///
/// With no `requested` room this is find-or-create: the connection fills the
/// vacancy of some waiting room, else becomes the sole occupant of a new
/// one. With a `requested` room (reconnect, or an identifier shared out of
/// band) the connection joins exactly that room or is rejected.
///
/// On success the joiner receives `init` followed by an `update` snapshot,
/// and every other member receives the same `update`.
///
/// # Errors
///
/// Returns `NotFound` for an unknown requested room and `RoomFull` when the
/// requested room already seats two players.
pub async fn join(
    state: &AppState,
    requested: Option<Uuid>,
    client_id: Uuid,
    tx: mpsc::Sender<ServerMessage>,
) -> Result<(Uuid, Symbol), RegistryError> {
    let mut rooms = state.rooms.write().await;

    let room_id = match requested {
        Some(id) => {
            if !rooms.contains_key(&id) {
                return Err(RegistryError::NotFound(id));
            }
            id
        }
        None => match rooms.iter().find(|(_, room)| room.session.is_open()) {
            Some((id, _)) => *id,
            None => {
                let id = Uuid::new_v4();
                rooms.insert(id, Room::new());
                info!(room_id = %id, "created room");
                id
            }
        },
    };

    let Some(room) = rooms.get_mut(&room_id) else {
        return Err(RegistryError::NotFound(room_id));
    };
    let symbol = room.session.join(client_id)?;
    room.clients.insert(client_id, tx);

    room.send_to(client_id, &ServerMessage::Init { symbol, room: room_id });
    room.broadcast(&ServerMessage::Update(room.session.snapshot()));

    info!(%room_id, %client_id, %symbol, players = room.session.player_count(), "client joined room");
    Ok((room_id, symbol))
}

/// Vacate the connection's seat and drop its channel. An abandoned running
/// match is announced to the remaining player (`opponentLeft` plus a fresh
/// Waiting snapshot); an empty room is evicted.
pub async fn leave(state: &AppState, room_id: Uuid, client_id: Uuid) {
    let mut rooms = state.rooms.write().await;
    let Some(room) = rooms.get_mut(&room_id) else {
        return;
    };

    room.clients.remove(&client_id);
    let abandoned = room.session.leave(client_id);
    info!(%room_id, %client_id, remaining = room.clients.len(), "client left room");

    if room.clients.is_empty() {
        rooms.remove(&room_id);
        info!(%room_id, "evicted empty room");
        return;
    }

    if abandoned {
        room.broadcast(&ServerMessage::OpponentLeft);
        room.broadcast(&ServerMessage::Update(room.session.snapshot()));
    }
}

// =============================================================================
// MOVES / RESET
// =============================================================================

/// Apply a move for the connection's symbol and broadcast the new snapshot.
///
/// # Errors
///
/// Returns `NotFound` for a stale room and any `SessionError` rejection
/// unchanged; nothing is broadcast on rejection.
pub async fn play(
    state: &AppState,
    room_id: Uuid,
    client_id: Uuid,
    index: usize,
) -> Result<MatchSnapshot, RegistryError> {
    let mut rooms = state.rooms.write().await;
    let Some(room) = rooms.get_mut(&room_id) else {
        return Err(RegistryError::NotFound(room_id));
    };

    let snapshot = room.session.play(client_id, index)?;
    room.broadcast(&ServerMessage::Update(snapshot.clone()));

    info!(%room_id, %client_id, index, status = ?snapshot.status, "move accepted");
    Ok(snapshot)
}

/// Start a fresh round and broadcast the cleared snapshot.
///
/// # Errors
///
/// Returns `NotFound` for a stale room, `MatchActive` while the match is
/// still running, and `UnknownConnection` for an outsider.
pub async fn reset(
    state: &AppState,
    room_id: Uuid,
    client_id: Uuid,
) -> Result<MatchSnapshot, RegistryError> {
    let mut rooms = state.rooms.write().await;
    let Some(room) = rooms.get_mut(&room_id) else {
        return Err(RegistryError::NotFound(room_id));
    };

    let snapshot = room.session.reset(client_id)?;
    room.broadcast(&ServerMessage::Update(snapshot.clone()));

    info!(%room_id, %client_id, "match reset");
    Ok(snapshot)
}

/// Read-only snapshot of a room for the polling fallback.
#[must_use]
pub async fn snapshot(state: &AppState, room_id: Uuid) -> Option<MatchSnapshot> {
    let rooms = state.rooms.read().await;
    rooms.get(&room_id).map(|room| room.session.snapshot())
}

// =============================================================================
// CHAT
// =============================================================================

/// Relay a chat line to the whole room, stamped with the sender's symbol.
///
/// # Errors
///
/// Returns `EmptyChat` for blank text and `UnknownConnection` when the
/// sender holds no seat in the room.
pub async fn chat(
    state: &AppState,
    room_id: Uuid,
    client_id: Uuid,
    text: &str,
) -> Result<(), RegistryError> {
    if text.trim().is_empty() {
        return Err(RegistryError::EmptyChat);
    }

    let rooms = state.rooms.read().await;
    let Some(room) = rooms.get(&room_id) else {
        return Err(RegistryError::NotFound(room_id));
    };
    let sender = room
        .session
        .symbol_of(client_id)
        .ok_or(SessionError::UnknownConnection)?;

    room.broadcast(&ServerMessage::Chat(ChatMessage::new(sender, text)));
    Ok(())
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
