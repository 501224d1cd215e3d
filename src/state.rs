//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the live room map: each room pairs a `MatchSession` with the
//! outbound channels of its connected clients. All state is in-memory and
//! scoped to process lifetime.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use crate::protocol::ServerMessage;
use crate::session::MatchSession;

// =============================================================================
// ROOM
// =============================================================================

/// One live room: the authoritative session plus connected clients keyed by
/// connection ID.
pub struct Room {
    pub session: MatchSession,
    pub clients: HashMap<Uuid, mpsc::Sender<ServerMessage>>,
}

impl Room {
    #[must_use]
    pub fn new() -> Self {
        Self { session: MatchSession::new(), clients: HashMap::new() }
    }

    /// Queue a message for every client in the room. Best-effort: a client
    /// whose channel is full misses the message and reconciles from the
    /// next snapshot.
    pub fn broadcast(&self, message: &ServerMessage) {
        for tx in self.clients.values() {
            let _ = tx.try_send(message.clone());
        }
    }

    /// Queue a message for one client only.
    pub fn send_to(&self, client_id: Uuid, message: &ServerMessage) {
        if let Some(tx) = self.clients.get(&client_id) {
            let _ = tx.try_send(message.clone());
        }
    }
}

impl Default for Room {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state. Clone is required by Axum — the room map is
/// Arc-wrapped. The write lock is what serializes room pairing and all
/// per-room mutations.
#[derive(Clone)]
pub struct AppState {
    pub rooms: Arc<RwLock<HashMap<Uuid, Room>>>,
}

impl AppState {
    #[must_use]
    pub fn new() -> Self {
        Self { rooms: Arc::new(RwLock::new(HashMap::new())) }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Symbol;

    #[test]
    fn new_room_is_empty_and_waiting() {
        let room = Room::new();
        assert!(room.clients.is_empty());
        assert_eq!(room.session.player_count(), 0);
    }

    #[tokio::test]
    async fn broadcast_reaches_every_client() {
        let room_state = AppState::new();
        let room_id = test_helpers::seed_room(&room_state).await;
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut rx_a = test_helpers::attach_channel(&room_state, room_id, a).await;
        let mut rx_b = test_helpers::attach_channel(&room_state, room_id, b).await;

        let rooms = room_state.rooms.read().await;
        rooms
            .get(&room_id)
            .expect("room should exist")
            .broadcast(&ServerMessage::OpponentLeft);

        assert_eq!(rx_a.try_recv(), Ok(ServerMessage::OpponentLeft));
        assert_eq!(rx_b.try_recv(), Ok(ServerMessage::OpponentLeft));
    }

    #[tokio::test]
    async fn send_to_targets_a_single_client() {
        let state = AppState::new();
        let room_id = test_helpers::seed_room(&state).await;
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut rx_a = test_helpers::attach_channel(&state, room_id, a).await;
        let mut rx_b = test_helpers::attach_channel(&state, room_id, b).await;

        let rooms = state.rooms.read().await;
        let room = rooms.get(&room_id).expect("room should exist");
        room.send_to(a, &ServerMessage::Init { symbol: Symbol::X, room: room_id });

        assert!(matches!(rx_a.try_recv(), Ok(ServerMessage::Init { .. })));
        assert!(rx_b.try_recv().is_err());
    }
}
