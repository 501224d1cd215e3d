//! Sync protocol — the message contract between clients and the server.
//!
//! ARCHITECTURE
//! ============
//! Every message is a flat JSON object tagged by a `type` field, matching
//! what the browser clients already speak: inbound `move`/`reset`/`chat`,
//! outbound `init`/`update`/`roomFull`/`opponentLeft`/`chat`/`error`.
//! Joining is implicit in the transport connect and leaving in its close,
//! so neither has an inbound message.
//!
//! DESIGN
//! ======
//! - A reset is acknowledged with a full `update` broadcast rather than a
//!   bare `reset` signal, so clients reconcile from the snapshot alone.
//! - Rejections carry a grepable `E_*` code next to the human message.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::board::Symbol;
use crate::session::MatchSnapshot;

// =============================================================================
// ERROR CODES
// =============================================================================

/// Grepable error code for structured `error` messages.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;
}

// =============================================================================
// MESSAGES
// =============================================================================

/// Client → server. Tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Claim a cell for the sender's symbol.
    Move { index: usize },
    /// Start a fresh round after a finished match.
    Reset,
    /// Relay a line of chat to the room.
    Chat { text: String },
}

/// Server → client. Tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// Sent once to a freshly joined connection: its symbol and the room
    /// identifier to thread through reconnects.
    Init { symbol: Symbol, room: Uuid },
    /// Full snapshot, broadcast to the room after every accepted mutation.
    Update(MatchSnapshot),
    /// Join rejected: the room already seats two players.
    RoomFull { message: String },
    /// The other player's connection closed mid-game.
    OpponentLeft,
    /// Chat line relayed verbatim to the room.
    Chat(ChatMessage),
    /// Request rejected; scoped to the sender, no state changed.
    Error { code: String, message: String },
}

impl ServerMessage {
    /// Build an `error` message from a typed rejection.
    #[must_use]
    pub fn error_from(err: &(impl ErrorCode + ?Sized)) -> Self {
        ServerMessage::Error { code: err.error_code().to_string(), message: err.to_string() }
    }
}

// =============================================================================
// CHAT
// =============================================================================

/// One relayed chat line. Append-only; ordering is per-recipient arrival.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: Symbol,
    pub text: String,
    /// Milliseconds since Unix epoch, stamped at relay time.
    pub ts: i64,
}

impl ChatMessage {
    #[must_use]
    pub fn new(sender: Symbol, text: impl Into<String>) -> Self {
        Self { sender, text: text.into(), ts: now_ms() }
    }
}

/// Current time as milliseconds since Unix epoch.
fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

#[cfg(test)]
#[path = "protocol_test.rs"]
mod tests;
