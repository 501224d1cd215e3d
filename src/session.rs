//! Match session — the authoritative state machine for one room.
//!
//! DESIGN
//! ======
//! A session owns the board, the turn pointer, and the seat assignment for
//! up to two connections. It is purely synchronous: callers (the registry)
//! hold the room lock across every operation, which is what serializes
//! near-simultaneous moves against the turn flip.
//!
//! LIFECYCLE
//! =========
//! Waiting (0–1 seats filled) → InProgress (both seats filled, alternating
//! turns) → Won/Draw → (reset) InProgress with a fresh board and the same
//! seat assignment. A mid-game leave returns the session to Waiting with a
//! cleared board; the vacated seat is open to a new joiner.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::board::{Board, InvalidMove, Symbol, Verdict};
use crate::protocol::ErrorCode;

// =============================================================================
// TYPES
// =============================================================================

/// Where a match stands. `Won`/`Draw` are terminal until a reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchStatus {
    Waiting,
    InProgress,
    Won,
    Draw,
}

impl MatchStatus {
    /// Terminal statuses accept only a reset.
    #[must_use]
    pub fn is_finished(self) -> bool {
        matches!(self, MatchStatus::Won | MatchStatus::Draw)
    }
}

/// The full observable state of a match, broadcast after every mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSnapshot {
    pub board: Board,
    pub turn: Symbol,
    pub status: MatchStatus,
    pub winner: Option<Symbol>,
    pub winning_line: Option<[usize; 3]>,
}

/// Per-request rejection. None of these mutate session state and none are
/// fatal to the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("room already has two players")]
    RoomFull,
    #[error("it is not your turn")]
    NotYourTurn,
    #[error("the match is over; reset to play again")]
    GameOver,
    #[error("waiting for an opponent to join")]
    NotStarted,
    #[error("your opponent left the match")]
    OpponentLeft,
    #[error("the match has not finished yet")]
    MatchActive,
    #[error("connection is not part of this match")]
    UnknownConnection,
    #[error(transparent)]
    Move(#[from] InvalidMove),
}

impl ErrorCode for SessionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::RoomFull => "E_ROOM_FULL",
            Self::NotYourTurn => "E_NOT_YOUR_TURN",
            Self::GameOver => "E_GAME_OVER",
            Self::NotStarted => "E_NOT_STARTED",
            Self::OpponentLeft => "E_OPPONENT_LEFT",
            Self::MatchActive => "E_MATCH_ACTIVE",
            Self::UnknownConnection => "E_UNKNOWN_CONNECTION",
            Self::Move(_) => "E_INVALID_MOVE",
        }
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// Seat order fixes symbol assignment: seat 0 is X, seat 1 is O.
const SEAT_SYMBOLS: [Symbol; 2] = [Symbol::X, Symbol::O];

/// One two-player match: board, turn pointer, and seat assignment.
#[derive(Debug, Clone)]
pub struct MatchSession {
    board: Board,
    turn: Symbol,
    seats: [Option<Uuid>; 2],
    status: MatchStatus,
    winner: Option<Symbol>,
    winning_line: Option<[usize; 3]>,
    /// Set when a player left mid-game; distinguishes "opponent gone" from
    /// "opponent never arrived" while Waiting.
    abandoned: bool,
}

impl MatchSession {
    #[must_use]
    pub fn new() -> Self {
        Self {
            board: Board::new(),
            turn: Symbol::X,
            seats: [None, None],
            status: MatchStatus::Waiting,
            winner: None,
            winning_line: None,
            abandoned: false,
        }
    }

    #[must_use]
    pub fn status(&self) -> MatchStatus {
        self.status
    }

    /// Symbol held by a connection, if it occupies a seat.
    #[must_use]
    pub fn symbol_of(&self, connection_id: Uuid) -> Option<Symbol> {
        self.seats
            .iter()
            .position(|seat| *seat == Some(connection_id))
            .map(|i| SEAT_SYMBOLS[i])
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.seats.iter().filter(|s| s.is_some()).count()
    }

    /// Whether the registry may pair a fresh connection into this session.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status == MatchStatus::Waiting && self.player_count() == 1
    }

    /// Current observable state.
    #[must_use]
    pub fn snapshot(&self) -> MatchSnapshot {
        MatchSnapshot {
            board: self.board,
            turn: self.turn,
            status: self.status,
            winner: self.winner,
            winning_line: self.winning_line,
        }
    }

    /// Seat a connection. The first vacant seat in order decides the symbol,
    /// so the first joiner takes X and a re-filled vacancy restores the
    /// original symbol split.
    ///
    /// # Errors
    ///
    /// Returns `RoomFull` when both seats are taken.
    pub fn join(&mut self, connection_id: Uuid) -> Result<Symbol, SessionError> {
        let Some(seat) = self.seats.iter().position(Option::is_none) else {
            return Err(SessionError::RoomFull);
        };
        self.seats[seat] = Some(connection_id);
        self.abandoned = false;
        if self.status == MatchStatus::Waiting && self.player_count() == 2 {
            self.status = MatchStatus::InProgress;
        }
        Ok(SEAT_SYMBOLS[seat])
    }

    /// Apply one move for the connection's symbol.
    ///
    /// # Errors
    ///
    /// Rejects with `UnknownConnection`, `GameOver`, `OpponentLeft` /
    /// `NotStarted` (no second player), `NotYourTurn`, or `InvalidMove`.
    /// The board and turn pointer are untouched on every rejection.
    pub fn play(&mut self, connection_id: Uuid, index: usize) -> Result<MatchSnapshot, SessionError> {
        let symbol = self
            .symbol_of(connection_id)
            .ok_or(SessionError::UnknownConnection)?;

        match self.status {
            MatchStatus::Won | MatchStatus::Draw => return Err(SessionError::GameOver),
            MatchStatus::Waiting if self.abandoned => return Err(SessionError::OpponentLeft),
            MatchStatus::Waiting => return Err(SessionError::NotStarted),
            MatchStatus::InProgress => {}
        }
        if symbol != self.turn {
            return Err(SessionError::NotYourTurn);
        }

        self.board.place(index, symbol)?;
        match self.board.evaluate() {
            Verdict::Won { symbol, line } => {
                self.status = MatchStatus::Won;
                self.winner = Some(symbol);
                self.winning_line = Some(line);
            }
            Verdict::Draw => self.status = MatchStatus::Draw,
            Verdict::None => {}
        }
        self.turn = self.turn.opponent();
        Ok(self.snapshot())
    }

    /// Start a fresh round on the same seats. X moves first again.
    ///
    /// # Errors
    ///
    /// Returns `MatchActive` unless the match has finished, and
    /// `UnknownConnection` for a connection outside the room. Either seated
    /// player may reset.
    pub fn reset(&mut self, connection_id: Uuid) -> Result<MatchSnapshot, SessionError> {
        if self.symbol_of(connection_id).is_none() {
            return Err(SessionError::UnknownConnection);
        }
        if !self.status.is_finished() {
            return Err(SessionError::MatchActive);
        }

        self.board.clear();
        self.turn = Symbol::X;
        self.winner = None;
        self.winning_line = None;
        self.abandoned = false;
        self.status = if self.player_count() == 2 {
            MatchStatus::InProgress
        } else {
            MatchStatus::Waiting
        };
        Ok(self.snapshot())
    }

    /// Vacate the connection's seat. Returns `true` when this abandoned a
    /// running match, in which case the board is cleared, the session drops
    /// back to Waiting, and the remaining player should be told. A leave
    /// after the match finished keeps the final board visible so the
    /// remaining player can still reset.
    pub fn leave(&mut self, connection_id: Uuid) -> bool {
        let Some(seat) = self
            .seats
            .iter()
            .position(|seat| *seat == Some(connection_id))
        else {
            return false;
        };
        self.seats[seat] = None;

        if self.status == MatchStatus::InProgress {
            self.board.clear();
            self.turn = Symbol::X;
            self.winner = None;
            self.winning_line = None;
            self.status = MatchStatus::Waiting;
            self.abandoned = true;
            return true;
        }
        false
    }
}

impl Default for MatchSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
