//! Board model — 3×3 grid, move validation, win/draw evaluation.
//!
//! DESIGN
//! ======
//! The board is a flat array of 9 cells, row-major. A cell is `Option<Symbol>`
//! so the wire representation falls out of serde for free: `"X"`, `"O"`, or
//! `null`. Evaluation walks the 8 canonical triples in a fixed order (rows,
//! columns, diagonals) so the reported line is deterministic even on boards
//! that could never arise from a legal move sequence.

use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// SYMBOL
// =============================================================================

/// The X or O marker assigned to a player for the duration of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symbol {
    X,
    O,
}

impl Symbol {
    /// The other player's symbol.
    #[must_use]
    pub fn opponent(self) -> Self {
        match self {
            Symbol::X => Symbol::O,
            Symbol::O => Symbol::X,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::X => f.write_str("X"),
            Symbol::O => f.write_str("O"),
        }
    }
}

// =============================================================================
// TYPES
// =============================================================================

/// One grid position: empty or claimed by a symbol.
pub type Cell = Option<Symbol>;

/// The 8 canonical winning triples: 3 rows, 3 columns, 2 diagonals.
/// Evaluation order is fixed by this table.
pub const WIN_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// Rejection for a move that never touches the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvalidMove {
    #[error("cell index {0} is out of range")]
    OutOfRange(usize),
    #[error("cell {0} is already occupied")]
    Occupied(usize),
}

/// Result of evaluating a board for game end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// No winner yet and at least one empty cell.
    None,
    /// Three equal symbols on one canonical triple.
    Won { symbol: Symbol, line: [usize; 3] },
    /// All 9 cells occupied with no complete triple.
    Draw,
}

// =============================================================================
// BOARD
// =============================================================================

/// Fixed 3×3 grid, indexed 0–8 row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Board([Cell; 9]);

impl Board {
    /// An empty board.
    #[must_use]
    pub fn new() -> Self {
        Self([None; 9])
    }

    #[must_use]
    pub fn cells(&self) -> &[Cell; 9] {
        &self.0
    }

    /// Number of occupied cells. Equals the number of completed moves
    /// in any legal sequence.
    #[must_use]
    pub fn occupied(&self) -> usize {
        self.0.iter().filter(|c| c.is_some()).count()
    }

    /// Claim a cell for `symbol`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidMove` when the index is out of range or the cell is
    /// already occupied. The board is untouched on error.
    pub fn place(&mut self, index: usize, symbol: Symbol) -> Result<(), InvalidMove> {
        let Some(cell) = self.0.get_mut(index) else {
            return Err(InvalidMove::OutOfRange(index));
        };
        if cell.is_some() {
            return Err(InvalidMove::Occupied(index));
        }
        *cell = Some(symbol);
        Ok(())
    }

    /// Check the board for a completed game.
    #[must_use]
    pub fn evaluate(&self) -> Verdict {
        for line in WIN_LINES {
            let [a, b, c] = line;
            if let Some(symbol) = self.0[a] {
                if self.0[b] == Some(symbol) && self.0[c] == Some(symbol) {
                    return Verdict::Won { symbol, line };
                }
            }
        }
        if self.0.iter().all(Option::is_some) {
            Verdict::Draw
        } else {
            Verdict::None
        }
    }

    /// Return every cell to empty.
    pub fn clear(&mut self) {
        self.0 = [None; 9];
    }
}

#[cfg(test)]
#[path = "board_test.rs"]
mod tests;
