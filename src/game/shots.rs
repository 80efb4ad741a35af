//! Shot Ledger
//!
//! Per-defender record of previously targeted coordinates. The ledger grows
//! monotonically by confirmed shots and is cleared only on a full session
//! reset. Win detection derives from it: the fleet is destroyed once every
//! occupied cell of the defender's board appears in the ledger.

use std::collections::BTreeSet;

use crate::game::board::{Board, Cell, Coord};

/// Recording a shot failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ShotError {
    /// The coordinate has already been targeted against this defender.
    #[error("coordinate already targeted")]
    Duplicate,
}

/// The set of coordinates already targeted against one player's board.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShotLedger {
    shots: BTreeSet<Coord>,
}

impl ShotLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a shot at `coord` against `board`. Fails without mutation if
    /// the coordinate was already targeted; otherwise inserts exactly one
    /// entry and returns the defender's occupant at that cell (empty =
    /// miss, ship = hit).
    pub fn record(&mut self, coord: Coord, board: &Board) -> Result<Cell, ShotError> {
        if !self.shots.insert(coord) {
            return Err(ShotError::Duplicate);
        }
        Ok(board.occupant(coord))
    }

    /// True iff `coord` has already been targeted.
    pub fn contains(&self, coord: Coord) -> bool {
        self.shots.contains(&coord)
    }

    /// Number of recorded shots.
    pub fn len(&self) -> usize {
        self.shots.len()
    }

    /// True iff no shot has been recorded.
    pub fn is_empty(&self) -> bool {
        self.shots.is_empty()
    }

    /// Forget every shot. Only the session reset path calls this.
    pub fn clear(&mut self) {
        self.shots.clear();
    }
}

/// True iff every occupied cell of `board` has been hit, i.e. the ledger is
/// a superset of the board's occupied coordinates.
///
/// This is the sole win-detection algorithm. It is O(board) per call and is
/// recomputed after every confirmed hit rather than cached, since it depends
/// on ledger growth.
pub fn all_ships_sunk(board: &Board, ledger: &ShotLedger) -> bool {
    board.occupied().all(|(coord, _)| ledger.contains(coord))
}
