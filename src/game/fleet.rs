//! Fleet Placement Validator
//!
//! Checks a client-submitted board against the fleet composition rules
//! before a session accepts it as canonical: every kind in [`FLEET`]
//! present at exactly its length, each a single straight contiguous run.
//! Runs once, at readiness submission; a rejected board keeps the player
//! in the placing phase.

use std::collections::BTreeMap;

use crate::game::board::{Board, Cell, Coord, ShipKind, BOARD_SIZE, FLEET};

/// Why a submitted board was rejected.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PlacementError {
    /// Submitted grid is not 10 rows of 10 cells.
    #[error("board must be a {BOARD_SIZE}x{BOARD_SIZE} grid")]
    WrongShape,

    /// A fleet unit occupies the wrong number of cells. `found == 0` means
    /// the unit is missing entirely; an overlap between two units also
    /// surfaces here, since the shared cell can only carry one tag.
    #[error("{kind:?} must occupy exactly {expected} cells, found {found}")]
    WrongSize {
        /// The offending unit.
        kind: ShipKind,
        /// Required cell count.
        expected: usize,
        /// Cells actually tagged with this unit.
        found: usize,
    },

    /// A unit's cells do not form one straight contiguous run.
    #[error("{kind:?} cells are not a single straight contiguous run")]
    NotContiguous {
        /// The offending unit.
        kind: ShipKind,
    },
}

/// Build a [`Board`] from the wire representation of a submitted grid
/// (rows of optional ship tags), rejecting anything that is not 10x10.
pub fn board_from_rows(rows: &[Vec<Option<ShipKind>>]) -> Result<Board, PlacementError> {
    if rows.len() != BOARD_SIZE || rows.iter().any(|r| r.len() != BOARD_SIZE) {
        return Err(PlacementError::WrongShape);
    }

    let mut board = Board::new();
    for (row, cells) in rows.iter().enumerate() {
        for (col, cell) in cells.iter().enumerate() {
            if let Some(kind) = cell {
                board.set(Coord::new(row as u8, col as u8), Cell::Ship(*kind));
            }
        }
    }
    Ok(board)
}

/// Validate fleet composition on an already-shaped board.
pub fn validate_fleet(board: &Board) -> Result<(), PlacementError> {
    let mut cells_by_kind: BTreeMap<ShipKind, Vec<Coord>> = BTreeMap::new();
    for (coord, kind) in board.occupied() {
        cells_by_kind.entry(kind).or_default().push(coord);
    }

    for kind in FLEET {
        let cells = cells_by_kind.remove(&kind).unwrap_or_default();
        if cells.len() != kind.length() {
            return Err(PlacementError::WrongSize {
                kind,
                expected: kind.length(),
                found: cells.len(),
            });
        }
        if !is_straight_run(&cells) {
            return Err(PlacementError::NotContiguous { kind });
        }
    }

    Ok(())
}

/// Decode and validate a submitted grid in one step. This is the only entry
/// point the session uses when a player readies up.
pub fn validate_submission(rows: &[Vec<Option<ShipKind>>]) -> Result<Board, PlacementError> {
    let board = board_from_rows(rows)?;
    validate_fleet(&board)?;
    Ok(board)
}

/// True iff `cells` (in row-major order, len >= 1) form one straight
/// contiguous horizontal or vertical run.
fn is_straight_run(cells: &[Coord]) -> bool {
    let first = cells[0];

    if cells.iter().all(|c| c.row == first.row) {
        // Horizontal: columns must be consecutive. Row-major iteration
        // already yields them sorted.
        cells
            .windows(2)
            .all(|pair| pair[1].col == pair[0].col + 1)
    } else if cells.iter().all(|c| c.col == first.col) {
        cells
            .windows(2)
            .all(|pair| pair[1].row == pair[0].row + 1)
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::board::Orientation;

    /// A known-good layout: every fleet unit in a straight run, no overlaps.
    fn valid_board() -> Board {
        let mut board = Board::new();
        board.place(Coord::new(0, 0), ShipKind::Carrier, Orientation::Horizontal);
        board.place(Coord::new(2, 0), ShipKind::Battleship, Orientation::Horizontal);
        board.place(Coord::new(4, 0), ShipKind::Cruiser, Orientation::Horizontal);
        board.place(Coord::new(6, 0), ShipKind::Submarine, Orientation::Vertical);
        board.place(Coord::new(6, 2), ShipKind::Destroyer, Orientation::Vertical);
        board
    }

    fn to_rows(board: &Board) -> Vec<Vec<Option<ShipKind>>> {
        (0..BOARD_SIZE as u8)
            .map(|row| {
                (0..BOARD_SIZE as u8)
                    .map(|col| board.occupant(Coord::new(row, col)).ship())
                    .collect()
            })
            .collect()
    }

    #[test]
    fn accepts_complete_fleet() {
        assert_eq!(validate_fleet(&valid_board()), Ok(()));
    }

    #[test]
    fn accepts_round_tripped_submission() {
        let rows = to_rows(&valid_board());
        let board = validate_submission(&rows).unwrap();
        assert_eq!(board, valid_board());
    }

    #[test]
    fn rejects_missing_ship() {
        let mut board = Board::new();
        board.place(Coord::new(0, 0), ShipKind::Carrier, Orientation::Horizontal);
        board.place(Coord::new(2, 0), ShipKind::Battleship, Orientation::Horizontal);
        board.place(Coord::new(4, 0), ShipKind::Cruiser, Orientation::Horizontal);
        board.place(Coord::new(6, 0), ShipKind::Submarine, Orientation::Vertical);
        // No destroyer.

        assert_eq!(
            validate_fleet(&board),
            Err(PlacementError::WrongSize {
                kind: ShipKind::Destroyer,
                expected: 2,
                found: 0,
            })
        );
    }

    #[test]
    fn rejects_wrong_size_ship() {
        let mut board = valid_board();
        // Grow the destroyer past its length.
        board.place(Coord::new(6, 3), ShipKind::Destroyer, Orientation::Vertical);

        let err = validate_fleet(&board).unwrap_err();
        assert!(matches!(
            err,
            PlacementError::WrongSize {
                kind: ShipKind::Destroyer,
                found: 4,
                ..
            }
        ));
    }

    #[test]
    fn rejects_overlap_as_wrong_size() {
        let mut board = valid_board();
        // Overwrite one carrier cell with the destroyer tag: the carrier
        // loses a cell, exactly what a client-side overlap looks like.
        board.place(Coord::new(0, 4), ShipKind::Destroyer, Orientation::Horizontal);

        let err = validate_fleet(&board).unwrap_err();
        assert!(matches!(
            err,
            PlacementError::WrongSize {
                kind: ShipKind::Carrier,
                expected: 5,
                found: 4,
            }
        ));
    }

    #[test]
    fn rejects_bent_run() {
        let mut board = Board::new();
        board.place(Coord::new(0, 0), ShipKind::Carrier, Orientation::Horizontal);
        board.place(Coord::new(2, 0), ShipKind::Battleship, Orientation::Horizontal);
        board.place(Coord::new(4, 0), ShipKind::Cruiser, Orientation::Horizontal);
        board.place(Coord::new(6, 0), ShipKind::Submarine, Orientation::Vertical);
        // A diagonal "destroyer": two cells not in one line.
        board.place(Coord::new(6, 2), ShipKind::Destroyer, Orientation::Horizontal);
        let mut cells: Vec<Vec<Option<ShipKind>>> = to_rows(&board);
        cells[6][3] = None;
        cells[7][3] = Some(ShipKind::Destroyer);

        assert_eq!(
            validate_submission(&cells),
            Err(PlacementError::NotContiguous {
                kind: ShipKind::Destroyer
            })
        );
    }

    #[test]
    fn rejects_split_run() {
        let mut rows = to_rows(&valid_board());
        // Move one carrier cell away from the run, keeping count at 5.
        rows[0][4] = None;
        rows[9][9] = Some(ShipKind::Carrier);

        assert_eq!(
            validate_submission(&rows),
            Err(PlacementError::NotContiguous {
                kind: ShipKind::Carrier
            })
        );
    }

    #[test]
    fn rejects_malformed_grid() {
        let rows: Vec<Vec<Option<ShipKind>>> = vec![vec![None; BOARD_SIZE]; 9];
        assert_eq!(validate_submission(&rows), Err(PlacementError::WrongShape));

        let mut ragged: Vec<Vec<Option<ShipKind>>> = vec![vec![None; BOARD_SIZE]; BOARD_SIZE];
        ragged[3] = vec![None; 7];
        assert_eq!(validate_submission(&ragged), Err(PlacementError::WrongShape));
    }

    #[test]
    fn rejects_empty_board() {
        assert_eq!(
            validate_fleet(&Board::new()),
            Err(PlacementError::WrongSize {
                kind: ShipKind::Carrier,
                expected: 5,
                found: 0,
            })
        );
    }
}
