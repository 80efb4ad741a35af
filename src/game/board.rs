//! Board Model
//!
//! Typed 10x10 grid for one player's fleet. Each cell is a sum type
//! (`Empty` or `Ship(kind)`), so there is no sentinel value for "no ship".
//! Placement helpers only check geometry; fleet composition rules live in
//! `game::fleet`.

use serde::{Deserialize, Serialize};

/// Board side length. All coordinates are in `[0, BOARD_SIZE)` on both axes.
pub const BOARD_SIZE: usize = 10;

// =============================================================================
// SHIP KINDS
// =============================================================================

/// The five fleet unit kinds, each with a fixed contiguous cell length.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ShipKind {
    /// Length 5.
    Carrier = 0,
    /// Length 4.
    Battleship = 1,
    /// Length 3.
    Cruiser = 2,
    /// Length 3.
    Submarine = 3,
    /// Length 2.
    Destroyer = 4,
}

impl ShipKind {
    /// Number of contiguous cells this unit occupies.
    #[inline]
    pub const fn length(self) -> usize {
        match self {
            ShipKind::Carrier => 5,
            ShipKind::Battleship => 4,
            ShipKind::Cruiser => 3,
            ShipKind::Submarine => 3,
            ShipKind::Destroyer => 2,
        }
    }
}

/// The complete fleet every player must place, one unit per kind.
pub const FLEET: [ShipKind; 5] = [
    ShipKind::Carrier,
    ShipKind::Battleship,
    ShipKind::Cruiser,
    ShipKind::Submarine,
    ShipKind::Destroyer,
];

// =============================================================================
// COORDINATES
// =============================================================================

/// A board coordinate (row, column).
///
/// Implements `Ord` so coordinates can key a `BTreeSet` with deterministic
/// iteration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Coord {
    /// Row index.
    pub row: u8,
    /// Column index.
    pub col: u8,
}

impl Coord {
    /// Create a coordinate. Bounds are checked at the point of use.
    pub const fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }

    /// True iff both axes are within `[0, BOARD_SIZE)`.
    #[inline]
    pub const fn in_bounds(self) -> bool {
        (self.row as usize) < BOARD_SIZE && (self.col as usize) < BOARD_SIZE
    }
}

/// Orientation of a placement run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Run extends along increasing column.
    Horizontal,
    /// Run extends along increasing row.
    Vertical,
}

impl Orientation {
    /// The `(row, col)` of step `i` along a run starting at `origin`.
    /// May exceed board bounds; callers check.
    #[inline]
    fn step(self, origin: Coord, i: usize) -> (usize, usize) {
        match self {
            Orientation::Horizontal => (origin.row as usize, origin.col as usize + i),
            Orientation::Vertical => (origin.row as usize + i, origin.col as usize),
        }
    }
}

// =============================================================================
// CELLS AND BOARD
// =============================================================================

/// One board cell: empty water or part of a fleet unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Cell {
    /// No ship occupies this cell.
    #[default]
    Empty,
    /// Part of the given fleet unit.
    Ship(ShipKind),
}

impl Cell {
    /// True iff no ship occupies this cell.
    #[inline]
    pub fn is_empty(self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// The occupying ship kind, if any.
    #[inline]
    pub fn ship(self) -> Option<ShipKind> {
        match self {
            Cell::Empty => None,
            Cell::Ship(kind) => Some(kind),
        }
    }
}

/// One player's 10x10 fleet board.
///
/// Within a session the board is owned exclusively by its player and replaced
/// wholesale when the player submits readiness.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Board {
    cells: [[Cell; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    /// Create an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// The occupant of `coord`, or `Cell::Empty`.
    ///
    /// Out-of-bounds coordinates read as empty; fire paths bounds-check
    /// before querying.
    #[inline]
    pub fn occupant(&self, coord: Coord) -> Cell {
        if coord.in_bounds() {
            self.cells[coord.row as usize][coord.col as usize]
        } else {
            Cell::Empty
        }
    }

    /// True iff every cell of a run of `length` cells starting at `origin`
    /// in `orientation` lies in bounds and is currently empty.
    pub fn can_place(&self, origin: Coord, length: usize, orientation: Orientation) -> bool {
        for i in 0..length {
            let (row, col) = orientation.step(origin, i);
            if row >= BOARD_SIZE || col >= BOARD_SIZE {
                return false;
            }
            if !self.cells[row][col].is_empty() {
                return false;
            }
        }
        true
    }

    /// Tag the run for `kind` starting at `origin`. The caller must have
    /// validated the placement with [`Board::can_place`]; a second call over
    /// the same cells overwrites.
    pub fn place(&mut self, origin: Coord, kind: ShipKind, orientation: Orientation) {
        for i in 0..kind.length() {
            let (row, col) = orientation.step(origin, i);
            self.cells[row][col] = Cell::Ship(kind);
        }
    }

    /// Set a single cell directly. Used when decoding a submitted grid;
    /// `coord` must be in bounds.
    pub(crate) fn set(&mut self, coord: Coord, cell: Cell) {
        self.cells[coord.row as usize][coord.col as usize] = cell;
    }

    /// Iterate every occupied cell with its ship kind, row-major.
    pub fn occupied(&self) -> impl Iterator<Item = (Coord, ShipKind)> + '_ {
        self.cells.iter().enumerate().flat_map(|(row, cells)| {
            cells.iter().enumerate().filter_map(move |(col, cell)| {
                cell.ship()
                    .map(|kind| (Coord::new(row as u8, col as u8), kind))
            })
        })
    }

    /// Number of occupied cells.
    pub fn ship_cell_count(&self) -> usize {
        self.occupied().count()
    }
}
