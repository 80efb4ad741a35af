//! Game Logic Module
//!
//! Pure, synchronous battleship rules. No I/O, no locking; the session
//! layer in `network` drives these types under its own serialization.
//!
//! ## Module Structure
//!
//! - `board`: typed 10x10 grid, ship kinds, placement geometry
//! - `fleet`: fleet composition validation at readiness submission
//! - `shots`: per-defender shot ledger and win detection

pub mod board;
pub mod fleet;
pub mod shots;

// Re-export key types
pub use board::{Board, Cell, Coord, Orientation, ShipKind, BOARD_SIZE, FLEET};
pub use fleet::{validate_fleet, validate_submission, PlacementError};
pub use shots::{all_ships_sunk, ShotError, ShotLedger};
