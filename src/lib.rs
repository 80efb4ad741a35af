//! # Broadside Server
//!
//! Authoritative session server for real-time two-player battleship.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    BROADSIDE SERVER                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  game/           - Game rules (pure, synchronous)            │
//! │  ├── board.rs    - 10x10 grid, ship kinds, placement         │
//! │  ├── fleet.rs    - Fleet composition validation              │
//! │  └── shots.rs    - Shot ledger and win detection             │
//! │                                                              │
//! │  network/        - Networking (async)                        │
//! │  ├── server.rs   - WebSocket server, connection supervisor   │
//! │  ├── protocol.rs - Message types                             │
//! │  └── session.rs  - Session state machine and registry        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Authority Model
//!
//! The server is the single source of truth. Clients submit intents
//! (join, ready, fire, reset); every rule check runs here:
//! - Fleet layouts are validated server-side before a game can start
//! - Shots are checked for phase, turn, bounds, and duplicates
//! - Win detection derives only from server-held boards and ledgers
//!
//! Sessions are isolated: each lives behind its own lock, so a slow or
//! failing session never blocks another.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod game;
pub mod network;

// Re-export commonly used types
pub use game::board::{Board, Cell, Coord, Orientation, ShipKind, BOARD_SIZE, FLEET};
pub use game::fleet::{validate_submission, PlacementError};
pub use game::shots::{all_ships_sunk, ShotLedger};
pub use network::server::{GameServer, ServerConfig};
pub use network::session::{GameSession, Phase, PlayerId, SessionId, SessionRegistry};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
