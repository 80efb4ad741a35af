//! Protocol Messages
//!
//! Wire format for client-server communication over WebSocket.
//! All messages are serialized as JSON for debugging ease,
//! with optional binary (bincode) for production.
//!
//! Every inbound and outbound event is a closed tagged enum, exhaustively
//! matched by the server; adding an event kind is a compile-time-checked
//! change.

use serde::{Deserialize, Serialize};

use crate::game::board::ShipKind;
use crate::network::session::{Phase, PlayerId, SessionId};

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Join matchmaking under a display name.
    Join {
        /// Display name, must be non-empty after trimming.
        name: String,
    },

    /// Submit a fleet layout and mark this player ready.
    /// Rows of optional ship tags; must decode to a 10x10 grid.
    Ready {
        /// The submitted grid, row-major.
        board: Vec<Vec<Option<ShipKind>>>,
    },

    /// Fire at a coordinate on the opponent's board.
    Fire {
        /// Target row in `[0, 10)`.
        row: u8,
        /// Target column in `[0, 10)`.
        col: u8,
    },

    /// Request a rematch after game over.
    Reset,

    /// Liveness query: current session and player counts.
    Status,
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Identifier assignment, sent only to the newly joined player.
    Welcome {
        /// Server-generated player identifier.
        player_id: PlayerId,
        /// The session this player was assigned to.
        session_id: SessionId,
    },

    /// Names of all players in the session, in join order. Sent to
    /// everyone in the session whenever membership changes.
    Roster {
        /// Display names, join order.
        players: Vec<String>,
    },

    /// Sent to a lone first joiner while the session waits for an opponent.
    Waiting {
        /// Human-readable status line.
        message: String,
    },

    /// Both boards validated; the game begins.
    GameStart {
        /// The player authorized to fire first (the first joiner).
        current_turn: PlayerId,
    },

    /// The attacker's view of their own shot. Reveals the struck unit's
    /// identity on every hit, not just on sink.
    ShotResult {
        /// Target row.
        row: u8,
        /// Target column.
        col: u8,
        /// Whether a fleet unit was struck.
        hit: bool,
        /// The struck unit, present iff `hit`.
        ship: Option<ShipKind>,
    },

    /// The defender's mirrored view of an incoming shot. Never carries
    /// the unit identity.
    IncomingShot {
        /// Target row.
        row: u8,
        /// Target column.
        col: u8,
        /// Whether a fleet unit was struck.
        hit: bool,
    },

    /// Phase and turn pointer after each accepted shot.
    TurnUpdate {
        /// Current session phase.
        phase: Phase,
        /// Player authorized to fire, present iff playing.
        current_turn: Option<PlayerId>,
    },

    /// The game ended; broadcast to both players.
    GameOver {
        /// The attacker whose shot destroyed the enemy fleet.
        winner: PlayerId,
    },

    /// Boards, ledgers, and readiness were cleared; session is placing again.
    ResetComplete,

    /// The other player disconnected; this session is being discarded.
    OpponentLeft {
        /// Remaining display names.
        players: Vec<String>,
    },

    /// Error report, sent only to the connection that caused it.
    Error(ServerError),

    /// Liveness reply.
    Status {
        /// Active session count.
        sessions: usize,
        /// Players currently assigned to sessions.
        players: usize,
    },
}

/// Server error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerError {
    /// Error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
}

/// Error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Display name empty or unusable.
    InvalidName,
    /// Selected session already has two players.
    RoomFull,
    /// Connection already joined a session.
    AlreadyInSession,
    /// Operation requires having joined a session first.
    NotInSession,
    /// Submitted board failed fleet validation.
    InvalidBoard,
    /// Shot rejected: wrong phase, out of turn, out of bounds, or
    /// already-targeted coordinate.
    IllegalShot,
    /// Reset is only available after game over.
    IllegalReset,
    /// Inbound payload could not be decoded.
    InvalidMessage,
}

// =============================================================================
// SERIALIZATION HELPERS
// =============================================================================

impl ClientMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Serialize to binary.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Deserialize from binary.
    pub fn from_bytes(data: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(data)
    }
}

impl ServerMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}
