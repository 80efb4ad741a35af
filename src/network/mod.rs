//! Network Layer
//!
//! WebSocket server for real-time two-player sessions. All rule
//! enforcement lives in `game/`; this layer owns connections, sessions,
//! matchmaking, and the wire protocol.

pub mod protocol;
pub mod server;
pub mod session;

pub use protocol::{ClientMessage, ErrorCode, ServerError, ServerMessage};
pub use server::{GameServer, GameServerError, ServerConfig};
pub use session::{
    GameSession, Phase, PlayerId, SessionError, SessionId, SessionRegistry, MAX_PLAYERS,
};
