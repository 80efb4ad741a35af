//! Game Session Management
//!
//! The authoritative per-room engine and the process-wide registry that
//! assigns players to rooms. A `GameSession` owns the only trusted copy of
//! both players' boards and shot ledgers, the turn pointer, and the phase;
//! everything a client claims about its own state is ignored.
//!
//! All mutating operations on one session are serialized by the session's
//! `RwLock`; distinct sessions share no lock and proceed in parallel.

use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info};

use crate::game::board::{Board, Coord, ShipKind};
use crate::game::fleet::{self, PlacementError};
use crate::game::shots::{all_ships_sunk, ShotError, ShotLedger};
use crate::network::protocol::ServerMessage;

/// Unique session identifier.
pub type SessionId = [u8; 16];

/// Maximum players per session.
pub const MAX_PLAYERS: usize = 2;

// =============================================================================
// PLAYER ID
// =============================================================================

/// Unique player identifier (UUID as bytes), valid for the connection
/// lifetime.
///
/// Implements Ord for deterministic BTreeMap ordering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct PlayerId(pub [u8; 16]);

impl PlayerId {
    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().into_bytes())
    }

    /// Convert to UUID string for logging.
    pub fn to_uuid_string(&self) -> String {
        uuid::Uuid::from_bytes(self.0).to_string()
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

// =============================================================================
// SESSION STATE
// =============================================================================

/// Session lifecycle phase. Transitions are monotonic except for the
/// explicit reset, which returns a finished game to `Placing`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Zero or one player joined.
    Waiting,
    /// Both players present, submitting boards.
    Placing,
    /// Alternating turns.
    Playing,
    /// Terminal until an explicit reset.
    GameOver,
}

/// Per-player readiness within the placing phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadyState {
    /// Still placing; board not yet accepted.
    Placing,
    /// Board validated and canonical.
    Ready,
}

/// A player within a session: canonical board, the ledger of shots taken
/// against that board, and the outbound channel to the player's connection.
#[derive(Debug)]
pub struct SessionPlayer {
    /// Player identifier.
    pub id: PlayerId,
    /// Client-supplied display name.
    pub name: String,
    /// Readiness phase.
    pub ready: ReadyState,
    /// Canonical fleet board. Replaced wholesale on readiness.
    pub board: Board,
    /// Shots already taken against this player's board.
    pub ledger: ShotLedger,
    /// Message channel to this player. Sends to a closed channel are
    /// dropped, never awaited indefinitely.
    pub sender: mpsc::Sender<ServerMessage>,
}

/// Session errors: every rule violation a client can trigger. The session
/// state is unchanged whenever one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// Session already has two players.
    #[error("room is full")]
    RoomFull,

    /// Display name is empty.
    #[error("display name must not be empty")]
    InvalidName,

    /// The player is not a member of this session.
    #[error("player not in session")]
    PlayerNotFound,

    /// Submitted board failed fleet validation.
    #[error("board rejected: {0}")]
    InvalidBoard(#[from] PlacementError),

    /// Board submitted outside the placing phase.
    #[error("boards can only be submitted during placement")]
    NotPlacing,

    /// Shot fired outside the playing phase.
    #[error("game is not in progress")]
    NotPlaying,

    /// Shot fired by the player not holding the turn.
    #[error("not your turn")]
    OutOfTurn,

    /// Shot target outside the 10x10 grid.
    #[error("shot is out of bounds")]
    OutOfBounds,

    /// Coordinate already targeted against this opponent.
    #[error("coordinate already targeted")]
    AlreadyTargeted,

    /// Reset requested before the game ended.
    #[error("reset is only valid after game over")]
    ResetUnavailable,
}

/// Result of one accepted shot: everything the server needs to frame the
/// attacker's view, the defender's view, and the turn broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShotOutcome {
    /// Target coordinate.
    pub coord: Coord,
    /// Whether a fleet unit was struck.
    pub hit: bool,
    /// The struck unit, present iff `hit`.
    pub ship: Option<ShipKind>,
    /// The defending player.
    pub defender: PlayerId,
    /// The winner, present iff this shot destroyed the last fleet cell.
    pub winner: Option<PlayerId>,
    /// Phase after the shot.
    pub phase: Phase,
    /// Turn pointer after the shot.
    pub current_turn: Option<PlayerId>,
}

/// One isolated two-player game instance.
#[derive(Debug)]
pub struct GameSession {
    /// Unique session identifier.
    pub id: SessionId,
    phase: Phase,
    /// Join order = turn order; index 0 fires first.
    players: Vec<SessionPlayer>,
    /// Valid only while `Playing`.
    current_turn: Option<PlayerId>,
}

impl GameSession {
    /// Create an empty session in the waiting phase.
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            phase: Phase::Waiting,
            players: Vec::with_capacity(MAX_PLAYERS),
            current_turn: None,
        }
    }

    /// Add a player. The second join moves the session to `Placing`.
    pub fn add_player(
        &mut self,
        name: &str,
        sender: mpsc::Sender<ServerMessage>,
    ) -> Result<PlayerId, SessionError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SessionError::InvalidName);
        }
        if self.players.len() >= MAX_PLAYERS {
            return Err(SessionError::RoomFull);
        }

        let id = PlayerId::generate();
        self.players.push(SessionPlayer {
            id,
            name: name.to_string(),
            ready: ReadyState::Placing,
            board: Board::new(),
            ledger: ShotLedger::new(),
            sender,
        });

        if self.players.len() == MAX_PLAYERS {
            self.phase = Phase::Placing;
        }

        debug!(
            player = %id.to_uuid_string(),
            players = self.players.len(),
            "player joined session"
        );
        Ok(id)
    }

    /// Remove a player. The caller (registry) is responsible for notifying
    /// the survivor and discarding the session afterwards.
    pub fn remove_player(&mut self, player_id: &PlayerId) -> bool {
        let before = self.players.len();
        self.players.retain(|p| p.id != *player_id);
        self.players.len() != before
    }

    /// Accept a submitted grid for `player_id` and mark the player ready.
    /// Returns `true` if this submission started the game (both boards
    /// validated): phase becomes `Playing` and the turn pointer is set to
    /// the first-joined player.
    ///
    /// A rejected board leaves the player (and the session) unchanged.
    pub fn set_ready(
        &mut self,
        player_id: &PlayerId,
        rows: &[Vec<Option<ShipKind>>],
    ) -> Result<bool, SessionError> {
        if !matches!(self.phase, Phase::Waiting | Phase::Placing) {
            return Err(SessionError::NotPlacing);
        }

        // Validate before touching any state.
        let board = fleet::validate_submission(rows)?;

        let player = self
            .players
            .iter_mut()
            .find(|p| p.id == *player_id)
            .ok_or(SessionError::PlayerNotFound)?;
        player.board = board;
        player.ready = ReadyState::Ready;

        let all_ready = self.players.len() == MAX_PLAYERS
            && self.players.iter().all(|p| p.ready == ReadyState::Ready);

        if all_ready {
            self.phase = Phase::Playing;
            self.current_turn = Some(self.players[0].id);
            info!(session = %uuid::Uuid::from_bytes(self.id), "game started");
            return Ok(true);
        }

        Ok(false)
    }

    /// Resolve a shot from `attacker` at `coord`.
    ///
    /// Accepted only while `Playing`, from the turn holder, at an in-bounds
    /// coordinate unseen in the opponent's ledger. A rejected shot changes
    /// nothing; an accepted shot performs exactly one state mutation (the
    /// ledger insert plus the derived phase/turn update), never a partial
    /// one.
    pub fn fire(&mut self, attacker: PlayerId, coord: Coord) -> Result<ShotOutcome, SessionError> {
        if self.phase != Phase::Playing {
            return Err(SessionError::NotPlaying);
        }
        if self.current_turn != Some(attacker) {
            return Err(SessionError::OutOfTurn);
        }
        if !coord.in_bounds() {
            return Err(SessionError::OutOfBounds);
        }

        let defender_idx = self
            .players
            .iter()
            .position(|p| p.id != attacker)
            .ok_or(SessionError::PlayerNotFound)?;
        let defender = &mut self.players[defender_idx];
        let defender_id = defender.id;

        let cell = match defender.ledger.record(coord, &defender.board) {
            Ok(cell) => cell,
            Err(ShotError::Duplicate) => return Err(SessionError::AlreadyTargeted),
        };

        let ship = cell.ship();
        let hit = ship.is_some();

        // Win detection is recomputed from the ledger after every hit.
        let destroyed = hit && all_ships_sunk(&defender.board, &defender.ledger);

        let winner = if destroyed {
            self.phase = Phase::GameOver;
            // Turn pointer is deliberately not flipped on the winning shot.
            info!(
                session = %uuid::Uuid::from_bytes(self.id),
                winner = %attacker.to_uuid_string(),
                "fleet destroyed, game over"
            );
            Some(attacker)
        } else {
            self.current_turn = Some(defender_id);
            None
        };

        Ok(ShotOutcome {
            coord,
            hit,
            ship,
            defender: defender_id,
            winner,
            phase: self.phase,
            current_turn: self.current_turn,
        })
    }

    /// Rematch: clear both boards, both ledgers, and readiness, and return
    /// to `Placing` (both players are still connected, so no fresh join is
    /// required). Valid only in `GameOver`.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        if self.phase != Phase::GameOver {
            return Err(SessionError::ResetUnavailable);
        }

        for player in &mut self.players {
            player.board = Board::new();
            player.ledger.clear();
            player.ready = ReadyState::Placing;
        }
        self.current_turn = None;
        self.phase = Phase::Placing;
        info!(session = %uuid::Uuid::from_bytes(self.id), "session reset");
        Ok(())
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The player authorized to fire, while playing.
    pub fn current_turn(&self) -> Option<PlayerId> {
        self.current_turn
    }

    /// Number of joined players.
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// True iff no players remain.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// True iff `player_id` is a member.
    pub fn contains_player(&self, player_id: &PlayerId) -> bool {
        self.players.iter().any(|p| p.id == *player_id)
    }

    /// Identifiers of all members, join order.
    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.players.iter().map(|p| p.id).collect()
    }

    /// Display names of all members, join order.
    pub fn roster(&self) -> Vec<String> {
        self.players.iter().map(|p| p.name.clone()).collect()
    }

    /// True iff the session still accepts a join.
    pub fn is_open(&self) -> bool {
        self.phase == Phase::Waiting && self.players.len() < MAX_PLAYERS
    }

    /// Send a message to every member. Delivery to a closed connection is
    /// a dropped no-op.
    pub async fn broadcast(&self, message: ServerMessage) {
        for player in &self.players {
            let _ = player.sender.send(message.clone()).await;
        }
    }

    /// Send a message to a single member, if present.
    pub async fn send_to(&self, player_id: &PlayerId, message: ServerMessage) {
        if let Some(player) = self.players.iter().find(|p| p.id == *player_id) {
            let _ = player.sender.send(message).await;
        }
    }
}

// =============================================================================
// SESSION REGISTRY / MATCHMAKER
// =============================================================================

/// Process-wide registry of sessions and the player-to-session mapping.
/// Created once at startup and passed by `Arc` into the server; nothing is
/// persisted across restarts.
pub struct SessionRegistry {
    /// Active sessions. BTreeMap gives the matchmaker a deterministic
    /// scan order.
    sessions: RwLock<BTreeMap<SessionId, Arc<RwLock<GameSession>>>>,
    /// Player to session mapping.
    player_sessions: RwLock<BTreeMap<PlayerId, SessionId>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(BTreeMap::new()),
            player_sessions: RwLock::new(BTreeMap::new()),
        }
    }

    /// Assign a joining player to the first open session in scan order, or
    /// create a fresh one. Selection and insertion happen under the
    /// registry write lock, so two concurrent joins cannot both land as the
    /// "second join" of one session; a full selected session surfaces as
    /// [`SessionError::RoomFull`] and the loser retries with a fresh join.
    pub async fn join_or_create(
        &self,
        name: &str,
        sender: mpsc::Sender<ServerMessage>,
    ) -> Result<(SessionId, PlayerId, Arc<RwLock<GameSession>>), SessionError> {
        let mut sessions = self.sessions.write().await;

        let mut open = None;
        for (id, session) in sessions.iter() {
            if session.read().await.is_open() {
                open = Some((*id, session.clone()));
                break;
            }
        }

        let (session_id, session, created) = match open {
            Some((id, session)) => (id, session, false),
            None => {
                let id = uuid::Uuid::new_v4().into_bytes();
                let session = Arc::new(RwLock::new(GameSession::new(id)));
                sessions.insert(id, session.clone());
                (id, session, true)
            }
        };

        let player_id = match session.write().await.add_player(name, sender) {
            Ok(id) => id,
            Err(e) => {
                if created {
                    sessions.remove(&session_id);
                }
                return Err(e);
            }
        };

        drop(sessions);
        self.player_sessions
            .write()
            .await
            .insert(player_id, session_id);

        if created {
            info!(session = %uuid::Uuid::from_bytes(session_id), "session created");
        }
        Ok((session_id, player_id, session))
    }

    /// Remove a departing player. Ends the session unconditionally: any
    /// remaining participant is notified with `OpponentLeft` and unmapped,
    /// and the session is discarded. Returns the evicted session id, or
    /// `None` if the player was not mapped.
    pub async fn leave(&self, player_id: &PlayerId) -> Option<SessionId> {
        let session_id = self.player_sessions.write().await.remove(player_id)?;
        let session = self.sessions.write().await.remove(&session_id)?;

        let mut s = session.write().await;
        s.remove_player(player_id);

        if !s.is_empty() {
            let roster = s.roster();
            s.broadcast(ServerMessage::OpponentLeft { players: roster })
                .await;

            let mut mappings = self.player_sessions.write().await;
            for survivor in s.player_ids() {
                mappings.remove(&survivor);
            }
        }

        info!(
            session = %uuid::Uuid::from_bytes(session_id),
            player = %player_id.to_uuid_string(),
            "player left, session discarded"
        );
        Some(session_id)
    }

    /// Look up the session a player belongs to.
    pub async fn get_player_session(
        &self,
        player_id: &PlayerId,
    ) -> Option<Arc<RwLock<GameSession>>> {
        let session_id = *self.player_sessions.read().await.get(player_id)?;
        self.sessions.read().await.get(&session_id).cloned()
    }

    /// Active session count.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Players currently assigned to sessions.
    pub async fn player_count(&self) -> usize {
        self.player_sessions.read().await.len()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::board::{Orientation, BOARD_SIZE};

    fn channel() -> mpsc::Sender<ServerMessage> {
        // Receiver dropped: these tests drive the session directly and never
        // assert on delivery, and sends to closed channels are no-ops.
        mpsc::channel(64).0
    }

    /// A complete valid fleet as the wire-format grid.
    fn valid_rows() -> Vec<Vec<Option<ShipKind>>> {
        let mut board = Board::new();
        board.place(Coord::new(0, 0), ShipKind::Carrier, Orientation::Horizontal);
        board.place(Coord::new(2, 0), ShipKind::Battleship, Orientation::Horizontal);
        board.place(Coord::new(4, 0), ShipKind::Cruiser, Orientation::Horizontal);
        board.place(Coord::new(6, 0), ShipKind::Submarine, Orientation::Vertical);
        board.place(Coord::new(6, 2), ShipKind::Destroyer, Orientation::Vertical);
        to_rows(&board)
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

    /// Session with both players joined and ready, playing phase.
    fn playing_session() -> (GameSession, PlayerId, PlayerId) {
        let mut session = GameSession::new([0; 16]);
        let p1 = session.add_player("alice", channel()).unwrap();
        let p2 = session.add_player("bob", channel()).unwrap();
        assert!(!session.set_ready(&p1, &valid_rows()).unwrap());
        assert!(session.set_ready(&p2, &valid_rows()).unwrap());
        (session, p1, p2)
    }

    #[test]
    fn first_join_waits_second_join_places() {
        let mut session = GameSession::new([0; 16]);
        assert_eq!(session.phase(), Phase::Waiting);

        session.add_player("alice", channel()).unwrap();
        assert_eq!(session.phase(), Phase::Waiting);
        assert_eq!(session.player_count(), 1);

        session.add_player("bob", channel()).unwrap();
        assert_eq!(session.phase(), Phase::Placing);
        assert_eq!(session.roster(), vec!["alice", "bob"]);
    }

    #[test]
    fn third_join_is_rejected() {
        let mut session = GameSession::new([0; 16]);
        session.add_player("alice", channel()).unwrap();
        session.add_player("bob", channel()).unwrap();

        let result = session.add_player("carol", channel());
        assert_eq!(result, Err(SessionError::RoomFull));
        assert_eq!(session.player_count(), 2);
    }

    #[test]
    fn empty_name_is_rejected() {
        let mut session = GameSession::new([0; 16]);
        assert_eq!(
            session.add_player("   ", channel()),
            Err(SessionError::InvalidName)
        );
        assert!(session.is_empty());
    }

    #[test]
    fn game_starts_when_both_boards_validated() {
        let (session, p1, _) = playing_session();
        assert_eq!(session.phase(), Phase::Playing);
        assert_eq!(session.current_turn(), Some(p1));
    }

    #[test]
    fn invalid_board_keeps_player_placing() {
        let mut session = GameSession::new([0; 16]);
        let p1 = session.add_player("alice", channel()).unwrap();
        session.add_player("bob", channel()).unwrap();

        let empty = vec![vec![None; BOARD_SIZE]; BOARD_SIZE];
        let err = session.set_ready(&p1, &empty).unwrap_err();
        assert!(matches!(err, SessionError::InvalidBoard(_)));
        assert_eq!(session.phase(), Phase::Placing);
    }

    #[test]
    fn miss_flips_turn() {
        let (mut session, p1, p2) = playing_session();

        // (9, 9) is water in the valid layout.
        let outcome = session.fire(p1, Coord::new(9, 9)).unwrap();
        assert!(!outcome.hit);
        assert_eq!(outcome.winner, None);
        assert_eq!(session.current_turn(), Some(p2));
        assert_eq!(session.phase(), Phase::Playing);
    }

    #[test]
    fn hit_reveals_ship_and_flips_turn() {
        let (mut session, p1, p2) = playing_session();

        let outcome = session.fire(p1, Coord::new(0, 0)).unwrap();
        assert!(outcome.hit);
        assert_eq!(outcome.ship, Some(ShipKind::Carrier));
        assert_eq!(outcome.defender, p2);
        assert_eq!(outcome.winner, None);
        // A non-winning hit still hands the turn over.
        assert_eq!(session.current_turn(), Some(p2));
    }

    #[test]
    fn out_of_turn_shot_is_rejected() {
        let (mut session, p1, p2) = playing_session();

        assert_eq!(
            session.fire(p2, Coord::new(0, 0)),
            Err(SessionError::OutOfTurn)
        );
        // State untouched: p1 still to move.
        assert_eq!(session.current_turn(), Some(p1));
    }

    #[test]
    fn duplicate_target_is_rejected_without_turn_change() {
        let (mut session, p1, p2) = playing_session();

        session.fire(p1, Coord::new(9, 9)).unwrap();
        session.fire(p2, Coord::new(9, 9)).unwrap();

        // p1 fires at the same water cell again.
        assert_eq!(
            session.fire(p1, Coord::new(9, 9)),
            Err(SessionError::AlreadyTargeted)
        );
        assert_eq!(session.current_turn(), Some(p1));
    }

    #[test]
    fn out_of_bounds_shot_is_rejected() {
        let (mut session, p1, _) = playing_session();
        assert_eq!(
            session.fire(p1, Coord::new(10, 0)),
            Err(SessionError::OutOfBounds)
        );
    }

    #[test]
    fn shot_before_game_start_is_rejected() {
        let mut session = GameSession::new([0; 16]);
        let p1 = session.add_player("alice", channel()).unwrap();
        assert_eq!(
            session.fire(p1, Coord::new(0, 0)),
            Err(SessionError::NotPlaying)
        );
    }

    #[test]
    fn winning_hit_ends_game_without_flipping_turn() {
        let (mut session, p1, p2) = playing_session();

        // Sink every fleet cell of p2's board, alternating with p1-side
        // water shots from p2 to keep the turn order legal.
        let targets: Vec<Coord> = fleet_coords();
        let mut p2_water = water_coords().into_iter();

        for (i, coord) in targets.iter().enumerate() {
            let outcome = session.fire(p1, *coord).unwrap();
            assert!(outcome.hit);

            if i < targets.len() - 1 {
                assert_eq!(outcome.winner, None);
                session.fire(p2, p2_water.next().unwrap()).unwrap();
            } else {
                // Last remaining un-hit fleet cell.
                assert_eq!(outcome.winner, Some(p1));
                assert_eq!(outcome.phase, Phase::GameOver);
                assert_eq!(session.phase(), Phase::GameOver);
                // Turn pointer not flipped on the winning shot.
                assert_eq!(session.current_turn(), Some(p1));
            }
        }

        // Any further fire is rejected because the phase is terminal.
        assert_eq!(
            session.fire(p2, Coord::new(9, 0)),
            Err(SessionError::NotPlaying)
        );
        assert_eq!(
            session.fire(p1, Coord::new(9, 1)),
            Err(SessionError::NotPlaying)
        );
    }

    #[test]
    fn reset_returns_to_placing_with_players_kept() {
        let (mut session, p1, p2) = playing_session();
        finish_game(&mut session, p1, p2);
        assert_eq!(session.phase(), Phase::GameOver);

        session.reset().unwrap();
        assert_eq!(session.phase(), Phase::Placing);
        assert_eq!(session.player_count(), 2);
        assert_eq!(session.current_turn(), None);

        // Boards and ledgers are clear: the same layout is accepted again
        // and previously-shot coordinates are fresh.
        assert!(!session.set_ready(&p1, &valid_rows()).unwrap());
        assert!(session.set_ready(&p2, &valid_rows()).unwrap());
        let outcome = session.fire(p1, Coord::new(0, 0)).unwrap();
        assert!(outcome.hit);
    }

    #[test]
    fn reset_outside_gameover_is_rejected() {
        let (mut session, _, _) = playing_session();
        assert_eq!(session.reset(), Err(SessionError::ResetUnavailable));
        assert_eq!(session.phase(), Phase::Playing);
    }

    /// Every occupied coordinate of the valid layout.
    fn fleet_coords() -> Vec<Coord> {
        let rows = valid_rows();
        let mut coords = Vec::new();
        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                if cell.is_some() {
                    coords.push(Coord::new(r as u8, c as u8));
                }
            }
        }
        coords
    }

    /// Plenty of water coordinates in the valid layout (bottom rows).
    fn water_coords() -> Vec<Coord> {
        let mut coords = Vec::new();
        for row in 8..10u8 {
            for col in 0..10u8 {
                coords.push(Coord::new(row, col));
            }
        }
        coords
    }

    fn finish_game(session: &mut GameSession, p1: PlayerId, p2: PlayerId) {
        let targets = fleet_coords();
        let mut water = water_coords().into_iter();
        for (i, coord) in targets.iter().enumerate() {
            session.fire(p1, *coord).unwrap();
            if i < targets.len() - 1 {
                session.fire(p2, water.next().unwrap()).unwrap();
            }
        }
    }

    // =========================================================================
    // REGISTRY
    // =========================================================================

    #[tokio::test]
    async fn test_join_or_create_pairs_players() {
        let registry = SessionRegistry::new();

        let (sid1, p1, _) = registry.join_or_create("alice", channel()).await.unwrap();
        assert_eq!(registry.session_count().await, 1);

        let (sid2, p2, session) = registry.join_or_create("bob", channel()).await.unwrap();
        assert_eq!(sid1, sid2);
        assert_ne!(p1, p2);
        assert_eq!(registry.session_count().await, 1);
        assert_eq!(registry.player_count().await, 2);
        assert_eq!(session.read().await.phase(), Phase::Placing);
    }

    #[tokio::test]
    async fn test_full_sessions_are_skipped() {
        let registry = SessionRegistry::new();

        registry.join_or_create("alice", channel()).await.unwrap();
        registry.join_or_create("bob", channel()).await.unwrap();

        // Third player lands in a fresh session.
        let (sid3, p3, _) = registry.join_or_create("carol", channel()).await.unwrap();
        assert_eq!(registry.session_count().await, 2);

        let session = registry.get_player_session(&p3).await.unwrap();
        let s = session.read().await;
        assert_eq!(s.id, sid3);
        assert_eq!(s.phase(), Phase::Waiting);
    }

    #[tokio::test]
    async fn test_invalid_name_creates_nothing() {
        let registry = SessionRegistry::new();
        let result = registry.join_or_create("", channel()).await;
        assert_eq!(result.unwrap_err(), SessionError::InvalidName);
        assert_eq!(registry.session_count().await, 0);
        assert_eq!(registry.player_count().await, 0);
    }

    #[tokio::test]
    async fn test_leave_discards_session_and_unmaps_survivor() {
        let registry = SessionRegistry::new();
        let (_, p1, _) = registry.join_or_create("alice", channel()).await.unwrap();
        let (_, p2, _) = registry.join_or_create("bob", channel()).await.unwrap();

        registry.leave(&p1).await.unwrap();
        assert_eq!(registry.session_count().await, 0);
        assert_eq!(registry.player_count().await, 0);
        assert!(registry.get_player_session(&p2).await.is_none());
    }

    #[tokio::test]
    async fn test_survivor_is_notified_on_leave() {
        let registry = SessionRegistry::new();
        let (_, p1, _) = registry.join_or_create("alice", channel()).await.unwrap();

        let (tx, mut rx) = mpsc::channel(64);
        registry.join_or_create("bob", tx).await.unwrap();

        registry.leave(&p1).await.unwrap();

        let mut saw_opponent_left = false;
        while let Ok(msg) = rx.try_recv() {
            if let ServerMessage::OpponentLeft { players } = msg {
                assert_eq!(players, vec!["bob"]);
                saw_opponent_left = true;
            }
        }
        assert!(saw_opponent_left);
    }

    #[tokio::test]
    async fn test_leave_unknown_player_is_noop() {
        let registry = SessionRegistry::new();
        assert_eq!(registry.leave(&PlayerId::generate()).await, None);
    }
}
