//! WebSocket Game Server
//!
//! Async WebSocket server for multiplayer connections. One task per live
//! connection decodes inbound events, dispatches them into the owning
//! session (serialized by the session lock), and a paired writer task
//! forwards outbound events back to the transport.
//!
//! A failing connection or session never affects other sessions: all
//! per-connection state lives in its own task, and disconnect cleanup only
//! touches the departing player's session.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, instrument, warn};

use crate::game::board::Coord;
use crate::network::protocol::{ClientMessage, ErrorCode, ServerError, ServerMessage};
use crate::network::session::{GameSession, PlayerId, SessionError, SessionRegistry};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// Server version string.
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".parse().expect("static bind address"),
            max_connections: 1000,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Game server errors.
#[derive(Debug, thiserror::Error)]
pub enum GameServerError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

/// The game server: accept loop plus one supervisor task per connection.
pub struct GameServer {
    config: ServerConfig,
    registry: Arc<SessionRegistry>,
    connections: Arc<AtomicUsize>,
    shutdown_tx: broadcast::Sender<()>,
}

impl GameServer {
    /// Create a new game server.
    pub fn new(config: ServerConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            registry: Arc::new(SessionRegistry::new()),
            connections: Arc::new(AtomicUsize::new(0)),
            shutdown_tx,
        }
    }

    /// Run the accept loop until shutdown.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<(), GameServerError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        info!("Game server listening on {}", self.config.bind_addr);

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            if self.connections.load(Ordering::Relaxed) >= self.config.max_connections {
                                warn!("Connection limit reached, rejecting {}", addr);
                                continue;
                            }
                            debug!("New connection from {}", addr);
                            self.handle_connection(stream, addr);
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Spawn the supervisor task for one connection.
    fn handle_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let registry = self.registry.clone();
        let connections = self.connections.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        connections.fetch_add(1, Ordering::Relaxed);

        tokio::spawn(async move {
            let ws_stream = match accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    error!("WebSocket handshake failed for {}: {}", addr, e);
                    connections.fetch_sub(1, Ordering::Relaxed);
                    return;
                }
            };

            let (mut ws_sender, mut ws_receiver) = ws_stream.split();
            let (msg_tx, mut msg_rx) = mpsc::channel::<ServerMessage>(64);

            // Writer task: drains the outbound channel onto the socket.
            let sender_task = tokio::spawn(async move {
                while let Some(msg) = msg_rx.recv().await {
                    let text = match msg.to_json() {
                        Ok(t) => t,
                        Err(e) => {
                            error!("Failed to serialize message: {}", e);
                            continue;
                        }
                    };
                    if ws_sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
            });

            // Connection-local identity: set on a successful join, the
            // implicit authenticated identity for every later event.
            let mut player: Option<(PlayerId, Arc<RwLock<GameSession>>)> = None;

            loop {
                tokio::select! {
                    msg = ws_receiver.next() => {
                        match msg {
                            Some(Ok(Message::Text(text))) => {
                                let client_msg = match ClientMessage::from_json(&text) {
                                    Ok(m) => m,
                                    Err(e) => {
                                        debug!("Invalid message from {}: {}", addr, e);
                                        send_error(
                                            &msg_tx,
                                            ErrorCode::InvalidMessage,
                                            "Invalid message format",
                                        ).await;
                                        continue;
                                    }
                                };
                                handle_client_message(
                                    addr,
                                    client_msg,
                                    &registry,
                                    &msg_tx,
                                    &mut player,
                                ).await;
                            }
                            Some(Ok(Message::Binary(data))) => {
                                match ClientMessage::from_bytes(&data) {
                                    Ok(client_msg) => {
                                        handle_client_message(
                                            addr,
                                            client_msg,
                                            &registry,
                                            &msg_tx,
                                            &mut player,
                                        ).await;
                                    }
                                    Err(_) => {
                                        send_error(
                                            &msg_tx,
                                            ErrorCode::InvalidMessage,
                                            "Invalid message format",
                                        ).await;
                                    }
                                }
                            }
                            Some(Ok(Message::Close(_))) | None => {
                                debug!("Client {} disconnected", addr);
                                break;
                            }
                            Some(Err(e)) => {
                                debug!("WebSocket error for {}: {}", addr, e);
                                break;
                            }
                            _ => {}
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                }
            }

            sender_task.abort();

            // Disconnect is a lifecycle event, not an error: it ends the
            // player's session for any remaining participant.
            if let Some((player_id, _)) = player {
                registry.leave(&player_id).await;
            }

            connections.fetch_sub(1, Ordering::Relaxed);
            debug!("Client {} cleaned up", addr);
        });
    }

    /// Shutdown the server.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Shared session registry handle.
    pub fn registry(&self) -> Arc<SessionRegistry> {
        self.registry.clone()
    }

    /// Number of open connections.
    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::Relaxed)
    }

    /// Active session count.
    pub async fn session_count(&self) -> usize {
        self.registry.session_count().await
    }
}

/// Dispatch one decoded inbound event against the connection's session.
async fn handle_client_message(
    addr: SocketAddr,
    msg: ClientMessage,
    registry: &Arc<SessionRegistry>,
    sender: &mpsc::Sender<ServerMessage>,
    player: &mut Option<(PlayerId, Arc<RwLock<GameSession>>)>,
) {
    match msg {
        ClientMessage::Join { name } => {
            // The binding can outlive the session: an opponent's disconnect
            // discards it and unmaps this player. Only a live registry
            // mapping blocks a rejoin.
            if let Some((player_id, _)) = player {
                if registry.get_player_session(player_id).await.is_some() {
                    send_error(sender, ErrorCode::AlreadyInSession, "Already in a session").await;
                    return;
                }
                *player = None;
            }

            match registry.join_or_create(&name, sender.clone()).await {
                Ok((session_id, player_id, session)) => {
                    info!(
                        "Player {} ({}) joined session {} from {}",
                        name,
                        player_id.to_uuid_string(),
                        uuid::Uuid::from_bytes(session_id),
                        addr,
                    );

                    let s = session.read().await;
                    s.send_to(
                        &player_id,
                        ServerMessage::Welcome {
                            player_id,
                            session_id,
                        },
                    )
                    .await;
                    s.broadcast(ServerMessage::Roster { players: s.roster() }).await;
                    if s.player_count() == 1 {
                        s.send_to(
                            &player_id,
                            ServerMessage::Waiting {
                                message: "Waiting for another player to join...".to_string(),
                            },
                        )
                        .await;
                    }
                    drop(s);

                    *player = Some((player_id, session));
                }
                Err(e) => {
                    send_session_error(sender, &e).await;
                }
            }
        }

        ClientMessage::Ready { board } => {
            let Some((player_id, session)) = player else {
                send_error(sender, ErrorCode::NotInSession, "Join a game first").await;
                return;
            };

            let mut s = session.write().await;
            match s.set_ready(player_id, &board) {
                Ok(started) => {
                    debug!("Player {} marked ready", player_id.to_uuid_string());
                    if started {
                        if let Some(current_turn) = s.current_turn() {
                            s.broadcast(ServerMessage::GameStart { current_turn }).await;
                        }
                    }
                }
                Err(e) => {
                    drop(s);
                    send_session_error(sender, &e).await;
                }
            }
        }

        ClientMessage::Fire { row, col } => {
            let Some((player_id, session)) = player else {
                send_error(sender, ErrorCode::NotInSession, "Join a game first").await;
                return;
            };

            let mut s = session.write().await;
            match s.fire(*player_id, Coord::new(row, col)) {
                Ok(outcome) => {
                    // Attacker's view carries the struck unit's identity.
                    s.send_to(
                        player_id,
                        ServerMessage::ShotResult {
                            row,
                            col,
                            hit: outcome.hit,
                            ship: outcome.ship,
                        },
                    )
                    .await;
                    // Defender's mirrored view does not.
                    s.send_to(
                        &outcome.defender,
                        ServerMessage::IncomingShot {
                            row,
                            col,
                            hit: outcome.hit,
                        },
                    )
                    .await;
                    s.broadcast(ServerMessage::TurnUpdate {
                        phase: outcome.phase,
                        current_turn: outcome.current_turn,
                    })
                    .await;
                    if let Some(winner) = outcome.winner {
                        s.broadcast(ServerMessage::GameOver { winner }).await;
                    }
                }
                Err(e) => {
                    drop(s);
                    send_session_error(sender, &e).await;
                }
            }
        }

        ClientMessage::Reset => {
            let Some((_, session)) = player else {
                send_error(sender, ErrorCode::NotInSession, "Join a game first").await;
                return;
            };

            let mut s = session.write().await;
            match s.reset() {
                Ok(()) => {
                    s.broadcast(ServerMessage::ResetComplete).await;
                }
                Err(e) => {
                    drop(s);
                    send_session_error(sender, &e).await;
                }
            }
        }

        ClientMessage::Status => {
            let _ = sender
                .send(ServerMessage::Status {
                    sessions: registry.session_count().await,
                    players: registry.player_count().await,
                })
                .await;
        }
    }
}

/// Map a rule violation to its wire error code.
fn error_code(e: &SessionError) -> ErrorCode {
    match e {
        SessionError::InvalidName => ErrorCode::InvalidName,
        SessionError::RoomFull => ErrorCode::RoomFull,
        SessionError::PlayerNotFound => ErrorCode::NotInSession,
        SessionError::InvalidBoard(_) | SessionError::NotPlacing => ErrorCode::InvalidBoard,
        SessionError::NotPlaying
        | SessionError::OutOfTurn
        | SessionError::OutOfBounds
        | SessionError::AlreadyTargeted => ErrorCode::IllegalShot,
        SessionError::ResetUnavailable => ErrorCode::IllegalReset,
    }
}

async fn send_session_error(sender: &mpsc::Sender<ServerMessage>, e: &SessionError) {
    let _ = sender
        .send(ServerMessage::Error(ServerError {
            code: error_code(e),
            message: e.to_string(),
        }))
        .await;
}

async fn send_error(sender: &mpsc::Sender<ServerMessage>, code: ErrorCode, message: &str) {
    let _ = sender
        .send(ServerMessage::Error(ServerError {
            code,
            message: message.to_string(),
        }))
        .await;
}
