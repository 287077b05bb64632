//! Relay Hub
//!
//! The one owned service object holding all realtime state: connection
//! registry, waiting slot, room index, and the outbound channel of every
//! live connection. The transport layer is handed an `Arc<RelayHub>` and
//! funnels every event through these methods; no state is reachable any
//! other way.
//!
//! Each transition takes the state lock exactly once and never awaits
//! while holding it. Outbound delivery goes through unbounded channels,
//! so a slow client cannot stall a transition either.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};

use crate::network::auth::{validate_token, AuthConfig};
use crate::network::protocol::{GameOverReport, IdentityInit, PlayerInit, ServerMessage};
use crate::relay::matchmaker::{MatchDecision, Matchmaker};
use crate::relay::registry::{ConnId, ConnectionRegistry};
use crate::relay::room::{Room, RoomId, RoomIndex};
use crate::score::{ScoreSink, ScoreStore};
use crate::{SPAWN_JOINER, SPAWN_WAITING};

/// Outbound channel to one connection's writer task.
pub type ConnSender = mpsc::UnboundedSender<ServerMessage>;

/// Process-wide mutable relay state. Owned exclusively by the hub.
#[derive(Default)]
struct CoreState {
    registry: ConnectionRegistry,
    matchmaker: Matchmaker,
    rooms: RoomIndex,
    senders: BTreeMap<ConnId, ConnSender>,
}

/// The matchmaking & relay core for one server process.
pub struct RelayHub {
    state: RwLock<CoreState>,
    sink: ScoreSink,
    auth: AuthConfig,
}

impl RelayHub {
    /// Create a hub that hands final scores to `store`.
    ///
    /// When `auth` carries a validation key, identity-init events must
    /// present a valid token; with the default (unconfigured) auth,
    /// identities are accepted as-is.
    pub fn new(store: Arc<dyn ScoreStore>, auth: AuthConfig) -> Self {
        Self {
            state: RwLock::new(CoreState::default()),
            sink: ScoreSink::new(store),
            auth,
        }
    }

    /// Register a newly accepted connection and its outbound channel.
    pub async fn connect(&self, conn: ConnId, sender: ConnSender) {
        let mut state = self.state.write().await;
        state.senders.insert(conn, sender);
        info!(conn = %conn.short_hex(), connections = state.senders.len(), "connection registered");
    }

    /// Handle an identity-init event: upsert the connection's identity.
    ///
    /// Malformed or unauthorized inits are logged and dropped; the
    /// sender is never disconnected and receives no error frame.
    pub async fn init_identity(&self, conn: ConnId, init: IdentityInit) {
        if self.auth.is_configured() {
            let token = match init.token.as_deref() {
                Some(token) => token,
                None => {
                    warn!(conn = %conn.short_hex(), "dropping identity init: token required");
                    return;
                }
            };
            if let Err(err) = validate_token(token, &self.auth) {
                warn!(conn = %conn.short_hex(), error = %err, "dropping identity init: invalid token");
                return;
            }
        }

        let mut state = self.state.write().await;
        state
            .registry
            .set_identity(conn, init.character, init.display_name);
        debug!(conn = %conn.short_hex(), "identity set");
    }

    /// Handle a request-match event.
    ///
    /// Either seats the requester in the waiting slot (no reply; the
    /// protocol has no waiting acknowledgment) or pairs it with the
    /// waiting party, forming a room and notifying both members.
    pub async fn request_match(&self, conn: ConnId) {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        match state.matchmaker.request_match(conn, &state.registry) {
            MatchDecision::Waiting => {
                debug!(conn = %conn.short_hex(), "seated in waiting slot");
            }
            MatchDecision::Paired { first, second } => {
                let room = Room::pair(first, second);
                state.rooms.insert(room);
                info!(
                    room = %hex::encode(&room.id[..4]),
                    first = %first.short_hex(),
                    second = %second.short_hex(),
                    "room formed"
                );

                for member in room.members {
                    send_to(state, &member, ServerMessage::RoomFormed { room_id: room.id });
                }

                // Each member learns the other side's spawn.
                let first_init = spawn_init(state, first, SPAWN_WAITING);
                let second_init = spawn_init(state, second, SPAWN_JOINER);
                send_to(state, &second, ServerMessage::PlayerInit(first_init));
                send_to(state, &first, ServerMessage::PlayerInit(second_init));
            }
        }
    }

    /// Relay a move event to the other room member.
    ///
    /// Transport-transparent: coordinates are not validated. An unknown
    /// room, or a sender that is not a member of it, is a silent no-op.
    pub async fn relay_move(&self, conn: ConnId, room_id: RoomId, x: f64, y: f64) {
        let state = self.state.read().await;

        let room = match state.rooms.get(&room_id) {
            Some(room) => room,
            None => {
                debug!(conn = %conn.short_hex(), "move for unknown room, ignoring");
                return;
            }
        };

        match room.other(&conn) {
            Some(other) => {
                send_to(&state, &other, ServerMessage::PlayerMoved { conn_id: conn, x, y });
            }
            None => {
                debug!(conn = %conn.short_hex(), "move from non-member, ignoring");
            }
        }
    }

    /// Handle a game-over event: validate and hand the score to the
    /// persistence collaborator without blocking this connection.
    pub async fn game_over(&self, conn: ConnId, report: GameOverReport) {
        debug!(conn = %conn.short_hex(), "game over reported");
        self.sink.submit(report.username.as_deref(), report.score.as_ref());
    }

    /// Tear down all state for a disconnected connection.
    ///
    /// Clears the registry entry and the waiting slot (if held), removes
    /// the connection's room, and sends the surviving member exactly one
    /// player-disconnected notice.
    pub async fn disconnect(&self, conn: ConnId) {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        state.senders.remove(&conn);
        state.registry.remove(&conn);
        if state.matchmaker.clear_if(&conn) {
            debug!(conn = %conn.short_hex(), "waiting slot cleared");
        }

        if let Some(room) = state.rooms.remove_containing(&conn) {
            info!(
                room = %hex::encode(&room.id[..4]),
                conn = %conn.short_hex(),
                "room dissolved"
            );
            if let Some(other) = room.other(&conn) {
                send_to(state, &other, ServerMessage::PlayerDisconnected { conn_id: conn });
            }
        }

        info!(conn = %conn.short_hex(), "connection cleaned up");
    }

    /// Number of live connections.
    pub async fn connection_count(&self) -> usize {
        self.state.read().await.senders.len()
    }

    /// Number of live rooms.
    pub async fn room_count(&self) -> usize {
        self.state.read().await.rooms.len()
    }

    /// Whether a connection currently holds the waiting slot.
    pub async fn has_waiting_party(&self) -> bool {
        self.state.read().await.matchmaker.waiting_party().is_some()
    }
}

/// Build the player-init notification for one side of a new room.
fn spawn_init(state: &CoreState, conn: ConnId, spawn: [f64; 2]) -> PlayerInit {
    let identity = state.registry.get(&conn).cloned().unwrap_or_default();
    PlayerInit {
        conn_id: conn,
        x: spawn[0],
        y: spawn[1],
        character: identity.character,
        display_name: identity.display_name,
    }
}

/// Deliver a message to one connection. Silently drops when the receiver
/// is gone (its task already exited).
fn send_to(state: &CoreState, conn: &ConnId, msg: ServerMessage) {
    if let Some(sender) = state.senders.get(conn) {
        let _ = sender.send(msg);
    }
}
