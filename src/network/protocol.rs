//! Protocol Messages
//!
//! Wire format for client-server communication over WebSocket.
//! All messages are serialized as JSON for debugging ease,
//! with optional binary (bincode) for flat payloads.

use serde::{Deserialize, Serialize};

use crate::relay::registry::ConnId;
use crate::relay::room::RoomId;

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Set this connection's ephemeral identity.
    InitIdentity(IdentityInit),

    /// Ask to be paired with another waiting connection.
    RequestMatch,

    /// Position update to relay to the other room member.
    Move(MoveReport),

    /// Final score report for persistence.
    GameOver(GameOverReport),

    /// Ping for latency measurement.
    Ping { timestamp: u64 },
}

/// Identity-init payload.
///
/// Fields are optional on purpose: the registry stores whatever was sent,
/// and the matchmaker only cares that init happened at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityInit {
    /// Selected character id.
    #[serde(default)]
    pub character: Option<String>,
    /// Name shown to the opponent.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Access token from the REST login, validated only when the server
    /// has a verification key configured.
    #[serde(default)]
    pub token: Option<String>,
}

/// Move payload. Coordinates are relayed untouched.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MoveReport {
    /// Room the sender believes it is in.
    pub room_id: RoomId,
    /// X position.
    pub x: f64,
    /// Y position.
    pub y: f64,
}

/// Game-over payload.
///
/// Deliberately loose: the score arrives as raw JSON so the sink can
/// apply the presence/numeric validation itself and drop bad reports
/// without failing frame decode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameOverReport {
    /// Name to record the score under.
    #[serde(default)]
    pub username: Option<String>,
    /// Final score; must be numeric to be persisted.
    #[serde(default)]
    pub score: Option<serde_json::Value>,
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// A room was formed; sent to both new members.
    RoomFormed {
        /// Identifier both members use for subsequent moves.
        room_id: RoomId,
    },

    /// One side's spawn info; each member receives the other side's.
    PlayerInit(PlayerInit),

    /// The other member moved.
    PlayerMoved {
        /// Originating connection.
        conn_id: ConnId,
        /// X position.
        x: f64,
        /// Y position.
        y: f64,
    },

    /// The other member disconnected; the room is gone.
    PlayerDisconnected {
        /// Departed connection.
        conn_id: ConnId,
    },

    /// Pong response.
    Pong {
        /// Echoed client timestamp.
        timestamp: u64,
        /// Server wall-clock time (ms since epoch).
        server_time: u64,
    },

    /// Server is shutting down.
    Shutdown {
        /// Human-readable reason.
        reason: String,
    },
}

/// Spawn info for one side of a newly formed room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerInit {
    /// Connection this spawn describes.
    pub conn_id: ConnId,
    /// Assigned spawn X.
    pub x: f64,
    /// Assigned spawn Y.
    pub y: f64,
    /// That side's selected character, if it sent one.
    pub character: Option<String>,
    /// That side's display name, if it sent one.
    pub display_name: Option<String>,
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_identity_json_roundtrip() {
        let msg = ClientMessage::InitIdentity(IdentityInit {
            character: Some("kp".into()),
            display_name: Some("Alice".into()),
            token: None,
        });

        let json = msg.to_json().unwrap();
        assert!(json.contains("init_identity"));

        let parsed = ClientMessage::from_json(&json).unwrap();
        if let ClientMessage::InitIdentity(init) = parsed {
            assert_eq!(init.character.as_deref(), Some("kp"));
            assert_eq!(init.display_name.as_deref(), Some("Alice"));
        } else {
            panic!("Wrong message type");
        }
    }

    #[test]
    fn test_init_identity_accepts_missing_fields() {
        // Absent fields are stored as-is, so they must decode as None.
        let parsed = ClientMessage::from_json(r#"{"type":"init_identity"}"#).unwrap();
        if let ClientMessage::InitIdentity(init) = parsed {
            assert!(init.character.is_none());
            assert!(init.display_name.is_none());
        } else {
            panic!("Wrong message type");
        }
    }

    #[test]
    fn test_move_json_roundtrip() {
        let msg = ClientMessage::Move(MoveReport {
            room_id: [7; 16],
            x: 150.25,
            y: -3.0,
        });

        let json = msg.to_json().unwrap();
        assert!(json.contains("\"type\":\"move\""));

        let parsed = ClientMessage::from_json(&json).unwrap();
        if let ClientMessage::Move(report) = parsed {
            assert_eq!(report.room_id, [7; 16]);
            assert_eq!(report.x, 150.25);
            assert_eq!(report.y, -3.0);
        } else {
            panic!("Wrong message type");
        }
    }

    #[test]
    fn test_game_over_with_non_numeric_score_still_decodes() {
        // Bad scores are dropped by the sink, not by frame decode.
        let parsed = ClientMessage::from_json(
            r#"{"type":"game_over","username":"p1","score":"not-a-number"}"#,
        )
        .unwrap();

        if let ClientMessage::GameOver(report) = parsed {
            assert_eq!(report.username.as_deref(), Some("p1"));
            assert!(report.score.unwrap().as_f64().is_none());
        } else {
            panic!("Wrong message type");
        }
    }

    #[test]
    fn test_server_message_json_roundtrip() {
        let msg = ServerMessage::PlayerMoved {
            conn_id: ConnId::new([1; 16]),
            x: 400.0,
            y: 210.5,
        };

        let json = msg.to_json().unwrap();
        assert!(json.contains("player_moved"));

        let parsed = ServerMessage::from_json(&json).unwrap();
        if let ServerMessage::PlayerMoved { conn_id, x, y } = parsed {
            assert_eq!(conn_id, ConnId::new([1; 16]));
            assert_eq!((x, y), (400.0, 210.5));
        } else {
            panic!("Wrong message type");
        }
    }

    #[test]
    fn test_player_init_carries_identity() {
        let msg = ServerMessage::PlayerInit(PlayerInit {
            conn_id: ConnId::new([2; 16]),
            x: 100.0,
            y: 200.0,
            character: Some("sher".into()),
            display_name: None,
        });

        let json = msg.to_json().unwrap();
        let parsed = ServerMessage::from_json(&json).unwrap();
        if let ServerMessage::PlayerInit(init) = parsed {
            assert_eq!((init.x, init.y), (100.0, 200.0));
            assert_eq!(init.character.as_deref(), Some("sher"));
            assert!(init.display_name.is_none());
        } else {
            panic!("Wrong message type");
        }
    }

    #[test]
    fn test_binary_serialization_move_report() {
        // Note: Binary serialization only works reliably for flat structs.
        // Tagged enums (#[serde(tag = "type")]) are not supported by bincode,
        // so binary frames carry the flat payloads, JSON carries the rest.
        let report = MoveReport {
            room_id: [9; 16],
            x: 1.5,
            y: 2.5,
        };

        let bytes = bincode::serialize(&report).unwrap();
        let parsed: MoveReport = bincode::deserialize(&bytes).unwrap();
        assert_eq!(parsed.room_id, [9; 16]);
        assert_eq!((parsed.x, parsed.y), (1.5, 2.5));
    }

    #[test]
    fn test_malformed_frame_returns_error() {
        assert!(ClientMessage::from_json("not json at all").is_err());
        assert!(ClientMessage::from_json(r#"{"type":"fly_to_moon"}"#).is_err());
    }

    #[test]
    fn test_ping_roundtrip() {
        let msg = ClientMessage::Ping { timestamp: 123456 };
        let json = msg.to_json().unwrap();
        let parsed = ClientMessage::from_json(&json).unwrap();
        assert!(matches!(parsed, ClientMessage::Ping { timestamp: 123456 }));
    }
}
