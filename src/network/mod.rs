//! Network Layer
//!
//! WebSocket transport for the realtime event surface. This layer only
//! accepts connections, decodes frames, and forwards events to the relay
//! hub; it holds no matchmaking or room state of its own.

pub mod auth;
pub mod protocol;
pub mod server;

pub use auth::{validate_token, AccessClaims, AuthConfig, AuthError};
pub use protocol::{
    ClientMessage, GameOverReport, IdentityInit, MoveReport, PlayerInit, ServerMessage,
};
pub use server::{RelayServer, RelayServerError, ServerConfig};
