//! # Arena Relay Server
//!
//! Realtime matchmaking and position-relay backend for two-player arena
//! matches. The REST layer (accounts, characters, leaderboard pages) lives
//! elsewhere; this process owns only the in-memory realtime state.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    ARENA RELAY SERVER                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  relay/          - Matchmaking & relay core (in-memory)      │
//! │  ├── registry.rs - Per-connection ephemeral identity         │
//! │  ├── matchmaker.rs - Single-slot pairing queue               │
//! │  ├── room.rs     - Room index, two members per room          │
//! │  └── hub.rs      - Owns all state behind one lock            │
//! │                                                              │
//! │  network/        - Transport (WebSocket)                     │
//! │  ├── server.rs   - Accept loop, one task per connection      │
//! │  ├── protocol.rs - Wire message types                        │
//! │  └── auth.rs     - JWT validation (tokens issued elsewhere)  │
//! │                                                              │
//! │  score/          - Final-score handoff                       │
//! │  ├── sink.rs     - Validation + fire-and-forget dispatch     │
//! │  └── store.rs    - Persistence collaborator trait            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Atomicity Guarantee
//!
//! Every relay state transition (identity upsert, waiting-slot
//! check-and-set, room formation, disconnect cleanup) acquires the hub
//! lock once and completes without awaiting. Two concurrent match
//! requests can never both observe an empty waiting slot, and never form
//! two rooms from the same waiting party. Only score persistence awaits
//! external I/O, and it runs on its own task.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod network;
pub mod relay;
pub mod score;

// Re-export commonly used types
pub use network::auth::AuthConfig;
pub use network::protocol::{ClientMessage, ServerMessage};
pub use network::server::{RelayServer, ServerConfig};
pub use relay::hub::RelayHub;
pub use relay::registry::{ConnId, ConnectionRegistry, Identity};
pub use relay::room::{Room, RoomId};
pub use score::{MemoryScoreStore, ScoreRecord, ScoreSink, ScoreStore};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Spawn point assigned to the waiting party when a room forms.
pub const SPAWN_WAITING: [f64; 2] = [100.0, 200.0];

/// Spawn point assigned to the joining party when a room forms.
pub const SPAWN_JOINER: [f64; 2] = [600.0, 200.0];
