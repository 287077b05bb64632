//! Matchmaking & Relay Core
//!
//! All in-memory realtime state for one server process. The transport
//! layer decodes frames and calls into [`hub::RelayHub`]; nothing outside
//! this module mutates relay state directly.
//!
//! ## Module Structure
//!
//! - `registry`: ephemeral per-connection identity
//! - `matchmaker`: single-slot pairing queue
//! - `room`: room id derivation and the explicit room index
//! - `hub`: the owned service object that funnels every mutation

pub mod hub;
pub mod matchmaker;
pub mod registry;
pub mod room;

// Re-export key types
pub use hub::{ConnSender, RelayHub};
pub use matchmaker::{MatchDecision, Matchmaker};
pub use registry::{ConnId, ConnectionRegistry, Identity};
pub use room::{derive_room_id, Room, RoomId, RoomIndex};
