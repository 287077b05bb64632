//! Rooms
//!
//! A room is the pairing of exactly two connections for one match. Rooms
//! are tracked in an explicit index keyed by room id, with explicit
//! removal on disconnect, so one member's cleanup can never leave a
//! dangling reference behind the other's.

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

use super::registry::ConnId;

/// Unique room identifier.
pub type RoomId = [u8; 16];

/// Derive a room id from its two members.
///
/// First 16 bytes of SHA-256 over a domain separator and both connection
/// ids in pairing order (waiting party first). The same pair always
/// yields the same id, so both clients can predict it.
pub fn derive_room_id(first: &ConnId, second: &ConnId) -> RoomId {
    let mut hasher = Sha256::new();
    hasher.update(b"arena-relay-room:");
    hasher.update(first.as_bytes());
    hasher.update(second.as_bytes());
    let hash = hasher.finalize();

    let mut id = [0u8; 16];
    id.copy_from_slice(&hash[..16]);
    id
}

/// The pairing of exactly two connections for a single match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Room {
    /// Room identifier, derived from the member pair.
    pub id: RoomId,
    /// Member connections, waiting party first.
    pub members: [ConnId; 2],
}

impl Room {
    /// Form a room from the waiting party and the joining requester.
    pub fn pair(first: ConnId, second: ConnId) -> Self {
        Self {
            id: derive_room_id(&first, &second),
            members: [first, second],
        }
    }

    /// Whether `conn` is a member of this room.
    pub fn contains(&self, conn: &ConnId) -> bool {
        self.members.contains(conn)
    }

    /// The member on the other side of `conn`, if `conn` is a member.
    pub fn other(&self, conn: &ConnId) -> Option<ConnId> {
        match self.members {
            [a, b] if a == *conn => Some(b),
            [a, b] if b == *conn => Some(a),
            _ => None,
        }
    }
}

/// Explicit index of live rooms.
#[derive(Debug, Default)]
pub struct RoomIndex {
    rooms: BTreeMap<RoomId, Room>,
}

impl RoomIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a newly formed room.
    pub fn insert(&mut self, room: Room) {
        self.rooms.insert(room.id, room);
    }

    /// Look up a live room.
    pub fn get(&self, id: &RoomId) -> Option<&Room> {
        self.rooms.get(id)
    }

    /// Remove a room by id.
    pub fn remove(&mut self, id: &RoomId) -> Option<Room> {
        self.rooms.remove(id)
    }

    /// Remove the room containing `conn`, if any (disconnect path).
    pub fn remove_containing(&mut self, conn: &ConnId) -> Option<Room> {
        let id = self
            .rooms
            .values()
            .find(|room| room.contains(conn))
            .map(|room| room.id)?;
        self.rooms.remove(&id)
    }

    /// Number of live rooms.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Whether no rooms are live.
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
