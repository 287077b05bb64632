//! Connection Registry
//!
//! Ephemeral per-connection identity, alive exactly as long as the
//! connection itself. Entries are created by the identity-init event and
//! deleted on disconnect; nothing here is ever persisted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Unique connection identifier (UUID v4 as bytes).
///
/// Assigned by the transport layer when a connection is accepted.
/// Implements Ord for deterministic BTreeMap ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct ConnId(pub [u8; 16]);

impl ConnId {
    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Generate a fresh identifier for a newly accepted connection.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().into_bytes())
    }

    /// Convert to UUID string.
    pub fn to_uuid_string(&self) -> String {
        uuid::Uuid::from_bytes(self.0).to_string()
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Short hex prefix for log lines.
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

/// Ephemeral attributes set by the identity-init event.
///
/// No validation beyond presence: absent fields are stored as-is and
/// callers must tolerate a connection that never completed init.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Identity {
    /// Selected character id (e.g. `"kp"`, `"sher"`).
    pub character: Option<String>,
    /// Name shown to the opponent.
    pub display_name: Option<String>,
}

/// Tracks identity for every live connection.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    entries: BTreeMap<ConnId, Identity>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent upsert of a connection's identity.
    pub fn set_identity(
        &mut self,
        conn: ConnId,
        character: Option<String>,
        display_name: Option<String>,
    ) {
        self.entries.insert(
            conn,
            Identity {
                character,
                display_name,
            },
        );
    }

    /// Delete a connection's identity. No-op when absent; safe to call
    /// multiple times.
    pub fn remove(&mut self, conn: &ConnId) -> bool {
        self.entries.remove(conn).is_some()
    }

    /// Look up the stored identity.
    pub fn get(&self, conn: &ConnId) -> Option<&Identity> {
        self.entries.get(conn)
    }

    /// Whether this connection completed identity init.
    pub fn contains(&self, conn: &ConnId) -> bool {
        self.entries.contains_key(conn)
    }

    /// Number of registered connections.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
