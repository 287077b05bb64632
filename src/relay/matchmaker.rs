//! Matchmaker
//!
//! Single-slot pairing queue: the next two opposite requests with
//! resolvable identities form a room, first-requester-first-served.
//! Queue depth is exactly one; a stale occupant is replaced, never
//! errored on.

use tracing::debug;

use super::registry::{ConnId, ConnectionRegistry};

/// Outcome of a matchmaking request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchDecision {
    /// The requester now occupies the waiting slot.
    Waiting,
    /// The requester was paired with the previously waiting party.
    Paired {
        /// The party that was waiting (seated first).
        first: ConnId,
        /// The requester that completed the pair.
        second: ConnId,
    },
}

/// The single-capacity holding area for a connection awaiting pairing.
#[derive(Debug, Default)]
pub struct Matchmaker {
    waiting: Option<ConnId>,
}

impl Matchmaker {
    /// Create an idle matchmaker.
    pub fn new() -> Self {
        Self::default()
    }

    /// The connection currently holding the waiting slot, if any.
    pub fn waiting_party(&self) -> Option<ConnId> {
        self.waiting
    }

    /// Attempt to pair `conn` with the waiting party.
    ///
    /// The requester becomes the (new) waiting party when the slot is
    /// empty, when the current occupant's identity no longer resolves
    /// (it disconnected), or when the requester itself has no resolvable
    /// identity. A duplicate request from the current occupant re-enters
    /// the waiting state; a connection is never paired with itself.
    pub fn request_match(
        &mut self,
        conn: ConnId,
        registry: &ConnectionRegistry,
    ) -> MatchDecision {
        if self.waiting == Some(conn) {
            debug!(conn = %conn.short_hex(), "duplicate match request, still waiting");
            return MatchDecision::Waiting;
        }

        if !registry.contains(&conn) {
            debug!(conn = %conn.short_hex(), "match request before identity init, seating as waiting party");
            self.waiting = Some(conn);
            return MatchDecision::Waiting;
        }

        match self.waiting {
            Some(other) if registry.contains(&other) => {
                self.waiting = None;
                MatchDecision::Paired {
                    first: other,
                    second: conn,
                }
            }
            Some(stale) => {
                debug!(stale = %stale.short_hex(), "replacing stale waiting party");
                self.waiting = Some(conn);
                MatchDecision::Waiting
            }
            None => {
                self.waiting = Some(conn);
                MatchDecision::Waiting
            }
        }
    }

    /// Clear the slot if `conn` occupies it (disconnect path).
    /// Returns whether the slot was cleared.
    pub fn clear_if(&mut self, conn: &ConnId) -> bool {
        if self.waiting.as_ref() == Some(conn) {
            self.waiting = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with(conns: &[ConnId]) -> ConnectionRegistry {
        let mut registry = ConnectionRegistry::new();
        for conn in conns {
            registry.set_identity(*conn, Some("kp".into()), Some("player".into()));
        }
        registry
    }

    #[test]
    fn test_first_requester_waits() {
        let a = ConnId::new([1; 16]);
        let registry = registry_with(&[a]);
        let mut matchmaker = Matchmaker::new();

        assert_eq!(matchmaker.request_match(a, &registry), MatchDecision::Waiting);
        assert_eq!(matchmaker.waiting_party(), Some(a));
    }

    #[test]
    fn test_second_requester_pairs() {
        let a = ConnId::new([1; 16]);
        let b = ConnId::new([2; 16]);
        let registry = registry_with(&[a, b]);
        let mut matchmaker = Matchmaker::new();

        matchmaker.request_match(a, &registry);
        let decision = matchmaker.request_match(b, &registry);

        assert_eq!(decision, MatchDecision::Paired { first: a, second: b });
        assert_eq!(matchmaker.waiting_party(), None);
    }

    #[test]
    fn test_duplicate_request_never_self_pairs() {
        let a = ConnId::new([1; 16]);
        let registry = registry_with(&[a]);
        let mut matchmaker = Matchmaker::new();

        matchmaker.request_match(a, &registry);
        assert_eq!(matchmaker.request_match(a, &registry), MatchDecision::Waiting);
        assert_eq!(matchmaker.waiting_party(), Some(a));
    }

    #[test]
    fn test_stale_waiting_party_replaced() {
        let a = ConnId::new([1; 16]);
        let c = ConnId::new([3; 16]);
        let mut registry = registry_with(&[a, c]);
        let mut matchmaker = Matchmaker::new();

        matchmaker.request_match(a, &registry);

        // A disconnects; its identity no longer resolves.
        registry.remove(&a);

        assert_eq!(matchmaker.request_match(c, &registry), MatchDecision::Waiting);
        assert_eq!(matchmaker.waiting_party(), Some(c));
    }

    #[test]
    fn test_live_waiting_party_is_paired_not_replaced() {
        let a = ConnId::new([1; 16]);
        let c = ConnId::new([3; 16]);
        let registry = registry_with(&[a, c]);
        let mut matchmaker = Matchmaker::new();

        matchmaker.request_match(a, &registry);
        let decision = matchmaker.request_match(c, &registry);

        assert_eq!(decision, MatchDecision::Paired { first: a, second: c });
    }

    #[test]
    fn test_requester_without_identity_waits() {
        let a = ConnId::new([1; 16]);
        let b = ConnId::new([2; 16]);
        let registry = registry_with(&[b]);
        let mut matchmaker = Matchmaker::new();

        // A never sent identity init: it sits in the slot but can't pair.
        assert_eq!(matchmaker.request_match(a, &registry), MatchDecision::Waiting);

        // B resolves, A doesn't: B replaces A rather than pairing.
        assert_eq!(matchmaker.request_match(b, &registry), MatchDecision::Waiting);
        assert_eq!(matchmaker.waiting_party(), Some(b));
    }

    #[test]
    fn test_clear_if_only_matches_occupant() {
        let a = ConnId::new([1; 16]);
        let b = ConnId::new([2; 16]);
        let registry = registry_with(&[a]);
        let mut matchmaker = Matchmaker::new();

        matchmaker.request_match(a, &registry);
        assert!(!matchmaker.clear_if(&b));
        assert_eq!(matchmaker.waiting_party(), Some(a));
        assert!(matchmaker.clear_if(&a));
        assert_eq!(matchmaker.waiting_party(), None);
    }
}
