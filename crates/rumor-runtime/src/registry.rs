//! Peer membership registry
//!
//! An arena keyed by `PeerId`. Handles are allocated in increasing
//! order, so iterating the map visits peers in registration order.
//! Entries are never removed; a peer whose link closed stays registered
//! with a dead link (sends to it become no-ops).

use std::collections::BTreeMap;

use rumor_core::PeerId;
use rumor_transport::PeerLink;

/// One registered peer
#[derive(Debug)]
pub struct PeerEntry {
    /// Live link handle
    pub link: PeerLink,
    /// True when this side dialed the peer, so its address is dialable
    pub outbound: bool,
}

/// Arena of peers keyed by handle
#[derive(Debug, Default)]
pub struct PeerRegistry {
    peers: BTreeMap<PeerId, PeerEntry>,
    next_id: u64,
}

impl PeerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        PeerRegistry::default()
    }

    /// Reserve the next peer handle
    pub fn allocate(&mut self) -> PeerId {
        self.next_id += 1;
        PeerId(self.next_id)
    }

    /// Insert an entry under its link's handle
    pub fn insert(&mut self, entry: PeerEntry) {
        self.peers.insert(entry.link.id(), entry);
    }

    /// Look up a peer by handle
    pub fn get(&self, id: PeerId) -> Option<&PeerEntry> {
        self.peers.get(&id)
    }

    /// True when any peer has this exact address string
    pub fn contains_addr(&self, addr: &str) -> bool {
        self.peers.values().any(|p| p.link.addr() == addr)
    }

    /// First peer whose address matches exactly
    pub fn find_by_addr(&self, addr: &str) -> Option<&PeerEntry> {
        self.peers.values().find(|p| p.link.addr() == addr)
    }

    /// Peers in registration order
    pub fn iter(&self) -> impl Iterator<Item = &PeerEntry> {
        self.peers.values()
    }

    /// Peer handles in registration order
    pub fn ids(&self) -> impl Iterator<Item = PeerId> + '_ {
        self.peers.keys().copied()
    }

    /// Addresses this node dialed, the ones worth advertising
    pub fn dialable_addresses(&self) -> Vec<String> {
        self.peers
            .values()
            .filter(|p| p.outbound)
            .map(|p| p.link.addr().to_string())
            .collect()
    }

    /// Number of registered peers
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    /// True when no peer is registered
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rumor_transport::link_event_channel;
    use rumor_wire::MAX_PAYLOAD;

    fn dud_link(id: PeerId, addr: &str) -> PeerLink {
        // Unresolvable host; the connect task fails in the background
        // while the handle stays usable for registry bookkeeping
        let (tx, _rx) = link_event_channel();
        PeerLink::connect(id, addr.to_string(), tx, MAX_PAYLOAD)
    }

    #[tokio::test]
    async fn test_allocate_is_monotonic() {
        let mut registry = PeerRegistry::new();
        let a = registry.allocate();
        let b = registry.allocate();
        assert!(b > a);
        assert_ne!(a, PeerId::ZERO);
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let mut registry = PeerRegistry::new();
        let id = registry.allocate();
        registry.insert(PeerEntry {
            link: dud_link(id, "peer-a:1000"),
            outbound: true,
        });

        assert_eq!(registry.len(), 1);
        assert!(registry.contains_addr("peer-a:1000"));
        assert!(!registry.contains_addr("peer-a:10"));
        assert_eq!(registry.get(id).unwrap().link.addr(), "peer-a:1000");
        assert!(registry.find_by_addr("peer-a:1000").is_some());
    }

    #[tokio::test]
    async fn test_iteration_follows_registration_order() {
        let mut registry = PeerRegistry::new();
        for name in ["first:1", "second:2", "third:3"] {
            let id = registry.allocate();
            registry.insert(PeerEntry {
                link: dud_link(id, name),
                outbound: true,
            });
        }

        let addrs: Vec<&str> = registry.iter().map(|p| p.link.addr()).collect();
        assert_eq!(addrs, vec!["first:1", "second:2", "third:3"]);
    }

    #[tokio::test]
    async fn test_dialable_excludes_inbound() {
        let mut registry = PeerRegistry::new();
        let out = registry.allocate();
        registry.insert(PeerEntry {
            link: dud_link(out, "dialed:7000"),
            outbound: true,
        });
        let inb = registry.allocate();
        registry.insert(PeerEntry {
            link: dud_link(inb, "accepted:9999"),
            outbound: false,
        });

        assert_eq!(registry.dialable_addresses(), vec!["dialed:7000"]);
    }
}
