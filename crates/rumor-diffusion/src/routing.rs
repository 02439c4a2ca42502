//! Topic routing table
//!
//! Maps a category to the peers that announced interest in it. Buckets
//! keep insertion order and allow repeats via `add_peer`; an interest
//! update replaces every bucket membership for that peer at once.

use std::collections::HashMap;

use rumor_core::PeerId;

/// Category -> ordered peer handles
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    buckets: HashMap<String, Vec<PeerId>>,
}

impl RoutingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a peer to a category bucket; repeats are not deduped
    pub fn add_peer(&mut self, category: &str, peer: PeerId) {
        self.buckets.entry(category.to_string()).or_default().push(peer);
    }

    /// Peers registered for a category, in insertion order
    ///
    /// Unknown categories yield an empty slice.
    pub fn peers_for_category(&self, category: &str) -> &[PeerId] {
        self.buckets.get(category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Replace a peer's interests: drop it from every bucket, then add it
    /// to each listed category
    pub fn update_peer_interests(&mut self, peer: PeerId, categories: &[&str]) {
        for bucket in self.buckets.values_mut() {
            bucket.retain(|p| *p != peer);
        }
        for category in categories {
            self.add_peer(category, peer);
        }
    }

    /// Number of categories with at least one registered peer
    pub fn category_count(&self) -> usize {
        self.buckets.values().filter(|b| !b.is_empty()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_lookup() {
        let mut table = RoutingTable::new();
        table.add_peer("memes", PeerId::new(1));
        table.add_peer("memes", PeerId::new(2));
        assert_eq!(table.peers_for_category("memes"), &[PeerId::new(1), PeerId::new(2)]);
    }

    #[test]
    fn test_unknown_category_is_empty() {
        let table = RoutingTable::new();
        assert!(table.peers_for_category("nothing").is_empty());
    }

    #[test]
    fn test_repeats_are_kept() {
        let mut table = RoutingTable::new();
        table.add_peer("memes", PeerId::new(1));
        table.add_peer("memes", PeerId::new(1));
        assert_eq!(table.peers_for_category("memes").len(), 2);
    }

    #[test]
    fn test_interest_update_replaces_everywhere() {
        let mut table = RoutingTable::new();
        let peer = PeerId::new(1);
        let other = PeerId::new(2);
        table.add_peer("old", peer);
        table.add_peer("old", other);
        table.add_peer("stale", peer);

        table.update_peer_interests(peer, &["a", "b"]);

        assert_eq!(table.peers_for_category("a"), &[peer]);
        assert_eq!(table.peers_for_category("b"), &[peer]);
        assert_eq!(table.peers_for_category("old"), &[other]);
        assert!(table.peers_for_category("stale").is_empty());
    }

    #[test]
    fn test_interest_update_with_no_categories_clears() {
        let mut table = RoutingTable::new();
        let peer = PeerId::new(1);
        table.add_peer("a", peer);
        table.update_peer_interests(peer, &[]);
        assert!(table.peers_for_category("a").is_empty());
    }
}
