//! Append-only dedup filter
//!
//! Already-seen message ids are remembered in a bloom filter: k bit
//! positions per key, all derived from one SHA-256 base hash perturbed by
//! the slot index. Slots are therefore correlated rather than independent;
//! that is the accepted trade-off, kept as-is. There is no removal: under
//! sustained traffic the filter drifts toward its false-positive ceiling,
//! so `expected_count` wants generous sizing (or operator-level rotation).

use sha2::{Digest, Sha256};

/// Bits reserved per expected key
const BITS_PER_KEY: usize = 10;

/// Append-only probabilistic membership set
///
/// False positives possible, false negatives impossible.
#[derive(Debug, Clone)]
pub struct BloomFilter {
    bits: Vec<u64>,
    size: usize,
    hash_count: usize,
}

impl BloomFilter {
    /// Filter sized for `expected_count` keys, `hash_count` slots per key
    pub fn new(expected_count: usize, hash_count: usize) -> Self {
        let size = (expected_count * BITS_PER_KEY).max(1);
        BloomFilter {
            bits: vec![0u64; (size + 63) / 64],
            size,
            hash_count,
        }
    }

    /// Mark a key as seen
    pub fn add(&mut self, key: &str) {
        let base = base_hash(key);
        for slot in 0..self.hash_count {
            let bit = self.slot_index(base, slot);
            self.bits[bit / 64] |= 1 << (bit % 64);
        }
    }

    /// Membership test; true may be a false positive, false is definite
    pub fn probably_contains(&self, key: &str) -> bool {
        let base = base_hash(key);
        (0..self.hash_count).all(|slot| {
            let bit = self.slot_index(base, slot);
            self.bits[bit / 64] & (1 << (bit % 64)) != 0
        })
    }

    /// Number of bits in the filter
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    // hash(key, slot) = (base_hash(key) + slot) mod size
    #[inline]
    fn slot_index(&self, base: u64, slot: usize) -> usize {
        (base.wrapping_add(slot as u64) % self.size as u64) as usize
    }
}

/// First 8 bytes of SHA-256 over the key, read big-endian
fn base_hash(key: &str) -> u64 {
    let digest = Sha256::digest(key.as_bytes());
    u64::from_be_bytes(digest[..8].try_into().unwrap())
}
