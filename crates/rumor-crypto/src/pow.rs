//! Proof-of-work admission primitive
//!
//! A nonce satisfies a challenge when the hex digest of
//! SHA-256(challenge || nonce) starts with `difficulty` zero characters.
//! The nonce travels as a decimal string.

use sha2::{Digest, Sha256};

/// Search for a nonce satisfying the challenge at the given difficulty.
///
/// Scans nonces `0..max_iterations` and returns `None` when the budget
/// runs out before a satisfying nonce appears.
pub fn compute_proof_of_work(
    challenge: &str,
    difficulty: usize,
    max_iterations: u64,
) -> Option<String> {
    for nonce in 0..max_iterations {
        if digest_has_leading_zeros(challenge, nonce, difficulty) {
            return Some(nonce.to_string());
        }
    }
    None
}

/// Check a claimed nonce against the challenge.
///
/// A nonce that is not a decimal u64 never verifies.
pub fn verify_proof_of_work(challenge: &str, nonce: &str, difficulty: usize) -> bool {
    match nonce.parse::<u64>() {
        Ok(n) => digest_has_leading_zeros(challenge, n, difficulty),
        Err(_) => false,
    }
}

fn digest_has_leading_zeros(challenge: &str, nonce: u64, difficulty: usize) -> bool {
    let mut hasher = Sha256::new();
    hasher.update(challenge.as_bytes());
    hasher.update(nonce.to_string().as_bytes());
    let digest = hex::encode(hasher.finalize());
    difficulty <= digest.len() && digest.as_bytes()[..difficulty].iter().all(|&b| b == b'0')
}
