//! Rumor Diffusion - Epidemic propagation machinery
//!
//! The pieces the engine consults to decide where a message goes next:
//! - BloomFilter: append-only dedup of already-seen message ids
//! - RoutingTable: deterministic delivery for announced topics
//! - FloodPolicy: probabilistic fan-out when no route exists

pub mod bloom;
pub mod flood;
pub mod routing;

pub use bloom::*;
pub use flood::*;
pub use routing::*;
