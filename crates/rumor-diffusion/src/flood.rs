//! Flood fallback policy
//!
//! When a message's group has no routed peers it is flooded: up to
//! `flood_radius` candidate peers are considered, each forwarded to
//! independently with probability `min(1, C / N)`. The budget C bounds
//! expected forwards per hop regardless of network size, giving epidemic
//! coverage in O(log N) hops at a rate independent of N.

use rand::Rng;

/// Default per-hop forward budget (the C constant)
pub const DEFAULT_FORWARD_BUDGET: f64 = 1000.0;

/// Probabilistic flood parameters
#[derive(Debug, Clone, Copy)]
pub struct FloodPolicy {
    estimated_size: usize,
    forward_budget: f64,
}

impl FloodPolicy {
    /// Policy for an estimated network size
    ///
    /// Sizes below 2 are meaningless for the radius math and are clamped.
    pub fn new(estimated_size: usize, forward_budget: f64) -> Self {
        FloodPolicy {
            estimated_size: estimated_size.max(2),
            forward_budget: forward_budget.max(0.0),
        }
    }

    /// Candidate peers considered per flood: ceil(log2(N))
    pub fn flood_radius(&self) -> usize {
        (self.estimated_size as f64).log2().ceil() as usize
    }

    /// Per-peer forward probability: min(1, C / N)
    pub fn forward_probability(&self) -> f64 {
        (self.forward_budget / self.estimated_size as f64).min(1.0)
    }

    /// One independent forwarding coin flip
    pub fn should_forward<R: Rng>(&self, rng: &mut R) -> bool {
        rng.gen_bool(self.forward_probability())
    }

    #[inline]
    pub fn estimated_size(&self) -> usize {
        self.estimated_size
    }
}

impl Default for FloodPolicy {
    fn default() -> Self {
        FloodPolicy::new(1000, DEFAULT_FORWARD_BUDGET)
    }
}
