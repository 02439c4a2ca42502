//! Engine configuration

use std::time::Duration;

use rumor_diffusion::DEFAULT_FORWARD_BUDGET;
use rumor_wire::MAX_PAYLOAD;

/// Dissemination engine configuration
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Estimated network size driving flood radius, forward probability,
    /// and dedup filter capacity; values below 2 are clamped
    pub estimated_network_size: usize,
    /// Expected forwards per message across the whole network
    pub forward_budget: f64,
    /// Hash probes per key in the dedup filter
    pub bloom_hash_count: usize,
    /// Largest accepted frame payload in bytes
    pub max_payload: usize,
    /// Delay between bootstrap connects and the first peer request
    pub bootstrap_grace: Duration,
    /// Interval between periodic peer list refreshes
    pub refresh_interval: Duration,
    /// Seed for the forwarding coin; `None` draws from the OS
    pub rng_seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            estimated_network_size: 1000,
            forward_budget: DEFAULT_FORWARD_BUDGET,
            bloom_hash_count: 5,
            max_payload: MAX_PAYLOAD,
            bootstrap_grace: Duration::from_secs(1),
            refresh_interval: Duration::from_secs(300),
            rng_seed: None,
        }
    }
}
