//! # Workload Generation
//!
//! Web-search style flow mix: each host runs `flows_per_host` flows whose
//! sizes cycle through eight log-spaced buckets from 10^6.5 to 10^7.2
//! bytes. The seed only jitters start times, so two runs with the same seed
//! produce the same flows.

use rand::RngExt as _;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;

/// Number of flow-size buckets.
pub const NUM_BUCKETS: usize = 8;

/// Size of a flow in `bucket` (`10^(6.5 + 0.1 * bucket)` bytes).
pub fn bucket_size(bucket: usize) -> u64 {
    let exp = 6.5 + 0.1 * (bucket % NUM_BUCKETS) as f64;
    10f64.powf(exp) as u64
}

/// Parameters for [`generate`].
#[derive(Debug, Clone)]
pub struct WorkloadConfig {
    pub seed: u64,
    /// Sending hosts. Each injects at most one frame per link quantum.
    pub hosts: usize,
    pub flows_per_host: usize,
    /// Flow start times are drawn uniformly from `0..=start_spread` ticks.
    pub start_spread: u64,
    /// Divides every bucket size, to keep small runs quick.
    pub size_divisor: u64,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            hosts: 2,
            flows_per_host: 8,
            start_spread: 0,
            size_divisor: 1,
        }
    }
}

/// One flow to simulate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowSpec {
    pub id: u32,
    pub host: usize,
    pub bucket: usize,
    pub size: u64,
    pub start_tick: u64,
}

/// Flows ordered by id. Host `h` owns ids `h * flows_per_host ..`.
pub fn generate(cfg: &WorkloadConfig) -> Vec<FlowSpec> {
    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let divisor = cfg.size_divisor.max(1);
    let mut flows = Vec::with_capacity(cfg.hosts * cfg.flows_per_host);

    for host in 0..cfg.hosts {
        for j in 0..cfg.flows_per_host {
            let bucket = j % NUM_BUCKETS;
            let start_tick = if cfg.start_spread == 0 {
                0
            } else {
                rng.random_range(0..=cfg.start_spread)
            };
            flows.push(FlowSpec {
                id: flows.len() as u32,
                host,
                bucket,
                size: (bucket_size(bucket) / divisor).max(1),
                start_tick,
            });
        }
    }
    flows
}
