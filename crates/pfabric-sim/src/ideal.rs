//! # Ideal SRPT Schedule
//!
//! Reference schedule for a single bottleneck link: every quantum (one MTU
//! frame time) the link carries one frame of the started flow with the
//! fewest remaining bytes. Ties go to the lowest flow index. Completion
//! times from this schedule, and from a flow alone on the link, are the
//! baselines simulated completion times are normalised against.

use serde::Serialize;

use crate::frame::{FRAME_OVERHEAD, MTU};

// ─── Link ────────────────────────────────────────────────────────────────────

/// Bottleneck link parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinkModel {
    pub bandwidth_bps: f64,
    pub mtu: usize,
    pub frame_overhead: usize,
}

impl Default for LinkModel {
    fn default() -> Self {
        Self {
            bandwidth_bps: 100e6,
            mtu: MTU,
            frame_overhead: FRAME_OVERHEAD,
        }
    }
}

impl LinkModel {
    pub fn with_mbit(mbit: f64) -> Self {
        Self {
            bandwidth_bps: mbit * 1e6,
            ..Self::default()
        }
    }

    /// Seconds to serialise one full frame.
    pub fn quantum_secs(&self) -> f64 {
        (self.mtu as f64 * 8.0) / self.bandwidth_bps
    }

    /// Flow bytes per full frame.
    pub fn payload_per_frame(&self) -> u64 {
        self.mtu.saturating_sub(self.frame_overhead).max(1) as u64
    }

    /// Quanta a flow of `size` bytes needs with the link to itself.
    pub fn alone_quanta(&self, size: u64) -> u64 {
        size.div_ceil(self.payload_per_frame()).max(1)
    }

    pub fn alone_secs(&self, size: u64) -> f64 {
        self.alone_quanta(size) as f64 * self.quantum_secs()
    }
}

// ─── Schedule ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdealFlow {
    pub size: u64,
    /// Eligible from the quantum after this one.
    pub start_quantum: u64,
}

/// Completion time of each flow in quanta, measured from its start.
pub fn srpt_completion_quanta(link: &LinkModel, flows: &[IdealFlow]) -> Vec<u64> {
    let per_frame = link.payload_per_frame();
    let mut remaining: Vec<u64> = flows.iter().map(|f| f.size.max(1)).collect();
    let mut completion = vec![0u64; flows.len()];
    let mut pending = flows.len();
    let mut time = 0u64;

    while pending > 0 {
        time += 1;
        let next = remaining
            .iter()
            .enumerate()
            .filter(|&(i, &r)| r > 0 && flows[i].start_quantum < time)
            .min_by_key(|&(i, &r)| (r, i))
            .map(|(i, _)| i);

        let Some(i) = next else {
            // Idle link until the next start.
            if let Some(start) = flows
                .iter()
                .zip(&remaining)
                .filter(|(_, &r)| r > 0)
                .map(|(f, _)| f.start_quantum)
                .min()
            {
                time = time.max(start);
            }
            continue;
        };

        remaining[i] -= per_frame.min(remaining[i]);
        if remaining[i] == 0 {
            completion[i] = time - flows[i].start_quantum;
            pending -= 1;
        }
    }
    completion
}

/// [`srpt_completion_quanta`] in seconds.
pub fn srpt_completion_secs(link: &LinkModel, flows: &[IdealFlow]) -> Vec<f64> {
    let q = link.quantum_secs();
    srpt_completion_quanta(link, flows)
        .into_iter()
        .map(|c| c as f64 * q)
        .collect()
}
