//! Flow-to-band priority policies.

use serde::Serialize;

/// How a sender picks the TOS byte for its next segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityPolicy {
    /// Fixed per flow: four bands per size bucket, smaller flows more urgent.
    SizeBucket,
    /// `floor(log2(remaining bytes))`, so a flow grows more urgent as it
    /// nears completion.
    RemainingSize,
    /// Every flow in the same band, as plain TCP would see the switch.
    Constant(u32),
}

impl PriorityPolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "bucket" | "size-bucket" => Some(PriorityPolicy::SizeBucket),
            "remaining" | "remaining-size" => Some(PriorityPolicy::RemainingSize),
            other => other.parse().ok().map(PriorityPolicy::Constant),
        }
    }

    /// Band for a flow in `bucket` with `remaining` bytes left, clamped to
    /// `bands - 1`.
    pub fn band(&self, bucket: usize, remaining: u64, bands: usize) -> u32 {
        let max = bands.saturating_sub(1) as u32;
        let raw = match self {
            PriorityPolicy::SizeBucket => (bucket as u32).saturating_mul(4),
            PriorityPolicy::RemainingSize => remaining.max(1).ilog2(),
            PriorityPolicy::Constant(band) => *band,
        };
        raw.min(max)
    }
}
