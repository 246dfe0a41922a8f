//! # Packets
//!
//! The scheduler treats payloads as opaque. A [`Packet`] pairs a payload
//! with the priority resolved by header inspection and the byte length used
//! for accounting.

use bytes::Bytes;

// ─── PriorityTag ─────────────────────────────────────────────────────────────

/// Priority assigned to a packet before it reaches the scheduler.
///
/// Lower values are more urgent. `Untagged` means header inspection could not
/// determine a priority (e.g. a non-IP frame); the scheduler places such
/// packets in its fallback band and counts them separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriorityTag {
    Band(u32),
    Untagged,
}

impl PriorityTag {
    pub fn band(&self) -> Option<u32> {
        match self {
            PriorityTag::Band(band) => Some(*band),
            PriorityTag::Untagged => None,
        }
    }
}

impl From<u32> for PriorityTag {
    fn from(band: u32) -> Self {
        PriorityTag::Band(band)
    }
}

// ─── Packet ──────────────────────────────────────────────────────────────────

/// A packet handed to the scheduler. Ownership moves into the scheduler on
/// admission and back out on dequeue; evicted packets are released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    payload: Bytes,
    tag: PriorityTag,
    len: usize,
}

impl Packet {
    /// Create a packet whose accounted length is the payload length.
    pub fn new(tag: impl Into<PriorityTag>, payload: Bytes) -> Self {
        let len = payload.len();
        Packet {
            payload,
            tag: tag.into(),
            len,
        }
    }

    /// Create a packet with no priority information.
    pub fn untagged(payload: Bytes) -> Self {
        Packet::new(PriorityTag::Untagged, payload)
    }

    /// Override the accounted length (e.g. wire length including headers
    /// that are not part of `payload`).
    pub fn with_len(mut self, len: usize) -> Self {
        self.len = len;
        self
    }

    pub fn tag(&self) -> PriorityTag {
        self.tag
    }

    /// Resolved band, if the packet carries one.
    pub fn band(&self) -> Option<u32> {
        self.tag.band()
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn into_payload(self) -> Bytes {
        self.payload
    }

    /// Accounted length in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn resolve(&mut self, band: u32) {
        self.tag = PriorityTag::Band(band);
    }
}
