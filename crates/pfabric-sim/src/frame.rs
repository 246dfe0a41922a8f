//! # Simulated Frames
//!
//! Minimal Ethernet + IPv4 frames carrying one flow segment. The scheduler
//! band comes from the IPv4 TOS byte; anything shorter than the two headers
//! is treated as non-IP and left untagged.
//!
//! ```text
//!  0             14                    34        38        42
//! +--------------+---------------------+---------+---------+-----------+
//! | Ethernet hdr | IPv4 hdr (TOS = pri)| flow id | seq no. | padding   |
//! +--------------+---------------------+---------+---------+-----------+
//! ```

use bytes::{Buf, BufMut, Bytes, BytesMut};
use pfabric_core::{Packet, PriorityTag};

// ─── Constants ───────────────────────────────────────────────────────────────

pub const ETH_HEADER_LEN: usize = 14;
pub const IP_HEADER_LEN: usize = 20;

/// Ethernet + IPv4 header bytes on every frame.
pub const FRAME_OVERHEAD: usize = ETH_HEADER_LEN + IP_HEADER_LEN;

/// Largest frame put on the link.
pub const MTU: usize = 1500;

/// Largest segment payload per frame.
pub const MAX_SEGMENT: usize = MTU - FRAME_OVERHEAD;

/// Flow id + sequence number at the start of the payload.
pub const SEGMENT_TAG_LEN: usize = 8;

const ETHERTYPE_IPV4: u16 = 0x0800;
const IPPROTO_EXPERIMENTAL: u8 = 253;
const SWITCH_ADDR: [u8; 4] = [10, 0, 0, 254];

// ─── Segment ─────────────────────────────────────────────────────────────────

/// One unit of flow data on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub flow: u32,
    pub seq: u32,
    /// Flow bytes carried, at most [`MAX_SEGMENT`].
    pub payload_len: usize,
}

impl Segment {
    /// Encode as a frame from `host` with the given TOS byte.
    pub fn to_frame(&self, host: u8, tos: u8) -> Bytes {
        let payload_len = self.payload_len.clamp(SEGMENT_TAG_LEN, MAX_SEGMENT);
        let total = FRAME_OVERHEAD + payload_len;
        let mut buf = BytesMut::with_capacity(total);

        // Ethernet
        buf.put_slice(&[0x02, 0, 0, 0, 0, 0xfe]);
        buf.put_slice(&[0x02, 0, 0, 0, 0, host]);
        buf.put_u16(ETHERTYPE_IPV4);

        // IPv4
        let ip_start = buf.len();
        buf.put_u8(0x45);
        buf.put_u8(tos);
        buf.put_u16((IP_HEADER_LEN + payload_len) as u16);
        buf.put_u16(self.seq as u16);
        buf.put_u16(0x4000);
        buf.put_u8(64);
        buf.put_u8(IPPROTO_EXPERIMENTAL);
        buf.put_u16(0);
        buf.put_slice(&[10, 0, 0, host.wrapping_add(1)]);
        buf.put_slice(&SWITCH_ADDR);
        let csum = ipv4_checksum(&buf[ip_start..ip_start + IP_HEADER_LEN]);
        buf[ip_start + 10..ip_start + 12].copy_from_slice(&csum.to_be_bytes());

        // Segment tag + padding
        buf.put_u32(self.flow);
        buf.put_u32(self.seq);
        buf.put_bytes(0, payload_len - SEGMENT_TAG_LEN);

        buf.freeze()
    }

    /// Decode the segment tag of a frame built by [`Segment::to_frame`].
    /// `payload_len` is what the frame carries on the wire.
    pub fn from_frame(frame: &[u8]) -> Option<Self> {
        if frame.len() < FRAME_OVERHEAD + SEGMENT_TAG_LEN {
            return None;
        }
        if u16::from_be_bytes([frame[12], frame[13]]) != ETHERTYPE_IPV4 {
            return None;
        }
        let mut tag = &frame[FRAME_OVERHEAD..];
        let flow = tag.get_u32();
        let seq = tag.get_u32();
        Some(Segment {
            flow,
            seq,
            payload_len: frame.len() - FRAME_OVERHEAD,
        })
    }
}

// ─── Classification ──────────────────────────────────────────────────────────

/// Priority of a frame: the IPv4 TOS byte, or untagged for frames too short
/// to hold an IPv4 header.
pub fn classify(frame: &[u8]) -> PriorityTag {
    if frame.len() < FRAME_OVERHEAD {
        return PriorityTag::Untagged;
    }
    PriorityTag::Band(u32::from(frame[ETH_HEADER_LEN + 1]))
}

/// Wrap a frame as a scheduler packet, tagged by [`classify`].
pub fn to_packet(frame: Bytes) -> Packet {
    let tag = classify(&frame);
    Packet::new(tag, frame)
}

fn ipv4_checksum(header: &[u8]) -> u16 {
    let mut sum: u32 = header
        .chunks_exact(2)
        .map(|w| u32::from(u16::from_be_bytes([w[0], w[1]])))
        .sum();
    while sum >> 16 != 0 {
        sum = (sum & 0xffff) + (sum >> 16);
    }
    !(sum as u16)
}
