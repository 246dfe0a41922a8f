//! # Band Queues
//!
//! A fixed array of FIFO queues, one per band. Bands are independent; there
//! is no ordering between packets of different bands at this level.

use std::collections::VecDeque;

use crate::packet::Packet;

/// Per-band FIFO queues.
#[derive(Debug, Clone)]
pub struct BandQueues {
    queues: Vec<VecDeque<Packet>>,
}

impl BandQueues {
    pub fn new(bands: usize) -> Self {
        BandQueues {
            queues: (0..bands).map(|_| VecDeque::new()).collect(),
        }
    }

    pub fn bands(&self) -> usize {
        self.queues.len()
    }

    /// Append a packet to the tail of `band`.
    pub fn push_tail(&mut self, band: usize, packet: Packet) {
        self.queues[band].push_back(packet);
    }

    /// Remove the oldest packet of `band`.
    pub fn pop_head(&mut self, band: usize) -> Option<Packet> {
        self.queues.get_mut(band)?.pop_front()
    }

    /// Oldest packet of `band`, without removing it.
    pub fn peek_head(&self, band: usize) -> Option<&Packet> {
        self.queues.get(band)?.front()
    }

    pub fn is_empty(&self, band: usize) -> bool {
        self.queues.get(band).is_none_or(VecDeque::is_empty)
    }

    pub fn len(&self, band: usize) -> usize {
        self.queues.get(band).map_or(0, VecDeque::len)
    }

    /// Total packets across all bands.
    pub fn total_len(&self) -> usize {
        self.queues.iter().map(VecDeque::len).sum()
    }

    /// Release every packet of `band`. Returns `(packets, bytes)` released.
    pub fn drain(&mut self, band: usize) -> (usize, u64) {
        let Some(queue) = self.queues.get_mut(band) else {
            return (0, 0);
        };
        let packets = queue.len();
        let bytes = queue.drain(..).map(|p| p.len() as u64).sum();
        (packets, bytes)
    }

    /// Release every packet of every band. Returns `(packets, bytes)` released.
    pub fn drain_all(&mut self) -> (usize, u64) {
        (0..self.queues.len()).fold((0, 0), |(packets, bytes), band| {
            let (p, b) = self.drain(band);
            (packets + p, bytes + b)
        })
    }

    /// Packets of `band` in arrival order.
    pub fn iter(&self, band: usize) -> impl Iterator<Item = &Packet> {
        self.queues.get(band).into_iter().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn pkt(band: u32, tag: &'static [u8]) -> Packet {
        Packet::new(band, Bytes::from_static(tag))
    }

    #[test]
    fn fifo_within_band() {
        let mut queues = BandQueues::new(4);
        queues.push_tail(2, pkt(2, b"a"));
        queues.push_tail(2, pkt(2, b"b"));
        queues.push_tail(2, pkt(2, b"c"));

        assert_eq!(queues.peek_head(2).unwrap().payload(), &b"a"[..]);
        assert_eq!(queues.pop_head(2).unwrap().payload(), &b"a"[..]);
        assert_eq!(queues.pop_head(2).unwrap().payload(), &b"b"[..]);
        assert_eq!(queues.pop_head(2).unwrap().payload(), &b"c"[..]);
        assert!(queues.pop_head(2).is_none());
        assert!(queues.is_empty(2));
    }

    #[test]
    fn bands_are_independent() {
        let mut queues = BandQueues::new(4);
        queues.push_tail(0, pkt(0, b"x"));
        queues.push_tail(3, pkt(3, b"y"));
        assert_eq!(queues.len(0), 1);
        assert_eq!(queues.len(1), 0);
        assert_eq!(queues.len(3), 1);
        assert_eq!(queues.total_len(), 2);

        queues.pop_head(3);
        assert!(queues.is_empty(3));
        assert!(!queues.is_empty(0));
    }

    #[test]
    fn drain_releases_band() {
        let mut queues = BandQueues::new(2);
        queues.push_tail(1, pkt(1, b"abcd"));
        queues.push_tail(1, pkt(1, b"ef"));
        queues.push_tail(0, pkt(0, b"g"));

        assert_eq!(queues.drain(1), (2, 6));
        assert!(queues.is_empty(1));
        assert_eq!(queues.drain_all(), (1, 1));
        assert_eq!(queues.total_len(), 0);
    }

    #[test]
    fn out_of_range_band_reads_as_empty() {
        let mut queues = BandQueues::new(2);
        assert!(queues.is_empty(9));
        assert_eq!(queues.len(9), 0);
        assert!(queues.pop_head(9).is_none());
        assert!(queues.peek_head(9).is_none());
        assert_eq!(queues.drain(9), (0, 0));
    }
}
