//! Drop-tail FIFO baseline.
//!
//! Ignores priorities: arrivals join one queue and are rejected once the
//! queue holds `limit` packets.

use std::collections::VecDeque;

use pfabric_core::{ConfigUpdate, DropReason, Packet, Qdisc, SchedulerError, Verdict};
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, Serialize)]
pub struct FifoStats {
    pub accepted: u64,
    pub dropped: u64,
    pub evicted: u64,
    pub dequeued: u64,
}

#[derive(Debug)]
pub struct DropTailFifo {
    queue: VecDeque<Packet>,
    limit: u32,
    dequeue_enabled: bool,
    stats: FifoStats,
}

impl DropTailFifo {
    pub fn new(limit: u32) -> Self {
        info!(limit, "drop-tail fifo initialized");
        DropTailFifo {
            queue: VecDeque::with_capacity(limit as usize),
            limit,
            dequeue_enabled: true,
            stats: FifoStats::default(),
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn stats(&self) -> &FifoStats {
        &self.stats
    }
}

impl Qdisc for DropTailFifo {
    fn id(&self) -> &'static str {
        "pfifo"
    }

    fn enqueue(&mut self, packet: Packet) -> Result<Verdict, SchedulerError> {
        if self.queue.len() >= self.limit as usize {
            debug!(queued = self.queue.len(), "fifo full, dropping");
            self.stats.dropped += 1;
            return Ok(Verdict::Dropped(DropReason::BufferFull));
        }
        self.queue.push_back(packet);
        self.stats.accepted += 1;
        Ok(Verdict::Accepted)
    }

    fn dequeue(&mut self) -> Option<Packet> {
        if !self.dequeue_enabled {
            return None;
        }
        let packet = self.queue.pop_front()?;
        self.stats.dequeued += 1;
        Some(packet)
    }

    fn peek(&self) -> Option<&Packet> {
        self.queue.front()
    }

    /// Drops the most recent arrival.
    fn drop_one(&mut self) -> Result<usize, SchedulerError> {
        let Some(packet) = self.queue.pop_back() else {
            return Err(SchedulerError::Inconsistent {
                queued: 0,
                limit: self.limit,
            });
        };
        self.stats.evicted += 1;
        Ok(packet.len())
    }

    fn reconfigure(&mut self, update: ConfigUpdate) {
        if let Some(limit) = update.limit {
            self.limit = limit;
        }
        if let Some(enabled) = update.dequeue_enabled {
            self.dequeue_enabled = enabled;
        }
    }

    fn reset(&mut self) {
        self.queue.clear();
        self.stats = FifoStats::default();
    }

    fn len(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn pkt(band: u32) -> Packet {
        Packet::new(band, Bytes::from_static(b"seg"))
    }

    #[test]
    fn arrival_order_regardless_of_priority() {
        let mut q = DropTailFifo::new(10);
        for band in [5, 0, 9] {
            assert_eq!(q.enqueue(pkt(band)).unwrap(), Verdict::Accepted);
        }
        let order: Vec<u32> = std::iter::from_fn(|| q.dequeue())
            .filter_map(|p| p.band())
            .collect();
        assert_eq!(order, vec![5, 0, 9]);
    }

    #[test]
    fn full_queue_drops_even_urgent() {
        let mut q = DropTailFifo::new(1);
        q.enqueue(pkt(9)).unwrap();
        assert_eq!(
            q.enqueue(pkt(0)).unwrap(),
            Verdict::Dropped(DropReason::BufferFull)
        );
        assert_eq!(q.stats().dropped, 1);
        assert_eq!(q.peek().and_then(Packet::band), Some(9));
    }

    #[test]
    fn drop_one_and_gate() {
        let mut q = DropTailFifo::new(4);
        assert!(q.drop_one().is_err());
        q.enqueue(pkt(1)).unwrap();
        q.enqueue(pkt(2)).unwrap();
        assert_eq!(q.drop_one().unwrap(), 3);
        q.reconfigure(ConfigUpdate::dequeue_enabled(false));
        assert!(q.dequeue().is_none());
        q.reconfigure(ConfigUpdate::dequeue_enabled(true));
        assert_eq!(q.dequeue().and_then(|p| p.band()), Some(1));
        q.reset();
        assert!(q.is_empty());
    }
}
