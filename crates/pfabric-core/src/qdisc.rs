//! Capability interface for queueing disciplines.
//!
//! Host integrations drive any discipline through this trait, so the pFabric
//! core and simpler baselines (see the simulator's drop-tail FIFO) are
//! interchangeable behind the same glue.

use crate::config::ConfigUpdate;
use crate::error::SchedulerError;
use crate::packet::Packet;
use crate::scheduler::{SchedulerCore, Verdict};
use crate::stats::StatsSink;

pub trait Qdisc {
    /// Short identifier, as a configuration tool would name it.
    fn id(&self) -> &'static str;

    fn enqueue(&mut self, packet: Packet) -> Result<Verdict, SchedulerError>;

    fn dequeue(&mut self) -> Option<Packet>;

    fn peek(&self) -> Option<&Packet>;

    /// Force one eviction. Returns the released length in bytes.
    fn drop_one(&mut self) -> Result<usize, SchedulerError>;

    fn reconfigure(&mut self, update: ConfigUpdate);

    fn reset(&mut self);

    /// Packets currently queued.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S: StatsSink> Qdisc for SchedulerCore<S> {
    fn id(&self) -> &'static str {
        "pfabric"
    }

    fn enqueue(&mut self, packet: Packet) -> Result<Verdict, SchedulerError> {
        SchedulerCore::enqueue(self, packet)
    }

    fn dequeue(&mut self) -> Option<Packet> {
        SchedulerCore::dequeue(self)
    }

    fn peek(&self) -> Option<&Packet> {
        SchedulerCore::peek(self)
    }

    fn drop_one(&mut self) -> Result<usize, SchedulerError> {
        SchedulerCore::drop_one(self)
    }

    fn reconfigure(&mut self, update: ConfigUpdate) {
        SchedulerCore::reconfigure(self, update)
    }

    fn reset(&mut self) {
        SchedulerCore::reset(self)
    }

    fn len(&self) -> usize {
        SchedulerCore::len(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn drive(q: &mut dyn Qdisc) -> Vec<u32> {
        for band in [4, 1, 3] {
            q.enqueue(Packet::new(band, Bytes::new())).unwrap();
        }
        std::iter::from_fn(|| q.dequeue())
            .filter_map(|p| p.band())
            .collect()
    }

    #[test]
    fn scheduler_core_through_trait_object() {
        let mut sch = SchedulerCore::init(10, true);
        assert_eq!(Qdisc::id(&sch), "pfabric");
        assert_eq!(drive(&mut sch), vec![1, 3, 4]);
        assert!(Qdisc::is_empty(&sch));
    }

    #[test]
    fn trait_reconfigure_and_reset() {
        let mut sch = SchedulerCore::init(10, true);
        let q: &mut dyn Qdisc = &mut sch;
        q.reconfigure(ConfigUpdate::dequeue_enabled(false));
        q.enqueue(Packet::new(0, Bytes::new())).unwrap();
        assert!(q.dequeue().is_none());
        assert!(q.peek().is_some());
        q.reset();
        assert_eq!(q.len(), 0);
    }
}
