//! # Scheduler Core
//!
//! Owns the band queues and the occupancy index, enforces the buffer limit
//! and serves packets in strict priority order.
//!
//! Admission under pressure works in two steps. When the buffer already
//! holds `limit` packets, an arrival that is no more urgent than the least
//! urgent queued packet is rejected outright. Anything else is queued, and
//! if that pushes the backlog past `limit` the drop procedure evicts one
//! packet from the least urgent band, which may be the arrival itself. The
//! backlog is therefore back at `limit` before `enqueue` returns.
//!
//! The core does no locking. Wrap it in [`SharedQdisc`](crate::shared::SharedQdisc)
//! when more than one thread needs access.

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::band::BandQueues;
use crate::config::{ConfigUpdate, SchedulerConfig};
use crate::error::{ConfigError, SchedulerError};
use crate::occupancy::OccupancyIndex;
use crate::packet::{Packet, PriorityTag};
use crate::stats::{NullSink, SchedulerEvent, SchedulerStats, StatsSink};

// ─── Results ─────────────────────────────────────────────────────────────────

/// Why a packet was rejected without being queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Priority outside `0..bands`.
    IllegalPriority,
    /// Buffer full and the packet would not displace any queued packet.
    BufferFull,
}

/// Outcome of an enqueue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// Queued; the buffer is within its limit.
    Accepted,
    /// Queued, then one packet was evicted to restore the limit. The caller
    /// should back off as if facing congestion.
    Congested,
    /// Never queued.
    Dropped(DropReason),
}

impl Verdict {
    pub fn is_queued(&self) -> bool {
        !matches!(self, Verdict::Dropped(_))
    }
}

// ─── SchedulerCore ───────────────────────────────────────────────────────────

/// pFabric scheduler state.
#[derive(Debug)]
pub struct SchedulerCore<S: StatsSink = NullSink> {
    config: SchedulerConfig,
    queues: BandQueues,
    occupancy: OccupancyIndex,
    queued: usize,
    queued_bytes: u64,
    stats: SchedulerStats,
    sink: S,
}

impl SchedulerCore<NullSink> {
    /// Scheduler with the default band layout and the given limit and gate.
    pub fn init(limit: u32, dequeue_enabled: bool) -> Self {
        let config = SchedulerConfig {
            limit,
            dequeue_enabled,
            ..SchedulerConfig::default()
        };
        Self::build(config, NullSink)
    }

    pub fn new(config: SchedulerConfig) -> Result<Self, ConfigError> {
        Self::with_sink(config, NullSink)
    }
}

impl<S: StatsSink> SchedulerCore<S> {
    pub fn with_sink(config: SchedulerConfig, sink: S) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config, sink))
    }

    fn build(config: SchedulerConfig, sink: S) -> Self {
        info!(
            limit = config.limit,
            bands = config.bands,
            dequeue_enabled = config.dequeue_enabled,
            "pfabric scheduler initialized"
        );
        SchedulerCore {
            queues: BandQueues::new(config.bands),
            occupancy: OccupancyIndex::new(config.bands),
            queued: 0,
            queued_bytes: 0,
            stats: SchedulerStats::new(config.bands, config.limit, config.dequeue_enabled),
            sink,
            config,
        }
    }

    // ─── Enqueue ─────────────────────────────────────────────────────────

    /// Offer a packet, using the configured fallback band for untagged
    /// packets.
    pub fn enqueue(&mut self, packet: Packet) -> Result<Verdict, SchedulerError> {
        let fallback = self.config.fallback_band;
        self.enqueue_with_fallback(packet, fallback)
    }

    /// Offer a packet; untagged packets go to `fallback_band`.
    pub fn enqueue_with_fallback(
        &mut self,
        mut packet: Packet,
        fallback_band: u32,
    ) -> Result<Verdict, SchedulerError> {
        let priority = match packet.tag() {
            PriorityTag::Band(priority) => priority,
            PriorityTag::Untagged => {
                self.stats.non_priority_tagged += 1;
                fallback_band
            }
        };
        let len = packet.len();

        let band = priority as usize;
        if band >= self.config.bands {
            warn!(
                priority,
                bands = self.config.bands,
                "illegal packet priority, discarding"
            );
            self.stats.illegal_priority += 1;
            return Ok(self.hard_drop(Some(priority), DropReason::IllegalPriority, len));
        }
        packet.resolve(priority);
        self.stats.per_band_arrivals[band] += 1;

        let limit = self.config.limit as usize;
        if self.queued >= limit {
            if let Some(lowest) = self.occupancy.lowest_priority_occupied() {
                if lowest <= band {
                    debug!(
                        band,
                        lowest,
                        "buffer full and packet is no more urgent than any queued, dropping"
                    );
                    return Ok(self.hard_drop(Some(priority), DropReason::BufferFull, len));
                }
            }
        }

        self.queues.push_tail(band, packet);
        self.occupancy.mark(band);
        self.queued += 1;
        self.queued_bytes += len as u64;
        self.stats.packets += 1;
        self.stats.bytes += len as u64;
        self.stats.per_band_accepted[band] += 1;

        if self.queued > limit {
            debug!(queued = self.queued, limit, "buffer over limit, evicting");
            let (evicted_band, evicted_len) = self.evict_lowest()?;
            self.stats.congested += 1;
            self.publish(SchedulerEvent::Congested {
                band,
                evicted_band,
                evicted_len,
            });
            return Ok(Verdict::Congested);
        }

        self.stats.accepted += 1;
        self.publish(SchedulerEvent::Accepted { band, len });
        Ok(Verdict::Accepted)
    }

    fn hard_drop(&mut self, priority: Option<u32>, reason: DropReason, len: usize) -> Verdict {
        self.stats.hard_dropped += 1;
        self.publish(SchedulerEvent::Dropped {
            priority,
            reason,
            len,
        });
        Verdict::Dropped(reason)
    }

    // ─── Drop ────────────────────────────────────────────────────────────

    /// Evict the oldest packet of the least urgent band. Returns the
    /// released length in bytes.
    pub fn drop_one(&mut self) -> Result<usize, SchedulerError> {
        let (band, len) = self.evict_lowest()?;
        self.publish(SchedulerEvent::Evicted { band, len });
        Ok(len)
    }

    fn evict_lowest(&mut self) -> Result<(usize, usize), SchedulerError> {
        let Some(band) = self.occupancy.lowest_priority_occupied() else {
            return Err(self.inconsistent("no occupied band to drop from"));
        };
        let Some(packet) = self.take_head(band) else {
            self.occupancy.clear(band);
            return Err(self.inconsistent("occupied band has no packet"));
        };
        self.stats.evicted += 1;
        debug!(band, len = packet.len(), "evicted packet");
        Ok((band, packet.len()))
    }

    fn inconsistent(&mut self, what: &'static str) -> SchedulerError {
        let err = SchedulerError::Inconsistent {
            queued: self.queued,
            limit: self.config.limit,
        };
        error!(
            queued = self.queued,
            limit = self.config.limit,
            "pfabric invariant violated: {what}"
        );
        self.stats.inconsistencies += 1;
        self.publish(SchedulerEvent::Inconsistent {
            queued: self.queued,
            limit: self.config.limit,
        });
        err
    }

    /// Pop the head of `band`, keeping counts and occupancy in step.
    fn take_head(&mut self, band: usize) -> Option<Packet> {
        let packet = self.queues.pop_head(band)?;
        self.queued -= 1;
        self.queued_bytes -= packet.len() as u64;
        if self.queues.is_empty(band) {
            self.occupancy.clear(band);
        }
        Some(packet)
    }

    // ─── Dequeue / Peek ──────────────────────────────────────────────────

    /// Remove the oldest packet of the most urgent non-empty band. Returns
    /// `None` when empty or while dequeue is disabled.
    pub fn dequeue(&mut self) -> Option<Packet> {
        if !self.config.dequeue_enabled {
            return None;
        }
        let band = self.occupancy.highest_priority_occupied()?;
        let Some(packet) = self.take_head(band) else {
            self.occupancy.clear(band);
            self.inconsistent("occupied band has no packet");
            return None;
        };
        self.stats.dequeued += 1;
        self.publish(SchedulerEvent::Dequeued {
            band,
            len: packet.len(),
        });
        Some(packet)
    }

    /// The packet `dequeue` would return, without removing it. Ignores the
    /// dequeue gate unless `peek_honors_gate` is configured.
    pub fn peek(&self) -> Option<&Packet> {
        if self.config.peek_honors_gate && !self.config.dequeue_enabled {
            return None;
        }
        let band = self.occupancy.highest_priority_occupied()?;
        self.queues.peek_head(band)
    }

    // ─── Lifecycle ───────────────────────────────────────────────────────

    /// Update the limit and/or gate. Queued packets are untouched, even if
    /// the new limit is below the current backlog.
    pub fn reconfigure(&mut self, update: ConfigUpdate) {
        if update.is_empty() {
            return;
        }
        self.config.apply(&update);
        self.stats.limit = self.config.limit;
        self.stats.dequeue_enabled = self.config.dequeue_enabled;
        info!(
            limit = self.config.limit,
            dequeue_enabled = self.config.dequeue_enabled,
            queued = self.queued,
            "pfabric scheduler reconfigured"
        );
        self.publish(SchedulerEvent::Reconfigured {
            limit: self.config.limit,
            dequeue_enabled: self.config.dequeue_enabled,
        });
    }

    /// Release every queued packet and zero the counters. Configuration is
    /// kept as is.
    pub fn reset(&mut self) {
        let (released, _) = self.queues.drain_all();
        self.occupancy.clear_all();
        self.queued = 0;
        self.queued_bytes = 0;
        self.stats.clear_counters();
        info!(released, "pfabric scheduler reset");
        self.publish(SchedulerEvent::Reset { released });
    }

    /// Reset, detach the stats sink and consume the scheduler. Returns the
    /// sink and the counters as they stood before the reset.
    pub fn destroy(mut self) -> (S, SchedulerStats) {
        self.sync_snapshot();
        let last = self.stats.clone();
        self.reset();
        self.sink.detach();
        info!("pfabric scheduler destroyed");
        (self.sink, last)
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    /// Packets queued across all bands.
    pub fn len(&self) -> usize {
        self.queued
    }

    pub fn is_empty(&self) -> bool {
        self.queued == 0
    }

    /// Bytes queued across all bands.
    pub fn byte_len(&self) -> u64 {
        self.queued_bytes
    }

    pub fn band_len(&self, band: usize) -> usize {
        self.queues.len(band)
    }

    pub fn bands(&self) -> usize {
        self.config.bands
    }

    pub fn limit(&self) -> u32 {
        self.config.limit
    }

    pub fn dequeue_enabled(&self) -> bool {
        self.config.dequeue_enabled
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn occupancy(&self) -> &OccupancyIndex {
        &self.occupancy
    }

    pub fn stats(&self) -> &SchedulerStats {
        &self.stats
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Packets of `band` in arrival order.
    pub fn band_packets(&self, band: usize) -> impl Iterator<Item = &Packet> {
        self.queues.iter(band)
    }

    /// Whether the occupancy bitmap and the running totals agree with the
    /// queue contents.
    pub fn is_consistent(&self) -> bool {
        let bands_agree =
            (0..self.config.bands).all(|b| self.occupancy.is_set(b) == !self.queues.is_empty(b));
        let bytes: u64 = (0..self.config.bands)
            .flat_map(|b| self.queues.iter(b))
            .map(|p| p.len() as u64)
            .sum();
        bands_agree && self.queues.total_len() == self.queued && bytes == self.queued_bytes
    }

    // ─── Stats ───────────────────────────────────────────────────────────

    fn sync_snapshot(&mut self) {
        self.stats.backlog = self.queued;
        self.stats.backlog_bytes = self.queued_bytes;
        self.stats
            .bitmap
            .copy_from_slice(self.occupancy.snapshot());
    }

    fn publish(&mut self, event: SchedulerEvent) {
        self.sync_snapshot();
        self.sink.publish(&event, &self.stats);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::EventLog;
    use bytes::Bytes;

    fn pkt(band: u32) -> Packet {
        Packet::new(band, Bytes::from(format!("band-{band}")))
    }

    fn sized(band: u32, len: usize) -> Packet {
        Packet::new(band, Bytes::new()).with_len(len)
    }

    // ─── Admission ───────────────────────────────────────────────────────

    #[test]
    fn accepts_below_limit() {
        let mut sch = SchedulerCore::init(4, true);
        assert_eq!(sch.enqueue(pkt(3)).unwrap(), Verdict::Accepted);
        assert_eq!(sch.enqueue(pkt(1)).unwrap(), Verdict::Accepted);
        assert_eq!(sch.len(), 2);
        assert!(sch.occupancy().is_set(1));
        assert!(sch.occupancy().is_set(3));
        assert_eq!(sch.stats().accepted, 2);
        assert!(sch.is_consistent());
    }

    #[test]
    fn zero_limit_queues_then_evicts() {
        let mut sch = SchedulerCore::init(0, false);
        assert_eq!(sch.enqueue(pkt(0)).unwrap(), Verdict::Congested);
        assert_eq!(sch.len(), 0);
        assert!(sch.occupancy().is_empty());
        assert_eq!(sch.stats().packets, 1);
        assert_eq!(sch.stats().evicted, 1);
        assert_eq!(sch.stats().congested, 1);
        assert!(sch.is_consistent());
    }

    #[test]
    fn full_buffer_rejects_less_urgent() {
        let mut sch = SchedulerCore::init(1, true);
        assert_eq!(sch.enqueue(pkt(1)).unwrap(), Verdict::Accepted);
        assert_eq!(
            sch.enqueue(pkt(2)).unwrap(),
            Verdict::Dropped(DropReason::BufferFull)
        );
        // Equal priority is rejected too.
        assert_eq!(
            sch.enqueue(pkt(1)).unwrap(),
            Verdict::Dropped(DropReason::BufferFull)
        );
        assert_eq!(sch.len(), 1);
        assert_eq!(sch.band_len(1), 1);
        assert_eq!(sch.stats().hard_dropped, 2);
        assert_eq!(sch.stats().per_band_arrivals[1], 2);
        assert_eq!(sch.stats().per_band_accepted[1], 1);
    }

    #[test]
    fn full_buffer_more_urgent_evicts_least_urgent() {
        let mut sch = SchedulerCore::init(2, true);
        sch.enqueue(pkt(5)).unwrap();
        sch.enqueue(pkt(9)).unwrap();
        assert_eq!(sch.enqueue(pkt(0)).unwrap(), Verdict::Congested);
        assert_eq!(sch.len(), 2);
        assert_eq!(sch.band_len(9), 0);
        assert!(!sch.occupancy().is_set(9));
        assert_eq!(sch.occupancy().lowest_priority_occupied(), Some(5));
        assert!(sch.is_consistent());
    }

    #[test]
    fn eviction_takes_oldest_of_lowest_band() {
        let mut sch = SchedulerCore::init(2, true);
        sch.enqueue(Packet::new(7, Bytes::from_static(b"old"))).unwrap();
        sch.enqueue(Packet::new(7, Bytes::from_static(b"new"))).unwrap();
        assert_eq!(sch.enqueue(pkt(1)).unwrap(), Verdict::Congested);
        let remaining: Vec<&[u8]> = sch.band_packets(7).map(|p| p.payload().as_ref()).collect();
        assert_eq!(remaining, vec![&b"new"[..]]);
    }

    #[test]
    fn illegal_priority_is_hard_dropped() {
        let mut sch = SchedulerCore::init(10, true);
        assert_eq!(
            sch.enqueue(pkt(32)).unwrap(),
            Verdict::Dropped(DropReason::IllegalPriority)
        );
        assert_eq!(sch.stats().illegal_priority, 1);
        assert_eq!(sch.stats().hard_dropped, 1);
        assert_eq!(sch.stats().per_band_arrivals.iter().sum::<u64>(), 0);
        assert!(sch.is_empty());
        assert!(sch.occupancy().is_empty());
    }

    #[test]
    fn untagged_packets_use_fallback_band() {
        let config = SchedulerConfig {
            fallback_band: 4,
            ..Default::default()
        };
        let mut sch = SchedulerCore::new(config).unwrap();
        sch.enqueue(Packet::untagged(Bytes::from_static(b"arp"))).unwrap();
        assert_eq!(sch.band_len(4), 1);
        assert_eq!(sch.stats().non_priority_tagged, 1);

        sch.enqueue_with_fallback(Packet::untagged(Bytes::new()), 0)
            .unwrap();
        assert_eq!(sch.band_len(0), 1);

        let first = sch.dequeue().unwrap();
        assert_eq!(first.tag(), PriorityTag::Band(0));
    }

    #[test]
    fn untagged_with_bad_fallback_is_illegal() {
        let mut sch = SchedulerCore::init(10, true);
        let verdict = sch
            .enqueue_with_fallback(Packet::untagged(Bytes::new()), 99)
            .unwrap();
        assert_eq!(verdict, Verdict::Dropped(DropReason::IllegalPriority));
        assert_eq!(sch.stats().non_priority_tagged, 1);
        assert_eq!(sch.stats().illegal_priority, 1);
    }

    #[test]
    fn byte_accounting_follows_packets() {
        let mut sch = SchedulerCore::init(2, true);
        sch.enqueue(sized(3, 1000)).unwrap();
        sch.enqueue(sized(1, 500)).unwrap();
        assert_eq!(sch.byte_len(), 1500);
        sch.enqueue(sized(0, 64)).unwrap();
        assert_eq!(sch.byte_len(), 564);
        assert_eq!(sch.stats().bytes, 1564);
        sch.dequeue();
        assert_eq!(sch.byte_len(), 500);
        assert!(sch.is_consistent());
    }

    // ─── Dequeue / Peek ──────────────────────────────────────────────────

    #[test]
    fn dequeue_is_strict_priority_then_fifo() {
        let mut sch = SchedulerCore::init(10, true);
        sch.enqueue(Packet::new(2, Bytes::from_static(b"c"))).unwrap();
        sch.enqueue(Packet::new(0, Bytes::from_static(b"a"))).unwrap();
        sch.enqueue(Packet::new(2, Bytes::from_static(b"d"))).unwrap();
        sch.enqueue(Packet::new(0, Bytes::from_static(b"b"))).unwrap();

        let order: Vec<Bytes> = std::iter::from_fn(|| sch.dequeue())
            .map(Packet::into_payload)
            .collect();
        assert_eq!(order, vec!["a", "b", "c", "d"]);
        assert!(sch.occupancy().is_empty());
        assert_eq!(sch.stats().dequeued, 4);
    }

    #[test]
    fn disabled_dequeue_keeps_packets() {
        let mut sch = SchedulerCore::init(10, false);
        sch.enqueue(pkt(3)).unwrap();
        assert!(sch.dequeue().is_none());
        assert_eq!(sch.len(), 1);

        sch.reconfigure(ConfigUpdate::dequeue_enabled(true));
        assert_eq!(sch.dequeue().unwrap().band(), Some(3));
        assert!(sch.dequeue().is_none());
    }

    #[test]
    fn peek_ignores_gate_by_default() {
        let mut sch = SchedulerCore::init(10, false);
        assert!(sch.peek().is_none());
        sch.enqueue(pkt(6)).unwrap();
        sch.enqueue(pkt(2)).unwrap();
        assert_eq!(sch.peek().unwrap().band(), Some(2));
        assert_eq!(sch.len(), 2);
        assert_eq!(sch.stats().dequeued, 0);
    }

    #[test]
    fn peek_can_honor_gate() {
        let config = SchedulerConfig {
            dequeue_enabled: false,
            peek_honors_gate: true,
            ..Default::default()
        };
        let mut sch = SchedulerCore::new(config).unwrap();
        sch.enqueue(pkt(1)).unwrap();
        assert!(sch.peek().is_none());
        sch.reconfigure(ConfigUpdate::dequeue_enabled(true));
        assert_eq!(sch.peek().unwrap().band(), Some(1));
    }

    // ─── Drop ────────────────────────────────────────────────────────────

    #[test]
    fn drop_one_on_empty_is_inconsistent() {
        let mut sch =
            SchedulerCore::with_sink(SchedulerConfig::default(), EventLog::new()).unwrap();
        let err = sch.drop_one().unwrap_err();
        assert_eq!(
            err,
            SchedulerError::Inconsistent {
                queued: 0,
                limit: 150
            }
        );
        assert_eq!(sch.stats().inconsistencies, 1);
        assert!(matches!(
            sch.sink().events(),
            [SchedulerEvent::Inconsistent { .. }]
        ));
    }

    #[test]
    fn dequeue_from_stale_bit_is_inconsistent() {
        let mut sch =
            SchedulerCore::with_sink(SchedulerConfig::default(), EventLog::new()).unwrap();
        sch.occupancy.mark(3);
        assert!(sch.dequeue().is_none());
        assert_eq!(sch.stats().inconsistencies, 1);
        assert_eq!(sch.stats().dequeued, 0);
        assert!(!sch.occupancy().is_set(3));
        assert!(matches!(
            sch.sink().events(),
            [SchedulerEvent::Inconsistent { queued: 0, .. }]
        ));
        assert!(sch.is_consistent());
    }

    #[test]
    fn drop_one_returns_released_length() {
        let mut sch = SchedulerCore::init(10, true);
        sch.enqueue(sized(1, 100)).unwrap();
        sch.enqueue(sized(8, 700)).unwrap();
        assert_eq!(sch.drop_one().unwrap(), 700);
        assert_eq!(sch.drop_one().unwrap(), 100);
        assert!(sch.is_empty());
        assert_eq!(sch.stats().evicted, 2);
    }

    // ─── Lifecycle ───────────────────────────────────────────────────────

    #[test]
    fn reset_keeps_configuration() {
        let mut sch = SchedulerCore::init(3, false);
        sch.reconfigure(ConfigUpdate::limit(5));
        for band in 0..5 {
            sch.enqueue(pkt(band)).unwrap();
        }
        sch.reset();

        assert!(sch.is_empty());
        assert_eq!(sch.byte_len(), 0);
        assert!(sch.occupancy().is_empty());
        assert_eq!(sch.limit(), 5);
        assert!(!sch.dequeue_enabled());
        assert_eq!(sch.stats().limit, 5);
        assert!(!sch.stats().dequeue_enabled);
        assert_eq!(sch.stats().packets, 0);
        assert!(sch.is_consistent());
    }

    #[test]
    fn reconfigure_only_touches_supplied_fields() {
        let mut sch = SchedulerCore::init(10, true);
        sch.enqueue(pkt(1)).unwrap();
        sch.enqueue(pkt(2)).unwrap();

        sch.reconfigure(ConfigUpdate::limit(1));
        assert_eq!(sch.limit(), 1);
        assert!(sch.dequeue_enabled());
        assert_eq!(sch.len(), 2);

        sch.reconfigure(ConfigUpdate::default());
        assert_eq!(sch.limit(), 1);
    }

    #[test]
    fn shrunk_limit_keeps_backlog_above_it() {
        let mut sch = SchedulerCore::init(10, true);
        for band in 5..9 {
            sch.enqueue(pkt(band)).unwrap();
        }
        sch.reconfigure(ConfigUpdate::limit(1));

        assert_eq!(
            sch.enqueue(pkt(9)).unwrap(),
            Verdict::Dropped(DropReason::BufferFull)
        );
        assert_eq!(sch.len(), 4);

        // One eviction per enqueue, so the backlog does not shrink to the limit.
        assert_eq!(sch.enqueue(pkt(0)).unwrap(), Verdict::Congested);
        assert_eq!(sch.len(), 4);
        assert_eq!(sch.band_len(8), 0);
        assert_eq!(sch.band_len(0), 1);
        assert_eq!(sch.stats().evicted, 1);
        assert!(sch.is_consistent());
    }

    #[test]
    fn destroy_detaches_sink() {
        let mut sch =
            SchedulerCore::with_sink(SchedulerConfig::default(), EventLog::new()).unwrap();
        sch.enqueue(pkt(0)).unwrap();
        sch.enqueue(pkt(1)).unwrap();
        let (log, last) = sch.destroy();
        assert!(log.is_detached());
        assert_eq!(last.accepted, 2);
        assert_eq!(last.backlog, 2);
        assert!(matches!(
            log.events().last(),
            Some(SchedulerEvent::Reset { released: 2 })
        ));
    }

    #[test]
    fn sink_sees_bitmap_snapshot() {
        let mut sch =
            SchedulerCore::with_sink(SchedulerConfig::default(), crate::stats::SnapshotSink::new())
                .unwrap();
        let handle = sch.sink().handle();
        sch.enqueue(pkt(0)).unwrap();
        sch.enqueue(pkt(4)).unwrap();
        let snap = handle.snapshot();
        assert_eq!(snap.bitmap, vec![0b1_0001]);
        assert_eq!(snap.backlog, 2);

        sch.dequeue();
        assert_eq!(handle.snapshot().bitmap, vec![0b1_0000]);
    }

    #[test]
    fn rejects_invalid_config() {
        let config = SchedulerConfig {
            bands: 0,
            ..Default::default()
        };
        assert!(SchedulerCore::new(config).is_err());
    }
}
