//! # Scheduler Statistics
//!
//! Counters are owned by each scheduler instance. After every mutating
//! operation the scheduler hands the event and the updated counters to its
//! [`StatsSink`]; how (and whether) they leave the process is the sink's
//! business.

use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

use crate::scheduler::DropReason;

// ─── Counters ────────────────────────────────────────────────────────────────

/// Per-scheduler counters and occupancy snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchedulerStats {
    /// Configured buffer limit.
    pub limit: u32,
    /// Whether dequeue is currently enabled.
    pub dequeue_enabled: bool,
    /// Packets admitted into a band (including ones evicted right after).
    pub packets: u64,
    /// Bytes admitted into a band.
    pub bytes: u64,
    /// Enqueues that returned `Accepted`.
    pub accepted: u64,
    /// Enqueues that returned `Congested`.
    pub congested: u64,
    /// Packets rejected without being queued.
    pub hard_dropped: u64,
    /// Queued packets released by the drop procedure.
    pub evicted: u64,
    /// Packets handed out by dequeue.
    pub dequeued: u64,
    /// Packets that arrived without a priority and used the fallback band.
    pub non_priority_tagged: u64,
    /// Packets discarded for a priority outside the band range.
    pub illegal_priority: u64,
    /// Invariant violations detected by the drop procedure.
    pub inconsistencies: u64,
    /// In-range arrivals per band, counted before the admission decision.
    pub per_band_arrivals: Vec<u64>,
    /// Admissions per band.
    pub per_band_accepted: Vec<u64>,
    /// Occupancy bitmap words.
    pub bitmap: Vec<u32>,
    /// Packets currently queued.
    pub backlog: usize,
    /// Bytes currently queued.
    pub backlog_bytes: u64,
}

impl SchedulerStats {
    pub fn new(bands: usize, limit: u32, dequeue_enabled: bool) -> Self {
        SchedulerStats {
            limit,
            dequeue_enabled,
            per_band_arrivals: vec![0; bands],
            per_band_accepted: vec![0; bands],
            bitmap: vec![0; bands.div_ceil(u32::BITS as usize)],
            ..Default::default()
        }
    }

    /// All packets lost to the scheduler: hard drops plus evictions.
    pub fn drops(&self) -> u64 {
        self.hard_dropped + self.evicted
    }

    /// Fraction of arrivals that never left through dequeue because they
    /// were dropped or evicted.
    pub fn drop_rate(&self) -> f64 {
        let arrivals = self.packets + self.hard_dropped;
        if arrivals == 0 {
            0.0
        } else {
            self.drops() as f64 / arrivals as f64
        }
    }

    /// Zero every counter, keeping the band layout and configuration fields.
    pub(crate) fn clear_counters(&mut self) {
        let bands = self.per_band_accepted.len();
        *self = SchedulerStats::new(bands, self.limit, self.dequeue_enabled);
    }
}

// ─── Events ──────────────────────────────────────────────────────────────────

/// What just happened inside the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SchedulerEvent {
    Accepted {
        band: usize,
        len: usize,
    },
    /// Admitted into `band`, then one packet was evicted from `evicted_band`.
    Congested {
        band: usize,
        evicted_band: usize,
        evicted_len: usize,
    },
    Dropped {
        priority: Option<u32>,
        reason: DropReason,
        len: usize,
    },
    /// Forced eviction through the drop procedure.
    Evicted {
        band: usize,
        len: usize,
    },
    Dequeued {
        band: usize,
        len: usize,
    },
    Reconfigured {
        limit: u32,
        dequeue_enabled: bool,
    },
    Reset {
        released: usize,
    },
    Inconsistent {
        queued: usize,
        limit: u32,
    },
}

// ─── Sinks ───────────────────────────────────────────────────────────────────

/// Receiver of scheduler events.
pub trait StatsSink {
    /// Called after every mutating operation with the updated counters.
    fn publish(&mut self, event: &SchedulerEvent, stats: &SchedulerStats);

    /// Called once when the scheduler is destroyed.
    fn detach(&mut self) {}
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl StatsSink for NullSink {
    fn publish(&mut self, _event: &SchedulerEvent, _stats: &SchedulerStats) {}
}

/// Records every event in order.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<SchedulerEvent>,
    detached: bool,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[SchedulerEvent] {
        &self.events
    }

    pub fn take(&mut self) -> Vec<SchedulerEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_detached(&self) -> bool {
        self.detached
    }
}

impl StatsSink for EventLog {
    fn publish(&mut self, event: &SchedulerEvent, _stats: &SchedulerStats) {
        self.events.push(*event);
    }

    fn detach(&mut self) {
        self.detached = true;
    }
}

/// Keeps the latest snapshot where other threads can read it.
#[derive(Debug)]
pub struct SnapshotSink {
    latest: Arc<Mutex<Published>>,
}

#[derive(Debug, Default)]
struct Published {
    stats: SchedulerStats,
    updates: u64,
    attached: bool,
}

/// Cloneable read side of a [`SnapshotSink`].
#[derive(Debug, Clone)]
pub struct StatsHandle {
    latest: Arc<Mutex<Published>>,
}

impl SnapshotSink {
    pub fn new() -> Self {
        SnapshotSink {
            latest: Arc::new(Mutex::new(Published {
                attached: true,
                ..Default::default()
            })),
        }
    }

    pub fn handle(&self) -> StatsHandle {
        StatsHandle {
            latest: self.latest.clone(),
        }
    }
}

impl Default for SnapshotSink {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsSink for SnapshotSink {
    fn publish(&mut self, _event: &SchedulerEvent, stats: &SchedulerStats) {
        let mut published = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        published.stats.clone_from(stats);
        published.updates += 1;
    }

    fn detach(&mut self) {
        let mut published = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        published.attached = false;
    }
}

impl StatsHandle {
    /// Latest published snapshot.
    pub fn snapshot(&self) -> SchedulerStats {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .stats
            .clone()
    }

    /// Number of snapshots published so far.
    pub fn updates(&self) -> u64 {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .updates
    }

    /// False once the owning scheduler has been destroyed.
    pub fn is_attached(&self) -> bool {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .attached
    }
}
