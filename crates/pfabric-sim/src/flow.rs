//! # Flow Sender State
//!
//! Window-limited sender for one flow. Segments are acknowledged
//! individually; a segment unacknowledged for `rto` ticks is resent. The
//! window grows by one segment per window of acknowledgements and halves on
//! a timeout or when the switch reports congestion for one of the flow's
//! own arrivals.

use std::collections::{BTreeMap, VecDeque};

use crate::frame::{Segment, MAX_SEGMENT};
use crate::workload::FlowSpec;

// ─── Parameters ──────────────────────────────────────────────────────────────

/// Sender parameters shared by all flows.
#[derive(Debug, Clone, Copy)]
pub struct SenderConfig {
    pub initial_window: f64,
    pub max_window: f64,
    /// Retransmission timeout in ticks.
    pub rto: u64,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            initial_window: 4.0,
            max_window: 64.0,
            rto: 40,
        }
    }
}

// ─── FlowState ───────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct FlowState {
    spec: FlowSpec,
    cfg: SenderConfig,
    segments: u32,
    next_new: u32,
    acked: Vec<bool>,
    acked_bytes: u64,
    /// seq → tick sent.
    in_flight: BTreeMap<u32, u64>,
    retransmit: VecDeque<u32>,
    window: f64,
    /// Window reductions are suppressed until this tick.
    hold_until: u64,
    retransmits: u64,
    timeouts: u64,
    completed_at: Option<u64>,
}

impl FlowState {
    pub fn new(spec: FlowSpec, cfg: SenderConfig) -> Self {
        let segments = spec.size.div_ceil(MAX_SEGMENT as u64).max(1) as u32;
        FlowState {
            segments,
            next_new: 0,
            acked: vec![false; segments as usize],
            acked_bytes: 0,
            in_flight: BTreeMap::new(),
            retransmit: VecDeque::new(),
            window: cfg.initial_window.max(1.0),
            hold_until: 0,
            retransmits: 0,
            timeouts: 0,
            completed_at: None,
            spec,
            cfg,
        }
    }

    pub fn spec(&self) -> &FlowSpec {
        &self.spec
    }

    pub fn segments(&self) -> u32 {
        self.segments
    }

    pub fn window(&self) -> f64 {
        self.window
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn retransmits(&self) -> u64 {
        self.retransmits
    }

    pub fn timeouts(&self) -> u64 {
        self.timeouts
    }

    /// Bytes not yet acknowledged.
    pub fn remaining(&self) -> u64 {
        self.spec.size - self.acked_bytes
    }

    pub fn is_done(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Tick of the last acknowledgement, once every segment is acked.
    pub fn completed_at(&self) -> Option<u64> {
        self.completed_at
    }

    pub fn is_started(&self, now: u64) -> bool {
        now >= self.spec.start_tick
    }

    fn segment_len(&self, seq: u32) -> usize {
        let offset = u64::from(seq) * MAX_SEGMENT as u64;
        (self.spec.size - offset).min(MAX_SEGMENT as u64) as usize
    }

    fn segment(&self, seq: u32) -> Segment {
        Segment {
            flow: self.spec.id,
            seq,
            payload_len: self.segment_len(seq),
        }
    }

    // ─── Sending ─────────────────────────────────────────────────────────

    /// Next segment to put on the wire, if the window allows one. Losses
    /// are resent before new data.
    pub fn next_segment(&mut self, now: u64) -> Option<Segment> {
        if self.is_done() || !self.is_started(now) {
            return None;
        }
        if (self.in_flight.len() as f64) >= self.window.floor() {
            return None;
        }

        while let Some(seq) = self.retransmit.pop_front() {
            if self.acked[seq as usize] || self.in_flight.contains_key(&seq) {
                continue;
            }
            self.in_flight.insert(seq, now);
            self.retransmits += 1;
            return Some(self.segment(seq));
        }

        if self.next_new < self.segments {
            let seq = self.next_new;
            self.next_new += 1;
            self.in_flight.insert(seq, now);
            return Some(self.segment(seq));
        }
        None
    }

    // ─── Feedback ────────────────────────────────────────────────────────

    /// Record an acknowledgement. Duplicates are ignored. Returns `true`
    /// when this ack completes the flow.
    pub fn on_ack(&mut self, seq: u32, now: u64) -> bool {
        let Some(acked) = self.acked.get_mut(seq as usize) else {
            return false;
        };
        if *acked {
            return false;
        }
        *acked = true;
        self.in_flight.remove(&seq);
        self.acked_bytes += self.segment_len(seq) as u64;
        self.window = (self.window + 1.0 / self.window).min(self.cfg.max_window);

        if self.acked_bytes == self.spec.size {
            self.completed_at = Some(now);
            self.in_flight.clear();
            self.retransmit.clear();
            return true;
        }
        false
    }

    /// The switch queued this flow's segment only by evicting something,
    /// or rejected it.
    pub fn on_congestion(&mut self, now: u64) {
        self.back_off(now);
    }

    /// Move segments outstanding for `rto` ticks to the retransmit queue.
    /// Returns how many expired.
    pub fn check_timeouts(&mut self, now: u64) -> usize {
        let rto = self.cfg.rto;
        let expired: Vec<u32> = self
            .in_flight
            .iter()
            .filter(|(_, &sent)| now.saturating_sub(sent) >= rto)
            .map(|(&seq, _)| seq)
            .collect();
        for seq in &expired {
            self.in_flight.remove(seq);
            self.retransmit.push_back(*seq);
        }
        if !expired.is_empty() {
            self.timeouts += 1;
            self.back_off(now);
        }
        expired.len()
    }

    /// Halve the window, at most once per `rto`.
    fn back_off(&mut self, now: u64) {
        if now < self.hold_until {
            return;
        }
        self.window = (self.window / 2.0).max(1.0);
        self.hold_until = now + self.cfg.rto;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(size: u64) -> FlowSpec {
        FlowSpec {
            id: 3,
            host: 0,
            bucket: 0,
            size,
            start_tick: 0,
        }
    }

    fn flow(size: u64, window: f64) -> FlowState {
        FlowState::new(
            spec(size),
            SenderConfig {
                initial_window: window,
                max_window: 8.0,
                rto: 10,
            },
        )
    }

    #[test]
    fn splits_into_mtu_segments() {
        let f = flow(MAX_SEGMENT as u64 * 2 + 10, 1.0);
        assert_eq!(f.segments(), 3);
        assert_eq!(f.segment_len(0), MAX_SEGMENT);
        assert_eq!(f.segment_len(2), 10);
    }

    #[test]
    fn window_limits_sending() {
        let mut f = flow(100_000, 2.0);
        assert_eq!(f.next_segment(0).unwrap().seq, 0);
        assert_eq!(f.next_segment(0).unwrap().seq, 1);
        assert!(f.next_segment(0).is_none());
        f.on_ack(0, 1);
        assert_eq!(f.next_segment(1).unwrap().seq, 2);
    }

    #[test]
    fn waits_for_start_tick() {
        let mut f = FlowState::new(
            FlowSpec {
                start_tick: 5,
                ..spec(10)
            },
            SenderConfig::default(),
        );
        assert!(f.next_segment(4).is_none());
        assert!(f.next_segment(5).is_some());
    }

    #[test]
    fn completes_on_last_ack() {
        let mut f = flow(MAX_SEGMENT as u64 + 1, 4.0);
        let a = f.next_segment(0).unwrap();
        let b = f.next_segment(0).unwrap();
        assert!(f.next_segment(0).is_none());
        assert!(!f.on_ack(b.seq, 3));
        assert!(!f.on_ack(b.seq, 3));
        assert_eq!(f.remaining(), MAX_SEGMENT as u64);
        assert!(f.on_ack(a.seq, 4));
        assert_eq!(f.completed_at(), Some(4));
        assert_eq!(f.remaining(), 0);
        assert!(f.next_segment(5).is_none());
    }

    #[test]
    fn timeout_resends_and_halves_window() {
        let mut f = flow(100_000, 4.0);
        for _ in 0..4 {
            f.next_segment(0).unwrap();
        }
        assert_eq!(f.check_timeouts(9), 0);
        assert_eq!(f.check_timeouts(10), 4);
        assert_eq!(f.window(), 2.0);
        assert_eq!(f.timeouts(), 1);

        // Lost segments go out again before new data.
        assert_eq!(f.next_segment(10).unwrap().seq, 0);
        assert_eq!(f.next_segment(10).unwrap().seq, 1);
        assert!(f.next_segment(10).is_none());
        assert_eq!(f.retransmits(), 2);
    }

    #[test]
    fn late_ack_cancels_retransmit() {
        let mut f = flow(100_000, 1.0);
        f.next_segment(0).unwrap();
        f.check_timeouts(10);
        f.on_ack(0, 11);
        assert_eq!(f.next_segment(11).unwrap().seq, 1);
        assert_eq!(f.retransmits(), 0);
    }

    #[test]
    fn congestion_backoff_is_rate_limited() {
        let mut f = flow(100_000, 8.0);
        f.on_congestion(0);
        f.on_congestion(1);
        assert_eq!(f.window(), 4.0);
        f.on_congestion(10);
        assert_eq!(f.window(), 2.0);
    }
}
