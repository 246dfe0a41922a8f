//! # Bottleneck Simulation
//!
//! Discrete-time run of a star topology: every sending host feeds one
//! switch egress port, and the port's queueing discipline decides what goes
//! out. One tick is one MTU frame time on the egress link.
//!
//! Each tick:
//! 1. acknowledgements due this tick reach their senders,
//! 2. senders check retransmission timeouts,
//! 3. every host offers at most one frame (round robin over its flows),
//! 4. the egress link takes one frame from the discipline.
//!
//! The receiver acknowledges each delivered segment after `ack_delay`
//! ticks. Frames lost to the discipline are noticed only by timeout.

use std::collections::VecDeque;

use pfabric_core::stats::SchedulerStats;
use pfabric_core::{Qdisc, Verdict};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::flow::{FlowState, SenderConfig};
use crate::frame::{self, Segment};
use crate::ideal::{self, IdealFlow, LinkModel};
use crate::priority::PriorityPolicy;
use crate::workload::{self, FlowSpec, WorkloadConfig, NUM_BUCKETS};

// ─── Configuration ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SimConfig {
    pub link: LinkModel,
    pub workload: WorkloadConfig,
    pub sender: SenderConfig,
    pub policy: PriorityPolicy,
    /// Band count used to clamp priorities.
    pub bands: usize,
    pub ack_delay: u64,
    /// Stop after this many ticks even if flows are still running.
    pub max_ticks: u64,
    /// Log progress every this many ticks (0 = never).
    pub progress_every: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            link: LinkModel::default(),
            workload: WorkloadConfig::default(),
            sender: SenderConfig::default(),
            policy: PriorityPolicy::RemainingSize,
            bands: pfabric_core::config::DEFAULT_BANDS,
            ack_delay: 4,
            max_ticks: 5_000_000,
            progress_every: 0,
        }
    }
}

// ─── Report ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct FlowResult {
    #[serde(flatten)]
    pub spec: FlowSpec,
    pub completion_ticks: Option<u64>,
    pub fct_secs: Option<f64>,
    /// FCT divided by the alone-on-link FCT of the same size.
    pub normalized_fct: Option<f64>,
    /// Normalised FCT of the same flow under the ideal SRPT schedule.
    pub ideal_normalized_fct: f64,
    pub retransmits: u64,
    pub timeouts: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct OfferCounts {
    pub offered: u64,
    pub accepted: u64,
    pub congested: u64,
    pub dropped: u64,
    pub errors: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimReport {
    pub qdisc: String,
    pub policy: PriorityPolicy,
    pub ticks: u64,
    pub quantum_secs: f64,
    pub completed: usize,
    pub delivered_frames: u64,
    pub delivered_bytes: u64,
    /// Frames on the egress link that carried no known segment.
    pub foreign_frames: u64,
    pub offers: OfferCounts,
    pub mean_normalized_fct: Option<f64>,
    pub ideal_mean_normalized_fct: f64,
    /// Mean normalised FCT per size bucket (`None` if nothing completed).
    pub bucket_mean_normalized_fct: Vec<Option<f64>>,
    pub flows: Vec<FlowResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduler: Option<SchedulerStats>,
}

impl SimReport {
    pub fn all_completed(&self) -> bool {
        self.completed == self.flows.len()
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

// ─── Simulation ──────────────────────────────────────────────────────────────

pub struct Simulation<Q: Qdisc> {
    cfg: SimConfig,
    qdisc: Q,
    flows: Vec<FlowState>,
    /// Flow indices per host.
    hosts: Vec<Vec<usize>>,
    /// Round-robin cursor per host.
    cursors: Vec<usize>,
    /// (due tick, flow, seq), in due order.
    acks: VecDeque<(u64, u32, u32)>,
    now: u64,
    offers: OfferCounts,
    delivered_frames: u64,
    delivered_bytes: u64,
    foreign_frames: u64,
}

impl<Q: Qdisc> Simulation<Q> {
    pub fn new(cfg: SimConfig, qdisc: Q) -> Self {
        let specs = workload::generate(&cfg.workload);
        let mut hosts = vec![Vec::new(); cfg.workload.hosts];
        for (i, spec) in specs.iter().enumerate() {
            hosts[spec.host].push(i);
        }
        let flows = specs
            .into_iter()
            .map(|spec| FlowState::new(spec, cfg.sender))
            .collect();
        Simulation {
            cursors: vec![0; hosts.len()],
            hosts,
            flows,
            qdisc,
            acks: VecDeque::new(),
            now: 0,
            offers: OfferCounts::default(),
            delivered_frames: 0,
            delivered_bytes: 0,
            foreign_frames: 0,
            cfg,
        }
    }

    pub fn qdisc(&self) -> &Q {
        &self.qdisc
    }

    pub fn flows(&self) -> &[FlowState] {
        &self.flows
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn is_finished(&self) -> bool {
        self.flows.iter().all(FlowState::is_done)
    }

    /// Run until every flow completes or `max_ticks` is reached.
    pub fn run(&mut self) {
        info!(
            qdisc = self.qdisc.id(),
            flows = self.flows.len(),
            hosts = self.hosts.len(),
            "simulation starting"
        );
        while !self.is_finished() && self.now < self.cfg.max_ticks {
            self.step();
            if self.cfg.progress_every > 0 && self.now % self.cfg.progress_every == 0 {
                let done = self.flows.iter().filter(|f| f.is_done()).count();
                info!(
                    tick = self.now,
                    done,
                    queued = self.qdisc.len(),
                    "simulation progress"
                );
            }
        }
        if !self.is_finished() {
            warn!(
                ticks = self.now,
                "tick limit reached with flows still running"
            );
        }
    }

    /// Advance one tick.
    pub fn step(&mut self) {
        let now = self.now;

        while let Some(&(due, flow, seq)) = self.acks.front() {
            if due > now {
                break;
            }
            self.acks.pop_front();
            if let Some(state) = self.flows.get_mut(flow as usize) {
                if state.on_ack(seq, now) {
                    debug!(flow, tick = now, "flow completed");
                }
            }
        }

        for state in &mut self.flows {
            state.check_timeouts(now);
        }

        for host in 0..self.hosts.len() {
            self.offer_from(host, now);
        }

        if let Some(packet) = self.qdisc.dequeue() {
            self.delivered_frames += 1;
            self.delivered_bytes += packet.len() as u64;
            match Segment::from_frame(packet.payload()) {
                Some(seg) => self
                    .acks
                    .push_back((now + self.cfg.ack_delay, seg.flow, seg.seq)),
                None => self.foreign_frames += 1,
            }
        }

        self.now += 1;
    }

    fn offer_from(&mut self, host: usize, now: u64) {
        let members = &self.hosts[host];
        let n = members.len();
        for k in 0..n {
            let idx = members[(self.cursors[host] + k) % n];
            let state = &mut self.flows[idx];
            let Some(seg) = state.next_segment(now) else {
                continue;
            };
            self.cursors[host] = (self.cursors[host] + k + 1) % n;

            let tos = self
                .cfg
                .policy
                .band(state.spec().bucket, state.remaining(), self.cfg.bands);
            let frame = seg.to_frame(host as u8, tos.min(u32::from(u8::MAX)) as u8);
            self.offers.offered += 1;
            match self.qdisc.enqueue(frame::to_packet(frame)) {
                Ok(Verdict::Accepted) => self.offers.accepted += 1,
                Ok(Verdict::Congested) => {
                    self.offers.congested += 1;
                    state.on_congestion(now);
                }
                Ok(Verdict::Dropped(_)) => {
                    self.offers.dropped += 1;
                    state.on_congestion(now);
                }
                Err(e) => {
                    self.offers.errors += 1;
                    warn!(error = %e, "qdisc enqueue failed");
                }
            }
            return;
        }
    }

    /// Consume the simulation into its report and the discipline.
    pub fn finish(self) -> (SimReport, Q) {
        let link = self.cfg.link;
        let q = link.quantum_secs();

        let ideal_flows: Vec<IdealFlow> = self
            .flows
            .iter()
            .map(|f| IdealFlow {
                size: f.spec().size,
                start_quantum: f.spec().start_tick,
            })
            .collect();
        let ideal = ideal::srpt_completion_quanta(&link, &ideal_flows);

        let flows: Vec<FlowResult> = self
            .flows
            .iter()
            .zip(&ideal)
            .map(|(f, &ideal_quanta)| {
                let alone = link.alone_quanta(f.spec().size) as f64;
                let completion_ticks = f.completed_at().map(|t| t + 1 - f.spec().start_tick);
                FlowResult {
                    spec: f.spec().clone(),
                    completion_ticks,
                    fct_secs: completion_ticks.map(|c| c as f64 * q),
                    normalized_fct: completion_ticks.map(|c| c as f64 / alone),
                    ideal_normalized_fct: ideal_quanta as f64 / alone,
                    retransmits: f.retransmits(),
                    timeouts: f.timeouts(),
                }
            })
            .collect();

        let bucket_mean_normalized_fct = (0..NUM_BUCKETS)
            .map(|b| {
                mean(
                    flows
                        .iter()
                        .filter(|r| r.spec.bucket == b)
                        .filter_map(|r| r.normalized_fct),
                )
            })
            .collect();

        let report = SimReport {
            qdisc: self.qdisc.id().to_string(),
            policy: self.cfg.policy,
            ticks: self.now,
            quantum_secs: q,
            completed: flows.iter().filter(|r| r.completion_ticks.is_some()).count(),
            delivered_frames: self.delivered_frames,
            delivered_bytes: self.delivered_bytes,
            foreign_frames: self.foreign_frames,
            offers: self.offers,
            mean_normalized_fct: mean(flows.iter().filter_map(|r| r.normalized_fct)),
            ideal_mean_normalized_fct: mean(flows.iter().map(|r| r.ideal_normalized_fct))
                .unwrap_or(0.0),
            bucket_mean_normalized_fct,
            flows,
            scheduler: None,
        };
        info!(
            qdisc = %report.qdisc,
            ticks = report.ticks,
            completed = report.completed,
            mean_normalized_fct = ?report.mean_normalized_fct,
            "simulation finished"
        );
        (report, self.qdisc)
    }
}
