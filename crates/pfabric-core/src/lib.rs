//! # pfabric-core
//!
//! pFabric priority packet scheduler.
//!
//! Packets carry a numeric priority (lower is more urgent, typically the
//! remaining size of the flow they belong to). Each priority maps to one of
//! a fixed number of FIFO bands. Dequeue always serves the most urgent
//! non-empty band. When the buffer is full, admission favours urgent traffic
//! and evicts from the least urgent band.
//!
//! ## Crate structure
//!
//! - [`occupancy`] — Per-band occupancy bitmap with bit-scan queries
//! - [`band`] — Fixed set of per-band FIFO queues
//! - [`packet`] — Priority-tagged packet handle
//! - [`scheduler`] — Admission, eviction, strict-priority dequeue, lifecycle
//! - [`qdisc`] — Capability trait implemented by schedulers
//! - [`shared`] — Mutex-guarded handle for multi-threaded hosts
//! - [`stats`] — Per-instance counters and stats sinks
//! - [`report`] — Text, CSV and Prometheus rendering of stats snapshots
//! - [`config`] — Scheduler configuration, TOML loading, tc-style options
//! - [`error`] — Error types

pub mod band;
pub mod config;
pub mod error;
pub mod occupancy;
pub mod packet;
pub mod qdisc;
pub mod report;
pub mod scheduler;
pub mod shared;
pub mod stats;

pub use config::{ConfigUpdate, SchedulerConfig};
pub use error::{ConfigError, SchedulerError};
pub use packet::{Packet, PriorityTag};
pub use qdisc::Qdisc;
pub use scheduler::{DropReason, SchedulerCore, Verdict};
