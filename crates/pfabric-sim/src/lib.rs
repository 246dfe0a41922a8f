//! # pfabric-sim
//!
//! Flow-level simulation of a single switch egress port, used to compare
//! the pFabric scheduler with a drop-tail FIFO and an ideal SRPT schedule.
//!
//! ## Crate structure
//!
//! - [`frame`] — Ethernet + IPv4 frames, TOS-based classification
//! - [`priority`] — Flow-to-band priority policies
//! - [`workload`] — Seeded web-search flow mix
//! - [`flow`] — Window-limited sender with timeout retransmission
//! - [`fifo`] — Drop-tail FIFO baseline discipline
//! - [`ideal`] — Link model and ideal SRPT completion times
//! - [`sim`] — Tick-driven simulation and report

pub mod fifo;
pub mod flow;
pub mod frame;
pub mod ideal;
pub mod priority;
pub mod sim;
pub mod workload;

pub use sim::{SimConfig, SimReport, Simulation};
