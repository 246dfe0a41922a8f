//! Mutex-guarded scheduler handle.
//!
//! The scheduler itself is single-owner. Hosts that feed it from several
//! producer threads, or drain it from a different thread than the one that
//! enqueues, share it through [`SharedQdisc`]: every public operation takes
//! the lock for its whole duration, so a band queue and the occupancy bitmap
//! are never observed half-updated.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::ConfigUpdate;
use crate::error::SchedulerError;
use crate::packet::Packet;
use crate::qdisc::Qdisc;
use crate::scheduler::Verdict;

/// Cloneable, thread-safe handle to a queueing discipline.
#[derive(Debug)]
pub struct SharedQdisc<Q> {
    inner: Arc<Mutex<Q>>,
}

impl<Q> Clone for SharedQdisc<Q> {
    fn clone(&self) -> Self {
        SharedQdisc {
            inner: self.inner.clone(),
        }
    }
}

impl<Q: Qdisc> SharedQdisc<Q> {
    pub fn new(qdisc: Q) -> Self {
        SharedQdisc {
            inner: Arc::new(Mutex::new(qdisc)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Q> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn enqueue(&self, packet: Packet) -> Result<Verdict, SchedulerError> {
        self.lock().enqueue(packet)
    }

    pub fn dequeue(&self) -> Option<Packet> {
        self.lock().dequeue()
    }

    /// Run `f` on the packet `dequeue` would return, under the lock.
    pub fn peek_with<R>(&self, f: impl FnOnce(Option<&Packet>) -> R) -> R {
        let guard = self.lock();
        f(guard.peek())
    }

    pub fn drop_one(&self) -> Result<usize, SchedulerError> {
        self.lock().drop_one()
    }

    pub fn reconfigure(&self, update: ConfigUpdate) {
        self.lock().reconfigure(update)
    }

    pub fn reset(&self) {
        self.lock().reset()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Exclusive access for anything the trait does not cover (stats,
    /// accessors of the concrete type).
    pub fn with<R>(&self, f: impl FnOnce(&mut Q) -> R) -> R {
        f(&mut self.lock())
    }

    /// Recover the discipline if this is the last handle.
    pub fn try_unwrap(self) -> Result<Q, Self> {
        Arc::try_unwrap(self.inner)
            .map(|m| m.into_inner().unwrap_or_else(PoisonError::into_inner))
            .map_err(|inner| SharedQdisc { inner })
    }
}
