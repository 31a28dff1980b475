//! In-memory upstream that queues broadcast operations.
//!
//! An [`Outbox`] stands in for a network: the engine broadcasts into it, and a
//! test harness or demo drains the queue and delivers the operations to other
//! replicas in whatever order it likes.

use parking_lot::Mutex;
use tracing::trace;

use crate::crdt::{Operation, SiteId};
use crate::replication::Upstream;
use crate::replication::clock::SiteClock;

/// Upstream that records every broadcast operation until drained.
#[derive(Debug)]
pub struct Outbox {
    clock: SiteClock,
    queue: Mutex<Vec<Operation>>,
}

impl Outbox {
    pub fn new(site: SiteId) -> Self {
        Outbox {
            clock: SiteClock::new(site),
            queue: Mutex::new(Vec::new()),
        }
    }

    /// Takes every queued operation, oldest first.
    pub fn drain(&self) -> Vec<Operation> {
        std::mem::take(&mut *self.queue.lock())
    }

    /// Number of operations waiting to be drained.
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn clock(&self) -> &SiteClock {
        &self.clock
    }
}

impl Upstream for Outbox {
    fn next_counter(&self) -> u64 {
        self.clock.tick()
    }

    fn broadcast(&self, op: &Operation) {
        trace!(site = self.clock.site(), kind = op.kind(), "queueing operation");
        self.queue.lock().push(op.clone());
    }
}
