//! Replication collaborator contract and in-memory implementations.
//!
//! The sequence engine talks to the outside world through [`Upstream`]: it asks
//! for globally unique counters when it mints identifiers and hands every
//! locally generated operation over for broadcast. Delivery guarantees belong
//! to the upstream, not the engine.

pub mod clock;
pub mod outbox;

pub use clock::{SITE_BITS, SiteClock, split_counter};
pub use outbox::Outbox;

use crate::crdt::Operation;

/// Counter source and broadcaster for one replica.
pub trait Upstream: Send + Sync {
    /// Returns a counter no other call on any replica has returned or will return.
    fn next_counter(&self) -> u64;

    /// Forwards a locally generated operation to other replicas. Fire and forget.
    fn broadcast(&self, op: &Operation);
}
