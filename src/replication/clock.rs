//! Site-prefixed counter source for identifier generation.
//!
//! Counters combine a per-replica sequence number with the replica's site id,
//! so counters minted on different sites can never collide while counters from
//! one site strictly increase.

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use crate::crdt::SiteId;

/// Number of low bits reserved for the site id.
pub const SITE_BITS: u32 = 32;

/// A thread-safe monotonic counter scoped to one replica.
#[derive(Debug)]
pub struct SiteClock {
    site: SiteId,
    sequence: AtomicU64,
}

impl SiteClock {
    /// Creates a clock for `site` that has minted nothing yet
    pub fn new(site: SiteId) -> Self {
        SiteClock {
            site,
            sequence: AtomicU64::new(0),
        }
    }

    /// Mints the next counter for this site.
    pub fn tick(&self) -> u64 {
        let sequence = self.sequence.fetch_add(1, AtomicOrdering::SeqCst) + 1;
        (sequence << SITE_BITS) | u64::from(self.site)
    }

    /// Number of counters minted so far.
    pub fn current_sequence(&self) -> u64 {
        self.sequence.load(AtomicOrdering::SeqCst)
    }

    pub fn site(&self) -> SiteId {
        self.site
    }
}

/// Splits a counter back into `(sequence, site)`.
pub fn split_counter(counter: u64) -> (u64, SiteId) {
    (counter >> SITE_BITS, (counter & u64::from(u32::MAX)) as SiteId)
}
