//! Shared state for the relay server.
//!
//! The server hosts one replica. Operations generated by that replica and
//! operations received from peers are fanned out to every WebSocket session
//! through a broadcast channel.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};
use tracing::trace;

use crate::crdt::{ExponentialStrategy, Operation, Sequence, SiteId};
use crate::replication::{SiteClock, Upstream};

/// Capacity of the relay channel before slow sessions start lagging.
pub const RELAY_CAPACITY: usize = 1024;

/// An operation on its way to WebSocket sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Session that sent the operation; `None` for operations generated by the
    /// hosted replica or posted over HTTP
    pub origin: Option<String>,
    pub op: Operation,
}

/// Upstream for the hosted replica: counters from a [`SiteClock`], broadcasts
/// into the relay channel.
pub struct RelayUpstream {
    clock: SiteClock,
    sender: broadcast::Sender<Envelope>,
}

impl RelayUpstream {
    pub fn new(site: SiteId, sender: broadcast::Sender<Envelope>) -> Self {
        RelayUpstream {
            clock: SiteClock::new(site),
            sender,
        }
    }
}

impl Upstream for RelayUpstream {
    fn next_counter(&self) -> u64 {
        self.clock.tick()
    }

    fn broadcast(&self, op: &Operation) {
        let envelope = Envelope {
            origin: None,
            op: op.clone(),
        };
        // No connected sessions is not an error
        if self.sender.send(envelope).is_err() {
            trace!(kind = op.kind(), "no sessions to relay to");
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub site: SiteId,
    pub sequence: Arc<RwLock<Sequence>>,
    relay: broadcast::Sender<Envelope>,
}

impl AppState {
    /// Creates a state hosting an empty replica for `site`.
    pub fn new(site: SiteId) -> Self {
        let (relay, _) = broadcast::channel(RELAY_CAPACITY);
        let upstream = Arc::new(RelayUpstream::new(site, relay.clone()));
        let sequence = Sequence::with_upstream(site, ExponentialStrategy::new(), upstream);

        AppState {
            site,
            sequence: Arc::new(RwLock::new(sequence)),
            relay,
        }
    }

    /// Forwards an operation received from a peer to every session except its origin.
    pub fn relay(&self, origin: Option<String>, op: Operation) {
        if self.relay.send(Envelope { origin, op }).is_err() {
            trace!("no sessions to relay to");
        }
    }

    /// Receiver for every operation relayed from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.relay.subscribe()
    }
}
