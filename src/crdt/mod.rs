//! Sequence CRDT implementation module.
//!
//! This module contains the replicated sequence engine and all its supporting
//! types: identifiers, the allocation contract, the element store, operations
//! and change notifications.

pub mod allocation;
pub mod change;
pub mod element;
pub mod identifier;
pub mod operation;
pub mod sequence;
pub mod store;

// Re-export the main public API
pub use allocation::{AllocationStrategy, DEFAULT_BOUNDARY, ExponentialStrategy};
pub use change::{Change, Subscribers, SubscriptionId};
pub use element::Element;
pub use identifier::{Identifier, Position, ROOT_BASE, SiteId};
pub use operation::Operation;
pub use sequence::Sequence;
pub use store::ElementStore;
