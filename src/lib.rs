//! # crdt-seq - Replicated Ordered Sequence
//!
//! A Conflict-free Replicated Data Type (CRDT) for an ordered, mutable sequence of
//! strings. Replicas edit by index; edits travel between replicas as
//! identifier-based operations that can be delivered in any order, any number of
//! times, and still converge.
//!
//! ## Features
//!
//! - **Conflict-free**: Insert, delete and move operations commute on every replica
//! - **Idempotent**: Duplicate deliveries are silently absorbed
//! - **Dense identifiers**: Exponential-tree positions leave room between any two elements
//! - **Tombstone-free deletion**: Deleted elements are removed outright
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use crdt_seq::{ExponentialStrategy, Outbox, Sequence};
//!
//! let outbox = Arc::new(Outbox::new(1));
//! let mut seq = Sequence::with_upstream(1, ExponentialStrategy::new(), outbox.clone());
//! seq.insert(0, "hello").unwrap();
//! seq.insert(1, "world").unwrap();
//! assert_eq!(seq.content(), vec!["hello", "world"]);
//!
//! // Operations queued for other replicas
//! let ops = outbox.drain();
//! let mut other = Sequence::with_site(2);
//! for op in ops.iter().rev() {
//!     other.apply(op);
//! }
//! assert_eq!(other.content(), seq.content());
//! ```

pub mod config;
pub mod crdt;
pub mod error;
pub mod replication;
pub mod server;

// Re-export the main public API
pub use crdt::{AllocationStrategy, ExponentialStrategy, Identifier, Position, SiteId};
pub use crdt::{Change, Element, ElementStore, Operation, Sequence, SubscriptionId};
pub use error::{Result, SequenceError};
pub use replication::{Outbox, SiteClock, Upstream};
