//! Error types for sequence editing.

use thiserror::Error;

use crate::crdt::Identifier;

/// Errors surfaced by index-based sequence edits.
///
/// Redundant or premature operations delivered through
/// [`Sequence::apply`](crate::Sequence::apply) are never errors; they are
/// absorbed silently.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SequenceError {
    #[error("Index out of range: {index} (size: {size})")]
    IndexOutOfRange { index: usize, size: usize },

    #[error("Upstream is required to generate identifiers")]
    NoUpstream,

    /// The neighbours of the edited slot leave no position between them. Only
    /// reachable when two elements share a position, e.g. after an insert was
    /// re-delivered following its delete.
    #[error("No position available between {left} and {right}")]
    NoPositionAvailable { left: Identifier, right: Identifier },

    /// A locally generated operation changed nothing and was not broadcast.
    #[error("Locally generated {kind} had no effect")]
    NoEffect { kind: &'static str },
}

pub type Result<T> = std::result::Result<T, SequenceError>;
