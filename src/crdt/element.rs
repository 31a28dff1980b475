//! Element definition for the sequence.
//!
//! An element is an immutable `(identifier, value)` pair. The two sentinel
//! elements carry the fixed [`Identifier::left`] and [`Identifier::right`]
//! identifiers and an empty value; they mark the boundaries of the sequence on
//! every replica and are never exposed as content.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::crdt::identifier::Identifier;

/// A single value within the sequence.
///
/// Equality and ordering are defined by `id` alone, so two elements with the
/// same identifier are the same element regardless of their payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    /// Identifier that determines this element's place in the sequence
    pub id: Identifier,
    /// Opaque payload
    pub value: String,
}

impl Element {
    pub fn new(id: Identifier, value: impl Into<String>) -> Self {
        Element {
            id,
            value: value.into(),
        }
    }

    /// The boundary element that precedes every other element.
    pub fn sentinel_left() -> Self {
        Element {
            id: Identifier::left(),
            value: String::new(),
        }
    }

    /// The boundary element that follows every other element.
    pub fn sentinel_right() -> Self {
        Element {
            id: Identifier::right(),
            value: String::new(),
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.id.is_sentinel()
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Element {}

impl PartialOrd for Element {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Element {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}
