//! Identifier-based operations exchanged between replicas.

use serde::{Deserialize, Serialize};

use crate::crdt::identifier::Identifier;

/// An edit expressed purely in terms of identifiers.
///
/// Operations carry no indices, so they can be applied on any replica in any
/// order. They are transient messages; only their effect on the element store
/// persists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    /// Introduce a new element
    Insert { id: Identifier, content: String },
    /// Remove the element with this identifier, if present
    Delete { id: Identifier },
    /// Re-home the element at `from` under the freshly allocated `to`
    Move { from: Identifier, to: Identifier },
}

impl Operation {
    /// The identifier this operation creates, if any.
    pub fn created_id(&self) -> Option<&Identifier> {
        match self {
            Operation::Insert { id, .. } => Some(id),
            Operation::Move { to, .. } => Some(to),
            Operation::Delete { .. } => None,
        }
    }

    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Operation::Insert { .. } => "insert",
            Operation::Delete { .. } => "delete",
            Operation::Move { .. } => "move",
        }
    }
}
