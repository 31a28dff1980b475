//! Change notifications for local observers.
//!
//! Every successful mutation of the element store produces exactly one
//! [`Change`], expressed in logical (sentinel-free) indices. Listeners
//! registered with [`Subscribers`] receive changes synchronously, in emission
//! order.

use serde::{Deserialize, Serialize};

/// Observable effect of an applied operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Change {
    Insert { index: usize, content: String },
    Delete { index: usize, content: String },
    /// `to` is the index observed after the source element was removed
    Move { from: usize, to: usize, content: String },
}

impl Change {
    pub fn content(&self) -> &str {
        match self {
            Change::Insert { content, .. }
            | Change::Delete { content, .. }
            | Change::Move { content, .. } => content,
        }
    }
}

/// Handle returned by [`Subscribers::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn Fn(&Change) + Send + Sync>;

/// Registry of change listeners.
#[derive(Default)]
pub struct Subscribers {
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener`; it is called after every later change.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: Fn(&Change) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    /// Invokes every listener with `change`, in subscription order.
    pub fn publish(&self, change: &Change) {
        for (_, listener) in &self.listeners {
            listener(change);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl std::fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscribers")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
