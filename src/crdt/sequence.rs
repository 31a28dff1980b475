//! Core sequence CRDT implementation.
//!
//! This module contains the [`Sequence`] engine. It turns index-based edits into
//! identifier-based [`Operation`]s and applies every operation, local or
//! remote, through the single idempotent [`Sequence::apply`] path.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::crdt::allocation::{AllocationStrategy, ExponentialStrategy};
use crate::crdt::change::{Change, Subscribers, SubscriptionId};
use crate::crdt::element::Element;
use crate::crdt::identifier::{Identifier, SiteId};
use crate::crdt::operation::Operation;
use crate::crdt::store::ElementStore;
use crate::error::{Result, SequenceError};
use crate::replication::Upstream;

/// A replicated, ordered sequence of strings.
///
/// # Design
///
/// - Elements live in an [`ElementStore`] ordered by [`Identifier`], bounded by
///   two sentinels that never move
/// - Local edits allocate identifiers between their neighbours through an
///   [`AllocationStrategy`] and a counter minted by the attached [`Upstream`]
/// - Deletes remove elements outright; there are no tombstones
/// - [`apply`](Sequence::apply) decides purely on presence or absence of
///   identifiers, so duplicates and stale operations are silent no-ops
///
/// # Caveats
///
/// A `Move` whose source has not been observed yet is dropped. Moves therefore
/// need causal delivery from the replication layer to be preserved.
pub struct Sequence<S = ExponentialStrategy> {
    site: SiteId,
    strategy: S,
    store: ElementStore,
    upstream: Option<Arc<dyn Upstream>>,
    subscribers: Subscribers,
}

impl Sequence<ExponentialStrategy> {
    /// Creates a detached sequence using the default exponential strategy.
    pub fn with_site(site: SiteId) -> Self {
        Sequence::new(site, ExponentialStrategy::new())
    }
}

impl<S: AllocationStrategy> Sequence<S> {
    /// Creates an empty sequence with no upstream attached.
    ///
    /// A detached sequence can apply operations and delete locally, but cannot
    /// generate identifiers until an upstream is attached.
    pub fn new(site: SiteId, strategy: S) -> Self {
        Sequence {
            site,
            strategy,
            store: ElementStore::new(),
            upstream: None,
            subscribers: Subscribers::new(),
        }
    }

    /// Creates an empty sequence already attached to `upstream`.
    pub fn with_upstream(site: SiteId, strategy: S, upstream: Arc<dyn Upstream>) -> Self {
        let mut sequence = Sequence::new(site, strategy);
        sequence.attach_upstream(upstream);
        sequence
    }

    pub fn attach_upstream(&mut self, upstream: Arc<dyn Upstream>) {
        self.upstream = Some(upstream);
    }

    /// Detaches and returns the current upstream.
    pub fn detach_upstream(&mut self) -> Option<Arc<dyn Upstream>> {
        self.upstream.take()
    }

    pub fn has_upstream(&self) -> bool {
        self.upstream.is_some()
    }

    pub fn site(&self) -> SiteId {
        self.site
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Number of visible elements.
    pub fn size(&self) -> usize {
        self.store.size()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Value at logical index `index`.
    pub fn get(&self, index: usize) -> Result<String> {
        self.store.get(index)
    }

    /// All visible values in order.
    pub fn content(&self) -> Vec<String> {
        self.store.content()
    }

    /// Identifiers of all visible elements in order.
    pub fn identifiers(&self) -> Vec<Identifier> {
        self.store.identifiers()
    }

    /// Every element including sentinels, for debugging.
    pub fn elements(&self) -> Vec<Element> {
        self.store.elements()
    }

    /// Visible elements with their identifiers, in order.
    ///
    /// Applying an [`Operation::Insert`] for each of them rebuilds this
    /// replica's state on an empty one.
    pub fn snapshot(&self) -> Vec<Element> {
        self.store.visible_elements()
    }

    /// Registers a listener for changes produced by [`apply`](Sequence::apply).
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: Fn(&Change) + Send + Sync + 'static,
    {
        self.subscribers.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    /// Inserts `content` so that it ends up at logical index `index`.
    ///
    /// `index` may equal [`size`](Sequence::size) to append.
    ///
    /// # Returns
    ///
    /// * `Ok(Operation)` - The generated operation, already applied and broadcast
    /// * `Err(SequenceError)` - If `index` is out of range or no upstream is attached
    pub fn insert(&mut self, index: usize, content: impl Into<String>) -> Result<Operation> {
        self.check_limits(index, true)?;

        let left = self.id_at(index)?;
        let right = self.id_at(index + 1)?;
        let id = self.allocate_identifier(&left, &right)?;

        let op = Operation::Insert {
            id,
            content: content.into(),
        };
        self.commit_locally_generated(op)
    }

    /// Deletes the element at logical index `index`.
    ///
    /// Deleting does not mint identifiers, so it also works while detached; the
    /// operation is then applied locally only.
    pub fn delete(&mut self, index: usize) -> Result<Operation> {
        self.check_limits(index, false)?;

        let id = self.id_at(index + 1)?;
        let op = Operation::Delete { id };
        self.commit_locally_generated(op)
    }

    /// Moves the element at `from` so that it ends up at logical index `to`.
    ///
    /// Both indices are checked against the size before the move; `to` may
    /// equal the size, which places the element last.
    pub fn move_element(&mut self, from: usize, to: usize) -> Result<Operation> {
        self.check_limits(from, false)?;
        self.check_limits(to, true)?;

        let source = from + 1;
        let from_id = self.id_at(source)?;

        // Neighbours are resolved as if the source were already removed.
        let to = to.min(self.size() - 1);
        let skip_source = |index: usize| if index < source { index } else { index + 1 };
        let left = self.id_at(skip_source(to))?;
        let right = self.id_at(skip_source(to + 1))?;
        let to_id = self.allocate_identifier(&left, &right)?;

        let op = Operation::Move {
            from: from_id,
            to: to_id,
        };
        self.commit_locally_generated(op)
    }

    /// Applies an operation from any source.
    ///
    /// Safe to call with duplicated, reordered or stale operations: anything
    /// that finds its target missing (or, for inserts, already present) is a
    /// silent no-op. So is any operation naming an identifier that is not
    /// [interior](Identifier::is_interior); the sentinels stay first and last.
    /// Returns the emitted change, if any.
    pub fn apply(&mut self, op: &Operation) -> Option<Change> {
        let malformed = match op {
            Operation::Insert { id, .. } | Operation::Delete { id } => !id.is_interior(),
            Operation::Move { from, to } => !from.is_interior() || !to.is_interior(),
        };
        if malformed {
            debug!(
                site = self.site,
                kind = op.kind(),
                "identifier outside the sentinel bounds, ignoring"
            );
            return None;
        }

        let change = match op {
            Operation::Insert { id, content } => {
                let Some(index) = self
                    .store
                    .insert_if_absent(Element::new(id.clone(), content.clone()))
                else {
                    trace!(site = self.site, %id, "insert already applied");
                    return None;
                };
                Change::Insert {
                    index: index - 1,
                    content: content.clone(),
                }
            }
            Operation::Delete { id } => {
                let Some((index, element)) = self.store.remove(id) else {
                    trace!(site = self.site, %id, "delete target not present");
                    return None;
                };
                Change::Delete {
                    index: index - 1,
                    content: element.value,
                }
            }
            Operation::Move { from, to } => {
                let Some((from_index, element)) = self.store.remove(from) else {
                    debug!(site = self.site, %from, "move source not present, dropping move");
                    return None;
                };
                let to_index = match self
                    .store
                    .insert_if_absent(Element::new(to.clone(), element.value.clone()))
                {
                    Some(index) => index,
                    None => self.store.index_of(to)?,
                };
                Change::Move {
                    from: from_index - 1,
                    to: to_index - 1,
                    content: element.value,
                }
            }
        };

        debug!(site = self.site, kind = op.kind(), ?change, "applied operation");
        self.subscribers.publish(&change);
        Some(change)
    }

    fn commit_locally_generated(&mut self, op: Operation) -> Result<Operation> {
        if self.apply(&op).is_none() {
            warn!(
                site = self.site,
                kind = op.kind(),
                "local operation had no effect, not broadcasting"
            );
            return Err(SequenceError::NoEffect { kind: op.kind() });
        }
        if let Some(upstream) = &self.upstream {
            upstream.broadcast(&op);
        }
        Ok(op)
    }

    fn check_limits(&self, index: usize, allow_end: bool) -> Result<()> {
        let size = self.size();
        let in_range = if allow_end { index <= size } else { index < size };
        if in_range {
            Ok(())
        } else {
            Err(SequenceError::IndexOutOfRange { index, size })
        }
    }

    /// Identifier at store index `index`, sentinels included.
    fn id_at(&self, index: usize) -> Result<Identifier> {
        self.store
            .id_at(index)
            .ok_or(SequenceError::IndexOutOfRange {
                index,
                size: self.size(),
            })
    }

    fn allocate_identifier(&self, left: &Identifier, right: &Identifier) -> Result<Identifier> {
        let upstream = self.upstream.as_ref().ok_or(SequenceError::NoUpstream)?;
        let position = self
            .strategy
            .allocate(&left.position, &right.position, self.site)
            .ok_or_else(|| SequenceError::NoPositionAvailable {
                left: left.clone(),
                right: right.clone(),
            })?;
        Ok(Identifier::new(position, upstream.next_counter()))
    }
}

impl<S> fmt::Debug for Sequence<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sequence")
            .field("site", &self.site)
            .field("size", &self.store.size())
            .field("attached", &self.upstream.is_some())
            .field("subscribers", &self.subscribers)
            .finish()
    }
}
