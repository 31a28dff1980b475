//! Sorted element storage bounded by sentinels.
//!
//! The store keeps every element ordered by [`Identifier`] in a SkipMap and
//! always contains the two sentinel elements as its first and last entries.
//! "Store" indices count the sentinels; "logical" indices do not, so logical
//! index `i` lives at store index `i + 1`.

use crossbeam_skiplist::SkipMap;

use crate::crdt::element::Element;
use crate::crdt::identifier::Identifier;
use crate::error::{Result, SequenceError};

/// Number of sentinel entries held by every store.
const SENTINELS: usize = 2;

/// Ordered membership container for sequence elements.
///
/// Lookups by identifier are O(log n). Anything index-based (`index_of`,
/// `id_at`, `get`, and the index reported by `insert_if_absent` and `remove`)
/// walks the SkipMap from the front and costs O(n), since the map keeps no
/// subtree counts.
pub struct ElementStore {
    /// Values keyed by identifier; SkipMap iteration follows identifier order
    entries: SkipMap<Identifier, String>,
}

impl ElementStore {
    /// Creates a store holding only the two sentinels.
    pub fn new() -> Self {
        let entries = SkipMap::new();

        let left = Element::sentinel_left();
        let right = Element::sentinel_right();
        entries.insert(left.id, left.value);
        entries.insert(right.id, right.value);

        ElementStore { entries }
    }

    /// Number of entries including sentinels. Never less than two.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Number of user-visible elements.
    pub fn size(&self) -> usize {
        self.len() - SENTINELS
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn contains(&self, id: &Identifier) -> bool {
        self.entries.contains_key(id)
    }

    /// Adds `element` unless an element with the same identifier is present.
    ///
    /// Returns the store index of the new element, or `None` when nothing was
    /// added.
    pub fn insert_if_absent(&self, element: Element) -> Option<usize> {
        if self.entries.contains_key(&element.id) {
            return None;
        }
        let index = self.count_below(&element.id);
        self.entries.insert(element.id, element.value);
        Some(index)
    }

    /// Store index of the element with identifier `id`.
    pub fn index_of(&self, id: &Identifier) -> Option<usize> {
        if !self.entries.contains_key(id) {
            return None;
        }
        Some(self.count_below(id))
    }

    /// Number of entries ordered strictly before `id`.
    fn count_below(&self, id: &Identifier) -> usize {
        self.entries
            .iter()
            .take_while(|entry| entry.key() < id)
            .count()
    }

    /// Identifier at store index `index`, sentinels included.
    pub fn id_at(&self, index: usize) -> Option<Identifier> {
        self.entries.iter().nth(index).map(|entry| entry.key().clone())
    }

    /// Element at store index `index`, sentinels included.
    pub fn element_at(&self, index: usize) -> Option<Element> {
        self.entries
            .iter()
            .nth(index)
            .map(|entry| Element::new(entry.key().clone(), entry.value().clone()))
    }

    /// Removes the element with identifier `id`, returning its former store
    /// index and the element. Sentinels are never removed.
    pub fn remove(&self, id: &Identifier) -> Option<(usize, Element)> {
        if id.is_sentinel() {
            return None;
        }
        let index = self.index_of(id)?;
        let entry = self.entries.remove(id)?;
        Some((index, Element::new(entry.key().clone(), entry.value().clone())))
    }

    /// Value at logical index `index`.
    pub fn get(&self, index: usize) -> Result<String> {
        let size = self.size();
        if index >= size {
            return Err(SequenceError::IndexOutOfRange { index, size });
        }
        self.entries
            .iter()
            .nth(index + 1)
            .map(|entry| entry.value().clone())
            .ok_or(SequenceError::IndexOutOfRange { index, size })
    }

    /// All user-visible values in order.
    pub fn content(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|entry| !entry.key().is_sentinel())
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// All user-visible identifiers in order.
    pub fn identifiers(&self) -> Vec<Identifier> {
        self.entries
            .iter()
            .filter(|entry| !entry.key().is_sentinel())
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// All user-visible elements in order.
    pub fn visible_elements(&self) -> Vec<Element> {
        self.entries
            .iter()
            .filter(|entry| !entry.key().is_sentinel())
            .map(|entry| Element::new(entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Every element including sentinels, for debugging.
    pub fn elements(&self) -> Vec<Element> {
        self.entries
            .iter()
            .map(|entry| Element::new(entry.key().clone(), entry.value().clone()))
            .collect()
    }
}

impl Default for ElementStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for ElementStore {
    fn clone(&self) -> Self {
        let entries = SkipMap::new();
        for entry in self.entries.iter() {
            entries.insert(entry.key().clone(), entry.value().clone());
        }
        ElementStore { entries }
    }
}
