//! Identifier and position types for sequence elements.
//!
//! An [`Identifier`] pairs a structural [`Position`] produced by an allocation
//! strategy with a globally unique counter minted by the replication layer.
//! Identifiers are ordered first by position, then by counter, which gives every
//! replica the same total order over the same set of identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a replica (site) taking part in the sequence.
///
/// The site id feeds the allocation strategy and is embedded in the counters
/// minted by [`SiteClock`](crate::replication::SiteClock).
pub type SiteId = u32;

/// Base of the first level of the position space.
///
/// The right sentinel sits exactly at this digit, so every allocated position
/// starts with a digit strictly below it.
pub const ROOT_BASE: u64 = 1 << 4;

/// An opaque, totally ordered point in the position space.
///
/// Positions are compared lexicographically digit by digit; a prefix sorts
/// before any of its extensions.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Position(Vec<u64>);

impl Position {
    /// Builds a position from raw digits. Strategies are the only intended callers.
    pub fn from_digits(digits: Vec<u64>) -> Self {
        Position(digits)
    }

    /// The digits of this position, most significant first.
    pub fn digits(&self) -> &[u64] {
        &self.0
    }

    /// Number of levels in this position.
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Position of the left sentinel.
    pub fn min() -> Self {
        Position(vec![0])
    }

    /// Position of the right sentinel.
    pub fn max() -> Self {
        Position(vec![ROOT_BASE])
    }

    /// Whether this position could have come out of an allocation: it is not
    /// empty, its last digit is not zero, and it sorts strictly between the
    /// sentinel positions.
    ///
    /// A position ending in zero leaves no room below it for its own prefix, so
    /// such positions are never allocated and never accepted from peers.
    pub fn is_allocatable(&self) -> bool {
        matches!(self.0.last(), Some(&digit) if digit != 0) && *self < Position::max()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for digit in &self.0 {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{}", digit)?;
            first = false;
        }
        Ok(())
    }
}

/// A unique identifier for each element in the sequence.
///
/// # Ordering
///
/// The derived ordering compares `position` first and breaks ties with
/// `counter`. Two replicas that allocate the same position concurrently still
/// produce distinct identifiers because their counters never collide.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Identifier {
    /// Structural ordering component produced by the allocation strategy
    pub position: Position,
    /// Globally unique counter obtained from the replication layer
    pub counter: u64,
}

impl Identifier {
    /// Creates an identifier from its parts
    pub fn new(position: Position, counter: u64) -> Self {
        Identifier { position, counter }
    }

    /// The fixed identifier that sorts before every allocatable identifier.
    pub fn left() -> Self {
        Identifier {
            position: Position::min(),
            counter: 0,
        }
    }

    /// The fixed identifier that sorts after every allocatable identifier.
    pub fn right() -> Self {
        Identifier {
            position: Position::max(),
            counter: u64::MAX,
        }
    }

    /// Returns true for either sentinel.
    pub fn is_sentinel(&self) -> bool {
        *self == Identifier::left() || *self == Identifier::right()
    }

    /// Returns true when this identifier can name a user-visible element,
    /// i.e. it sorts strictly between the two sentinels and its position is
    /// [allocatable](Position::is_allocatable).
    pub fn is_interior(&self) -> bool {
        self.position.is_allocatable()
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:#x}", self.position, self.counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(digits: &[u64]) -> Position {
        Position::from_digits(digits.to_vec())
    }

    #[test]
    fn test_position_ordering() {
        assert!(pos(&[1]) < pos(&[2]));
        assert!(pos(&[1]) < pos(&[1, 0]));
        assert!(pos(&[1, 5]) < pos(&[2]));
        assert!(pos(&[1, 5]) < pos(&[1, 6, 1]));
    }

    #[test]
    fn test_identifier_ordering() {
        let a = Identifier::new(pos(&[3]), 7);
        let b = Identifier::new(pos(&[3]), 9);
        let c = Identifier::new(pos(&[4]), 1);

        // Same position, counter decides
        assert!(a < b);
        // Position dominates counter
        assert!(b < c);
    }

    #[test]
    fn test_sentinels_bound_the_space() {
        let left = Identifier::left();
        let right = Identifier::right();

        assert!(left < right);
        assert!(left.is_sentinel());
        assert!(right.is_sentinel());

        let lowest = Identifier::new(pos(&[0, 1]), 0);
        let highest = Identifier::new(pos(&[ROOT_BASE - 1, u64::MAX]), u64::MAX - 1);
        assert!(left < lowest);
        assert!(highest < right);
        assert!(!lowest.is_sentinel());
    }

    #[test]
    fn test_interior_identifiers() {
        assert!(Identifier::new(pos(&[2, 2]), 1).is_interior());
        assert!(Identifier::new(pos(&[0, 0, 3]), 1).is_interior());
        assert!(Identifier::new(pos(&[ROOT_BASE - 1]), u64::MAX).is_interior());

        assert!(!Identifier::left().is_interior());
        assert!(!Identifier::right().is_interior());
        // Empty, zero-terminated, and at or past the right sentinel
        assert!(!Identifier::new(pos(&[]), 1).is_interior());
        assert!(!Identifier::new(pos(&[0, 0]), 1).is_interior());
        assert!(!Identifier::new(pos(&[5, 0]), 1).is_interior());
        assert!(!Identifier::new(pos(&[ROOT_BASE]), 1).is_interior());
        assert!(!Identifier::new(pos(&[ROOT_BASE + 1]), 1).is_interior());
        assert!(!Identifier::new(pos(&[ROOT_BASE, 3]), 1).is_interior());
    }

    #[test]
    fn test_display() {
        let id = Identifier::new(pos(&[0, 12, 3]), 0x1_0000_0002);
        assert_eq!(id.to_string(), "0.12.3@0x100000002");
    }

    #[test]
    fn test_serde_is_transparent_for_positions() {
        let id = Identifier::new(pos(&[2, 9]), 4);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, r#"{"position":[2,9],"counter":4}"#);
    }
}
