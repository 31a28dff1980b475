//! Position allocation between two existing positions.
//!
//! The sequence engine only depends on the [`AllocationStrategy`] contract: given
//! `left < right`, return a position strictly between them. [`ExponentialStrategy`]
//! is the strategy shipped with the crate, an exponential tree in the LSEQ family
//! where every level doubles the number of available digits.

use crate::crdt::identifier::{Position, ROOT_BASE, SiteId};

/// Default maximum distance from the left bound when choosing a digit.
pub const DEFAULT_BOUNDARY: u64 = 10;

/// Produces new positions for locally generated elements.
pub trait AllocationStrategy {
    /// Returns a position `p` such that `left < p < right`, or `None` when no
    /// such position exists (`left >= right`, or `right` is `left` followed
    /// only by zero digits).
    fn allocate(&self, left: &Position, right: &Position, site: SiteId) -> Option<Position>;
}

/// Exponential-tree allocation.
///
/// Level `d` of the tree has `2^(4 + d)` digits. Allocation copies the left
/// bound level by level until it finds a level with room between the bounds,
/// then picks a digit close to the left bound, offset by the site id so that
/// concurrent allocations from different sites spread out. A final digit of
/// `site + 1` follows, so two sites never produce the same position for the
/// same bounds and no allocated position ends in zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExponentialStrategy {
    boundary: u64,
}

impl ExponentialStrategy {
    /// Creates a strategy with [`DEFAULT_BOUNDARY`].
    pub fn new() -> Self {
        ExponentialStrategy {
            boundary: DEFAULT_BOUNDARY,
        }
    }

    /// Creates a strategy that never allocates further than `boundary` digits
    /// to the right of the left bound. A boundary of zero is treated as one.
    pub fn with_boundary(boundary: u64) -> Self {
        ExponentialStrategy {
            boundary: boundary.max(1),
        }
    }

    pub fn boundary(&self) -> u64 {
        self.boundary
    }
}

impl Default for ExponentialStrategy {
    fn default() -> Self {
        Self::new()
    }
}

/// Number of digits available at `depth`.
fn level_base(depth: usize) -> u64 {
    if depth == 0 {
        return ROOT_BASE;
    }
    let shift = (ROOT_BASE.trailing_zeros() as usize + depth).min(62);
    1u64 << shift
}

impl AllocationStrategy for ExponentialStrategy {
    fn allocate(&self, left: &Position, right: &Position, site: SiteId) -> Option<Position> {
        if left >= right {
            return None;
        }

        let lower = left.digits();
        let upper = right.digits();
        let levels = lower.len().max(upper.len());
        let mut digits = Vec::with_capacity(levels + 2);

        // While our prefix equals the right bound's prefix, the right digit caps
        // the level; once it diverges the whole level base is available.
        let mut capped_by_right = true;

        for depth in 0..=levels {
            if capped_by_right && depth >= upper.len() {
                // Right bound is the left bound padded with zeros
                return None;
            }

            let lo = lower.get(depth).copied().unwrap_or(0);
            let hi = if capped_by_right {
                upper[depth]
            } else {
                level_base(depth)
            };

            if hi > lo && hi - lo > 1 {
                let window = (hi - lo - 1).min(self.boundary);
                digits.push(lo + 1 + u64::from(site) % window);
                digits.push(u64::from(site) + 1);
                return Some(Position::from_digits(digits));
            }

            digits.push(lo);
            if hi != lo {
                capped_by_right = false;
            }
        }

        // Uncapped levels past the left bound always have room
        None
    }
}
