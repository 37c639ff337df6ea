//! Block arithmetic for a sync pass.
//!
//! All values are `U256`. Nothing here wraps: subtraction is checked and
//! addition saturates, so a pass over a range ending at `U256::MAX` still
//! terminates.

use std::fmt;

use alloy::primitives::U256;

/// An inclusive block range `[from, to]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockRange {
    /// First block in the range
    pub from: U256,
    /// Last block in the range (inclusive)
    pub to: U256,
}

impl BlockRange {
    /// Create a range. `from` must not exceed `to`.
    #[must_use]
    pub const fn new(from: U256, to: U256) -> Self {
        Self { from, to }
    }

    /// Number of blocks covered, saturating at `U256::MAX`.
    #[must_use]
    pub fn block_count(&self) -> U256 {
        (self.to - self.from).saturating_add(U256::from(1))
    }

    /// Whether `block` falls inside the range.
    #[must_use]
    pub fn contains(&self, block: U256) -> bool {
        self.from <= block && block <= self.to
    }
}

impl fmt::Display for BlockRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.from, self.to)
    }
}

/// Highest block considered final: `head - lag`.
///
/// Returns `None` when the chain is shorter than the lag.
#[must_use]
pub fn safe_head(head: U256, confirmation_lag: u64) -> Option<U256> {
    head.checked_sub(U256::from(confirmation_lag))
}

/// Partition `[from, safe_head]` into consecutive batches.
///
/// A batch starting at `f` ends at `min(f + batch_size, safe_head)`; the
/// next one starts right after it. Yields nothing when `from > safe_head`.
/// A `batch_size` of zero yields single-block batches.
#[must_use]
pub fn batches(from: U256, safe_head: U256, batch_size: u64) -> Batches {
    Batches {
        next: from,
        end: safe_head,
        span: U256::from(batch_size),
        done: from > safe_head,
    }
}

/// Iterator returned by [`batches`].
#[derive(Debug, Clone)]
pub struct Batches {
    next: U256,
    end: U256,
    span: U256,
    done: bool,
}

impl Iterator for Batches {
    type Item = BlockRange;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let from = self.next;
        let to = from.saturating_add(self.span).min(self.end);
        if to == self.end {
            self.done = true;
        } else {
            // to < end <= U256::MAX
            self.next = to + U256::from(1);
        }

        Some(BlockRange::new(from, to))
    }
}

impl std::iter::FusedIterator for Batches {}

#[cfg(test)]
mod tests {
    use super::*;

    fn u(n: u64) -> U256 {
        U256::from(n)
    }

    fn collect(from: u64, to: u64, size: u64) -> Vec<(u64, u64)> {
        batches(u(from), u(to), size)
            .map(|r| (r.from.to::<u64>(), r.to.to::<u64>()))
            .collect()
    }

    #[test]
    fn test_safe_head() {
        assert_eq!(safe_head(u(150), 10), Some(u(140)));
        assert_eq!(safe_head(u(10), 10), Some(u(0)));
        assert_eq!(safe_head(u(9), 10), None);
        assert_eq!(safe_head(u(5), 0), Some(u(5)));
    }

    #[test]
    fn test_reference_partition() {
        assert_eq!(collect(100, 140, 20), vec![(100, 120), (121, 140)]);
    }

    #[test]
    fn test_single_block_range() {
        assert_eq!(collect(7, 7, 1000), vec![(7, 7)]);
    }

    #[test]
    fn test_empty_when_checkpoint_ahead() {
        assert!(collect(141, 140, 20).is_empty());
    }

    #[test]
    fn test_zero_batch_size_still_advances() {
        assert_eq!(collect(1, 3, 0), vec![(1, 1), (2, 2), (3, 3)]);
    }

    #[test]
    fn test_gapless_and_non_overlapping() {
        for from in 0..30_u64 {
            for to in from..from + 60 {
                for size in 0..25_u64 {
                    let ranges = collect(from, to, size);

                    assert_eq!(ranges.first().map(|r| r.0), Some(from));
                    assert_eq!(ranges.last().map(|r| r.1), Some(to));
                    for pair in ranges.windows(2) {
                        assert_eq!(pair[1].0, pair[0].1 + 1, "gap or overlap at {pair:?}");
                    }
                    for (f, t) in &ranges {
                        assert!(f <= t);
                        assert!(t - f <= size);
                    }
                }
            }
        }
    }

    #[test]
    fn test_terminates_at_u256_max() {
        let from = U256::MAX - u(5);
        let ranges: Vec<BlockRange> = batches(from, U256::MAX, 2).collect();

        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[0], BlockRange::new(from, from + u(2)));
        assert_eq!(ranges[1], BlockRange::new(from + u(3), U256::MAX));
    }

    #[test]
    fn test_block_range_helpers() {
        let range = BlockRange::new(u(100), u(120));
        assert_eq!(range.block_count(), u(21));
        assert!(range.contains(u(100)));
        assert!(range.contains(u(120)));
        assert!(!range.contains(u(121)));
        assert_eq!(range.to_string(), "[100, 120]");
    }
}
