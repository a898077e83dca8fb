//! Ordered sets of disjoint half-open time intervals

use crate::error::{CoreError, CoreResult};
use std::fmt;

/// An ordered set of disjoint `[start, end)` intervals
///
/// Overlapping or touching intervals are merged on insertion, so the stored
/// intervals are always sorted and separated by gaps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ranges<T> {
    ranges: Vec<(T, T)>,
}

impl<T> Default for Ranges<T> {
    fn default() -> Self {
        Self { ranges: Vec::new() }
    }
}

impl<T: Copy + Ord> Ranges<T> {
    /// Create an empty range set
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a range set holding a single interval
    pub fn single(start: T, end: T) -> Self {
        let mut ranges = Self::new();
        ranges.add(start, end);
        ranges
    }

    /// Add `[start, end)`, merging with any overlapping or touching interval
    ///
    /// Empty intervals are ignored. Returns the number of stored intervals.
    pub fn add(&mut self, start: T, end: T) -> usize {
        debug_assert!(start <= end, "range start must not exceed its end");
        if start >= end {
            return self.ranges.len();
        }

        let (mut start, mut end) = (start, end);
        let mut merged = Vec::with_capacity(self.ranges.len() + 1);
        let mut inserted = false;

        for &(s, e) in &self.ranges {
            if e < start {
                merged.push((s, e));
            } else if end < s {
                if !inserted {
                    merged.push((start, end));
                    inserted = true;
                }
                merged.push((s, e));
            } else {
                start = start.min(s);
                end = end.max(e);
            }
        }
        if !inserted {
            merged.push((start, end));
        }

        self.ranges = merged;
        self.ranges.len()
    }

    /// Checked variant of [`Ranges::add`] for intervals from untrusted input
    pub fn try_add(&mut self, start: T, end: T) -> CoreResult<usize>
    where
        T: fmt::Debug,
    {
        if start > end {
            return Err(CoreError::InvalidRange {
                start: format!("{:?}", start),
                end: format!("{:?}", end),
            });
        }
        Ok(self.add(start, end))
    }

    /// Number of stored intervals
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Whether no interval is stored
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Start of the interval at `index`
    pub fn start(&self, index: usize) -> T {
        self.ranges[index].0
    }

    /// End of the interval at `index`
    pub fn end(&self, index: usize) -> T {
        self.ranges[index].1
    }

    /// The last interval, if any
    pub fn last(&self) -> Option<(T, T)> {
        self.ranges.last().copied()
    }

    /// Iterate over the stored intervals in order
    pub fn iter(&self) -> impl Iterator<Item = (T, T)> + '_ {
        self.ranges.iter().copied()
    }

    /// Remove every interval
    pub fn clear(&mut self) {
        self.ranges.clear();
    }

    /// Set intersection of two range sets
    pub fn intersection_with(&self, other: &Ranges<T>) -> Ranges<T> {
        let mut result = Ranges::new();
        let (mut i, mut j) = (0, 0);

        while i < self.ranges.len() && j < other.ranges.len() {
            let (a_start, a_end) = self.ranges[i];
            let (b_start, b_end) = other.ranges[j];

            let max_start = a_start.max(b_start);
            let min_end = a_end.min(b_end);
            if max_start < min_end {
                result.ranges.push((max_start, min_end));
            }

            if a_end < b_end {
                i += 1;
            } else {
                j += 1;
            }
        }

        result
    }
}

impl<T: fmt::Display> fmt::Display for Ranges<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (index, (start, end)) in self.ranges.iter().enumerate() {
            if index > 0 {
                write!(f, " ")?;
            }
            write!(f, "[{}, {})", start, end)?;
        }
        write!(f, "}}")
    }
}
