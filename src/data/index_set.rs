//! IndexSet: a subset of a global index space `[0, size)`.
//!
//! Index sets describe which rows a process owns and which rows it considers
//! locally relevant (owned plus referenced ghosts). They are stored as sorted,
//! disjoint, non-adjacent half-open ranges so that the common contiguous case
//! costs a single range.

use crate::sparsity_error::SparsityError;
use itertools::Itertools;
use std::ops::Range;

/// A set of indices drawn from `[0, size)`.
///
/// # Invariants
///
/// - `ranges` is sorted by start, every range is non-empty, and no two ranges
///   overlap or touch (`a.end < b.start` for consecutive `a`, `b`).
/// - Every range lies within `[0, size)`.
/// - `offsets[k]` is the number of members in `ranges[..k]`.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "IndexSetRaw")]
pub struct IndexSet {
    size: usize,
    ranges: Vec<Range<usize>>,
    #[serde(skip)]
    offsets: Vec<usize>,
}

/// Serialized form of [`IndexSet`], checked before use.
#[derive(serde::Deserialize)]
struct IndexSetRaw {
    size: usize,
    ranges: Vec<Range<usize>>,
}

impl TryFrom<IndexSetRaw> for IndexSet {
    type Error = SparsityError;

    fn try_from(raw: IndexSetRaw) -> Result<Self, Self::Error> {
        for (k, r) in raw.ranges.iter().enumerate() {
            if r.is_empty() || r.end > raw.size {
                return Err(SparsityError::InvalidArgument(format!(
                    "range {r:?} is empty or outside [0, {})",
                    raw.size
                )));
            }
            if k > 0 && raw.ranges[k - 1].end >= r.start {
                return Err(SparsityError::InvalidArgument(format!(
                    "ranges {:?} and {r:?} are not sorted and separated",
                    raw.ranges[k - 1]
                )));
            }
        }
        let mut set = Self {
            size: raw.size,
            ranges: raw.ranges,
            offsets: Vec::new(),
        };
        set.compute_offsets();
        Ok(set)
    }
}

impl IndexSet {
    /// Empty set over the index space `[0, size)`.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            ranges: Vec::new(),
            offsets: Vec::new(),
        }
    }

    /// Set containing every index of `[0, size)`.
    pub fn complete(size: usize) -> Self {
        let mut set = Self::new(size);
        if size > 0 {
            set.ranges.push(0..size);
            set.offsets.push(0);
        }
        set
    }

    /// Set containing exactly `range` within `[0, size)`.
    pub fn from_range(size: usize, range: Range<usize>) -> Result<Self, SparsityError> {
        let mut set = Self::new(size);
        set.add_range(range)?;
        Ok(set)
    }

    /// Set containing the given indices.
    pub fn from_indices(
        size: usize,
        indices: impl IntoIterator<Item = usize>,
    ) -> Result<Self, SparsityError> {
        let mut set = Self::new(size);
        set.add_indices(indices)?;
        Ok(set)
    }

    /// Size of the global index space.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Add a single index.
    ///
    /// # Errors
    /// `InvalidArgument` if `index >= size`.
    pub fn add_index(&mut self, index: usize) -> Result<(), SparsityError> {
        let end = index.checked_add(1).ok_or_else(|| {
            SparsityError::InvalidArgument(format!(
                "index {index} is outside the index space [0, {})",
                self.size
            ))
        })?;
        self.add_range(index..end)
    }

    /// Add every index yielded by `indices`.
    pub fn add_indices(
        &mut self,
        indices: impl IntoIterator<Item = usize>,
    ) -> Result<(), SparsityError> {
        let mut sorted: Vec<usize> = indices.into_iter().collect();
        sorted.sort_unstable();
        sorted.dedup();
        if let Some(&last) = sorted.last() {
            if last >= self.size {
                return Err(SparsityError::InvalidArgument(format!(
                    "index {last} is outside the index space [0, {})",
                    self.size
                )));
            }
        }
        // group consecutive runs so a dense list becomes a single range
        let runs = sorted
            .into_iter()
            .map(|i| i..i + 1)
            .coalesce(|a, b| if a.end == b.start { Ok(a.start..b.end) } else { Err((a, b)) });
        self.ranges.extend(runs);
        self.normalize();
        Ok(())
    }

    /// Add the half-open range `range`. Empty ranges are ignored.
    ///
    /// # Errors
    /// `InvalidArgument` if the range extends past `size`.
    pub fn add_range(&mut self, range: Range<usize>) -> Result<(), SparsityError> {
        if range.end > self.size {
            return Err(SparsityError::InvalidArgument(format!(
                "range {range:?} is outside the index space [0, {})",
                self.size
            )));
        }
        if range.is_empty() {
            return Ok(());
        }
        self.ranges.push(range);
        self.normalize();
        Ok(())
    }

    fn normalize(&mut self) {
        self.ranges.sort_unstable_by_key(|r| r.start);
        let merged: Vec<Range<usize>> = std::mem::take(&mut self.ranges)
            .into_iter()
            .coalesce(|a, b| {
                if b.start <= a.end {
                    Ok(a.start..a.end.max(b.end))
                } else {
                    Err((a, b))
                }
            })
            .collect();
        self.ranges = merged;
        self.compute_offsets();
    }

    fn compute_offsets(&mut self) {
        self.offsets.clear();
        let mut count = 0;
        for r in &self.ranges {
            self.offsets.push(count);
            count += r.len();
        }
    }

    /// Membership test, **O(log r)** in the number of ranges.
    pub fn contains(&self, index: usize) -> bool {
        self.range_position(index).is_some()
    }

    fn range_position(&self, index: usize) -> Option<usize> {
        // first range whose end is past `index`
        let pos = self.ranges.partition_point(|r| r.end <= index);
        match self.ranges.get(pos) {
            Some(r) if r.start <= index => Some(pos),
            _ => None,
        }
    }

    /// Number of indices in the set.
    pub fn n_elements(&self) -> usize {
        match (self.offsets.last(), self.ranges.last()) {
            (Some(&o), Some(r)) => o + r.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// True if the set is a single range (or empty).
    pub fn is_contiguous(&self) -> bool {
        self.ranges.len() <= 1
    }

    /// The normalized ranges making up the set.
    pub fn ranges(&self) -> &[Range<usize>] {
        &self.ranges
    }

    /// Ascending iterator over all members.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.ranges.iter().flat_map(|r| r.clone())
    }

    /// Position of `index` among the members, counted from zero. **O(log r)**.
    pub fn index_within_set(&self, index: usize) -> Option<usize> {
        let pos = self.range_position(index)?;
        Some(self.offsets[pos] + (index - self.ranges[pos].start))
    }

    /// The `n`-th member in ascending order. **O(log r)**.
    pub fn nth_index_in_set(&self, n: usize) -> Option<usize> {
        let pos = self.offsets.partition_point(|&o| o <= n).checked_sub(1)?;
        let r = &self.ranges[pos];
        let k = n - self.offsets[pos];
        (k < r.len()).then(|| r.start + k)
    }

    /// Smallest member, if any.
    pub fn first(&self) -> Option<usize> {
        self.ranges.first().map(|r| r.start)
    }

    fn check_same_space(&self, other: &IndexSet) -> Result<(), SparsityError> {
        if self.size != other.size {
            return Err(SparsityError::InvalidArgument(format!(
                "index spaces differ: {} vs {}",
                self.size, other.size
            )));
        }
        Ok(())
    }

    /// Members of either set.
    pub fn union(&self, other: &IndexSet) -> Result<IndexSet, SparsityError> {
        self.check_same_space(other)?;
        let mut out = self.clone();
        out.ranges.extend(other.ranges.iter().cloned());
        out.normalize();
        Ok(out)
    }

    /// Members of both sets.
    pub fn intersection(&self, other: &IndexSet) -> Result<IndexSet, SparsityError> {
        self.check_same_space(other)?;
        let mut out = IndexSet::new(self.size);
        let (mut i, mut j) = (0, 0);
        while i < self.ranges.len() && j < other.ranges.len() {
            let a = &self.ranges[i];
            let b = &other.ranges[j];
            let lo = a.start.max(b.start);
            let hi = a.end.min(b.end);
            if lo < hi {
                out.ranges.push(lo..hi);
            }
            if a.end < b.end {
                i += 1;
            } else {
                j += 1;
            }
        }
        out.compute_offsets();
        Ok(out)
    }

    /// Members of `self` that are not in `other`.
    pub fn subtract(&self, other: &IndexSet) -> Result<IndexSet, SparsityError> {
        self.check_same_space(other)?;
        let mut out = IndexSet::new(self.size);
        for r in &self.ranges {
            let mut start = r.start;
            for cut in other.ranges.iter().filter(|c| c.end > r.start && c.start < r.end) {
                if cut.start > start {
                    out.ranges.push(start..cut.start);
                }
                start = start.max(cut.end);
            }
            if start < r.end {
                out.ranges.push(start..r.end);
            }
        }
        out.compute_offsets();
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_merge_when_touching() {
        let mut s = IndexSet::new(20);
        s.add_range(0..3).unwrap();
        s.add_range(3..5).unwrap();
        s.add_range(8..10).unwrap();
        s.add_index(7).unwrap();
        assert_eq!(s.ranges(), &[0..5, 7..10]);
        assert_eq!(s.n_elements(), 8);
        assert!(!s.is_contiguous());
    }

    #[test]
    fn out_of_space_is_rejected() {
        let mut s = IndexSet::new(4);
        assert!(matches!(s.add_index(4), Err(SparsityError::InvalidArgument(_))));
        assert!(s.add_range(2..5).is_err());
        assert!(IndexSet::from_indices(4, [0, 9]).is_err());
        assert!(matches!(
            s.add_index(usize::MAX),
            Err(SparsityError::InvalidArgument(_))
        ));
    }

    #[test]
    fn positions_agree_with_iteration_on_round_robin_set() {
        // every third index: many single-element ranges
        let s = IndexSet::from_indices(300, (0..300).step_by(3)).unwrap();
        assert_eq!(s.ranges().len(), 100);
        for (k, i) in s.iter().enumerate() {
            assert_eq!(s.index_within_set(i), Some(k));
            assert_eq!(s.nth_index_in_set(k), Some(i));
        }
        assert_eq!(s.n_elements(), 100);
        let rest = IndexSet::complete(300).subtract(&s).unwrap();
        assert_eq!(rest.n_elements(), 200);
        assert_eq!(rest.nth_index_in_set(199), Some(299));
        assert_eq!(rest.index_within_set(4), Some(2));
    }

    #[test]
    fn positions_within_set() {
        let s = IndexSet::from_indices(10, [1, 2, 3, 6, 9]).unwrap();
        assert_eq!(s.ranges(), &[1..4, 6..7, 9..10]);
        assert_eq!(s.index_within_set(6), Some(3));
        assert_eq!(s.index_within_set(5), None);
        assert_eq!(s.nth_index_in_set(4), Some(9));
        assert_eq!(s.nth_index_in_set(5), None);
        assert!(s.contains(9) && !s.contains(0));
        assert_eq!(s.iter().collect::<Vec<_>>(), vec![1, 2, 3, 6, 9]);
    }

    #[test]
    fn set_algebra() {
        let a = IndexSet::from_range(10, 0..6).unwrap();
        let b = IndexSet::from_indices(10, [4, 5, 6, 8]).unwrap();
        assert_eq!(a.union(&b).unwrap().ranges(), &[0..7, 8..9]);
        assert_eq!(a.intersection(&b).unwrap().ranges(), &[4..6]);
        assert_eq!(a.subtract(&b).unwrap().ranges(), &[0..4]);
        assert_eq!(b.subtract(&a).unwrap().ranges(), &[6..7, 8..9]);
        assert!(a.union(&IndexSet::new(11)).is_err());
    }

    #[test]
    fn serde_round_trip() {
        let s = IndexSet::from_indices(12, [0, 1, 5, 11]).unwrap();
        let json = serde_json::to_string(&s).unwrap();
        let back: IndexSet = serde_json::from_str(&json).unwrap();
        assert_eq!(s, back);
        assert_eq!(back.index_within_set(5), Some(2));
    }

    #[test]
    fn malformed_input_is_rejected_on_load() {
        for json in [
            r#"{"size":4,"ranges":[{"start":0,"end":9}]}"#,
            r#"{"size":10,"ranges":[{"start":5,"end":7},{"start":1,"end":3}]}"#,
            r#"{"size":10,"ranges":[{"start":1,"end":3},{"start":3,"end":5}]}"#,
            r#"{"size":10,"ranges":[{"start":2,"end":2}]}"#,
        ] {
            assert!(serde_json::from_str::<IndexSet>(json).is_err(), "{json}");
        }
    }
}
