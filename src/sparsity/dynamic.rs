//! Mutable sparsity pattern with per-row sorted column sets.
//!
//! A [`DynamicSparsityPattern`] is what a degree-of-freedom layer fills while
//! it discovers couplings. In a distributed run each process only stores the
//! rows of its locally relevant [`IndexSet`]; entries written to rows owned by
//! another process are later shipped to their owner by
//! [`distribute_sparsity_pattern`](crate::algs::distribute::distribute_sparsity_pattern).

use crate::data::index_set::IndexSet;
use crate::sparsity::compressed::SparsityPattern;
use crate::sparsity_error::SparsityError;
use std::collections::BTreeSet;

/// Row-wise sparsity pattern that grows by insertion and never shrinks.
///
/// # Invariants
///
/// - `lines.len()` equals the number of stored rows: `n_rows` without a row
///   index set, otherwise `row_index_set.n_elements()`.
/// - Every stored column index is `< n_cols`.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "DynamicSparsityPatternRaw")]
pub struct DynamicSparsityPattern {
    n_rows: usize,
    n_cols: usize,
    row_index_set: Option<IndexSet>,
    lines: Vec<BTreeSet<usize>>,
}

#[derive(serde::Deserialize)]
struct DynamicSparsityPatternRaw {
    n_rows: usize,
    n_cols: usize,
    row_index_set: Option<IndexSet>,
    lines: Vec<BTreeSet<usize>>,
}

impl TryFrom<DynamicSparsityPatternRaw> for DynamicSparsityPattern {
    type Error = SparsityError;

    fn try_from(raw: DynamicSparsityPatternRaw) -> Result<Self, Self::Error> {
        let DynamicSparsityPatternRaw {
            n_rows,
            n_cols,
            row_index_set,
            lines,
        } = raw;
        let n_stored = match &row_index_set {
            Some(rows) if rows.size() != n_rows => {
                return Err(SparsityError::InvalidArgument(format!(
                    "row index set spans {} indices, pattern has {n_rows} rows",
                    rows.size()
                )));
            }
            Some(rows) => rows.n_elements(),
            None => n_rows,
        };
        if lines.len() != n_stored {
            return Err(SparsityError::InvalidArraySize {
                got: lines.len(),
                expected: n_stored,
            });
        }
        if let Some(c) = lines.iter().filter_map(|l| l.last()).find(|&&c| c >= n_cols) {
            return Err(SparsityError::InvalidArgument(format!(
                "column {c} out of range for {n_cols} columns"
            )));
        }
        Ok(Self {
            n_rows,
            n_cols,
            row_index_set,
            lines,
        })
    }
}

impl DynamicSparsityPattern {
    /// Pattern storing all `n_rows` rows.
    pub fn new(n_rows: usize, n_cols: usize) -> Self {
        Self {
            n_rows,
            n_cols,
            row_index_set: None,
            lines: vec![BTreeSet::new(); n_rows],
        }
    }

    /// Square pattern of size `n`.
    pub fn square(n: usize) -> Self {
        Self::new(n, n)
    }

    /// Pattern storing only the rows in `rows` (typically the locally relevant set).
    ///
    /// # Errors
    /// `InvalidArgument` if `rows` is not a subset of `[0, n_rows)`.
    pub fn with_row_index_set(
        n_rows: usize,
        n_cols: usize,
        rows: IndexSet,
    ) -> Result<Self, SparsityError> {
        if rows.size() != n_rows {
            return Err(SparsityError::InvalidArgument(format!(
                "row index set spans {} indices, pattern has {n_rows} rows",
                rows.size()
            )));
        }
        let n_stored = rows.n_elements();
        Ok(Self {
            n_rows,
            n_cols,
            row_index_set: Some(rows),
            lines: vec![BTreeSet::new(); n_stored],
        })
    }

    #[inline]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    #[inline]
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// The stored-row restriction, if any.
    pub fn row_index_set(&self) -> Option<&IndexSet> {
        self.row_index_set.as_ref()
    }

    fn local_row(&self, row: usize) -> Option<usize> {
        if row >= self.n_rows {
            return None;
        }
        match &self.row_index_set {
            Some(set) => set.index_within_set(row),
            None => Some(row),
        }
    }

    /// True if entries of `row` are kept by this pattern.
    pub fn stores_row(&self, row: usize) -> bool {
        self.local_row(row).is_some()
    }

    /// Ascending iterator over the stored row indices.
    pub fn stored_rows(&self) -> Box<dyn Iterator<Item = usize> + '_> {
        match &self.row_index_set {
            Some(set) => Box::new(set.iter()),
            None => Box::new(0..self.n_rows),
        }
    }

    /// Insert entry `(row, col)`. Returns `true` if it was not present before.
    ///
    /// # Errors
    /// `InvalidArgument` if `row` is not stored or `col >= n_cols`.
    pub fn add(&mut self, row: usize, col: usize) -> Result<bool, SparsityError> {
        if col >= self.n_cols {
            return Err(SparsityError::InvalidArgument(format!(
                "column {col} out of range for {} columns",
                self.n_cols
            )));
        }
        let local = self.local_row(row).ok_or_else(|| {
            SparsityError::InvalidArgument(format!("row {row} is not stored by this pattern"))
        })?;
        Ok(self.lines[local].insert(col))
    }

    /// Insert several columns into one row; returns how many were new.
    pub fn add_entries(
        &mut self,
        row: usize,
        cols: impl IntoIterator<Item = usize>,
    ) -> Result<usize, SparsityError> {
        let mut added = 0;
        for col in cols {
            if self.add(row, col)? {
                added += 1;
            }
        }
        Ok(added)
    }

    /// True if `(row, col)` is an entry. Unstored rows have no entries.
    pub fn exists(&self, row: usize, col: usize) -> bool {
        self.local_row(row)
            .is_some_and(|l| self.lines[l].contains(&col))
    }

    /// Number of entries in `row` (zero for unstored rows).
    pub fn row_length(&self, row: usize) -> usize {
        self.local_row(row).map_or(0, |l| self.lines[l].len())
    }

    /// Sorted columns of `row`; empty for unstored rows.
    pub fn row(&self, row: usize) -> impl Iterator<Item = usize> + '_ {
        self.local_row(row)
            .map(|l| self.lines[l].iter().copied())
            .into_iter()
            .flatten()
    }

    /// Total number of stored entries.
    pub fn n_nonzero_elements(&self) -> usize {
        self.lines.iter().map(BTreeSet::len).sum()
    }

    /// Make the pattern structurally symmetric by adding `(j, i)` for every `(i, j)`.
    ///
    /// Mirror entries landing in unstored rows are dropped.
    ///
    /// # Errors
    /// `InvalidArgument` if the pattern is not square.
    pub fn symmetrize(&mut self) -> Result<(), SparsityError> {
        if self.n_rows != self.n_cols {
            return Err(SparsityError::InvalidArgument(format!(
                "cannot symmetrize a {}x{} pattern",
                self.n_rows, self.n_cols
            )));
        }
        let entries: Vec<(usize, usize)> = self
            .stored_rows()
            .flat_map(|r| self.row(r).map(move |c| (r, c)))
            .collect();
        let mut dropped = 0usize;
        for (r, c) in entries {
            match self.local_row(c) {
                Some(l) => {
                    self.lines[l].insert(r);
                }
                None => dropped += 1,
            }
        }
        if dropped > 0 {
            log::trace!("symmetrize: {dropped} mirror entries fall in unstored rows");
        }
        Ok(())
    }

    /// Largest `|row - col|` over all stored entries.
    pub fn bandwidth(&self) -> usize {
        self.stored_rows()
            .flat_map(|r| self.row(r).map(move |c| r.abs_diff(c)))
            .max()
            .unwrap_or(0)
    }

    /// Freeze into the compressed (CSR) form; unstored rows become empty rows.
    pub fn compress(&self) -> SparsityPattern {
        SparsityPattern::from_dynamic(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_is_idempotent_and_sorted() {
        let mut p = DynamicSparsityPattern::square(4);
        assert!(p.add(1, 3).unwrap());
        assert!(p.add(1, 0).unwrap());
        assert!(!p.add(1, 3).unwrap());
        assert_eq!(p.row(1).collect::<Vec<_>>(), vec![0, 3]);
        assert_eq!(p.row_length(1), 2);
        assert_eq!(p.row_length(2), 0);
        assert_eq!(p.n_nonzero_elements(), 2);
    }

    #[test]
    fn out_of_range_columns_are_rejected() {
        let mut p = DynamicSparsityPattern::new(2, 3);
        assert!(p.add(0, 2).is_ok());
        assert!(matches!(p.add(0, 3), Err(SparsityError::InvalidArgument(_))));
        assert!(p.add(2, 0).is_err());
    }

    #[test]
    fn row_index_set_restricts_storage() {
        let rows = IndexSet::from_indices(6, [1, 2, 5]).unwrap();
        let mut p = DynamicSparsityPattern::with_row_index_set(6, 6, rows).unwrap();
        assert!(p.stores_row(5) && !p.stores_row(0));
        p.add(5, 0).unwrap();
        assert!(p.exists(5, 0));
        assert!(p.add(0, 5).is_err());
        assert_eq!(p.row(0).count(), 0);
        assert_eq!(p.stored_rows().collect::<Vec<_>>(), vec![1, 2, 5]);
    }

    #[test]
    fn symmetrize_mirrors_entries() {
        let mut p = DynamicSparsityPattern::square(3);
        p.add(0, 2).unwrap();
        p.add(1, 1).unwrap();
        p.symmetrize().unwrap();
        assert!(p.exists(2, 0));
        assert_eq!(p.n_nonzero_elements(), 3);
        assert_eq!(p.bandwidth(), 2);
        assert!(DynamicSparsityPattern::new(2, 3).symmetrize().is_err());
    }

    #[test]
    fn serde_checks_stored_rows() {
        let rows = IndexSet::from_indices(6, [1, 2, 5]).unwrap();
        let mut p = DynamicSparsityPattern::with_row_index_set(6, 6, rows).unwrap();
        p.add(2, 4).unwrap();
        let json = serde_json::to_string(&p).unwrap();
        let back: DynamicSparsityPattern = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
        assert!(back.exists(2, 4));

        // fewer row sets than rows
        let short = r#"{"n_rows":3,"n_cols":3,"row_index_set":null,"lines":[]}"#;
        assert!(serde_json::from_str::<DynamicSparsityPattern>(short).is_err());
        let wide = r#"{"n_rows":1,"n_cols":3,"row_index_set":null,"lines":[[0,7]]}"#;
        assert!(serde_json::from_str::<DynamicSparsityPattern>(wide).is_err());
    }
}
