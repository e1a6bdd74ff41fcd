//! Compressed (CSR) sparsity pattern.
//!
//! Immutable, cache-friendly row structure with sorted column lists. Built
//! from a [`DynamicSparsityPattern`] or directly from an undirected edge list;
//! this is the form the renumbering and partitioning routines walk.

use crate::algs::permutation::validate_permutation;
use crate::sparsity::dynamic::DynamicSparsityPattern;
use crate::sparsity_error::SparsityError;

/// CSR sparsity pattern: `colnums[rowstart[r]..rowstart[r + 1]]` are the
/// sorted, distinct columns of row `r`.
///
/// # Invariants
///
/// - `rowstart` has `n_rows + 1` entries, starts at `0`, never decreases and
///   ends at `colnums.len()`.
/// - Each row's columns are strictly increasing and `< n_cols`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "SparsityPatternRaw")]
pub struct SparsityPattern {
    n_rows: usize,
    n_cols: usize,
    rowstart: Vec<usize>,
    colnums: Vec<usize>,
}

#[derive(serde::Deserialize)]
struct SparsityPatternRaw {
    n_rows: usize,
    n_cols: usize,
    rowstart: Vec<usize>,
    colnums: Vec<usize>,
}

impl TryFrom<SparsityPatternRaw> for SparsityPattern {
    type Error = SparsityError;

    fn try_from(raw: SparsityPatternRaw) -> Result<Self, Self::Error> {
        let SparsityPatternRaw {
            n_rows,
            n_cols,
            rowstart,
            colnums,
        } = raw;
        if rowstart.len().checked_sub(1) != Some(n_rows) {
            return Err(SparsityError::InvalidArraySize {
                got: rowstart.len(),
                expected: n_rows.saturating_add(1),
            });
        }
        if rowstart.first() != Some(&0) || rowstart.last() != Some(&colnums.len()) {
            return Err(SparsityError::InvalidArgument(format!(
                "row offsets must run from 0 to {}",
                colnums.len()
            )));
        }
        for (r, w) in rowstart.windows(2).enumerate() {
            if w[0] > w[1] || w[1] > colnums.len() {
                return Err(SparsityError::InvalidArgument(format!(
                    "row offsets decrease or overrun at row {r}"
                )));
            }
            let cols = &colnums[w[0]..w[1]];
            if cols.windows(2).any(|c| c[0] >= c[1]) || cols.last().is_some_and(|&c| c >= n_cols) {
                return Err(SparsityError::InvalidArgument(format!(
                    "row {r}: columns must be increasing and below {n_cols}"
                )));
            }
        }
        Ok(Self {
            n_rows,
            n_cols,
            rowstart,
            colnums,
        })
    }
}

impl Default for SparsityPattern {
    fn default() -> Self {
        Self {
            n_rows: 0,
            n_cols: 0,
            rowstart: vec![0],
            colnums: Vec::new(),
        }
    }
}

impl SparsityPattern {
    /// Compress a dynamic pattern; rows it does not store come out empty.
    pub fn from_dynamic(dsp: &DynamicSparsityPattern) -> Self {
        let n = dsp.n_rows();
        let mut rowstart = Vec::with_capacity(n + 1);
        let mut colnums = Vec::with_capacity(dsp.n_nonzero_elements());
        rowstart.push(0);
        for r in 0..n {
            colnums.extend(dsp.row(r));
            rowstart.push(colnums.len());
        }
        Self {
            n_rows: n,
            n_cols: dsp.n_cols(),
            rowstart,
            colnums,
        }
    }

    /// Build from explicit rows. Columns are sorted and deduplicated.
    ///
    /// # Errors
    /// `InvalidArgument` if a column is `>= n_cols`.
    pub fn from_rows(n_cols: usize, rows: Vec<Vec<usize>>) -> Result<Self, SparsityError> {
        let mut rowstart = Vec::with_capacity(rows.len() + 1);
        let mut colnums = Vec::new();
        rowstart.push(0);
        for (r, mut cols) in rows.into_iter().enumerate() {
            cols.sort_unstable();
            cols.dedup();
            if let Some(&c) = cols.last() {
                if c >= n_cols {
                    return Err(SparsityError::InvalidArgument(format!(
                        "row {r}: column {c} out of range for {n_cols} columns"
                    )));
                }
            }
            colnums.extend(cols);
            rowstart.push(colnums.len());
        }
        Ok(Self {
            n_rows: rowstart.len() - 1,
            n_cols,
            rowstart,
            colnums,
        })
    }

    /// Square `n x n` pattern of an undirected graph: each edge `(u, v)`
    /// yields entries `(u, v)` and `(v, u)`.
    pub fn from_edges(n: usize, edges: &[(usize, usize)]) -> Result<Self, SparsityError> {
        let mut rows = vec![Vec::new(); n];
        for &(u, v) in edges {
            if u >= n || v >= n {
                return Err(SparsityError::InvalidArgument(format!(
                    "edge ({u}, {v}) out of range for {n} nodes"
                )));
            }
            rows[u].push(v);
            rows[v].push(u);
        }
        Self::from_rows(n, rows)
    }

    #[inline]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    #[inline]
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    pub fn n_nonzero_elements(&self) -> usize {
        self.colnums.len()
    }

    /// Columns of row `r`; empty if `r` is out of range.
    pub fn row(&self, r: usize) -> &[usize] {
        match (self.rowstart.get(r), self.rowstart.get(r + 1)) {
            (Some(&a), Some(&b)) => &self.colnums[a..b],
            _ => &[],
        }
    }

    pub fn row_length(&self, r: usize) -> usize {
        self.row(r).len()
    }

    pub fn exists(&self, r: usize, c: usize) -> bool {
        self.row(r).binary_search(&c).is_ok()
    }

    /// Largest `|row - col|` over all entries.
    pub fn bandwidth(&self) -> usize {
        (0..self.n_rows)
            .flat_map(|r| self.row(r).iter().map(move |&c| r.abs_diff(c)))
            .max()
            .unwrap_or(0)
    }

    /// The raw CSR arrays `(rowstart, colnums)`.
    pub fn csr(&self) -> (&[usize], &[usize]) {
        (&self.rowstart, &self.colnums)
    }

    /// Apply `new_indices` (old → new) to rows and columns of a square pattern.
    ///
    /// # Errors
    /// `InvalidArgument` if the pattern is not square, `InvalidPermutation` if
    /// `new_indices` is not a bijection on `[0, n_rows)`.
    pub fn renumbered(&self, new_indices: &[usize]) -> Result<SparsityPattern, SparsityError> {
        if self.n_rows != self.n_cols {
            return Err(SparsityError::InvalidArgument(format!(
                "cannot renumber a {}x{} pattern",
                self.n_rows, self.n_cols
            )));
        }
        validate_permutation(new_indices, self.n_rows)?;
        let mut rows = vec![Vec::new(); self.n_rows];
        for (old, &new) in new_indices.iter().enumerate() {
            rows[new] = self.row(old).iter().map(|&c| new_indices[c]).collect();
        }
        Self::from_rows(self.n_cols, rows)
    }
}

impl From<&DynamicSparsityPattern> for SparsityPattern {
    fn from(dsp: &DynamicSparsityPattern) -> Self {
        Self::from_dynamic(dsp)
    }
}
