//! Graph view over sparsity structures.
//!
//! Renumbering and partitioning only need "how many nodes" and "which nodes
//! does row `i` couple to". [`ConnectivityGraph`] exposes exactly that for any
//! sparsity type; [`CsrAdjacency`] is the row-offset / column-index form that
//! partitioner backends consume.
//
// All methods are read-only; implementors must not use interior mutability,
// so a graph can be shared across threads while several algorithms walk it.

use crate::sparsity::compressed::SparsityPattern;
use crate::sparsity::dynamic::DynamicSparsityPattern;
use crate::sparsity_error::SparsityError;

/// Read-only adjacency view of a (square) sparsity structure.
pub trait ConnectivityGraph {
    /// Iterator over the columns coupled to one row.
    type NeighborIter<'a>: Iterator<Item = usize> + 'a
    where
        Self: 'a;

    fn n_rows(&self) -> usize;

    fn n_cols(&self) -> usize;

    /// Sorted, distinct columns of `row`; may include `row` itself.
    fn neighbors(&self, row: usize) -> Self::NeighborIter<'_>;

    /// Number of entries in `row`, self-loop included.
    fn row_length(&self, row: usize) -> usize;

    /// Number of graph nodes (rows).
    fn n_nodes(&self) -> usize {
        self.n_rows()
    }

    fn is_square(&self) -> bool {
        self.n_rows() == self.n_cols()
    }

    /// Number of *other* nodes `row` couples with.
    fn coordination_number(&self, row: usize) -> usize {
        self.neighbors(row).filter(|&c| c != row).count()
    }
}

impl ConnectivityGraph for SparsityPattern {
    type NeighborIter<'a> = std::iter::Copied<std::slice::Iter<'a, usize>>;

    fn n_rows(&self) -> usize {
        SparsityPattern::n_rows(self)
    }
    fn n_cols(&self) -> usize {
        SparsityPattern::n_cols(self)
    }
    fn neighbors(&self, row: usize) -> Self::NeighborIter<'_> {
        self.row(row).iter().copied()
    }
    fn row_length(&self, row: usize) -> usize {
        SparsityPattern::row_length(self, row)
    }
}

impl ConnectivityGraph for DynamicSparsityPattern {
    type NeighborIter<'a> = Box<dyn Iterator<Item = usize> + 'a>;

    fn n_rows(&self) -> usize {
        DynamicSparsityPattern::n_rows(self)
    }
    fn n_cols(&self) -> usize {
        DynamicSparsityPattern::n_cols(self)
    }
    fn neighbors(&self, row: usize) -> Self::NeighborIter<'_> {
        Box::new(self.row(row))
    }
    fn row_length(&self, row: usize) -> usize {
        DynamicSparsityPattern::row_length(self, row)
    }
}

/// Node count of a square graph.
///
/// # Errors
/// `InvalidArgument` if the structure is not quadratic.
pub fn ensure_square<G>(graph: &G) -> Result<usize, SparsityError>
where
    G: ConnectivityGraph + ?Sized,
{
    if !graph.is_square() {
        return Err(SparsityError::InvalidArgument(format!(
            "sparsity pattern is not quadratic ({}x{})",
            graph.n_rows(),
            graph.n_cols()
        )));
    }
    Ok(graph.n_rows())
}

/// Coordination number of every node.
pub fn coordination_numbers<G>(graph: &G) -> Vec<usize>
where
    G: ConnectivityGraph + Sync + ?Sized,
{
    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        (0..graph.n_nodes())
            .into_par_iter()
            .map(|v| graph.coordination_number(v))
            .collect()
    }
    #[cfg(not(feature = "rayon"))]
    {
        (0..graph.n_nodes())
            .map(|v| graph.coordination_number(v))
            .collect()
    }
}

/// CSR triple handed to partitioner backends.
///
/// * `xadj[i] .. xadj[i+1]` = neighbour list of node *i* in `adjncy`
/// * `vwgt[i]`              = node weight, uniform `1` by default
///
/// Self-loops are dropped; symmetry is the caller's responsibility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrAdjacency {
    pub xadj: Vec<usize>,
    pub adjncy: Vec<usize>,
    pub vwgt: Vec<i32>,
}

impl CsrAdjacency {
    /// Adjacency of any graph, rows beyond `n_cols` not checked for squareness.
    pub fn from_graph<G>(graph: &G) -> Self
    where
        G: ConnectivityGraph + ?Sized,
    {
        let n = graph.n_nodes();
        let mut xadj = Vec::with_capacity(n + 1);
        let mut adjncy = Vec::new();
        xadj.push(0);
        for v in 0..n {
            adjncy.extend(graph.neighbors(v).filter(|&c| c != v));
            xadj.push(adjncy.len());
        }
        Self {
            xadj,
            adjncy,
            vwgt: vec![1; n],
        }
    }

    /// Replace the uniform node weights.
    ///
    /// # Errors
    /// `InvalidArraySize` if `weights` does not have one entry per node.
    pub fn with_weights(mut self, weights: Vec<i32>) -> Result<Self, SparsityError> {
        if weights.len() != self.n_nodes() {
            return Err(SparsityError::InvalidArraySize {
                got: weights.len(),
                expected: self.n_nodes(),
            });
        }
        self.vwgt = weights;
        Ok(self)
    }

    pub fn n_nodes(&self) -> usize {
        self.xadj.len().saturating_sub(1)
    }

    pub fn neighbors_of(&self, v: usize) -> &[usize] {
        &self.adjncy[self.xadj[v]..self.xadj[v + 1]]
    }

    pub fn degree(&self, v: usize) -> usize {
        self.xadj[v + 1] - self.xadj[v]
    }

    /// Number of undirected edges, assuming a symmetric structure.
    pub fn n_edges(&self) -> usize {
        self.adjncy.len() / 2
    }
}

impl ConnectivityGraph for CsrAdjacency {
    type NeighborIter<'a> = std::iter::Copied<std::slice::Iter<'a, usize>>;

    fn n_rows(&self) -> usize {
        self.n_nodes()
    }
    fn n_cols(&self) -> usize {
        self.n_nodes()
    }
    fn neighbors(&self, row: usize) -> Self::NeighborIter<'_> {
        self.neighbors_of(row).iter().copied()
    }
    fn row_length(&self, row: usize) -> usize {
        self.degree(row)
    }
}
