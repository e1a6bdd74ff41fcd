//! Partitioning metrics utilities.
//!
//! Edge cut and load balance of a partition assignment. These are what the
//! tests check instead of exact assignments, since different backends (and
//! different versions of one backend) legitimately return different splits.

use crate::partitioning::PartitionId;
use crate::sparsity::graph::ConnectivityGraph;

/// Number of undirected edges `{u, v}` (counted once, from `u < v`) whose
/// endpoints lie in different parts. **O(E)**.
///
/// # Panics
/// Panics if `parts` is shorter than the node count.
pub fn edge_cut<G>(graph: &G, parts: &[PartitionId]) -> usize
where
    G: ConnectivityGraph + Sync + ?Sized,
{
    let cut_at = |u: usize| {
        graph
            .neighbors(u)
            .filter(|&v| u < v && parts[u] != parts[v])
            .count()
    };
    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        (0..graph.n_nodes()).into_par_iter().map(cut_at).sum()
    }
    #[cfg(not(feature = "rayon"))]
    {
        (0..graph.n_nodes()).map(cut_at).sum()
    }
}

/// Node count of each part; ids `>= n_parts` are ignored.
pub fn partition_sizes(parts: &[PartitionId], n_parts: usize) -> Vec<usize> {
    let mut sizes = vec![0; n_parts];
    for &p in parts {
        if let Some(s) = sizes.get_mut(p) {
            *s += 1;
        }
    }
    sizes
}

/// Largest part size divided by the ideal size `n / n_parts`; `1.0` is perfect.
pub fn imbalance(parts: &[PartitionId], n_parts: usize) -> f64 {
    if parts.is_empty() || n_parts == 0 {
        return 1.0;
    }
    let max = partition_sizes(parts, n_parts).into_iter().max().unwrap_or(0);
    max as f64 * n_parts as f64 / parts.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sparsity::compressed::SparsityPattern;

    #[test]
    fn cut_of_split_cycle() {
        // 4-cycle 0-1-2-3-0 split {0,1} | {2,3} cuts two edges
        let sp = SparsityPattern::from_edges(4, &[(0, 1), (1, 2), (2, 3), (3, 0)]).unwrap();
        assert_eq!(edge_cut(&sp, &[0, 0, 1, 1]), 2);
        assert_eq!(edge_cut(&sp, &[0, 1, 0, 1]), 4);
        assert_eq!(edge_cut(&sp, &[0, 0, 0, 0]), 0);
    }

    #[test]
    fn sizes_and_imbalance() {
        let parts = [0, 0, 0, 1, 2, 2];
        assert_eq!(partition_sizes(&parts, 3), vec![3, 1, 2]);
        assert!((imbalance(&parts, 3) - 1.5).abs() < 1e-12);
        assert_eq!(imbalance(&[], 3), 1.0);
    }
}
