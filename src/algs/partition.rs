//! Graph partitioning of sparsity patterns.
//!
//! A sparsity pattern is read as a graph of couplings between degrees of
//! freedom; partitioning splits its nodes into groups so that few edges cross
//! group boundaries and the groups are of similar size. The pattern must be
//! square and symmetric; symmetry is not checked since that would cost as
//! much as the partitioning itself.
//!
//! The single-partition case never touches a backend, so programs run on one
//! process without any partitioner library installed.

use crate::partitioning::{GraphPartitioner, PartitionId, default_partitioner};
use crate::sparsity::graph::{ConnectivityGraph, CsrAdjacency, ensure_square};
use crate::sparsity_error::SparsityError;

/// Assign each node of `graph` to one of `n_partitions` parts using `backend`.
///
/// Returns a vector with one entry in `[0, n_partitions)` per node.
///
/// # Errors
/// * `Configuration` if `n_partitions == 0`.
/// * `InvalidArgument` if the pattern is not square, or the backend returns
///   an id outside `[0, n_partitions)`.
/// * `DependencyUnavailable` if `n_partitions > 1` and the backend is missing.
/// * `PartitionerFailure(code)` if the backend algorithm fails.
/// * `InvalidArraySize` if the backend returns the wrong number of entries.
pub fn partition<G, P>(
    graph: &G,
    n_partitions: usize,
    backend: &P,
) -> Result<Vec<PartitionId>, SparsityError>
where
    G: ConnectivityGraph + ?Sized,
    P: GraphPartitioner + ?Sized,
{
    if n_partitions == 0 {
        return Err(SparsityError::Configuration(format!(
            "the number of partitions you gave is {n_partitions}, but must be greater than zero"
        )));
    }
    let n = ensure_square(graph)?;
    if n_partitions == 1 || n == 0 {
        return Ok(vec![0; n]);
    }
    if !backend.is_available() {
        return Err(SparsityError::DependencyUnavailable(backend.name()));
    }

    let adjacency = CsrAdjacency::from_graph(graph);
    let parts = backend.partition_graph(&adjacency, n_partitions)?;
    if parts.len() != n {
        return Err(SparsityError::InvalidArraySize {
            got: parts.len(),
            expected: n,
        });
    }
    if let Some((v, &p)) = parts.iter().enumerate().find(|&(_, &p)| p >= n_partitions) {
        return Err(SparsityError::InvalidArgument(format!(
            "backend `{}` put node {v} in partition {p}, outside [0, {n_partitions})",
            backend.name()
        )));
    }
    log::debug!(
        "partition: {n} nodes into {n_partitions} parts with `{}`",
        backend.name()
    );
    Ok(parts)
}

/// [`partition`] with [`default_partitioner`]: METIS if compiled in.
pub fn partition_with_default<G>(
    graph: &G,
    n_partitions: usize,
) -> Result<Vec<PartitionId>, SparsityError>
where
    G: ConnectivityGraph + ?Sized,
{
    partition(graph, n_partitions, &default_partitioner())
}
