//! Pluggable graph-partitioning backends.
//!
//! The façade in [`crate::algs::partition`] handles argument checks and the
//! single-partition shortcut; everything that actually splits a graph lives
//! behind [`GraphPartitioner`]. Backends shipped here:
//!
//! - [`UnavailablePartitioner`]: what a build without METIS gets by default.
//! - [`greedy::GreedyPartitioner`]: in-process graph growing plus boundary refinement.
//! - [`crate::algs::metis_partition::MetisPartitioner`]: multilevel k-way METIS
//!   (feature `metis-support`).

pub mod greedy;
pub mod metrics;

pub use self::greedy::GreedyPartitioner;
pub use self::metrics::{edge_cut, imbalance, partition_sizes};

use crate::sparsity::graph::CsrAdjacency;
use crate::sparsity_error::SparsityError;

pub type PartitionId = usize;

/// An external or in-process algorithm that splits a graph into `n_parts`
/// balanced groups with few edges between them.
///
/// Implementations receive symmetric, self-loop-free adjacency with at least
/// one node, and `n_parts >= 2`. They return one partition id per node.
/// A failing algorithm reports [`SparsityError::PartitionerFailure`] with its
/// native status code.
pub trait GraphPartitioner {
    /// Short backend name used in logs and errors.
    fn name(&self) -> &'static str;

    /// False if the backend was not compiled in or cannot be reached.
    fn is_available(&self) -> bool {
        true
    }

    fn partition_graph(
        &self,
        graph: &CsrAdjacency,
        n_parts: usize,
    ) -> Result<Vec<PartitionId>, SparsityError>;
}

impl<P: GraphPartitioner + ?Sized> GraphPartitioner for Box<P> {
    fn name(&self) -> &'static str {
        (**self).name()
    }
    fn is_available(&self) -> bool {
        (**self).is_available()
    }
    fn partition_graph(
        &self,
        graph: &CsrAdjacency,
        n_parts: usize,
    ) -> Result<Vec<PartitionId>, SparsityError> {
        (**self).partition_graph(graph, n_parts)
    }
}

/// Balance / quality knobs for the in-process partitioner.
#[derive(Debug, Clone)]
pub struct PartitionerConfig {
    /// Allowed load imbalance: no part may exceed `ceil((1 + imbalance) * W / k)`.
    pub imbalance: f64,
    /// Seed for every randomized choice; equal seeds give equal partitions.
    pub rng_seed: u64,
    /// Upper bound on boundary-refinement sweeps.
    pub refinement_passes: usize,
}

impl Default for PartitionerConfig {
    fn default() -> Self {
        Self {
            imbalance: 0.05,
            rng_seed: 42,
            refinement_passes: 8,
        }
    }
}

/// Stand-in for a partitioner library that is not installed.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailablePartitioner {
    name: &'static str,
}

impl UnavailablePartitioner {
    pub fn named(name: &'static str) -> Self {
        Self { name }
    }
}

impl GraphPartitioner for UnavailablePartitioner {
    fn name(&self) -> &'static str {
        if self.name.is_empty() { "metis" } else { self.name }
    }

    fn is_available(&self) -> bool {
        false
    }

    fn partition_graph(
        &self,
        _graph: &CsrAdjacency,
        _n_parts: usize,
    ) -> Result<Vec<PartitionId>, SparsityError> {
        Err(SparsityError::DependencyUnavailable(self.name()))
    }
}

/// METIS when compiled with `metis-support`, otherwise a backend that reports
/// itself unavailable. Either way a single partition always works.
pub fn default_partitioner() -> Box<dyn GraphPartitioner + Send + Sync> {
    #[cfg(feature = "metis-support")]
    {
        Box::new(crate::algs::metis_partition::MetisPartitioner::default())
    }
    #[cfg(not(feature = "metis-support"))]
    {
        Box::new(UnavailablePartitioner::default())
    }
}
