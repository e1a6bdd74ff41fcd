#![cfg_attr(docsrs, feature(doc_cfg))]
//! # sparsity-sieve
//!
//! Graph utilities over sparsity patterns for finite-element style codes:
//! bandwidth-reducing renumbering, graph partitioning through a pluggable
//! backend, and the distributed exchange that makes each process's owned rows
//! complete after patterns were built from local information only.
//!
//! ## Features
//! - Cuthill-McKee renumbering with automatic or user-supplied starting nodes
//! - Partitioning via METIS (`metis-support`) or the in-process greedy partitioner
//! - Pluggable communication backends (serial, in-process threads, MPI) for the row exchange
//! - Extensive serial, multi-rank, and property-based testing
//!
//! ## Determinism
//!
//! All randomized decisions use `SmallRng` seeds drawn from configuration so runs are
//! reproducible. Renumbering is fully deterministic.
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! sparsity-sieve = "0.3"
//! # Optional features:
//! # features = ["mpi-support","rayon","metis-support"]
//! ```
//!
//! The library logs through the `log` facade and never installs a logger.

pub mod algs;
pub mod data;
pub mod partitioning;
pub mod sparsity;
pub mod sparsity_error;

pub use sparsity_error::SparsityError;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::communicator::{CommTag, Communicator, NoComm, RayonComm, Wait};
    #[cfg(feature = "mpi-support")]
    pub use crate::algs::communicator::MpiComm;
    pub use crate::algs::cuthill_mckee::reorder_cuthill_mckee;
    pub use crate::algs::distribute::{
        ContiguousOwnership, IndexSetOwnership, OwnerFn, RowOwnership,
        distribute_sparsity_pattern,
    };
    #[cfg(feature = "metis-support")]
    pub use crate::algs::metis_partition::MetisPartitioner;
    pub use crate::algs::partition::{partition, partition_with_default};
    pub use crate::data::index_set::IndexSet;
    pub use crate::partitioning::{
        GraphPartitioner, GreedyPartitioner, PartitionerConfig, UnavailablePartitioner,
        default_partitioner,
    };
    pub use crate::sparsity::{
        ConnectivityGraph, CsrAdjacency, DynamicSparsityPattern, SparsityPattern,
    };
    pub use crate::sparsity_error::SparsityError;
}
