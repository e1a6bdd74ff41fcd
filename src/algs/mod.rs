//! Re-export public algorithms.

pub mod communicator;
pub mod cuthill_mckee;
pub mod distribute;
pub mod exchange;
#[cfg(feature = "metis-support")]
pub mod metis_partition;
pub mod partition;
pub mod permutation;
pub mod wire;

pub use cuthill_mckee::reorder_cuthill_mckee;
pub use distribute::{
    ContiguousOwnership, IndexSetOwnership, OwnerFn, RowOwnership, distribute_sparsity_pattern,
};
pub use partition::{partition, partition_with_default};
