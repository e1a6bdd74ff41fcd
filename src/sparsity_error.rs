//! SparsityError: Unified error type for sparsity-sieve public APIs
//!
//! Every renumbering, partitioning, and exchange routine reports failures to its
//! immediate caller through this type. Nothing is retried internally.

use thiserror::Error;

/// Unified error type for sparsity-sieve operations.
#[derive(Debug, Error)]
pub enum SparsityError {
    /// Invalid static arguments: zero partitions, starting indices on a
    /// graph with several components, mismatched ownership descriptions.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// An argument value is out of range, duplicated, or otherwise malformed.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// The requested partition count needs an external partitioner that is not present.
    #[error("Partitioner `{0}` is not available in this build")]
    DependencyUnavailable(&'static str),
    /// The external partitioning algorithm returned a nonzero status code.
    #[error("An error with error number {0} occurred while calling the partitioner")]
    PartitionerFailure(i32),
    /// An output array produced by a backend has the wrong length.
    #[error("The array has size {got} but should have size {expected}")]
    InvalidArraySize { got: usize, expected: usize },
    /// A permutation is not a bijection on `[0, n)`.
    #[error("Invalid permutation: {0}")]
    InvalidPermutation(String),
    /// Failure at the process-group exchange layer.
    #[error("Communication error with rank {neighbor}: {source}")]
    CommError {
        neighbor: usize,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl SparsityError {
    /// Shorthand for a [`SparsityError::CommError`] carrying a plain message.
    pub fn comm(neighbor: usize, msg: impl Into<String>) -> Self {
        SparsityError::CommError {
            neighbor,
            source: msg.into().into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_context() {
        let e = SparsityError::PartitionerFailure(-2);
        assert!(e.to_string().contains("-2"));
        let e = SparsityError::InvalidArraySize { got: 3, expected: 4 };
        assert_eq!(e.to_string(), "The array has size 3 but should have size 4");
        let e = SparsityError::comm(1, "short read");
        assert!(e.to_string().contains("rank 1"));
        assert!(std::error::Error::source(&e).is_some());
    }
}
