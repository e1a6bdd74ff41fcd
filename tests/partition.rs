mod util;
use util::*;

use proptest::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use sparsity_sieve::algs::partition::{partition, partition_with_default};
use sparsity_sieve::partitioning::metrics::{edge_cut, imbalance, partition_sizes};
use sparsity_sieve::partitioning::{
    GraphPartitioner, GreedyPartitioner, PartitionerConfig, UnavailablePartitioner,
};
use sparsity_sieve::sparsity::{CsrAdjacency, SparsityPattern};
use sparsity_sieve::sparsity_error::SparsityError;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Records calls and what it was given; always answers "all in the last part".
#[derive(Default)]
struct Recording {
    calls: AtomicUsize,
    nodes_seen: AtomicUsize,
}

impl GraphPartitioner for Recording {
    fn name(&self) -> &'static str {
        "recording"
    }
    fn partition_graph(&self, g: &CsrAdjacency, k: usize) -> Result<Vec<usize>, SparsityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.nodes_seen.store(g.n_nodes(), Ordering::SeqCst);
        Ok(vec![k - 1; g.n_nodes()])
    }
}

struct FailsWith(i32);

impl GraphPartitioner for FailsWith {
    fn name(&self) -> &'static str {
        "fails"
    }
    fn partition_graph(&self, _g: &CsrAdjacency, _k: usize) -> Result<Vec<usize>, SparsityError> {
        Err(SparsityError::PartitionerFailure(self.0))
    }
}

#[test]
fn one_partition_never_calls_backend() {
    let backend = Recording::default();
    for n in [1, 5, 64] {
        assert_eq!(partition(&path(n), 1, &backend).unwrap(), vec![0; n]);
    }
    assert!(partition(&SparsityPattern::default(), 1, &backend).unwrap().is_empty());
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    // and works in a build without any partitioner library
    assert_eq!(partition_with_default(&grid(3, 3), 1).unwrap(), vec![0; 9]);
}

#[test]
fn zero_partitions_is_a_configuration_error() {
    let backend = Recording::default();
    assert!(matches!(
        partition(&path(4), 0, &backend),
        Err(SparsityError::Configuration(_))
    ));
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn backend_receives_whole_graph() {
    let backend = Recording::default();
    let parts = partition(&grid(4, 3), 3, &backend).unwrap();
    assert_eq!(parts, vec![2; 12]);
    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    assert_eq!(backend.nodes_seen.load(Ordering::SeqCst), 12);
}

#[test]
fn missing_library_is_dependency_unavailable() {
    assert!(matches!(
        partition(&path(4), 2, &UnavailablePartitioner::default()),
        Err(SparsityError::DependencyUnavailable(_))
    ));
}

#[cfg(not(feature = "metis-support"))]
#[test]
fn default_backend_without_metis() {
    assert!(matches!(
        partition_with_default(&path(4), 2),
        Err(SparsityError::DependencyUnavailable("metis"))
    ));
}

#[test]
fn failure_code_is_carried() {
    match partition(&path(4), 2, &FailsWith(-3)) {
        Err(SparsityError::PartitionerFailure(code)) => assert_eq!(code, -3),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn empty_rows_are_partitioned() {
    let sp = SparsityPattern::from_rows(5, vec![vec![]; 5]).unwrap();
    let parts = partition(&sp, 2, &GreedyPartitioner::default()).unwrap();
    assert_eq!(parts.len(), 5);
    assert!(parts.iter().all(|&p| p < 2));
}

#[test]
fn greedy_beats_random_assignment_on_grid() {
    let sp = grid(8, 8);
    let k = 4;
    let cfg = PartitionerConfig::default();
    let parts = partition(&sp, k, &GreedyPartitioner::new(cfg.clone())).unwrap();

    let mut rng = SmallRng::seed_from_u64(cfg.rng_seed);
    let random: Vec<usize> = (0..64).map(|_| rng.gen_range(0..k)).collect();

    assert!(
        edge_cut(&sp, &parts) < edge_cut(&sp, &random),
        "greedy cut {} vs random cut {}",
        edge_cut(&sp, &parts),
        edge_cut(&sp, &random)
    );
    let cap = ((1.0 + cfg.imbalance) * 16.0).ceil() as usize;
    let sizes = partition_sizes(&parts, k);
    assert!(sizes.iter().all(|&s| s > 0 && s <= cap), "sizes {sizes:?}");
    assert!(imbalance(&parts, k) <= cap as f64 / 16.0);
}

#[test]
fn tighter_tolerance_is_respected() {
    let sp = grid(10, 6);
    let cfg = PartitionerConfig {
        imbalance: 0.0,
        ..Default::default()
    };
    let parts = partition(&sp, 3, &GreedyPartitioner::new(cfg)).unwrap();
    assert_eq!(partition_sizes(&parts, 3), vec![20, 20, 20]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn greedy_output_is_a_valid_assignment(nx in 1usize..9, ny in 1usize..9, k in 1usize..6) {
        let sp = grid(nx, ny);
        let parts = partition(&sp, k, &GreedyPartitioner::default()).unwrap();
        prop_assert_eq!(parts.len(), nx * ny);
        prop_assert!(parts.iter().all(|&p| p < k));
    }
}
