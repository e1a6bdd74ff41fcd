mod util;
use util::*;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use sparsity_sieve::algs::communicator::{CommTag, Communicator, NoComm};
use sparsity_sieve::algs::distribute::{
    ContiguousOwnership, IndexSetOwnership, OwnerFn, RowOwnership, distribute_sparsity_pattern,
    distribute_sparsity_pattern_contiguous, distribute_sparsity_pattern_index_sets,
};
use sparsity_sieve::data::IndexSet;
use sparsity_sieve::sparsity::DynamicSparsityPattern;
use sparsity_sieve::sparsity_error::SparsityError;
use std::collections::BTreeSet;

/// Rank 0 owns rows [0, 2), rank 1 owns [2, 4); rank 1 writes (0, 3).
fn two_rank_scenario(tag: CommTag, calls: usize) -> Vec<DynamicSparsityPattern> {
    on_ranks(2, move |rank, comm| {
        let relevant = if rank == 0 {
            IndexSet::from_range(4, 0..2).unwrap()
        } else {
            IndexSet::from_indices(4, [0, 2, 3]).unwrap()
        };
        let mut dsp = DynamicSparsityPattern::with_row_index_set(4, 4, relevant.clone()).unwrap();
        if rank == 1 {
            dsp.add(0, 3).unwrap();
            dsp.add(2, 3).unwrap();
        } else {
            dsp.add(1, 1).unwrap();
        }
        for _ in 0..calls {
            distribute_sparsity_pattern_contiguous(&mut dsp, &[2, 2], &comm, &relevant, tag)
                .unwrap();
        }
        dsp
    })
}

#[test]
fn owner_receives_speculative_entry() {
    let out = two_rank_scenario(CommTag::new(0x3000), 1);
    assert!(out[0].exists(0, 3));
    assert_eq!(entries(&out[0]), vec![(0, 3), (1, 1)]);
    // the sender keeps what it had
    assert_eq!(entries(&out[1]), vec![(0, 3), (2, 3)]);
}

#[test]
fn second_call_changes_nothing() {
    let once = two_rank_scenario(CommTag::new(0x3010), 1);
    let twice = two_rank_scenario(CommTag::new(0x3020), 2);
    assert_eq!(once, twice);
}

#[test]
fn index_set_ownership_round_robin() {
    // rank p owns rows with row % 3 == p; everyone writes into row 0 and row 4
    let tag = CommTag::new(0x3030);
    let out = on_ranks(3, move |rank, comm| {
        let owned: Vec<IndexSet> = (0..3)
            .map(|p| IndexSet::from_indices(9, (0..9).filter(|r| r % 3 == p)).unwrap())
            .collect();
        let mut relevant = owned[rank].clone();
        relevant.add_indices([0, 4]).unwrap();
        let mut dsp = DynamicSparsityPattern::with_row_index_set(9, 9, relevant.clone()).unwrap();
        dsp.add(0, rank).unwrap();
        dsp.add(4, rank + 5).unwrap();
        distribute_sparsity_pattern_index_sets(&mut dsp, &owned, &comm, &relevant, tag).unwrap();
        dsp
    });
    assert_eq!(out[0].row(0).collect::<Vec<_>>(), vec![0, 1, 2]);
    assert_eq!(out[1].row(4).collect::<Vec<_>>(), vec![5, 6, 7]);
    assert_eq!(out[2].row_length(0), 1);
}

#[test]
fn owned_rows_become_the_union_of_all_contributions() {
    let tag = CommTag::new(0x3040);
    let n = 12;
    let out = on_ranks(3, move |rank, comm| {
        let own = ContiguousOwnership::from_rows_per_process(&[4, 4, 4]);
        let mut rng = SmallRng::seed_from_u64(100 + rank as u64);
        let mut relevant = IndexSet::from_range(n, own.owned_range(rank)).unwrap();
        for _ in 0..4 {
            relevant.add_index(rng.gen_range(0..n)).unwrap();
        }
        let mut dsp = DynamicSparsityPattern::with_row_index_set(n, n, relevant.clone()).unwrap();
        let rows: Vec<usize> = relevant.iter().collect();
        let mut added = Vec::new();
        for _ in 0..20 {
            let row = rows[rng.gen_range(0..rows.len())];
            let col = rng.gen_range(0..n);
            dsp.add(row, col).unwrap();
            added.push((row, col));
        }
        distribute_sparsity_pattern(&mut dsp, &own, &comm, &relevant, tag).unwrap();
        (dsp, added)
    });

    let own = ContiguousOwnership::from_rows_per_process(&[4, 4, 4]);
    let all_added: BTreeSet<(usize, usize)> =
        out.iter().flat_map(|(_, added)| added.iter().copied()).collect();
    for (rank, (dsp, _)) in out.iter().enumerate() {
        let got: BTreeSet<_> = entries(dsp)
            .into_iter()
            .filter(|&(r, _)| own.owner_of(r) == Some(rank))
            .collect();
        let want: BTreeSet<_> = all_added
            .iter()
            .copied()
            .filter(|&(r, _)| own.owner_of(r) == Some(rank))
            .collect();
        assert_eq!(got, want, "rank {rank}");
    }
}

#[test]
fn closure_ownership_with_empty_ranks() {
    // rank 1 owns nothing and sends nothing, yet must take part
    let tag = CommTag::new(0x3050);
    let out = on_ranks(3, move |rank, comm| {
        let own = OwnerFn::new(3, |r: usize| Some(if r < 3 { 0 } else { 2 }));
        let mut dsp = DynamicSparsityPattern::square(6);
        if rank == 2 {
            dsp.add(1, 5).unwrap();
        }
        distribute_sparsity_pattern(&mut dsp, &own, &comm, &IndexSet::complete(6), tag).unwrap();
        dsp
    });
    assert!(out[0].exists(1, 5));
    assert_eq!(out[1].n_nonzero_elements(), 0);
}

#[test]
fn ownership_for_wrong_rank_count_fails_on_every_rank() {
    let tag = CommTag::new(0x3060);
    let errs = on_ranks(2, move |_rank, comm| {
        let mut dsp = DynamicSparsityPattern::square(6);
        let own = ContiguousOwnership::from_rows_per_process(&[2, 2, 2]);
        distribute_sparsity_pattern(&mut dsp, &own, &comm, &IndexSet::complete(6), tag)
            .unwrap_err()
    });
    for e in errs {
        assert!(matches!(e, SparsityError::Configuration(_)));
    }
}

#[test]
fn relevant_set_of_wrong_size_is_rejected() {
    let mut dsp = DynamicSparsityPattern::square(4);
    let own = ContiguousOwnership::from_rows_per_process(&[4]);
    assert!(matches!(
        distribute_sparsity_pattern(&mut dsp, &own, &NoComm, &IndexSet::complete(5), CommTag::new(1)),
        Err(SparsityError::Configuration(_))
    ));
}

#[test]
fn serial_run_is_a_no_op() {
    let mut dsp = DynamicSparsityPattern::square(3);
    dsp.add(0, 2).unwrap();
    let before = dsp.clone();
    let own = ContiguousOwnership::from_rows_per_process(&[3]);
    assert_eq!(NoComm.size(), own.n_owners());
    distribute_sparsity_pattern(&mut dsp, &own, &NoComm, &IndexSet::complete(3), CommTag::new(2))
        .unwrap();
    assert_eq!(dsp, before);
}

#[test]
fn overlapping_owned_sets_are_rejected() {
    let a = IndexSet::from_range(4, 0..3).unwrap();
    let b = IndexSet::from_range(4, 2..4).unwrap();
    assert!(matches!(
        IndexSetOwnership::new(vec![a, b]),
        Err(SparsityError::Configuration(_))
    ));
}

#[test]
fn contiguous_and_index_set_ownership_agree() {
    let counts = [3, 0, 5, 2];
    let contiguous = ContiguousOwnership::from_rows_per_process(&counts);
    let sets: Vec<IndexSet> = (0..counts.len())
        .map(|p| IndexSet::from_range(10, contiguous.owned_range(p)).unwrap())
        .collect();
    let by_sets = IndexSetOwnership::new(sets).unwrap();
    assert_eq!(contiguous.n_owners(), by_sets.n_owners());
    for row in 0..12 {
        assert_eq!(contiguous.owner_of(row), by_sets.owner_of(row), "row {row}");
    }
}
