//! Two-rank MPI run of the sparsity row exchange.
//!
//! Run with `mpirun -n 2 cargo run --example distribute_two_ranks --features mpi-support`.
//! Rank 0 owns rows [0, 2) and rank 1 owns [2, 4); rank 1 writes entry (0, 3)
//! into a row it does not own, and after the exchange rank 0 holds it.

use sparsity_sieve::algs::communicator::{CommTag, Communicator, MpiComm};
use sparsity_sieve::algs::distribute::distribute_sparsity_pattern_contiguous;
use sparsity_sieve::data::IndexSet;
use sparsity_sieve::sparsity::DynamicSparsityPattern;
use sparsity_sieve::sparsity_error::SparsityError;

fn main() -> Result<(), SparsityError> {
    let comm = MpiComm::new()?;
    let rank = comm.rank();
    if comm.size() != 2 {
        return Err(SparsityError::Configuration(
            "this demo must be run with 2 ranks".into(),
        ));
    }

    let relevant = if rank == 0 {
        IndexSet::from_range(4, 0..2)?
    } else {
        IndexSet::from_indices(4, [0, 2, 3])?
    };
    let mut dsp = DynamicSparsityPattern::with_row_index_set(4, 4, relevant.clone())?;
    if rank == 1 {
        dsp.add(0, 3)?;
        dsp.add(2, 3)?;
    } else {
        dsp.add(0, 0)?;
    }

    distribute_sparsity_pattern_contiguous(&mut dsp, &[2, 2], &comm, &relevant, CommTag::new(0x5100))?;

    for row in dsp.stored_rows() {
        println!("[rank {rank}] row {row}: {:?}", dsp.row(row).collect::<Vec<_>>());
    }
    if rank == 0 {
        assert!(dsp.exists(0, 3), "rank 0 must see the entry written by rank 1");
    }
    Ok(())
}
