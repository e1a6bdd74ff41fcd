//! Distributed sparsity-pattern row exchange.
//!
//! Each process builds its pattern independently, possibly adding entries to
//! rows some other process owns. [`distribute_sparsity_pattern`] ships those
//! entries to their owners and merges what arrives, so that afterwards every
//! owned row holds the union of what any process added to it within its
//! locally relevant rows.
//!
//! # Collective contract
//! Every rank of the communicator must call [`distribute_sparsity_pattern`]
//! the same number of times, in the same order, with the same tag, even
//! ranks with nothing to send. A rank that skips a call leaves the others
//! waiting forever; this is not detected.

use crate::algs::communicator::{CommTag, Communicator, ExchangeCommTags};
use crate::algs::exchange::{exchange_data, exchange_sizes_symmetric};
use crate::algs::wire::WireEntry;
use crate::data::index_set::IndexSet;
use crate::sparsity::dynamic::DynamicSparsityPattern;
use crate::sparsity_error::SparsityError;
use std::collections::HashMap;
use std::ops::Range;

/// Maps a global row to the rank that owns it.
pub trait RowOwnership {
    /// Owning rank of `row`, or `None` if no rank owns it.
    fn owner_of(&self, row: usize) -> Option<usize>;
    /// Number of ranks the rows are distributed over.
    fn n_owners(&self) -> usize;
}

impl<O: RowOwnership + ?Sized> RowOwnership for &O {
    fn owner_of(&self, row: usize) -> Option<usize> {
        (**self).owner_of(row)
    }
    fn n_owners(&self) -> usize {
        (**self).n_owners()
    }
}

/// Rank `p` owns the `rows_per_process[p]` rows following those of rank `p - 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContiguousOwnership {
    /// `offsets[p]..offsets[p + 1]` is owned by rank `p`.
    offsets: Vec<usize>,
}

impl ContiguousOwnership {
    pub fn from_rows_per_process(rows_per_process: &[usize]) -> Self {
        let mut offsets = Vec::with_capacity(rows_per_process.len() + 1);
        offsets.push(0);
        let mut acc = 0;
        for &n in rows_per_process {
            acc += n;
            offsets.push(acc);
        }
        Self { offsets }
    }

    /// Total number of rows.
    pub fn n_rows(&self) -> usize {
        self.offsets.last().copied().unwrap_or(0)
    }

    /// Rows owned by `rank`, empty for ranks past the end.
    pub fn owned_range(&self, rank: usize) -> std::ops::Range<usize> {
        match (self.offsets.get(rank), self.offsets.get(rank + 1)) {
            (Some(&a), Some(&b)) => a..b,
            _ => 0..0,
        }
    }
}

impl RowOwnership for ContiguousOwnership {
    fn owner_of(&self, row: usize) -> Option<usize> {
        if row >= self.n_rows() {
            return None;
        }
        // last offset <= row; ranks with zero rows share an offset and are skipped
        Some(self.offsets.partition_point(|&o| o <= row) - 1)
    }

    fn n_owners(&self) -> usize {
        self.offsets.len() - 1
    }
}

/// Rank `p` owns exactly the rows in `sets[p]`.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSetOwnership {
    sets: Vec<IndexSet>,
    /// every owned range of every rank, sorted by start: `(range, rank)`
    lookup: Vec<(Range<usize>, usize)>,
}

impl IndexSetOwnership {
    /// # Errors
    /// `Configuration` if the sets do not share one global size or overlap.
    pub fn new(sets: Vec<IndexSet>) -> Result<Self, SparsityError> {
        let mut lookup = Vec::new();
        if let Some(first) = sets.first() {
            let size = first.size();
            for (p, s) in sets.iter().enumerate() {
                if s.size() != size {
                    return Err(SparsityError::Configuration(format!(
                        "index set of rank {p} has size {}, rank 0 has {size}",
                        s.size()
                    )));
                }
                lookup.extend(s.ranges().iter().map(|r| (r.clone(), p)));
            }
        }
        lookup.sort_unstable_by_key(|(r, _)| r.start);
        if let Some(w) = lookup.windows(2).find(|w| w[0].0.end > w[1].0.start) {
            return Err(SparsityError::Configuration(format!(
                "owned index sets of ranks {} and {} overlap",
                w[0].1, w[1].1
            )));
        }
        Ok(Self { sets, lookup })
    }

    pub fn owned(&self, rank: usize) -> Option<&IndexSet> {
        self.sets.get(rank)
    }
}

impl RowOwnership for IndexSetOwnership {
    /// **O(log r)** in the total number of owned ranges.
    fn owner_of(&self, row: usize) -> Option<usize> {
        let pos = self.lookup.partition_point(|(r, _)| r.end <= row);
        match self.lookup.get(pos) {
            Some((r, p)) if r.start <= row => Some(*p),
            _ => None,
        }
    }

    fn n_owners(&self) -> usize {
        self.sets.len()
    }
}

/// Ownership given by a function `row → rank`.
#[derive(Clone)]
pub struct OwnerFn<F> {
    n_owners: usize,
    f: F,
}

impl<F: Fn(usize) -> Option<usize>> OwnerFn<F> {
    pub fn new(n_owners: usize, f: F) -> Self {
        Self { n_owners, f }
    }
}

impl<F: Fn(usize) -> Option<usize>> RowOwnership for OwnerFn<F> {
    fn owner_of(&self, row: usize) -> Option<usize> {
        (self.f)(row)
    }
    fn n_owners(&self) -> usize {
        self.n_owners
    }
}

/// Send entries of non-owned rows to their owners and merge what others sent.
///
/// Only rows in `locally_relevant` that `pattern` stores, that are non-empty
/// and that another rank owns are sent. Received entries are added to owned
/// rows; nothing is ever removed, so repeating the call is a no-op.
/// `tag` and the tag after it are used for the two exchange phases.
///
/// # Errors
/// * `Configuration` if `ownership` describes a different number of ranks
///   than `comm` has, or `locally_relevant` has a different global size than
///   the pattern has rows.
/// * `InvalidArgument` if a row to be sent has no owner, or more than
///   `u32::MAX` entries go to one rank.
/// * `CommError` on transport failure or a malformed message.
///
/// Argument errors are detected before any message is posted.
pub fn distribute_sparsity_pattern<O, C>(
    pattern: &mut DynamicSparsityPattern,
    ownership: &O,
    comm: &C,
    locally_relevant: &IndexSet,
    tag: CommTag,
) -> Result<(), SparsityError>
where
    O: RowOwnership + ?Sized,
    C: Communicator,
{
    let size = comm.size();
    let me = comm.rank();
    if ownership.n_owners() != size {
        return Err(SparsityError::Configuration(format!(
            "ownership describes {} ranks, communicator has {size}",
            ownership.n_owners()
        )));
    }
    if locally_relevant.size() != pattern.n_rows() {
        return Err(SparsityError::Configuration(format!(
            "locally relevant set has size {}, pattern has {} rows",
            locally_relevant.size(),
            pattern.n_rows()
        )));
    }

    // 1) group non-owned relevant rows by destination
    let mut send: HashMap<usize, Vec<WireEntry>> = HashMap::new();
    for row in locally_relevant.iter() {
        if !pattern.stores_row(row) || pattern.row_length(row) == 0 {
            continue;
        }
        match ownership.owner_of(row) {
            Some(owner) if owner == me => {}
            Some(owner) if owner < size => {
                send.entry(owner)
                    .or_default()
                    .extend(pattern.row(row).map(|col| WireEntry::new(row, col)));
            }
            Some(owner) => {
                return Err(SparsityError::InvalidArgument(format!(
                    "row {row} is owned by rank {owner}, outside the {size} ranks"
                )));
            }
            None => {
                return Err(SparsityError::InvalidArgument(format!(
                    "row {row} is locally relevant but owned by no rank"
                )));
            }
        }
    }
    if size <= 1 || comm.is_no_comm() {
        return Ok(());
    }

    // 2) counts, then entries
    let peers: Vec<usize> = (0..size).filter(|&r| r != me).collect();
    let tags = ExchangeCommTags::from_base(tag);
    let counts = exchange_sizes_symmetric(&send, comm, tags.sizes, &peers)?;
    let received = exchange_data(&send, &counts, comm, tags.data)?;
    log::debug!(
        "distribute (rank {me}): sent {} entries to {} ranks, received {} entries",
        send.values().map(Vec::len).sum::<usize>(),
        send.len(),
        received.values().map(Vec::len).sum::<usize>()
    );

    // 3) validate everything, then merge
    for (&src, entries) in &received {
        for e in entries {
            let (row, col) = (e.row(), e.col());
            if row >= pattern.n_rows() || col >= pattern.n_cols() {
                return Err(SparsityError::comm(
                    src,
                    format!("entry ({row}, {col}) outside the pattern"),
                ));
            }
            if ownership.owner_of(row) != Some(me) || !pattern.stores_row(row) {
                return Err(SparsityError::comm(
                    src,
                    format!("received row {row}, which is not owned and stored here"),
                ));
            }
        }
    }
    let mut added = 0;
    for entries in received.values() {
        for e in entries {
            if pattern.add(e.row(), e.col())? {
                added += 1;
            }
        }
    }
    log::trace!("distribute (rank {me}): {added} new entries merged");
    Ok(())
}

/// [`distribute_sparsity_pattern`] with rank `p` owning the next
/// `rows_per_process[p]` rows.
pub fn distribute_sparsity_pattern_contiguous<C: Communicator>(
    pattern: &mut DynamicSparsityPattern,
    rows_per_process: &[usize],
    comm: &C,
    locally_relevant: &IndexSet,
    tag: CommTag,
) -> Result<(), SparsityError> {
    let ownership = ContiguousOwnership::from_rows_per_process(rows_per_process);
    distribute_sparsity_pattern(pattern, &ownership, comm, locally_relevant, tag)
}

/// [`distribute_sparsity_pattern`] with rank `p` owning `owned_per_process[p]`.
pub fn distribute_sparsity_pattern_index_sets<C: Communicator>(
    pattern: &mut DynamicSparsityPattern,
    owned_per_process: &[IndexSet],
    comm: &C,
    locally_relevant: &IndexSet,
    tag: CommTag,
) -> Result<(), SparsityError> {
    let ownership = IndexSetOwnership::new(owned_per_process.to_vec())?;
    distribute_sparsity_pattern(pattern, &ownership, comm, locally_relevant, tag)
}
