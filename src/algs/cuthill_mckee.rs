//! Cuthill-McKee renumbering of sparsity-pattern graphs.
//!
//! Nodes are numbered level by level starting from a seed set: level 0 is the
//! seed set, level `k+1` is every not-yet-numbered neighbour of level `k`.
//! Inside a level, nodes are ordered by ascending coordination number (ties by
//! original index), which keeps the matrix profile close to the diagonal.
//!
//! Without user seeds every connected component is numbered in turn, each
//! starting from its node of smallest coordination number. With user seeds
//! the graph must be connected: the caller is taken to want full control, and
//! choosing starting nodes for unseeded components is not done silently.
//!
//! Couplings are followed in both directions: a node is a neighbour of `i` if
//! it appears in row `i` or row `i` has an entry in its row. Square patterns
//! that are not structurally symmetric are therefore still numbered
//! completely.
//!
//! This is plain Cuthill-McKee; the reversed variant is not produced here.

use crate::sparsity::graph::{ConnectivityGraph, coordination_numbers, ensure_square};
use crate::sparsity_error::SparsityError;

const UNNUMBERED: usize = usize::MAX;

/// Compute a Cuthill-McKee renumbering of the nodes of `graph`.
///
/// Returns `new_indices` with `new_indices[old] = new`, a bijection on
/// `[0, n)`. An empty `starting_indices` slice selects seeds automatically;
/// otherwise the seeds receive new indices `0, 1, ..., k-1` in the order given.
///
/// # Errors
/// * `InvalidArgument` if the graph is not square, or a starting index is out
///   of range or repeated.
/// * `Configuration` if starting indices are given and the graph has more
///   than one connected component.
/// * `InvalidPermutation` if some node could not be numbered; the result is
///   never a partial numbering.
///
/// # Example
/// ```rust
/// # fn try_main() -> Result<(), sparsity_sieve::sparsity_error::SparsityError> {
/// use sparsity_sieve::algs::cuthill_mckee::reorder_cuthill_mckee;
/// use sparsity_sieve::sparsity::SparsityPattern;
/// // path 0-1-2-3 started from one end numbers nodes in place
/// let sp = SparsityPattern::from_edges(4, &[(0, 1), (1, 2), (2, 3)])?;
/// assert_eq!(reorder_cuthill_mckee(&sp, &[0])?, vec![0, 1, 2, 3]);
/// assert_eq!(reorder_cuthill_mckee(&sp, &[3])?, vec![3, 2, 1, 0]);
/// # Ok(())
/// # }
/// # try_main().unwrap();
/// ```
pub fn reorder_cuthill_mckee<G>(
    graph: &G,
    starting_indices: &[usize],
) -> Result<Vec<usize>, SparsityError>
where
    G: ConnectivityGraph + Sync + ?Sized,
{
    let n = ensure_square(graph)?;
    check_starting_indices(starting_indices, n)?;

    let prims = CmPrims::new(graph);
    let (labels, n_components) = label_components(&prims.adjacency);

    if !starting_indices.is_empty() && n_components > 1 {
        return Err(SparsityError::Configuration(format!(
            "starting indices given, but the graph has {n_components} unconnected components"
        )));
    }

    let mut new_indices = vec![UNNUMBERED; n];
    let mut next = 0;
    if starting_indices.is_empty() {
        for seed in prims.component_seeds(&labels, n_components) {
            next = prims.number_levels(vec![seed], &mut new_indices, next);
        }
    } else {
        next = prims.number_levels(starting_indices.to_vec(), &mut new_indices, next);
    }
    // restart from the cheapest unnumbered node while any remain
    while next < n {
        let Some(seed) = prims.cheapest_unnumbered(&new_indices) else {
            break;
        };
        log::warn!("cuthill-mckee: restarting numbering at node {seed}");
        next = prims.number_levels(vec![seed], &mut new_indices, next);
    }
    if let Some(v) = new_indices.iter().position(|&i| i == UNNUMBERED) {
        return Err(SparsityError::InvalidPermutation(format!(
            "node {v} was not reached by the renumbering"
        )));
    }

    log::debug!(
        "cuthill-mckee: {n} nodes, {n_components} components, {} seeds given",
        starting_indices.len()
    );
    Ok(new_indices)
}

/// Same ordering as [`reorder_cuthill_mckee`], read as new → old: entry `k`
/// is the original node that receives new index `k`.
pub fn cuthill_mckee_order<G>(
    graph: &G,
    starting_indices: &[usize],
) -> Result<Vec<usize>, SparsityError>
where
    G: ConnectivityGraph + Sync + ?Sized,
{
    let new_indices = reorder_cuthill_mckee(graph, starting_indices)?;
    let mut order = vec![0; new_indices.len()];
    for (old, &new) in new_indices.iter().enumerate() {
        order[new] = old;
    }
    Ok(order)
}

fn check_starting_indices(starting_indices: &[usize], n: usize) -> Result<(), SparsityError> {
    let mut seen = vec![false; n];
    for &s in starting_indices {
        if s >= n {
            return Err(SparsityError::InvalidArgument(format!(
                "starting index {s} out of range for {n} nodes"
            )));
        }
        if std::mem::replace(&mut seen[s], true) {
            return Err(SparsityError::InvalidArgument(format!(
                "starting index {s} given more than once"
            )));
        }
    }
    Ok(())
}

/// Label connected components by a breadth-first sweep in ascending node
/// order, so component `c` is the one whose lowest-index node is the `c`-th
/// smallest such node. Row and column couplings both connect nodes.
/// Returns `(labels, n_components)`.
pub fn component_labels<G>(graph: &G) -> (Vec<usize>, usize)
where
    G: ConnectivityGraph + ?Sized,
{
    label_components(&symmetric_adjacency(graph))
}

/// Neighbour lists of the structure made symmetric, self-loops dropped.
fn symmetric_adjacency<G>(graph: &G) -> Vec<Vec<usize>>
where
    G: ConnectivityGraph + ?Sized,
{
    let n = graph.n_nodes();
    let mut adj = vec![Vec::new(); n];
    for u in 0..n {
        for v in graph.neighbors(u) {
            if v < n && v != u {
                adj[u].push(v);
                adj[v].push(u);
            }
        }
    }
    for list in &mut adj {
        list.sort_unstable();
        list.dedup();
    }
    adj
}

fn label_components(adj: &[Vec<usize>]) -> (Vec<usize>, usize) {
    let n = adj.len();
    let mut labels = vec![UNNUMBERED; n];
    let mut n_components = 0;
    let mut queue = std::collections::VecDeque::new();
    for root in 0..n {
        if labels[root] != UNNUMBERED {
            continue;
        }
        labels[root] = n_components;
        queue.push_back(root);
        while let Some(u) = queue.pop_front() {
            for &v in &adj[u] {
                if labels[v] == UNNUMBERED {
                    labels[v] = n_components;
                    queue.push_back(v);
                }
            }
        }
        n_components += 1;
    }
    (labels, n_components)
}

/// Symmetrized adjacency plus cached coordination numbers.
struct CmPrims {
    adjacency: Vec<Vec<usize>>,
    /// degree[i] = coordination number of node i
    degree: Vec<usize>,
}

impl CmPrims {
    fn new<G>(graph: &G) -> Self
    where
        G: ConnectivityGraph + Sync + ?Sized,
    {
        Self {
            adjacency: symmetric_adjacency(graph),
            degree: coordination_numbers(graph),
        }
    }

    /// Unnumbered node of smallest coordination number, lowest index on ties.
    fn cheapest_unnumbered(&self, new_indices: &[usize]) -> Option<usize> {
        (0..new_indices.len())
            .filter(|&v| new_indices[v] == UNNUMBERED)
            .min_by_key(|&v| (self.degree[v], v))
    }

    /// One seed per component: minimum coordination number, lowest index on ties.
    fn component_seeds(&self, labels: &[usize], n_components: usize) -> Vec<usize> {
        let mut best: Vec<Option<usize>> = vec![None; n_components];
        for (v, &c) in labels.iter().enumerate() {
            match best[c] {
                // strict comparison keeps the lower index on ties
                Some(b) if self.degree[b] <= self.degree[v] => {}
                _ => best[c] = Some(v),
            }
        }
        best.into_iter().flatten().collect()
    }

    /// Number `level0` and everything reachable from it, consecutively from
    /// `next`. Returns the first index not handed out.
    fn number_levels(&self, level0: Vec<usize>, new_indices: &mut [usize], mut next: usize) -> usize {
        for &v in &level0 {
            new_indices[v] = next;
            next += 1;
        }
        let mut frontier = level0;
        let mut depth = 0usize;
        while !frontier.is_empty() {
            let mut level = Vec::new();
            for &u in &frontier {
                for &v in &self.adjacency[u] {
                    if new_indices[v] == UNNUMBERED {
                        // reserve now so a node shared by two parents is queued once
                        new_indices[v] = next;
                        level.push(v);
                    }
                }
            }
            level.sort_unstable_by_key(|&v| (self.degree[v], v));
            for &v in &level {
                new_indices[v] = next;
                next += 1;
            }
            depth += 1;
            log::trace!("cuthill-mckee: level {depth} holds {} nodes", level.len());
            frontier = level;
        }
        next
    }
}
