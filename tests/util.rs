#![allow(dead_code)]
use sparsity_sieve::{
    algs::communicator::RayonComm,
    sparsity::{DynamicSparsityPattern, SparsityPattern},
};

/// Path 0 - 1 - ... - (n-1).
pub fn path_edges(n: usize) -> Vec<(usize, usize)> {
    (1..n).map(|i| (i - 1, i)).collect()
}

pub fn path(n: usize) -> SparsityPattern {
    SparsityPattern::from_edges(n, &path_edges(n)).unwrap()
}

/// Structured nx × ny grid, node `j * nx + i`, 4-neighbour coupling.
pub fn grid_edges(nx: usize, ny: usize) -> Vec<(usize, usize)> {
    let mut edges = Vec::new();
    for j in 0..ny {
        for i in 0..nx {
            let v = j * nx + i;
            if i + 1 < nx {
                edges.push((v, v + 1));
            }
            if j + 1 < ny {
                edges.push((v, v + nx));
            }
        }
    }
    edges
}

pub fn grid(nx: usize, ny: usize) -> SparsityPattern {
    SparsityPattern::from_edges(nx * ny, &grid_edges(nx, ny)).unwrap()
}

/// Relabel the nodes of an edge list through `perm[old] = new`.
pub fn relabel(edges: &[(usize, usize)], perm: &[usize]) -> Vec<(usize, usize)> {
    edges.iter().map(|&(u, v)| (perm[u], perm[v])).collect()
}

/// Two-rank Rayon comms (ranks 0 and 1).
pub fn rayons() -> (RayonComm, RayonComm) {
    (RayonComm::new(0, 2), RayonComm::new(1, 2))
}

/// Run `f(rank, comm)` on `size` threads, each a rank of one RayonComm group.
pub fn on_ranks<T, F>(size: usize, f: F) -> Vec<T>
where
    T: Send + 'static,
    F: Fn(usize, RayonComm) -> T + Send + Sync + Clone + 'static,
{
    let handles: Vec<_> = (0..size)
        .map(|rank| {
            let f = f.clone();
            std::thread::spawn(move || f(rank, RayonComm::new(rank, size)))
        })
        .collect();
    handles.into_iter().map(|h| h.join().unwrap()).collect()
}

/// Rows and columns of a dynamic pattern as sorted `(row, col)` pairs.
pub fn entries(dsp: &DynamicSparsityPattern) -> Vec<(usize, usize)> {
    dsp.stored_rows()
        .flat_map(|r| dsp.row(r).map(move |c| (r, c)))
        .collect()
}

/// Assert vec is a permutation of another vec (order-agnostic).
pub fn assert_permutation<T: Ord + Copy + std::fmt::Debug>(got: &[T], want: &[T]) {
    let mut a = got.to_vec();
    a.sort_unstable();
    let mut b = want.to_vec();
    b.sort_unstable();
    assert_eq!(a, b, "not a permutation\n got={:?}\nwant={:?}", got, want);
}

/// Bandwidth of a numbering `new_index[old]` over an undirected edge list.
pub fn bandwidth(new_index: &[usize], edges: &[(usize, usize)]) -> usize {
    edges
        .iter()
        .map(|&(u, v)| new_index[u].abs_diff(new_index[v]))
        .max()
        .unwrap_or(0)
}
