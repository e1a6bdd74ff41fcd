//! In-process graph-growing partitioner.
//!
//! Parts are grown one at a time by breadth-first search from a
//! pseudo-peripheral seed, each taking its share of the remaining node
//! weight; the last part takes what is left. A few boundary-refinement sweeps
//! then move nodes whose neighbours mostly live in another part, as long as
//! the balance bound of [`PartitionerConfig::imbalance`] holds.
//!
//! Quality is below a multilevel partitioner on large meshes, but it needs no
//! external library and is deterministic for a fixed `rng_seed`.

use crate::partitioning::{GraphPartitioner, PartitionId, PartitionerConfig};
use crate::sparsity::graph::CsrAdjacency;
use crate::sparsity_error::SparsityError;
use hashbrown::{HashMap, HashSet};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

const UNASSIGNED: usize = usize::MAX;

#[derive(Debug, Clone, Default)]
pub struct GreedyPartitioner {
    pub config: PartitionerConfig,
}

impl GreedyPartitioner {
    pub fn new(config: PartitionerConfig) -> Self {
        Self { config }
    }
}

impl GraphPartitioner for GreedyPartitioner {
    fn name(&self) -> &'static str {
        "greedy"
    }

    fn partition_graph(
        &self,
        graph: &CsrAdjacency,
        n_parts: usize,
    ) -> Result<Vec<PartitionId>, SparsityError> {
        match n_parts {
            0 => {
                return Err(SparsityError::Configuration(
                    "number of partitions must be greater than zero".into(),
                ));
            }
            1 => return Ok(vec![0; graph.n_nodes()]),
            _ => {}
        }
        if !(self.config.imbalance >= 0.0) {
            return Err(SparsityError::Configuration(format!(
                "imbalance tolerance must be non-negative, got {}",
                self.config.imbalance
            )));
        }
        let mut state = GrowState::new(graph, n_parts, &self.config);
        state.grow_all();
        let moved = state.refine();
        log::debug!(
            "greedy partitioner: {} nodes into {n_parts} parts, {moved} refinement moves, loads {:?}",
            graph.n_nodes(),
            state.load
        );
        Ok(state.part)
    }
}

struct GrowState<'a> {
    graph: &'a CsrAdjacency,
    cfg: &'a PartitionerConfig,
    n_parts: usize,
    weight: Vec<u64>,
    part: Vec<usize>,
    load: Vec<u64>,
    /// hard cap on any part's load
    cap: u64,
    rng: SmallRng,
}

impl<'a> GrowState<'a> {
    fn new(graph: &'a CsrAdjacency, n_parts: usize, cfg: &'a PartitionerConfig) -> Self {
        let n = graph.n_nodes();
        let mut weight: Vec<u64> = graph.vwgt.iter().map(|&w| w.max(0) as u64).collect();
        if weight.iter().all(|&w| w == 0) {
            weight = vec![1; n];
        }
        let total: u64 = weight.iter().sum();
        let heaviest = weight.iter().copied().max().unwrap_or(1);
        let ideal = total as f64 / n_parts as f64;
        // a single node heavier than the bound still has to fit somewhere
        let cap = ((1.0 + cfg.imbalance) * ideal).ceil().max(heaviest as f64) as u64;
        Self {
            graph,
            cfg,
            n_parts,
            weight,
            part: vec![UNASSIGNED; n],
            load: vec![0; n_parts],
            cap,
            rng: SmallRng::seed_from_u64(cfg.rng_seed),
        }
    }

    fn grow_all(&mut self) {
        let mut remaining: u64 = self.weight.iter().sum();
        for p in 0..self.n_parts - 1 {
            let parts_left = (self.n_parts - p) as u64;
            let target = remaining.div_ceil(parts_left);
            self.grow_part(p, target);
            remaining -= self.load[p];
        }
        let last = self.n_parts - 1;
        for v in 0..self.part.len() {
            if self.part[v] == UNASSIGNED {
                self.part[v] = last;
                self.load[last] += self.weight[v];
            }
        }
    }

    fn grow_part(&mut self, p: usize, target: u64) {
        while self.load[p] < target {
            let Some(seed) = self.pick_seed() else { return };
            if self.fill_from(p, seed, target) > 0 {
                continue;
            }
            // the seed's region does not fit; fall back to any node that does
            let fitting = (0..self.part.len())
                .find(|&v| self.part[v] == UNASSIGNED && self.load[p] + self.weight[v] <= self.cap);
            match fitting {
                Some(v) => {
                    self.fill_from(p, v, target);
                }
                None => return,
            }
        }
    }

    /// Breadth-first fill of part `p` from `seed` until `target` is reached or
    /// the reachable unassigned region is exhausted. Returns nodes assigned.
    fn fill_from(&mut self, p: usize, seed: usize, target: u64) -> usize {
        let mut assigned = 0;
        let mut queue = VecDeque::from([seed]);
        let mut queued = HashSet::new();
        queued.insert(seed);
        while let Some(v) = queue.pop_front() {
            if self.load[p] >= target {
                break;
            }
            if self.load[p] + self.weight[v] > self.cap && self.load[p] > 0 {
                continue;
            }
            self.part[v] = p;
            self.load[p] += self.weight[v];
            assigned += 1;
            for &u in self.graph.neighbors_of(v) {
                if self.part[u] == UNASSIGNED && queued.insert(u) {
                    queue.push_back(u);
                }
            }
        }
        assigned
    }

    /// Random unassigned node, walked to the far end of its unassigned region.
    fn pick_seed(&mut self) -> Option<usize> {
        let free: Vec<usize> = (0..self.part.len())
            .filter(|&v| self.part[v] == UNASSIGNED)
            .collect();
        if free.is_empty() {
            return None;
        }
        let start = free[self.rng.gen_range(0..free.len())];
        // last node reached by a BFS over unassigned nodes is pseudo-peripheral
        let mut seen = HashSet::new();
        seen.insert(start);
        let mut queue = VecDeque::from([start]);
        let mut last = start;
        while let Some(v) = queue.pop_front() {
            last = v;
            for &u in self.graph.neighbors_of(v) {
                if self.part[u] == UNASSIGNED && seen.insert(u) {
                    queue.push_back(u);
                }
            }
        }
        Some(last)
    }

    /// Boundary refinement; returns the number of moves made.
    fn refine(&mut self) -> usize {
        let mut total_moves = 0;
        for _ in 0..self.cfg.refinement_passes {
            let mut moves = 0;
            for v in 0..self.part.len() {
                if self.try_move(v) {
                    moves += 1;
                }
            }
            total_moves += moves;
            if moves == 0 {
                break;
            }
        }
        total_moves
    }

    fn try_move(&mut self, v: usize) -> bool {
        let own = self.part[v];
        let w = self.weight[v];
        if self.load[own] <= w {
            // never empty a part
            return false;
        }
        let mut conn: HashMap<usize, i64> = HashMap::new();
        for &u in self.graph.neighbors_of(v) {
            *conn.entry(self.part[u]).or_insert(0) += 1;
        }
        let internal = conn.get(&own).copied().unwrap_or(0);
        let overloaded = self.load[own] > self.cap;
        let best = conn
            .iter()
            .filter(|&(&q, _)| q != own && self.load[q] + w <= self.cap)
            .max_by_key(|&(&q, &c)| (c, std::cmp::Reverse(self.load[q]), std::cmp::Reverse(q)))
            .map(|(&q, &c)| (q, c));
        match best {
            Some((q, c)) if c > internal || (overloaded && self.load[q] + w < self.load[own]) => {
                self.part[v] = q;
                self.load[own] -= w;
                self.load[q] += w;
                true
            }
            _ => false,
        }
    }
}
