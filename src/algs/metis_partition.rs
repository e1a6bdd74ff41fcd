//! METIS multilevel k-way backend (feature `metis-support`).
//!
//! Converts a [`CsrAdjacency`] to METIS index types and calls
//! `METIS_PartGraphKway`. Any status other than `METIS_OK` is surfaced as
//! [`SparsityError::PartitionerFailure`] carrying the METIS code.

use crate::partitioning::{GraphPartitioner, PartitionId};
use crate::sparsity::graph::CsrAdjacency;
use crate::sparsity_error::SparsityError;
use metis_sys::{
    METIS_NOPTIONS, METIS_PartGraphKway, METIS_SetDefaultOptions, idx_t,
    moptions_et_METIS_OPTION_SEED, moptions_et_METIS_OPTION_UFACTOR, rstatus_et_METIS_OK,
};

/// Subset of METIS options exposed to callers; `None` keeps the METIS default.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetisOptions {
    /// Maximum allowed load imbalance, in thousandths above perfect balance
    /// (METIS default for k-way is 30, i.e. 1.03).
    pub ufactor: Option<i32>,
    /// Random seed.
    pub seed: Option<i32>,
}

/// A wrapper around METIS k-way partitioning.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetisPartitioner {
    pub options: MetisOptions,
}

impl MetisPartitioner {
    pub fn new(options: MetisOptions) -> Self {
        Self { options }
    }
}

fn to_idx(v: usize) -> Result<idx_t, SparsityError> {
    idx_t::try_from(v).map_err(|_| {
        SparsityError::InvalidArgument(format!("index {v} does not fit the METIS index type"))
    })
}

impl GraphPartitioner for MetisPartitioner {
    fn name(&self) -> &'static str {
        "metis"
    }

    fn partition_graph(
        &self,
        graph: &CsrAdjacency,
        n_parts: usize,
    ) -> Result<Vec<PartitionId>, SparsityError> {
        let mut n = to_idx(graph.n_nodes())?;
        let mut ncon: idx_t = 1;
        let mut nparts = to_idx(n_parts)?;
        let mut xadj = graph
            .xadj
            .iter()
            .map(|&u| to_idx(u))
            .collect::<Result<Vec<idx_t>, _>>()?;
        let mut adjncy = graph
            .adjncy
            .iter()
            .map(|&v| to_idx(v))
            .collect::<Result<Vec<idx_t>, _>>()?;
        let mut vwgt: Vec<idx_t> = graph.vwgt.iter().map(|&w| w as idx_t).collect();
        let mut part: Vec<idx_t> = vec![0; graph.n_nodes()];
        let mut objval: idx_t = 0;

        let mut options: Vec<idx_t> = vec![0; METIS_NOPTIONS as usize];
        // SAFETY: `options` has METIS_NOPTIONS entries as METIS requires.
        unsafe {
            METIS_SetDefaultOptions(options.as_mut_ptr());
        }
        if let Some(u) = self.options.ufactor {
            options[moptions_et_METIS_OPTION_UFACTOR as usize] = u as idx_t;
        }
        if let Some(s) = self.options.seed {
            options[moptions_et_METIS_OPTION_SEED as usize] = s as idx_t;
        }

        // SAFETY: every array is sized per the METIS contract (xadj n+1,
        // adjncy xadj[n], vwgt/part n) and outlives the call.
        let status = unsafe {
            METIS_PartGraphKway(
                &mut n,
                &mut ncon,
                xadj.as_mut_ptr(),
                adjncy.as_mut_ptr(),
                vwgt.as_mut_ptr(),
                std::ptr::null_mut(), // vsize
                std::ptr::null_mut(), // adjwgt
                &mut nparts,
                std::ptr::null_mut(), // tpwgts
                std::ptr::null_mut(), // ubvec
                options.as_mut_ptr(),
                &mut objval,
                part.as_mut_ptr(),
            )
        };
        if status != rstatus_et_METIS_OK as i32 {
            return Err(SparsityError::PartitionerFailure(status as i32));
        }
        log::debug!("metis: {n_parts} parts, edge cut {objval}");

        part.into_iter()
            .map(|p| {
                usize::try_from(p).map_err(|_| SparsityError::PartitionerFailure(p as i32))
            })
            .collect()
    }
}
