//! Stage 2: exchange the records themselves.

use crate::algs::communicator::{CommTag, Communicator, Wait};
use crate::algs::wire::{cast_slice, decode_records};
use crate::sparsity_error::SparsityError;
use bytemuck::Pod;
use std::collections::HashMap;

/// Send `links[nbr]` to every neighbor with a non-empty list and receive
/// `recv_counts[nbr]` records from every neighbor with a nonzero count.
///
/// Returns the received records per neighbor. Neighbors with a zero count
/// exchange no payload message at all.
pub fn exchange_data<C, T>(
    links: &HashMap<usize, Vec<T>>,
    recv_counts: &HashMap<usize, usize>,
    comm: &C,
    tag: CommTag,
) -> Result<HashMap<usize, Vec<T>>, SparsityError>
where
    C: Communicator,
    T: Pod,
{
    let rec = std::mem::size_of::<T>();

    let mut recvs = Vec::new();
    for (&nbr, &n) in recv_counts.iter().filter(|&(_, &n)| n > 0) {
        let mut buffer = vec![0u8; n * rec];
        let h = comm.irecv(nbr, tag.as_u16(), &mut buffer);
        recvs.push((nbr, n, h));
    }

    let mut pending_sends = Vec::new();
    for (&nbr, items) in links.iter().filter(|(_, v)| !v.is_empty()) {
        pending_sends.push(comm.isend(nbr, tag.as_u16(), cast_slice(items)));
    }

    let mut out = HashMap::with_capacity(recvs.len());
    let mut maybe_err = None;
    for (nbr, n, h) in recvs {
        match h.wait() {
            Some(raw) if maybe_err.is_none() => match decode_records::<T>(&raw, n) {
                Ok(items) => {
                    out.insert(nbr, items);
                }
                Err(msg) => {
                    maybe_err = Some(SparsityError::comm(nbr, format!("payload: {msg}")));
                }
            },
            None if maybe_err.is_none() => {
                maybe_err = Some(SparsityError::comm(
                    nbr,
                    format!("failed to receive {n} records from rank {nbr}"),
                ));
            }
            _ => {}
        }
    }

    for send in pending_sends {
        let _ = send.wait();
    }

    match maybe_err {
        Some(err) => Err(err),
        None => Ok(out),
    }
}
