//! Stage 1: exchange record counts with each neighbor.
//!
//! Symmetric: every listed neighbor gets a count, zero included, so each side
//! knows exactly which payloads to expect in stage 2.

use crate::algs::communicator::{CommTag, Communicator, Wait};
use crate::algs::wire::{WireCount, cast_slice, cast_slice_mut, decode_records};
use crate::sparsity_error::SparsityError;
use bytemuck::Zeroable;
use std::collections::HashMap;

/// Posts irecv/isend for the number of records to expect from each of
/// `all_neighbors`. Returns a map `nbr → count` once all receives completed.
///
/// # Errors
/// `InvalidArgument`, before anything is posted, if a list is too long for
/// the count header; `CommError` if a count is missing or malformed.
pub fn exchange_sizes_symmetric<C, T>(
    links: &HashMap<usize, Vec<T>>,
    comm: &C,
    tag: CommTag,
    all_neighbors: &[usize],
) -> Result<HashMap<usize, usize>, SparsityError>
where
    C: Communicator,
{
    // 0) encode outgoing counts; nothing is posted if one does not fit
    let send_bufs = all_neighbors
        .iter()
        .map(|nbr| WireCount::new(links.get(nbr).map_or(0, |v| v.len())))
        .collect::<Result<Vec<_>, _>>()?;

    // 1) post all receives
    let mut recv_size = Vec::with_capacity(all_neighbors.len());
    for &nbr in all_neighbors {
        let mut cnt = WireCount::zeroed();
        let h = comm.irecv(
            nbr,
            tag.as_u16(),
            cast_slice_mut(std::slice::from_mut(&mut cnt)),
        );
        recv_size.push((nbr, h));
    }

    // 2) post all sends; buffers stay alive until sends complete
    let mut pending_sends = Vec::with_capacity(all_neighbors.len());
    for (&nbr, count) in all_neighbors.iter().zip(&send_bufs) {
        pending_sends.push(comm.isend(
            nbr,
            tag.as_u16(),
            cast_slice(std::slice::from_ref(count)),
        ));
    }

    // 3) wait for all recvs, collect counts (but do not early-return)
    let mut sizes_in = HashMap::with_capacity(all_neighbors.len());
    let mut maybe_err = None;
    for (nbr, h) in recv_size {
        match h.wait() {
            Some(data) if maybe_err.is_none() => {
                match decode_records::<WireCount>(&data, 1) {
                    Ok(cnt) => {
                        sizes_in.insert(nbr, cnt[0].get());
                    }
                    Err(msg) => {
                        maybe_err =
                            Some(SparsityError::comm(nbr, format!("size header: {msg}")));
                    }
                }
            }
            None if maybe_err.is_none() => {
                maybe_err = Some(SparsityError::comm(
                    nbr,
                    format!("failed to receive size from rank {nbr}"),
                ));
            }
            _ => {} // already have an error; just drain
        }
    }

    // 4) always drain all send handles before returning
    for send in pending_sends {
        let _ = send.wait();
    }
    drop(send_bufs);

    match maybe_err {
        Some(err) => Err(err),
        None => Ok(sizes_in),
    }
}
