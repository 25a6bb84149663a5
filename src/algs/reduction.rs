//! Global reductions over all ranks of a communicator.
//!
//! Rank 0 gathers the per-rank contributions, combines them in rank order and
//! broadcasts the result, so every rank sees bit-identical values.

use crate::algs::communicator::{CommTag, Communicator, Wait};
use crate::algs::wire::{WireScalar, cast_slice};
use crate::grid_error::GridError;

const REDUCE_TAG: CommTag = CommTag::new(0x5E00);

fn recv_scalar<C: Communicator>(comm: &C, peer: usize, tag: u16) -> Result<WireScalar, GridError> {
    let raw = comm
        .irecv(peer, tag, std::mem::size_of::<WireScalar>())
        .wait()
        .ok_or_else(|| GridError::CommError {
            neighbor: peer,
            reason: "no reduction payload received".into(),
        })?;
    if raw.len() != std::mem::size_of::<WireScalar>() {
        return Err(GridError::HaloSizeMismatch {
            neighbor: peer,
            expected: std::mem::size_of::<WireScalar>(),
            found: raw.len(),
        });
    }
    Ok(bytemuck::pod_read_unaligned(&raw))
}

/// Sum of `local` over all ranks.
pub fn global_sum<C: Communicator>(comm: &C, local: f64) -> Result<f64, GridError> {
    if comm.size() == 1 {
        return Ok(local);
    }
    let gather = REDUCE_TAG.base();
    let bcast = REDUCE_TAG.offset(1).base();
    let me = comm.rank();
    if me == 0 {
        let mut total = local;
        for peer in 1..comm.size() {
            let msg = recv_scalar(comm, peer, gather)?;
            debug_assert_eq!(msg.rank as usize, peer);
            total += msg.value;
        }
        let out = [WireScalar {
            value: total,
            rank: 0,
        }];
        let sends: Vec<_> = (1..comm.size())
            .map(|peer| comm.isend(peer, bcast, cast_slice(&out)))
            .collect();
        for s in sends {
            s.wait();
        }
        Ok(total)
    } else {
        let msg = [WireScalar {
            value: local,
            rank: me as u64,
        }];
        comm.isend(0, gather, cast_slice(&msg)).wait();
        Ok(recv_scalar(comm, 0, bcast)?.value)
    }
}

/// Euclidean norm of a vector distributed over all ranks.
pub fn global_norm2<C: Communicator>(comm: &C, local: &[f64]) -> Result<f64, GridError> {
    let sq: f64 = local.iter().map(|x| x * x).sum();
    Ok(global_sum(comm, sq)?.sqrt())
}
