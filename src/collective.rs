//! Typed collectives built on [`Transport::exchange`](crate::transport::Transport::exchange).
//!
//! Every function here must be called by every PE of the group with the same
//! `root`. Size checks that depend on more than one PE are settled with an
//! extra exchange first, so all PEs return the same error and none of them
//! is left waiting in a later collective.

use crate::array::{DistributedVector, Partitioned};
use crate::error::ChainError;
use crate::group::WorkerGroup;

use bytemuck::{Pod, Zeroable};

fn check_root(group: &WorkerGroup, root: usize) -> Result<(), ChainError> {
    if root >= group.num_pes() {
        return Err(ChainError::transport(format!(
            "root pe {root} is outside a group of {} pes",
            group.num_pes()
        )));
    }
    Ok(())
}

fn decode_u64(src: usize, bytes: &[u8]) -> Result<u64, ChainError> {
    let raw: [u8; 8] = bytes
        .try_into()
        .map_err(|_| ChainError::transport(format!("malformed 8 byte word from pe {src}")))?;
    Ok(u64::from_le_bytes(raw))
}

/// Every PE contributes one value and receives all of them in rank order.
pub fn all_gather_u64(group: &WorkerGroup, value: u64) -> Result<Vec<u64>, ChainError> {
    let outgoing = vec![value.to_le_bytes().to_vec(); group.num_pes()];
    let incoming = group.exchange(outgoing)?;
    incoming
        .iter()
        .enumerate()
        .map(|(src, bytes)| decode_u64(src, bytes))
        .collect()
}

/// Prefix-count exchange: returns `(sum of counts of lower ranks, global sum)`.
pub fn exclusive_prefix_sum(group: &WorkerGroup, count: usize) -> Result<(usize, usize), ChainError> {
    let counts = all_gather_u64(group, count as u64)?;
    let prefix = counts[..group.my_pe()].iter().sum::<u64>() as usize;
    let total = counts.iter().sum::<u64>() as usize;
    Ok((prefix, total))
}

/// Replication broadcast: after return, `buf` on every PE is byte-identical
/// to `buf` on `root`.
///
/// Every PE's `buf.len()` must equal the root's. The counts are compared
/// before any payload moves and a mismatch fails on every PE. The payload
/// size is always `buf.len() * size_of::<T>()`.
pub fn broadcast<T: Pod>(group: &WorkerGroup, buf: &mut [T], root: usize) -> Result<(), ChainError> {
    check_root(group, root)?;
    let lens = all_gather_u64(group, buf.len() as u64)?;
    let expected = lens[root] as usize;
    if let Some((pe, len)) = lens
        .iter()
        .enumerate()
        .find(|(_, len)| **len as usize != expected)
    {
        return Err(ChainError::BufferSizeMismatch {
            pe,
            expected,
            actual: *len as usize,
        });
    }

    let mut outgoing = vec![Vec::new(); group.num_pes()];
    if group.my_pe() == root {
        let bytes: &[u8] = bytemuck::cast_slice(buf);
        for (pe, msg) in outgoing.iter_mut().enumerate() {
            if pe != root {
                *msg = bytes.to_vec();
            }
        }
    }
    let incoming = group.exchange(outgoing)?;

    if group.my_pe() != root {
        let dst: &mut [u8] = bytemuck::cast_slice_mut(buf);
        let src = &incoming[root];
        if src.len() != dst.len() {
            return Err(ChainError::transport(format!(
                "broadcast delivered {} bytes, expected {}",
                src.len(),
                dst.len()
            )));
        }
        dst.copy_from_slice(src);
    }
    Ok(())
}

/// Global-to-local collection: copies every element of `src`, in global
/// order, into `dst` on `root`.
///
/// The root's `dst.len()` must equal `src.global_len()`; the check happens
/// before the copy and its outcome is shared with every PE. `dst` is not
/// touched on the other PEs.
pub fn collect<T, A>(group: &WorkerGroup, src: &A, dst: &mut [T], root: usize) -> Result<(), ChainError>
where
    T: Pod,
    A: Partitioned<T>,
{
    check_root(group, root)?;
    let expected = src.global_len();
    let capacities = all_gather_u64(group, dst.len() as u64)?;
    let actual = capacities[root] as usize;
    if actual != expected {
        return Err(ChainError::BufferSizeMismatch {
            pe: root,
            expected,
            actual,
        });
    }

    let mut outgoing = vec![Vec::new(); group.num_pes()];
    if group.my_pe() != root {
        outgoing[root] = bytemuck::cast_slice(src.local_data()).to_vec();
    }
    let incoming = group.exchange(outgoing)?;

    if group.my_pe() == root {
        for (pe, bytes) in incoming.iter().enumerate() {
            let block = &mut dst[src.element_range(pe)];
            if pe == root {
                block.copy_from_slice(src.local_data());
                continue;
            }
            let block: &mut [u8] = bytemuck::cast_slice_mut(block);
            if bytes.len() != block.len() {
                return Err(ChainError::transport(format!(
                    "pe {pe} sent {} bytes for a block of {} bytes",
                    bytes.len(),
                    block.len()
                )));
            }
            block.copy_from_slice(bytes);
        }
    }
    Ok(())
}

/// Writes `values` into `target` at global positions starting at
/// `global_offset`, sending each piece to the PE that owns it.
///
/// Each PE may contribute one contiguous run (possibly empty); runs from
/// different PEs must not overlap.
pub fn place<T: Pod>(
    group: &WorkerGroup,
    target: &mut DistributedVector<T>,
    global_offset: usize,
    values: &[T],
) -> Result<(), ChainError> {
    let end = global_offset + values.len();
    if end > target.len() {
        return Err(ChainError::BufferSizeMismatch {
            pe: group.my_pe(),
            expected: target.len(),
            actual: end,
        });
    }

    let mut outgoing = vec![Vec::new(); group.num_pes()];
    for part in target.owners().overlapping(global_offset, end) {
        let mut msg = (part.start as u64).to_le_bytes().to_vec();
        msg.extend_from_slice(bytemuck::cast_slice(
            &values[part.start - global_offset..part.end - global_offset],
        ));
        outgoing[part.pe] = msg;
    }
    let incoming = group.exchange(outgoing)?;

    let elem_size = std::mem::size_of::<T>().max(1);
    let local_range = target.local_range();
    for (src, msg) in incoming.iter().enumerate() {
        if msg.is_empty() {
            continue;
        }
        if msg.len() < 8 || (msg.len() - 8) % elem_size != 0 {
            return Err(ChainError::transport(format!("malformed run from pe {src}")));
        }
        let (head, payload) = msg.split_at(8);
        let start = decode_u64(src, head)? as usize;
        let count = payload.len() / elem_size;
        if start < local_range.start || start + count > local_range.end {
            return Err(ChainError::transport(format!(
                "pe {src} sent elements {}..{} outside owned range {:?}",
                start,
                start + count,
                local_range
            )));
        }
        let offset = start - local_range.start;
        let dst: &mut [u8] =
            bytemuck::cast_slice_mut(&mut target.local_data_mut()[offset..offset + count]);
        dst.copy_from_slice(payload);
    }
    Ok(())
}

/// Collects `src` onto `root` and broadcasts it, so every PE ends up with an
/// identical local copy of the whole sequence.
pub fn replicate<T, A>(group: &WorkerGroup, src: &A, root: usize) -> Result<Vec<T>, ChainError>
where
    T: Pod,
    A: Partitioned<T>,
{
    // length comes from the sequence, not from the parameters
    let mut local = vec![T::zeroed(); src.global_len()];
    collect(group, src, &mut local, root)?;
    broadcast(group, &mut local, root)?;
    Ok(local)
}
