//! Winnowing and selection redistribution.
//!
//! The selection is the first `winnow_nelts` masked cells in row-major order
//! of the global matrix. A PE only sees its own rows, so the PEs first
//! exchange how many masked cells they hold; the exclusive prefix of those
//! counts is the sequence number of a PE's first masked cell. Each PE then
//! places the cells whose sequence number is below `winnow_nelts` into a
//! block-distributed result, which is finally collected onto the root and
//! broadcast back so every PE holds the same vector.

use crate::array::{DistributedMask, DistributedMatrix, DistributedVector, Partitioned};
use crate::collective::{exclusive_prefix_sum, place, replicate};
use crate::error::ChainError;
use crate::group::{WorkerGroup, ROOT_PE};

/// Selected cell values, distributed by sequence number.
pub fn winnow(
    group: &WorkerGroup,
    matrix: &DistributedMatrix<u32>,
    mask: &DistributedMask,
    winnow_nelts: usize,
) -> Result<DistributedVector<u32>, ChainError> {
    if mask.ncols() != matrix.ncols() || mask.local_row_range() != matrix.local_row_range() {
        return Err(ChainError::BufferSizeMismatch {
            pe: group.my_pe(),
            expected: matrix.global_len(),
            actual: mask.global_len(),
        });
    }

    // local data is stored row after row, so this is global row-major order
    let mut count = 0;
    let mut candidates = Vec::with_capacity(winnow_nelts.min(matrix.local_data().len()));
    for (value, flag) in matrix.local_data().iter().zip(mask.local_data()) {
        if *flag {
            if candidates.len() < winnow_nelts {
                candidates.push(*value);
            }
            count += 1;
        }
    }

    let (prefix, total) = exclusive_prefix_sum(group, count)?;
    tracing::debug!(count, prefix, total, "masked cells");
    if total < winnow_nelts {
        return Err(ChainError::InsufficientSelection {
            requested: winnow_nelts,
            available: total,
        });
    }

    let keep = winnow_nelts.saturating_sub(prefix).min(candidates.len());
    let mut selection = DistributedVector::new(group, winnow_nelts);
    place(
        group,
        &mut selection,
        prefix.min(winnow_nelts),
        &candidates[..keep],
    )?;
    Ok(selection)
}

/// Winnow, then replicate: every PE returns the same `winnow_nelts` values
/// in the same order.
pub fn select(
    group: &WorkerGroup,
    matrix: &DistributedMatrix<u32>,
    mask: &DistributedMask,
    winnow_nelts: usize,
) -> Result<Vec<u32>, ChainError> {
    let selection = winnow(group, matrix, mask, winnow_nelts)?;
    replicate(group, &selection, ROOT_PE)
}
