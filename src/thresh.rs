//! Threshold filter: marks the cells that survive into the winnowing stage.
//!
//! The cutoff only depends on the percentage and the fixed value range, so
//! every PE computes it on its own and masks its own rows. No communication.

use crate::array::{DistributedMask, DistributedMatrix, Partitioned};
use crate::randmat::VALUE_RANGE;

/// Smallest value kept for a given percentage of the value range.
///
/// 100% keeps every value, 0% keeps none.
pub fn cutoff(thresh_percent: u32) -> u32 {
    let kept = (VALUE_RANGE as u64 * thresh_percent.min(100) as u64 / 100) as u32;
    VALUE_RANGE - kept
}

pub fn qualifies(value: u32, cutoff: u32) -> bool {
    value >= cutoff
}

/// Mask with the same row ownership as `matrix`.
pub fn thresh(matrix: &DistributedMatrix<u32>, thresh_percent: u32) -> DistributedMask {
    let cutoff = cutoff(thresh_percent);
    let mut mask: DistributedMask = matrix.like();
    for (flag, value) in mask.local_data_mut().iter_mut().zip(matrix.local_data()) {
        *flag = qualifies(*value, cutoff);
    }
    mask
}

/// Number of set cells among the rows this PE owns.
pub fn local_count(mask: &DistributedMask) -> usize {
    mask.local_data().iter().filter(|flag| **flag).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collective::exclusive_prefix_sum;
    use crate::group::launch_local;
    use crate::randmat::randmat;

    #[test]
    fn test_cutoff_bounds() {
        assert_eq!(cutoff(100), 0);
        assert_eq!(cutoff(50), 50);
        assert_eq!(cutoff(0), VALUE_RANGE);
        assert_eq!(cutoff(25), 75);
    }

    #[test]
    fn test_mask_follows_matrix_cells() {
        launch_local(2, |group| {
            let matrix = randmat(group, 5, 5, 7);
            let mask = thresh(&matrix, 30);
            assert_eq!(mask.local_row_range(), matrix.local_row_range());
            for (flag, value) in mask.local_data().iter().zip(matrix.local_data()) {
                assert_eq!(*flag, *value >= 70);
            }
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_known_counts() {
        // the 4x4 matrix of seed 2
        let counts = [(0, 0), (10, 2), (25, 7), (50, 10), (75, 13), (100, 16)];
        for (percent, expected) in counts {
            let totals = launch_local(2, |group| {
                let mask = thresh(&randmat(group, 4, 4, 2), percent);
                Ok(exclusive_prefix_sum(group, local_count(&mask))?.1)
            })
            .unwrap();
            assert_eq!(totals, vec![expected; 2], "percent {percent}");
        }
    }

    #[test]
    fn test_count_is_monotonic_in_percent() {
        launch_local(1, |group| {
            let matrix = randmat(group, 40, 40, 13);
            let mut previous = 0;
            for percent in 0..=100 {
                let count = local_count(&thresh(&matrix, percent));
                assert!(count >= previous, "percent {percent}: {count} < {previous}");
                previous = count;
            }
            assert_eq!(previous, 1600);
            Ok(())
        })
        .unwrap();
    }
}
