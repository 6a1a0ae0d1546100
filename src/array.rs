//! Row-partitioned matrices and block-partitioned vectors.
//!
//! Each PE stores only the part it owns. Reading another PE's part always
//! goes through a collective in [`crate::collective`].

use crate::distribution::OwnerTable;
use crate::group::WorkerGroup;

use std::ops::Range;

/// Anything whose elements form one logical global sequence split over PEs.
pub trait Partitioned<T> {
    /// Number of elements in the global sequence.
    fn global_len(&self) -> usize;

    /// Global element range owned by `pe`.
    fn element_range(&self, pe: usize) -> Range<usize>;

    /// The elements this PE owns, in global order.
    fn local_data(&self) -> &[T];
}

/// `nrows x ncols` matrix whose rows are block-distributed over the group.
#[derive(Debug, Clone)]
pub struct DistributedMatrix<T> {
    rows: OwnerTable,
    ncols: usize,
    my_pe: usize,
    local: Vec<T>,
}

/// Boolean matrix with the same row ownership as the matrix it was built from.
pub type DistributedMask = DistributedMatrix<bool>;

impl<T: Clone + Default> DistributedMatrix<T> {
    pub fn new(group: &WorkerGroup, nrows: usize, ncols: usize) -> DistributedMatrix<T> {
        let rows = OwnerTable::block(nrows, group.num_pes());
        let local = vec![T::default(); rows.local_len(group.my_pe()) * ncols];
        DistributedMatrix {
            rows,
            ncols,
            my_pe: group.my_pe(),
            local,
        }
    }
}

impl<T> DistributedMatrix<T> {
    /// A matrix with the same shape and row ownership as `self`.
    pub fn like<U: Clone + Default>(&self) -> DistributedMatrix<U> {
        DistributedMatrix {
            rows: self.rows.clone(),
            ncols: self.ncols,
            my_pe: self.my_pe,
            local: vec![U::default(); self.local.len()],
        }
    }

    pub fn nrows(&self) -> usize {
        self.rows.len()
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn row_owners(&self) -> &OwnerTable {
        &self.rows
    }

    /// Global indices of the rows this PE owns.
    pub fn local_row_range(&self) -> Range<usize> {
        self.rows.range(self.my_pe)
    }

    /// Owned rows as `(global_row, row)` pairs, in global order.
    pub fn local_rows(&self) -> impl Iterator<Item = (usize, &[T])> {
        let start = self.local_row_range().start;
        self.local
            .chunks(self.ncols.max(1))
            .take(self.local_row_range().len())
            .enumerate()
            .map(move |(i, row)| (start + i, row))
    }

    pub fn local_rows_mut(&mut self) -> impl Iterator<Item = (usize, &mut [T])> {
        let start = self.local_row_range().start;
        let nrows = self.local_row_range().len();
        self.local
            .chunks_mut(self.ncols.max(1))
            .take(nrows)
            .enumerate()
            .map(move |(i, row)| (start + i, row))
    }

    pub fn local_data_mut(&mut self) -> &mut [T] {
        &mut self.local
    }
}

impl<T> Partitioned<T> for DistributedMatrix<T> {
    fn global_len(&self) -> usize {
        self.rows.len() * self.ncols
    }

    fn element_range(&self, pe: usize) -> Range<usize> {
        let rows = self.rows.range(pe);
        rows.start * self.ncols..rows.end * self.ncols
    }

    fn local_data(&self) -> &[T] {
        &self.local
    }
}

/// Vector of length `len` whose elements are block-distributed over the group.
#[derive(Debug, Clone)]
pub struct DistributedVector<T> {
    owners: OwnerTable,
    my_pe: usize,
    local: Vec<T>,
}

impl<T: Clone + Default> DistributedVector<T> {
    pub fn new(group: &WorkerGroup, len: usize) -> DistributedVector<T> {
        let owners = OwnerTable::block(len, group.num_pes());
        let local = vec![T::default(); owners.local_len(group.my_pe())];
        DistributedVector {
            owners,
            my_pe: group.my_pe(),
            local,
        }
    }
}

impl<T> DistributedVector<T> {
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    pub fn owners(&self) -> &OwnerTable {
        &self.owners
    }

    pub fn local_range(&self) -> Range<usize> {
        self.owners.range(self.my_pe)
    }

    pub fn local_data_mut(&mut self) -> &mut [T] {
        &mut self.local
    }
}

impl<T> Partitioned<T> for DistributedVector<T> {
    fn global_len(&self) -> usize {
        self.owners.len()
    }

    fn element_range(&self, pe: usize) -> Range<usize> {
        self.owners.range(pe)
    }

    fn local_data(&self) -> &[T] {
        &self.local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::launch_local;

    #[test]
    fn test_matrix_rows_are_disjoint_and_complete() {
        let row_lists = launch_local(3, |group| {
            let matrix = DistributedMatrix::<u32>::new(group, 7, 5);
            assert_eq!(matrix.local_data().len(), matrix.local_row_range().len() * 5);
            Ok(matrix.local_rows().map(|(row, _)| row).collect::<Vec<_>>())
        })
        .unwrap();
        assert_eq!(row_lists, vec![vec![0, 1, 2], vec![3, 4], vec![5, 6]]);
    }

    #[test]
    fn test_mask_shares_row_ownership() {
        launch_local(4, |group| {
            let matrix = DistributedMatrix::<u32>::new(group, 10, 3);
            let mask: DistributedMask = matrix.like();
            assert_eq!(mask.local_row_range(), matrix.local_row_range());
            assert_eq!(mask.local_data().len(), matrix.local_data().len());
            assert_eq!(mask.element_range(1), matrix.element_range(1));
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_zero_column_matrix_has_no_rows_to_iterate() {
        launch_local(2, |group| {
            let matrix = DistributedMatrix::<u32>::new(group, 4, 0);
            assert_eq!(matrix.global_len(), 0);
            assert_eq!(matrix.local_rows().count(), 0);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_vector_element_ranges() {
        launch_local(4, |group| {
            let vector = DistributedVector::<f64>::new(group, 10);
            assert_eq!(vector.element_range(0), 0..3);
            assert_eq!(vector.element_range(3), 8..10);
            assert_eq!(vector.local_data().len(), vector.local_range().len());
            Ok(())
        })
        .unwrap();
    }
}
