//! Numeric kernels run after the selection is replicated.
//!
//! `outer` is built independently on every PE from the replicated selection.
//! `product` splits the rows of the result over the group, and the caller
//! collects the distributed result onto the reporting PE.

use crate::array::DistributedVector;
use crate::error::ChainError;
use crate::group::WorkerGroup;

/// Dense `n x n` matrix and `n`-vector built from the selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Outer {
    pub n: usize,
    /// row-major
    pub matrix: Vec<f64>,
    pub vector: Vec<f64>,
}

/// Distance matrix of the selected values. The diagonal is `n` times the
/// largest distance in its row; the vector holds each value's distance from
/// the origin.
pub fn outer(values: &[u32]) -> Outer {
    let n = values.len();
    let mut matrix = vec![0.0; n * n];
    let mut vector = vec![0.0; n];
    for (i, vi) in values.iter().enumerate() {
        let row = &mut matrix[i * n..(i + 1) * n];
        let mut nmax = 0.0f64;
        for (j, vj) in values.iter().enumerate() {
            if i != j {
                let d = (*vi as f64 - *vj as f64).abs();
                row[j] = d;
                nmax = nmax.max(d);
            }
        }
        row[i] = nmax * n as f64;
        vector[i] = *vi as f64;
    }
    Outer { n, matrix, vector }
}

/// `out[k]` is row `first_row + k` of the matrix times the vector.
pub fn product_rows(outer: &Outer, first_row: usize, out: &mut [f64]) {
    let n = outer.n;
    for (k, result) in out.iter_mut().enumerate() {
        let row = &outer.matrix[(first_row + k) * n..(first_row + k + 1) * n];
        *result = row.iter().zip(&outer.vector).map(|(m, v)| m * v).sum();
    }
}

/// Matrix-vector product with the result rows block-distributed over the group.
pub fn product(group: &WorkerGroup, outer: &Outer) -> Result<DistributedVector<f64>, ChainError> {
    if outer.matrix.len() != outer.n * outer.n || outer.vector.len() != outer.n {
        return Err(ChainError::BufferSizeMismatch {
            pe: group.my_pe(),
            expected: outer.n * outer.n,
            actual: outer.matrix.len(),
        });
    }
    let mut result = DistributedVector::new(group, outer.n);
    let first_row = result.local_range().start;
    product_rows(outer, first_row, result.local_data_mut());
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collective::collect;
    use crate::group::{launch_local, ROOT_PE};

    #[test]
    fn test_outer_of_three_values() {
        let o = outer(&[73, 72, 79]);
        assert_eq!(
            o.matrix,
            vec![
                18.0, 1.0, 6.0, //
                1.0, 21.0, 7.0, //
                6.0, 7.0, 21.0,
            ]
        );
        assert_eq!(o.vector, vec![73.0, 72.0, 79.0]);
    }

    #[test]
    fn test_outer_of_single_value() {
        let o = outer(&[42]);
        assert_eq!(o.matrix, vec![0.0]);
        assert_eq!(o.vector, vec![42.0]);
    }

    #[test]
    fn test_distributed_product_matches_serial() {
        let values = (0..11).map(|i| (i * 37 % 100) as u32).collect::<Vec<_>>();
        let o = outer(&values);
        let mut serial = vec![0.0; o.n];
        product_rows(&o, 0, &mut serial);

        let collected = launch_local(4, |group| {
            let result = product(group, &o)?;
            let mut dst = vec![0.0; if group.is_root() { o.n } else { 0 }];
            collect(group, &result, &mut dst, ROOT_PE)?;
            Ok(dst)
        })
        .unwrap();
        assert_eq!(collected[0], serial);
    }

    #[test]
    fn test_product_of_golden_selection() {
        let o = outer(&[73, 72, 79]);
        let mut out = vec![0.0; 3];
        product_rows(&o, 0, &mut out);
        assert_eq!(out, vec![1860.0, 2138.0, 2601.0]);
    }
}
