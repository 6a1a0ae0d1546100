//! Deterministic random matrix generation.
//!
//! The output has to be independent of the number of PEs. Like the other
//! Cowichan implementations, every row gets its own linear congruential
//! generator seeded with `seed + row`, and the matrix is split by rows, so
//! a row is the same no matter which PE computes it.

use crate::array::DistributedMatrix;
use crate::group::WorkerGroup;

pub const LCG_A: u32 = 1664525;
pub const LCG_C: u32 = 1013904223;

/// Cells take values in `0..VALUE_RANGE`.
pub const VALUE_RANGE: u32 = 100;

/// Fill `out` with the cells of global row `row`.
pub fn fill_row(row: usize, seed: u32, out: &mut [u32]) {
    let mut state = seed.wrapping_add(row as u32);
    for cell in out.iter_mut() {
        state = LCG_A.wrapping_mul(state).wrapping_add(LCG_C);
        *cell = state % VALUE_RANGE;
    }
}

pub fn generate_row(row: usize, seed: u32, ncols: usize) -> Vec<u32> {
    let mut out = vec![0; ncols];
    fill_row(row, seed, &mut out);
    out
}

/// Fill the rows this PE owns. No communication.
pub fn fill(matrix: &mut DistributedMatrix<u32>, seed: u32) {
    for (row, cells) in matrix.local_rows_mut() {
        fill_row(row, seed, cells);
    }
}

pub fn randmat(group: &WorkerGroup, nrows: usize, ncols: usize, seed: u32) -> DistributedMatrix<u32> {
    let mut matrix = DistributedMatrix::new(group, nrows, ncols);
    fill(&mut matrix, seed);
    matrix
}

/// Rows formatted like the reference output: width 3, one trailing space per cell.
pub fn format_rows(cells: &[u32], ncols: usize) -> String {
    let mut out = String::new();
    if ncols == 0 {
        return out;
    }
    for row in cells.chunks(ncols) {
        for cell in row {
            out.push_str(&format!("{cell:>3} "));
        }
        out.push('\n');
    }
    out
}
