//! Shared helpers for tiled attention integration tests.

#![allow(dead_code)]

use tiled_attention::Matrix;

/// Asserts every element of the matrix is finite (not NaN or infinite).
pub fn assert_all_finite(m: &Matrix) {
    for (i, &val) in m.as_slice().iter().enumerate() {
        assert!(val.is_finite(), "Element [{i}] is not finite: {val}");
    }
}

/// Build an `n x d` matrix by cycling a short sample of values.
pub fn cycled(vals: &[f64], n: usize, d: usize) -> Matrix {
    Matrix::from_fn(n, d, |i| vals[i % vals.len()])
}

/// Per-column `(min, max)` of a matrix.
pub fn column_ranges(m: &Matrix) -> Vec<(f64, f64)> {
    (0..m.cols())
        .map(|c| {
            (0..m.rows())
                .map(|r| m.row(r)[c])
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| {
                    (lo.min(x), hi.max(x))
                })
        })
        .collect()
}

/// Capacity that yields exactly `column_block` for feature dimension `d`.
pub fn capacity_for(column_block: usize, d: usize) -> usize {
    4 * d * column_block
}
