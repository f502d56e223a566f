//! Deterministic Q, K, V inputs for tests, demos and benchmarks.
//!
//! The engine never invents inputs; callers that just want "some data"
//! build it here.

use crate::matrix::Matrix;

/// `m[i] = i * step` over the flat row-major index.
#[must_use]
pub fn sequential(rows: usize, cols: usize, step: f64) -> Matrix {
    Matrix::from_fn(rows, cols, |i| i as f64 * step)
}

/// `m[i] = ((i mod modulus) - offset) * step`: bounded, sign-alternating data.
#[must_use]
pub fn patterned(rows: usize, cols: usize, modulus: usize, offset: f64, step: f64) -> Matrix {
    let modulus = modulus.max(1);
    Matrix::from_fn(rows, cols, |i| ((i % modulus) as f64 - offset) * step)
}

/// A complete attention problem: inputs plus a capacity.
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    pub query: Matrix,
    pub key: Matrix,
    pub value: Matrix,
    pub capacity: usize,
}

impl Problem {
    /// Patterned `n x d` inputs with distinct periods for Q, K and V.
    #[must_use]
    pub fn patterned(n: usize, d: usize, capacity: usize) -> Self {
        Self {
            query: patterned(n, d, 7, 3.0, 0.3),
            key: patterned(n, d, 5, 2.0, 0.2),
            value: patterned(n, d, 11, 5.0, 0.15),
            capacity,
        }
    }
}

impl Default for Problem {
    /// `N = 8`, `d = 4`, capacity 32 (2 x 2 blocks, four of each).
    fn default() -> Self {
        Self::patterned(8, 4, 32)
    }
}
