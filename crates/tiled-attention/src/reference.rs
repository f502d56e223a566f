//! Direct attention: materializes the full `N x N` score matrix.
//!
//! Quadratic in memory. Used as the ground truth the tiled engine is
//! checked against.

use crate::engine::check_shapes;
use crate::error::AttentionError;
use crate::matrix::Matrix;
use crate::ops;

/// Full score matrix `scale · Q Kᵀ` (`n_q x n_kv`).
///
/// # Errors
///
/// Returns a dimension error if Q, K, V shapes are inconsistent.
pub fn score_matrix(
    q: &Matrix,
    k: &Matrix,
    v: &Matrix,
    scale: f64,
) -> Result<Matrix, AttentionError> {
    check_shapes(q, k, v)?;
    let mut scores = vec![0.0f64; q.rows() * k.rows()];
    ops::score_tile(
        q.as_slice(),
        k.as_slice(),
        q.rows(),
        k.rows(),
        q.cols(),
        scale,
        &mut scores,
    );
    Matrix::from_vec(q.rows(), k.rows(), scores)
}

/// `softmax(scale · Q Kᵀ) V`, row by row.
///
/// # Errors
///
/// Returns a dimension error if Q, K, V shapes are inconsistent.
pub fn naive_attention(
    q: &Matrix,
    k: &Matrix,
    v: &Matrix,
    scale: f64,
) -> Result<Matrix, AttentionError> {
    let scores = score_matrix(q, k, v, scale)?;
    let n_kv = k.rows();
    let d = v.cols();
    let mut probs = scores.into_vec();
    for row in probs.chunks_mut(n_kv) {
        ops::softmax_row(row);
    }
    let mut output = vec![0.0f64; q.rows() * d];
    ops::matmul_acc(&probs, v.as_slice(), q.rows(), n_kv, d, &mut output);
    Matrix::from_vec(q.rows(), d, output)
}

/// True per-row maxima of `scale · Q Kᵀ`.
///
/// # Errors
///
/// Returns a dimension error if Q, K, V shapes are inconsistent.
pub fn row_max_of_scores(
    q: &Matrix,
    k: &Matrix,
    v: &Matrix,
    scale: f64,
) -> Result<Vec<f64>, AttentionError> {
    let scores = score_matrix(q, k, v, scale)?;
    let mut out = vec![f64::NEG_INFINITY; q.rows()];
    ops::row_max(scores.as_slice(), k.rows(), &mut out);
    Ok(out)
}
