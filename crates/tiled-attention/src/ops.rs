//! Scalar tile primitives: dot product, stable softmax row, tile scores,
//! per-row broadcast, and the tile-by-value product.
//!
//! All buffers are row-major. A "tile" of `rows x cols` is a flat slice of
//! length `rows * cols`. Per-row scalars are always passed as slices of
//! length `rows` and expanded across columns explicitly.

/// Dot product of two slices.
#[inline]
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// In-place softmax over a contiguous row.
///
/// Uses the numerically stable formulation: subtract max, exponentiate, normalize.
pub fn softmax_row(row: &mut [f64]) {
    let max_val = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max_val == f64::NEG_INFINITY {
        row.fill(0.0);
        return;
    }
    let mut sum = 0.0f64;
    for v in row.iter_mut() {
        *v = (*v - max_val).exp();
        sum += *v;
    }
    if sum > 0.0 {
        for v in row.iter_mut() {
            *v /= sum;
        }
    }
}

/// Tile scores: `scores[r, c] = scale * Q[r] . K[c]`.
///
/// Q is `rows x d`, K is `cols x d`, scores is `rows x cols`.
pub fn score_tile(
    q: &[f64],
    k: &[f64],
    rows: usize,
    cols: usize,
    d: usize,
    scale: f64,
    scores: &mut [f64],
) {
    debug_assert_eq!(q.len(), rows * d);
    debug_assert_eq!(k.len(), cols * d);
    debug_assert_eq!(scores.len(), rows * cols);

    for r in 0..rows {
        let q_row = &q[r * d..(r + 1) * d];
        for c in 0..cols {
            scores[r * cols + c] = scale * dot(q_row, &k[c * d..(c + 1) * d]);
        }
    }
}

/// Per-row maximum of a `rows x cols` tile. Empty rows yield `-inf`.
pub fn row_max(tile: &[f64], cols: usize, out: &mut [f64]) {
    debug_assert_eq!(tile.len(), out.len() * cols);
    for (r, m) in out.iter_mut().enumerate() {
        *m = tile[r * cols..(r + 1) * cols]
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
    }
}

/// Replace each element with `exp(x - shift[row])` and return the row sums.
///
/// A row whose shift is `-inf` can only be empty, so it contributes nothing.
pub fn exp_shift_rows(tile: &mut [f64], cols: usize, shift: &[f64], sums: &mut [f64]) {
    debug_assert_eq!(tile.len(), shift.len() * cols);
    debug_assert_eq!(sums.len(), shift.len());
    for (r, (&m, s)) in shift.iter().zip(sums.iter_mut()).enumerate() {
        let row = &mut tile[r * cols..(r + 1) * cols];
        let mut sum = 0.0f64;
        for x in row.iter_mut() {
            *x = (*x - m).exp();
            sum += *x;
        }
        *s = sum;
    }
}

/// Broadcast multiply: `mat[r, :] *= factors[r]`.
pub fn scale_rows(mat: &mut [f64], cols: usize, factors: &[f64]) {
    debug_assert_eq!(mat.len(), factors.len() * cols);
    for (r, &f) in factors.iter().enumerate() {
        for x in &mut mat[r * cols..(r + 1) * cols] {
            *x *= f;
        }
    }
}

/// Accumulating product: `out += P · V` with P `rows x inner`, V `inner x d`.
pub fn matmul_acc(p: &[f64], v: &[f64], rows: usize, inner: usize, d: usize, out: &mut [f64]) {
    debug_assert_eq!(p.len(), rows * inner);
    debug_assert_eq!(v.len(), inner * d);
    debug_assert_eq!(out.len(), rows * d);

    for r in 0..rows {
        let out_row = &mut out[r * d..(r + 1) * d];
        for c in 0..inner {
            weighted_accumulate(out_row, p[r * inner + c], &v[c * d..(c + 1) * d]);
        }
    }
}

/// Weighted sum: `output[i] += weight * v_row[i]`.
#[inline]
pub fn weighted_accumulate(output: &mut [f64], weight: f64, v_row: &[f64]) {
    debug_assert_eq!(output.len(), v_row.len());
    for (o, v) in output.iter_mut().zip(v_row.iter()) {
        *o += weight * v;
    }
}

/// `exp(from - to)`, defined as 0 when `to` is still `-inf`.
///
/// Guards the `-inf - (-inf)` case of a row that has not yet seen a score.
/// The `+inf - (+inf)` case is not guarded: an overflowed score yields NaN.
#[inline]
pub fn rescale_factor(from: f64, to: f64) -> f64 {
    if to == f64::NEG_INFINITY {
        0.0
    } else {
        (from - to).exp()
    }
}
