//! Online softmax accumulator for one row block.
//!
//! Holds `(O_i, l_i, m_i)` for the rows of a single query block. Each call to
//! [`RowBlockState::update`] folds one key/value tile into the state:
//!
//! ```text
//! S     = scale · Q_i K_jᵀ
//! m̂     = rowmax(S)
//! P     = exp(S − m̂)
//! l̂     = rowsum(P)
//! m_new = max(m, m̂)
//! l_new = e^(m − m_new) l + e^(m̂ − m_new) l̂
//! O_i   = diag(l_new)⁻¹ (diag(l e^(m − m_new)) O_i + diag(e^(m̂ − m_new)) P V_j)
//! ```
//!
//! `O_i` is normalized after every update, so after the last tile it is the
//! final output and needs no further division.

use crate::error::AttentionError;
use crate::ops;
use crate::partition::BlockRange;

/// One key/value tile: `rows x d` slices of K and V.
#[derive(Debug, Clone, Copy)]
pub struct KvTile<'a> {
    pub key: &'a [f64],
    pub value: &'a [f64],
    pub rows: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowBlockState {
    range: BlockRange,
    dim: usize,
    output: Vec<f64>,
    row_sum: Vec<f64>,
    row_max: Vec<f64>,
}

impl RowBlockState {
    /// Fresh state: `O = 0`, `l = 0`, `m = -inf`.
    #[must_use]
    pub fn new(range: BlockRange, dim: usize) -> Self {
        Self {
            range,
            dim,
            output: vec![0.0; range.len * dim],
            row_sum: vec![0.0; range.len],
            row_max: vec![f64::NEG_INFINITY; range.len],
        }
    }

    #[must_use]
    pub fn range(&self) -> BlockRange {
        self.range
    }

    /// Current `O_i`, `len x d` row-major.
    #[must_use]
    pub fn output(&self) -> &[f64] {
        &self.output
    }

    /// Running softmax denominator `l_i`.
    #[must_use]
    pub fn row_sum(&self) -> &[f64] {
        &self.row_sum
    }

    /// Running row maximum `m_i`.
    #[must_use]
    pub fn row_max(&self) -> &[f64] {
        &self.row_max
    }

    /// Fold one key/value tile into the state.
    ///
    /// `query` holds this block's rows of Q (`len x d`); the tile's key and
    /// value slices must each hold `tile.rows x d` elements.
    ///
    /// # Errors
    ///
    /// Returns [`AttentionError::DimensionMismatch`] if any slice length
    /// disagrees with the block shape. The state is left untouched.
    pub fn update(
        &mut self,
        query: &[f64],
        tile: KvTile<'_>,
        scale: f64,
    ) -> Result<(), AttentionError> {
        let d = self.dim;
        let tile_len = tile.rows.checked_mul(d).unwrap_or(usize::MAX);
        if query.len() != self.range.len * d {
            return Err(AttentionError::mismatch(
                "query block length",
                self.range.len * d,
                query.len(),
            ));
        }
        if tile.key.len() != tile_len {
            return Err(AttentionError::mismatch(
                "key tile length",
                tile_len,
                tile.key.len(),
            ));
        }
        if tile.value.len() != tile_len {
            return Err(AttentionError::mismatch(
                "value tile length",
                tile_len,
                tile.value.len(),
            ));
        }
        self.fold_tile(query, tile, scale);
        Ok(())
    }

    /// [`RowBlockState::update`] for slices the engine has already sized
    /// from its block plan.
    pub(crate) fn fold_tile(&mut self, query: &[f64], tile: KvTile<'_>, scale: f64) {
        let br = self.range.len;
        let bc = tile.rows;
        let d = self.dim;
        debug_assert_eq!(query.len(), br * d);
        debug_assert_eq!(tile.key.len(), bc * d);
        debug_assert_eq!(tile.value.len(), bc * d);

        let mut p = vec![0.0f64; br * bc];
        ops::score_tile(query, tile.key, br, bc, d, scale, &mut p);

        let mut tile_max = vec![f64::NEG_INFINITY; br];
        ops::row_max(&p, bc, &mut tile_max);

        let mut tile_sum = vec![0.0f64; br];
        ops::exp_shift_rows(&mut p, bc, &tile_max, &mut tile_sum);

        let mut keep = vec![0.0f64; br];
        let mut admit = vec![0.0f64; br];
        let mut inv_sum = vec![0.0f64; br];
        for r in 0..br {
            let new_max = self.row_max[r].max(tile_max[r]);
            let alpha = ops::rescale_factor(self.row_max[r], new_max);
            let beta = ops::rescale_factor(tile_max[r], new_max);
            let new_sum = alpha * self.row_sum[r] + beta * tile_sum[r];

            keep[r] = self.row_sum[r] * alpha;
            admit[r] = beta;
            // l_new == 0 only when no score has been seen yet; O stays zero.
            inv_sum[r] = if new_sum > 0.0 { 1.0 / new_sum } else { 0.0 };

            self.row_sum[r] = new_sum;
            self.row_max[r] = new_max;
        }

        ops::scale_rows(&mut self.output, d, &keep);
        ops::scale_rows(&mut p, bc, &admit);
        ops::matmul_acc(&p, tile.value, br, bc, d, &mut self.output);
        ops::scale_rows(&mut self.output, d, &inv_sum);
    }
}
