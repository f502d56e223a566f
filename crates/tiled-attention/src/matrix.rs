//! Owned row-major `f64` matrix used for Q, K, V and the attention output.

use crate::error::AttentionError;
use crate::partition::BlockRange;

#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Wrap a row-major buffer of `rows * cols` elements.
    ///
    /// # Errors
    ///
    /// Returns [`AttentionError::DimensionMismatch`] if `data.len() != rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self, AttentionError> {
        let expected = rows.checked_mul(cols).unwrap_or(usize::MAX);
        if data.len() != expected {
            return Err(AttentionError::mismatch(
                "matrix element count",
                expected,
                data.len(),
            ));
        }
        Ok(Self { rows, cols, data })
    }

    /// Build a matrix from equally sized rows.
    ///
    /// # Errors
    ///
    /// Returns [`AttentionError::DimensionMismatch`] if the rows are ragged.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self, AttentionError> {
        let cols = rows.first().map_or(0, |r| r.as_ref().len());
        let mut data = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != cols {
                return Err(AttentionError::mismatch(
                    format!("length of row {i}"),
                    cols,
                    row.len(),
                ));
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            data,
        })
    }

    /// Fill from the flat row-major index: `m[i] = f(i)`.
    pub fn from_fn(rows: usize, cols: usize, f: impl FnMut(usize) -> f64) -> Self {
        Self {
            rows,
            cols,
            data: (0..rows * cols).map(f).collect(),
        }
    }

    #[must_use]
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    /// Row `i` as a slice.
    ///
    /// # Panics
    ///
    /// Panics if `i >= rows`.
    #[must_use]
    pub fn row(&self, i: usize) -> &[f64] {
        assert!(i < self.rows, "row {i} out of bounds for {} rows", self.rows);
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.rows && col < self.cols {
            Some(self.data[row * self.cols + col])
        } else {
            None
        }
    }

    /// The contiguous rows covered by `range`, all columns.
    ///
    /// # Panics
    ///
    /// Panics if the range extends past the last row.
    #[must_use]
    pub fn row_block(&self, range: BlockRange) -> &[f64] {
        assert!(
            range.end() <= self.rows,
            "row block {}..{} out of bounds for {} rows",
            range.start,
            range.end(),
            self.rows
        );
        &self.data[range.start * self.cols..range.end() * self.cols]
    }

    /// Stack row blocks of width `cols` top to bottom.
    pub(crate) fn vstack<'a, I>(cols: usize, blocks: I) -> Self
    where
        I: IntoIterator<Item = &'a [f64]>,
    {
        let mut data = Vec::new();
        for block in blocks {
            debug_assert_eq!(block.len() % cols.max(1), 0);
            data.extend_from_slice(block);
        }
        let rows = if cols == 0 { 0 } else { data.len() / cols };
        Self { rows, cols, data }
    }

    /// Largest absolute elementwise difference, or `None` on shape mismatch.
    #[must_use]
    pub fn max_abs_diff(&self, other: &Self) -> Option<f64> {
        if self.rows != other.rows || self.cols != other.cols {
            return None;
        }
        Some(
            self.data
                .iter()
                .zip(other.data.iter())
                .map(|(a, b)| (a - b).abs())
                .fold(0.0, f64::max),
        )
    }
}
