//! Tile partitioner: block sizes from a fast-memory capacity, and
//! ceiling-based partitions of `[0, N)` into contiguous ranges.

use serde::{Deserialize, Serialize};

use crate::error::AttentionError;

/// Row and column block sizes derived from `(capacity, d)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSizes {
    /// Br: rows of Q (and O, l, m) per block.
    pub row_block: usize,
    /// Bc: rows of K and V per block.
    pub column_block: usize,
}

impl BlockSizes {
    /// `column_block = capacity / (4 d)`, `row_block = min(column_block, d)`.
    ///
    /// # Errors
    ///
    /// Returns [`AttentionError::EmptyDimension`] if `d == 0`, and
    /// [`AttentionError::DegenerateBlock`] if the column block floors to 0.
    pub fn from_capacity(capacity: usize, d: usize) -> Result<Self, AttentionError> {
        if d == 0 {
            return Err(AttentionError::empty("d"));
        }
        let column_block = d.checked_mul(4).map_or(0, |per_row| capacity / per_row);
        if column_block < 1 {
            return Err(AttentionError::DegenerateBlock { capacity, dim: d });
        }
        Ok(Self {
            row_block: column_block.min(d),
            column_block,
        })
    }
}

/// A half-open range of rows `[start, start + len)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRange {
    pub start: usize,
    pub len: usize,
}

impl BlockRange {
    #[must_use]
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Consecutive ranges covering `[0, total)`, each `block` long except a
/// possibly shorter final range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    block: usize,
    total: usize,
    ranges: Vec<BlockRange>,
}

impl Partition {
    /// Partition `[0, total)` into `ceil(total / block)` ranges.
    ///
    /// # Errors
    ///
    /// Returns [`AttentionError::EmptyDimension`] if `block == 0`.
    pub fn new(total: usize, block: usize) -> Result<Self, AttentionError> {
        if block == 0 {
            return Err(AttentionError::empty("block size"));
        }
        let count = total.div_ceil(block);
        let ranges = (0..count)
            .map(|t| {
                let start = t * block;
                BlockRange {
                    start,
                    len: block.min(total - start),
                }
            })
            .collect();
        Ok(Self {
            block,
            total,
            ranges,
        })
    }

    /// Number of ranges (T_r or T_c).
    #[must_use]
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    #[must_use]
    pub fn block_size(&self) -> usize {
        self.block
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    #[must_use]
    pub fn ranges(&self) -> &[BlockRange] {
        &self.ranges
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<BlockRange> {
        self.ranges.get(index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = BlockRange> + '_ {
        self.ranges.iter().copied()
    }
}
