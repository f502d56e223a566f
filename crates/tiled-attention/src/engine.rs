//! Tiled attention engine: IO-aware `softmax(Q Kᵀ) V`.
//!
//! K and V are streamed through the engine one column block at a time. For
//! each column block, every row block's accumulator is updated once, so the
//! full `N x N` score matrix never exists. The outer loop carries a true
//! dependency across column blocks; row blocks within one column block are
//! independent.

use tracing::{debug, debug_span, trace, warn};

use crate::accumulator::{KvTile, RowBlockState};
use crate::config::EngineConfig;
use crate::error::AttentionError;
use crate::matrix::Matrix;
use crate::partition::{BlockSizes, Partition};
use crate::trace::Trace;

/// Check that Q, K, V agree on `d`, that K and V agree on row count, and
/// that no dimension is zero.
pub(crate) fn check_shapes(q: &Matrix, k: &Matrix, v: &Matrix) -> Result<(), AttentionError> {
    if q.cols() == 0 {
        return Err(AttentionError::empty("d"));
    }
    if q.rows() == 0 {
        return Err(AttentionError::empty("query rows"));
    }
    if k.rows() == 0 {
        return Err(AttentionError::empty("key rows"));
    }
    if k.cols() != q.cols() {
        return Err(AttentionError::mismatch("key columns", q.cols(), k.cols()));
    }
    if v.cols() != q.cols() {
        return Err(AttentionError::mismatch("value columns", q.cols(), v.cols()));
    }
    if v.rows() != k.rows() {
        return Err(AttentionError::mismatch("value rows", k.rows(), v.rows()));
    }
    Ok(())
}

/// Block sizes and the two partitions for one engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockPlan {
    pub sizes: BlockSizes,
    /// Partition of the query rows (applies to Q, O, l, m).
    pub rows: Partition,
    /// Partition of the key/value rows (applies to K, V).
    pub columns: Partition,
}

impl BlockPlan {
    /// Total number of tile updates, `T_r * T_c`.
    #[must_use]
    pub fn updates(&self) -> usize {
        self.rows.len() * self.columns.len()
    }
}

/// Result of [`TiledAttention::run`].
#[derive(Debug, Clone, PartialEq)]
pub struct AttentionOutput {
    pub output: Matrix,
    pub trace: Option<Trace>,
    /// Final running maximum per query row.
    pub row_max: Vec<f64>,
    /// Final softmax denominator per query row, relative to `row_max`.
    pub row_sum: Vec<f64>,
}

impl AttentionOutput {
    /// Per-row `log Σ_j exp(s_ij)`, i.e. `m + ln(l)`.
    #[must_use]
    pub fn logsumexp(&self) -> Vec<f64> {
        self.row_max
            .iter()
            .zip(self.row_sum.iter())
            .map(|(m, l)| m + l.ln())
            .collect()
    }
}

/// Attention over borrowed Q, K, V with a fixed block plan.
#[derive(Debug, Clone)]
pub struct TiledAttention<'a> {
    query: &'a Matrix,
    key: &'a Matrix,
    value: &'a Matrix,
    capacity: usize,
    scale: f64,
    trace: bool,
    plan: BlockPlan,
}

impl<'a> TiledAttention<'a> {
    /// Build an engine for unscaled `softmax(Q Kᵀ) V`.
    ///
    /// # Errors
    ///
    /// Returns a dimension error for inconsistent or empty shapes, and
    /// [`AttentionError::DegenerateBlock`] if `capacity < 4 d`.
    pub fn new(
        query: &'a Matrix,
        key: &'a Matrix,
        value: &'a Matrix,
        capacity: usize,
    ) -> Result<Self, AttentionError> {
        Self::build(query, key, value, capacity, 1.0, false)
    }

    /// Build an engine from an [`EngineConfig`]. The config's `trace` flag
    /// is what [`TiledAttention::run_configured`] uses.
    ///
    /// # Errors
    ///
    /// As [`TiledAttention::new`], plus [`AttentionError::InvalidConfig`].
    pub fn with_config(
        query: &'a Matrix,
        key: &'a Matrix,
        value: &'a Matrix,
        config: &EngineConfig,
    ) -> Result<Self, AttentionError> {
        config.validate()?;
        Self::build(
            query,
            key,
            value,
            config.capacity,
            config.softmax_scale,
            config.trace,
        )
    }

    fn build(
        query: &'a Matrix,
        key: &'a Matrix,
        value: &'a Matrix,
        capacity: usize,
        scale: f64,
        trace: bool,
    ) -> Result<Self, AttentionError> {
        let plan = check_shapes(query, key, value)
            .and_then(|()| BlockSizes::from_capacity(capacity, query.cols()))
            .and_then(|sizes| {
                Ok(BlockPlan {
                    sizes,
                    rows: Partition::new(query.rows(), sizes.row_block)?,
                    columns: Partition::new(key.rows(), sizes.column_block)?,
                })
            })
            .inspect_err(|e| warn!(error = %e, capacity, "rejected attention inputs"))?;

        Ok(Self {
            query,
            key,
            value,
            capacity,
            scale,
            trace,
            plan,
        })
    }

    #[must_use]
    pub fn plan(&self) -> &BlockPlan {
        &self.plan
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn softmax_scale(&self) -> f64 {
        self.scale
    }

    /// Whether [`TiledAttention::run_configured`] records a trace.
    #[must_use]
    pub fn trace_enabled(&self) -> bool {
        self.trace
    }

    /// [`TiledAttention::run`] with the trace flag the engine was built with.
    #[must_use]
    pub fn run_configured(&self) -> AttentionOutput {
        self.run(self.trace)
    }

    /// Run the tiled computation. With `trace`, a snapshot of the full
    /// output is recorded after every `(row block, column block)` update.
    ///
    /// Inputs are not checked for finiteness. A score that overflows to
    /// `+inf` (e.g. from entries near `1e200`) makes `inf - inf` appear in
    /// the rescale step and the affected rows come out NaN, exactly as in
    /// [`crate::reference::naive_attention`].
    #[must_use]
    pub fn run(&self, trace: bool) -> AttentionOutput {
        let _span = debug_span!("tiled_attention.run").entered();
        let d = self.query.cols();
        let plan = &self.plan;
        debug!(
            n_q = self.query.rows(),
            n_kv = self.key.rows(),
            d,
            capacity = self.capacity,
            row_block = plan.sizes.row_block,
            column_block = plan.sizes.column_block,
            t_r = plan.rows.len(),
            t_c = plan.columns.len(),
            trace,
            "starting tiled attention"
        );

        let mut states: Vec<RowBlockState> = plan
            .rows
            .iter()
            .map(|range| RowBlockState::new(range, d))
            .collect();
        let mut log = trace.then(|| Trace::with_capacity(plan.updates()));

        for (j, cols) in plan.columns.iter().enumerate() {
            trace!(j, start = cols.start, len = cols.len, "column block");
            let tile = KvTile {
                key: self.key.row_block(cols),
                value: self.value.row_block(cols),
                rows: cols.len,
            };
            for i in 0..states.len() {
                let q_i = self.query.row_block(states[i].range());
                states[i].fold_tile(q_i, tile, self.scale);
                if let Some(log) = log.as_mut() {
                    log.push(assemble(&states, d));
                }
            }
        }

        debug!(
            snapshots = log.as_ref().map_or(0, Trace::len),
            "tiled attention complete"
        );
        AttentionOutput {
            output: assemble(&states, d),
            trace: log,
            row_max: states.iter().flat_map(|s| s.row_max().iter().copied()).collect(),
            row_sum: states.iter().flat_map(|s| s.row_sum().iter().copied()).collect(),
        }
    }
}

/// Concatenate every row block's `O_i` in row order.
fn assemble(states: &[RowBlockState], d: usize) -> Matrix {
    Matrix::vstack(d, states.iter().map(RowBlockState::output))
}
