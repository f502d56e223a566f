//! # tiled-attention
//!
//! IO-aware attention: `softmax(Q Kᵀ) V` computed tile by tile under an
//! abstract fast-memory budget, without ever materializing the `N x N`
//! score matrix.
//!
//! ## Modules
//!
//! - [`partition`] — Block sizes from capacity, ceiling-based row partitions
//! - [`accumulator`] — Online softmax state `(O_i, l_i, m_i)` for one row block
//! - [`engine`] — [`TiledAttention`]: validation and the tile loop
//! - [`trace`] — Append-only snapshots of intermediate outputs
//! - [`reference`] — Direct attention used as ground truth
//! - [`config`] — YAML-loadable engine settings
//! - [`matrix`] — Row-major `f64` matrix
//! - [`fixtures`] — Deterministic inputs
//! - [`ulp`] — Floating-point comparison helpers
//!
//! ```
//! use tiled_attention::{fixtures::Problem, reference, TiledAttention};
//!
//! let p = Problem::default();
//! let engine = TiledAttention::new(&p.query, &p.key, &p.value, p.capacity)?;
//! let result = engine.run(false);
//!
//! let direct = reference::naive_attention(&p.query, &p.key, &p.value, 1.0)?;
//! assert!(result.output.max_abs_diff(&direct).unwrap() < 1e-9);
//! # Ok::<(), tiled_attention::AttentionError>(())
//! ```

// Kernel code naturally uses single-character math variable names (q, k, v, d, ...).
#![allow(
    clippy::many_single_char_names,
    clippy::similar_names,
    clippy::cast_precision_loss,
    clippy::needless_range_loop
)]

pub mod accumulator;
pub mod config;
pub mod engine;
pub mod error;
pub mod fixtures;
pub mod matrix;
pub(crate) mod ops;
pub mod partition;
pub mod reference;
pub mod trace;
pub mod ulp;

pub use config::EngineConfig;
pub use engine::{AttentionOutput, BlockPlan, TiledAttention};
pub use error::AttentionError;
pub use matrix::Matrix;
pub use partition::{BlockRange, BlockSizes, Partition};
pub use trace::Trace;
