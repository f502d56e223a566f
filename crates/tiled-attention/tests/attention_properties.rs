//! Property tests: the tiled engine against direct attention.

mod common;

use proptest::prelude::*;
use tiled_attention::reference::{naive_attention, row_max_of_scores};
use tiled_attention::ulp::{assert_within, Tolerance};
use tiled_attention::{AttentionError, EngineConfig, TiledAttention};

proptest! {
    /// Tiled output equals softmax(QKᵀ)V for arbitrary inputs and block sizes.
    #[test]
    fn tiled_equals_direct(
        n in 1usize..=10,
        d in 1usize..=4,
        column_block in 1usize..=6,
        q_vals in proptest::collection::vec(-3.0f64..3.0, 1..=40),
        k_vals in proptest::collection::vec(-3.0f64..3.0, 1..=40),
        v_vals in proptest::collection::vec(-3.0f64..3.0, 1..=40),
    ) {
        let q = common::cycled(&q_vals, n, d);
        let k = common::cycled(&k_vals, n, d);
        let v = common::cycled(&v_vals, n, d);

        let result = TiledAttention::new(&q, &k, &v, common::capacity_for(column_block, d))
            .unwrap()
            .run(false);
        let expected = naive_attention(&q, &k, &v, 1.0).unwrap();

        let diff = result.output.max_abs_diff(&expected).unwrap();
        prop_assert!(diff < 1e-9, "tiled vs direct max abs diff = {diff}");
    }

    /// Changing the capacity changes the tiling but not the result.
    #[test]
    fn tile_size_invariance(
        d in 1usize..=4,
        small in 1usize..=3,
        q_vals in proptest::collection::vec(-3.0f64..3.0, 1..=32),
        k_vals in proptest::collection::vec(-3.0f64..3.0, 1..=32),
        v_vals in proptest::collection::vec(-3.0f64..3.0, 1..=32),
    ) {
        let n = 9usize;
        let q = common::cycled(&q_vals, n, d);
        let k = common::cycled(&k_vals, n, d);
        let v = common::cycled(&v_vals, n, d);

        let tiled = TiledAttention::new(&q, &k, &v, common::capacity_for(small, d))
            .unwrap()
            .run(false);
        // one column block covers every key
        let whole = TiledAttention::new(&q, &k, &v, common::capacity_for(n, d))
            .unwrap()
            .run(false);

        let diff = tiled.output.max_abs_diff(&whole.output).unwrap();
        prop_assert!(diff < 1e-9, "column_block={small} vs {n}: diff = {diff}");
    }

    /// Large scores are absorbed by the running max; nothing overflows.
    #[test]
    fn output_finite_for_large_scores(
        n in 2usize..=8,
        d in 1usize..=4,
        column_block in 1usize..=4,
        q_vals in proptest::collection::vec(-40.0f64..40.0, 1..=32),
        k_vals in proptest::collection::vec(-40.0f64..40.0, 1..=32),
        v_vals in proptest::collection::vec(-5.0f64..5.0, 1..=32),
    ) {
        let q = common::cycled(&q_vals, n, d);
        let k = common::cycled(&k_vals, n, d);
        let v = common::cycled(&v_vals, n, d);

        let result = TiledAttention::new(&q, &k, &v, common::capacity_for(column_block, d))
            .unwrap()
            .run(true);
        common::assert_all_finite(&result.output);
        for snapshot in result.trace.as_ref().unwrap() {
            common::assert_all_finite(snapshot);
        }
    }

    /// Each output row is a convex combination of value rows.
    #[test]
    fn output_within_value_column_range(
        n in 2usize..=8,
        d in 1usize..=4,
        column_block in 1usize..=4,
        q_vals in proptest::collection::vec(-5.0f64..5.0, 1..=32),
        k_vals in proptest::collection::vec(-5.0f64..5.0, 1..=32),
        v_vals in proptest::collection::vec(-5.0f64..5.0, 1..=32),
    ) {
        let q = common::cycled(&q_vals, n, d);
        let k = common::cycled(&k_vals, n, d);
        let v = common::cycled(&v_vals, n, d);

        let result = TiledAttention::new(&q, &k, &v, common::capacity_for(column_block, d))
            .unwrap()
            .run(false);

        for (c, (lo, hi)) in common::column_ranges(&v).into_iter().enumerate() {
            for r in 0..n {
                let x = result.output.row(r)[c];
                prop_assert!(
                    x >= lo - 1e-9 && x <= hi + 1e-9,
                    "output[{r}][{c}] = {x} outside [{lo}, {hi}]"
                );
            }
        }
    }

    /// After the last column block the running max is the true row max.
    #[test]
    fn running_max_is_true_row_max(
        n in 1usize..=8,
        d in 1usize..=3,
        column_block in 1usize..=4,
        q_vals in proptest::collection::vec(-3.0f64..3.0, 1..=24),
        k_vals in proptest::collection::vec(-3.0f64..3.0, 1..=24),
    ) {
        let q = common::cycled(&q_vals, n, d);
        let k = common::cycled(&k_vals, n, d);

        let result = TiledAttention::new(&q, &k, &k, common::capacity_for(column_block, d))
            .unwrap()
            .run(false);
        let expected = row_max_of_scores(&q, &k, &k, 1.0).unwrap();
        prop_assert_eq!(result.row_max, expected);
    }

    /// Any capacity below 4d is rejected.
    #[test]
    fn degenerate_capacity_rejected(
        d in 1usize..=8,
        short in 1usize..=31,
    ) {
        let capacity = short % (4 * d);
        let m = common::cycled(&[1.0], 4, d);
        let err = TiledAttention::new(&m, &m, &m, capacity).unwrap_err();
        let is_degenerate = matches!(err, AttentionError::DegenerateBlock { .. });
        prop_assert!(is_degenerate);
    }
}

#[test]
fn scaled_attention_with_uneven_blocks() {
    let q = common::cycled(&[0.7, -1.2, 0.3, 2.1, -0.4], 11, 3);
    let k = common::cycled(&[1.5, 0.2, -0.9, 0.8], 11, 3);
    let v = common::cycled(&[-2.0, 1.0, 0.5, 3.0, -1.5, 0.25], 11, 3);

    // capacity 48, d 3 => column_block 4, row_block 3
    let config = EngineConfig::new(48).scaled_for(3);
    let engine = TiledAttention::with_config(&q, &k, &v, &config).unwrap();
    assert_eq!(engine.plan().rows.len(), 4);
    assert_eq!(engine.plan().columns.len(), 3);

    let result = engine.run(false);
    let expected = naive_attention(&q, &k, &v, config.softmax_scale).unwrap();
    assert_within(
        result.output.as_slice(),
        expected.as_slice(),
        Tolerance::Relative(1e-6),
    );
}
