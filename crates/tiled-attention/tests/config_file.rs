//! Loading engine settings from YAML files on disk.

mod common;

use std::fs;

use tiled_attention::fixtures::Problem;
use tiled_attention::{AttentionError, EngineConfig, TiledAttention};

#[test]
fn config_file_drives_engine() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("engine.yaml");
    fs::write(&path, "capacity: 32\ntrace: true\n").unwrap();

    let config = EngineConfig::from_path(&path).unwrap();
    let p = Problem::default();
    let engine = TiledAttention::with_config(&p.query, &p.key, &p.value, &config).unwrap();
    assert_eq!(engine.capacity(), 32);
    assert_eq!(engine.softmax_scale(), 1.0);
    assert!(engine.trace_enabled());

    let result = engine.run_configured();
    let trace = result.trace.unwrap();
    assert_eq!(trace.len(), engine.plan().updates());
    common::assert_all_finite(&result.output);
}

#[test]
fn malformed_yaml_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.yaml");
    fs::write(&path, "capacity: [not, a, number]\n").unwrap();

    let err = EngineConfig::from_path(&path).unwrap_err();
    assert!(matches!(err, AttentionError::Yaml(_)));
}

#[test]
fn config_capacity_too_small_for_d() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tiny.yaml");
    fs::write(&path, "capacity: 8\n").unwrap();

    // valid on its own, degenerate for d = 4
    let config = EngineConfig::from_path(&path).unwrap();
    let p = Problem::default();
    let err = TiledAttention::with_config(&p.query, &p.key, &p.value, &config).unwrap_err();
    assert!(matches!(
        err,
        AttentionError::DegenerateBlock {
            capacity: 8,
            dim: 4
        }
    ));
}
