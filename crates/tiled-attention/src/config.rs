//! Engine settings loaded from YAML: memory capacity, score scale, and
//! whether [`TiledAttention::run_configured`](crate::TiledAttention::run_configured)
//! records a trace.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AttentionError;

fn default_scale() -> f64 {
    1.0
}

/// Engine settings, loadable from YAML.
///
/// ```yaml
/// capacity: 32
/// softmax_scale: 1.0   # optional
/// trace: false         # optional
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Abstract fast-memory budget, in matrix elements.
    pub capacity: usize,
    /// Multiplier applied to every score `Q_i · K_j`.
    #[serde(default = "default_scale")]
    pub softmax_scale: f64,
    /// Record a snapshot of the output after every tile update.
    #[serde(default)]
    pub trace: bool,
}

impl EngineConfig {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            softmax_scale: default_scale(),
            trace: false,
        }
    }

    /// Same capacity, with the `1/sqrt(d)` scale of scaled dot-product attention.
    #[must_use]
    pub fn scaled_for(mut self, d: usize) -> Self {
        self.softmax_scale = 1.0 / (d as f64).sqrt();
        self
    }

    #[must_use]
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Load and validate a YAML config file.
    ///
    /// # Errors
    ///
    /// Returns [`AttentionError::Io`] if the file cannot be read,
    /// [`AttentionError::Yaml`] if the YAML is malformed, or
    /// [`AttentionError::InvalidConfig`] if a value is out of range.
    pub fn from_path(path: &Path) -> Result<Self, AttentionError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parse and validate a YAML config string.
    ///
    /// # Errors
    ///
    /// Returns [`AttentionError::Yaml`] if the YAML is malformed or
    /// [`AttentionError::InvalidConfig`] if a value is out of range.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, AttentionError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns [`AttentionError::InvalidConfig`] for a zero capacity or a
    /// scale that is not a positive finite number.
    pub fn validate(&self) -> Result<(), AttentionError> {
        if self.capacity == 0 {
            return Err(AttentionError::InvalidConfig(
                "capacity must be > 0".to_string(),
            ));
        }
        if !self.softmax_scale.is_finite() || self.softmax_scale <= 0.0 {
            return Err(AttentionError::InvalidConfig(format!(
                "softmax_scale must be positive and finite, got {}",
                self.softmax_scale
            )));
        }
        Ok(())
    }
}
