use thiserror::Error;

#[derive(Debug, Error)]
pub enum AttentionError {
    #[error("Dimension mismatch in {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    #[error("Empty dimension: {what} must be > 0")]
    EmptyDimension { what: String },

    #[error("Degenerate block: capacity {capacity} is too small for d = {dim} (column block < 1)")]
    DegenerateBlock { capacity: usize, dim: usize },

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

impl AttentionError {
    pub(crate) fn mismatch(what: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            what: what.into(),
            expected,
            actual,
        }
    }

    pub(crate) fn empty(what: impl Into<String>) -> Self {
        Self::EmptyDimension { what: what.into() }
    }

    /// True for every variant describing malformed input shapes.
    #[must_use]
    pub fn is_dimension_mismatch(&self) -> bool {
        matches!(
            self,
            Self::DimensionMismatch { .. } | Self::EmptyDimension { .. }
        )
    }
}
