//! Error types for capacity estimation.

use thiserror::Error;

/// Result type alias for boxweaver operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while estimating box capacities.
#[derive(Debug, Error)]
pub enum Error {
    /// A required input collection was absent (not merely empty).
    #[error("Missing required collection: {0}")]
    MissingCollection(&'static str),

    /// The item template cannot seed a capacity search.
    #[error("Invalid item template {sku}: weight {weight} must be positive")]
    InvalidTemplate { sku: String, weight: f64 },

    /// A tolerance-adjusted box has a non-positive dimension or weight limit.
    #[error("Degenerate box {label} after tolerance adjustment")]
    DegenerateBox { label: String },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    InvalidConfig(String),

    /// Input record failed schema validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Computation cancelled.
    #[error("Computation cancelled")]
    Cancelled,

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error at an adapter edge.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error only invalidates a single (item, box) pair.
    ///
    /// Such errors are replaced by a zero capacity instead of aborting a batch.
    pub fn is_pair_local(&self) -> bool {
        matches!(self, Error::InvalidTemplate { .. } | Error::DegenerateBox { .. })
    }
}
