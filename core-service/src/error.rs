//! Error taxonomy shared by every core operation.
//!
//! Callers at the boundary (HTTP layer, CLI) translate these into
//! user-facing responses; the core never substitutes a default prediction
//! or schema on failure.

use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed or out-of-domain patient field
    #[error("validation error: {0}")]
    Validation(String),

    /// Unseen category under the reject policy, or vector/schema width mismatch
    #[error("encoding error: {0}")]
    Encoding(String),

    /// No schema can be derived from the given training table
    #[error("schema error: {0}")]
    Schema(String),

    /// Degenerate label set, invalid split fraction or hyperparameters
    #[error("training error: {0}")]
    Training(String),

    #[error("no model loaded")]
    ModelUnavailable,

    /// Corrupt, unreadable or unwritable model bundle
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl CoreError {
    /// Short machine-readable name of the error class
    pub fn kind(&self) -> &'static str {
        match self {
            CoreError::Validation(_) => "validation",
            CoreError::Encoding(_) => "encoding",
            CoreError::Schema(_) => "schema",
            CoreError::Training(_) => "training",
            CoreError::ModelUnavailable => "model_unavailable",
            CoreError::Persistence(_) => "persistence",
        }
    }
}
