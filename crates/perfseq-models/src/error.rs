//! Model error types.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while parsing or validating model values.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Invalid asset path '{0}': store paths must be absolute")]
    InvalidAssetPath(String),

    #[error("Malformed capture folder name '{0}': expected a trailing _<number> suffix")]
    MalformedName(String),

    #[error("Invalid take metadata: {0}")]
    InvalidMetadata(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ModelError {
    pub fn invalid_metadata(msg: impl Into<String>) -> Self {
        Self::InvalidMetadata(msg.into())
    }
}
