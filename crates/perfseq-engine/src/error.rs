//! Engine error types.

use thiserror::Error;

use perfseq_models::ModelError;

/// Result type for engine calls.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors reported by an engine session.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Asset not found: {0}")]
    NotFound(String),

    #[error("Asset already exists: {0}")]
    AssetExists(String),

    #[error("Asset {path} is a {actual}, expected {expected}")]
    WrongClass {
        path: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Performance is not configured: {0}")]
    Unconfigured(String),

    #[error("Invalid handle: {0}")]
    InvalidHandle(String),

    #[error("Failed to read keys of channel '{channel}': {reason}")]
    ChannelRead { channel: String, reason: String },

    #[error("Animation export failed: {0}")]
    ExportFailed(String),

    #[error("Control-rig bake failed: {0}")]
    BakeFailed(String),

    #[error("Actor spawn failed: {0}")]
    SpawnFailed(String),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),
}

impl EngineError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn invalid_handle(what: impl Into<String>) -> Self {
        Self::InvalidHandle(what.into())
    }

    pub fn export_failed(msg: impl Into<String>) -> Self {
        Self::ExportFailed(msg.into())
    }

    pub fn bake_failed(msg: impl Into<String>) -> Self {
        Self::BakeFailed(msg.into())
    }

    pub fn channel_read(channel: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ChannelRead {
            channel: channel.into(),
            reason: reason.into(),
        }
    }
}
