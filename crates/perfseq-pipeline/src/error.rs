//! Pipeline error types.

use std::path::PathBuf;

use thiserror::Error;

use perfseq_engine::EngineError;
use perfseq_models::{ModelError, SolveOutcome};

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Missing capture metadata in {path}: {reason}")]
    MissingMetadata { path: PathBuf, reason: String },

    #[error("Malformed capture folder name: {0}")]
    MalformedName(String),

    #[error("Duplicate capture index {index}: {first} and {second}")]
    DuplicateIndex {
        index: u32,
        first: String,
        second: String,
    },

    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    #[error("Performance pipeline failed for {performance}: {outcome}")]
    Solve {
        performance: String,
        outcome: SolveOutcome,
    },

    #[error("Animation export failed: {0}")]
    ExportFailed(String),

    #[error("Face component not found on {0}")]
    FaceComponentNotFound(String),

    #[error("Failed to write {path}: {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No engine session available; pass --offline (or set PERFSEQ_OFFLINE=true) to run against the in-memory engine")]
    NoEngineSession,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn missing_metadata(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MissingMetadata {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn asset_not_found(path: impl Into<String>) -> Self {
        Self::AssetNotFound(path.into())
    }

    pub fn export_failed(msg: impl Into<String>) -> Self {
        Self::ExportFailed(msg.into())
    }

    pub fn output_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::OutputWrite {
            path: path.into(),
            source,
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Check if the error only concerns one capture or shot.
    ///
    /// The batch logs these and moves on to the next item.
    pub fn is_item_local(&self) -> bool {
        match self {
            PipelineError::AssetNotFound(_)
            | PipelineError::Solve { .. }
            | PipelineError::ExportFailed(_)
            | PipelineError::FaceComponentNotFound(_)
            | PipelineError::OutputWrite { .. } => true,
            PipelineError::Engine(e) => matches!(
                e,
                EngineError::NotFound(_)
                    | EngineError::AssetExists(_)
                    | EngineError::WrongClass { .. }
                    | EngineError::Unconfigured(_)
                    | EngineError::ChannelRead { .. }
                    | EngineError::ExportFailed(_)
                    | EngineError::BakeFailed(_)
            ),
            _ => false,
        }
    }

    /// Check if the error ends the whole batch.
    ///
    /// Discovery errors, configuration errors, I/O failures and broken
    /// engine sessions are fatal.
    pub fn is_batch_fatal(&self) -> bool {
        !self.is_item_local()
    }
}
