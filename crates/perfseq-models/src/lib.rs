//! Shared data models for the performance-to-sequence pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Capture records and their `take.json` sidecar
//! - Performance and animation-sequence assets
//! - The shot manifest handed from phase 1 to phase 2
//! - Face animation documents and their on-disk formats
//! - The deterministic naming scheme shared by every stage

pub mod asset;
pub mod asset_path;
pub mod capture;
pub mod document;
pub mod error;
pub mod manifest;
pub mod naming;
pub mod run;

// Re-export common types
pub use asset::{AnimationSequenceAsset, FrameRange, PerformanceAsset, ProcessingRange, SolveOutcome, SolveState};
pub use asset_path::AssetPath;
pub use capture::{parse_sequence_suffix, CaptureRecord, TakeMetadata, TAKE_METADATA_FILE};
pub use document::{
    ChannelReadFailure, FaceAnimDocument, Keyframe, OutputFormat, VersionedFaceAnim,
    FACE_ANIM_SCHEMA_VERSION,
};
pub use error::{ModelError, ModelResult};
pub use manifest::{ShotManifest, ShotManifestEntry};
pub use run::RunId;
