//! Performance-to-sequence batch pipeline.
//!
//! This crate provides:
//! - Capture discovery (`take.json` sidecars, index window)
//! - Idempotent performance build and animation export
//! - Shot assembly, control-rig baking and facial keyframe extraction
//! - The two-phase batch orchestrator and its report
//! - Configuration, logging and the `perfseq` CLI

pub mod assembly;
pub mod bake;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod logging;
pub mod offline;
pub mod orchestrator;
pub mod performance;
pub mod report;

pub use assembly::{AssembledShot, ShotAssembler};
pub use bake::{BakeOutcome, ControlRigBakingAdapter};
pub use catalog::{AnimRange, CaptureCatalog};
pub use config::{LogFormat, PipelineConfig, RebakePolicy, StorePaths};
pub use error::{PipelineError, PipelineResult};
pub use export::{AnimationExporter, ExportOutcome};
pub use extract::{extract_shot, ExtractOutcome, FaceAnimWriter, FaceKeyframeExtractor};
pub use logging::CaptureLogger;
pub use orchestrator::BatchOrchestrator;
pub use performance::{BuildOutcome, PerformanceAssetBuilder};
pub use report::{BatchReport, ItemFailure, ShotSummary, Stage};
