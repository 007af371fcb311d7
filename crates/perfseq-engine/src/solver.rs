//! Performance solve collaborator.

use perfseq_models::{AssetPath, PerformanceAsset, ProcessingRange, SolveOutcome};

use crate::error::EngineResult;

/// Inputs bound to a freshly created performance asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerformanceSetup {
    pub identity: AssetPath,
    pub capture_data: AssetPath,
    /// Only `Some` bounds are written; `None` keeps the engine default.
    pub range: ProcessingRange,
}

/// Facial solve pipeline.
pub trait PerformanceSolver {
    /// Bind identity, capture data and processing range to a performance.
    fn configure_performance(&mut self, performance: &AssetPath, setup: &PerformanceSetup) -> EngineResult<()>;

    /// Read back a stored performance.
    fn describe_performance(&self, performance: &AssetPath) -> EngineResult<PerformanceAsset>;

    /// Run the solve pipeline and block until it finishes.
    fn solve_blocking(&mut self, performance: &AssetPath) -> SolveOutcome;
}
