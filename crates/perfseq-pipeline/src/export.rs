//! Animation exporter: performance -> standalone animation sequence.

use tracing::info;

use perfseq_engine::{AnimationExportBackend, AssetStore, EngineError, ExportOptions, ExportRange};
use perfseq_models::{naming, AnimationSequenceAsset, AssetPath, PerformanceAsset};

use crate::error::{PipelineError, PipelineResult};

/// Result of exporting a performance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Exported(AnimationSequenceAsset),
    /// Sequence already in the store
    Reused(AnimationSequenceAsset),
}

impl ExportOutcome {
    pub fn asset(&self) -> &AnimationSequenceAsset {
        match self {
            ExportOutcome::Exported(asset) | ExportOutcome::Reused(asset) => asset,
        }
    }

    pub fn into_asset(self) -> AnimationSequenceAsset {
        match self {
            ExportOutcome::Exported(asset) | ExportOutcome::Reused(asset) => asset,
        }
    }

    pub fn is_reused(&self) -> bool {
        matches!(self, ExportOutcome::Reused(_))
    }
}

/// Exports one animation sequence per performance, skipping existing ones.
#[derive(Debug, Clone)]
pub struct AnimationExporter {
    target_skeleton: AssetPath,
}

impl AnimationExporter {
    pub fn new(target_skeleton: AssetPath) -> Self {
        Self { target_skeleton }
    }

    fn options(&self, location: &AssetPath, asset_name: String) -> ExportOptions {
        ExportOptions {
            target_skeleton: self.target_skeleton.clone(),
            enable_head_movement: false,
            show_export_dialog: false,
            export_range: ExportRange::ProcessingRange,
            package_path: location.clone(),
            asset_name,
        }
    }

    /// Export `performance` into `location` as `AS_{performance}`.
    pub fn export<E>(
        &self,
        engine: &mut E,
        performance: &PerformanceAsset,
        location: &AssetPath,
    ) -> PipelineResult<ExportOutcome>
    where
        E: AssetStore + AnimationExportBackend + ?Sized,
    {
        let name = naming::animation_sequence_name(performance.name());
        let path = location.join(&name);

        if engine.exists(&path) {
            info!(animation = %path, "Animation sequence already exists");
            return Ok(ExportOutcome::Reused(AnimationSequenceAsset {
                path,
                source_performance: performance.path.clone(),
            }));
        }
        if !performance.solve_state.is_solved() {
            return Err(PipelineError::export_failed(format!(
                "{} has not been solved",
                performance.path
            )));
        }

        info!(performance = %performance.path, animation = %name, "Exporting animation sequence");
        let exported = engine
            .export_animation_sequence(&performance.path, &self.options(location, name))
            .map_err(|e| match e {
                EngineError::NotFound(missing) => PipelineError::AssetNotFound(missing),
                other => PipelineError::export_failed(other.to_string()),
            })?;
        info!(animation = %exported, "Exported animation sequence");

        Ok(ExportOutcome::Exported(AnimationSequenceAsset {
            path: exported,
            source_performance: performance.path.clone(),
        }))
    }
}
