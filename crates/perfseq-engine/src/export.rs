//! Animation export collaborator.

use perfseq_models::AssetPath;

use crate::error::EngineResult;

/// Which frames of a performance are exported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportRange {
    /// The processed range of the performance
    #[default]
    ProcessingRange,
    /// Every frame of the capture footage
    WholeSequence,
}

/// Export settings for one animation sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    pub target_skeleton: AssetPath,
    /// Transfer head rotation into the sequence
    pub enable_head_movement: bool,
    pub show_export_dialog: bool,
    pub export_range: ExportRange,
    /// Destination folder
    pub package_path: AssetPath,
    pub asset_name: String,
}

/// Bakes a solved performance into a standalone animation sequence.
pub trait AnimationExportBackend {
    /// Export and return the path of the created sequence.
    fn export_animation_sequence(&mut self, performance: &AssetPath, options: &ExportOptions) -> EngineResult<AssetPath>;
}
