//! Shot manifest handed from phase 1 (build + export) to phase 2 (shots).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::asset::AnimationSequenceAsset;
use crate::asset::PerformanceAsset;
use crate::asset_path::AssetPath;
use crate::capture::CaptureRecord;
use crate::naming;

/// One capture joined with the assets derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ShotManifestEntry {
    pub capture: CaptureRecord,
    pub identity: AssetPath,
    pub capture_data: AssetPath,
    pub performance: PerformanceAsset,
    pub animation_sequence: AnimationSequenceAsset,
    /// Character asset the shot is assembled for
    pub target_metahuman: AssetPath,
    /// Directory the face document is written to
    pub output_path: PathBuf,
}

impl ShotManifestEntry {
    pub fn frame_count(&self) -> u32 {
        self.capture.frame_count
    }

    /// `LS_{performance}`
    pub fn shot_name(&self) -> String {
        naming::shot_name(self.performance.name())
    }
}

/// Ordered, immutable manifest produced by phase 1.
///
/// Order follows capture-catalog enumeration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ShotManifest {
    entries: Vec<ShotManifestEntry>,
}

impl ShotManifest {
    pub fn new(entries: Vec<ShotManifestEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[ShotManifestEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ShotManifestEntry> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a ShotManifest {
    type Item = &'a ShotManifestEntry;
    type IntoIter = std::slice::Iter<'a, ShotManifestEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<ShotManifestEntry> for ShotManifest {
    fn from_iter<T: IntoIterator<Item = ShotManifestEntry>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
