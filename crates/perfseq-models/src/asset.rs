//! Performance and animation-sequence assets.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::asset_path::AssetPath;

/// Frame range `[start, end]` used for playback and sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
pub struct FrameRange {
    pub start: i64,
    pub end: i64,
}

impl FrameRange {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// Playback range for a take: `[0, frame_count]`.
    pub fn for_take(frame_count: u32) -> Self {
        Self::new(0, i64::from(frame_count))
    }

    pub fn len(&self) -> i64 {
        (self.end - self.start).max(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, frame: i64) -> bool {
        frame >= self.start && frame <= self.end
    }
}

impl fmt::Display for FrameRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// Frames a performance is asked to process.
///
/// `None` leaves the engine default in place for that bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct ProcessingRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_frame: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_frame: Option<i64>,
}

impl ProcessingRange {
    pub fn new(start_frame: Option<i64>, end_frame: Option<i64>) -> Self {
        Self {
            start_frame,
            end_frame,
        }
    }

    /// Build from the legacy `-1` sentinel convention.
    pub fn from_sentinel(start_frame: i64, end_frame: i64) -> Self {
        let keep = |v: i64| if v == -1 { None } else { Some(v) };
        Self::new(keep(start_frame), keep(end_frame))
    }

    /// Whole-take range `[0, frame_count]`.
    pub fn for_take(frame_count: u32) -> Self {
        Self::new(Some(0), Some(i64::from(frame_count)))
    }
}

/// Result reported by the blocking solve pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SolveOutcome {
    Success,
    /// Requested range exceeds the engine's frame cap
    TooManyFrames,
    UnknownError,
}

impl SolveOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            SolveOutcome::Success => "success",
            SolveOutcome::TooManyFrames => "too_many_frames",
            SolveOutcome::UnknownError => "unknown_error",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SolveOutcome::Success)
    }
}

impl fmt::Display for SolveOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Solve state of a stored performance asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case", tag = "state", content = "outcome")]
pub enum SolveState {
    /// Created but the pipeline has not run
    #[default]
    Unsolved,
    Solved,
    /// Pipeline ran and reported a non-success outcome
    Failed(SolveOutcome),
}

impl SolveState {
    pub fn is_solved(&self) -> bool {
        matches!(self, SolveState::Solved)
    }
}

/// Processed facial performance (identity + capture data).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PerformanceAsset {
    /// Store path of the asset
    pub path: AssetPath,
    /// Identity the solve is fitted against
    pub identity: AssetPath,
    /// Ingested capture footage
    pub capture_data: AssetPath,
    /// Frames requested for processing
    pub range: ProcessingRange,
    #[serde(default)]
    pub solve_state: SolveState,
}

impl PerformanceAsset {
    pub fn name(&self) -> &str {
        self.path.name()
    }
}

/// Standalone animation sequence baked from one performance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AnimationSequenceAsset {
    pub path: AssetPath,
    /// Performance this sequence was exported from
    pub source_performance: AssetPath,
}

impl AnimationSequenceAsset {
    pub fn name(&self) -> &str {
        self.path.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processing_range_sentinel() {
        assert_eq!(ProcessingRange::from_sentinel(-1, -1), ProcessingRange::default());
        assert_eq!(
            ProcessingRange::from_sentinel(0, 120),
            ProcessingRange::new(Some(0), Some(120))
        );
        assert_eq!(
            ProcessingRange::from_sentinel(-1, 120),
            ProcessingRange::new(None, Some(120))
        );
    }

    #[test]
    fn test_frame_range_for_take() {
        let range = FrameRange::for_take(120);
        assert_eq!(range, FrameRange::new(0, 120));
        assert_eq!(range.len(), 120);
        assert!(range.contains(0));
        assert!(range.contains(120));
        assert!(!range.contains(121));
    }

    #[test]
    fn test_solve_state_serialization() {
        let json = serde_json::to_string(&SolveState::Failed(SolveOutcome::TooManyFrames)).unwrap();
        assert_eq!(json, r#"{"state":"failed","outcome":"too_many_frames"}"#);
        let json = serde_json::to_string(&SolveState::Solved).unwrap();
        assert_eq!(json, r#"{"state":"solved"}"#);
    }
}
