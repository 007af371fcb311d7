//! Capture catalog: discovery of raw capture folders.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use perfseq_models::{parse_sequence_suffix, CaptureRecord, ModelError, TakeMetadata, TAKE_METADATA_FILE};

use crate::error::{PipelineError, PipelineResult};

/// Inclusive window of capture indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimRange {
    pub start: u32,
    /// Unbounded when `None`; an end below `start` selects nothing
    pub end: Option<i64>,
}

impl AnimRange {
    pub fn new(start: u32, end: Option<i64>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, index: u32) -> bool {
        index >= self.start && self.end.map_or(true, |end| i64::from(index) <= end)
    }

    pub fn is_empty(&self) -> bool {
        self.end.is_some_and(|end| end < i64::from(self.start))
    }
}

/// Enumerates capture folders under a raw-data directory.
#[derive(Debug, Clone)]
pub struct CaptureCatalog {
    raw_data_path: PathBuf,
    range: AnimRange,
}

impl CaptureCatalog {
    pub fn new(raw_data_path: impl Into<PathBuf>, range: AnimRange) -> Self {
        Self {
            raw_data_path: raw_data_path.into(),
            range,
        }
    }

    pub fn raw_data_path(&self) -> &Path {
        &self.raw_data_path
    }

    /// Discover captures in the index window, ordered by index.
    ///
    /// Every sub-folder must carry a numeric `_NNN` suffix; folders inside the
    /// window must have a readable `take.json`.
    pub fn discover(&self) -> PipelineResult<Vec<CaptureRecord>> {
        if self.range.is_empty() {
            warn!(
                start = self.range.start,
                end = ?self.range.end,
                "Capture index window is empty, no capture will be processed"
            );
        }
        let mut records = Vec::new();

        for entry in fs::read_dir(&self.raw_data_path)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }

            let folder_name = entry
                .file_name()
                .into_string()
                .map_err(|name| PipelineError::MalformedName(name.to_string_lossy().into_owned()))?;
            let (suffix, sequence_index) = parse_sequence_suffix(&folder_name).map_err(|e| match e {
                ModelError::MalformedName(name) => PipelineError::MalformedName(name),
                other => PipelineError::Model(other),
            })?;

            if !self.range.contains(sequence_index) {
                debug!(folder = %folder_name, index = sequence_index, "Capture outside index window");
                continue;
            }

            let raw_path = entry.path();
            let metadata = read_take_metadata(&raw_path)?;
            records.push(CaptureRecord {
                raw_path,
                folder_name,
                suffix,
                sequence_index,
                frame_count: metadata.frames,
            });
        }

        records.sort_by(|a, b| {
            a.sequence_index
                .cmp(&b.sequence_index)
                .then_with(|| a.folder_name.cmp(&b.folder_name))
        });
        if let Some(pair) = records
            .windows(2)
            .find(|pair| pair[0].sequence_index == pair[1].sequence_index)
        {
            return Err(PipelineError::DuplicateIndex {
                index: pair[0].sequence_index,
                first: pair[0].folder_name.clone(),
                second: pair[1].folder_name.clone(),
            });
        }

        info!(
            raw_data_path = %self.raw_data_path.display(),
            captures = records.len(),
            "Discovered captures: {:?}",
            records.iter().map(|r| r.folder_name.as_str()).collect::<Vec<_>>()
        );
        Ok(records)
    }
}

fn read_take_metadata(capture: &Path) -> PipelineResult<TakeMetadata> {
    let path = capture.join(TAKE_METADATA_FILE);
    let json = fs::read_to_string(&path)
        .map_err(|e| PipelineError::missing_metadata(&path, e.to_string()))?;
    TakeMetadata::from_json_str(&json).map_err(|e| PipelineError::missing_metadata(&path, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn add_capture(root: &Path, folder: &str, sidecar: Option<&str>) {
        let dir = root.join(folder);
        fs::create_dir_all(&dir).unwrap();
        if let Some(json) = sidecar {
            fs::write(dir.join(TAKE_METADATA_FILE), json).unwrap();
        }
    }

    #[test]
    fn test_discover_filters_and_orders() {
        let root = TempDir::new().unwrap();
        add_capture(root.path(), "take_010", Some(r#"{"frames": 90}"#));
        add_capture(root.path(), "take_002", Some(r#"{"frames": 48}"#));
        add_capture(root.path(), "take_001", Some(r#"{"frames": 120}"#));
        fs::write(root.path().join("notes.txt"), "ignored").unwrap();

        let catalog = CaptureCatalog::new(root.path(), AnimRange::new(2, None));
        let records = catalog.discover().unwrap();

        let names: Vec<&str> = records.iter().map(|r| r.folder_name.as_str()).collect();
        assert_eq!(names, vec!["take_002", "take_010"]);
        assert_eq!(records[0].suffix, "002");
        assert_eq!(records[0].frame_count, 48);
        assert_eq!(records[1].sequence_index, 10);
    }

    #[test]
    fn test_discover_inclusive_upper_bound() {
        let root = TempDir::new().unwrap();
        for i in 1..=4 {
            add_capture(root.path(), &format!("take_{:03}", i), Some(r#"{"frames": 10}"#));
        }
        let catalog = CaptureCatalog::new(root.path(), AnimRange::new(2, Some(3)));
        let indices: Vec<u32> = catalog.discover().unwrap().iter().map(|r| r.sequence_index).collect();
        assert_eq!(indices, vec![2, 3]);
    }

    #[test]
    fn test_discover_empty_window() {
        let root = TempDir::new().unwrap();
        for i in 1..=3 {
            add_capture(root.path(), &format!("take_{:03}", i), Some(r#"{"frames": 10}"#));
        }
        for range in [AnimRange::new(1, Some(-5)), AnimRange::new(3, Some(2))] {
            let catalog = CaptureCatalog::new(root.path(), range);
            assert!(catalog.discover().unwrap().is_empty());
        }
    }

    #[test]
    fn test_missing_sidecar_is_fatal() {
        let root = TempDir::new().unwrap();
        add_capture(root.path(), "take_001", None);
        let catalog = CaptureCatalog::new(root.path(), AnimRange::new(1, None));
        assert!(matches!(
            catalog.discover(),
            Err(PipelineError::MissingMetadata { .. })
        ));
    }

    #[test]
    fn test_sidecar_without_frames_is_fatal() {
        let root = TempDir::new().unwrap();
        add_capture(root.path(), "take_001", Some(r#"{"fps": 60}"#));
        let catalog = CaptureCatalog::new(root.path(), AnimRange::new(1, None));
        assert!(matches!(
            catalog.discover(),
            Err(PipelineError::MissingMetadata { .. })
        ));
    }

    #[test]
    fn test_malformed_name_is_fatal() {
        let root = TempDir::new().unwrap();
        add_capture(root.path(), "take_001", Some(r#"{"frames": 10}"#));
        add_capture(root.path(), "take_final", Some(r#"{"frames": 10}"#));
        let catalog = CaptureCatalog::new(root.path(), AnimRange::new(1, None));
        assert!(matches!(catalog.discover(), Err(PipelineError::MalformedName(_))));
    }

    #[test]
    fn test_duplicate_index_is_fatal() {
        let root = TempDir::new().unwrap();
        add_capture(root.path(), "take_007", Some(r#"{"frames": 10}"#));
        add_capture(root.path(), "retake_7", Some(r#"{"frames": 10}"#));
        let catalog = CaptureCatalog::new(root.path(), AnimRange::new(1, None));
        match catalog.discover() {
            Err(PipelineError::DuplicateIndex { index, first, second }) => {
                assert_eq!(index, 7);
                assert_eq!(first, "retake_7");
                assert_eq!(second, "take_007");
            }
            other => panic!("expected duplicate index, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_root_is_io_error() {
        let root = TempDir::new().unwrap();
        let catalog = CaptureCatalog::new(root.path().join("absent"), AnimRange::new(1, None));
        assert!(matches!(catalog.discover(), Err(PipelineError::Io(_))));
    }
}
