//! Raw capture folders and their sidecar metadata.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ModelError, ModelResult};

/// Name of the sidecar file inside every capture folder.
pub const TAKE_METADATA_FILE: &str = "take.json";

/// Sidecar metadata written next to a raw capture (`take.json`).
///
/// Only `frames` is required; other fields written by the capture tool are
/// ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TakeMetadata {
    /// Number of frames in the take
    pub frames: u32,
}

impl TakeMetadata {
    /// Parse sidecar JSON.
    pub fn from_json_str(json: &str) -> ModelResult<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if !value.is_object() {
            return Err(ModelError::invalid_metadata("expected a JSON object"));
        }
        match value.get("frames") {
            Some(frames) if frames.is_u64() => Ok(serde_json::from_value(value)?),
            Some(other) => Err(ModelError::invalid_metadata(format!(
                "field 'frames' must be a non-negative integer, got {}",
                other
            ))),
            None => Err(ModelError::invalid_metadata("missing field 'frames'")),
        }
    }
}

/// One raw capture folder discovered at batch start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CaptureRecord {
    /// Filesystem path of the capture folder
    pub raw_path: PathBuf,
    /// Folder name, e.g. `take_007`
    pub folder_name: String,
    /// Raw suffix text with its padding, e.g. `007`
    pub suffix: String,
    /// Numeric value of the suffix; unique within a batch
    pub sequence_index: u32,
    /// Frame count from the sidecar
    pub frame_count: u32,
}

/// Split a capture folder name into its suffix text and numeric index.
///
/// The suffix is the text after the last `_` (`"take_007"` -> `("007", 7)`).
pub fn parse_sequence_suffix(folder_name: &str) -> ModelResult<(String, u32)> {
    let suffix = folder_name.rsplit('_').next().unwrap_or(folder_name);
    if suffix.is_empty() || !suffix.chars().all(|c| c.is_ascii_digit()) {
        return Err(ModelError::MalformedName(folder_name.to_string()));
    }
    let index = suffix
        .parse::<u32>()
        .map_err(|_| ModelError::MalformedName(folder_name.to_string()))?;
    Ok((suffix.to_string(), index))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sequence_suffix() {
        assert_eq!(parse_sequence_suffix("take_007").unwrap(), ("007".to_string(), 7));
        assert_eq!(parse_sequence_suffix("Fretlyn_day2_12").unwrap(), ("12".to_string(), 12));
    }

    #[test]
    fn test_parse_sequence_suffix_rejects_non_numeric() {
        assert!(matches!(
            parse_sequence_suffix("take_final"),
            Err(ModelError::MalformedName(_))
        ));
        assert!(parse_sequence_suffix("take_").is_err());
        assert!(parse_sequence_suffix("take").is_err());
    }

    #[test]
    fn test_take_metadata_parse() {
        let meta = TakeMetadata::from_json_str(r#"{"frames": 120, "fps": 60}"#).unwrap();
        assert_eq!(meta.frames, 120);
    }

    #[test]
    fn test_take_metadata_rejects_bad_frames() {
        assert!(TakeMetadata::from_json_str(r#"{"fps": 60}"#).is_err());
        assert!(TakeMetadata::from_json_str(r#"{"frames": "120"}"#).is_err());
        assert!(TakeMetadata::from_json_str(r#"{"frames": -4}"#).is_err());
        assert!(TakeMetadata::from_json_str("not json").is_err());
        assert!(TakeMetadata::from_json_str("[1, 2]").is_err());
    }
}
