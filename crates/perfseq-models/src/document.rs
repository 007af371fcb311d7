//! Face animation documents.
//!
//! The legacy on-disk form is a single JSON object mapping each normalized
//! control name to an array of `[value, frame]` pairs, in the order the keys
//! were read from the baked channel:
//!
//! ```json
//! {"jawOpen": [[0.0, 0], [0.12, 1]], "browUp": []}
//! ```
//!
//! The versioned form wraps the same mapping in an envelope that states the
//! schema version and the units of both columns.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ModelResult;
use crate::naming;

/// Version of the versioned envelope.
pub const FACE_ANIM_SCHEMA_VERSION: u32 = 1;

/// Frame numbers are whole frames at the sequence display rate.
pub const FRAME_UNIT: &str = "display_rate_frame";

/// Values are whatever scale the control-rig channel uses.
pub const VALUE_UNIT: &str = "control_rig_native";

/// One key: serialized as `[value, frame]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Keyframe(pub f64, pub i64);

impl Keyframe {
    pub fn new(value: f64, frame: i64) -> Self {
        Self(value, frame)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn frame(&self) -> i64 {
        self.1
    }
}

/// A channel whose keys could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ChannelReadFailure {
    /// Normalized control name
    pub control: String,
    /// Channel name as reported by the engine
    pub raw_channel: String,
    pub reason: String,
}

/// Serialized form of a face document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Bare control -> keys object
    #[default]
    Legacy,
    /// Envelope with schema version and units
    Versioned,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Legacy => "legacy",
            OutputFormat::Versioned => "versioned",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "legacy" => Ok(OutputFormat::Legacy),
            "versioned" => Ok(OutputFormat::Versioned),
            other => Err(format!("unknown output format '{}'", other)),
        }
    }
}

/// Versioned envelope around the control mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VersionedFaceAnim {
    pub schema_version: u32,
    pub shot: String,
    /// Normalized character names, in binding order
    pub characters: Vec<String>,
    pub frame_unit: String,
    pub value_unit: String,
    pub generated_at: DateTime<Utc>,
    #[schemars(with = "std::collections::BTreeMap<String, Vec<Keyframe>>")]
    pub controls: IndexMap<String, Vec<Keyframe>>,
}

/// Flattened facial keyframes of one shot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FaceAnimDocument {
    shot_name: String,
    characters: Vec<String>,
    controls: IndexMap<String, Vec<Keyframe>>,
    failures: Vec<ChannelReadFailure>,
}

impl FaceAnimDocument {
    pub fn new(shot_name: impl Into<String>) -> Self {
        Self {
            shot_name: shot_name.into(),
            ..Default::default()
        }
    }

    /// Parse a legacy document, preserving control order.
    pub fn from_legacy_json(shot_name: impl Into<String>, json: &str) -> ModelResult<Self> {
        let controls: IndexMap<String, Vec<Keyframe>> = serde_json::from_str(json)?;
        Ok(Self {
            shot_name: shot_name.into(),
            controls,
            ..Default::default()
        })
    }

    pub fn shot_name(&self) -> &str {
        &self.shot_name
    }

    /// `{shot}_face_anim.json`
    pub fn file_name(&self) -> String {
        naming::face_anim_file_name(&self.shot_name)
    }

    pub fn add_character(&mut self, character: impl Into<String>) {
        let character = character.into();
        if !self.characters.contains(&character) {
            self.characters.push(character);
        }
    }

    pub fn characters(&self) -> &[String] {
        &self.characters
    }

    /// Set a control's keys. A repeated control keeps its first position and
    /// takes the latest keys.
    pub fn set_control(&mut self, control: impl Into<String>, keys: Vec<Keyframe>) {
        self.controls.insert(control.into(), keys);
    }

    /// Record an unreadable channel: the control is kept with no keys.
    pub fn record_failure(&mut self, failure: ChannelReadFailure) {
        self.controls.insert(failure.control.clone(), Vec::new());
        self.failures.push(failure);
    }

    pub fn control(&self, name: &str) -> Option<&[Keyframe]> {
        self.controls.get(name).map(Vec::as_slice)
    }

    pub fn controls(&self) -> impl Iterator<Item = (&str, &[Keyframe])> {
        self.controls.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn control_names(&self) -> impl Iterator<Item = &str> {
        self.controls.keys().map(String::as_str)
    }

    pub fn failures(&self) -> &[ChannelReadFailure] {
        &self.failures
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    /// Total number of keys across all controls.
    pub fn key_count(&self) -> usize {
        self.controls.values().map(Vec::len).sum()
    }

    /// Wrap the mapping in the versioned envelope.
    pub fn to_versioned(&self, generated_at: DateTime<Utc>) -> VersionedFaceAnim {
        VersionedFaceAnim {
            schema_version: FACE_ANIM_SCHEMA_VERSION,
            shot: self.shot_name.clone(),
            characters: self.characters.clone(),
            frame_unit: FRAME_UNIT.to_string(),
            value_unit: VALUE_UNIT.to_string(),
            generated_at,
            controls: self.controls.clone(),
        }
    }

    /// Serialize in the requested format.
    pub fn to_json(&self, format: OutputFormat, generated_at: DateTime<Utc>) -> ModelResult<String> {
        let json = match format {
            OutputFormat::Legacy => serde_json::to_string(&self.controls)?,
            OutputFormat::Versioned => serde_json::to_string(&self.to_versioned(generated_at))?,
        };
        Ok(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FaceAnimDocument {
        let mut doc = FaceAnimDocument::new("LS_Performance_Fretlyn_007");
        doc.set_control("jawOpen", vec![Keyframe::new(0.5, 3), Keyframe::new(0.25, 1)]);
        doc.set_control("browUp", vec![Keyframe::new(1.0, 0)]);
        doc
    }

    #[test]
    fn test_legacy_json_preserves_control_and_key_order() {
        let json = sample().to_json(OutputFormat::Legacy, Utc::now()).unwrap();
        assert_eq!(json, r#"{"jawOpen":[[0.5,3],[0.25,1]],"browUp":[[1.0,0]]}"#);
    }

    #[test]
    fn test_record_failure_keeps_empty_control() {
        let mut doc = sample();
        doc.record_failure(ChannelReadFailure {
            control: "mouthSmile".to_string(),
            raw_channel: "mouthSmile_4".to_string(),
            reason: "keys unavailable".to_string(),
        });
        assert_eq!(doc.control("mouthSmile"), Some(&[][..]));
        assert_eq!(doc.control("jawOpen").unwrap().len(), 2);
        assert_eq!(doc.failures().len(), 1);
    }

    #[test]
    fn test_repeated_control_keeps_position() {
        let mut doc = sample();
        doc.set_control("jawOpen", vec![Keyframe::new(0.0, 0)]);
        let names: Vec<&str> = doc.control_names().collect();
        assert_eq!(names, vec!["jawOpen", "browUp"]);
        assert_eq!(doc.control("jawOpen").unwrap(), &[Keyframe::new(0.0, 0)]);
    }

    #[test]
    fn test_versioned_envelope() {
        let mut doc = sample();
        doc.add_character("bernice");
        let json = doc.to_json(OutputFormat::Versioned, Utc::now()).unwrap();
        let parsed: VersionedFaceAnim = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.schema_version, FACE_ANIM_SCHEMA_VERSION);
        assert_eq!(parsed.characters, vec!["bernice".to_string()]);
        assert_eq!(parsed.frame_unit, FRAME_UNIT);
        assert_eq!(parsed.controls.len(), 2);
    }

    #[test]
    fn test_legacy_round_trip_keeps_order() {
        let json = sample().to_json(OutputFormat::Legacy, Utc::now()).unwrap();
        let parsed = FaceAnimDocument::from_legacy_json("LS_Performance_Fretlyn_007", &json).unwrap();
        let names: Vec<&str> = parsed.control_names().collect();
        assert_eq!(names, vec!["jawOpen", "browUp"]);
        assert_eq!(parsed.file_name(), "LS_Performance_Fretlyn_007_face_anim.json");
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("legacy".parse::<OutputFormat>().unwrap(), OutputFormat::Legacy);
        assert_eq!("Versioned".parse::<OutputFormat>().unwrap(), OutputFormat::Versioned);
        assert!("xml".parse::<OutputFormat>().is_err());
    }
}
