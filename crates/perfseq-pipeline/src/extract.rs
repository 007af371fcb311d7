//! Facial keyframe extraction and serialization.
//!
//! Walks the actor bindings of a baked shot, finds the facial possessable
//! under each one and flattens the channels of its control-rig track into a
//! [`FaceAnimDocument`]. Documents are written atomically: a temp file in the
//! destination directory is renamed over the final path.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use perfseq_engine::{BindingId, BoundObject, EngineWorld, SequenceEditor, TrackId};
use perfseq_models::{naming, AssetPath, ChannelReadFailure, FaceAnimDocument, OutputFormat};

use crate::error::{PipelineError, PipelineResult};

/// Result of extracting one shot.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractOutcome {
    Written {
        path: PathBuf,
        document: FaceAnimDocument,
    },
    /// No actor binding carried a facial possessable; nothing was written
    Skipped,
}

/// Reads facial keyframes out of a shot.
#[derive(Debug, Clone, Copy, Default)]
pub struct FaceKeyframeExtractor;

impl FaceKeyframeExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract the facial controls of `shot`.
    ///
    /// Returns `None` when no actor binding has a facial possessable. A
    /// channel whose keys cannot be read is kept with an empty key list and
    /// recorded as a failure on the document.
    pub fn extract<E>(&self, engine: &E, shot: &AssetPath) -> PipelineResult<Option<FaceAnimDocument>>
    where
        E: EngineWorld + SequenceEditor + ?Sized,
    {
        let playback = engine.playback_range(shot)?;
        let mut document = FaceAnimDocument::new(shot.name());
        let mut found = false;

        for binding in engine.bindings(shot)? {
            let actor = match engine.resolve_binding(shot, binding, playback)? {
                BoundObject::Actor(actor) => actor,
                BoundObject::Component(_) => continue,
                BoundObject::Unresolved => {
                    debug!(shot = %shot, binding = %binding, "Binding does not resolve");
                    continue;
                }
            };
            let actor_label = engine.actor_label(actor)?;

            let children = engine.child_possessables(shot, binding)?;
            let Some(face) = children.iter().find(|c| naming::is_face_possessable(&c.name)) else {
                info!(shot = %shot, actor = %actor_label, "No facial possessable, skipping actor");
                continue;
            };

            let character = engine
                .parent_display_name(shot, face.binding)?
                .unwrap_or_else(|| actor_label.clone());
            let Some(track) = facial_track(engine, shot, face.binding)? else {
                warn!(shot = %shot, actor = %actor_label, "Facial possessable has no tracks, skipping actor");
                continue;
            };
            let Some(section) = engine.sections(shot, track)?.first().copied() else {
                warn!(shot = %shot, track = %track, "Facial track has no sections, skipping actor");
                continue;
            };

            for channel in engine.channels(shot, section)? {
                let control = naming::normalize_channel_name(&channel.name);
                match engine.channel_keys(shot, channel.id) {
                    Ok(keys) => document.set_control(control, keys),
                    Err(e) => {
                        warn!(shot = %shot, channel = %channel.name, error = %e, "Failed to read channel keys");
                        document.record_failure(ChannelReadFailure {
                            control: control.to_string(),
                            raw_channel: channel.name.clone(),
                            reason: e.to_string(),
                        });
                    }
                }
            }

            let character = naming::normalize_character_name(&character);
            info!(shot = %shot, character = %character, "Extracted facial controls");
            document.add_character(character);
            found = true;
        }

        if !found {
            info!(shot = %shot, "Shot has no facial binding. Skipping.");
            return Ok(None);
        }
        Ok(Some(document))
    }
}

/// Facial control track of a possessable: the tagged track, else the last one.
fn facial_track<E>(engine: &E, shot: &AssetPath, binding: BindingId) -> PipelineResult<Option<TrackId>>
where
    E: SequenceEditor + ?Sized,
{
    if let Some(track) = engine.facial_track_tag(shot, binding)? {
        return Ok(Some(track));
    }
    let track = engine.tracks(shot, binding)?.last().copied();
    if let Some(track) = track {
        warn!(shot = %shot, binding = %binding, track = %track, "No tagged facial track, using the last track");
    }
    Ok(track)
}

/// Writes face documents into one output directory.
#[derive(Debug, Clone)]
pub struct FaceAnimWriter {
    output_dir: PathBuf,
    format: OutputFormat,
}

impl FaceAnimWriter {
    pub fn new(output_dir: impl Into<PathBuf>, format: OutputFormat) -> Self {
        Self {
            output_dir: output_dir.into(),
            format,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write `document`, replacing any previous file. Returns the final path.
    ///
    /// Any I/O failure is reported as [`PipelineError::OutputWrite`] for this
    /// document only.
    pub fn write(&self, document: &FaceAnimDocument, generated_at: DateTime<Utc>) -> PipelineResult<PathBuf> {
        let path = self.output_dir.join(document.file_name());
        let json = document.to_json(self.format, generated_at)?;
        self.write_atomic(&path, json.as_bytes())
            .map_err(|e| PipelineError::output_write(&path, e))?;

        info!(path = %path.display(), controls = document.len(), "Face animation keys written");
        Ok(path)
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        fs::create_dir_all(&self.output_dir)?;
        let mut file = NamedTempFile::new_in(&self.output_dir)?;
        file.write_all(bytes)?;
        file.flush()?;
        file.persist(path).map_err(|e| e.error)?;
        Ok(())
    }
}

/// Extract `shot` and write its document if it has one.
pub fn extract_shot<E>(
    engine: &E,
    shot: &AssetPath,
    writer: &FaceAnimWriter,
    generated_at: DateTime<Utc>,
) -> PipelineResult<ExtractOutcome>
where
    E: EngineWorld + SequenceEditor + ?Sized,
{
    match FaceKeyframeExtractor::new().extract(engine, shot)? {
        Some(document) => {
            let path = writer.write(&document, generated_at)?;
            Ok(ExtractOutcome::Written { path, document })
        }
        None => Ok(ExtractOutcome::Skipped),
    }
}
