//! Solve, export and bake operations of the in-memory engine.

use std::f64::consts::TAU;

use tracing::debug;

use perfseq_models::{AssetPath, FrameRange, Keyframe, PerformanceAsset, SolveOutcome, SolveState};

use super::timeline::{ChannelRecord, SectionRecord, TrackRecord};
use super::{AnimSequenceRecord, AssetPayload, MemoryEngine, PerformanceRecord, StoredAsset};
use crate::error::{EngineError, EngineResult};
use crate::export::{AnimationExportBackend, ExportOptions, ExportRange};
use crate::handles::{AssetClass, BindingId, ChannelId, SectionId, TrackId, TrackKind};
use crate::rig::{BakeOptions, ControlRigBaker, ControlRigClass};
use crate::solver::{PerformanceSetup, PerformanceSolver};

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(FNV_OFFSET, |hash, b| (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME))
}

/// Value of control `channel` at `frame`, rounded to four decimals.
fn sample_curve(seed: u64, channel: usize, frame: i64) -> f64 {
    let phase = ((seed >> ((channel % 8) * 8)) & 0xff) as f64 / 255.0 * TAU;
    let frequency = 0.05 + channel as f64 * 0.013;
    let value = 0.5 + 0.5 * (frame as f64 * frequency + phase).sin();
    (value * 10_000.0).round() / 10_000.0
}

/// Drop keys that stay within `tolerance` of the last kept key.
fn reduce(keys: Vec<Keyframe>, tolerance: f64) -> Vec<Keyframe> {
    let last = keys.len().saturating_sub(1);
    let mut kept: Vec<Keyframe> = Vec::with_capacity(keys.len());
    for (i, key) in keys.into_iter().enumerate() {
        match kept.last() {
            Some(prev) if i != last && (key.value() - prev.value()).abs() <= tolerance => {}
            _ => kept.push(key),
        }
    }
    kept
}

impl MemoryEngine {
    fn performance_record(&self, path: &AssetPath) -> EngineResult<&PerformanceRecord> {
        match &self.asset_of_class(path, AssetClass::Performance)?.payload {
            AssetPayload::Performance(record) => Ok(record),
            _ => Err(EngineError::Unconfigured(path.to_string())),
        }
    }

    fn performance_record_mut(&mut self, path: &AssetPath) -> EngineResult<&mut PerformanceRecord> {
        self.asset_of_class(path, AssetClass::Performance)?;
        match self.assets.get_mut(path).map(|a| &mut a.payload) {
            Some(AssetPayload::Performance(record)) => Ok(record),
            _ => Err(EngineError::Unconfigured(path.to_string())),
        }
    }

    /// Frames a performance processes once engine defaults are filled in.
    fn resolved_range(&self, record: &PerformanceRecord) -> Option<FrameRange> {
        let frames = self.capture_frames(record.capture_data.as_ref()?)?;
        Some(FrameRange::new(
            record.range.start_frame.unwrap_or(0),
            record.range.end_frame.unwrap_or(i64::from(frames)),
        ))
    }

    fn run_solve(&self, performance: &AssetPath) -> SolveOutcome {
        let Ok(record) = self.performance_record(performance) else {
            return SolveOutcome::UnknownError;
        };
        let (Some(_), Some(capture_data)) = (&record.identity, &record.capture_data) else {
            return SolveOutcome::UnknownError;
        };
        if let Some(outcome) = self.forced_outcome(capture_data) {
            return outcome;
        }
        let Some(range) = self.resolved_range(record) else {
            return SolveOutcome::UnknownError;
        };
        if range.end < range.start {
            return SolveOutcome::UnknownError;
        }
        match self.frame_cap() {
            Some(cap) if range.len() > i64::from(cap) => SolveOutcome::TooManyFrames,
            _ => SolveOutcome::Success,
        }
    }

    fn find_rig(&self, class: &ControlRigClass) -> Option<&super::ControlRigSpec> {
        self.assets.values().find_map(|asset| match &asset.payload {
            AssetPayload::ControlRig(spec) if spec.class_name == class.as_str() => Some(spec),
            _ => None,
        })
    }
}

impl PerformanceSolver for MemoryEngine {
    fn configure_performance(&mut self, performance: &AssetPath, setup: &PerformanceSetup) -> EngineResult<()> {
        self.asset_of_class(&setup.identity, AssetClass::Identity)?;
        self.asset_of_class(&setup.capture_data, AssetClass::CaptureData)?;

        let record = self.performance_record_mut(performance)?;
        record.identity = Some(setup.identity.clone());
        record.capture_data = Some(setup.capture_data.clone());
        if let Some(start) = setup.range.start_frame {
            record.range.start_frame = Some(start);
        }
        if let Some(end) = setup.range.end_frame {
            record.range.end_frame = Some(end);
        }
        record.solve_state = SolveState::Unsolved;
        Ok(())
    }

    fn describe_performance(&self, performance: &AssetPath) -> EngineResult<PerformanceAsset> {
        let record = self.performance_record(performance)?;
        let unconfigured = || EngineError::Unconfigured(performance.to_string());
        Ok(PerformanceAsset {
            path: performance.clone(),
            identity: record.identity.clone().ok_or_else(unconfigured)?,
            capture_data: record.capture_data.clone().ok_or_else(unconfigured)?,
            range: record.range,
            solve_state: record.solve_state,
        })
    }

    fn solve_blocking(&mut self, performance: &AssetPath) -> SolveOutcome {
        self.calls.solves += 1;
        let outcome = self.run_solve(performance);
        debug!(performance = %performance, outcome = %outcome, "Solve finished");

        if let Ok(record) = self.performance_record_mut(performance) {
            record.solve_state = if outcome.is_success() {
                SolveState::Solved
            } else {
                SolveState::Failed(outcome)
            };
        }
        outcome
    }
}

impl AnimationExportBackend for MemoryEngine {
    fn export_animation_sequence(&mut self, performance: &AssetPath, options: &ExportOptions) -> EngineResult<AssetPath> {
        self.calls.exports += 1;
        if options.show_export_dialog {
            return Err(EngineError::export_failed("interactive export dialog is not available"));
        }

        let record = self.performance_record(performance)?;
        if !record.solve_state.is_solved() {
            return Err(EngineError::export_failed(format!("{} is not solved", performance)));
        }
        let range = match options.export_range {
            ExportRange::ProcessingRange => self.resolved_range(record),
            ExportRange::WholeSequence => record
                .capture_data
                .as_ref()
                .and_then(|c| self.capture_frames(c))
                .map(FrameRange::for_take),
        }
        .ok_or_else(|| EngineError::export_failed(format!("{} has no capture footage", performance)))?;

        self.asset_of_class(&options.target_skeleton, AssetClass::Skeleton)?;
        let path = options.package_path.join(&options.asset_name);
        if self.assets.contains_key(&path) {
            return Err(EngineError::AssetExists(path.to_string()));
        }

        let mut seed = fnv1a(performance.as_str().as_bytes());
        if options.enable_head_movement {
            seed = seed.rotate_left(1);
        }
        debug!(animation = %path, range = %range, "Exported animation sequence");
        self.assets.insert(
            path.clone(),
            StoredAsset {
                class: AssetClass::AnimSequence,
                payload: AssetPayload::AnimSequence(AnimSequenceRecord {
                    source_performance: performance.clone(),
                    range,
                    seed,
                }),
            },
        );
        Ok(path)
    }
}

impl ControlRigBaker for MemoryEngine {
    fn control_rig_class(&self, rig_asset: &AssetPath) -> EngineResult<ControlRigClass> {
        match &self.asset_of_class(rig_asset, AssetClass::ControlRig)?.payload {
            AssetPayload::ControlRig(spec) => Ok(ControlRigClass(spec.class_name.clone())),
            _ => Err(EngineError::not_found(format!("control rig class of {}", rig_asset))),
        }
    }

    fn bake_to_control_rig(
        &mut self,
        shot: &AssetPath,
        binding: BindingId,
        class: &ControlRigClass,
        options: &BakeOptions,
    ) -> EngineResult<TrackId> {
        self.calls.bakes += 1;
        let controls = self
            .find_rig(class)
            .map(|spec| spec.controls.clone())
            .ok_or_else(|| EngineError::not_found(class.as_str()))?;

        let seq = self.sequence(shot)?;
        let mut from_section = None;
        let mut from_rig = None;
        let mut replaced = Vec::new();
        for track_id in &seq.binding(binding)?.tracks {
            let track = seq.track(*track_id)?;
            match track.kind {
                TrackKind::SkeletalAnimation => {
                    from_section = from_section.or_else(|| {
                        track
                            .sections
                            .iter()
                            .find_map(|s| seq.sections.get(s).and_then(|s| s.animation.clone()))
                    });
                    replaced.push(*track_id);
                }
                TrackKind::ControlRig => {
                    from_rig = from_rig.or_else(|| track.source_animation.clone());
                    replaced.push(*track_id);
                }
                TrackKind::Transform => {}
            }
        }
        let source = from_section
            .or(from_rig)
            .ok_or_else(|| EngineError::bake_failed(format!("{} in {} has no animation", binding, shot)))?;
        let animation = match &self.asset(&source)?.payload {
            AssetPayload::AnimSequence(record) => record.clone(),
            _ => return Err(EngineError::bake_failed(format!("{} is not an animation sequence", source))),
        };
        let playback = seq.playback;

        let track_id = TrackId(self.alloc_id());
        let section_id = SectionId(self.alloc_id());
        let mut channels = Vec::with_capacity(controls.len());
        for (i, control) in controls.iter().enumerate() {
            let mut keys: Vec<Keyframe> = (playback.start..playback.end)
                .map(|frame| {
                    let sample = frame.clamp(animation.range.start, animation.range.end);
                    Keyframe::new(sample_curve(animation.seed, i, sample), frame)
                })
                .collect();
            if options.reduce_keys {
                keys = reduce(keys, options.tolerance);
            }
            channels.push((
                ChannelId(self.alloc_id()),
                ChannelRecord {
                    name: format!("{}_{}", control, i),
                    keys,
                },
            ));
        }

        let seq = self.sequence_mut(shot)?;
        for track in replaced {
            seq.remove_track(track);
        }
        seq.sections.insert(
            section_id,
            SectionRecord {
                track: track_id,
                range: playback,
                animation: None,
                channels: channels.iter().map(|(id, _)| *id).collect(),
            },
        );
        seq.channels.extend(channels);
        seq.tracks.insert(
            track_id,
            TrackRecord {
                kind: TrackKind::ControlRig,
                binding,
                sections: vec![section_id],
                source_animation: Some(source),
            },
        );
        let record = seq.binding_mut(binding)?;
        record.tracks.push(track_id);
        record.baked = true;

        debug!(shot = %shot, binding = %binding, track = %track_id, "Baked control rig");
        Ok(track_id)
    }

    fn is_baked(&self, shot: &AssetPath, binding: BindingId) -> EngineResult<bool> {
        Ok(self.sequence(shot)?.binding(binding)?.baked)
    }
}
