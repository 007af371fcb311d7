//! Shot timelines of the in-memory engine.

use std::collections::BTreeMap;

use tracing::debug;

use perfseq_models::{AssetPath, FrameRange, Keyframe};

use super::{AssetPayload, MemoryEngine, StoredAsset};
use crate::error::{EngineError, EngineResult};
use crate::handles::{
    AssetClass, BindingId, BoundObject, ChannelId, SceneObject, SectionId, TrackId, TrackKind,
};
use crate::sequence::{ChannelInfo, Possessable, SequenceEditor};

#[derive(Debug, Clone)]
pub(crate) struct BindingRecord {
    pub(crate) id: BindingId,
    pub(crate) object: SceneObject,
    pub(crate) parent: Option<BindingId>,
    pub(crate) tracks: Vec<TrackId>,
    pub(crate) facial_track: Option<TrackId>,
    pub(crate) baked: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct TrackRecord {
    pub(crate) kind: TrackKind,
    pub(crate) binding: BindingId,
    pub(crate) sections: Vec<SectionId>,
    /// Animation a control-rig track was baked from
    pub(crate) source_animation: Option<AssetPath>,
}

#[derive(Debug, Clone)]
pub(crate) struct SectionRecord {
    pub(crate) track: TrackId,
    pub(crate) range: FrameRange,
    pub(crate) animation: Option<AssetPath>,
    pub(crate) channels: Vec<ChannelId>,
}

#[derive(Debug, Clone)]
pub(crate) struct ChannelRecord {
    pub(crate) name: String,
    pub(crate) keys: Vec<Keyframe>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct SequenceRecord {
    pub(crate) playback: FrameRange,
    pub(crate) bindings: Vec<BindingRecord>,
    pub(crate) tracks: BTreeMap<TrackId, TrackRecord>,
    pub(crate) sections: BTreeMap<SectionId, SectionRecord>,
    pub(crate) channels: BTreeMap<ChannelId, ChannelRecord>,
}

impl SequenceRecord {
    pub(crate) fn binding(&self, id: BindingId) -> EngineResult<&BindingRecord> {
        self.bindings
            .iter()
            .find(|b| b.id == id)
            .ok_or_else(|| EngineError::invalid_handle(id.to_string()))
    }

    pub(crate) fn binding_mut(&mut self, id: BindingId) -> EngineResult<&mut BindingRecord> {
        self.bindings
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| EngineError::invalid_handle(id.to_string()))
    }

    fn binding_for(&self, object: SceneObject) -> Option<BindingId> {
        self.bindings.iter().find(|b| b.object == object).map(|b| b.id)
    }

    pub(crate) fn track(&self, id: TrackId) -> EngineResult<&TrackRecord> {
        self.tracks
            .get(&id)
            .ok_or_else(|| EngineError::invalid_handle(id.to_string()))
    }

    fn section_mut(&mut self, id: SectionId) -> EngineResult<&mut SectionRecord> {
        self.sections
            .get_mut(&id)
            .ok_or_else(|| EngineError::invalid_handle(id.to_string()))
    }

    /// Drop a track together with its sections and channels.
    pub(crate) fn remove_track(&mut self, id: TrackId) {
        if let Some(track) = self.tracks.remove(&id) {
            for section in track.sections {
                if let Some(section) = self.sections.remove(&section) {
                    for channel in section.channels {
                        self.channels.remove(&channel);
                    }
                }
            }
            if let Ok(binding) = self.binding_mut(track.binding) {
                binding.tracks.retain(|t| *t != id);
                if binding.facial_track == Some(id) {
                    binding.facial_track = None;
                }
            }
        }
    }
}

impl MemoryEngine {
    pub(crate) fn sequence(&self, shot: &AssetPath) -> EngineResult<&SequenceRecord> {
        self.sequences
            .get(shot)
            .ok_or_else(|| EngineError::not_found(shot.to_string()))
    }

    pub(crate) fn sequence_mut(&mut self, shot: &AssetPath) -> EngineResult<&mut SequenceRecord> {
        self.sequences
            .get_mut(shot)
            .ok_or_else(|| EngineError::not_found(shot.to_string()))
    }

    fn object_exists(&self, object: SceneObject) -> bool {
        match object {
            SceneObject::Actor(actor) => self.actors.contains_key(&actor),
            SceneObject::Component(component) => self.components.contains_key(&component),
        }
    }

    fn object_name(&self, object: SceneObject) -> Option<String> {
        match object {
            SceneObject::Actor(actor) => self.actors.get(&actor).map(|a| a.label.clone()),
            SceneObject::Component(component) => self.components.get(&component).map(|c| c.name.clone()),
        }
    }
}

impl SequenceEditor for MemoryEngine {
    fn create_sequence(&mut self, name: &str, location: &AssetPath) -> EngineResult<AssetPath> {
        let path = location.join(name);
        if self.sequences.remove(&path).is_some() {
            debug!(shot = %path, "Replacing existing shot");
        }
        self.assets.insert(
            path.clone(),
            StoredAsset {
                class: AssetClass::LevelSequence,
                payload: AssetPayload::Empty,
            },
        );
        self.sequences.insert(path.clone(), SequenceRecord::default());
        Ok(path)
    }

    fn set_playback_range(&mut self, shot: &AssetPath, range: FrameRange) -> EngineResult<()> {
        self.sequence_mut(shot)?.playback = range;
        Ok(())
    }

    fn playback_range(&self, shot: &AssetPath) -> EngineResult<FrameRange> {
        Ok(self.sequence(shot)?.playback)
    }

    fn add_possessable(&mut self, shot: &AssetPath, object: SceneObject) -> EngineResult<BindingId> {
        if !self.object_exists(object) {
            return Err(EngineError::invalid_handle(format!("{:?}", object)));
        }
        if let Some(existing) = self.sequence(shot)?.binding_for(object) {
            return Ok(existing);
        }

        let seq = self.sequence(shot)?;
        let parent = match object {
            SceneObject::Component(component) => self
                .components
                .get(&component)
                .and_then(|c| seq.binding_for(SceneObject::Actor(c.owner))),
            SceneObject::Actor(_) => None,
        };
        // Components bound before their owner get re-parented.
        let orphans: Vec<BindingId> = match object {
            SceneObject::Actor(actor) => seq
                .bindings
                .iter()
                .filter(|b| b.parent.is_none())
                .filter(|b| match b.object {
                    SceneObject::Component(c) => {
                        self.components.get(&c).map(|r| r.owner) == Some(actor)
                    }
                    SceneObject::Actor(_) => false,
                })
                .map(|b| b.id)
                .collect(),
            SceneObject::Component(_) => Vec::new(),
        };

        let id = BindingId(self.alloc_id());
        let seq = self.sequence_mut(shot)?;
        seq.bindings.push(BindingRecord {
            id,
            object,
            parent,
            tracks: Vec::new(),
            facial_track: None,
            baked: false,
        });
        for orphan in orphans {
            seq.binding_mut(orphan)?.parent = Some(id);
        }
        Ok(id)
    }

    fn add_track(&mut self, shot: &AssetPath, binding: BindingId, kind: TrackKind) -> EngineResult<TrackId> {
        let id = TrackId(self.alloc_id());
        let seq = self.sequence_mut(shot)?;
        seq.binding_mut(binding)?.tracks.push(id);
        seq.tracks.insert(
            id,
            TrackRecord {
                kind,
                binding,
                sections: Vec::new(),
                source_animation: None,
            },
        );
        Ok(id)
    }

    fn add_section(&mut self, shot: &AssetPath, track: TrackId) -> EngineResult<SectionId> {
        let id = SectionId(self.alloc_id());
        let seq = self.sequence_mut(shot)?;
        let playback = seq.playback;
        seq.tracks
            .get_mut(&track)
            .ok_or_else(|| EngineError::invalid_handle(track.to_string()))?
            .sections
            .push(id);
        seq.sections.insert(
            id,
            SectionRecord {
                track,
                range: playback,
                animation: None,
                channels: Vec::new(),
            },
        );
        Ok(id)
    }

    fn set_section_range(&mut self, shot: &AssetPath, section: SectionId, range: FrameRange) -> EngineResult<()> {
        self.sequence_mut(shot)?.section_mut(section)?.range = range;
        Ok(())
    }

    fn section_range(&self, shot: &AssetPath, section: SectionId) -> EngineResult<FrameRange> {
        self.sequence(shot)?
            .sections
            .get(&section)
            .map(|s| s.range)
            .ok_or_else(|| EngineError::invalid_handle(section.to_string()))
    }

    fn set_section_animation(&mut self, shot: &AssetPath, section: SectionId, animation: &AssetPath) -> EngineResult<()> {
        self.asset_of_class(animation, AssetClass::AnimSequence)?;
        let seq = self.sequence_mut(shot)?;
        let track = seq.section_mut(section)?.track;
        if seq.track(track)?.kind != TrackKind::SkeletalAnimation {
            return Err(EngineError::invalid_handle(format!(
                "{} is not on a skeletal animation track",
                section
            )));
        }
        seq.section_mut(section)?.animation = Some(animation.clone());
        Ok(())
    }

    fn tag_facial_track(&mut self, shot: &AssetPath, binding: BindingId, track: TrackId) -> EngineResult<()> {
        let seq = self.sequence_mut(shot)?;
        if seq.track(track)?.binding != binding {
            return Err(EngineError::invalid_handle(format!("{} does not belong to {}", track, binding)));
        }
        seq.binding_mut(binding)?.facial_track = Some(track);
        Ok(())
    }

    fn facial_track_tag(&self, shot: &AssetPath, binding: BindingId) -> EngineResult<Option<TrackId>> {
        Ok(self.sequence(shot)?.binding(binding)?.facial_track)
    }

    fn bindings(&self, shot: &AssetPath) -> EngineResult<Vec<BindingId>> {
        Ok(self.sequence(shot)?.bindings.iter().map(|b| b.id).collect())
    }

    fn resolve_binding(&self, shot: &AssetPath, binding: BindingId, _range: FrameRange) -> EngineResult<BoundObject> {
        // Objects never change over time in memory, so the range is not consulted.
        let object = self.sequence(shot)?.binding(binding)?.object;
        if !self.object_exists(object) {
            return Ok(BoundObject::Unresolved);
        }
        Ok(match object {
            SceneObject::Actor(actor) => BoundObject::Actor(actor),
            SceneObject::Component(component) => BoundObject::Component(component),
        })
    }

    fn child_possessables(&self, shot: &AssetPath, binding: BindingId) -> EngineResult<Vec<Possessable>> {
        let seq = self.sequence(shot)?;
        seq.binding(binding)?;
        Ok(seq
            .bindings
            .iter()
            .filter(|b| b.parent == Some(binding))
            .map(|b| Possessable {
                binding: b.id,
                name: self.object_name(b.object).unwrap_or_default(),
            })
            .collect())
    }

    fn parent_display_name(&self, shot: &AssetPath, binding: BindingId) -> EngineResult<Option<String>> {
        let seq = self.sequence(shot)?;
        let Some(parent) = seq.binding(binding)?.parent else {
            return Ok(None);
        };
        Ok(self.object_name(seq.binding(parent)?.object))
    }

    fn tracks(&self, shot: &AssetPath, binding: BindingId) -> EngineResult<Vec<TrackId>> {
        Ok(self.sequence(shot)?.binding(binding)?.tracks.clone())
    }

    fn track_kind(&self, shot: &AssetPath, track: TrackId) -> EngineResult<TrackKind> {
        Ok(self.sequence(shot)?.track(track)?.kind)
    }

    fn sections(&self, shot: &AssetPath, track: TrackId) -> EngineResult<Vec<SectionId>> {
        Ok(self.sequence(shot)?.track(track)?.sections.clone())
    }

    fn channels(&self, shot: &AssetPath, section: SectionId) -> EngineResult<Vec<ChannelInfo>> {
        let seq = self.sequence(shot)?;
        let section = seq
            .sections
            .get(&section)
            .ok_or_else(|| EngineError::invalid_handle(section.to_string()))?;
        Ok(section
            .channels
            .iter()
            .filter_map(|id| {
                seq.channels.get(id).map(|c| ChannelInfo {
                    id: *id,
                    name: c.name.clone(),
                })
            })
            .collect())
    }

    fn channel_keys(&self, shot: &AssetPath, channel: ChannelId) -> EngineResult<Vec<Keyframe>> {
        let record = self
            .sequence(shot)?
            .channels
            .get(&channel)
            .ok_or_else(|| EngineError::invalid_handle(channel.to_string()))?;
        if self.unreadable_channels.contains(&record.name) {
            return Err(EngineError::channel_read(&record.name, "channel keys are not readable"));
        }
        Ok(record.keys.clone())
    }

    fn refresh(&mut self, shot: &AssetPath) -> EngineResult<()> {
        self.sequence(shot)?;
        self.calls.refreshes += 1;
        Ok(())
    }
}
