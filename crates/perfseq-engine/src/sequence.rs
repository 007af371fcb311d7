//! Shot (level sequence) editing collaborator.

use perfseq_models::{AssetPath, FrameRange, Keyframe};

use crate::error::EngineResult;
use crate::handles::{BindingId, BoundObject, ChannelId, SceneObject, SectionId, TrackId, TrackKind};

/// Child possessable of a binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Possessable {
    pub binding: BindingId,
    pub name: String,
}

/// Scalar channel of a section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    pub id: ChannelId,
    /// Raw channel name, e.g. `CTRL_expressions_jawOpen_9`
    pub name: String,
}

/// Timeline editing: bindings, tracks, sections, channels.
///
/// Shots are addressed by their store path.
pub trait SequenceEditor {
    /// Create an empty shot at `location/name`, replacing any existing one.
    fn create_sequence(&mut self, name: &str, location: &AssetPath) -> EngineResult<AssetPath>;

    fn set_playback_range(&mut self, shot: &AssetPath, range: FrameRange) -> EngineResult<()>;

    fn playback_range(&self, shot: &AssetPath) -> EngineResult<FrameRange>;

    /// Bind a scene object; returns the existing binding if already bound.
    fn add_possessable(&mut self, shot: &AssetPath, object: SceneObject) -> EngineResult<BindingId>;

    fn add_track(&mut self, shot: &AssetPath, binding: BindingId, kind: TrackKind) -> EngineResult<TrackId>;

    fn add_section(&mut self, shot: &AssetPath, track: TrackId) -> EngineResult<SectionId>;

    fn set_section_range(&mut self, shot: &AssetPath, section: SectionId, range: FrameRange) -> EngineResult<()>;

    fn section_range(&self, shot: &AssetPath, section: SectionId) -> EngineResult<FrameRange>;

    /// Attach an animation sequence as a skeletal-animation section parameter.
    fn set_section_animation(&mut self, shot: &AssetPath, section: SectionId, animation: &AssetPath) -> EngineResult<()>;

    /// Mark `track` as the facial animation/control-rig track of `binding`.
    fn tag_facial_track(&mut self, shot: &AssetPath, binding: BindingId, track: TrackId) -> EngineResult<()>;

    fn facial_track_tag(&self, shot: &AssetPath, binding: BindingId) -> EngineResult<Option<TrackId>>;

    /// Bindings in creation order.
    fn bindings(&self, shot: &AssetPath) -> EngineResult<Vec<BindingId>>;

    /// Resolve what a binding points at over `range`.
    fn resolve_binding(&self, shot: &AssetPath, binding: BindingId, range: FrameRange) -> EngineResult<BoundObject>;

    fn child_possessables(&self, shot: &AssetPath, binding: BindingId) -> EngineResult<Vec<Possessable>>;

    /// Display name of the binding's parent possessable.
    fn parent_display_name(&self, shot: &AssetPath, binding: BindingId) -> EngineResult<Option<String>>;

    /// Tracks of a binding in the order they were added.
    fn tracks(&self, shot: &AssetPath, binding: BindingId) -> EngineResult<Vec<TrackId>>;

    fn track_kind(&self, shot: &AssetPath, track: TrackId) -> EngineResult<TrackKind>;

    fn sections(&self, shot: &AssetPath, track: TrackId) -> EngineResult<Vec<SectionId>>;

    fn channels(&self, shot: &AssetPath, section: SectionId) -> EngineResult<Vec<ChannelInfo>>;

    /// Keys of a channel as `(value, frame)` at display rate, in source order.
    fn channel_keys(&self, shot: &AssetPath, channel: ChannelId) -> EngineResult<Vec<Keyframe>>;

    /// Refresh any open editor view of the shot.
    fn refresh(&mut self, shot: &AssetPath) -> EngineResult<()>;
}
