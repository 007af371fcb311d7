//! Shot assembler.
//!
//! Builds one shot per manifest entry: the character actor and its facial
//! component are bound, each with a transform and an animation track whose
//! sections span the shot's playback range.

use tracing::{debug, info};

use perfseq_engine::{
    ActorHandle, BindingId, EngineWorld, SceneObject, SectionId, SequenceEditor, TrackId, TrackKind,
};
use perfseq_models::{naming, AssetPath, FrameRange};

use crate::error::{PipelineError, PipelineResult};

/// A freshly assembled shot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledShot {
    pub shot: AssetPath,
    pub playback: FrameRange,
    pub actor_binding: BindingId,
    pub face_binding: BindingId,
    /// Animation track on the facial binding, tagged on the shot
    pub face_animation_track: TrackId,
}

impl AssembledShot {
    pub fn name(&self) -> &str {
        self.shot.name()
    }
}

/// Creates shots under one store location.
#[derive(Debug, Clone)]
pub struct ShotAssembler {
    destination: AssetPath,
}

impl ShotAssembler {
    pub fn new(destination: AssetPath) -> Self {
        Self { destination }
    }

    /// Assemble `shot_name` for `actor`, driving its face with `animation`.
    ///
    /// An existing shot with the same name is replaced.
    pub fn assemble<E>(
        &self,
        engine: &mut E,
        actor: &ActorHandle,
        animation: &AssetPath,
        frame_count: u32,
        shot_name: &str,
    ) -> PipelineResult<AssembledShot>
    where
        E: EngineWorld + SequenceEditor + ?Sized,
    {
        let shot = engine.create_sequence(shot_name, &self.destination)?;
        engine.set_playback_range(&shot, FrameRange::for_take(frame_count))?;
        let playback = engine.playback_range(&shot)?;
        info!(shot = %shot, playback = %playback, "Created shot");

        let actor_binding = engine.add_possessable(&shot, SceneObject::Actor(*actor))?;
        add_track_with_section(engine, &shot, actor_binding, TrackKind::Transform, playback)?;
        add_track_with_section(engine, &shot, actor_binding, TrackKind::SkeletalAnimation, playback)?;

        let mut face_component = None;
        for component in engine.skeletal_components(*actor)? {
            if engine.component_name(component)? == naming::FACE_COMPONENT_NAME {
                face_component = Some(component);
                break;
            }
        }
        let face_component = match face_component {
            Some(component) => component,
            None => {
                return Err(PipelineError::FaceComponentNotFound(engine.actor_label(*actor)?));
            }
        };
        debug!(shot = %shot, component = %face_component, "Resolved face component");

        let face_binding = engine.add_possessable(&shot, SceneObject::Component(face_component))?;
        add_track_with_section(engine, &shot, face_binding, TrackKind::Transform, playback)?;
        let (face_animation_track, face_section) =
            add_track_with_section(engine, &shot, face_binding, TrackKind::SkeletalAnimation, playback)?;
        engine.set_section_animation(&shot, face_section, animation)?;
        engine.tag_facial_track(&shot, face_binding, face_animation_track)?;

        Ok(AssembledShot {
            shot,
            playback,
            actor_binding,
            face_binding,
            face_animation_track,
        })
    }
}

fn add_track_with_section<E>(
    engine: &mut E,
    shot: &AssetPath,
    binding: BindingId,
    kind: TrackKind,
    range: FrameRange,
) -> PipelineResult<(TrackId, SectionId)>
where
    E: SequenceEditor + ?Sized,
{
    let track = engine.add_track(shot, binding, kind)?;
    let section = engine.add_section(shot, track)?;
    engine.set_section_range(shot, section, range)?;
    Ok((track, section))
}

#[cfg(test)]
mod tests {
    use super::*;
    use perfseq_engine::memory::BlueprintSpec;
    use perfseq_engine::{AssetClass, AssetStore, MemoryEngine, Vec3};

    fn path(s: &str) -> AssetPath {
        AssetPath::new(s).unwrap()
    }

    fn engine_with_actor(spec: BlueprintSpec) -> (MemoryEngine, ActorHandle, AssetPath) {
        let mut engine = MemoryEngine::new();
        let blueprint = path("/Game/MetaHumans/Bernice/BP_Bernice");
        engine.add_blueprint(blueprint.clone(), spec);
        let actor = engine.spawn_actor(&blueprint, Vec3::default()).unwrap();
        let animation = engine
            .create("AS_Performance_Fretlyn_007", &path("/Game/Performances"), AssetClass::AnimSequence)
            .unwrap()
            .path;
        (engine, actor, animation)
    }

    #[test]
    fn test_all_sections_span_playback_range() {
        let (mut engine, actor, animation) = engine_with_actor(BlueprintSpec::metahuman("BP_Bernice"));
        let assembler = ShotAssembler::new(path("/Game/Performances"));
        let assembled = assembler
            .assemble(&mut engine, &actor, &animation, 120, "LS_Performance_Fretlyn_007")
            .unwrap();

        assert_eq!(assembled.shot.as_str(), "/Game/Performances/LS_Performance_Fretlyn_007");
        assert_eq!(assembled.playback, FrameRange::new(0, 120));

        for binding in [assembled.actor_binding, assembled.face_binding] {
            let tracks = engine.tracks(&assembled.shot, binding).unwrap();
            assert_eq!(tracks.len(), 2);
            for track in tracks {
                for section in engine.sections(&assembled.shot, track).unwrap() {
                    assert_eq!(
                        engine.section_range(&assembled.shot, section).unwrap(),
                        FrameRange::new(0, 120)
                    );
                }
            }
        }
        assert_eq!(
            engine.facial_track_tag(&assembled.shot, assembled.face_binding).unwrap(),
            Some(assembled.face_animation_track)
        );
    }

    #[test]
    fn test_missing_face_component() {
        let spec = BlueprintSpec::new("BP_Prop").with_component("Body", true);
        let (mut engine, actor, animation) = engine_with_actor(spec);
        let assembler = ShotAssembler::new(path("/Game/Performances"));
        let result = assembler.assemble(&mut engine, &actor, &animation, 24, "LS_Prop");
        match result {
            Err(PipelineError::FaceComponentNotFound(label)) => assert_eq!(label, "BP_Prop"),
            other => panic!("expected missing face, got {:?}", other),
        }
    }

    #[test]
    fn test_face_must_be_skeletal() {
        let spec = BlueprintSpec::new("BP_Bust")
            .with_component("Face", false)
            .with_component("Body", true);
        let (mut engine, actor, animation) = engine_with_actor(spec);
        let assembler = ShotAssembler::new(path("/Game/Performances"));
        assert!(assembler
            .assemble(&mut engine, &actor, &animation, 24, "LS_Bust")
            .is_err());
    }

    #[test]
    fn test_reassembly_replaces_shot() {
        let (mut engine, actor, animation) = engine_with_actor(BlueprintSpec::metahuman("BP_Bernice"));
        let assembler = ShotAssembler::new(path("/Game/Performances"));
        let first = assembler
            .assemble(&mut engine, &actor, &animation, 120, "LS_Performance_Fretlyn_007")
            .unwrap();
        let second = assembler
            .assemble(&mut engine, &actor, &animation, 60, "LS_Performance_Fretlyn_007")
            .unwrap();
        assert_eq!(first.shot, second.shot);
        assert_eq!(engine.bindings(&second.shot).unwrap().len(), 2);
        assert_eq!(engine.playback_range(&second.shot).unwrap(), FrameRange::new(0, 60));
    }
}
