//! Control-rig baking adapter.

use tracing::{debug, info};

use perfseq_engine::{AssetStore, BakeOptions, ControlRigBaker, SequenceEditor, TrackId};
use perfseq_models::AssetPath;

use crate::assembly::AssembledShot;
use crate::config::RebakePolicy;
use crate::error::{PipelineError, PipelineResult};

/// Result of a bake request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BakeOutcome {
    /// New control-rig track on the facial binding
    Baked(TrackId),
    /// Binding was already baked and the policy keeps it
    Skipped,
}

/// Bakes the facial binding of a shot into control-rig curves.
#[derive(Debug, Clone)]
pub struct ControlRigBakingAdapter {
    control_rig: AssetPath,
    options: BakeOptions,
    policy: RebakePolicy,
}

impl ControlRigBakingAdapter {
    pub fn new(control_rig: AssetPath, options: BakeOptions, policy: RebakePolicy) -> Self {
        Self {
            control_rig,
            options,
            policy,
        }
    }

    pub fn policy(&self) -> RebakePolicy {
        self.policy
    }

    /// Bake the facial binding and move the shot's facial tag to the new track.
    pub fn bake<E>(&self, engine: &mut E, shot: &AssembledShot) -> PipelineResult<BakeOutcome>
    where
        E: AssetStore + ControlRigBaker + SequenceEditor + ?Sized,
    {
        if self.policy == RebakePolicy::SkipIfBaked && engine.is_baked(&shot.shot, shot.face_binding)? {
            info!(shot = %shot.shot, "Facial binding already baked, skipping");
            return Ok(BakeOutcome::Skipped);
        }

        if !engine.exists(&self.control_rig) {
            return Err(PipelineError::asset_not_found(self.control_rig.to_string()));
        }
        let class = engine.control_rig_class(&self.control_rig)?;
        debug!(shot = %shot.shot, class = %class.as_str(), "Baking to control rig");

        let track = engine.bake_to_control_rig(&shot.shot, shot.face_binding, &class, &self.options)?;
        engine.tag_facial_track(&shot.shot, shot.face_binding, track)?;
        engine.refresh(&shot.shot)?;

        info!(shot = %shot.shot, track = %track, "Baked facial binding");
        Ok(BakeOutcome::Baked(track))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use perfseq_engine::memory::{BlueprintSpec, ControlRigSpec};
    use perfseq_engine::{EngineWorld, MemoryEngine, TrackKind, Vec3};
    use perfseq_models::ProcessingRange;

    use crate::assembly::ShotAssembler;
    use crate::export::AnimationExporter;
    use crate::performance::PerformanceAssetBuilder;

    fn path(s: &str) -> AssetPath {
        AssetPath::new(s).unwrap()
    }

    const RIG: &str = "/Game/MetaHumans/Common/Face/Face_ControlBoard_CtrlRig";

    fn assembled_shot() -> (MemoryEngine, AssembledShot) {
        let mut engine = MemoryEngine::new();
        engine
            .add_identity(path("/Game/Id"))
            .add_capture_data(path("/Game/Capture/Fretlyn_007"), 48)
            .add_skeleton(path("/Game/Skeleton"))
            .add_control_rig(path(RIG), ControlRigSpec::face_board())
            .add_blueprint(path("/Game/MetaHumans/Bernice/BP_Bernice"), BlueprintSpec::metahuman("BP_Bernice"));

        let location = path("/Game/Performances");
        let performance = PerformanceAssetBuilder::new(location.clone())
            .build(
                &mut engine,
                &path("/Game/Id"),
                &path("/Game/Capture/Fretlyn_007"),
                ProcessingRange::for_take(48),
            )
            .unwrap()
            .into_asset();
        let animation = AnimationExporter::new(path("/Game/Skeleton"))
            .export(&mut engine, &performance, &location)
            .unwrap()
            .into_asset();
        let actor = engine
            .spawn_actor(&path("/Game/MetaHumans/Bernice/BP_Bernice"), Vec3::default())
            .unwrap();
        let shot = ShotAssembler::new(location)
            .assemble(&mut engine, &actor, &animation.path, 48, "LS_Performance_Fretlyn_007")
            .unwrap();
        (engine, shot)
    }

    #[test]
    fn test_bake_retags_facial_track() {
        let (mut engine, shot) = assembled_shot();
        let adapter = ControlRigBakingAdapter::new(path(RIG), BakeOptions::default(), RebakePolicy::Always);

        let track = match adapter.bake(&mut engine, &shot).unwrap() {
            BakeOutcome::Baked(track) => track,
            BakeOutcome::Skipped => panic!("expected a bake"),
        };
        assert_eq!(engine.track_kind(&shot.shot, track).unwrap(), TrackKind::ControlRig);
        assert_eq!(engine.facial_track_tag(&shot.shot, shot.face_binding).unwrap(), Some(track));
        assert_eq!(engine.calls().refreshes, 1);
    }

    #[test]
    fn test_rebake_policy() {
        let (mut engine, shot) = assembled_shot();
        let always = ControlRigBakingAdapter::new(path(RIG), BakeOptions::default(), RebakePolicy::Always);
        always.bake(&mut engine, &shot).unwrap();
        assert!(matches!(always.bake(&mut engine, &shot).unwrap(), BakeOutcome::Baked(_)));
        assert_eq!(engine.calls().bakes, 2);

        let skip = ControlRigBakingAdapter::new(path(RIG), BakeOptions::default(), RebakePolicy::SkipIfBaked);
        assert_eq!(skip.bake(&mut engine, &shot).unwrap(), BakeOutcome::Skipped);
        assert_eq!(engine.calls().bakes, 2);
    }

    #[test]
    fn test_missing_rig_is_asset_not_found() {
        let (mut engine, shot) = assembled_shot();
        let adapter = ControlRigBakingAdapter::new(
            path("/Game/Missing_CtrlRig"),
            BakeOptions::default(),
            RebakePolicy::Always,
        );
        assert!(matches!(
            adapter.bake(&mut engine, &shot),
            Err(PipelineError::AssetNotFound(_))
        ));
        assert_eq!(engine.calls().bakes, 0);
    }
}
