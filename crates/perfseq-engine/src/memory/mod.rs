//! In-memory engine session.
//!
//! Models the asset store, the editor world and shot timelines closely
//! enough to drive the whole pipeline offline: solves, exports and bakes are
//! deterministic, so identical inputs always produce identical keyframes.
//!
//! Failure modes can be injected for tests:
//! - a frame cap that makes long solves report `TooManyFrames`
//! - forced solve outcomes per capture-data asset
//! - channels whose key reads fail

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::debug;

use perfseq_models::{AssetPath, ProcessingRange, SolveOutcome, SolveState};

use crate::error::{EngineError, EngineResult};
use crate::handles::{ActorHandle, AssetClass, AssetRef, ComponentHandle, Vec3};
use crate::store::AssetStore;
use crate::world::EngineWorld;

mod pipeline;
mod timeline;

pub(crate) use timeline::SequenceRecord;

/// Component declared on a blueprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentSpec {
    pub name: String,
    /// Skeletal-mesh component
    pub skeletal: bool,
}

/// Actor blueprint registered in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlueprintSpec {
    /// Label given to spawned actors
    pub label: String,
    pub components: Vec<ComponentSpec>,
}

impl BlueprintSpec {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            components: Vec::new(),
        }
    }

    pub fn with_component(mut self, name: impl Into<String>, skeletal: bool) -> Self {
        self.components.push(ComponentSpec {
            name: name.into(),
            skeletal,
        });
        self
    }

    /// Character blueprint with the usual body-part components.
    pub fn metahuman(label: impl Into<String>) -> Self {
        Self::new(label)
            .with_component("Root", false)
            .with_component("Body", true)
            .with_component("Face", true)
            .with_component("Torso", true)
            .with_component("Legs", true)
            .with_component("Feet", true)
    }
}

/// Control-rig asset registered in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlRigSpec {
    pub class_name: String,
    /// Control names, in channel order
    pub controls: Vec<String>,
}

impl ControlRigSpec {
    pub fn new(class_name: impl Into<String>, controls: Vec<String>) -> Self {
        Self {
            class_name: class_name.into(),
            controls,
        }
    }

    /// Facial control board with a representative set of expression controls.
    pub fn face_board() -> Self {
        let controls = [
            "CTRL_expressions_jawOpen",
            "CTRL_expressions_browRaiseInL",
            "CTRL_expressions_browRaiseInR",
            "CTRL_expressions_eyeBlinkL",
            "CTRL_expressions_eyeBlinkR",
            "CTRL_expressions_mouthCornerPullL",
            "CTRL_expressions_mouthCornerPullR",
            "CTRL_expressions_mouthFunnel",
        ];
        Self::new(
            "Face_ControlBoard_CtrlRig_C",
            controls.iter().map(|c| c.to_string()).collect(),
        )
    }
}

/// Number of calls made into the expensive engine operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub solves: usize,
    pub exports: usize,
    pub bakes: usize,
    pub spawns: usize,
    pub refreshes: usize,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PerformanceRecord {
    pub(crate) identity: Option<AssetPath>,
    pub(crate) capture_data: Option<AssetPath>,
    pub(crate) range: ProcessingRange,
    pub(crate) solve_state: SolveState,
}

#[derive(Debug, Clone)]
pub(crate) struct AnimSequenceRecord {
    pub(crate) source_performance: AssetPath,
    pub(crate) range: perfseq_models::FrameRange,
    pub(crate) seed: u64,
}

#[derive(Debug, Clone)]
pub(crate) enum AssetPayload {
    Empty,
    CaptureData { frames: u32 },
    Performance(PerformanceRecord),
    AnimSequence(AnimSequenceRecord),
    ControlRig(ControlRigSpec),
    Blueprint(BlueprintSpec),
}

#[derive(Debug, Clone)]
pub(crate) struct StoredAsset {
    pub(crate) class: AssetClass,
    pub(crate) payload: AssetPayload,
}

#[derive(Debug, Clone)]
pub(crate) struct ActorRecord {
    pub(crate) label: String,
    pub(crate) location: Vec3,
    pub(crate) components: Vec<ComponentHandle>,
}

#[derive(Debug, Clone)]
pub(crate) struct ComponentRecord {
    pub(crate) name: String,
    pub(crate) owner: ActorHandle,
    pub(crate) skeletal: bool,
}

/// Engine session held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryEngine {
    pub(crate) assets: BTreeMap<AssetPath, StoredAsset>,
    pub(crate) actors: BTreeMap<ActorHandle, ActorRecord>,
    pub(crate) components: BTreeMap<ComponentHandle, ComponentRecord>,
    pub(crate) sequences: BTreeMap<AssetPath, SequenceRecord>,
    frame_cap: Option<u32>,
    forced_outcomes: HashMap<AssetPath, SolveOutcome>,
    pub(crate) unreadable_channels: HashSet<String>,
    current_level: Option<String>,
    pub(crate) calls: CallCounts,
    next_id: u64,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an identity asset.
    pub fn add_identity(&mut self, path: AssetPath) -> &mut Self {
        self.insert_asset(path, AssetClass::Identity, AssetPayload::Empty)
    }

    /// Register ingested capture data with its footage length.
    pub fn add_capture_data(&mut self, path: AssetPath, frames: u32) -> &mut Self {
        self.insert_asset(path, AssetClass::CaptureData, AssetPayload::CaptureData { frames })
    }

    pub fn add_skeleton(&mut self, path: AssetPath) -> &mut Self {
        self.insert_asset(path, AssetClass::Skeleton, AssetPayload::Empty)
    }

    pub fn add_blueprint(&mut self, path: AssetPath, spec: BlueprintSpec) -> &mut Self {
        self.insert_asset(path, AssetClass::ActorBlueprint, AssetPayload::Blueprint(spec))
    }

    pub fn add_control_rig(&mut self, path: AssetPath, spec: ControlRigSpec) -> &mut Self {
        self.insert_asset(path, AssetClass::ControlRig, AssetPayload::ControlRig(spec))
    }

    /// Solves longer than `cap` frames report `TooManyFrames`.
    pub fn set_frame_cap(&mut self, cap: Option<u32>) -> &mut Self {
        self.frame_cap = cap;
        self
    }

    /// Force the solve outcome for performances built from `capture_data`.
    pub fn force_solve_outcome(&mut self, capture_data: AssetPath, outcome: SolveOutcome) -> &mut Self {
        self.forced_outcomes.insert(capture_data, outcome);
        self
    }

    /// Key reads of channels with this raw name fail.
    pub fn mark_channel_unreadable(&mut self, raw_channel: impl Into<String>) -> &mut Self {
        self.unreadable_channels.insert(raw_channel.into());
        self
    }

    pub fn calls(&self) -> CallCounts {
        self.calls
    }

    pub fn current_level(&self) -> Option<&str> {
        self.current_level.as_deref()
    }

    /// Paths of every stored asset of `class`, sorted.
    pub fn assets_of(&self, class: AssetClass) -> Vec<AssetPath> {
        self.assets
            .iter()
            .filter(|(_, asset)| asset.class == class)
            .map(|(path, _)| path.clone())
            .collect()
    }

    /// World location of a spawned actor.
    pub fn actor_location(&self, actor: ActorHandle) -> Option<Vec3> {
        self.actors.get(&actor).map(|a| a.location)
    }

    fn insert_asset(&mut self, path: AssetPath, class: AssetClass, payload: AssetPayload) -> &mut Self {
        debug!(path = %path, class = %class, "Registering asset");
        self.assets.insert(path, StoredAsset { class, payload });
        self
    }

    pub(crate) fn alloc_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub(crate) fn asset(&self, path: &AssetPath) -> EngineResult<&StoredAsset> {
        self.assets
            .get(path)
            .ok_or_else(|| EngineError::not_found(path.to_string()))
    }

    pub(crate) fn asset_of_class(&self, path: &AssetPath, expected: AssetClass) -> EngineResult<&StoredAsset> {
        let asset = self.asset(path)?;
        if asset.class != expected {
            return Err(EngineError::WrongClass {
                path: path.to_string(),
                expected: expected.as_str(),
                actual: asset.class.as_str(),
            });
        }
        Ok(asset)
    }

    pub(crate) fn capture_frames(&self, path: &AssetPath) -> Option<u32> {
        match self.assets.get(path).map(|a| &a.payload) {
            Some(AssetPayload::CaptureData { frames }) => Some(*frames),
            _ => None,
        }
    }

    pub(crate) fn frame_cap(&self) -> Option<u32> {
        self.frame_cap
    }

    pub(crate) fn forced_outcome(&self, capture_data: &AssetPath) -> Option<SolveOutcome> {
        self.forced_outcomes.get(capture_data).copied()
    }
}

impl AssetStore for MemoryEngine {
    fn exists(&self, path: &AssetPath) -> bool {
        self.assets.contains_key(path)
    }

    fn load(&self, path: &AssetPath) -> Option<AssetRef> {
        self.assets
            .get(path)
            .map(|asset| AssetRef::new(path.clone(), asset.class))
    }

    fn create(&mut self, name: &str, location: &AssetPath, class: AssetClass) -> EngineResult<AssetRef> {
        let path = location.join(name);
        if self.assets.contains_key(&path) {
            return Err(EngineError::AssetExists(path.to_string()));
        }

        let payload = match class {
            AssetClass::Performance => AssetPayload::Performance(PerformanceRecord::default()),
            _ => AssetPayload::Empty,
        };
        if class == AssetClass::LevelSequence {
            self.sequences.insert(path.clone(), SequenceRecord::default());
        }
        self.insert_asset(path.clone(), class, payload);
        Ok(AssetRef::new(path, class))
    }
}

impl EngineWorld for MemoryEngine {
    fn open_level(&mut self, level: &str) -> EngineResult<()> {
        debug!(level = %level, "Opening level");
        self.current_level = Some(level.to_string());
        Ok(())
    }

    fn spawn_actor(&mut self, blueprint: &AssetPath, location: Vec3) -> EngineResult<ActorHandle> {
        let spec = match &self.asset_of_class(blueprint, AssetClass::ActorBlueprint)?.payload {
            AssetPayload::Blueprint(spec) => spec.clone(),
            _ => return Err(EngineError::SpawnFailed(format!("{} has no blueprint class", blueprint))),
        };

        self.calls.spawns += 1;
        let actor = ActorHandle(self.alloc_id());
        let mut components = Vec::with_capacity(spec.components.len());
        for component in &spec.components {
            let handle = ComponentHandle(self.alloc_id());
            self.components.insert(
                handle,
                ComponentRecord {
                    name: component.name.clone(),
                    owner: actor,
                    skeletal: component.skeletal,
                },
            );
            components.push(handle);
        }

        debug!(actor = %actor, label = %spec.label, "Spawned actor");
        self.actors.insert(
            actor,
            ActorRecord {
                label: spec.label,
                location,
                components,
            },
        );
        Ok(actor)
    }

    fn actor_label(&self, actor: ActorHandle) -> EngineResult<String> {
        self.actors
            .get(&actor)
            .map(|a| a.label.clone())
            .ok_or_else(|| EngineError::invalid_handle(actor.to_string()))
    }

    fn skeletal_components(&self, actor: ActorHandle) -> EngineResult<Vec<ComponentHandle>> {
        let record = self
            .actors
            .get(&actor)
            .ok_or_else(|| EngineError::invalid_handle(actor.to_string()))?;
        Ok(record
            .components
            .iter()
            .copied()
            .filter(|c| self.components.get(c).map(|r| r.skeletal).unwrap_or(false))
            .collect())
    }

    fn component_name(&self, component: ComponentHandle) -> EngineResult<String> {
        self.components
            .get(&component)
            .map(|c| c.name.clone())
            .ok_or_else(|| EngineError::invalid_handle(component.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> AssetPath {
        AssetPath::new(s).unwrap()
    }

    #[test]
    fn test_create_refuses_existing_path() {
        let mut engine = MemoryEngine::new();
        let location = path("/Game/Performances");
        engine
            .create("Performance_A", &location, AssetClass::Performance)
            .unwrap();
        assert!(engine.exists(&path("/Game/Performances/Performance_A")));
        assert!(matches!(
            engine.create("Performance_A", &location, AssetClass::Performance),
            Err(EngineError::AssetExists(_))
        ));
    }

    #[test]
    fn test_spawn_actor_builds_components() {
        let mut engine = MemoryEngine::new();
        let bp = path("/Game/MetaHumans/Bernice/BP_Bernice");
        engine.add_blueprint(bp.clone(), BlueprintSpec::metahuman("BP_Bernice"));

        let actor = engine.spawn_actor(&bp, Vec3::new(1.0, 2.0, 3.0)).unwrap();
        assert_eq!(engine.actor_label(actor).unwrap(), "BP_Bernice");

        let names: Vec<String> = engine
            .skeletal_components(actor)
            .unwrap()
            .into_iter()
            .map(|c| engine.component_name(c).unwrap())
            .collect();
        assert_eq!(names, vec!["Body", "Face", "Torso", "Legs", "Feet"]);
        assert_eq!(engine.calls().spawns, 1);
    }

    #[test]
    fn test_spawn_requires_blueprint_class() {
        let mut engine = MemoryEngine::new();
        let skeleton = path("/Game/Skel");
        engine.add_skeleton(skeleton.clone());
        assert!(matches!(
            engine.spawn_actor(&skeleton, Vec3::default()),
            Err(EngineError::WrongClass { .. })
        ));
        assert!(matches!(
            engine.spawn_actor(&path("/Game/Missing"), Vec3::default()),
            Err(EngineError::NotFound(_))
        ));
    }
}
