//! Opaque handles and small value types shared by the engine traits.

use serde::{Deserialize, Serialize};
use std::fmt;

use perfseq_models::AssetPath;

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "#{}"), self.0)
            }
        }
    };
}

handle!(
    /// Actor spawned in the editor world.
    ActorHandle,
    "actor"
);
handle!(
    /// Component owned by an actor.
    ComponentHandle,
    "component"
);
handle!(
    /// Binding (possessable) inside a shot.
    BindingId,
    "binding"
);
handle!(TrackId, "track");
handle!(SectionId, "section");
handle!(ChannelId, "channel");

/// World-space location.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Asset classes the pipeline reads or creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    Identity,
    CaptureData,
    Performance,
    AnimSequence,
    LevelSequence,
    Skeleton,
    ControlRig,
    ActorBlueprint,
}

impl AssetClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetClass::Identity => "identity",
            AssetClass::CaptureData => "capture_data",
            AssetClass::Performance => "performance",
            AssetClass::AnimSequence => "anim_sequence",
            AssetClass::LevelSequence => "level_sequence",
            AssetClass::Skeleton => "skeleton",
            AssetClass::ControlRig => "control_rig",
            AssetClass::ActorBlueprint => "actor_blueprint",
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to a loaded store asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetRef {
    pub path: AssetPath,
    pub class: AssetClass,
}

impl AssetRef {
    pub fn new(path: AssetPath, class: AssetClass) -> Self {
        Self { path, class }
    }

    pub fn name(&self) -> &str {
        self.path.name()
    }
}

/// Scene object a shot can possess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneObject {
    Actor(ActorHandle),
    Component(ComponentHandle),
}

/// What a binding resolves to in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundObject {
    Actor(ActorHandle),
    Component(ComponentHandle),
    /// Nothing in the world matches the binding
    Unresolved,
}

impl BoundObject {
    pub fn as_actor(&self) -> Option<ActorHandle> {
        match self {
            BoundObject::Actor(actor) => Some(*actor),
            _ => None,
        }
    }
}

/// Track types used on shot bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
    Transform,
    SkeletalAnimation,
    ControlRig,
}

impl TrackKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackKind::Transform => "transform",
            TrackKind::SkeletalAnimation => "skeletal_animation",
            TrackKind::ControlRig => "control_rig",
        }
    }
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
