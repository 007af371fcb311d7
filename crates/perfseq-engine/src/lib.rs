//! Engine collaborators for the performance-to-sequence pipeline.
//!
//! The asset-authoring engine is external to this workspace. Each capability
//! the pipeline needs from it is a trait:
//! - [`AssetStore`]: existence checks, loads and creation of store assets
//! - [`PerformanceSolver`]: performance setup and the blocking solve
//! - [`AnimationExportBackend`]: performance -> animation sequence export
//! - [`EngineWorld`]: level, actor spawning and actor components
//! - [`SequenceEditor`]: shots, possessables, tracks, sections, channels
//! - [`ControlRigBaker`]: control-rig baking of a binding
//!
//! [`memory::MemoryEngine`] implements all of them in memory and is used for
//! offline runs and tests.

pub mod error;
pub mod export;
pub mod handles;
pub mod memory;
pub mod rig;
pub mod sequence;
pub mod session;
pub mod solver;
pub mod store;
pub mod world;

pub use error::{EngineError, EngineResult};
pub use export::{AnimationExportBackend, ExportOptions, ExportRange};
pub use handles::{
    ActorHandle, AssetClass, AssetRef, BindingId, BoundObject, ChannelId, ComponentHandle,
    SceneObject, SectionId, TrackId, TrackKind, Vec3,
};
pub use memory::MemoryEngine;
pub use rig::{BakeOptions, ControlRigBaker, ControlRigClass};
pub use sequence::{ChannelInfo, Possessable, SequenceEditor};
pub use session::EngineSession;
pub use solver::{PerformanceSetup, PerformanceSolver};
pub use store::AssetStore;
pub use world::EngineWorld;
