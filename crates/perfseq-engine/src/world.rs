//! Editor world collaborator.

use perfseq_models::AssetPath;

use crate::error::EngineResult;
use crate::handles::{ActorHandle, ComponentHandle, Vec3};

/// Editor world: level, actors, components.
pub trait EngineWorld {
    fn open_level(&mut self, level: &str) -> EngineResult<()>;

    /// Spawn an actor from a blueprint class asset.
    fn spawn_actor(&mut self, blueprint: &AssetPath, location: Vec3) -> EngineResult<ActorHandle>;

    /// Display label of an actor (`BP_Bernice`).
    fn actor_label(&self, actor: ActorHandle) -> EngineResult<String>;

    /// Skeletal-mesh components of an actor, in component order.
    fn skeletal_components(&self, actor: ActorHandle) -> EngineResult<Vec<ComponentHandle>>;

    fn component_name(&self, component: ComponentHandle) -> EngineResult<String>;
}
