//! Control-rig baking collaborator.

use perfseq_models::AssetPath;

use crate::error::EngineResult;
use crate::handles::{BindingId, TrackId};

/// Generated class of a control-rig asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ControlRigClass(pub String);

impl ControlRigClass {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Curve options for a bake.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BakeOptions {
    /// Key-reduction tolerance; only used when `reduce_keys` is set
    pub tolerance: f64,
    /// Simplify curves after baking
    pub reduce_keys: bool,
}

impl Default for BakeOptions {
    fn default() -> Self {
        Self {
            tolerance: 0.01,
            reduce_keys: false,
        }
    }
}

/// Converts a binding's animation into control-rig curves.
pub trait ControlRigBaker {
    /// Resolve the generated class of a control-rig asset.
    fn control_rig_class(&self, rig_asset: &AssetPath) -> EngineResult<ControlRigClass>;

    /// Bake `binding` of `shot` to control-rig space.
    ///
    /// Returns the control-rig track created on the binding. An existing
    /// bake on the binding is replaced.
    fn bake_to_control_rig(
        &mut self,
        shot: &AssetPath,
        binding: BindingId,
        class: &ControlRigClass,
        options: &BakeOptions,
    ) -> EngineResult<TrackId>;

    /// True if `binding` already carries control-rig curves.
    fn is_baked(&self, shot: &AssetPath, binding: BindingId) -> EngineResult<bool>;
}
