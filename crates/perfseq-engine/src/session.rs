//! Full engine session.

use crate::export::AnimationExportBackend;
use crate::rig::ControlRigBaker;
use crate::sequence::SequenceEditor;
use crate::solver::PerformanceSolver;
use crate::store::AssetStore;
use crate::world::EngineWorld;

/// Every capability the pipeline drives, on one session object.
pub trait EngineSession:
    AssetStore + PerformanceSolver + AnimationExportBackend + EngineWorld + SequenceEditor + ControlRigBaker
{
}

impl<T> EngineSession for T where
    T: AssetStore + PerformanceSolver + AnimationExportBackend + EngineWorld + SequenceEditor + ControlRigBaker
{
}
