//! Asset store collaborator.

use perfseq_models::AssetPath;

use crate::error::EngineResult;
use crate::handles::{AssetClass, AssetRef};

/// Virtual asset store of the engine.
pub trait AssetStore {
    /// True if an asset exists at `path`.
    fn exists(&self, path: &AssetPath) -> bool;

    /// Load the asset at `path`, `None` if nothing is stored there.
    fn load(&self, path: &AssetPath) -> Option<AssetRef>;

    /// Create a new, empty asset of `class` at `location/name`.
    ///
    /// Fails with [`EngineError::AssetExists`](crate::EngineError::AssetExists)
    /// if the path is taken.
    fn create(&mut self, name: &str, location: &AssetPath, class: AssetClass) -> EngineResult<AssetRef>;
}
