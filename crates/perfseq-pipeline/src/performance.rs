//! Performance asset builder.
//!
//! # Idempotency
//!
//! The asset name is derived from the capture data (`Performance_{capture}`):
//! 1. If the asset already exists at the store location, load and return it
//! 2. Otherwise create it, bind identity, capture data and range
//! 3. Run the solve pipeline in blocking mode
//!
//! An existing asset is never solved again.

use tracing::{debug, info, warn};

use perfseq_engine::{AssetClass, AssetStore, EngineError, PerformanceSetup, PerformanceSolver};
use perfseq_models::{naming, AssetPath, PerformanceAsset, ProcessingRange, SolveOutcome};

use crate::error::{PipelineError, PipelineResult};

/// Result of building a performance.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildOutcome {
    /// Created and solved during this run
    Built(PerformanceAsset),
    /// Found in the store, solve skipped
    Reused(PerformanceAsset),
}

impl BuildOutcome {
    pub fn asset(&self) -> &PerformanceAsset {
        match self {
            BuildOutcome::Built(asset) | BuildOutcome::Reused(asset) => asset,
        }
    }

    pub fn into_asset(self) -> PerformanceAsset {
        match self {
            BuildOutcome::Built(asset) | BuildOutcome::Reused(asset) => asset,
        }
    }

    pub fn is_reused(&self) -> bool {
        matches!(self, BuildOutcome::Reused(_))
    }
}

/// Creates (or loads) one performance asset per capture.
#[derive(Debug, Clone)]
pub struct PerformanceAssetBuilder {
    location: AssetPath,
}

impl PerformanceAssetBuilder {
    /// Builder storing performances under `location`.
    pub fn new(location: AssetPath) -> Self {
        Self { location }
    }

    pub fn location(&self) -> &AssetPath {
        &self.location
    }

    /// Store path the performance for `capture_data` gets.
    pub fn performance_path(&self, capture_data: &AssetPath) -> AssetPath {
        self.location
            .join(&naming::performance_asset_name(capture_data.name()))
    }

    /// Build the performance for one capture.
    ///
    /// Range bounds left as `None` keep the engine default.
    pub fn build<E>(
        &self,
        engine: &mut E,
        identity: &AssetPath,
        capture_data: &AssetPath,
        range: ProcessingRange,
    ) -> PipelineResult<BuildOutcome>
    where
        E: AssetStore + PerformanceSolver + ?Sized,
    {
        let name = naming::performance_asset_name(capture_data.name());
        let path = self.location.join(&name);

        if engine.exists(&path) {
            info!(performance = %path, "Performance asset already exists");
            let asset = engine.describe_performance(&path)?;
            return Ok(BuildOutcome::Reused(asset));
        }

        debug!(identity = %identity, capture_data = %capture_data, "Loading solve inputs");
        if engine.load(capture_data).is_none() {
            return Err(PipelineError::asset_not_found(capture_data.to_string()));
        }
        if engine.load(identity).is_none() {
            return Err(PipelineError::asset_not_found(identity.to_string()));
        }

        engine.create(&name, &self.location, AssetClass::Performance)?;
        let setup = PerformanceSetup {
            identity: identity.clone(),
            capture_data: capture_data.clone(),
            range,
        };
        engine.configure_performance(&path, &setup).map_err(|e| match e {
            EngineError::NotFound(missing) => PipelineError::AssetNotFound(missing),
            other => PipelineError::Engine(other),
        })?;

        info!(performance = %path, "Starting performance pipeline");
        match engine.solve_blocking(&path) {
            SolveOutcome::Success => {
                info!(performance = %path, "Finished performance pipeline");
                Ok(BuildOutcome::Built(engine.describe_performance(&path)?))
            }
            outcome => {
                warn!(performance = %path, outcome = %outcome, "Performance pipeline did not succeed");
                Err(PipelineError::Solve {
                    performance: name,
                    outcome,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;
    use mockall::predicate::eq;
    use perfseq_engine::{AssetRef, EngineResult, MemoryEngine};
    use perfseq_models::SolveState;

    mock! {
        pub Engine {}

        impl AssetStore for Engine {
            fn exists(&self, path: &AssetPath) -> bool;
            fn load(&self, path: &AssetPath) -> Option<AssetRef>;
            fn create(&mut self, name: &str, location: &AssetPath, class: AssetClass) -> EngineResult<AssetRef>;
        }

        impl PerformanceSolver for Engine {
            fn configure_performance(&mut self, performance: &AssetPath, setup: &PerformanceSetup) -> EngineResult<()>;
            fn describe_performance(&self, performance: &AssetPath) -> EngineResult<PerformanceAsset>;
            fn solve_blocking(&mut self, performance: &AssetPath) -> SolveOutcome;
        }
    }

    fn path(s: &str) -> AssetPath {
        AssetPath::new(s).unwrap()
    }

    fn existing_asset() -> PerformanceAsset {
        PerformanceAsset {
            path: path("/Game/Performances/Performance_Fretlyn_007"),
            identity: path("/Game/FacialCapture/Fretlyn"),
            capture_data: path("/Game/FacialCapture/Ingested/Fretlyn_007"),
            range: ProcessingRange::for_take(120),
            solve_state: SolveState::Solved,
        }
    }

    #[test]
    fn test_existing_performance_is_not_solved_again() {
        let mut engine = MockEngine::new();
        engine
            .expect_exists()
            .with(eq(path("/Game/Performances/Performance_Fretlyn_007")))
            .times(1)
            .return_const(true);
        engine
            .expect_describe_performance()
            .times(1)
            .returning(|_| Ok(existing_asset()));
        engine.expect_create().never();
        engine.expect_configure_performance().never();
        engine.expect_solve_blocking().never();

        let builder = PerformanceAssetBuilder::new(path("/Game/Performances"));
        let outcome = builder
            .build(
                &mut engine,
                &path("/Game/FacialCapture/Fretlyn"),
                &path("/Game/FacialCapture/Ingested/Fretlyn_007"),
                ProcessingRange::for_take(120),
            )
            .unwrap();

        assert!(outcome.is_reused());
        assert_eq!(outcome.asset(), &existing_asset());
    }

    #[test]
    fn test_missing_capture_data_is_asset_not_found() {
        let mut engine = MockEngine::new();
        engine.expect_exists().return_const(false);
        engine.expect_load().returning(|_| None);
        engine.expect_create().never();
        engine.expect_solve_blocking().never();

        let builder = PerformanceAssetBuilder::new(path("/Game/Performances"));
        let result = builder.build(
            &mut engine,
            &path("/Game/FacialCapture/Fretlyn"),
            &path("/Game/FacialCapture/Ingested/Fretlyn_042"),
            ProcessingRange::default(),
        );
        match result {
            Err(PipelineError::AssetNotFound(missing)) => {
                assert_eq!(missing, "/Game/FacialCapture/Ingested/Fretlyn_042");
            }
            other => panic!("expected asset not found, got {:?}", other),
        }
    }

    #[test]
    fn test_build_solves_once_and_reuses() {
        let mut engine = MemoryEngine::new();
        engine
            .add_identity(path("/Game/FacialCapture/Fretlyn"))
            .add_capture_data(path("/Game/FacialCapture/Ingested/Fretlyn_007"), 120);
        let builder = PerformanceAssetBuilder::new(path("/Game/Performances"));
        let identity = path("/Game/FacialCapture/Fretlyn");
        let capture = path("/Game/FacialCapture/Ingested/Fretlyn_007");

        let first = builder
            .build(&mut engine, &identity, &capture, ProcessingRange::for_take(120))
            .unwrap();
        assert!(!first.is_reused());
        assert_eq!(first.asset().name(), "Performance_Fretlyn_007");
        assert_eq!(first.asset().range, ProcessingRange::new(Some(0), Some(120)));
        assert!(first.asset().solve_state.is_solved());

        let second = builder
            .build(&mut engine, &identity, &capture, ProcessingRange::for_take(120))
            .unwrap();
        assert!(second.is_reused());
        assert_eq!(second.into_asset(), first.into_asset());
        assert_eq!(engine.calls().solves, 1);
    }

    #[test]
    fn test_unset_bounds_keep_engine_default() {
        let mut engine = MemoryEngine::new();
        engine
            .add_identity(path("/Game/Id"))
            .add_capture_data(path("/Game/Capture_001"), 64);
        let builder = PerformanceAssetBuilder::new(path("/Game/Performances"));
        let outcome = builder
            .build(
                &mut engine,
                &path("/Game/Id"),
                &path("/Game/Capture_001"),
                ProcessingRange::from_sentinel(-1, 32),
            )
            .unwrap();
        assert_eq!(outcome.asset().range, ProcessingRange::new(None, Some(32)));
    }

    #[test]
    fn test_failed_solve_is_reported() {
        let mut engine = MemoryEngine::new();
        engine
            .add_identity(path("/Game/Id"))
            .add_capture_data(path("/Game/Capture_001"), 5000)
            .set_frame_cap(Some(1000));
        let builder = PerformanceAssetBuilder::new(path("/Game/Performances"));
        let result = builder.build(
            &mut engine,
            &path("/Game/Id"),
            &path("/Game/Capture_001"),
            ProcessingRange::for_take(5000),
        );
        assert!(matches!(
            result,
            Err(PipelineError::Solve {
                outcome: SolveOutcome::TooManyFrames,
                ..
            })
        ));
        // The asset stays in the store, unsolved.
        let stored = engine
            .describe_performance(&path("/Game/Performances/Performance_Capture_001"))
            .unwrap();
        assert_eq!(stored.solve_state, SolveState::Failed(SolveOutcome::TooManyFrames));
    }
}
