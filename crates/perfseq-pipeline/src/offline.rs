//! Offline engine session.
//!
//! Seeds a [`MemoryEngine`] with every asset a batch expects to find in the
//! store, so the pipeline can run end to end without an editor attached.
//! Its keyframes are synthetic; the session is only opened when offline mode
//! is switched on.

use tracing::{debug, warn};

use perfseq_engine::memory::{BlueprintSpec, ControlRigSpec};
use perfseq_engine::{AssetStore, MemoryEngine};
use perfseq_models::CaptureRecord;

use crate::config::{PipelineConfig, StorePaths};
use crate::error::{PipelineError, PipelineResult};

/// Build an in-memory session holding the identity, one capture-data asset
/// per capture, the export skeleton, the face control rig and the actor
/// blueprint.
pub fn seed_engine(config: &PipelineConfig, paths: &StorePaths, captures: &[CaptureRecord]) -> MemoryEngine {
    let mut engine = MemoryEngine::new();
    engine
        .add_identity(paths.identity.clone())
        .add_skeleton(paths.target_skeleton.clone())
        .add_control_rig(paths.control_rig.clone(), ControlRigSpec::face_board())
        .add_blueprint(
            paths.actor_blueprint.clone(),
            BlueprintSpec::metahuman(paths.actor_blueprint.name()),
        );

    for capture in captures {
        let capture_data = paths.capture_data(config.capture_prefix(), &capture.suffix);
        if !engine.exists(&capture_data) {
            engine.add_capture_data(capture_data, capture.frame_count);
        }
    }
    debug!(captures = captures.len(), "Seeded offline engine session");
    engine
}

/// Open the engine session for a batch.
///
/// No engine bridge is linked into this binary, so unless `config.offline` is
/// set this fails with [`PipelineError::NoEngineSession`].
pub fn open_session(
    config: &PipelineConfig,
    paths: &StorePaths,
    captures: &[CaptureRecord],
) -> PipelineResult<MemoryEngine> {
    if !config.offline {
        return Err(PipelineError::NoEngineSession);
    }
    warn!(
        output_path = %config.output_path.display(),
        "Offline mode: face documents will hold synthetic keyframes"
    );
    Ok(seed_engine(config, paths, captures))
}
