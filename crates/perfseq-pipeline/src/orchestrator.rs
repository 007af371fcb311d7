//! Two-phase batch orchestrator.
//!
//! Phase 1 builds and exports every capture and collects a [`ShotManifest`].
//! Phase 2 only starts once phase 1 has finished for all captures: it opens
//! the level, spawns the character once, and assembles, bakes and extracts
//! one shot per manifest entry against that same actor.
//!
//! Errors local to one capture or shot are logged, recorded in the
//! [`BatchReport`] and the loop moves on. Anything else ends the run.

use chrono::Utc;
use tracing::info;

use perfseq_engine::{ActorHandle, EngineSession, EngineWorld, SequenceEditor};
use perfseq_models::{CaptureRecord, ProcessingRange, RunId, ShotManifest, ShotManifestEntry};

use crate::assembly::ShotAssembler;
use crate::bake::{BakeOutcome, ControlRigBakingAdapter};
use crate::catalog::CaptureCatalog;
use crate::config::{PipelineConfig, StorePaths};
use crate::error::PipelineResult;
use crate::export::AnimationExporter;
use crate::extract::{extract_shot, ExtractOutcome, FaceAnimWriter};
use crate::logging::{run_span, CaptureLogger};
use crate::performance::PerformanceAssetBuilder;
use crate::report::{BatchReport, ShotSummary, Stage};

/// Runs the whole batch against one engine session.
#[derive(Debug, Clone)]
pub struct BatchOrchestrator {
    config: PipelineConfig,
    paths: StorePaths,
    run_id: RunId,
}

impl BatchOrchestrator {
    /// Create an orchestrator; fails if the configuration is invalid.
    pub fn new(config: PipelineConfig) -> PipelineResult<Self> {
        config.validate()?;
        let paths = config.store_paths()?;
        Ok(Self {
            config,
            paths,
            run_id: RunId::new(),
        })
    }

    pub fn with_run_id(mut self, run_id: RunId) -> Self {
        self.run_id = run_id;
        self
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Catalog over the configured raw-data folder and index window.
    pub fn catalog(&self) -> CaptureCatalog {
        CaptureCatalog::new(&self.config.raw_data_path, self.config.anim_range())
    }

    /// Discover captures on disk and run both phases.
    pub fn run<E>(&self, engine: &mut E) -> PipelineResult<BatchReport>
    where
        E: EngineSession + ?Sized,
    {
        let captures = self.catalog().discover()?;
        self.run_with_captures(engine, captures)
    }

    /// Run both phases over already discovered captures.
    pub fn run_with_captures<E>(&self, engine: &mut E, captures: Vec<CaptureRecord>) -> PipelineResult<BatchReport>
    where
        E: EngineSession + ?Sized,
    {
        let span = run_span(&self.run_id);
        let _guard = span.enter();

        let mut report = BatchReport::new(self.run_id.clone());
        report.captures_discovered = captures.len();
        info!(captures = captures.len(), "Starting batch");

        let manifest = self.build_manifest(engine, &captures, &mut report)?;
        info!(entries = manifest.len(), "The performance process is done");

        self.process_shots(engine, &manifest, &mut report)?;

        report.finish();
        report.log_summary();
        Ok(report)
    }

    /// Phase 1: build and export every capture.
    pub fn build_manifest<E>(
        &self,
        engine: &mut E,
        captures: &[CaptureRecord],
        report: &mut BatchReport,
    ) -> PipelineResult<ShotManifest>
    where
        E: EngineSession + ?Sized,
    {
        let builder = PerformanceAssetBuilder::new(self.paths.performances.clone());
        let exporter = AnimationExporter::new(self.paths.target_skeleton.clone());
        let mut entries = Vec::with_capacity(captures.len());

        for capture in captures {
            let logger = CaptureLogger::new(capture.folder_name.as_str(), Stage::Build);
            let capture_data = self
                .paths
                .capture_data(self.config.capture_prefix(), &capture.suffix);
            logger.started(&format!("{} frames from {}", capture.frame_count, capture_data));

            let built = match builder.build(
                engine,
                &self.paths.identity,
                &capture_data,
                ProcessingRange::for_take(capture.frame_count),
            ) {
                Ok(built) => built,
                Err(e) if e.is_item_local() => {
                    logger.record_failure(report, &e);
                    continue;
                }
                Err(e) => return Err(e),
            };
            if built.is_reused() {
                report.performances_reused += 1;
            } else {
                report.performances_built += 1;
            }
            let performance = built.into_asset();
            logger.completed(&format!("performance {}", performance.path));
            let logger = logger.at(Stage::Export);

            let exported = match exporter.export(engine, &performance, &self.paths.performances) {
                Ok(exported) => exported,
                Err(e) if e.is_item_local() => {
                    logger.record_failure(report, &e);
                    continue;
                }
                Err(e) => return Err(e),
            };
            if exported.is_reused() {
                report.animations_reused += 1;
            } else {
                report.animations_exported += 1;
            }
            let animation_sequence = exported.into_asset();
            logger.completed(&format!("animation sequence {}", animation_sequence.path));

            entries.push(ShotManifestEntry {
                capture: capture.clone(),
                identity: self.paths.identity.clone(),
                capture_data,
                performance,
                animation_sequence,
                target_metahuman: self.paths.target_metahuman.clone(),
                output_path: self.config.output_path.clone(),
            });
        }

        Ok(ShotManifest::new(entries))
    }

    /// Phase 2: one shot per manifest entry, all driven on one actor.
    pub fn process_shots<E>(
        &self,
        engine: &mut E,
        manifest: &ShotManifest,
        report: &mut BatchReport,
    ) -> PipelineResult<()>
    where
        E: EngineSession + ?Sized,
    {
        if manifest.is_empty() {
            info!("No shots to assemble");
            return Ok(());
        }

        engine.open_level(&self.config.level)?;
        let actor = engine.spawn_actor(&self.paths.actor_blueprint, self.config.spawn_location)?;
        info!(actor = %actor, blueprint = %self.paths.actor_blueprint, "Spawned shot actor");

        for entry in manifest {
            let shot_name = entry.shot_name();
            let logger = CaptureLogger::new(shot_name.as_str(), Stage::Shot);
            let span = logger.span();

            let result = span.in_scope(|| self.process_shot(engine, &actor, entry, &logger));
            match result {
                Ok(ExtractOutcome::Written { path, document }) => {
                    logger.completed(&format!("wrote {}", path.display()));
                    report.shots_written.push(ShotSummary {
                        shot: shot_name,
                        path,
                        characters: document.characters().to_vec(),
                        controls: document.len(),
                        keys: document.key_count(),
                        channel_failures: document.failures().to_vec(),
                    });
                }
                Ok(ExtractOutcome::Skipped) => {
                    logger.skipped("no facial binding, nothing written");
                    report.shots_skipped.push(shot_name);
                }
                Err(e) if e.is_item_local() => logger.record_failure(report, &e),
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn process_shot<E>(
        &self,
        engine: &mut E,
        actor: &ActorHandle,
        entry: &ShotManifestEntry,
        logger: &CaptureLogger,
    ) -> PipelineResult<ExtractOutcome>
    where
        E: EngineSession + ?Sized,
    {
        let assembler = ShotAssembler::new(self.paths.performances.clone());
        let baker = ControlRigBakingAdapter::new(
            self.paths.control_rig.clone(),
            self.config.bake,
            self.config.rebake,
        );
        let writer = FaceAnimWriter::new(&entry.output_path, self.config.output_format);

        logger.started(&format!("{} frames", entry.frame_count()));
        let shot = assembler.assemble(
            engine,
            actor,
            &entry.animation_sequence.path,
            entry.frame_count(),
            &entry.shot_name(),
        )?;

        if let BakeOutcome::Skipped = baker.bake(engine, &shot)? {
            logger.progress("kept existing control-rig bake");
        }

        let outcome = extract_shot(engine, &shot.shot, &writer, Utc::now())?;
        engine.refresh(&shot.shot)?;
        Ok(outcome)
    }
}
