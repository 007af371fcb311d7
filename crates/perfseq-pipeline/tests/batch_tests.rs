//! End-to-end batch tests against the in-memory engine.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use tempfile::TempDir;

use perfseq_engine::memory::BlueprintSpec;
use perfseq_engine::{AssetClass, AssetStore, MemoryEngine, PerformanceSetup, PerformanceSolver, SequenceEditor};
use perfseq_models::{AssetPath, FrameRange, OutputFormat, ProcessingRange, SolveOutcome};
use perfseq_pipeline::offline::seed_engine;
use perfseq_pipeline::{BatchOrchestrator, PipelineConfig, PipelineError, Stage};

fn path(s: &str) -> AssetPath {
    AssetPath::new(s).unwrap()
}

fn add_capture(root: &Path, folder: &str, frames: u32) {
    let dir = root.join(folder);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("take.json"), format!(r#"{{"frames": {}}}"#, frames)).unwrap();
}

struct Fixture {
    raw: TempDir,
    out: TempDir,
}

impl Fixture {
    fn new(captures: &[(&str, u32)]) -> Self {
        let raw = TempDir::new().unwrap();
        for (folder, frames) in captures {
            add_capture(raw.path(), folder, *frames);
        }
        Self {
            raw,
            out: TempDir::new().unwrap(),
        }
    }

    fn config(&self) -> PipelineConfig {
        PipelineConfig {
            raw_data_path: self.raw.path().to_path_buf(),
            output_path: self.out.path().join("faces"),
            ..Default::default()
        }
    }

    fn orchestrator(&self) -> BatchOrchestrator {
        BatchOrchestrator::new(self.config()).unwrap()
    }

    fn seeded_engine(&self, orchestrator: &BatchOrchestrator) -> MemoryEngine {
        let captures = orchestrator.catalog().discover().unwrap();
        seed_engine(orchestrator.config(), orchestrator.paths(), &captures)
    }

    fn document(&self, shot: &str) -> IndexMap<String, Vec<(f64, i64)>> {
        let file = self.out.path().join("faces").join(format!("{}_face_anim.json", shot));
        serde_json::from_str(&fs::read_to_string(file).unwrap()).unwrap()
    }
}

#[test]
fn test_take_007_end_to_end() {
    let fixture = Fixture::new(&[("take_007", 120)]);
    let orchestrator = fixture.orchestrator();
    let mut engine = fixture.seeded_engine(&orchestrator);

    let report = orchestrator.run(&mut engine).unwrap();
    assert!(!report.has_failures());
    assert_eq!(report.performances_built, 1);
    assert_eq!(report.animations_exported, 1);

    let performance = engine
        .describe_performance(&path("/Game/Performances/Performance_Fretlyn_007"))
        .unwrap();
    assert_eq!(
        performance.capture_data.as_str(),
        "/Game/FacialCapture/Fretlyn_CaptureSource_Ingested/Fretlyn_007"
    );
    assert_eq!(performance.range, ProcessingRange::new(Some(0), Some(120)));
    assert!(engine
        .assets_of(AssetClass::AnimSequence)
        .contains(&path("/Game/Performances/AS_Performance_Fretlyn_007")));

    let shot = path("/Game/Performances/LS_Performance_Fretlyn_007");
    assert_eq!(engine.playback_range(&shot).unwrap(), FrameRange::new(0, 120));

    let document = fixture.document("LS_Performance_Fretlyn_007");
    let (_, keys) = document
        .iter()
        .find(|(_, keys)| !keys.is_empty())
        .expect("at least one control with keys");
    assert!(keys.iter().all(|(_, frame)| (0..=120).contains(frame)));
    assert!(document.contains_key("CTRL_expressions_jawOpen"));

    assert_eq!(report.shots_written.len(), 1);
    assert_eq!(report.shots_written[0].characters, vec!["bernice".to_string()]);
    assert_eq!(engine.current_level(), Some("Untitled"));
}

#[test]
fn test_every_section_spans_the_take() {
    let fixture = Fixture::new(&[("take_001", 48), ("take_002", 96)]);
    let orchestrator = fixture.orchestrator();
    let mut engine = fixture.seeded_engine(&orchestrator);
    orchestrator.run(&mut engine).unwrap();

    for (name, frames) in [("LS_Performance_Fretlyn_001", 48), ("LS_Performance_Fretlyn_002", 96)] {
        let shot = path("/Game/Performances").join(name);
        let bindings = engine.bindings(&shot).unwrap();
        assert_eq!(bindings.len(), 2);
        for binding in bindings {
            for track in engine.tracks(&shot, binding).unwrap() {
                for section in engine.sections(&shot, track).unwrap() {
                    assert_eq!(
                        engine.section_range(&shot, section).unwrap(),
                        FrameRange::new(0, frames)
                    );
                }
            }
        }
    }
    // One actor serves every shot.
    assert_eq!(engine.calls().spawns, 1);
}

#[test]
fn test_rerun_reuses_assets_and_rewrites_documents() {
    let fixture = Fixture::new(&[("take_007", 60)]);
    let orchestrator = fixture.orchestrator();
    let mut engine = fixture.seeded_engine(&orchestrator);

    orchestrator.run(&mut engine).unwrap();
    let first = fixture.document("LS_Performance_Fretlyn_007");

    let report = orchestrator.run(&mut engine).unwrap();
    assert_eq!(report.performances_built, 0);
    assert_eq!(report.performances_reused, 1);
    assert_eq!(report.animations_reused, 1);
    assert_eq!(report.shots_written.len(), 1);
    assert_eq!(engine.calls().solves, 1);
    assert_eq!(engine.calls().exports, 1);
    assert_eq!(engine.calls().bakes, 2);

    assert_eq!(fixture.document("LS_Performance_Fretlyn_007"), first);
}

#[test]
fn test_item_failures_do_not_stop_the_batch() {
    let fixture = Fixture::new(&[("take_001", 48), ("take_002", 48), ("take_003", 48)]);
    let orchestrator = fixture.orchestrator();
    let captures = orchestrator.catalog().discover().unwrap();

    // take_003 has no ingested capture data; take_002 fails to solve.
    let mut engine = seed_engine(orchestrator.config(), orchestrator.paths(), &captures[..2]);
    engine.force_solve_outcome(
        orchestrator.paths().capture_data("Fretlyn", "002"),
        SolveOutcome::UnknownError,
    );

    let report = orchestrator.run_with_captures(&mut engine, captures).unwrap();
    assert_eq!(report.shots_written.len(), 1);
    assert_eq!(report.shots_written[0].shot, "LS_Performance_Fretlyn_001");

    let failed: Vec<&str> = report.failures_in(Stage::Build).map(|f| f.item.as_str()).collect();
    assert_eq!(failed, vec!["take_002", "take_003"]);
    assert!(report.failures[1].error.contains("Fretlyn_003"));
}

#[test]
fn test_export_failure_skips_only_that_capture() {
    let fixture = Fixture::new(&[("take_001", 24), ("take_002", 24)]);
    let orchestrator = fixture.orchestrator();
    let mut engine = fixture.seeded_engine(&orchestrator);

    // A performance left unsolved by an earlier run is reused but cannot be exported.
    let paths = orchestrator.paths().clone();
    let stale = engine
        .create("Performance_Fretlyn_001", &paths.performances, AssetClass::Performance)
        .unwrap();
    engine
        .configure_performance(
            &stale.path,
            &PerformanceSetup {
                identity: paths.identity.clone(),
                capture_data: paths.capture_data("Fretlyn", "001"),
                range: ProcessingRange::for_take(24),
            },
        )
        .unwrap();

    let report = orchestrator.run(&mut engine).unwrap();
    assert_eq!(report.performances_reused, 1);
    assert_eq!(report.performances_built, 1);
    let failed: Vec<&str> = report.failures_in(Stage::Export).map(|f| f.item.as_str()).collect();
    assert_eq!(failed, vec!["take_001"]);

    assert_eq!(report.shots_written.len(), 1);
    assert_eq!(report.shots_written[0].shot, "LS_Performance_Fretlyn_002");
    assert!(!fixture.document("LS_Performance_Fretlyn_002").is_empty());
}

#[test]
fn test_missing_identity_fails_each_capture() {
    let fixture = Fixture::new(&[("take_001", 24), ("take_002", 24)]);
    let seeded = fixture.orchestrator();
    let mut engine = fixture.seeded_engine(&seeded);

    // Capture data is still addressed with the seeded prefix.
    let config = PipelineConfig {
        identity: "Vasilisa".to_string(),
        capture_prefix: Some("Fretlyn".to_string()),
        ..fixture.config()
    };
    let orchestrator = BatchOrchestrator::new(config).unwrap();

    let report = orchestrator.run(&mut engine).unwrap();
    assert_eq!(report.failures_in(Stage::Build).count(), 2);
    assert!(report.failures.iter().all(|f| f.error.contains("/Game/FacialCapture/Vasilisa")));
    assert!(report.shots_written.is_empty());
    assert_eq!(engine.calls().solves, 0);
    assert_eq!(engine.calls().spawns, 0);
}

#[test]
fn test_unwritable_document_does_not_stop_later_shots() {
    let fixture = Fixture::new(&[("take_001", 24), ("take_002", 24)]);
    let orchestrator = fixture.orchestrator();
    let mut engine = fixture.seeded_engine(&orchestrator);

    // A directory squatting on the first shot's file name.
    let blocked = fixture
        .out
        .path()
        .join("faces")
        .join("LS_Performance_Fretlyn_001_face_anim.json");
    fs::create_dir_all(blocked.join("occupied")).unwrap();

    let report = orchestrator.run(&mut engine).unwrap();
    let failed: Vec<&str> = report.failures_in(Stage::Shot).map(|f| f.item.as_str()).collect();
    assert_eq!(failed, vec!["LS_Performance_Fretlyn_001"]);
    assert_eq!(report.shots_written.len(), 1);
    assert_eq!(report.shots_written[0].shot, "LS_Performance_Fretlyn_002");
    assert!(blocked.is_dir());
}

#[test]
fn test_actor_without_face_writes_nothing() {
    let fixture = Fixture::new(&[("take_001", 24)]);
    let orchestrator = fixture.orchestrator();
    let mut engine = fixture.seeded_engine(&orchestrator);
    engine.add_blueprint(
        orchestrator.paths().actor_blueprint.clone(),
        BlueprintSpec::new("BP_Bernice").with_component("Body", true),
    );

    let report = orchestrator.run(&mut engine).unwrap();
    assert!(report.shots_written.is_empty());
    assert_eq!(report.failures_in(Stage::Shot).count(), 1);
    assert!(!fixture
        .out
        .path()
        .join("faces")
        .join("LS_Performance_Fretlyn_001_face_anim.json")
        .exists());
}

#[test]
fn test_unreadable_channel_keeps_empty_control() {
    let fixture = Fixture::new(&[("take_001", 24)]);
    let orchestrator = fixture.orchestrator();
    let mut engine = fixture.seeded_engine(&orchestrator);
    engine.mark_channel_unreadable("CTRL_expressions_jawOpen_0");

    let report = orchestrator.run(&mut engine).unwrap();
    assert!(!report.has_failures());
    assert_eq!(report.channel_failure_count(), 1);

    let document = fixture.document("LS_Performance_Fretlyn_001");
    assert_eq!(document["CTRL_expressions_jawOpen"], Vec::<(f64, i64)>::new());
    assert_eq!(document["CTRL_expressions_eyeBlinkL"].len(), 24);
}

#[test]
fn test_malformed_folder_aborts_discovery() {
    let fixture = Fixture::new(&[("take_001", 24)]);
    fs::create_dir_all(fixture.raw.path().join("take_old")).unwrap();
    let orchestrator = fixture.orchestrator();
    let mut engine = MemoryEngine::new();

    let err = orchestrator.run(&mut engine).unwrap_err();
    assert!(matches!(err, PipelineError::MalformedName(_)));
    assert!(err.is_batch_fatal());
    assert_eq!(engine.calls().solves, 0);
}

#[test]
fn test_versioned_output() {
    let fixture = Fixture::new(&[("take_001", 12)]);
    let config = PipelineConfig {
        output_format: OutputFormat::Versioned,
        ..fixture.config()
    };
    let orchestrator = BatchOrchestrator::new(config).unwrap();
    let mut engine = fixture.seeded_engine(&orchestrator);
    orchestrator.run(&mut engine).unwrap();

    let file = fixture
        .out
        .path()
        .join("faces")
        .join("LS_Performance_Fretlyn_001_face_anim.json");
    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(file).unwrap()).unwrap();
    assert_eq!(value["schema_version"], 1);
    assert_eq!(value["shot"], "LS_Performance_Fretlyn_001");
    assert_eq!(value["frame_unit"], "display_rate_frame");
    assert_eq!(value["controls"]["CTRL_expressions_jawOpen"].as_array().unwrap().len(), 12);
}
