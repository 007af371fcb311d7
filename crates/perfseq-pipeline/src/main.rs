//! Batch pipeline binary.

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use perfseq_models::VersionedFaceAnim;
use perfseq_pipeline::cli::Cli;
use perfseq_pipeline::logging::init_tracing;
use perfseq_pipeline::offline::open_session;
use perfseq_pipeline::{BatchOrchestrator, PipelineConfig};

fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = PipelineConfig::from_env().context("Invalid environment configuration")?;
    cli.apply(&mut config);

    if cli.print_schema {
        let schema = schemars::schema_for!(VersionedFaceAnim);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    init_tracing(config.log_format).context("Failed to initialize tracing")?;
    info!("Starting perfseq");
    info!("Pipeline config: {:?}", config);

    let orchestrator = BatchOrchestrator::new(config).context("Invalid configuration")?;
    let captures = orchestrator
        .catalog()
        .discover()
        .context("Capture discovery failed")?;

    let mut engine = open_session(orchestrator.config(), orchestrator.paths(), &captures)
        .context("Cannot open an engine session")?;
    let report = orchestrator
        .run_with_captures(&mut engine, captures)
        .context("Batch aborted")?;

    if let Some(path) = &cli.report {
        std::fs::write(path, serde_json::to_string_pretty(&report)?)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        info!(path = %path.display(), "Batch report written");
    }

    if report.has_failures() {
        warn!(failures = report.failures.len(), "Batch finished with failures");
    } else {
        info!("Batch finished");
    }
    Ok(())
}
