//! Structured capture logging utilities.
//!
//! Subscriber setup for the binary, the run span and the per-item logger
//! used by the batch loops.

use tracing::{error, info, warn, Span};
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use perfseq_models::RunId;

use crate::config::LogFormat;
use crate::error::PipelineError;
use crate::report::{BatchReport, Stage};

/// Filter used when `RUST_LOG` is not set.
const DEFAULT_FILTER: &str = "perfseq=info,perfseq_pipeline=info,perfseq_engine=warn";

/// Install the global tracing subscriber.
///
/// JSON lines for [`LogFormat::Json`], colored human-readable output otherwise.
pub fn init_tracing(format: LogFormat) -> Result<(), TryInitError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .try_init(),
    }
}

/// Span covering one batch run.
pub fn run_span(run_id: &RunId) -> Span {
    tracing::info_span!("batch", run_id = %run_id)
}

/// Per-item logger for the batch loops.
///
/// Lines carry the item (capture folder or shot name) and the [`Stage`]
/// working on it. Failures go to both the log and the [`BatchReport`].
#[derive(Debug, Clone)]
pub struct CaptureLogger {
    item: String,
    stage: Stage,
}

impl CaptureLogger {
    pub fn new(item: impl Into<String>, stage: Stage) -> Self {
        Self {
            item: item.into(),
            stage,
        }
    }

    /// Same item, next stage.
    pub fn at(&self, stage: Stage) -> Self {
        Self {
            item: self.item.clone(),
            stage,
        }
    }

    pub fn item(&self) -> &str {
        &self.item
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn started(&self, message: &str) {
        info!(item = %self.item, stage = self.stage.as_str(), "Started: {}", message);
    }

    pub fn progress(&self, message: &str) {
        info!(item = %self.item, stage = self.stage.as_str(), "{}", message);
    }

    pub fn skipped(&self, reason: &str) {
        warn!(item = %self.item, stage = self.stage.as_str(), "Skipped: {}", reason);
    }

    pub fn completed(&self, message: &str) {
        info!(item = %self.item, stage = self.stage.as_str(), "Completed: {}", message);
    }

    /// Log an item-local failure and add it to `report`.
    pub fn record_failure(&self, report: &mut BatchReport, error: &PipelineError) {
        error!(
            item = %self.item,
            stage = self.stage.as_str(),
            error = %error,
            "Item failed, continuing with the batch"
        );
        report.record_failure(&self.item, self.stage, error);
    }

    /// Span for the work on this item.
    pub fn span(&self) -> Span {
        tracing::info_span!("item", item = %self.item, stage = self.stage.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_is_recorded_under_current_stage() {
        let mut report = BatchReport::new(RunId::new());
        let logger = CaptureLogger::new("take_007", Stage::Build).at(Stage::Export);

        logger.record_failure(&mut report, &PipelineError::export_failed("not solved"));

        assert_eq!(logger.item(), "take_007");
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].stage, Stage::Export);
        assert_eq!(report.failures[0].item, "take_007");
    }
}
