//! Batch run report.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use perfseq_models::{ChannelReadFailure, RunId};

use crate::error::PipelineError;

/// Pipeline stage an item failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Build,
    Export,
    Shot,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Build => "build",
            Stage::Export => "export",
            Stage::Shot => "shot",
        }
    }
}

/// One capture or shot that failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    /// Capture folder or shot name
    pub item: String,
    pub stage: Stage,
    pub error: String,
}

/// A written face document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShotSummary {
    pub shot: String,
    pub path: PathBuf,
    pub characters: Vec<String>,
    pub controls: usize,
    pub keys: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub channel_failures: Vec<ChannelReadFailure>,
}

/// Counts and failures of one batch run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub run_id: RunId,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub captures_discovered: usize,
    pub performances_built: usize,
    pub performances_reused: usize,
    pub animations_exported: usize,
    pub animations_reused: usize,
    pub shots_written: Vec<ShotSummary>,
    /// Shots without a facial binding
    pub shots_skipped: Vec<String>,
    pub failures: Vec<ItemFailure>,
}

impl BatchReport {
    pub fn new(run_id: RunId) -> Self {
        Self {
            run_id,
            started_at: Utc::now(),
            finished_at: None,
            captures_discovered: 0,
            performances_built: 0,
            performances_reused: 0,
            animations_exported: 0,
            animations_reused: 0,
            shots_written: Vec::new(),
            shots_skipped: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn record_failure(&mut self, item: &str, stage: Stage, error: &PipelineError) {
        self.failures.push(ItemFailure {
            item: item.to_string(),
            stage,
            error: error.to_string(),
        });
    }

    pub fn failures_in(&self, stage: Stage) -> impl Iterator<Item = &ItemFailure> {
        self.failures.iter().filter(move |f| f.stage == stage)
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Number of channels that could not be read across all shots.
    pub fn channel_failure_count(&self) -> usize {
        self.shots_written.iter().map(|s| s.channel_failures.len()).sum()
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn log_summary(&self) {
        info!(
            run_id = %self.run_id,
            captures = self.captures_discovered,
            performances_built = self.performances_built,
            performances_reused = self.performances_reused,
            animations_exported = self.animations_exported,
            animations_reused = self.animations_reused,
            shots_written = self.shots_written.len(),
            shots_skipped = self.shots_skipped.len(),
            failures = self.failures.len(),
            "Batch finished"
        );
        for failure in &self.failures {
            warn!(
                run_id = %self.run_id,
                item = %failure.item,
                stage = failure.stage.as_str(),
                "Item failed: {}", failure.error
            );
        }
    }
}
