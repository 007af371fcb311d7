//! Command-line interface.

use clap::Parser;
use std::path::PathBuf;

use perfseq_models::OutputFormat;

use crate::config::{end_anim_from_sentinel, LogFormat, PipelineConfig, RebakePolicy};

/// Turn facial captures into baked shots and face animation documents.
///
/// Options override `PERFSEQ_*` environment variables, which override the
/// built-in defaults.
#[derive(Parser, Debug, Default)]
#[command(name = "perfseq")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Folder with one sub-folder per capture
    #[arg(long)]
    pub raw_data_path: Option<PathBuf>,

    /// Level opened before shots are assembled
    #[arg(long)]
    pub level: Option<String>,

    /// Store folder holding the identity and capture data
    #[arg(long)]
    pub base_path: Option<String>,

    /// Identity asset name
    #[arg(long)]
    pub identity: Option<String>,

    /// Capture-data folder under the base path
    #[arg(long)]
    pub capture_data_path: Option<String>,

    /// Capture-data asset prefix (defaults to the identity)
    #[arg(long)]
    pub capture_prefix: Option<String>,

    /// First capture index to process
    #[arg(long)]
    pub start_anim: Option<u32>,

    /// Last capture index to process (-1 = no limit)
    #[arg(long, allow_hyphen_values = true)]
    pub end_anim: Option<i64>,

    /// Store folder for performances, animation sequences and shots
    #[arg(long)]
    pub performance_path: Option<String>,

    #[arg(long)]
    pub metahuman_path: Option<String>,

    /// Character the shots are assembled for
    #[arg(long)]
    pub target_metahuman: Option<String>,

    /// Directory for the face animation documents
    #[arg(long)]
    pub output_path: Option<PathBuf>,

    /// Actor blueprint to spawn
    #[arg(long)]
    pub actor_blueprint: Option<String>,

    /// Face control-rig asset
    #[arg(long)]
    pub control_rig: Option<String>,

    /// Skeleton the animation sequences are exported against
    #[arg(long)]
    pub target_skeleton: Option<String>,

    /// Re-bake policy (always, skip-if-baked)
    #[arg(long)]
    pub rebake: Option<RebakePolicy>,

    /// Face document format (legacy, versioned)
    #[arg(long)]
    pub output_format: Option<OutputFormat>,

    /// Log format (pretty, json)
    #[arg(long)]
    pub log_format: Option<LogFormat>,

    /// Run against the in-memory engine; documents hold synthetic keyframes
    #[arg(long)]
    pub offline: bool,

    /// Write the batch report as JSON to this file
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Print the JSON schema of the versioned face document and exit
    #[arg(long)]
    pub print_schema: bool,
}

impl Cli {
    /// Apply every option that was given on top of `config`.
    pub fn apply(&self, config: &mut PipelineConfig) {
        if let Some(v) = &self.raw_data_path {
            config.raw_data_path = v.clone();
        }
        if let Some(v) = &self.level {
            config.level = v.clone();
        }
        if let Some(v) = &self.base_path {
            config.base_path = v.clone();
        }
        if let Some(v) = &self.identity {
            config.identity = v.clone();
        }
        if let Some(v) = &self.capture_data_path {
            config.capture_data_path = v.clone();
        }
        if let Some(v) = &self.capture_prefix {
            config.capture_prefix = Some(v.clone());
        }
        if let Some(v) = self.start_anim {
            config.start_anim = v;
        }
        if let Some(v) = self.end_anim {
            config.end_anim = end_anim_from_sentinel(v);
        }
        if let Some(v) = &self.performance_path {
            config.performance_path = v.clone();
        }
        if let Some(v) = &self.metahuman_path {
            config.metahuman_path = v.clone();
        }
        if let Some(v) = &self.target_metahuman {
            config.target_metahuman = v.clone();
        }
        if let Some(v) = &self.output_path {
            config.output_path = v.clone();
        }
        if let Some(v) = &self.actor_blueprint {
            config.actor_blueprint = Some(v.clone());
        }
        if let Some(v) = &self.control_rig {
            config.control_rig = v.clone();
        }
        if let Some(v) = &self.target_skeleton {
            config.target_skeleton = v.clone();
        }
        if let Some(v) = self.rebake {
            config.rebake = v;
        }
        if let Some(v) = self.output_format {
            config.output_format = v;
        }
        if let Some(v) = self.log_format {
            config.log_format = v;
        }
        if self.offline {
            config.offline = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_apply_on_top_of_config() {
        let cli = Cli::try_parse_from([
            "perfseq",
            "--identity",
            "Vasilisa",
            "--start-anim",
            "3",
            "--end-anim",
            "-1",
            "--rebake",
            "skip-if-baked",
            "--output-format",
            "versioned",
        ])
        .unwrap();

        let mut config = PipelineConfig {
            end_anim: Some(10),
            ..Default::default()
        };
        cli.apply(&mut config);

        assert_eq!(config.identity, "Vasilisa");
        assert_eq!(config.capture_prefix(), "Vasilisa");
        assert_eq!(config.start_anim, 3);
        assert_eq!(config.end_anim, None);
        assert_eq!(config.rebake, RebakePolicy::SkipIfBaked);
        assert_eq!(config.output_format, OutputFormat::Versioned);
        assert_eq!(config.level, "Untitled");
        assert!(!config.offline);
    }

    #[test]
    fn test_offline_flag() {
        let cli = Cli::try_parse_from(["perfseq", "--offline"]).unwrap();
        let mut config = PipelineConfig::default();
        cli.apply(&mut config);
        assert!(config.offline);
    }

    #[test]
    fn test_negative_end_anim_is_kept() {
        let cli = Cli::try_parse_from(["perfseq", "--end-anim", "-5"]).unwrap();
        let mut config = PipelineConfig::default();
        cli.apply(&mut config);

        assert_eq!(config.end_anim, Some(-5));
        assert!(config.anim_range().is_empty());
    }

    #[test]
    fn test_rejects_unknown_policy() {
        assert!(Cli::try_parse_from(["perfseq", "--rebake", "never"]).is_err());
    }
}
