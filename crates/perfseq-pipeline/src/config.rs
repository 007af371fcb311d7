//! Pipeline configuration.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use perfseq_engine::{BakeOptions, Vec3};
use perfseq_models::{naming, AssetPath, OutputFormat};

use crate::catalog::AnimRange;
use crate::error::{PipelineError, PipelineResult};

/// Default folder holding one sub-folder per capture.
pub const DEFAULT_RAW_DATA_PATH: &str = "H:\\datasets\\Fretlyn\\Face\\Fretlyn";

/// Whether a shot whose facial binding already carries control-rig curves is
/// baked again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RebakePolicy {
    /// Bake on every run, overwriting existing curves
    #[default]
    Always,
    /// Leave already-baked bindings untouched
    SkipIfBaked,
}

impl RebakePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RebakePolicy::Always => "always",
            RebakePolicy::SkipIfBaked => "skip-if-baked",
        }
    }
}

impl fmt::Display for RebakePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RebakePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "always" => Ok(RebakePolicy::Always),
            "skip-if-baked" => Ok(RebakePolicy::SkipIfBaked),
            other => Err(format!("unknown rebake policy '{}'", other)),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable, colored
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

/// Batch configuration.
///
/// Store locations are kept as entered and checked by [`PipelineConfig::validate`].
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Folder with one sub-folder per capture
    pub raw_data_path: PathBuf,
    /// Level opened before shots are assembled
    pub level: String,
    /// Store folder holding the identity and the ingested capture data
    pub base_path: String,
    /// Identity asset name under `base_path`
    pub identity: String,
    /// Capture-data folder under `base_path`
    pub capture_data_path: String,
    /// Capture-data asset prefix; the identity name when unset
    pub capture_prefix: Option<String>,
    /// First capture index to process
    pub start_anim: u32,
    /// Last capture index to process, unbounded when unset.
    /// Below `start_anim` (including negative values) the window is empty.
    pub end_anim: Option<i64>,
    /// Store folder for performances, animation sequences and shots
    pub performance_path: String,
    pub metahuman_path: String,
    pub target_metahuman: String,
    /// Directory the face documents are written to
    pub output_path: PathBuf,
    /// Blueprint spawned for the shots; `{metahuman}/{target}/BP_{target}` when unset
    pub actor_blueprint: Option<String>,
    pub control_rig: String,
    /// Skeleton animation sequences are exported against
    pub target_skeleton: String,
    pub spawn_location: Vec3,
    pub bake: BakeOptions,
    pub rebake: RebakePolicy,
    pub output_format: OutputFormat,
    pub log_format: LogFormat,
    /// Run against the seeded in-memory engine
    pub offline: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            raw_data_path: PathBuf::from(DEFAULT_RAW_DATA_PATH),
            level: "Untitled".to_string(),
            base_path: "/Game/FacialCapture/".to_string(),
            identity: "Fretlyn".to_string(),
            capture_data_path: "Fretlyn_CaptureSource_Ingested/".to_string(),
            capture_prefix: None,
            start_anim: 1,
            end_anim: None,
            performance_path: "/Game/Performances/".to_string(),
            metahuman_path: "/Game/MetaHumans/".to_string(),
            target_metahuman: "Bernice".to_string(),
            output_path: PathBuf::from(DEFAULT_RAW_DATA_PATH),
            actor_blueprint: None,
            control_rig: "/Game/MetaHumans/Common/Face/Face_ControlBoard_CtrlRig".to_string(),
            target_skeleton: "/Game/MetaHumans/Common/Face/Face_Archetype_Skeleton".to_string(),
            spawn_location: Vec3::new(-25200.0, -25200.0, 100.0),
            bake: BakeOptions::default(),
            rebake: RebakePolicy::default(),
            output_format: OutputFormat::default(),
            log_format: LogFormat::default(),
            offline: false,
        }
    }
}

/// Read and parse an env var, `None` if unset or unparseable.
fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

/// Only `-1` and an empty value mean "no upper bound".
fn parse_end_anim(raw: &str) -> PipelineResult<Option<i64>> {
    match raw.trim() {
        "" | "-1" => Ok(None),
        value => value.parse().map(Some).map_err(|_| {
            PipelineError::config_error(format!("PERFSEQ_END_ANIM is not an integer: '{}'", value))
        }),
    }
}

/// Map the `-1` sentinel of the index window end to "no upper bound".
pub fn end_anim_from_sentinel(value: i64) -> Option<i64> {
    (value != -1).then_some(value)
}

impl PipelineConfig {
    /// Create config from `PERFSEQ_*` environment variables.
    ///
    /// Unparseable values fall back to the default, except the index window
    /// end, which is an error.
    pub fn from_env() -> PipelineResult<Self> {
        let defaults = Self::default();
        let end_anim = match std::env::var("PERFSEQ_END_ANIM") {
            Ok(raw) => parse_end_anim(&raw)?,
            Err(_) => defaults.end_anim,
        };
        let log_format = std::env::var("PERFSEQ_LOG_FORMAT")
            .or_else(|_| std::env::var("LOG_FORMAT"))
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.log_format);

        Ok(Self {
            raw_data_path: std::env::var("PERFSEQ_RAW_DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.raw_data_path),
            level: std::env::var("PERFSEQ_LEVEL").unwrap_or(defaults.level),
            base_path: std::env::var("PERFSEQ_BASE_PATH").unwrap_or(defaults.base_path),
            identity: std::env::var("PERFSEQ_IDENTITY").unwrap_or(defaults.identity),
            capture_data_path: std::env::var("PERFSEQ_CAPTURE_DATA_PATH")
                .unwrap_or(defaults.capture_data_path),
            capture_prefix: std::env::var("PERFSEQ_CAPTURE_PREFIX").ok(),
            start_anim: env_parse("PERFSEQ_START_ANIM").unwrap_or(defaults.start_anim),
            end_anim,
            performance_path: std::env::var("PERFSEQ_PERFORMANCE_PATH")
                .unwrap_or(defaults.performance_path),
            metahuman_path: std::env::var("PERFSEQ_METAHUMAN_PATH").unwrap_or(defaults.metahuman_path),
            target_metahuman: std::env::var("PERFSEQ_TARGET_METAHUMAN")
                .unwrap_or(defaults.target_metahuman),
            output_path: std::env::var("PERFSEQ_OUTPUT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_path),
            actor_blueprint: std::env::var("PERFSEQ_ACTOR_BLUEPRINT").ok(),
            control_rig: std::env::var("PERFSEQ_CONTROL_RIG").unwrap_or(defaults.control_rig),
            target_skeleton: std::env::var("PERFSEQ_TARGET_SKELETON").unwrap_or(defaults.target_skeleton),
            spawn_location: defaults.spawn_location,
            bake: BakeOptions {
                tolerance: env_parse("PERFSEQ_BAKE_TOLERANCE").unwrap_or(defaults.bake.tolerance),
                reduce_keys: env_parse("PERFSEQ_REDUCE_KEYS").unwrap_or(defaults.bake.reduce_keys),
            },
            rebake: env_parse("PERFSEQ_REBAKE").unwrap_or(defaults.rebake),
            output_format: env_parse("PERFSEQ_OUTPUT_FORMAT").unwrap_or(defaults.output_format),
            log_format,
            offline: env_parse("PERFSEQ_OFFLINE").unwrap_or(defaults.offline),
        })
    }

    /// Inclusive capture index window.
    pub fn anim_range(&self) -> AnimRange {
        AnimRange::new(self.start_anim, self.end_anim)
    }

    /// Prefix of capture-data asset names.
    pub fn capture_prefix(&self) -> &str {
        self.capture_prefix.as_deref().unwrap_or(&self.identity)
    }

    /// Resolve every store location.
    pub fn store_paths(&self) -> PipelineResult<StorePaths> {
        let store_path = |field: &str, value: &str| {
            AssetPath::new(value)
                .map_err(|e| PipelineError::config_error(format!("{}: {}", field, e)))
        };

        let base = store_path("base_path", &self.base_path)?;
        let metahuman = store_path("metahuman_path", &self.metahuman_path)?
            .join(&self.target_metahuman);
        let actor_blueprint = match &self.actor_blueprint {
            Some(path) => store_path("actor_blueprint", path)?,
            None => metahuman.join(&format!("BP_{}", self.target_metahuman)),
        };

        Ok(StorePaths {
            identity: base.join(&self.identity),
            capture_data_root: base.join(&self.capture_data_path),
            performances: store_path("performance_path", &self.performance_path)?,
            target_metahuman: metahuman,
            actor_blueprint,
            control_rig: store_path("control_rig", &self.control_rig)?,
            target_skeleton: store_path("target_skeleton", &self.target_skeleton)?,
        })
    }

    /// Check the configuration before a run.
    pub fn validate(&self) -> PipelineResult<()> {
        self.store_paths()?;
        if self.identity.is_empty() || self.target_metahuman.is_empty() {
            return Err(PipelineError::config_error("identity and target_metahuman must be set"));
        }
        Ok(())
    }
}

/// Store locations derived from a [`PipelineConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    pub identity: AssetPath,
    /// Folder containing the per-take capture-data assets
    pub capture_data_root: AssetPath,
    pub performances: AssetPath,
    pub target_metahuman: AssetPath,
    pub actor_blueprint: AssetPath,
    pub control_rig: AssetPath,
    pub target_skeleton: AssetPath,
}

impl StorePaths {
    /// Capture-data asset of one take.
    pub fn capture_data(&self, prefix: &str, suffix: &str) -> AssetPath {
        self.capture_data_root
            .join(&naming::capture_data_name(prefix, suffix))
    }
}
