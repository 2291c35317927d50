//! Pipeline configuration loading.
//!
//! Configuration is YAML with two sections, `tone` and `raw`, each of which
//! may be partial. Files are searched in a fixed order; the first one that
//! parses wins.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{RawParameters, ToneParameters};

/// Environment variable naming a configuration file
pub const CONFIG_ENV_VAR: &str = "NEGTONE_CONFIG";

/// Canonical configuration file name
const CONFIG_FILENAME: &str = "negtone.yml";

/// Complete configuration file structure.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub tone: ToneParameters,
    pub raw: RawParameters,
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        self.tone.validate()?;
        self.raw.validate()
    }
}

/// Loaded configuration, its source path, and warnings collected on the way.
#[derive(Debug, Clone)]
pub struct PipelineConfigHandle {
    pub config: PipelineConfig,
    pub source: Option<PathBuf>,
    pub warnings: Vec<String>,
}

impl PipelineConfigHandle {
    fn with_config(config: PipelineConfig, source: Option<PathBuf>, warnings: Vec<String>) -> Self {
        Self {
            config,
            source,
            warnings,
        }
    }

    /// Emit the source and any warnings through the log.
    pub fn log_usage(&self) {
        match &self.source {
            Some(source) => tracing::info!(path = %source.display(), "loaded pipeline config"),
            None => tracing::debug!("using built-in pipeline defaults"),
        }
        for warning in &self.warnings {
            tracing::warn!("{}", warning);
        }
    }
}

fn read_config(path: &Path) -> std::result::Result<PipelineConfig, String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read pipeline config {}: {}", path.display(), e))?;
    serde_yaml::from_str(&contents)
        .map_err(|e| format!("Failed to parse pipeline config {}: {}", path.display(), e))
}

/// Load configuration from disk, optionally forcing a specific path.
///
/// An explicitly requested path must exist and parse. Discovered files that
/// fail to parse are skipped with a warning, and when nothing is found the
/// built-in defaults are used.
pub fn load_pipeline_config(custom_path: Option<&Path>) -> Result<PipelineConfigHandle> {
    load_from_candidates(custom_path, config_candidates())
}

pub(crate) fn load_from_candidates(
    custom_path: Option<&Path>,
    candidates: Vec<PathBuf>,
) -> Result<PipelineConfigHandle> {
    if let Some(path) = custom_path {
        let config = read_config(path).map_err(Error::Config)?;
        let source = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        return Ok(PipelineConfigHandle::with_config(
            config,
            Some(source),
            Vec::new(),
        ));
    }

    let mut warnings = Vec::new();
    for candidate in candidates {
        if !candidate.is_file() {
            continue;
        }

        match read_config(&candidate) {
            Ok(config) => {
                let source = fs::canonicalize(&candidate).unwrap_or(candidate);
                return Ok(PipelineConfigHandle::with_config(
                    config,
                    Some(source),
                    warnings,
                ));
            }
            Err(warning) => warnings.push(warning),
        }
    }

    warnings.push("No pipeline config found; using built-in defaults.".to_string());
    Ok(PipelineConfigHandle::with_config(
        PipelineConfig::default(),
        None,
        warnings,
    ))
}

/// Config file candidates, in search order.
fn config_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR) {
        candidates.push(PathBuf::from(env_path));
    }

    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd.join("config").join(CONFIG_FILENAME));
        candidates.push(cwd.join(CONFIG_FILENAME));
    }

    if let Some(home_dir) = dirs::home_dir() {
        candidates.push(home_dir.join(".negtone").join(CONFIG_FILENAME));
    }

    candidates
}
