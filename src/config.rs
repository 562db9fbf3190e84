// Configuration constants and the optional TOML overrides for doccluster
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::pdf_extraction::BackendKind;

// Extraction bounds
pub const MAX_PAGES: usize = 3;
pub const MAX_TEXT_CHARS: usize = 10_000;
pub const PLACEHOLDER_TEXT: &str = "academic research thesis dissertation study paper document";
pub const PREVIEW_CHARS: usize = 100;

// Confidence mapping
pub const CONFIDENCE_SCALE: f64 = 20.0;
pub const MIN_CONFIDENCE: f64 = 0.4;
pub const MAX_CONFIDENCE: f64 = 0.95;
pub const CONFIDENCE_DECIMALS: usize = 2;

// Label contract shared with downstream consumers
pub const MAX_CLUSTER_ID: usize = 5;
pub const DEFAULT_CLUSTER: usize = 0;
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

// Artifact lookup
pub const VECTORIZER_FILE: &str = "vectorizer.json";
pub const CLUSTER_MODEL_FILE: &str = "kmeans.json";
pub const MODEL_DIR_ENV: &str = "DOCCLUSTER_MODEL_DIR";
pub const MODEL_SUBDIR: &str = "ml";
pub const STAGING_DIR_NAME: &str = "doccluster";

/// Model directory from the environment, if set and non-empty.
pub fn model_dir_override() -> Option<PathBuf> {
    env::var_os(MODEL_DIR_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

pub fn default_log_filter(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config syntax: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub extraction: ExtractionConfig,
    pub confidence: ConfidenceConfig,
    pub artifacts: ArtifactConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExtractionConfig {
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
    #[serde(default = "default_max_text_chars")]
    pub max_text_chars: usize,
    /// Backends in preference order; unavailable ones are skipped.
    #[serde(default = "default_backends")]
    pub backends: Vec<BackendKind>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
            max_text_chars: default_max_text_chars(),
            backends: default_backends(),
        }
    }
}

fn default_max_pages() -> usize {
    MAX_PAGES
}

fn default_max_text_chars() -> usize {
    MAX_TEXT_CHARS
}

fn default_backends() -> Vec<BackendKind> {
    BackendKind::ranked().to_vec()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConfidenceConfig {
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default = "default_min")]
    pub min: f64,
    #[serde(default = "default_max")]
    pub max: f64,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            scale: default_scale(),
            min: default_min(),
            max: default_max(),
        }
    }
}

fn default_scale() -> f64 {
    CONFIDENCE_SCALE
}

fn default_min() -> f64 {
    MIN_CONFIDENCE
}

fn default_max() -> f64 {
    MAX_CONFIDENCE
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArtifactConfig {
    /// When non-empty, replaces the built-in search order entirely.
    #[serde(default)]
    pub search_dirs: Vec<PathBuf>,
    #[serde(default = "default_vectorizer_file")]
    pub vectorizer_file: String,
    #[serde(default = "default_cluster_model_file")]
    pub cluster_model_file: String,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            search_dirs: Vec::new(),
            vectorizer_file: default_vectorizer_file(),
            cluster_model_file: default_cluster_model_file(),
        }
    }
}

fn default_vectorizer_file() -> String {
    VECTORIZER_FILE.to_string()
}

fn default_cluster_model_file() -> String {
    CLUSTER_MODEL_FILE.to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_decimals")]
    pub decimals: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { decimals: default_decimals() }
    }
}

fn default_decimals() -> usize {
    CONFIDENCE_DECIMALS
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let conf = &self.confidence;
        if !(conf.scale.is_finite() && conf.scale > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "confidence.scale must be positive, got {}",
                conf.scale
            )));
        }
        let unit = 0.0..=1.0;
        if !unit.contains(&conf.min) || !unit.contains(&conf.max) || conf.min > conf.max {
            return Err(ConfigError::Invalid(format!(
                "confidence bounds must satisfy 0 <= min <= max <= 1, got [{}, {}]",
                conf.min, conf.max
            )));
        }
        if self.extraction.max_pages == 0 {
            return Err(ConfigError::Invalid("extraction.max_pages must be at least 1".into()));
        }
        if self.extraction.max_text_chars == 0 {
            return Err(ConfigError::Invalid("extraction.max_text_chars must be at least 1".into()));
        }
        if self.extraction.backends.is_empty() {
            return Err(ConfigError::Invalid(
                "extraction.backends must name at least one backend".into(),
            ));
        }
        if !(1..=6).contains(&self.output.decimals) {
            return Err(ConfigError::Invalid(format!(
                "output.decimals must be between 1 and 6, got {}",
                self.output.decimals
            )));
        }
        Ok(())
    }
}
