// Core result and error types for doccluster
use crate::artifacts::ArtifactError;
use crate::clustering::{EncodingError, ScoringError};
use crate::config::{self, ConfigError};
use crate::pdf_extraction::ExtractionError;
use std::path::PathBuf;

/// The single line a run reports on stdout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionResult {
    pub cluster_id: usize,
    pub confidence: f64,
    pub is_default: bool,
}

impl PredictionResult {
    pub const DEFAULT: Self = Self {
        cluster_id: config::DEFAULT_CLUSTER,
        confidence: config::DEFAULT_CONFIDENCE,
        is_default: true,
    };

    pub const fn computed(cluster_id: usize, confidence: f64) -> Self {
        Self { cluster_id, confidence, is_default: false }
    }

    /// `<cluster_id>,<confidence>`. The default renders as `0,0.5`; computed
    /// confidences are fixed to `decimals` places.
    pub fn render(&self, decimals: usize) -> String {
        if self.is_default {
            format!("{},{}", self.cluster_id, self.confidence)
        } else {
            format!("{},{:.*}", self.cluster_id, decimals, self.confidence)
        }
    }
}

impl Default for PredictionResult {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("missing PDF path argument")]
    MissingArgument,

    #[error("PDF file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DependencyError {
    #[error("no text extraction backend available (tried: {})", .tried.join(", "))]
    NoExtractionBackend { tried: Vec<&'static str> },
}

// Every failure the controller can turn into the default result
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("input error: {0}")]
    Input(#[from] InputError),

    #[error("dependency error: {0}")]
    Dependency(#[from] DependencyError),

    #[error("artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("encoding error: {0}")]
    Encoding(#[from] EncodingError),

    #[error("scoring error: {0}")]
    Scoring(#[from] ScoringError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("unexpected failure: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn default_renders_bare() {
        assert_eq!(PredictionResult::DEFAULT.render(2), "0,0.5");
        assert_eq!(PredictionResult::DEFAULT.render(4), "0,0.5");
    }

    #[rstest]
    #[case(2, 0.78, 2, "2,0.78")]
    #[case(5, 0.95, 2, "5,0.95")]
    #[case(0, 0.5, 2, "0,0.50")]
    #[case(3, 0.41234, 4, "3,0.4123")]
    fn computed_renders_fixed_precision(
        #[case] cluster: usize,
        #[case] confidence: f64,
        #[case] decimals: usize,
        #[case] expected: &str,
    ) {
        assert_eq!(PredictionResult::computed(cluster, confidence).render(decimals), expected);
    }

    #[test]
    fn not_found_names_the_path() {
        let err = PipelineError::from(InputError::NotFound(PathBuf::from("/tmp/missing.pdf")));
        assert!(err.to_string().contains("/tmp/missing.pdf"));
    }
}
