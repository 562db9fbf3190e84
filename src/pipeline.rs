//! Pipeline controller.
//!
//! Walks one document through the fixed sequence of stages
//!
//! ```text
//! Start -> ArgumentsChecked -> DocumentLocated -> DependenciesResolved
//!       -> ModelsLoaded -> TextExtracted -> FeaturesEncoded -> ClusterAssigned -> Done
//! ```
//!
//! Each stage runs at most once. A failed guard jumps straight to `Done`
//! with [`PredictionResult::DEFAULT`]; the error is kept on the [`Outcome`]
//! for the diagnostic channel and never escapes `run`.

use std::fmt;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use tracing::{info, warn};

use crate::artifacts::{self, ArtifactLocator};
use crate::clustering::ConfidenceMapper;
use crate::config::{self, PipelineConfig};
use crate::pdf_extraction::{ExtractionError, ExtractionRouter, Extractor};
use crate::types::{DependencyError, InputError, PipelineError, PredictionResult, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Start,
    ArgumentsChecked,
    DocumentLocated,
    DependenciesResolved,
    ModelsLoaded,
    TextExtracted,
    FeaturesEncoded,
    ClusterAssigned,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Start => "start",
            Stage::ArgumentsChecked => "arguments-checked",
            Stage::DocumentLocated => "document-located",
            Stage::DependenciesResolved => "dependencies-resolved",
            Stage::ModelsLoaded => "models-loaded",
            Stage::TextExtracted => "text-extracted",
            Stage::FeaturesEncoded => "features-encoded",
            Stage::ClusterAssigned => "cluster-assigned",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// What a run produced. `last_stage` is the last stage whose guard passed.
#[derive(Debug)]
pub struct Outcome {
    pub result: PredictionResult,
    pub last_stage: Stage,
    pub error: Option<PipelineError>,
}

impl Outcome {
    pub fn defaulted(last_stage: Stage, error: PipelineError) -> Self {
        Self {
            result: PredictionResult::DEFAULT,
            last_stage,
            error: Some(error),
        }
    }

    pub fn is_default(&self) -> bool {
        self.result.is_default
    }
}

pub struct Pipeline {
    config: PipelineConfig,
    locator: ArtifactLocator,
    router: ExtractionRouter,
    mapper: ConfidenceMapper,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, locator: ArtifactLocator, router: ExtractionRouter) -> Self {
        let mapper = ConfidenceMapper::from(&config.confidence);
        Self {
            config,
            locator,
            router,
            mapper,
        }
    }

    pub fn from_config(config: PipelineConfig) -> Self {
        let locator = ArtifactLocator::from_config(&config.artifacts);
        let router = ExtractionRouter::from_kinds(&config.extraction.backends);
        Self::new(config, locator, router)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage for `input`. Always yields a result.
    pub fn run(&self, input: Option<&Path>) -> Outcome {
        let mut stage = Stage::Start;
        match self.advance(input, &mut stage) {
            Ok(result) => Outcome {
                result,
                last_stage: Stage::Done,
                error: None,
            },
            Err(error) => {
                warn!(stage = %stage, %error, "falling back to default result");
                Outcome::defaulted(stage, error)
            }
        }
    }

    /// [`run`](Self::run), with a panic in any stage turned into the default
    /// result carrying [`PipelineError::Internal`].
    pub fn run_guarded(&self, input: Option<&Path>) -> Outcome {
        panic::catch_unwind(AssertUnwindSafe(|| self.run(input))).unwrap_or_else(|payload| {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            warn!(%message, "prediction panicked, falling back to default result");
            Outcome::defaulted(Stage::Start, PipelineError::Internal(message))
        })
    }

    fn advance(&self, input: Option<&Path>, stage: &mut Stage) -> Result<PredictionResult> {
        let path = input.ok_or(InputError::MissingArgument)?;
        *stage = Stage::ArgumentsChecked;
        info!(path = %path.display(), "PDF path");

        if !path.exists() {
            return Err(InputError::NotFound(path.to_path_buf()).into());
        }
        if let Ok(meta) = fs::metadata(path) {
            info!(bytes = meta.len(), "PDF file exists");
        }
        *stage = Stage::DocumentLocated;

        let available = self.router.available();
        if available.is_empty() {
            return Err(DependencyError::NoExtractionBackend { tried: self.router.names() }.into());
        }
        info!(backends = ?available, "extraction backends available");
        *stage = Stage::DependenciesResolved;

        info!(dirs = ?self.locator.search_dirs(), "searching for artifacts");
        let paths = self.locator.locate()?;
        let vectorizer = artifacts::load_vectorizer(&paths.vectorizer)?;
        let model = artifacts::load_cluster_model(&paths.cluster_model)?;
        info!(
            features = vectorizer.dim(),
            vocabulary = vectorizer.vocabulary_len(),
            clusters = model.k(),
            metric = ?model.metric(),
            "models loaded"
        );
        *stage = Stage::ModelsLoaded;

        let extraction = &self.config.extraction;
        let sample = Extractor::new(&self.router, extraction.max_pages, extraction.max_text_chars)
            .extract(path);
        if sample.is_unreadable() {
            return Err(ExtractionError::Unreadable { path: path.display().to_string() }.into());
        }
        info!(preview = sample.preview(config::PREVIEW_CHARS), "text sample");
        *stage = Stage::TextExtracted;

        let features = vectorizer.encode(&sample.text)?;
        info!(dim = features.len(), "text vectorized");
        *stage = Stage::FeaturesEncoded;

        let assignment = model.assign(&features)?;
        *stage = Stage::ClusterAssigned;

        let confidence = self.mapper.confidence(assignment.distance);
        info!(
            cluster = assignment.cluster_id,
            distance = format_args!("{:.2}", assignment.distance),
            confidence = format_args!("{:.2}", confidence),
            "prediction"
        );
        *stage = Stage::Done;
        Ok(PredictionResult::computed(assignment.cluster_id, confidence))
    }
}
