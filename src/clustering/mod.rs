// Feature encoding, nearest-centroid scoring and confidence mapping
pub mod centroids;
pub mod confidence;
pub mod vectorizer;

pub use centroids::{Assignment, CentroidArtifact, ClusterModel, Metric};
pub use confidence::ConfidenceMapper;
pub use vectorizer::{Norm, TfidfArtifact, TfidfVectorizer};

use ndarray::Array1;
use thiserror::Error;

/// Dense TF-IDF features; the dimension is fixed by the vectorizer artifact.
pub type FeatureVector = Array1<f64>;

#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("vectorizer has an empty feature space")]
    EmptyVocabulary,

    #[error("vocabulary index {index} for {term:?} exceeds idf dimension {dim}")]
    IndexOutOfRange { term: String, index: usize, dim: usize },

    #[error("invalid ngram range ({min}, {max})")]
    InvalidNgramRange { min: usize, max: usize },
}

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("feature vector has {actual} dimensions, centroids have {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("distance to centroid {index} is not finite")]
    NonFiniteDistance { index: usize },
}
