//! doccluster: assign a PDF to the nearest cluster of a pre-trained
//! TF-IDF + k-means model and report `<cluster_id>,<confidence>`.

pub mod artifacts;
pub mod clustering;
pub mod config;
pub mod pdf_extraction;
pub mod pipeline;
pub mod types;

pub use pipeline::{Outcome, Pipeline, Stage};
pub use types::{PipelineError, PredictionResult};
