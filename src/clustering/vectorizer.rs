//! Pre-fit TF-IDF transform.
//!
//! The artifact is the fitted state of a word-level TF-IDF vectorizer: the
//! term → column vocabulary, one IDF weight per column, and the analyzer
//! settings used at fit time. `encode` reproduces the transform for a single
//! document:
//!
//! ```text
//! tokens  = token_pattern.find_iter(lowercase(text)) - stop_words
//! grams   = word n-grams of tokens, n in [ngram_min, ngram_max], joined by ' '
//! tf[j]   = count of grams mapping to column j    (1 if binary, 1 + ln tf if sublinear)
//! x[j]    = tf[j] * idf[j]
//! x       = x / ||x||                              (l2, l1 or none)
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::{EncodingError, FeatureVector};
use crate::artifacts::ArtifactError;

pub const DEFAULT_TOKEN_PATTERN: &str = r"(?u)\b\w\w+\b";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    L1,
    L2,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfArtifact {
    pub vocabulary: HashMap<String, usize>,
    pub idf: Vec<f64>,
    #[serde(default = "default_true")]
    pub lowercase: bool,
    #[serde(default = "default_token_pattern")]
    pub token_pattern: String,
    #[serde(default = "default_ngram_range")]
    pub ngram_range: (usize, usize),
    #[serde(default)]
    pub stop_words: Vec<String>,
    #[serde(default)]
    pub binary: bool,
    #[serde(default)]
    pub sublinear_tf: bool,
    #[serde(default = "default_norm")]
    pub norm: Option<Norm>,
}

fn default_true() -> bool {
    true
}

fn default_token_pattern() -> String {
    DEFAULT_TOKEN_PATTERN.to_string()
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

fn default_norm() -> Option<Norm> {
    Some(Norm::L2)
}

impl TfidfArtifact {
    /// Artifact with the usual analyzer defaults.
    pub fn new(vocabulary: HashMap<String, usize>, idf: Vec<f64>) -> Self {
        Self {
            vocabulary,
            idf,
            lowercase: true,
            token_pattern: default_token_pattern(),
            ngram_range: default_ngram_range(),
            stop_words: Vec::new(),
            binary: false,
            sublinear_tf: false,
            norm: default_norm(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    artifact: TfidfArtifact,
    token_re: Regex,
    stop_words: HashSet<String>,
}

impl TfidfVectorizer {
    pub fn from_artifact(artifact: TfidfArtifact) -> Result<Self, ArtifactError> {
        let token_re = Regex::new(&artifact.token_pattern).map_err(|e| ArtifactError::Invalid {
            artifact: "vectorizer",
            reason: format!("token_pattern: {e}"),
        })?;
        let stop_words = artifact.stop_words.iter().cloned().collect();
        Ok(Self {
            artifact,
            token_re,
            stop_words,
        })
    }

    pub fn dim(&self) -> usize {
        self.artifact.idf.len()
    }

    pub fn vocabulary_len(&self) -> usize {
        self.artifact.vocabulary.len()
    }

    /// Encode one document. Same text and artifact give a bit-identical
    /// vector: counts land in fixed columns and every reduction runs in
    /// column order.
    pub fn encode(&self, text: &str) -> Result<FeatureVector, EncodingError> {
        self.check_shape()?;

        let text = if self.artifact.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };
        let tokens: Vec<&str> = self
            .token_re
            .find_iter(&text)
            .map(|m| m.as_str())
            .filter(|token| !self.stop_words.contains(*token))
            .collect();

        let mut features = FeatureVector::zeros(self.dim());
        let (min_n, max_n) = self.artifact.ngram_range;
        for n in min_n..=max_n.min(tokens.len()) {
            for window in tokens.windows(n) {
                let column = if n == 1 {
                    self.artifact.vocabulary.get(window[0])
                } else {
                    self.artifact.vocabulary.get(&window.join(" "))
                };
                if let Some(&column) = column {
                    features[column] += 1.0;
                }
            }
        }

        for (tf, idf) in features.iter_mut().zip(&self.artifact.idf) {
            if *tf > 0.0 {
                if self.artifact.binary {
                    *tf = 1.0;
                } else if self.artifact.sublinear_tf {
                    *tf = 1.0 + tf.ln();
                }
            }
            *tf *= idf;
        }

        let norm = match self.artifact.norm {
            Some(Norm::L2) => features.iter().map(|x| x * x).sum::<f64>().sqrt(),
            Some(Norm::L1) => features.iter().map(|x| x.abs()).sum::<f64>(),
            None => 0.0,
        };
        if norm > 0.0 {
            features.mapv_inplace(|x| x / norm);
        }

        Ok(features)
    }

    fn check_shape(&self) -> Result<(), EncodingError> {
        let dim = self.dim();
        if dim == 0 {
            return Err(EncodingError::EmptyVocabulary);
        }
        let (min, max) = self.artifact.ngram_range;
        if min == 0 || min > max {
            return Err(EncodingError::InvalidNgramRange { min, max });
        }
        let vocabulary = &self.artifact.vocabulary;
        if let Some((term, &index)) = vocabulary.iter().find(|&(_, &index)| index >= dim) {
            return Err(EncodingError::IndexOutOfRange {
                term: term.clone(),
                index,
                dim,
            });
        }
        Ok(())
    }
}
