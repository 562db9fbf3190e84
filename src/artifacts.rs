// Locating and loading the two pre-trained artifacts
use std::env;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::clustering::{CentroidArtifact, ClusterModel, TfidfArtifact, TfidfVectorizer};
use crate::config::{self, ArtifactConfig};

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error(
        "{vectorizer} and {cluster_model} not found in {} searched directories",
        .searched.len()
    )]
    NotFound {
        vectorizer: String,
        cluster_model: String,
        searched: Vec<PathBuf>,
    },

    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid {artifact}: {reason}")]
    Invalid { artifact: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub vectorizer: PathBuf,
    pub cluster_model: PathBuf,
}

/// Ordered list of directories to look for both artifacts in. The first
/// directory holding both files wins.
#[derive(Debug, Clone)]
pub struct ArtifactLocator {
    search_dirs: Vec<PathBuf>,
    vectorizer_file: String,
    cluster_model_file: String,
}

impl ArtifactLocator {
    pub fn new(
        search_dirs: Vec<PathBuf>,
        vectorizer_file: impl Into<String>,
        cluster_model_file: impl Into<String>,
    ) -> Self {
        Self {
            search_dirs,
            vectorizer_file: vectorizer_file.into(),
            cluster_model_file: cluster_model_file.into(),
        }
    }

    /// Explicit directories replace the built-in order.
    pub fn from_config(config: &ArtifactConfig) -> Self {
        let dirs = if config.search_dirs.is_empty() {
            default_search_dirs()
        } else {
            config.search_dirs.clone()
        };
        Self::new(dirs, &config.vectorizer_file, &config.cluster_model_file)
    }

    pub fn search_dirs(&self) -> &[PathBuf] {
        &self.search_dirs
    }

    pub fn locate(&self) -> Result<ArtifactPaths, ArtifactError> {
        for dir in &self.search_dirs {
            let vectorizer = dir.join(&self.vectorizer_file);
            let cluster_model = dir.join(&self.cluster_model_file);
            match (vectorizer.is_file(), cluster_model.is_file()) {
                (true, true) => {
                    info!(dir = %dir.display(), "artifacts found");
                    return Ok(ArtifactPaths { vectorizer, cluster_model });
                }
                (false, _) => debug!(path = %vectorizer.display(), "vectorizer not found"),
                (true, false) => debug!(path = %cluster_model.display(), "cluster model not found"),
            }
        }
        Err(ArtifactError::NotFound {
            vectorizer: self.vectorizer_file.clone(),
            cluster_model: self.cluster_model_file.clone(),
            searched: self.search_dirs.clone(),
        })
    }
}

impl Default for ArtifactLocator {
    fn default() -> Self {
        Self::from_config(&ArtifactConfig::default())
    }
}

/// `$DOCCLUSTER_MODEL_DIR`, next to the executable, `<exe>/ml`, `./ml`, the
/// temp staging area, then the user data dir.
pub fn default_search_dirs() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(dir) = config::model_dir_override() {
        candidates.push(dir);
    }
    let exe_dir = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    if let Some(exe_dir) = exe_dir {
        let subdir = exe_dir.join(config::MODEL_SUBDIR);
        candidates.push(exe_dir);
        candidates.push(subdir);
    }
    candidates.push(PathBuf::from(config::MODEL_SUBDIR));
    candidates.push(env::temp_dir().join(config::STAGING_DIR_NAME));
    if let Some(data) = dirs::data_dir() {
        candidates.push(data.join(config::STAGING_DIR_NAME));
    }
    candidates
}

pub fn load_vectorizer(path: &Path) -> Result<TfidfVectorizer, ArtifactError> {
    let artifact: TfidfArtifact = read_json(path)?;
    TfidfVectorizer::from_artifact(artifact)
}

pub fn load_cluster_model(path: &Path) -> Result<ClusterModel, ArtifactError> {
    let artifact: CentroidArtifact = read_json(path)?;
    ClusterModel::from_artifact(artifact)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let file = File::open(path).map_err(|source| ArtifactError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if let Ok(meta) = fs::metadata(path) {
        info!(path = %path.display(), bytes = meta.len(), "loading artifact");
    }
    serde_json::from_reader(BufReader::new(file)).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
