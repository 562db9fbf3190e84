//! Nearest-centroid assignment against a pre-trained cluster model.

use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use super::{FeatureVector, ScoringError};
use crate::artifacts::ArtifactError;
use crate::config::MAX_CLUSTER_ID;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    Euclidean,
    Cosine,
}

impl Metric {
    fn distance(self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        match self {
            Metric::Euclidean => a
                .iter()
                .zip(b.iter())
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f64>()
                .sqrt(),
            Metric::Cosine => {
                let norm_a = a.dot(&a).sqrt();
                let norm_b = b.dot(&b).sqrt();
                if norm_a == 0.0 || norm_b == 0.0 {
                    1.0
                } else {
                    1.0 - a.dot(&b) / (norm_a * norm_b)
                }
            }
        }
    }
}

/// On-disk form: one row per centroid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CentroidArtifact {
    pub cluster_centers: Vec<Vec<f64>>,
    #[serde(default)]
    pub metric: Metric,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assignment {
    /// Label reported downstream, clamped into `[0, MAX_CLUSTER_ID]`.
    pub cluster_id: usize,
    /// Row of the nearest centroid in the model.
    pub nearest: usize,
    pub distance: f64,
}

#[derive(Debug, Clone)]
pub struct ClusterModel {
    centers: Array2<f64>,
    metric: Metric,
}

impl ClusterModel {
    pub fn new(centers: Array2<f64>, metric: Metric) -> Result<Self, ArtifactError> {
        let invalid = |reason: String| ArtifactError::Invalid {
            artifact: "cluster model",
            reason,
        };
        if centers.nrows() == 0 || centers.ncols() == 0 {
            return Err(invalid(format!("empty centroid matrix {:?}", centers.dim())));
        }
        if centers.iter().any(|x| !x.is_finite()) {
            return Err(invalid("centroids contain non-finite values".into()));
        }
        Ok(Self { centers, metric })
    }

    pub fn from_artifact(artifact: CentroidArtifact) -> Result<Self, ArtifactError> {
        let rows = artifact.cluster_centers.len();
        let cols = artifact.cluster_centers.first().map_or(0, Vec::len);
        if let Some(row) = artifact.cluster_centers.iter().position(|r| r.len() != cols) {
            let found = artifact.cluster_centers[row].len();
            return Err(ArtifactError::Invalid {
                artifact: "cluster model",
                reason: format!("centroid {row} has {found} values, expected {cols}"),
            });
        }
        let flat = artifact.cluster_centers.into_iter().flatten().collect();
        let centers =
            Array2::from_shape_vec((rows, cols), flat).map_err(|e| ArtifactError::Invalid {
                artifact: "cluster model",
                reason: e.to_string(),
            })?;
        Self::new(centers, artifact.metric)
    }

    pub fn k(&self) -> usize {
        self.centers.nrows()
    }

    pub fn dim(&self) -> usize {
        self.centers.ncols()
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// Argmin over centroid distances. Ties go to the lowest index.
    pub fn assign(&self, vector: &FeatureVector) -> Result<Assignment, ScoringError> {
        if vector.len() != self.dim() {
            return Err(ScoringError::DimensionMismatch {
                expected: self.dim(),
                actual: vector.len(),
            });
        }

        let mut best: Option<(usize, f64)> = None;
        for (index, center) in self.centers.rows().into_iter().enumerate() {
            let distance = self.metric.distance(vector.view(), center);
            if !distance.is_finite() {
                return Err(ScoringError::NonFiniteDistance { index });
            }
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((index, distance));
            }
        }

        // k >= 1 is enforced at construction
        let (nearest, distance) = best.unwrap_or((0, 0.0));
        Ok(Assignment {
            cluster_id: nearest.min(MAX_CLUSTER_ID),
            nearest,
            distance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1};
    use rstest::rstest;

    fn model(rows: Vec<Vec<f64>>) -> ClusterModel {
        ClusterModel::from_artifact(CentroidArtifact {
            cluster_centers: rows,
            metric: Metric::Euclidean,
        })
        .unwrap()
    }

    #[rstest]
    #[case(array![0.1, 0.0], 0)]
    #[case(array![0.9, 1.1], 1)]
    #[case(array![5.0, -4.0], 2)]
    fn picks_nearest_centroid(#[case] v: Array1<f64>, #[case] expected: usize) {
        let m = model(vec![vec![0.0, 0.0], vec![1.0, 1.0], vec![5.0, -5.0]]);
        assert_eq!(m.assign(&v).unwrap().nearest, expected);
    }

    #[test]
    fn reports_euclidean_distance() {
        let m = model(vec![vec![0.0, 0.0], vec![10.0, 10.0]]);
        let a = m.assign(&array![3.0, 4.0]).unwrap();
        assert_eq!(a.cluster_id, 0);
        assert!((a.distance - 5.0).abs() < 1e-12);
    }

    #[test]
    fn ties_go_to_lowest_index() {
        let m = model(vec![vec![1.0, 0.0], vec![-1.0, 0.0], vec![0.0, 1.0]]);
        let a = m.assign(&array![0.0, 0.0]).unwrap();
        assert_eq!(a.nearest, 0);
    }

    #[test]
    fn cluster_id_clamped_to_label_range() {
        let mut rows: Vec<Vec<f64>> = (0..8).map(|i| vec![i as f64 * 10.0]).collect();
        rows.reverse();
        let m = model(rows);
        // nearest row is index 7 (value 0.0)
        let a = m.assign(&array![0.0]).unwrap();
        assert_eq!(a.nearest, 7);
        assert_eq!(a.cluster_id, MAX_CLUSTER_ID);
    }

    #[test]
    fn dimension_mismatch_is_scoring_error() {
        let m = model(vec![vec![0.0, 0.0, 0.0]]);
        assert!(matches!(
            m.assign(&array![1.0, 2.0]),
            Err(ScoringError::DimensionMismatch { expected: 3, actual: 2 })
        ));
    }

    #[test]
    fn nan_vector_is_scoring_error() {
        let m = model(vec![vec![0.0, 0.0]]);
        assert!(matches!(
            m.assign(&array![f64::NAN, 0.0]),
            Err(ScoringError::NonFiniteDistance { index: 0 })
        ));
    }

    #[test]
    fn cosine_metric() {
        let m = ClusterModel::from_artifact(CentroidArtifact {
            cluster_centers: vec![vec![1.0, 0.0], vec![0.0, 1.0]],
            metric: Metric::Cosine,
        })
        .unwrap();
        let a = m.assign(&array![0.0, 3.0]).unwrap();
        assert_eq!(a.nearest, 1);
        assert!(a.distance.abs() < 1e-12);
        // zero vector is equally far from everything
        let z = m.assign(&array![0.0, 0.0]).unwrap();
        assert_eq!((z.nearest, z.distance), (0, 1.0));
    }

    #[test]
    fn scoring_is_deterministic() {
        let m = model(vec![vec![0.2, 0.4, 0.1], vec![0.9, 0.1, 0.3]]);
        let v = array![0.5, 0.25, 0.2];
        assert_eq!(m.assign(&v).unwrap(), m.assign(&v).unwrap());
    }

    #[test]
    fn ragged_rows_rejected() {
        let err = ClusterModel::from_artifact(CentroidArtifact {
            cluster_centers: vec![vec![0.0, 1.0], vec![2.0]],
            metric: Metric::Euclidean,
        })
        .unwrap_err();
        assert!(err.to_string().contains("centroid 1"));
    }

    #[test]
    fn empty_model_rejected() {
        let empty = CentroidArtifact {
            cluster_centers: vec![],
            metric: Metric::Euclidean,
        };
        assert!(ClusterModel::from_artifact(empty).is_err());
        assert!(ClusterModel::new(Array2::zeros((2, 0)), Metric::Euclidean).is_err());
    }

    #[test]
    fn metric_defaults_to_euclidean_in_json() {
        let artifact: CentroidArtifact =
            serde_json::from_str(r#"{"cluster_centers": [[0.0]]}"#).unwrap();
        assert_eq!(artifact.metric, Metric::Euclidean);
    }
}
