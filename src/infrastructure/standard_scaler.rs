use crate::domain::errors::ArtifactError;
use crate::domain::ml::{FEATURE_COLS, FEATURE_COUNT};
use crate::domain::ports::FeatureScaler;
use anyhow::{Result, ensure};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Per-column standardisation `(x - mean) / scale`, fit offline on the
/// training windows and stored as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    #[serde(alias = "mean_")]
    mean: Vec<f64>,
    #[serde(alias = "scale_")]
    scale: Vec<f64>,
    /// Column names the scaler was fit on, when exported.
    #[serde(default, alias = "feature_names_in_", skip_serializing_if = "Option::is_none")]
    feature_names: Option<Vec<String>>,
}

impl StandardScaler {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self> {
        let scaler = Self {
            mean,
            scale,
            feature_names: None,
        };
        scaler.validate()?;
        Ok(scaler)
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            self.mean.len() == FEATURE_COUNT && self.scale.len() == FEATURE_COUNT,
            "Scaler must have {} means and scales, got {} and {}",
            FEATURE_COUNT,
            self.mean.len(),
            self.scale.len()
        );
        ensure!(
            self.scale.iter().all(|s| s.is_finite() && *s != 0.0),
            "Scaler scale entries must be finite and non-zero"
        );
        if let Some(names) = &self.feature_names {
            ensure!(
                names.iter().map(String::as_str).eq(FEATURE_COLS.iter().copied()),
                "Scaler was fit on a different feature order"
            );
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let scaler: StandardScaler = serde_json::from_str(json)?;
        scaler.validate()?;
        Ok(scaler)
    }

    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        if !path.exists() {
            return Err(ArtifactError::Missing {
                path: path.to_path_buf(),
            });
        }
        let invalid = |reason: String| ArtifactError::Invalid {
            path: path.to_path_buf(),
            reason,
        };
        let content = fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
        let scaler = Self::from_json(&content).map_err(|e| invalid(format!("{:#}", e)))?;
        info!("Loaded feature scaler from {:?}", path);
        Ok(scaler)
    }
}

impl FeatureScaler for StandardScaler {
    fn transform(&self, features: &Array2<f64>) -> Result<Array2<f64>> {
        ensure!(
            features.ncols() == FEATURE_COUNT,
            "Scaler expects {} columns, got {}",
            FEATURE_COUNT,
            features.ncols()
        );
        let mean = Array1::from(self.mean.clone()).insert_axis(Axis(0));
        let scale = Array1::from(self.scale.clone()).insert_axis(Axis(0));
        Ok((features - &mean) / &scale)
    }

    fn n_features(&self) -> usize {
        FEATURE_COUNT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scaler() -> StandardScaler {
        let mean = (0..FEATURE_COUNT).map(|i| i as f64).collect();
        let scale = (0..FEATURE_COUNT).map(|i| (i + 1) as f64).collect();
        StandardScaler::new(mean, scale).unwrap()
    }

    #[test]
    fn test_transform_is_per_column() {
        let input = Array2::from_shape_fn((60, FEATURE_COUNT), |(r, c)| {
            c as f64 + r as f64 * (c + 1) as f64
        });
        let scaled = scaler().transform(&input).unwrap();

        assert_eq!(scaled.dim(), (60, FEATURE_COUNT));
        for ((r, _c), v) in scaled.indexed_iter() {
            assert!((v - r as f64).abs() < 1e-9);
        }
    }

    #[test]
    fn test_accepts_sklearn_keys() {
        let mean: Vec<f64> = vec![1.0; FEATURE_COUNT];
        let scale: Vec<f64> = vec![2.0; FEATURE_COUNT];
        let json = serde_json::json!({ "mean_": mean, "scale_": scale }).to_string();

        let scaler = StandardScaler::from_json(&json).unwrap();
        let out = scaler.transform(&Array2::from_elem((60, FEATURE_COUNT), 5.0)).unwrap();
        assert!(out.iter().all(|v| (*v - 2.0).abs() < 1e-12));
    }

    #[test]
    fn test_rejects_wrong_length_and_zero_scale() {
        assert!(StandardScaler::new(vec![0.0; 46], vec![1.0; 46]).is_err());
        assert!(StandardScaler::new(vec![0.0; FEATURE_COUNT], vec![0.0; FEATURE_COUNT]).is_err());
    }

    #[test]
    fn test_rejects_reordered_feature_names() {
        let mut names: Vec<&str> = FEATURE_COLS.to_vec();
        names.swap(0, 1);
        let json = serde_json::json!({
            "mean": vec![0.0; FEATURE_COUNT],
            "scale": vec![1.0; FEATURE_COUNT],
            "feature_names": names,
        })
        .to_string();
        assert!(StandardScaler::from_json(&json).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = StandardScaler::load(Path::new("/nonexistent/feature_scaler.json")).unwrap_err();
        assert!(matches!(err, ArtifactError::Missing { .. }));
    }
}
