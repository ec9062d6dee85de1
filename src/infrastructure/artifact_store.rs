use crate::domain::errors::ArtifactError;
use crate::domain::ports::{ArtifactStore, ModelArtifacts};
use crate::infrastructure::onnx_classifier::OnnxDirectionClassifier;
use crate::infrastructure::standard_scaler::StandardScaler;
use std::path::PathBuf;

/// Loads the scaler JSON and the ONNX classifier from disk.
pub struct FileArtifactStore {
    model_path: PathBuf,
    scaler_path: PathBuf,
}

impl FileArtifactStore {
    pub fn new(model_path: impl Into<PathBuf>, scaler_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            scaler_path: scaler_path.into(),
        }
    }
}

impl ArtifactStore for FileArtifactStore {
    fn load(&self) -> Result<ModelArtifacts, ArtifactError> {
        // Both files must exist before either is parsed
        for path in [&self.model_path, &self.scaler_path] {
            if !path.exists() {
                return Err(ArtifactError::Missing { path: path.clone() });
            }
        }

        let scaler = StandardScaler::load(&self.scaler_path)?;
        let classifier = OnnxDirectionClassifier::load(&self.model_path)?;
        Ok(ModelArtifacts {
            scaler: Box::new(scaler),
            classifier: Box::new(classifier),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_missing_model_reported_before_scaler_is_read() {
        let dir = std::env::temp_dir().join(format!("stock_curator_artifacts_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let scaler_path = dir.join("feature_scaler.json");
        fs::write(&scaler_path, "not json").unwrap();

        let store = FileArtifactStore::new(dir.join("missing.onnx"), &scaler_path);
        match store.load() {
            Err(ArtifactError::Missing { path }) => assert_eq!(path, dir.join("missing.onnx")),
            other => panic!("expected Missing, got {other:?}"),
        }
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_missing_scaler() {
        let store = FileArtifactStore::new("/nonexistent/a.onnx", "/nonexistent/b.json");
        assert!(matches!(store.load(), Err(ArtifactError::Missing { .. })));
    }
}
