//! Model artifact locations.

use super::EnvLookup;
use std::path::PathBuf;

pub const DEFAULT_MODEL_PATH: &str = "data/models/stock_direction_predictor.onnx";
pub const DEFAULT_SCALER_PATH: &str = "data/models/feature_scaler.json";

#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactEnvConfig {
    pub model_path: PathBuf,
    pub scaler_path: PathBuf,
}

impl Default for ArtifactEnvConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            scaler_path: PathBuf::from(DEFAULT_SCALER_PATH),
        }
    }
}

impl ArtifactEnvConfig {
    pub fn from_lookup(lookup: &EnvLookup) -> Self {
        Self {
            model_path: lookup("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH)),
            scaler_path: lookup("SCALER_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SCALER_PATH)),
        }
    }
}
