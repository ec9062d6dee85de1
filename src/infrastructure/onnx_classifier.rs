use crate::domain::errors::ArtifactError;
use crate::domain::ml::FLAT_INPUT_LEN;
use crate::domain::ports::DirectionClassifier;
use anyhow::{Result, anyhow, ensure};
use ndarray::Array2;
use ort::session::Session;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

/// Gradient-boosted direction classifier exported to ONNX.
///
/// Expects one float input of shape `[1, 2820]` and two outputs: the
/// predicted label (int64) followed by the class probabilities
/// `[p_down, p_up]` (float).
pub struct OnnxDirectionClassifier {
    session: Mutex<Session>,
    model_path: PathBuf,
}

impl OnnxDirectionClassifier {
    pub fn load(model_path: &Path) -> Result<Self, ArtifactError> {
        if !model_path.exists() {
            return Err(ArtifactError::Missing {
                path: model_path.to_path_buf(),
            });
        }
        let invalid = |reason: String| ArtifactError::Invalid {
            path: model_path.to_path_buf(),
            reason,
        };

        let session = Session::builder()
            .map_err(|e| invalid(format!("Failed to create ONNX session builder: {}", e)))?
            .commit_from_file(model_path)
            .map_err(|e| invalid(format!("Failed to load ONNX model: {}", e)))?;

        info!("Successfully loaded ONNX model from {:?}", model_path);
        Ok(Self {
            session: Mutex::new(session),
            model_path: model_path.to_path_buf(),
        })
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    fn infer(&self, input: &Array2<f64>) -> Result<(u8, [f64; 2])> {
        ensure!(
            input.dim() == (1, FLAT_INPUT_LEN),
            "Classifier expects a 1x{} input, got {:?}",
            FLAT_INPUT_LEN,
            input.dim()
        );

        let flat_data: Vec<f32> = input.iter().map(|v| *v as f32).collect();
        let shape = vec![1, FLAT_INPUT_LEN];
        let input_value = ort::value::Value::from_array((shape.as_slice(), flat_data))
            .map_err(|e| anyhow!("Input value creation failed: {}", e))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow!("Mutex lock failed: {}", e))?;
        let outputs = session
            .run(ort::inputs![input_value])
            .map_err(|e| anyhow!("ONNX inference failed: {}", e))?;

        let mut values = outputs.iter().map(|(_, v)| v);
        let label_value = values.next().ok_or_else(|| anyhow!("No label output found"))?;
        let proba_value = values
            .next()
            .ok_or_else(|| anyhow!("No probability output found"))?;

        let labels = label_value
            .try_extract_tensor::<i64>()
            .map_err(|e| anyhow!("Label extraction failed: {}", e))?;
        let label = *labels.1.iter().next().ok_or_else(|| anyhow!("Empty label output"))?;

        let proba = proba_value
            .try_extract_tensor::<f32>()
            .map_err(|e| anyhow!("Probability extraction failed: {}", e))?;
        let proba: Vec<f64> = proba.1.iter().map(|p| f64::from(*p)).collect();
        ensure!(
            proba.len() >= 2,
            "Expected two class probabilities, got {}",
            proba.len()
        );

        debug!("ONNX output: label={} proba={:?}", label, &proba[..2]);
        let label = u8::try_from(label).map_err(|_| anyhow!("Label out of range: {}", label))?;
        Ok((label, [proba[0], proba[1]]))
    }
}

impl DirectionClassifier for OnnxDirectionClassifier {
    fn predict(&self, input: &Array2<f64>) -> Result<u8> {
        self.infer(input).map(|(label, _)| label)
    }

    fn predict_proba(&self, input: &Array2<f64>) -> Result<[f64; 2]> {
        self.infer(input).map(|(_, proba)| proba)
    }

    fn classify(&self, input: &Array2<f64>) -> Result<(u8, [f64; 2])> {
        self.infer(input)
    }

    fn name(&self) -> &str {
        "ONNX Runtime (gradient boosting)"
    }
}
