use crate::application::features::window_assembler::{FeatureWindow, flatten_window};
use crate::domain::ml::{DirectionPrediction, FEATURE_COUNT, FLAT_INPUT_LEN, WINDOW_SIZE};
use crate::domain::ports::ModelArtifacts;
use anyhow::{Context, Result, bail};
use tracing::debug;

/// Runs one feature window through the scaler and classifier.
///
/// The scaler sees the window as 60 samples of 47 features. The classifier
/// sees the scaled window flattened to a single 2820-wide row, day by day.
pub struct DirectionPredictor<'a> {
    artifacts: &'a ModelArtifacts,
}

impl<'a> DirectionPredictor<'a> {
    pub fn new(artifacts: &'a ModelArtifacts) -> Self {
        Self { artifacts }
    }

    pub fn predict(&self, window: &FeatureWindow) -> Result<DirectionPrediction> {
        let scaled = self
            .artifacts
            .scaler
            .transform(window.matrix())
            .context("Feature scaling failed")?;
        if scaled.dim() != (WINDOW_SIZE, FEATURE_COUNT) {
            bail!(
                "Scaler returned shape {:?}, expected ({}, {})",
                scaled.dim(),
                WINDOW_SIZE,
                FEATURE_COUNT
            );
        }

        let flat = flatten_window(&scaled)?;
        debug_assert_eq!(flat.dim(), (1, FLAT_INPUT_LEN));

        let classifier = &self.artifacts.classifier;
        let (label, [probability_down, probability_up]) = classifier
            .classify(&flat)
            .context("Classifier prediction failed")?;
        if label > 1 {
            bail!("Classifier returned unknown label {}", label);
        }

        debug!(
            "{}: label={} p_up={:.4} p_down={:.4}",
            classifier.name(),
            label,
            probability_up,
            probability_down
        );
        Ok(DirectionPrediction::new(label, probability_down, probability_up))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ml::{Direction, Feature};
    use crate::domain::ports::{DirectionClassifier, FeatureScaler};
    use crate::infrastructure::mock::{IdentityScaler, StaticClassifier};
    use ndarray::Array2;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Labels UP when the flat input holds `expected` at `position`.
    struct CellCheckClassifier {
        position: usize,
        expected: f64,
    }

    impl DirectionClassifier for CellCheckClassifier {
        fn predict(&self, input: &Array2<f64>) -> Result<u8> {
            Ok(u8::from(input[[0, self.position]] == self.expected))
        }

        fn predict_proba(&self, input: &Array2<f64>) -> Result<[f64; 2]> {
            Ok(if self.predict(input)? == 1 {
                [0.1, 0.9]
            } else {
                [0.9, 0.1]
            })
        }

        fn name(&self) -> &str {
            "cell-check"
        }
    }

    struct DoublingScaler;

    impl FeatureScaler for DoublingScaler {
        fn transform(&self, features: &Array2<f64>) -> Result<Array2<f64>> {
            Ok(features * 2.0)
        }

        fn n_features(&self) -> usize {
            FEATURE_COUNT
        }
    }

    fn window() -> FeatureWindow {
        let matrix = Array2::from_shape_fn((WINDOW_SIZE, FEATURE_COUNT), |(day, feature)| {
            (day * 1000 + feature) as f64
        });
        FeatureWindow::from_matrix(matrix).unwrap()
    }

    #[test]
    fn test_stub_classifier_up_with_confidence() {
        let artifacts = ModelArtifacts {
            scaler: Box::new(IdentityScaler),
            classifier: Box::new(StaticClassifier::new(1, 0.8)),
        };
        let prediction = DirectionPredictor::new(&artifacts).predict(&window()).unwrap();

        assert_eq!(prediction.direction, Direction::Up);
        assert_eq!(prediction.prediction, 1);
        assert!((prediction.confidence - 0.8).abs() < 1e-12);
        assert!((prediction.probability_down - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_classifier_sees_scaled_window_then_feature_order() {
        let day = 42;
        let feature = Feature::HurstExponent.index();
        let artifacts = ModelArtifacts {
            scaler: Box::new(DoublingScaler),
            classifier: Box::new(CellCheckClassifier {
                position: day * FEATURE_COUNT + feature,
                expected: 2.0 * (day * 1000 + feature) as f64,
            }),
        };
        let prediction = DirectionPredictor::new(&artifacts).predict(&window()).unwrap();
        assert_eq!(prediction.direction, Direction::Up);
        assert!((prediction.confidence - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_feature_major_flattening_would_be_detected() {
        // Same cell addressed feature-first lands on a different value
        let day = 42;
        let feature = Feature::HurstExponent.index();
        let artifacts = ModelArtifacts {
            scaler: Box::new(IdentityScaler),
            classifier: Box::new(CellCheckClassifier {
                position: feature * WINDOW_SIZE + day,
                expected: (day * 1000 + feature) as f64,
            }),
        };
        let prediction = DirectionPredictor::new(&artifacts).predict(&window()).unwrap();
        assert_eq!(prediction.direction, Direction::Down);
    }

    static INFERENCE_PASSES: AtomicUsize = AtomicUsize::new(0);

    /// Counts inference passes; the split methods fail if used.
    struct CountingClassifier;

    impl DirectionClassifier for CountingClassifier {
        fn predict(&self, _input: &Array2<f64>) -> Result<u8> {
            bail!("predict called separately")
        }

        fn predict_proba(&self, _input: &Array2<f64>) -> Result<[f64; 2]> {
            bail!("predict_proba called separately")
        }

        fn classify(&self, _input: &Array2<f64>) -> Result<(u8, [f64; 2])> {
            INFERENCE_PASSES.fetch_add(1, Ordering::SeqCst);
            Ok((0, [0.65, 0.35]))
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    #[test]
    fn test_single_inference_pass_per_window() {
        let artifacts = ModelArtifacts {
            scaler: Box::new(IdentityScaler),
            classifier: Box::new(CountingClassifier),
        };
        let prediction = DirectionPredictor::new(&artifacts).predict(&window()).unwrap();

        assert_eq!(prediction.direction, Direction::Down);
        assert!((prediction.confidence - 0.65).abs() < 1e-12);
        assert_eq!(INFERENCE_PASSES.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_default_classify_combines_label_and_probabilities() {
        let input = Array2::zeros((1, FLAT_INPUT_LEN));
        let (label, proba) = StaticClassifier::new(1, 0.8).classify(&input).unwrap();
        assert_eq!(label, 1);
        assert!((proba[1] - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_reshaping_scaler() {
        struct Truncating;
        impl FeatureScaler for Truncating {
            fn transform(&self, _features: &Array2<f64>) -> Result<Array2<f64>> {
                Ok(Array2::zeros((1, FEATURE_COUNT)))
            }
            fn n_features(&self) -> usize {
                FEATURE_COUNT
            }
        }

        let artifacts = ModelArtifacts {
            scaler: Box::new(Truncating),
            classifier: Box::new(StaticClassifier::new(0, 0.6)),
        };
        assert!(DirectionPredictor::new(&artifacts).predict(&window()).is_err());
    }
}
