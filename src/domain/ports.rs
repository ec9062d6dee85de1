use crate::domain::errors::{ArtifactError, MarketDataError};
use crate::domain::market::{IndexSeries, PriceBar};
use anyhow::Result;
use ndarray::Array2;

/// Source of daily price history for a symbol.
///
/// Implementations return bars in ascending date order, or an explicit
/// [`MarketDataError::Unavailable`]. Partial or corrupt sequences are errors.
pub trait PriceHistoryProvider: Send + Sync {
    fn fetch(&self, symbol: &str, days: usize) -> Result<Vec<PriceBar>, MarketDataError>;
}

/// Source of the reference market index (NIFTY 50) closes.
pub trait IndexHistoryProvider: Send + Sync {
    fn fetch_index(&self, days: usize) -> Result<IndexSeries, MarketDataError>;
}

/// Pre-fit per-column feature scaler.
pub trait FeatureScaler: Send + Sync {
    /// Scales a `(rows, FEATURE_COUNT)` matrix column by column.
    fn transform(&self, features: &Array2<f64>) -> Result<Array2<f64>>;

    fn n_features(&self) -> usize;
}

/// Pre-fit binary direction classifier over a flattened `(1, FLAT_INPUT_LEN)` input.
pub trait DirectionClassifier: Send + Sync {
    /// Binary label: 1 = up, 0 = down.
    fn predict(&self, input: &Array2<f64>) -> Result<u8>;

    /// Class probabilities as `[p_down, p_up]`.
    fn predict_proba(&self, input: &Array2<f64>) -> Result<[f64; 2]>;

    /// Label and probabilities together. Implementations backed by a single
    /// inference call should override this to run it once.
    fn classify(&self, input: &Array2<f64>) -> Result<(u8, [f64; 2])> {
        Ok((self.predict(input)?, self.predict_proba(input)?))
    }

    fn name(&self) -> &str;
}

/// Scaler and classifier, loaded once and shared read-only for a batch run.
pub struct ModelArtifacts {
    pub scaler: Box<dyn FeatureScaler>,
    pub classifier: Box<dyn DirectionClassifier>,
}

impl std::fmt::Debug for ModelArtifacts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelArtifacts")
            .field("scaler_features", &self.scaler.n_features())
            .field("classifier", &self.classifier.name())
            .finish()
    }
}

/// Supplies the pretrained artifacts, or fails if they are absent.
pub trait ArtifactStore {
    fn load(&self) -> Result<ModelArtifacts, ArtifactError>;
}
