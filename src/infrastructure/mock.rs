//! In-memory collaborators for tests and demos.

use crate::domain::errors::{ArtifactError, MarketDataError};
use crate::domain::market::{IndexSeries, PriceBar};
use crate::domain::ml::FEATURE_COUNT;
use crate::domain::ports::{
    ArtifactStore, DirectionClassifier, FeatureScaler, IndexHistoryProvider, ModelArtifacts,
    PriceHistoryProvider,
};
use anyhow::Result;
use ndarray::Array2;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

#[derive(Default)]
pub struct InMemoryPriceProvider {
    bars: RwLock<HashMap<String, Vec<PriceBar>>>,
}

impl InMemoryPriceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, symbol: &str, mut bars: Vec<PriceBar>) {
        bars.sort_by_key(|b| b.date);
        if let Ok(mut map) = self.bars.write() {
            map.insert(symbol.to_string(), bars);
        }
    }
}

impl PriceHistoryProvider for InMemoryPriceProvider {
    fn fetch(&self, symbol: &str, days: usize) -> Result<Vec<PriceBar>, MarketDataError> {
        let map = self.bars.read().map_err(|e| MarketDataError::Unavailable {
            symbol: symbol.to_string(),
            reason: format!("lock poisoned: {}", e),
        })?;
        let bars = map.get(symbol).ok_or_else(|| MarketDataError::Unavailable {
            symbol: symbol.to_string(),
            reason: "symbol not loaded".to_string(),
        })?;
        let skip = bars.len().saturating_sub(days);
        Ok(bars[skip..].to_vec())
    }
}

/// Serves a fixed index series, or reports it unavailable when empty.
#[derive(Default)]
pub struct InMemoryIndexProvider {
    series: Option<IndexSeries>,
}

impl InMemoryIndexProvider {
    pub fn new(series: IndexSeries) -> Self {
        Self {
            series: Some(series),
        }
    }

    pub fn unavailable() -> Self {
        Self::default()
    }
}

impl IndexHistoryProvider for InMemoryIndexProvider {
    fn fetch_index(&self, days: usize) -> Result<IndexSeries, MarketDataError> {
        let series = self.series.as_ref().ok_or_else(|| MarketDataError::Unavailable {
            symbol: "NIFTY 50".to_string(),
            reason: "no index loaded".to_string(),
        })?;
        let skip = series.len().saturating_sub(days);
        Ok(IndexSeries::new(series.points()[skip..].to_vec()))
    }
}

/// Passes the window through unchanged.
pub struct IdentityScaler;

impl FeatureScaler for IdentityScaler {
    fn transform(&self, features: &Array2<f64>) -> Result<Array2<f64>> {
        Ok(features.clone())
    }

    fn n_features(&self) -> usize {
        FEATURE_COUNT
    }
}

/// Always predicts the same label with the same confidence.
pub struct StaticClassifier {
    label: u8,
    confidence: f64,
}

impl StaticClassifier {
    pub fn new(label: u8, confidence: f64) -> Self {
        Self { label, confidence }
    }
}

impl DirectionClassifier for StaticClassifier {
    fn predict(&self, _input: &Array2<f64>) -> Result<u8> {
        Ok(self.label)
    }

    fn predict_proba(&self, _input: &Array2<f64>) -> Result<[f64; 2]> {
        Ok(if self.label == 1 {
            [1.0 - self.confidence, self.confidence]
        } else {
            [self.confidence, 1.0 - self.confidence]
        })
    }

    fn name(&self) -> &str {
        "static"
    }
}

enum StoredArtifacts {
    Static { label: u8, confidence: f64 },
    Missing(PathBuf),
}

pub struct InMemoryArtifactStore {
    stored: StoredArtifacts,
}

impl InMemoryArtifactStore {
    /// Identity scaler plus a [`StaticClassifier`].
    pub fn with_static_classifier(label: u8, confidence: f64) -> Self {
        Self {
            stored: StoredArtifacts::Static { label, confidence },
        }
    }

    /// Behaves like a store whose artifact file at `path` is absent.
    pub fn missing(path: PathBuf) -> Self {
        Self {
            stored: StoredArtifacts::Missing(path),
        }
    }
}

impl ArtifactStore for InMemoryArtifactStore {
    fn load(&self) -> Result<ModelArtifacts, ArtifactError> {
        match &self.stored {
            StoredArtifacts::Static { label, confidence } => Ok(ModelArtifacts {
                scaler: Box::new(IdentityScaler),
                classifier: Box::new(StaticClassifier::new(*label, *confidence)),
            }),
            StoredArtifacts::Missing(path) => Err(ArtifactError::Missing { path: path.clone() }),
        }
    }
}
