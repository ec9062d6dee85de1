use crate::application::features::FeaturePipeline;
use crate::application::ml::direction_predictor::DirectionPredictor;
use crate::domain::errors::{ArtifactError, FeatureError};
use crate::domain::market::IndexSeries;
use crate::domain::ml::{PredictionResult, feature_registry::feature_schema_fingerprint};
use crate::domain::ports::{ArtifactStore, IndexHistoryProvider, ModelArtifacts};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{error, info, warn};

/// Outcome of one batch run, keyed by symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub results: BTreeMap<String, PredictionResult>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn success_count(&self) -> usize {
        self.results.values().filter(|r| r.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.total() - self.success_count()
    }

    /// Successful share of the batch in `[0, 1]`; 0 for an empty batch.
    pub fn success_rate(&self) -> f64 {
        if self.results.is_empty() {
            return 0.0;
        }
        self.success_count() as f64 / self.total() as f64
    }

    /// `(symbol, reason)` for every failed symbol.
    pub fn failures(&self) -> Vec<(&str, &str)> {
        self.results
            .values()
            .filter_map(|r| r.error().map(|e| (r.symbol(), e)))
            .collect()
    }

    pub fn get(&self, symbol: &str) -> Option<&PredictionResult> {
        self.results.get(symbol)
    }
}

/// Fetches the market index once for a batch. A failure is not fatal: the
/// batch falls back to neutral market-context features.
pub fn load_index(provider: &dyn IndexHistoryProvider, days: usize) -> Option<IndexSeries> {
    match provider.fetch_index(days) {
        Ok(series) if !series.is_empty() => {
            info!("Loaded {} index closes", series.len());
            Some(series)
        }
        Ok(_) => {
            warn!("Index history is empty, market-context features will be neutral");
            None
        }
        Err(e) => {
            warn!("Index history unavailable ({}), market-context features will be neutral", e);
            None
        }
    }
}

/// Batch entry point: loads the model artifacts once, then prepares and
/// predicts every symbol independently.
pub struct BatchPredictor {
    pipeline: FeaturePipeline,
    artifacts: ModelArtifacts,
    parallel: bool,
}

impl BatchPredictor {
    pub fn new(pipeline: FeaturePipeline, artifacts: ModelArtifacts) -> Self {
        Self {
            pipeline,
            artifacts,
            parallel: false,
        }
    }

    /// Loads the artifacts from `store`. A missing or unreadable artifact
    /// aborts before any symbol is touched.
    pub fn load(pipeline: FeaturePipeline, store: &dyn ArtifactStore) -> Result<Self, ArtifactError> {
        let artifacts = store.load()?;
        info!(
            "Loaded model artifacts: classifier={} scaler_features={} schema={}",
            artifacts.classifier.name(),
            artifacts.scaler.n_features(),
            feature_schema_fingerprint()
        );
        Ok(Self::new(pipeline, artifacts))
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn pipeline(&self) -> &FeaturePipeline {
        &self.pipeline
    }

    /// Runs the full chain for one symbol. Never fails: every error becomes
    /// a FAILED result.
    pub fn predict_symbol(&self, symbol: &str, index: Option<&IndexSeries>) -> PredictionResult {
        let prepared = match self.pipeline.prepare(symbol, index) {
            Ok(prepared) => prepared,
            Err(e) => {
                warn!("{}", e);
                return PredictionResult::Failed {
                    symbol: symbol.to_string(),
                    error: e.to_string(),
                    latest_close: None,
                };
            }
        };

        match DirectionPredictor::new(&self.artifacts).predict(&prepared.window) {
            Ok(prediction) => {
                info!(
                    "{}: {} ({:.1}% confidence)",
                    symbol,
                    prediction.direction,
                    prediction.confidence * 100.0
                );
                PredictionResult::Success {
                    symbol: symbol.to_string(),
                    direction: prediction.direction,
                    probability_up: prediction.probability_up,
                    probability_down: prediction.probability_down,
                    confidence: prediction.confidence,
                    latest_close: prepared.latest_close,
                    historical_data: prepared.ohlcv,
                }
            }
            Err(e) => {
                let err = FeatureError::Prediction {
                    symbol: symbol.to_string(),
                    reason: format!("{:#}", e),
                };
                error!("{}", err);
                PredictionResult::Failed {
                    symbol: symbol.to_string(),
                    error: err.to_string(),
                    latest_close: Some(prepared.latest_close),
                }
            }
        }
    }

    /// Predicts every symbol in `symbols`. Symbols are independent, so the
    /// run may be spread across the rayon pool.
    pub fn run(&self, symbols: &BTreeSet<String>, index: Option<&IndexSeries>) -> BatchReport {
        if index.is_none() {
            warn!("No index series for this batch, using neutral market-context features");
        }
        info!(
            "Predicting {} symbols ({})",
            symbols.len(),
            if self.parallel { "parallel" } else { "sequential" }
        );

        let results: BTreeMap<String, PredictionResult> = if self.parallel {
            symbols
                .par_iter()
                .map(|symbol| (symbol.clone(), self.predict_symbol(symbol, index)))
                .collect()
        } else {
            symbols
                .iter()
                .map(|symbol| (symbol.clone(), self.predict_symbol(symbol, index)))
                .collect()
        };

        let report = BatchReport { results };
        info!(
            "Predictions: {}/{} successful ({:.1}%)",
            report.success_count(),
            report.total(),
            report.success_rate() * 100.0
        );
        for (symbol, reason) in report.failures() {
            warn!("Failed: {} - {}", symbol, reason);
        }
        report
    }
}
