use crate::application::features::advanced_indicators::calculate_all_features;
use crate::application::features::window_assembler::{PreparedFeatures, assemble_window};
use crate::domain::errors::{FeatureError, HistoryStage, MarketDataError};
use crate::domain::market::IndexSeries;
use crate::domain::ml::WINDOW_SIZE;
use crate::domain::ports::PriceHistoryProvider;
use std::sync::Arc;
use tracing::{debug, info};

/// Fewest raw bars accepted before any indicator is computed.
pub const MIN_RAW_BARS: usize = 70;

/// Calendar days of history requested per symbol.
pub const DEFAULT_HISTORY_DAYS: usize = 250;

/// Per-symbol feature preparation: fetch, both indicator engines, window
/// assembly. Usable on its own, without a classifier.
pub struct FeaturePipeline {
    prices: Arc<dyn PriceHistoryProvider>,
    history_days: usize,
    min_raw_bars: usize,
}

impl FeaturePipeline {
    pub fn new(prices: Arc<dyn PriceHistoryProvider>) -> Self {
        Self {
            prices,
            history_days: DEFAULT_HISTORY_DAYS,
            min_raw_bars: MIN_RAW_BARS,
        }
    }

    pub fn with_history_days(mut self, days: usize) -> Self {
        self.history_days = days;
        self
    }

    pub fn with_min_raw_bars(mut self, bars: usize) -> Self {
        self.min_raw_bars = bars;
        self
    }

    pub fn history_days(&self) -> usize {
        self.history_days
    }

    pub fn prepare(
        &self,
        symbol: &str,
        index: Option<&IndexSeries>,
    ) -> Result<PreparedFeatures, FeatureError> {
        let bars = self
            .prices
            .fetch(symbol, self.history_days)
            .map_err(|e| match e {
                MarketDataError::Unavailable { reason, .. } => FeatureError::DataUnavailable {
                    symbol: symbol.to_string(),
                    reason,
                },
                MarketDataError::Malformed { .. } => FeatureError::DataUnavailable {
                    symbol: symbol.to_string(),
                    reason: e.to_string(),
                },
            })?;

        if bars.len() < self.min_raw_bars {
            return Err(FeatureError::InsufficientHistory {
                symbol: symbol.to_string(),
                stage: HistoryStage::RawBars,
                available: bars.len(),
                required: self.min_raw_bars,
            });
        }
        debug!("{}: fetched {} bars", symbol, bars.len());

        let table =
            calculate_all_features(&bars, index).map_err(|e| FeatureError::FeatureComputation {
                symbol: symbol.to_string(),
                reason: e.to_string(),
            })?;

        if table.len() < WINDOW_SIZE {
            return Err(FeatureError::InsufficientHistory {
                symbol: symbol.to_string(),
                stage: HistoryStage::FeatureRows,
                available: table.len(),
                required: WINDOW_SIZE,
            });
        }

        let window_end = table.bars().last().map(|b| b.date);
        let latest = bars.last().map(|b| b.date);
        if let (Some(window_end), Some(latest)) = (window_end, latest) {
            if window_end != latest {
                return Err(FeatureError::StaleWindow {
                    symbol: symbol.to_string(),
                    window_end,
                    latest,
                });
            }
        }

        let prepared = assemble_window(symbol, &table)?;
        info!(
            "{}: prepared {}-day window from {} valid rows (latest close {:.2})",
            symbol,
            WINDOW_SIZE,
            table.len(),
            prepared.latest_close
        );
        Ok(prepared)
    }
}
