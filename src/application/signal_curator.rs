//! Turns a batch of direction predictions into the day's curated signals.
//!
//! The LLM side only contributes its action and reason text; the
//! recommendation itself comes from ML confidence alone.

use crate::application::ml::BatchReport;
use crate::domain::ml::PredictionResult;
use crate::domain::signals::{CombinedSignal, LlmRecommendation, Recommendation};
use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

pub const PIPELINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Confidence at or above which a direction becomes a strong signal.
pub const DEFAULT_STRONG_SIGNAL_CONFIDENCE: f64 = 0.7;

const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// India Standard Time, UTC+05:30.
pub fn ist_offset() -> FixedOffset {
    FixedOffset::east_opt(IST_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Trading date of `now` on the NSE calendar.
pub fn trading_date(now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&ist_offset()).date_naive()
}

/// Distinct predictable symbols from validated recommendations.
pub fn symbols_from_recommendations(recommendations: &[LlmRecommendation]) -> BTreeSet<String> {
    recommendations
        .iter()
        .filter_map(LlmRecommendation::predictable_symbol)
        .map(str::to_string)
        .collect()
}

fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(a) => !a.is_empty(),
        serde_json::Value::Object(o) => !o.is_empty(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportMetadata {
    pub date: NaiveDate,
    pub run_timestamp: DateTime<FixedOffset>,
    pub pipeline_version: String,
    pub total_news_articles: usize,
    pub total_llm_recs: usize,
    pub total_validated: usize,
    pub total_ml_predictions: usize,
    pub success_rate: f64,
}

/// Everything produced by one curation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyReport {
    pub metadata: ReportMetadata,
    pub llm_recommendations: Vec<LlmRecommendation>,
    pub ml_predictions: BTreeMap<String, PredictionResult>,
    pub combined_signals: Vec<CombinedSignal>,
}

pub struct SignalCurator {
    strong_signal_confidence: f64,
}

impl Default for SignalCurator {
    fn default() -> Self {
        Self::new(DEFAULT_STRONG_SIGNAL_CONFIDENCE)
    }
}

impl SignalCurator {
    pub fn new(strong_signal_confidence: f64) -> Self {
        Self {
            strong_signal_confidence,
        }
    }

    /// One combined signal per successful prediction, in symbol order.
    pub fn reconcile(
        &self,
        recommendations: &[LlmRecommendation],
        report: &BatchReport,
    ) -> Vec<CombinedSignal> {
        report
            .results
            .values()
            .filter_map(|result| match result {
                PredictionResult::Success {
                    symbol,
                    direction,
                    confidence,
                    latest_close,
                    ..
                } => {
                    let llm = recommendations
                        .iter()
                        .find(|r| r.trading_symbol.as_deref() == Some(symbol.as_str()));
                    Some(CombinedSignal {
                        symbol: symbol.clone(),
                        llm_action: llm.and_then(|r| r.action_to_take.clone()),
                        llm_reason: llm.and_then(|r| r.reason_for_recommendation.clone()),
                        ml_direction: *direction,
                        ml_confidence: *confidence,
                        recommendation: Recommendation::from_direction(
                            *direction,
                            *confidence,
                            self.strong_signal_confidence,
                        ),
                        latest_price: *latest_close,
                    })
                }
                PredictionResult::Failed { .. } => None,
            })
            .collect()
    }

    pub fn build_report(
        &self,
        recommendations: Vec<LlmRecommendation>,
        report: BatchReport,
        now: DateTime<Utc>,
    ) -> DailyReport {
        let combined_signals = self.reconcile(&recommendations, &report);

        let news_ids: BTreeSet<String> = recommendations
            .iter()
            .filter_map(|r| r.news_id.as_ref())
            .filter(|id| is_truthy(id))
            .map(|id| id.to_string())
            .collect();

        let metadata = ReportMetadata {
            date: trading_date(now),
            run_timestamp: now.with_timezone(&ist_offset()),
            pipeline_version: PIPELINE_VERSION.to_string(),
            total_news_articles: news_ids.len(),
            total_llm_recs: recommendations.len(),
            total_validated: recommendations.iter().filter(|r| r.validated).count(),
            total_ml_predictions: report.success_count(),
            success_rate: report.success_rate(),
        };

        info!("LLM recommendations: {}", metadata.total_llm_recs);
        info!("ML predictions: {}", metadata.total_ml_predictions);
        info!("Combined signals: {}", combined_signals.len());

        DailyReport {
            metadata,
            llm_recommendations: recommendations,
            ml_predictions: report.results,
            combined_signals,
        }
    }
}
