use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Per-symbol pipeline failures. Recoverable: the batch records a FAILED
/// result for the symbol and moves on.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureError {
    #[error("Insufficient history for {symbol}: {available} {stage} < {required} required")]
    InsufficientHistory {
        symbol: String,
        stage: HistoryStage,
        available: usize,
        required: usize,
    },

    #[error("Feature computation failed for {symbol}: {reason}")]
    FeatureComputation { symbol: String, reason: String },

    /// `column` is `None` when the table is shorter than a full window.
    #[error("Incomplete features for {symbol}: {}", window_gap(.column, .rows))]
    IncompleteWindow {
        symbol: String,
        column: Option<&'static str>,
        rows: usize,
    },

    /// The latest bar did not survive feature computation.
    #[error("Stale features for {symbol}: window ends {window_end}, latest bar is {latest}")]
    StaleWindow {
        symbol: String,
        window_end: NaiveDate,
        latest: NaiveDate,
    },

    #[error("Price history unavailable for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    #[error("Prediction failed for {symbol}: {reason}")]
    Prediction { symbol: String, reason: String },
}

fn window_gap(column: &Option<&'static str>, rows: &usize) -> String {
    match column {
        Some(column) => format!("column {column} has missing values in a {rows}-row window"),
        None => format!("only {rows} rows available for the window"),
    }
}

/// Which count fell short in [`FeatureError::InsufficientHistory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryStage {
    RawBars,
    FeatureRows,
}

impl std::fmt::Display for HistoryStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HistoryStage::RawBars => write!(f, "raw bars"),
            HistoryStage::FeatureRows => write!(f, "valid feature rows"),
        }
    }
}

/// Errors raised inside the indicator engines.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndicatorError {
    #[error("Invalid indicator parameter: {0}")]
    InvalidParameter(String),

    #[error("Column length mismatch for {column}: expected {expected}, got {actual}")]
    LengthMismatch {
        column: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Input bars are not in ascending date order at row {row}")]
    Unordered { row: usize },
}

/// Errors from the price and index history collaborators.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MarketDataError {
    #[error("No price history for {symbol}: {reason}")]
    Unavailable { symbol: String, reason: String },

    #[error("Malformed price data in {source_name}: {reason}")]
    Malformed { source_name: String, reason: String },
}

/// Model/scaler loading failures. Fatal for a batch run.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Model artifact not found: {}", path.display())]
    Missing { path: PathBuf },

    #[error("Invalid model artifact {}: {reason}", path.display())]
    Invalid { path: PathBuf, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_history_formatting() {
        let err = FeatureError::InsufficientHistory {
            symbol: "INFY".to_string(),
            stage: HistoryStage::RawBars,
            available: 42,
            required: 70,
        };

        let msg = err.to_string();
        assert!(msg.contains("INFY"));
        assert!(msg.contains("42 raw bars"));
        assert!(msg.contains("70"));
    }

    #[test]
    fn test_incomplete_window_formatting() {
        let err = FeatureError::IncompleteWindow {
            symbol: "SBIN".to_string(),
            column: Some("hurst_exponent"),
            rows: 60,
        };

        let msg = err.to_string();
        assert!(msg.contains("hurst_exponent"));
        assert!(msg.contains("60-row"));
    }

    #[test]
    fn test_artifact_missing_formatting() {
        let err = ArtifactError::Missing {
            path: PathBuf::from("data/models/model.onnx"),
        };
        assert!(err.to_string().contains("data/models/model.onnx"));
    }
}
