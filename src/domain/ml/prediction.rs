use crate::domain::market::OhlcvPoint;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Predicted price direction over the model horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// Maps the classifier's binary label: 1 → UP, anything else → DOWN.
    pub fn from_label(label: u8) -> Self {
        if label == 1 {
            Direction::Up
        } else {
            Direction::Down
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "UP"),
            Direction::Down => write!(f, "DOWN"),
        }
    }
}

/// Raw classifier verdict for one feature window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionPrediction {
    pub prediction: u8,
    pub direction: Direction,
    pub probability_up: f64,
    pub probability_down: f64,
    pub confidence: f64,
}

impl DirectionPrediction {
    pub fn new(label: u8, probability_down: f64, probability_up: f64) -> Self {
        Self {
            prediction: label,
            direction: Direction::from_label(label),
            probability_up,
            probability_down,
            confidence: probability_up.max(probability_down),
        }
    }
}

/// Outcome of the per-symbol pipeline. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PredictionResult {
    Success {
        symbol: String,
        direction: Direction,
        probability_up: f64,
        probability_down: f64,
        confidence: f64,
        latest_close: f64,
        /// Last window of OHLCV keyed by `YYYY-MM-DD`.
        historical_data: BTreeMap<String, OhlcvPoint>,
    },
    Failed {
        symbol: String,
        error: String,
        latest_close: Option<f64>,
    },
}

impl PredictionResult {
    pub fn symbol(&self) -> &str {
        match self {
            PredictionResult::Success { symbol, .. } | PredictionResult::Failed { symbol, .. } => {
                symbol
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PredictionResult::Success { .. })
    }

    pub fn direction(&self) -> Option<Direction> {
        match self {
            PredictionResult::Success { direction, .. } => Some(*direction),
            PredictionResult::Failed { .. } => None,
        }
    }

    pub fn confidence(&self) -> Option<f64> {
        match self {
            PredictionResult::Success { confidence, .. } => Some(*confidence),
            PredictionResult::Failed { .. } => None,
        }
    }

    pub fn latest_close(&self) -> Option<f64> {
        match self {
            PredictionResult::Success { latest_close, .. } => Some(*latest_close),
            PredictionResult::Failed { latest_close, .. } => *latest_close,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            PredictionResult::Success { .. } => None,
            PredictionResult::Failed { error, .. } => Some(error),
        }
    }
}
