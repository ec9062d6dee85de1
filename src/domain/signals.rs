use crate::domain::ml::Direction;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder symbol given to IPOs that are not listed yet.
pub const IPO_PENDING_SYMBOL: &str = "IPO_PENDING";

/// A validated, news-derived recommendation produced upstream by the LLM
/// extraction and symbol validation stages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmRecommendation {
    #[serde(default)]
    pub stock_name: Option<String>,
    #[serde(default)]
    pub trading_symbol: Option<String>,
    #[serde(default)]
    pub validated: bool,
    #[serde(default)]
    pub action_to_take: Option<String>,
    #[serde(default)]
    pub reason_for_recommendation: Option<String>,
    #[serde(default)]
    pub news_id: Option<serde_json::Value>,
    #[serde(default)]
    pub news_url: Option<String>,
}

impl LlmRecommendation {
    /// Symbol eligible for an ML prediction: validated and actually listed.
    pub fn predictable_symbol(&self) -> Option<&str> {
        if !self.validated {
            return None;
        }
        self.trading_symbol
            .as_deref()
            .filter(|s| !s.is_empty() && *s != IPO_PENDING_SYMBOL)
    }
}

/// Final reconciled action for a stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    StrongBuy,
    StrongSell,
    Hold,
}

impl Recommendation {
    /// Confidence-gated mapping of the ML direction.
    pub fn from_direction(direction: Direction, confidence: f64, threshold: f64) -> Self {
        match direction {
            Direction::Up if confidence >= threshold => Recommendation::StrongBuy,
            Direction::Down if confidence >= threshold => Recommendation::StrongSell,
            _ => Recommendation::Hold,
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recommendation::StrongBuy => write!(f, "STRONG_BUY"),
            Recommendation::StrongSell => write!(f, "STRONG_SELL"),
            Recommendation::Hold => write!(f, "HOLD"),
        }
    }
}

/// LLM view and ML view of one stock, reconciled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedSignal {
    pub symbol: String,
    pub llm_action: Option<String>,
    pub llm_reason: Option<String>,
    pub ml_direction: Direction,
    pub ml_confidence: f64,
    pub recommendation: Recommendation,
    pub latest_price: f64,
}
