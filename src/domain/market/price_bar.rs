use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One trading day of OHLCV data plus open interest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub open_interest: f64,
}

impl PriceBar {
    pub fn ohlcv(&self) -> OhlcvPoint {
        OhlcvPoint {
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
        }
    }
}

/// OHLCV slice kept alongside a prediction for charting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OhlcvPoint {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexPoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Reference market index series (NIFTY 50) used for market-context features.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexSeries {
    points: Vec<IndexPoint>,
}

impl IndexSeries {
    /// Builds a series, sorting points ascending by date.
    pub fn new(mut points: Vec<IndexPoint>) -> Self {
        points.sort_by_key(|p| p.date);
        Self { points }
    }

    pub fn points(&self) -> &[IndexPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Left-joins the index closes onto `bars` by date.
    /// Bars with no matching index date get `None`.
    pub fn align_to(&self, bars: &[PriceBar]) -> Vec<Option<f64>> {
        let by_date: HashMap<NaiveDate, f64> =
            self.points.iter().map(|p| (p.date, p.close)).collect();
        bars.iter().map(|b| by_date.get(&b.date).copied()).collect()
    }
}
