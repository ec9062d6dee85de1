//! CSV-backed price and index history.
//!
//! Layout: one `<SYMBOL>.csv` per stock under a directory, with header
//! `Date,Open,High,Low,Close,Volume,OI` (`OI` optional), and a single index
//! file with at least `Date,Close`.

use crate::domain::errors::MarketDataError;
use crate::domain::market::{IndexPoint, IndexSeries, PriceBar};
use crate::domain::ports::{IndexHistoryProvider, PriceHistoryProvider};
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize)]
struct PriceRecord {
    #[serde(rename = "Date")]
    date: NaiveDate,
    #[serde(rename = "Open")]
    open: f64,
    #[serde(rename = "High")]
    high: f64,
    #[serde(rename = "Low")]
    low: f64,
    #[serde(rename = "Close")]
    close: f64,
    #[serde(rename = "Volume")]
    volume: f64,
    #[serde(rename = "OI", default)]
    open_interest: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct IndexRecord {
    #[serde(rename = "Date")]
    date: NaiveDate,
    #[serde(rename = "Close")]
    close: f64,
}

fn open_reader(path: &Path) -> Result<csv::Reader<BufReader<File>>, std::io::Error> {
    let file = File::open(path)?;
    Ok(csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(BufReader::new(file)))
}

/// Sorts ascending, drops duplicate dates (first one wins) and keeps the
/// last `days` entries.
fn trailing<T>(mut rows: Vec<T>, days: usize, date: impl Fn(&T) -> NaiveDate) -> Vec<T> {
    rows.sort_by_key(|r| date(r));
    rows.dedup_by_key(|r| date(r));
    let skip = rows.len().saturating_sub(days);
    rows.drain(..skip);
    rows
}

pub struct CsvPriceProvider {
    dir: PathBuf,
}

impl CsvPriceProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }
}

impl PriceHistoryProvider for CsvPriceProvider {
    fn fetch(&self, symbol: &str, days: usize) -> Result<Vec<PriceBar>, MarketDataError> {
        let path = self.path_for(symbol);
        if !path.exists() {
            return Err(MarketDataError::Unavailable {
                symbol: symbol.to_string(),
                reason: format!("no data file at {}", path.display()),
            });
        }

        let malformed = |reason: String| MarketDataError::Malformed {
            source_name: path.display().to_string(),
            reason,
        };

        let mut reader = open_reader(&path).map_err(|e| malformed(e.to_string()))?;
        let mut bars = Vec::new();
        for (line, record) in reader.deserialize::<PriceRecord>().enumerate() {
            let record = record.map_err(|e| malformed(format!("row {}: {}", line + 1, e)))?;
            bars.push(PriceBar {
                date: record.date,
                open: record.open,
                high: record.high,
                low: record.low,
                close: record.close,
                volume: record.volume,
                open_interest: record.open_interest.unwrap_or(0.0),
            });
        }

        if bars.is_empty() {
            return Err(MarketDataError::Unavailable {
                symbol: symbol.to_string(),
                reason: format!("{} has no rows", path.display()),
            });
        }

        let bars = trailing(bars, days, |b| b.date);
        debug!("{}: read {} bars from {}", symbol, bars.len(), path.display());
        Ok(bars)
    }
}

pub struct CsvIndexProvider {
    path: PathBuf,
}

impl CsvIndexProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl IndexHistoryProvider for CsvIndexProvider {
    fn fetch_index(&self, days: usize) -> Result<IndexSeries, MarketDataError> {
        let source_name = self.path.display().to_string();
        if !self.path.exists() {
            return Err(MarketDataError::Unavailable {
                symbol: "NIFTY 50".to_string(),
                reason: format!("no index file at {source_name}"),
            });
        }

        let mut reader = open_reader(&self.path).map_err(|e| MarketDataError::Malformed {
            source_name: source_name.clone(),
            reason: e.to_string(),
        })?;
        let points = reader
            .deserialize::<IndexRecord>()
            .map(|r| {
                r.map(|r| IndexPoint {
                    date: r.date,
                    close: r.close,
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| MarketDataError::Malformed {
                source_name: source_name.clone(),
                reason: e.to_string(),
            })?;

        Ok(IndexSeries::new(trailing(points, days, |p| p.date)))
    }
}
