//! Basic technical indicators: the raw bar fields plus 26 derived columns.
//!
//! Every column is computed over the whole series with trailing windows.
//! Warm-up rows are left missing here; incomplete rows are dropped by the
//! advanced engine.

use crate::application::features::feature_table::FeatureTable;
use crate::application::market_data::rolling::{
    Series, diff, finite, map, pct_change, present, rolling, zip_with,
};
use crate::application::market_data::statistical_features::sample_std;
use crate::domain::errors::IndicatorError;
use crate::domain::market::PriceBar;
use crate::domain::ml::Feature;
use ta::Next;
use ta::indicators::{
    BollingerBands, ExponentialMovingAverage, MovingAverageConvergenceDivergence,
    SimpleMovingAverage,
};
use tracing::debug;

/// Added to denominators that may be zero (RSI losses, average volume).
pub const EPSILON: f64 = 1e-8;

pub const SMA_PERIODS: [(Feature, usize); 4] = [
    (Feature::Sma5, 5),
    (Feature::Sma10, 10),
    (Feature::Sma20, 20),
    (Feature::Sma50, 50),
];
pub const EMA_FAST: usize = 12;
pub const EMA_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;
pub const RSI_PERIOD: usize = 14;
pub const BB_PERIOD: usize = 20;
pub const BB_STD_DEV: f64 = 2.0;
pub const VOLUME_SMA_PERIOD: usize = 20;

fn ta_error(name: &str, e: ta::errors::TaError) -> IndicatorError {
    IndicatorError::InvalidParameter(format!("{name}: {e:?}"))
}

/// Simple moving average, missing until `period` values are available.
fn sma(values: &[f64], period: usize) -> Result<Series, IndicatorError> {
    let mut indicator =
        SimpleMovingAverage::new(period).map_err(|e| ta_error("SimpleMovingAverage", e))?;
    Ok(values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let out = indicator.next(*v);
            if i + 1 >= period { finite(out) } else { None }
        })
        .collect())
}

/// Recursive EMA (`alpha = 2 / (span + 1)`) seeded with the first value.
fn ema(values: &[f64], span: usize) -> Result<Series, IndicatorError> {
    let mut indicator =
        ExponentialMovingAverage::new(span).map_err(|e| ta_error("ExponentialMovingAverage", e))?;
    Ok(values.iter().map(|v| finite(indicator.next(*v))).collect())
}

/// RSI over simple rolling means of gains and losses.
///
/// The first bar has no previous close; its change counts as zero for both
/// gains and losses, so the first value appears on bar `period`.
fn rsi(closes: &[f64], period: usize) -> Series {
    let deltas: Vec<f64> = (0..closes.len())
        .map(|i| if i == 0 { 0.0 } else { closes[i] - closes[i - 1] })
        .collect();
    let gains: Series = deltas.iter().map(|d| Some(d.max(0.0))).collect();
    let losses: Series = deltas.iter().map(|d| Some((-d).max(0.0))).collect();

    let mean = |w: &[f64]| Some(w.iter().sum::<f64>() / w.len() as f64);
    let avg_gain = rolling(&gains, period, mean);
    let avg_loss = rolling(&losses, period, mean);

    zip_with(&avg_gain, &avg_loss, |gain, loss| {
        let rs = gain / (loss + EPSILON);
        100.0 - 100.0 / (1.0 + rs)
    })
}

/// Adds the 26 basic indicator columns to a fresh table built from `bars`.
///
/// Bars must be in strictly ascending date order. Any length is accepted;
/// short inputs simply produce more missing values.
pub fn calculate_basic_features(bars: &[PriceBar]) -> Result<FeatureTable, IndicatorError> {
    if let Some(row) = bars.windows(2).position(|w| w[1].date <= w[0].date) {
        return Err(IndicatorError::Unordered { row: row + 1 });
    }

    let mut table = FeatureTable::from_bars(bars.to_vec());
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();
    let close = present(&closes);

    // Moving averages
    for (feature, period) in SMA_PERIODS {
        table.set_column(feature, sma(&closes, period)?)?;
    }
    table.set_column(Feature::Ema12, ema(&closes, EMA_FAST)?)?;
    table.set_column(Feature::Ema26, ema(&closes, EMA_SLOW)?)?;

    // MACD
    let mut macd = MovingAverageConvergenceDivergence::new(EMA_FAST, EMA_SLOW, MACD_SIGNAL)
        .map_err(|e| ta_error("MovingAverageConvergenceDivergence", e))?;
    let macd_out: Vec<_> = closes.iter().map(|c| macd.next(*c)).collect();
    table.set_column(
        Feature::Macd,
        macd_out.iter().map(|m| finite(m.macd)).collect(),
    )?;
    table.set_column(
        Feature::MacdSignal,
        macd_out.iter().map(|m| finite(m.signal)).collect(),
    )?;
    table.set_column(
        Feature::MacdHist,
        macd_out.iter().map(|m| finite(m.histogram)).collect(),
    )?;

    // RSI
    table.set_column(Feature::Rsi, rsi(&closes, RSI_PERIOD))?;

    // Bollinger Bands (population sigma)
    let mut bb = BollingerBands::new(BB_PERIOD, BB_STD_DEV)
        .map_err(|e| ta_error("BollingerBands", e))?;
    let bands: Vec<_> = closes
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let out = bb.next(*c);
            (i + 1 >= BB_PERIOD).then_some(out)
        })
        .collect();
    table.set_column(
        Feature::BbMiddle,
        bands.iter().map(|b| b.as_ref().and_then(|b| finite(b.average))).collect(),
    )?;
    table.set_column(
        Feature::BbUpper,
        bands.iter().map(|b| b.as_ref().and_then(|b| finite(b.upper))).collect(),
    )?;
    table.set_column(
        Feature::BbLower,
        bands.iter().map(|b| b.as_ref().and_then(|b| finite(b.lower))).collect(),
    )?;

    // Volume
    let volume_sma = sma(&volumes, VOLUME_SMA_PERIOD)?;
    let volume_ratio = zip_with(&present(&volumes), &volume_sma, |v, avg| {
        v / (avg + EPSILON)
    });
    table.set_column(Feature::VolumeSma20, volume_sma)?;
    table.set_column(Feature::VolumeRatio, volume_ratio)?;

    // Price based
    let daily_return = map(&pct_change(&close, 1), |r| r * 100.0);
    table.set_column(
        Feature::PriceRange,
        bars.iter().map(|b| finite(b.high - b.low)).collect(),
    )?;
    table.set_column(
        Feature::PriceChange,
        bars.iter().map(|b| finite(b.close - b.open)).collect(),
    )?;
    table.set_column(Feature::Return3d, map(&pct_change(&close, 3), |r| r * 100.0))?;
    table.set_column(Feature::Return5d, map(&pct_change(&close, 5), |r| r * 100.0))?;
    table.set_column(Feature::Return10d, map(&pct_change(&close, 10), |r| r * 100.0))?;

    let prev_close: Series = std::iter::once(None)
        .chain(close.iter().copied())
        .take(close.len())
        .collect();
    table.set_column(
        Feature::LogReturn,
        zip_with(&close, &prev_close, |cur, prev| (cur / prev).ln() * 100.0),
    )?;

    // Volatility of daily returns (sample std)
    table.set_column(Feature::Volatility5d, rolling(&daily_return, 5, sample_std))?;
    table.set_column(Feature::Volatility20d, rolling(&daily_return, 20, sample_std))?;
    table.set_column(Feature::DailyReturn, daily_return)?;

    // Momentum
    table.set_column(Feature::Momentum10d, diff(&close, 10))?;
    table.set_column(Feature::Momentum20d, diff(&close, 20))?;

    debug!(
        "Calculated {} basic features over {} bars",
        Feature::basic().len(),
        table.len()
    );
    Ok(table)
}
