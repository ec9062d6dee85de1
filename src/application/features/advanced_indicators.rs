//! Advanced indicators layered on top of the basic engine.
//!
//! Adds 15 columns in four groups:
//! - Market context against the NIFTY 50 index (3)
//! - Momentum and mean reversion (6)
//! - Volume and liquidity (3)
//! - Distribution statistics (3)
//!
//! This is the only stage that drops incomplete rows.

use crate::application::features::basic_indicators::{EPSILON, calculate_basic_features};
use crate::application::features::feature_table::FeatureTable;
use crate::application::market_data::rolling::{
    Series, cumulative_sum, diff, forward_fill, map, pct_change, present, rolling, rolling_pair,
    shift, sign, zip_with,
};
use crate::application::market_data::statistical_features::{
    HURST_LAGS, calculate_hurst_exponent, calculate_kurtosis, calculate_skewness,
    pearson_correlation,
};
use crate::domain::errors::IndicatorError;
use crate::domain::market::{IndexSeries, PriceBar};
use crate::domain::ml::Feature;
use tracing::{debug, warn};

pub const CORRELATION_WINDOW: usize = 20;
pub const REGIME_FAST: usize = 20;
pub const REGIME_SLOW: usize = 50;
pub const DIVERGENCE_LAG: usize = 5;
pub const SQUEEZE_WINDOW: usize = 20;
pub const SUPPORT_RESISTANCE_WINDOW: usize = 20;
pub const BREAKOUT_MULTIPLIER: f64 = 2.0;
pub const MOMENT_WINDOW: usize = 20;
pub const HURST_WINDOW: usize = 60;

fn mean(window: &[f64]) -> Option<f64> {
    Some(window.iter().sum::<f64>() / window.len() as f64)
}

fn window_max(window: &[f64]) -> f64 {
    window.iter().fold(f64::NEG_INFINITY, |acc, v| acc.max(*v))
}

fn window_min(window: &[f64]) -> f64 {
    window.iter().fold(f64::INFINITY, |acc, v| acc.min(*v))
}

/// +1 on the bar where MACD moves above its signal line, -1 where it moves
/// below, 0 otherwise. Defined on every row; the first row is always 0.
pub fn macd_crossover_signal(macd: &[Option<f64>], signal: &[Option<f64>]) -> Series {
    let gt = |a: Option<f64>, b: Option<f64>| matches!((a, b), (Some(a), Some(b)) if a > b);
    let lt = |a: Option<f64>, b: Option<f64>| matches!((a, b), (Some(a), Some(b)) if a < b);
    let le = |a: Option<f64>, b: Option<f64>| matches!((a, b), (Some(a), Some(b)) if a <= b);
    let ge = |a: Option<f64>, b: Option<f64>| matches!((a, b), (Some(a), Some(b)) if a >= b);

    (0..macd.len().min(signal.len()))
        .map(|i| {
            if i == 0 {
                return Some(0.0);
            }
            let (m, s) = (macd[i], signal[i]);
            let (pm, ps) = (macd[i - 1], signal[i - 1]);
            if gt(m, s) && le(pm, ps) {
                Some(1.0)
            } else if lt(m, s) && ge(pm, ps) {
                Some(-1.0)
            } else {
                Some(0.0)
            }
        })
        .collect()
}

/// Relative strength, rolling correlation and regime against the index.
///
/// The index is left-joined on date. Returns are taken over the
/// forward-filled closes, so a bar without an index close sees a 0% index
/// return; the regime uses the raw closes and reads 0 around the gap.
/// Without an index every row gets the neutral values 0.0 / 0.0 / 0.
fn market_context(
    table: &FeatureTable,
    index: Option<&IndexSeries>,
) -> [(Feature, Series); 3] {
    let len = table.len();
    let Some(index) = index else {
        warn!("No NIFTY 50 series supplied, using neutral market context");
        return [
            (Feature::RelativeStrength, vec![Some(0.0); len]),
            (Feature::Correlation20d, vec![Some(0.0); len]),
            (Feature::MarketRegime, vec![Some(0.0); len]),
        ];
    };

    let index_close = index.align_to(table.bars());
    let index_return = map(&pct_change(&forward_fill(&index_close), 1), |r| r * 100.0);
    let daily_return = table.column(Feature::DailyReturn);

    let relative_strength = zip_with(daily_return, &index_return, |s, i| s - i);
    let correlation = rolling_pair(
        daily_return,
        &index_return,
        CORRELATION_WINDOW,
        pearson_correlation,
    );

    let fast = rolling(&index_close, REGIME_FAST, mean);
    let slow = rolling(&index_close, REGIME_SLOW, mean);
    let regime = fast
        .iter()
        .zip(slow.iter())
        .map(|(f, s)| match (f, s) {
            (Some(f), Some(s)) if f > s => Some(1.0),
            (Some(f), Some(s)) if f < s => Some(-1.0),
            _ => Some(0.0),
        })
        .collect();

    [
        (Feature::RelativeStrength, relative_strength),
        (Feature::Correlation20d, correlation),
        (Feature::MarketRegime, regime),
    ]
}

/// Adds the 15 advanced columns and drops every row that is still
/// incomplete.
pub fn calculate_advanced_features(
    mut table: FeatureTable,
    index: Option<&IndexSeries>,
) -> Result<FeatureTable, IndicatorError> {
    for (feature, values) in market_context(&table, index) {
        table.set_column(feature, values)?;
    }

    let closes: Vec<f64> = table.bars().iter().map(|b| b.close).collect();
    let highs: Vec<f64> = table.bars().iter().map(|b| b.high).collect();
    let lows: Vec<f64> = table.bars().iter().map(|b| b.low).collect();
    let volumes: Vec<f64> = table.bars().iter().map(|b| b.volume).collect();
    let close = present(&closes);
    let prev_close = shift(&close, 1);

    // Momentum & mean reversion
    let rsi_change = diff(table.column(Feature::Rsi), DIVERGENCE_LAG);
    let price_change = pct_change(&close, DIVERGENCE_LAG);
    let divergence = zip_with(&rsi_change, &price_change, |r, p| sign(r) - sign(p));
    table.set_column(Feature::RsiDivergence, divergence)?;

    let crossover = macd_crossover_signal(
        table.column(Feature::Macd),
        table.column(Feature::MacdSignal),
    );
    table.set_column(Feature::MacdCrossover, crossover)?;

    let band_width = zip_with(
        &zip_with(
            table.column(Feature::BbUpper),
            table.column(Feature::BbLower),
            |u, l| u - l,
        ),
        table.column(Feature::BbMiddle),
        |w, m| w / m,
    );
    let squeeze = rolling(&band_width, SQUEEZE_WINDOW, |w| {
        let (lo, hi) = (window_min(w), window_max(w));
        let last = w[w.len() - 1];
        Some((last - lo) / (hi - lo + EPSILON))
    });
    table.set_column(Feature::BbSqueeze, squeeze)?;

    let vs_sma50 = zip_with(&close, table.column(Feature::Sma50), |c, sma| {
        (c - sma) / sma * 100.0
    });
    table.set_column(Feature::PriceVsSma50Pct, vs_sma50)?;

    let momentum_strength = diff(table.column(Feature::Momentum10d), 5);
    table.set_column(Feature::MomentumStrength, momentum_strength)?;

    let high_20 = rolling(&present(&highs), SUPPORT_RESISTANCE_WINDOW, |w| {
        Some(window_max(w))
    });
    let low_20 = rolling(&present(&lows), SUPPORT_RESISTANCE_WINDOW, |w| {
        Some(window_min(w))
    });
    let support_resistance: Series = (0..table.len())
        .map(|i| {
            let rising = matches!((close[i], prev_close[i]), (Some(c), Some(p)) if c > p);
            let c = close[i]?;
            let distance = if rising {
                (high_20[i]? - c) / c
            } else {
                (c - low_20[i]?) / c
            };
            distance.is_finite().then_some(distance)
        })
        .collect();
    table.set_column(Feature::SupportResistanceDistance, support_resistance)?;

    // Volume & liquidity
    let direction = map(&diff(&close, 1), sign);
    let signed_volume = zip_with(&present(&volumes), &direction, |v, d| v * d);
    table.set_column(Feature::VolumePriceTrend, cumulative_sum(&signed_volume))?;

    let mut obv = 0.0;
    let on_balance: Series = (0..table.len())
        .map(|i| {
            if i > 0 {
                if closes[i] > closes[i - 1] {
                    obv += volumes[i];
                } else if closes[i] < closes[i - 1] {
                    obv -= volumes[i];
                }
            }
            Some(obv)
        })
        .collect();
    table.set_column(Feature::OnBalanceVolume, on_balance)?;

    let breakout: Series = volumes
        .iter()
        .zip(table.column(Feature::VolumeSma20))
        .map(|(v, avg)| match avg {
            Some(avg) if *v > BREAKOUT_MULTIPLIER * avg => Some(1.0),
            _ => Some(0.0),
        })
        .collect();
    table.set_column(Feature::VolumeBreakout, breakout)?;

    // Statistical
    let daily_return = table.column(Feature::DailyReturn).to_vec();
    table.set_column(
        Feature::ReturnsSkewness20d,
        rolling(&daily_return, MOMENT_WINDOW, calculate_skewness),
    )?;
    table.set_column(
        Feature::ReturnsKurtosis20d,
        rolling(&daily_return, MOMENT_WINDOW, calculate_kurtosis),
    )?;
    table.set_column(
        Feature::HurstExponent,
        rolling(&close, HURST_WINDOW, |w| {
            Some(calculate_hurst_exponent(w, HURST_LAGS))
        }),
    )?;

    let before = table.len();
    let table = table.drop_incomplete_rows();
    debug!(
        "Calculated {} advanced features, {} of {} rows complete",
        Feature::advanced().len(),
        table.len(),
        before
    );
    Ok(table)
}

/// Runs both indicator engines over `bars`.
pub fn calculate_all_features(
    bars: &[PriceBar],
    index: Option<&IndexSeries>,
) -> Result<FeatureTable, IndicatorError> {
    let table = calculate_basic_features(bars)?;
    calculate_advanced_features(table, index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::IndexPoint;
    use chrono::{Days, NaiveDate};

    fn bars_from_closes(closes: &[f64]) -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, c)| PriceBar {
                date: start + Days::new(i as u64),
                open: c - 0.25,
                high: c + 1.0,
                low: c - 1.0,
                close: *c,
                volume: 50_000.0 + ((i * 37) % 11) as f64 * 1_000.0,
                open_interest: 0.0,
            })
            .collect()
    }

    fn noisy(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let x = i as f64;
                200.0 + (x * 0.7).sin() * 4.0 + (x * 0.13).cos() * 6.0 + x * 0.05
            })
            .collect()
    }

    fn index_from(bars: &[PriceBar]) -> IndexSeries {
        IndexSeries::new(
            bars.iter()
                .map(|b| IndexPoint {
                    date: b.date,
                    close: b.close,
                })
                .collect(),
        )
    }

    #[test]
    fn test_first_complete_row_is_hurst_warmup() {
        let bars = bars_from_closes(&noisy(100));
        let table = calculate_all_features(&bars, None).unwrap();

        assert_eq!(table.len(), 41);
        assert_eq!(table.bars()[0].date, bars[59].date);
        for i in 0..table.len() {
            assert!(table.is_row_complete(i));
        }
    }

    #[test]
    fn test_neutral_context_without_index() {
        let table = calculate_all_features(&bars_from_closes(&noisy(120)), None).unwrap();
        assert!(!table.is_empty());
        for i in 0..table.len() {
            assert_eq!(table.value(i, Feature::RelativeStrength), Some(0.0));
            assert_eq!(table.value(i, Feature::Correlation20d), Some(0.0));
            assert_eq!(table.value(i, Feature::MarketRegime), Some(0.0));
        }
    }

    #[test]
    fn test_identical_index_correlates_perfectly() {
        let bars = bars_from_closes(&noisy(120));
        let index = index_from(&bars);
        let table = calculate_all_features(&bars, Some(&index)).unwrap();

        assert_eq!(table.len(), 61);
        for i in 0..table.len() {
            let corr = table.value(i, Feature::Correlation20d).unwrap();
            assert!((corr - 1.0).abs() < 1e-9, "row {i}: {corr}");
            assert!(table.value(i, Feature::RelativeStrength).unwrap().abs() < 1e-12);
        }
    }

    #[test]
    fn test_market_regime_follows_index_trend() {
        let bars = bars_from_closes(&noisy(120));
        let rising = IndexSeries::new(
            bars.iter()
                .enumerate()
                .map(|(i, b)| IndexPoint {
                    date: b.date,
                    close: 18_000.0 + i as f64 * 10.0 + (i % 3) as f64,
                })
                .collect(),
        );
        let table = calculate_all_features(&bars, Some(&rising)).unwrap();
        assert!(!table.is_empty());
        for i in 0..table.len() {
            assert_eq!(table.value(i, Feature::MarketRegime), Some(1.0));
        }
    }

    #[test]
    fn test_index_gap_carries_last_close() {
        let bars = bars_from_closes(&noisy(120));
        let mut points = index_from(&bars).points().to_vec();
        points.remove(100);
        let table = calculate_all_features(&bars, Some(&IndexSeries::new(points))).unwrap();

        // Same rows as a gap-free index: the window still ends on the latest bar
        assert_eq!(table.len(), 61);
        assert_eq!(table.bars().last().map(|b| b.date), Some(bars[119].date));

        let row = table.bars().iter().position(|b| b.date == bars[100].date).unwrap();
        let daily_return = table.value(row, Feature::DailyReturn).unwrap();
        let relative = table.value(row, Feature::RelativeStrength).unwrap();
        assert!((relative - daily_return).abs() < 1e-9);
        assert_eq!(table.value(row, Feature::MarketRegime), Some(0.0));
        let correlation = table.value(row, Feature::Correlation20d).unwrap();
        assert!(correlation < 1.0 && correlation > -1.0);
    }

    #[test]
    fn test_crossover_signal_pure() {
        let macd = vec![Some(-2.0), Some(-1.0), Some(0.5), Some(1.0), Some(2.0)];
        let signal = vec![Some(0.0); 5];
        assert_eq!(
            macd_crossover_signal(&macd, &signal),
            vec![Some(0.0), Some(0.0), Some(1.0), Some(0.0), Some(0.0)]
        );

        let down = vec![Some(1.0), Some(0.0), Some(-1.0)];
        assert_eq!(
            macd_crossover_signal(&down, &vec![Some(0.0); 3]),
            vec![Some(0.0), Some(0.0), Some(-1.0)]
        );
    }

    #[test]
    fn test_crossover_fires_once_on_reversal() {
        // Steady decline keeps MACD under its signal; a jump on bar 150 crosses it up
        let mut closes: Vec<f64> = (0..150).map(|i| 200.0 - i as f64 * 0.5).collect();
        let base = closes[149];
        closes.push(base + 30.0);
        for i in 1..100 {
            closes.push(base + 30.0 + i as f64 * 0.5);
        }
        let bars = bars_from_closes(&closes);
        let table = calculate_all_features(&bars, None).unwrap();

        let crossover = table.column(Feature::MacdCrossover);
        let at = |date: NaiveDate| table.bars().iter().position(|b| b.date == date).unwrap();
        let cross_row = at(bars[150].date);

        assert_eq!(crossover[cross_row], Some(1.0));
        for (i, value) in crossover.iter().enumerate().take(cross_row) {
            assert_eq!(*value, Some(0.0), "unexpected crossover on row {i}");
        }
    }

    #[test]
    fn test_cumulative_volume_features() {
        let closes = vec![10.0, 11.0, 11.0, 10.0, 12.0];
        let table = calculate_basic_features(&bars_from_closes(&closes)).unwrap();
        let volumes: Vec<f64> = table.bars().iter().map(|b| b.volume).collect();

        // Row dropping would remove everything here, so inspect pre-drop values
        let direction = map(&diff(&present(&closes), 1), sign);
        let vpt = cumulative_sum(&zip_with(&present(&volumes), &direction, |v, d| v * d));
        assert_eq!(vpt[0], None);
        assert_eq!(vpt[1], Some(volumes[1]));
        assert_eq!(vpt[4], Some(volumes[1] - volumes[3] + volumes[4]));
    }

    #[test]
    fn test_support_resistance_is_direction_dependent() {
        let bars = bars_from_closes(&noisy(120));
        let table = calculate_all_features(&bars, None).unwrap();

        for i in 1..table.len() {
            let close = table.value(i, Feature::Close).unwrap();
            let prev = table.value(i - 1, Feature::Close).unwrap();
            let distance = table.value(i, Feature::SupportResistanceDistance).unwrap();
            let row_bars = table.bars();
            let end = bars.iter().position(|b| b.date == row_bars[i].date).unwrap();
            let window = &bars[end + 1 - 20..=end];
            if close > prev {
                let high = window.iter().fold(f64::NEG_INFINITY, |a, b| a.max(b.high));
                assert!((distance - (high - close) / close).abs() < 1e-12);
            } else {
                let low = window.iter().fold(f64::INFINITY, |a, b| a.min(b.low));
                assert!((distance - (close - low) / close).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_bounded_columns() {
        let table = calculate_all_features(&bars_from_closes(&noisy(150)), None).unwrap();
        for i in 0..table.len() {
            let squeeze = table.value(i, Feature::BbSqueeze).unwrap();
            assert!((0.0..=1.0).contains(&squeeze));
            let divergence = table.value(i, Feature::RsiDivergence).unwrap();
            assert!((-2.0..=2.0).contains(&divergence));
            let breakout = table.value(i, Feature::VolumeBreakout).unwrap();
            assert!(breakout == 0.0 || breakout == 1.0);
        }
    }
}
