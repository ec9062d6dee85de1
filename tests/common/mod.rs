#![allow(dead_code)]

use chrono::{Days, NaiveDate};
use stock_curator::domain::market::{IndexPoint, IndexSeries, PriceBar};

pub fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

/// Bars around a gently rising, oscillating close with varying volume.
pub fn trending_bars(n: usize, base: f64) -> Vec<PriceBar> {
    let closes: Vec<f64> = (0..n)
        .map(|i| {
            let t = i as f64;
            base + 0.4 * t + base * 0.03 * (t / 5.0).sin() + base * 0.01 * (t / 2.3).cos()
        })
        .collect();
    bars_from_closes(&closes)
}

/// Arithmetic ramp: `start + step * i`.
pub fn ramp_bars(n: usize, start: f64, step: f64) -> Vec<PriceBar> {
    let closes: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
    bars_from_closes(&closes)
}

pub fn bars_from_closes(closes: &[f64]) -> Vec<PriceBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceBar {
            date: start_date() + Days::new(i as u64),
            open: close * 0.998,
            high: close * 1.01,
            low: close * 0.99,
            close,
            volume: 100_000.0 + ((i * 7919) % 13) as f64 * 8_000.0,
            open_interest: 0.0,
        })
        .collect()
}

/// Index series dated like the bars produced above.
pub fn index_series(n: usize) -> IndexSeries {
    IndexSeries::new(
        (0..n)
            .map(|i| {
                let t = i as f64;
                IndexPoint {
                    date: start_date() + Days::new(i as u64),
                    close: 22_000.0 + 5.0 * t + 150.0 * (t / 7.0).sin(),
                }
            })
            .collect(),
    )
}
