//! Statistical building blocks for the indicator engines
//!
//! This module provides calculations for:
//! - Hurst Exponent (trend persistence detection)
//! - Sample skewness and excess kurtosis (distribution shape)
//! - Sample/population dispersion and Pearson correlation

use statrs::statistics::Statistics;
use std::ops::Range;

/// Lags used by the Hurst estimate.
pub const HURST_LAGS: Range<usize> = 2..20;

/// Value reported when the Hurst fit cannot be computed.
pub const HURST_FALLBACK: f64 = 0.5;

/// Variance at or below which a non-uniform window is treated as degenerate.
const MOMENT_VARIANCE_FLOOR: f64 = 1e-14;

/// Calculate the Hurst Exponent from the dispersion of lagged differences
///
/// For every lag `k`, takes the population standard deviation of
/// `prices[t] - prices[t - k]`; the exponent is the least-squares slope of
/// `ln(std)` against `ln(k)`.
/// - H = 0.5: Random walk (Brownian motion)
/// - H > 0.5: Trending/persistent behavior (trends continue)
/// - H < 0.5: Mean-reverting/anti-persistent (reversals likely)
///
/// Returns [`HURST_FALLBACK`] when the series is shorter than the largest lag,
/// when any lag has zero dispersion, or when the fit is singular.
pub fn calculate_hurst_exponent(prices: &[f64], lags: Range<usize>) -> f64 {
    let Some(max_lag) = lags.clone().last() else {
        return HURST_FALLBACK;
    };
    if prices.len() < max_lag {
        return HURST_FALLBACK;
    }

    let mut log_lags = Vec::with_capacity(lags.len());
    let mut log_tau = Vec::with_capacity(lags.len());

    for lag in lags {
        if lag == 0 || lag >= prices.len() {
            return HURST_FALLBACK;
        }
        let tau = prices[lag..]
            .iter()
            .zip(prices.iter())
            .map(|(later, earlier)| later - earlier)
            .population_std_dev();

        if !tau.is_finite() || tau <= 0.0 {
            return HURST_FALLBACK;
        }
        log_lags.push((lag as f64).ln());
        log_tau.push(tau.ln());
    }

    match linear_regression_slope(&log_lags, &log_tau) {
        Some(slope) if slope.is_finite() => slope,
        _ => HURST_FALLBACK,
    }
}

/// Simple linear regression to find slope
fn linear_regression_slope(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }

    let n = x.len() as f64;
    let sum_x: f64 = x.iter().sum();
    let sum_y: f64 = y.iter().sum();
    let sum_xy: f64 = x.iter().zip(y.iter()).map(|(xi, yi)| xi * yi).sum();
    let sum_x2: f64 = x.iter().map(|xi| xi * xi).sum();

    let denominator = n * sum_x2 - sum_x * sum_x;
    if denominator.abs() < 1e-10 {
        return None;
    }

    let slope = (n * sum_xy - sum_x * sum_y) / denominator;
    Some(slope)
}

fn is_uniform(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}

/// Central moments `(m2, m3, m4)` normalised by `n`.
fn central_moments(values: &[f64]) -> (f64, f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
    for v in values {
        let d = v - mean;
        let d2 = d * d;
        m2 += d2;
        m3 += d2 * d;
        m4 += d2 * d2;
    }
    (m2 / n, m3 / n, m4 / n)
}

/// Adjusted Fisher–Pearson sample skewness
///
/// - Skew = 0: Symmetric distribution
/// - Skew > 0: Right tail (positive outliers)
/// - Skew < 0: Left tail (negative outliers)
///
/// A window of identical values has skew 0; any other window with
/// near-zero variance has no defined skew.
pub fn calculate_skewness(values: &[f64]) -> Option<f64> {
    if values.len() < 3 {
        return None;
    }
    if is_uniform(values) {
        return Some(0.0);
    }

    let n = values.len() as f64;
    let (m2, m3, _) = central_moments(values);
    if m2 <= MOMENT_VARIANCE_FLOOR {
        return None;
    }

    Some((n * (n - 1.0)).sqrt() * m3 / ((n - 2.0) * m2.powf(1.5)))
}

/// Unbiased sample excess kurtosis. Identical values give −3.
pub fn calculate_kurtosis(values: &[f64]) -> Option<f64> {
    if values.len() < 4 {
        return None;
    }
    if is_uniform(values) {
        return Some(-3.0);
    }

    let n = values.len() as f64;
    let (m2, _, m4) = central_moments(values);
    if m2 <= MOMENT_VARIANCE_FLOOR {
        return None;
    }

    let k = (n * n - 1.0) * m4 / (m2 * m2) - 3.0 * (n - 1.0).powi(2);
    Some(k / ((n - 2.0) * (n - 3.0)))
}

/// Sample (n − 1) standard deviation.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    Some(values.iter().std_dev())
}

/// Population (n) standard deviation.
pub fn population_std(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().population_std_dev())
}

/// Pearson correlation; undefined when either side has zero variance.
pub fn pearson_correlation(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let denom = x.iter().std_dev() * y.iter().std_dev();
    if !denom.is_finite() || denom <= 0.0 {
        return None;
    }
    Some(x.iter().covariance(y.iter()) / denom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hurst_trending() {
        // Accelerating move: dispersion of k-day changes grows faster than sqrt(k)
        let prices: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64).powi(2) * 0.05).collect();

        let hurst = calculate_hurst_exponent(&prices, HURST_LAGS);
        assert!(
            hurst > 0.5,
            "Hurst for trending series should be > 0.5, got {}",
            hurst
        );
    }

    #[test]
    fn test_hurst_mean_reverting() {
        // Mean-reverting series: oscillating around mean
        let prices: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64 * 2.5).sin()).collect();

        let hurst = calculate_hurst_exponent(&prices, HURST_LAGS);
        assert!(
            hurst < 0.5,
            "Hurst for mean-reverting series should be < 0.5, got {}",
            hurst
        );
    }

    #[test]
    fn test_hurst_insufficient_data() {
        let prices = vec![100.0, 101.0, 102.0];
        assert_eq!(calculate_hurst_exponent(&prices, HURST_LAGS), HURST_FALLBACK);
    }

    #[test]
    fn test_hurst_degenerate_linear_series() {
        // Every lag difference is constant, so each dispersion is zero
        let prices: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        assert_eq!(calculate_hurst_exponent(&prices, HURST_LAGS), HURST_FALLBACK);
    }

    #[test]
    fn test_skewness_positive() {
        // Right-skewed: more small values, few large values
        let values = vec![1.0, 1.0, 1.0, 1.0, 10.0];
        let skew = calculate_skewness(&values);

        assert!(skew.is_some());
        assert!(skew.unwrap() > 0.0, "Should have positive skew");
    }

    #[test]
    fn test_skewness_negative() {
        let values = vec![1.0, 10.0, 10.0, 10.0, 10.0];
        let skew = calculate_skewness(&values).unwrap();
        assert!(skew < 0.0, "Should have negative skew");
        // Adjusted Fisher-Pearson coefficient for this sample
        assert!((skew + 2.236_067_977).abs() < 1e-6, "got {}", skew);
    }

    #[test]
    fn test_skewness_symmetric() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let skew = calculate_skewness(&values).unwrap();
        assert!(skew.abs() < 1e-12);
    }

    #[test]
    fn test_uniform_window_moments() {
        let values = vec![0.5; 20];
        assert_eq!(calculate_skewness(&values), Some(0.0));
        assert_eq!(calculate_kurtosis(&values), Some(-3.0));
    }

    #[test]
    fn test_kurtosis_known_value() {
        // Unbiased excess kurtosis of 1..=5 is -1.2
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let kurt = calculate_kurtosis(&values).unwrap();
        assert!((kurt + 1.2).abs() < 1e-9, "got {}", kurt);
    }

    #[test]
    fn test_std_conventions() {
        let values = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((population_std(&values).unwrap() - 2.0).abs() < 1e-12);
        assert!((sample_std(&values).unwrap() - 2.138_089_935).abs() < 1e-6);
        assert!(sample_std(&[1.0]).is_none());
    }

    #[test]
    fn test_correlation_identity_and_flat() {
        let x = vec![1.0, 3.0, 2.0, 5.0, 4.0];
        assert!((pearson_correlation(&x, &x).unwrap() - 1.0).abs() < 1e-12);

        let neg: Vec<f64> = x.iter().map(|v| -v).collect();
        assert!((pearson_correlation(&x, &neg).unwrap() + 1.0).abs() < 1e-12);

        assert!(pearson_correlation(&x, &[2.0; 5]).is_none());
    }
}
