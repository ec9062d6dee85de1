use crate::application::features::feature_table::FeatureTable;
use crate::domain::errors::FeatureError;
use crate::domain::market::OhlcvPoint;
use crate::domain::ml::{FEATURE_COUNT, FLAT_INPUT_LEN, WINDOW_SIZE};
use anyhow::{Context, Result};
use ndarray::Array2;
use std::collections::BTreeMap;

/// Date format used for the OHLCV keys of a prepared window.
pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// The last 60 complete rows of a feature table as a 60×47 matrix
/// (rows = days oldest first, columns = `FEATURE_COLS` order).
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureWindow {
    matrix: Array2<f64>,
}

impl FeatureWindow {
    /// Wraps a matrix that must be exactly `WINDOW_SIZE × FEATURE_COUNT`.
    pub fn from_matrix(matrix: Array2<f64>) -> Result<Self> {
        anyhow::ensure!(
            matrix.dim() == (WINDOW_SIZE, FEATURE_COUNT),
            "Feature window must be {}x{}, got {:?}",
            WINDOW_SIZE,
            FEATURE_COUNT,
            matrix.dim()
        );
        Ok(Self { matrix })
    }

    pub fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }

    pub fn into_matrix(self) -> Array2<f64> {
        self.matrix
    }

    /// Row-major flatten into the 1×2820 classifier input: all 47 features
    /// of day 0, then day 1, and so on.
    pub fn flatten(&self) -> Result<Array2<f64>> {
        flatten_window(&self.matrix)
    }

    /// Inverse of [`FeatureWindow::flatten`].
    pub fn unflatten(flat: &Array2<f64>) -> Result<Self> {
        let values: Vec<f64> = flat.iter().copied().collect();
        anyhow::ensure!(
            values.len() == FLAT_INPUT_LEN,
            "Flat input must hold {} values, got {}",
            FLAT_INPUT_LEN,
            values.len()
        );
        let matrix = Array2::from_shape_vec((WINDOW_SIZE, FEATURE_COUNT), values)
            .context("Failed to reshape flat input")?;
        Ok(Self { matrix })
    }
}

/// Flattens any `WINDOW_SIZE × FEATURE_COUNT` matrix in logical row-major order.
pub fn flatten_window(matrix: &Array2<f64>) -> Result<Array2<f64>> {
    let values: Vec<f64> = matrix.iter().copied().collect();
    Array2::from_shape_vec((1, values.len()), values).context("Failed to flatten feature window")
}

/// Everything a prediction needs for one symbol, produced independently of
/// the classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedFeatures {
    pub symbol: String,
    pub window: FeatureWindow,
    pub latest_close: f64,
    /// OHLCV of the 60 window days keyed by `YYYY-MM-DD`.
    pub ohlcv: BTreeMap<String, OhlcvPoint>,
}

/// Takes the last 60 rows of `table` and checks that every column is
/// populated across them.
pub fn assemble_window(symbol: &str, table: &FeatureTable) -> Result<PreparedFeatures, FeatureError> {
    if table.len() < WINDOW_SIZE {
        return Err(FeatureError::IncompleteWindow {
            symbol: symbol.to_string(),
            column: None,
            rows: table.len(),
        });
    }

    let rows = table.len() - WINDOW_SIZE..table.len();
    if let Some(feature) = table.first_incomplete_column(rows.clone()) {
        return Err(FeatureError::IncompleteWindow {
            symbol: symbol.to_string(),
            column: Some(feature.name()),
            rows: WINDOW_SIZE,
        });
    }

    let mut values = Vec::with_capacity(FLAT_INPUT_LEN);
    for row in rows.clone() {
        values.extend(table.row(row).into_iter().flatten());
    }
    let matrix = Array2::from_shape_vec((WINDOW_SIZE, FEATURE_COUNT), values).map_err(|e| {
        FeatureError::FeatureComputation {
            symbol: symbol.to_string(),
            reason: e.to_string(),
        }
    })?;

    let window_bars = &table.bars()[rows];
    let ohlcv = window_bars
        .iter()
        .map(|bar| (bar.date.format(DATE_KEY_FORMAT).to_string(), bar.ohlcv()))
        .collect();
    let latest_close = window_bars
        .last()
        .map(|bar| bar.close)
        .unwrap_or_default();

    Ok(PreparedFeatures {
        symbol: symbol.to_string(),
        window: FeatureWindow { matrix },
        latest_close,
        ohlcv,
    })
}
