use crate::application::market_data::rolling::{Series, present};
use crate::domain::errors::IndicatorError;
use crate::domain::market::PriceBar;
use crate::domain::ml::{FEATURE_COUNT, Feature};

/// Column-oriented feature table for one symbol: the input bars plus one
/// [`Series`] per entry of `FEATURE_COLS`.
///
/// Rows stay aligned with `bars`; a row is *complete* only when all 47
/// columns hold a value.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    bars: Vec<PriceBar>,
    columns: Vec<Series>,
}

impl FeatureTable {
    /// Seeds the table with the raw bar columns (Open, High, Low, Close,
    /// Volume, OI). Every indicator column starts out missing.
    pub fn from_bars(bars: Vec<PriceBar>) -> Self {
        let mut columns = vec![vec![None; bars.len()]; FEATURE_COUNT];

        let raw: [(Feature, fn(&PriceBar) -> f64); 6] = [
            (Feature::Open, |b: &PriceBar| b.open),
            (Feature::High, |b: &PriceBar| b.high),
            (Feature::Low, |b: &PriceBar| b.low),
            (Feature::Close, |b: &PriceBar| b.close),
            (Feature::Volume, |b: &PriceBar| b.volume),
            (Feature::OpenInterest, |b: &PriceBar| b.open_interest),
        ];
        for (feature, field) in raw {
            let values: Vec<f64> = bars.iter().map(field).collect();
            columns[feature.index()] = present(&values);
        }

        Self { bars, columns }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn column(&self, feature: Feature) -> &[Option<f64>] {
        &self.columns[feature.index()]
    }

    pub fn set_column(&mut self, feature: Feature, values: Series) -> Result<(), IndicatorError> {
        if values.len() != self.bars.len() {
            return Err(IndicatorError::LengthMismatch {
                column: feature.name(),
                expected: self.bars.len(),
                actual: values.len(),
            });
        }
        self.columns[feature.index()] = values;
        Ok(())
    }

    pub fn value(&self, row: usize, feature: Feature) -> Option<f64> {
        self.columns[feature.index()].get(row).copied().flatten()
    }

    /// All 47 values of a row in `FEATURE_COLS` order.
    pub fn row(&self, row: usize) -> Vec<Option<f64>> {
        self.columns.iter().map(|c| c[row]).collect()
    }

    pub fn is_row_complete(&self, row: usize) -> bool {
        self.columns.iter().all(|c| c[row].is_some())
    }

    /// First column with a missing value anywhere in `rows`.
    pub fn first_incomplete_column(&self, rows: std::ops::Range<usize>) -> Option<Feature> {
        Feature::ALL
            .into_iter()
            .find(|f| self.columns[f.index()][rows.clone()].iter().any(Option::is_none))
    }

    /// Keeps only complete rows, preserving chronological order.
    pub fn drop_incomplete_rows(self) -> Self {
        let keep: Vec<bool> = (0..self.len()).map(|i| self.is_row_complete(i)).collect();

        let bars = self
            .bars
            .into_iter()
            .zip(keep.iter())
            .filter_map(|(bar, k)| k.then_some(bar))
            .collect();
        let columns = self
            .columns
            .into_iter()
            .map(|column| {
                column
                    .into_iter()
                    .zip(keep.iter())
                    .filter_map(|(v, k)| k.then_some(v))
                    .collect()
            })
            .collect();

        Self { bars, columns }
    }

    /// Named values of the most recent row, if that row is complete.
    pub fn latest_row(&self) -> Option<Vec<(&'static str, f64)>> {
        let last = self.len().checked_sub(1)?;
        Feature::ALL
            .into_iter()
            .map(|f| self.value(last, f).map(|v| (f.name(), v)))
            .collect()
    }
}
