// Daily price and index series
pub mod price_bar;

pub use price_bar::{IndexPoint, IndexSeries, OhlcvPoint, PriceBar};
