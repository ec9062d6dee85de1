//! Price and index data locations.

use super::EnvLookup;
use std::path::PathBuf;

pub const DEFAULT_PRICE_DATA_DIR: &str = "data/prices";

#[derive(Debug, Clone, PartialEq)]
pub struct DataEnvConfig {
    pub price_data_dir: PathBuf,
    /// Without an index file the market-context features fall back to
    /// neutral values.
    pub index_data_path: Option<PathBuf>,
}

impl Default for DataEnvConfig {
    fn default() -> Self {
        Self {
            price_data_dir: PathBuf::from(DEFAULT_PRICE_DATA_DIR),
            index_data_path: None,
        }
    }
}

impl DataEnvConfig {
    pub fn from_lookup(lookup: &EnvLookup) -> Self {
        Self {
            price_data_dir: lookup("PRICE_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PRICE_DATA_DIR)),
            index_data_path: lookup("INDEX_DATA_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
        }
    }
}
