// Indicator engines and per-symbol window preparation
pub mod advanced_indicators;
pub mod basic_indicators;
pub mod feature_pipeline;
pub mod feature_table;
pub mod window_assembler;

pub use feature_pipeline::FeaturePipeline;
pub use feature_table::FeatureTable;
pub use window_assembler::{FeatureWindow, PreparedFeatures};
