pub mod artifact_store;
pub mod csv_market_data;
pub mod mock;
pub mod onnx_classifier;
pub mod standard_scaler;

pub use artifact_store::FileArtifactStore;
pub use csv_market_data::{CsvIndexProvider, CsvPriceProvider};
pub use onnx_classifier::OnnxDirectionClassifier;
pub use standard_scaler::StandardScaler;
