pub mod feature_registry;
pub mod prediction;

pub use feature_registry::{
    FEATURE_COLS, FEATURE_COUNT, FLAT_INPUT_LEN, Feature, HORIZON_DAYS, WINDOW_SIZE,
};
pub use prediction::{Direction, DirectionPrediction, PredictionResult};
