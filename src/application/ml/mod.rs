pub mod batch_predictor;
pub mod direction_predictor;

pub use batch_predictor::{BatchPredictor, BatchReport, load_index};
pub use direction_predictor::DirectionPredictor;
