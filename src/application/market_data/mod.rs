// Series helpers and statistics shared by the indicator engines
pub mod rolling;
pub mod statistical_features;
