// Series helpers and shared statistics
pub mod market_data;

// Indicator engines and window preparation
pub mod features;

// Direction prediction and batch orchestration
pub mod ml;

// LLM/ML reconciliation and the daily report
pub mod signal_curator;
