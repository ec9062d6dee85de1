// Daily price and index series
pub mod market;

// Feature schema and prediction records
pub mod ml;

// Port interfaces
pub mod ports;

// LLM/ML signal reconciliation types
pub mod signals;

// Domain-specific error types
pub mod errors;
