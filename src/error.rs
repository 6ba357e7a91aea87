//! Error types for the demand_forecast crate

use thiserror::Error;

/// Custom error types for the demand_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// No positive-quantity transactions matched the requested SKU
    #[error("empty series: no transactions for SKU {0}")]
    EmptySeries(String),

    /// Not enough history to split into training/validation windows
    #[error("insufficient history: {0}")]
    InsufficientHistory(String),

    /// The model cannot be fitted to the training window
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// Forecast and actual series do not cover the same dates
    #[error("alignment error: {0}")]
    Alignment(String),

    /// Malformed values from the input data source
    #[error("data parse error: {0}")]
    DataParse(String),

    /// Error from invalid parameters
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("polars error: {0}")]
    Polars(String),

    /// Error while rendering a chart
    #[error("chart error: {0}")]
    Chart(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<polars::prelude::PolarsError> for ForecastError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        ForecastError::Polars(err.to_string())
    }
}
