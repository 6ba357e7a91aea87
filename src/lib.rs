//! # Demand Forecast
//!
//! A Rust library for short-horizon daily demand forecasting of retail SKUs,
//! with backtesting against held-out actuals.
//!
//! ## Pipeline
//!
//! Raw transaction records are turned into a regular daily series (gap days
//! filled with zero), robustness-clipped at the 99th percentile, and flagged
//! for demand spikes. The series is split into training and validation
//! windows, fitted with a seasonal regression model (weekly/yearly
//! seasonality, optional spike regressor), and the forecast is scored with
//! MAE, RMSE, and SMAPE.
//!
//! Two operating modes share the same stages:
//!
//! - **Backtest**: train on everything up to a cutoff (default: last date
//!   minus 3 months) and score against the held-out tail.
//! - **Forecast**: train on the trailing months only and forecast past the
//!   end of the series (default: 90 days).
//!
//! ## Quick start
//!
//! ```no_run
//! use demand_forecast::pipeline::{self, Mode, PipelineConfig};
//! use demand_forecast::{FeaturePolicy, ModelOptions};
//!
//! fn main() -> demand_forecast::Result<()> {
//!     let config = PipelineConfig {
//!         data_path: "retail_data.csv".into(),
//!         stock_code: "20750".to_string(),
//!         mode: Mode::Backtest { validation_months: 3 },
//!         features: FeaturePolicy::default(),
//!         model: ModelOptions::default(),
//!     };
//!
//!     let outcome = pipeline::run(&config)?;
//!     println!("{:?}", outcome);
//!     Ok(())
//! }
//! ```

pub mod data;
pub mod error;
pub mod features;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod split;

// Re-export commonly used types
pub use crate::data::{DailySeries, DataLoader, TransactionRecord};
pub use crate::error::{ForecastError, Result};
pub use crate::features::{FeaturePolicy, FeaturedSeries, StatsWindow};
pub use crate::metrics::EvaluationResult;
pub use crate::models::seasonal_regression::{ModelOptions, SeasonalRegression, SeasonalityMode};
pub use crate::models::{DemandModel, ForecastPoint, TrainedDemandModel};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
