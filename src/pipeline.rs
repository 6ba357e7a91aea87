//! The end-to-end forecasting pipeline
//!
//! Raw records -> daily series -> features -> windows -> model -> metrics.
//! Both operating modes share the same stages; they differ only in how the
//! series is windowed and which dates are forecast.

use crate::data::{self, DailySeries, DataLoader, TransactionRecord};
use crate::error::Result;
use crate::features::{self, FeaturePolicy, StatsWindow};
use crate::metrics::{self, EvaluationResult};
use crate::models::seasonal_regression::{ModelOptions, SeasonalRegression};
use crate::models::{future_dates, DemandModel, ForecastPoint, TrainedDemandModel};
use crate::split::{self, SplitMode};
use chrono::{NaiveDate, NaiveDateTime};
use statrs::statistics::{Data, OrderStatistics};
use std::path::PathBuf;
use tracing::info;

/// Default validation window for backtests, in months
pub const DEFAULT_VALIDATION_MONTHS: u32 = 3;
/// Default forward forecast horizon, in days
pub const DEFAULT_HORIZON_DAYS: usize = 90;
/// Default trailing training window for forward forecasts, in months
pub const DEFAULT_TRAINING_MONTHS: u32 = 3;

/// Operating mode of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Score forecast accuracy against a held-out trailing window
    Backtest {
        /// Length of the held-out window, in months
        validation_months: u32,
    },
    /// Forecast past the end of the series, training on recent history only
    Forecast {
        /// Days to forecast past the series end
        horizon_days: usize,
        /// Length of the trailing training window, in months
        training_months: u32,
    },
}

/// Everything the pipeline needs to run for one SKU.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Path to the transaction CSV
    pub data_path: PathBuf,
    /// Target stock code
    pub stock_code: String,
    /// Backtest or forward forecast
    pub mode: Mode,
    /// Feature derivation policy
    pub features: FeaturePolicy,
    /// Model configuration
    pub model: ModelOptions,
}

/// Result of a backtest run.
#[derive(Debug, Clone)]
pub struct BacktestOutcome {
    /// Normalized stock code
    pub stock_code: String,
    /// First positive-quantity sale of the SKU
    pub first_sale: Option<NaiveDateTime>,
    /// Last training day
    pub cutoff: NaiveDate,
    /// Validation-window actuals (clipped quantities)
    pub actual: DailySeries,
    /// Forecast aligned with the validation window
    pub forecast: Vec<ForecastPoint>,
    /// Accuracy metrics over the validation window
    pub evaluation: EvaluationResult,
}

/// Result of a forward forecast run.
#[derive(Debug, Clone)]
pub struct ForecastOutcome {
    /// Normalized stock code
    pub stock_code: String,
    /// First positive-quantity sale of the SKU
    pub first_sale: Option<NaiveDateTime>,
    /// The trailing training window that was fitted
    pub train: DailySeries,
    /// Forecast for the requested horizon
    pub forecast: Vec<ForecastPoint>,
    /// Sum of forecasted units over the horizon
    pub total_forecast: f64,
    /// Mean daily forecast
    pub mean_forecast: f64,
    /// Median daily forecast
    pub median_forecast: f64,
}

/// Outcome of a pipeline run, by mode.
#[derive(Debug, Clone)]
pub enum PipelineOutcome {
    /// Backtest result
    Backtest(BacktestOutcome),
    /// Forward forecast result
    Forecast(ForecastOutcome),
}

/// Run the pipeline end to end, loading records from the configured CSV.
pub fn run(config: &PipelineConfig) -> Result<PipelineOutcome> {
    info!(path = %config.data_path.display(), "loading transaction data");
    let records = DataLoader::from_csv(&config.data_path)?;
    run_with_records(&records, config)
}

/// Run the pipeline on already-loaded transaction records.
pub fn run_with_records(
    records: &[TransactionRecord],
    config: &PipelineConfig,
) -> Result<PipelineOutcome> {
    let first_sale = data::first_sale(records, &config.stock_code);
    if let Some(ts) = first_sale {
        info!(sku = %config.stock_code, first_sale = %ts, "first ever sale of this SKU");
    }

    let series = DailySeries::from_transactions(records, &config.stock_code)?;
    info!(
        sku = %series.stock_code(),
        days = series.len(),
        start = %series.start_date(),
        end = %series.last_date(),
        "built daily series"
    );

    let split_mode = match config.mode {
        Mode::Backtest { validation_months } => SplitMode::Backtest { validation_months },
        Mode::Forecast {
            training_months, ..
        } => SplitMode::Forecast { training_months },
    };

    // Training-only statistics need the cutoff before features are derived
    let stats_cutoff = match (config.features.stats_window, &config.mode) {
        (StatsWindow::TrainingOnly, Mode::Backtest { .. }) => {
            Some(split::cutoff_date(series.last_date(), &split_mode)?)
        }
        _ => None,
    };

    let featured = features::derive(&series, &config.features, stats_cutoff)?;
    info!(
        clip_ceiling = featured.clip_ceiling(),
        spikes = featured.spikes().iter().filter(|&&s| s).count(),
        "derived features"
    );

    let split = split::split(&featured, &split_mode)?;
    info!(
        cutoff = %split.cutoff,
        train_days = split.train.len(),
        valid_days = split.valid.as_ref().map(|v| v.len()).unwrap_or(0),
        "split series"
    );

    let model = SeasonalRegression::new(config.model)?;
    let trained = model.fit(&split.train)?;
    info!(model = trained.name(), "fitted model");

    match config.mode {
        Mode::Backtest { .. } => {
            // split() always yields a validation window in backtest mode
            let valid = split.valid.ok_or_else(|| {
                crate::error::ForecastError::InsufficientHistory(
                    "backtest split produced no validation window".to_string(),
                )
            })?;
            let dates = valid.series().dates();
            let forecast = trained.predict(&dates, &featured)?;
            let evaluation = metrics::evaluate(valid.series(), &forecast)?;
            Ok(PipelineOutcome::Backtest(BacktestOutcome {
                stock_code: series.stock_code().to_string(),
                first_sale,
                cutoff: split.cutoff,
                actual: valid.series().clone(),
                forecast,
                evaluation,
            }))
        }
        Mode::Forecast { horizon_days, .. } => {
            let dates = future_dates(series.last_date(), horizon_days);
            let forecast = trained.predict(&dates, &featured)?;
            let points: Vec<f64> = forecast.iter().map(|p| p.point).collect();
            let total_forecast = points.iter().sum();
            let mean_forecast = total_forecast / points.len().max(1) as f64;
            let median_forecast = if points.is_empty() {
                f64::NAN
            } else {
                Data::new(points).median()
            };
            Ok(PipelineOutcome::Forecast(ForecastOutcome {
                stock_code: series.stock_code().to_string(),
                first_sale,
                train: split.train.series().clone(),
                forecast,
                total_forecast,
                mean_forecast,
                median_forecast,
            }))
        }
    }
}
