//! Metrics for scoring forecasts against held-out actuals

use crate::data::DailySeries;
use crate::error::{ForecastError, Result};
use crate::models::ForecastPoint;
use serde::Serialize;
use statrs::statistics::{Data, OrderStatistics};

/// Scalar summary of forecast quality over a validation window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EvaluationResult {
    /// Mean absolute error
    pub mae: f64,
    /// Root mean squared error
    pub rmse: f64,
    /// Symmetric mean absolute percentage error, as a fraction
    pub smape: f64,
    /// Sum of predicted units over the window
    pub total_predicted: f64,
    /// Mean of actual daily units over the window
    pub mean_actual: f64,
    /// Median of actual daily units over the window
    pub median_actual: f64,
}

/// Score a forecast against validation-window actuals.
///
/// The forecast must cover exactly the actual series' dates, in order;
/// anything else is an alignment error. SMAPE skips days where both actual
/// and predicted are zero (the term is undefined there); if every day is
/// skipped the SMAPE is NaN.
pub fn evaluate(actual: &DailySeries, forecast: &[ForecastPoint]) -> Result<EvaluationResult> {
    if actual.is_empty() {
        return Err(ForecastError::Alignment(
            "actual series is empty".to_string(),
        ));
    }
    if forecast.len() != actual.len() {
        return Err(ForecastError::Alignment(format!(
            "forecast covers {} days, actuals cover {}",
            forecast.len(),
            actual.len()
        )));
    }
    for (i, point) in forecast.iter().enumerate() {
        let expected = actual.date_at(i);
        if point.date != expected {
            return Err(ForecastError::Alignment(format!(
                "forecast date {} does not match actual date {}",
                point.date, expected
            )));
        }
    }

    let n = actual.len() as f64;
    let mut abs_sum = 0.0;
    let mut sq_sum = 0.0;
    let mut smape_sum = 0.0;
    let mut smape_n = 0usize;

    for (point, (_, a)) in forecast.iter().zip(actual.iter()) {
        let err = a - point.point;
        abs_sum += err.abs();
        sq_sum += err * err;

        let denom = (point.point.abs() + a.abs()) / 2.0;
        if denom > 0.0 {
            smape_sum += err.abs() / denom;
            smape_n += 1;
        }
    }

    let smape = if smape_n > 0 {
        smape_sum / smape_n as f64
    } else {
        f64::NAN
    };

    let mut actual_stats = Data::new(actual.values().to_vec());

    Ok(EvaluationResult {
        mae: abs_sum / n,
        rmse: (sq_sum / n).sqrt(),
        smape,
        total_predicted: forecast.iter().map(|p| p.point).sum(),
        mean_actual: actual.mean(),
        median_actual: actual_stats.median(),
    })
}

impl std::fmt::Display for EvaluationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "  MAE  : {:.2} units", self.mae)?;
        writeln!(f, "  RMSE : {:.2} units", self.rmse)?;
        writeln!(f, "  SMAPE: {:.2}%", self.smape * 100.0)?;
        Ok(())
    }
}
