//! Forecasting models for daily demand series

use crate::error::Result;
use crate::features::FeaturedSeries;
use chrono::{Days, NaiveDate};
use serde::Serialize;
use std::fmt::Debug;

/// One forecasted day: point estimate plus an interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastPoint {
    /// Forecasted date
    pub date: NaiveDate,
    /// Point estimate of daily units
    pub point: f64,
    /// Interval lower bound
    pub lower: f64,
    /// Interval upper bound
    pub upper: f64,
}

/// Demand model that can be fitted to a training window.
pub trait DemandModel: Debug + Clone {
    /// The type of trained model produced
    type Trained: TrainedDemandModel;

    /// Fit the model to a training window
    fn fit(&self, train: &FeaturedSeries) -> Result<Self::Trained>;

    /// Name of the model
    fn name(&self) -> &str;
}

/// Fitted demand model.
pub trait TrainedDemandModel: Debug {
    /// Forecast the requested dates, one `ForecastPoint` per date in order.
    ///
    /// `features` is the full derived series; models with an exogenous
    /// spike regressor look future spike values up from it, defaulting to
    /// no spike for dates outside the series.
    fn predict(&self, dates: &[NaiveDate], features: &FeaturedSeries)
        -> Result<Vec<ForecastPoint>>;

    /// Name of the model
    fn name(&self) -> &str;
}

/// The `horizon` consecutive dates following `after`.
pub fn future_dates(after: NaiveDate, horizon: usize) -> Vec<NaiveDate> {
    (1..=horizon as u64)
        .map(|i| after + Days::new(i))
        .collect()
}

pub mod naive;
pub mod seasonal_regression;
