//! Seasonal regression with an optional exogenous spike regressor
//!
//! Fits daily demand as a linear trend plus weekly seasonality (weekday
//! dummies), yearly seasonality (low-order Fourier harmonics), and an
//! optional binary spike regressor, solved by SVD least squares.
//! Multiplicative mode fits on a `ln(1 + y)` scale so the seasonal effect
//! scales with the level; additive mode fits on the raw scale.

use crate::error::{ForecastError, Result};
use crate::features::FeaturedSeries;
use crate::models::{DemandModel, ForecastPoint, TrainedDemandModel};
use chrono::{Datelike, NaiveDate};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use tracing::warn;

/// Number of Fourier harmonics used for yearly seasonality
const YEARLY_HARMONICS: usize = 3;
const DAYS_PER_YEAR: f64 = 365.25;

/// How the seasonal effect combines with the trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeasonalityMode {
    /// Constant-magnitude seasonal effect
    Additive,
    /// Seasonal effect scales with the level; appropriate when variance
    /// grows with volume
    Multiplicative,
}

/// Named configuration for the seasonal regression model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelOptions {
    /// Additive or multiplicative seasonality
    pub seasonality_mode: SeasonalityMode,
    /// Fit weekday effects
    pub weekly_seasonality: bool,
    /// Fit yearly Fourier terms; needs at least a year of history and is
    /// disabled with a warning otherwise
    pub yearly_seasonality: bool,
    /// Include the binary spike flag as an exogenous regressor
    pub spike_regressor: bool,
    /// Width of the prediction interval, e.g. 0.8 for an 80% band
    pub interval_width: f64,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            seasonality_mode: SeasonalityMode::Additive,
            weekly_seasonality: true,
            yearly_seasonality: false,
            spike_regressor: true,
            interval_width: 0.8,
        }
    }
}

/// Seasonal regression forecaster.
#[derive(Debug, Clone)]
pub struct SeasonalRegression {
    name: String,
    options: ModelOptions,
}

impl SeasonalRegression {
    /// Create a model with the given options.
    pub fn new(options: ModelOptions) -> Result<Self> {
        if !(0.0..1.0).contains(&options.interval_width) || options.interval_width <= 0.0 {
            return Err(ForecastError::InvalidParameter(format!(
                "interval width {} must be in (0, 1)",
                options.interval_width
            )));
        }
        let mode = match options.seasonality_mode {
            SeasonalityMode::Additive => "additive",
            SeasonalityMode::Multiplicative => "multiplicative",
        };
        Ok(Self {
            name: format!("Seasonal Regression ({})", mode),
            options,
        })
    }

    /// The configured options.
    pub fn options(&self) -> &ModelOptions {
        &self.options
    }
}

/// Fitted seasonal regression model.
#[derive(Debug, Clone)]
pub struct TrainedSeasonalRegression {
    name: String,
    /// Effective options (yearly seasonality may have been disabled)
    options: ModelOptions,
    /// Trend origin: first day of the training window
    origin: NaiveDate,
    /// Fitted coefficients
    beta: DVector<f64>,
    /// Residual standard deviation on the fitting scale
    residual_std: f64,
    /// Normal quantile matching the interval width
    z: f64,
}

fn design_row(date: NaiveDate, origin: NaiveDate, options: &ModelOptions, spike: bool) -> Vec<f64> {
    let t = (date - origin).num_days() as f64;
    let mut row = vec![1.0, t];
    if options.weekly_seasonality {
        // Weekday dummies, Monday as the baseline
        let weekday = date.weekday().num_days_from_monday() as usize;
        for wd in 1..7 {
            row.push(if weekday == wd { 1.0 } else { 0.0 });
        }
    }
    if options.yearly_seasonality {
        for k in 1..=YEARLY_HARMONICS {
            let angle = 2.0 * std::f64::consts::PI * k as f64 * t / DAYS_PER_YEAR;
            row.push(angle.sin());
            row.push(angle.cos());
        }
    }
    if options.spike_regressor {
        row.push(if spike { 1.0 } else { 0.0 });
    }
    row
}

fn param_count(options: &ModelOptions) -> usize {
    let mut p = 2;
    if options.weekly_seasonality {
        p += 6;
    }
    if options.yearly_seasonality {
        p += 2 * YEARLY_HARMONICS;
    }
    if options.spike_regressor {
        p += 1;
    }
    p
}

impl DemandModel for SeasonalRegression {
    type Trained = TrainedSeasonalRegression;

    fn fit(&self, train: &FeaturedSeries) -> Result<TrainedSeasonalRegression> {
        let series = train.series();
        if series.is_empty() {
            return Err(ForecastError::InsufficientData(
                "empty training window".to_string(),
            ));
        }

        let values = series.values();
        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        if min == max {
            return Err(ForecastError::InsufficientData(format!(
                "degenerate training window: quantity is constant at {}",
                min
            )));
        }

        let mut options = self.options;
        if options.yearly_seasonality && series.len() < 365 {
            warn!(
                days = series.len(),
                "training window shorter than a year; disabling yearly seasonality"
            );
            options.yearly_seasonality = false;
        }

        let n = series.len();
        let p = param_count(&options);
        if n <= p {
            return Err(ForecastError::InsufficientData(format!(
                "{} observations cannot support {} parameters",
                n, p
            )));
        }

        let origin = series.start_date();
        let mut flat = Vec::with_capacity(n * p);
        for (i, (date, _)) in series.iter().enumerate() {
            flat.extend(design_row(date, origin, &options, train.spikes()[i]));
        }
        let x = DMatrix::from_row_slice(n, p, &flat);

        let y = DVector::from_iterator(
            n,
            values.iter().map(|&v| match options.seasonality_mode {
                SeasonalityMode::Additive => v,
                SeasonalityMode::Multiplicative => (1.0 + v).ln(),
            }),
        );

        let svd = x.clone().svd(true, true);
        let beta = svd
            .solve(&y, 1e-12)
            .map_err(|e| ForecastError::InsufficientData(e.to_string()))?;

        let residuals = &x * &beta - &y;
        let sse: f64 = residuals.iter().map(|r| r * r).sum();
        let residual_std = (sse / (n - p) as f64).sqrt();

        let normal = Normal::new(0.0, 1.0)
            .map_err(|e| ForecastError::InvalidParameter(e.to_string()))?;
        let z = normal.inverse_cdf(0.5 + options.interval_width / 2.0);

        Ok(TrainedSeasonalRegression {
            name: self.name.clone(),
            options,
            origin,
            beta,
            residual_std,
            z,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedDemandModel for TrainedSeasonalRegression {
    fn predict(
        &self,
        dates: &[NaiveDate],
        features: &FeaturedSeries,
    ) -> Result<Vec<ForecastPoint>> {
        let margin = self.z * self.residual_std;
        let mut points = Vec::with_capacity(dates.len());
        for &date in dates {
            let spike = self.options.spike_regressor && features.spike_on(date);
            let row = design_row(date, self.origin, &self.options, spike);
            let fitted: f64 = row.iter().zip(self.beta.iter()).map(|(a, b)| a * b).sum();
            let (point, lower, upper) = match self.options.seasonality_mode {
                SeasonalityMode::Additive => (fitted, fitted - margin, fitted + margin),
                SeasonalityMode::Multiplicative => (
                    (fitted).exp() - 1.0,
                    (fitted - margin).exp() - 1.0,
                    (fitted + margin).exp() - 1.0,
                ),
            };
            points.push(ForecastPoint {
                date,
                point,
                lower,
                upper,
            });
        }
        Ok(points)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
