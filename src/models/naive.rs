//! Training-mean baseline model

use crate::error::{ForecastError, Result};
use crate::features::FeaturedSeries;
use crate::models::{DemandModel, ForecastPoint, TrainedDemandModel};
use chrono::NaiveDate;

/// Baseline that predicts the training mean for every day.
///
/// Useful as a floor when judging whether a seasonal model adds anything.
#[derive(Debug, Clone)]
pub struct NaiveMean {
    name: String,
}

/// Fitted training-mean baseline.
#[derive(Debug, Clone)]
pub struct TrainedNaiveMean {
    name: String,
    mean: f64,
    std_dev: f64,
}

impl NaiveMean {
    /// Create a new baseline model.
    pub fn new() -> Self {
        Self {
            name: "Training Mean".to_string(),
        }
    }
}

impl Default for NaiveMean {
    fn default() -> Self {
        Self::new()
    }
}

impl DemandModel for NaiveMean {
    type Trained = TrainedNaiveMean;

    fn fit(&self, train: &FeaturedSeries) -> Result<TrainedNaiveMean> {
        let values = train.series().values();
        if values.is_empty() {
            return Err(ForecastError::InsufficientData(
                "empty training window".to_string(),
            ));
        }
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let variance =
            values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
        Ok(TrainedNaiveMean {
            name: self.name.clone(),
            mean,
            std_dev: variance.sqrt(),
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedDemandModel for TrainedNaiveMean {
    fn predict(
        &self,
        dates: &[NaiveDate],
        _features: &FeaturedSeries,
    ) -> Result<Vec<ForecastPoint>> {
        // 80% normal band around the mean
        let margin = 1.2816 * self.std_dev;
        Ok(dates
            .iter()
            .map(|&date| ForecastPoint {
                date,
                point: self.mean,
                lower: self.mean - margin,
                upper: self.mean + margin,
            })
            .collect())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
