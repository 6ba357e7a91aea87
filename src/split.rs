//! Train/validation window splitting

use crate::error::{ForecastError, Result};
use crate::features::FeaturedSeries;
use chrono::{Days, Months, NaiveDate};

/// Minimum training observations: one would-be seasonal cycle is not enough
/// to fit weekly seasonality, so require two full weeks.
pub const MIN_TRAIN_DAYS: usize = 14;

/// How the prepared series is partitioned before fitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitMode {
    /// Hold out the trailing months as a validation window; train on
    /// everything up to the cutoff.
    Backtest {
        /// Length of the held-out validation window, in months
        validation_months: u32,
    },
    /// Train on the trailing months only (recency over full history);
    /// no validation window.
    Forecast {
        /// Length of the trailing training window, in months
        training_months: u32,
    },
}

/// A split of a featured series into training and validation windows.
#[derive(Debug, Clone)]
pub struct Split {
    /// Training window
    pub train: FeaturedSeries,
    /// Validation window (backtest mode only)
    pub valid: Option<FeaturedSeries>,
    /// The cutoff date: last training day in backtest mode, first training
    /// day in forecast mode
    pub cutoff: NaiveDate,
}

/// Compute the cutoff date for a split mode over a series ending at `last`.
pub fn cutoff_date(last: NaiveDate, mode: &SplitMode) -> Result<NaiveDate> {
    let months = match mode {
        SplitMode::Backtest { validation_months } => *validation_months,
        SplitMode::Forecast { training_months } => *training_months,
    };
    if months == 0 {
        return Err(ForecastError::InvalidParameter(
            "window length must be at least one month".to_string(),
        ));
    }
    last.checked_sub_months(Months::new(months))
        .ok_or_else(|| {
            ForecastError::InvalidParameter(format!("cannot subtract {} months from {}", months, last))
        })
}

/// Partition a featured series into training and validation windows.
pub fn split(featured: &FeaturedSeries, mode: &SplitMode) -> Result<Split> {
    let series = featured.series();
    let first = series.start_date();
    let last = series.last_date();
    let cutoff = cutoff_date(last, mode)?;

    match mode {
        SplitMode::Backtest { .. } => {
            if cutoff < first {
                return Err(ForecastError::InsufficientHistory(format!(
                    "series starting {} has no data before cutoff {}",
                    first, cutoff
                )));
            }
            if cutoff >= last {
                return Err(ForecastError::InsufficientHistory(format!(
                    "validation window after cutoff {} is empty",
                    cutoff
                )));
            }
            let train = featured.window(first, cutoff)?;
            if train.len() < MIN_TRAIN_DAYS {
                return Err(ForecastError::InsufficientHistory(format!(
                    "training window has {} days, need at least {}",
                    train.len(),
                    MIN_TRAIN_DAYS
                )));
            }
            let valid = featured.window(cutoff + Days::new(1), last)?;
            Ok(Split {
                train,
                valid: Some(valid),
                cutoff,
            })
        }
        SplitMode::Forecast { .. } => {
            // Trailing window includes the cutoff day itself
            let train_start = cutoff.max(first);
            let train = featured.window(train_start, last)?;
            if train.len() < MIN_TRAIN_DAYS {
                return Err(ForecastError::InsufficientHistory(format!(
                    "training window has {} days, need at least {}",
                    train.len(),
                    MIN_TRAIN_DAYS
                )));
            }
            Ok(Split {
                train,
                valid: None,
                cutoff: train_start,
            })
        }
    }
}
