//! Demand feature derivation: outlier clipping and spike flags

use crate::data::DailySeries;
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, OrderStatistics};

/// Which part of the series the clip/spike statistics are computed over.
///
/// Full-series statistics keep the clip/spike definition stable across
/// train/validation splits, but in a backtest they leak validation-window
/// information into features seen during training. `TrainingOnly` restricts
/// the statistics to days up to the split cutoff instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StatsWindow {
    /// Statistics over the entire series (leaky in backtests)
    #[default]
    FullSeries,
    /// Statistics over the training window only
    TrainingOnly,
}

/// Policy knobs for feature derivation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeaturePolicy {
    /// Percentile at which daily quantities are clipped
    pub clip_percentile: f64,
    /// A day is a spike when clipped quantity > multiplier x median
    pub spike_multiplier: f64,
    /// Window over which the clip/spike statistics are computed
    pub stats_window: StatsWindow,
}

impl Default for FeaturePolicy {
    fn default() -> Self {
        Self {
            clip_percentile: 99.0,
            spike_multiplier: 3.0,
            stats_window: StatsWindow::FullSeries,
        }
    }
}

/// A daily series with robustness-clipped quantities and a per-day spike flag.
#[derive(Debug, Clone, PartialEq)]
pub struct FeaturedSeries {
    series: DailySeries,
    spikes: Vec<bool>,
    clip_ceiling: f64,
    spike_threshold: f64,
}

/// Derive clipped quantities and spike flags from a daily series.
///
/// The clip ceiling is the `clip_percentile`-th percentile of the raw
/// quantities; every value is capped at that ceiling (outlier days are
/// bounded, not discarded). A day is flagged as a spike iff its clipped
/// quantity strictly exceeds `spike_multiplier` x the median of the clipped
/// series. Both statistics are computed once, over the days selected by
/// `stats_cutoff`: `None` means the full series, `Some(date)` restricts
/// them to days <= `date`.
pub fn derive(
    series: &DailySeries,
    policy: &FeaturePolicy,
    stats_cutoff: Option<NaiveDate>,
) -> Result<FeaturedSeries> {
    if !(0.0..=100.0).contains(&policy.clip_percentile) {
        return Err(ForecastError::InvalidParameter(format!(
            "clip percentile {} outside 0..=100",
            policy.clip_percentile
        )));
    }
    if policy.spike_multiplier <= 0.0 {
        return Err(ForecastError::InvalidParameter(format!(
            "spike multiplier {} must be positive",
            policy.spike_multiplier
        )));
    }

    let stat_values: Vec<f64> = match stats_cutoff {
        None => series.values().to_vec(),
        Some(cutoff) => series
            .iter()
            .filter(|(date, _)| *date <= cutoff)
            .map(|(_, v)| v)
            .collect(),
    };
    if stat_values.is_empty() {
        return Err(ForecastError::InsufficientHistory(format!(
            "no days on or before {:?} to compute feature statistics",
            stats_cutoff
        )));
    }

    let mut stats = Data::new(stat_values);
    let clip_ceiling = stats.percentile(policy.clip_percentile.round() as usize);

    let clipped: Vec<f64> = series
        .values()
        .iter()
        .map(|&v| v.min(clip_ceiling))
        .collect();

    // Median of the clipped series, over the same statistics window
    let mut clipped_stats = Data::new(match stats_cutoff {
        None => clipped.clone(),
        Some(cutoff) => clipped
            .iter()
            .enumerate()
            .filter(|(i, _)| series.date_at(*i) <= cutoff)
            .map(|(_, &v)| v)
            .collect(),
    });
    let spike_threshold = policy.spike_multiplier * clipped_stats.median();

    let spikes: Vec<bool> = clipped.iter().map(|&v| v > spike_threshold).collect();

    let series = DailySeries::from_values(series.stock_code(), series.start_date(), clipped)?;
    Ok(FeaturedSeries {
        series,
        spikes,
        clip_ceiling,
        spike_threshold,
    })
}

impl FeaturedSeries {
    /// The clipped daily series
    pub fn series(&self) -> &DailySeries {
        &self.series
    }

    /// Per-day spike flags, aligned with the series
    pub fn spikes(&self) -> &[bool] {
        &self.spikes
    }

    /// The clip ceiling applied to quantities
    pub fn clip_ceiling(&self) -> f64 {
        self.clip_ceiling
    }

    /// The absolute spike threshold (multiplier x median)
    pub fn spike_threshold(&self) -> f64 {
        self.spike_threshold
    }

    /// Number of days covered
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// Whether the series has no days
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Spike flag for a date; dates outside the series default to no spike
    pub fn spike_on(&self, date: NaiveDate) -> bool {
        let offset = (date - self.series.start_date()).num_days();
        if offset < 0 {
            return false;
        }
        self.spikes.get(offset as usize).copied().unwrap_or(false)
    }

    /// Extract the sub-series covering `from..=to`, flags included.
    pub fn window(&self, from: NaiveDate, to: NaiveDate) -> Result<Self> {
        let series = self.series.window(from, to)?;
        let lo = (from - self.series.start_date()).num_days() as usize;
        let spikes = self.spikes[lo..lo + series.len()].to_vec();
        Ok(Self {
            series,
            spikes,
            clip_ceiling: self.clip_ceiling,
            spike_threshold: self.spike_threshold,
        })
    }
}
