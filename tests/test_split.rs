use chrono::{Days, NaiveDate};
use demand_forecast::data::DailySeries;
use demand_forecast::features::{derive, FeaturePolicy};
use demand_forecast::split::{split, SplitMode, MIN_TRAIN_DAYS};
use demand_forecast::{FeaturedSeries, ForecastError};
use pretty_assertions::assert_eq;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn featured_series(start: NaiveDate, days: usize) -> FeaturedSeries {
    let values: Vec<f64> = (0..days).map(|i| 10.0 + (i % 7) as f64).collect();
    let series = DailySeries::from_values("X", start, values).unwrap();
    derive(&series, &FeaturePolicy::default(), None).unwrap()
}

#[test]
fn test_backtest_partition_is_exact() {
    // One year of data ending 2023-12-31
    let featured = featured_series(day(2023, 1, 1), 365);
    let last = featured.series().last_date();

    let result = split(
        &featured,
        &SplitMode::Backtest {
            validation_months: 3,
        },
    )
    .unwrap();

    let cutoff = day(2023, 9, 30); // last date minus 3 months
    assert_eq!(result.cutoff, cutoff);

    let train = result.train.series();
    let valid = result.valid.as_ref().unwrap().series();

    // Train covers exactly days <= cutoff, valid exactly days > cutoff
    assert_eq!(train.start_date(), day(2023, 1, 1));
    assert_eq!(train.last_date(), cutoff);
    assert_eq!(valid.start_date(), cutoff + Days::new(1));
    assert_eq!(valid.last_date(), last);

    // Union is the full series, intersection empty
    assert_eq!(train.len() + valid.len(), featured.len());
}

#[test]
fn test_backtest_requires_validation_window() {
    // 30 days of history cannot hold out 3 months
    let featured = featured_series(day(2023, 1, 1), 30);

    let result = split(
        &featured,
        &SplitMode::Backtest {
            validation_months: 3,
        },
    );
    assert!(matches!(
        result,
        Err(ForecastError::InsufficientHistory(_))
    ));
}

#[test]
fn test_backtest_requires_minimum_training_days() {
    // Cutoff leaves less than two weeks of training data
    let featured = featured_series(day(2023, 1, 1), 40);

    let result = split(
        &featured,
        &SplitMode::Backtest {
            validation_months: 1,
        },
    );
    match result {
        Ok(s) => assert!(s.train.len() >= MIN_TRAIN_DAYS),
        Err(ForecastError::InsufficientHistory(_)) => {}
        Err(other) => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_forecast_mode_trains_on_trailing_window_only() {
    let featured = featured_series(day(2023, 1, 1), 365);
    let last = featured.series().last_date();

    let result = split(&featured, &SplitMode::Forecast { training_months: 3 }).unwrap();

    assert!(result.valid.is_none());
    let train = result.train.series();
    // Trailing window includes the cutoff day itself
    assert_eq!(train.start_date(), day(2023, 9, 30));
    assert_eq!(train.last_date(), last);
    assert_eq!(result.cutoff, train.start_date());
}

#[test]
fn test_forecast_mode_clamps_to_series_start() {
    // Series shorter than the requested training window
    let featured = featured_series(day(2023, 6, 1), 45);

    let result = split(&featured, &SplitMode::Forecast { training_months: 3 }).unwrap();
    assert_eq!(result.train.series().start_date(), day(2023, 6, 1));
    assert_eq!(result.train.len(), 45);
}

#[test]
fn test_zero_month_window_rejected() {
    let featured = featured_series(day(2023, 1, 1), 100);

    let result = split(
        &featured,
        &SplitMode::Backtest {
            validation_months: 0,
        },
    );
    assert!(matches!(result, Err(ForecastError::InvalidParameter(_))));
}
