use assert_approx_eq::assert_approx_eq;
use chrono::NaiveDate;
use demand_forecast::data::DailySeries;
use demand_forecast::features::{derive, FeaturePolicy, StatsWindow};
use rstest::rstest;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn sample_series() -> DailySeries {
    // 100 quiet days with one huge outlier
    let mut values: Vec<f64> = (0..100).map(|i| 10.0 + (i % 7) as f64).collect();
    values[50] = 500.0;
    DailySeries::from_values("X", day(2023, 1, 1), values).unwrap()
}

#[test]
fn test_clip_ceiling_bounds_all_values() {
    let series = sample_series();
    let featured = derive(&series, &FeaturePolicy::default(), None).unwrap();

    let ceiling = featured.clip_ceiling();
    assert!(ceiling < 500.0, "outlier should be above the ceiling");
    for &v in featured.series().values() {
        assert!(v <= ceiling, "{} exceeds clip ceiling {}", v, ceiling);
    }

    // The outlier day is capped at the ceiling, not dropped
    let clipped_outlier = featured.series().value_on(day(2023, 2, 20)).unwrap();
    assert_approx_eq!(clipped_outlier, ceiling, 1e-9);
}

#[test]
fn test_spike_threshold_is_strict() {
    // Median of the clipped series is 10; threshold at 3x median = 30
    let mut values = vec![10.0; 99];
    values.push(30.0); // exactly at the threshold: not a spike
    let series = DailySeries::from_values("X", day(2023, 1, 1), values).unwrap();

    // Clip at the 100th percentile so clipping leaves the values alone
    let policy = FeaturePolicy {
        clip_percentile: 100.0,
        ..FeaturePolicy::default()
    };
    let featured = derive(&series, &policy, None).unwrap();
    assert_approx_eq!(featured.spike_threshold(), 30.0, 1e-9);
    assert!(!featured.spikes().iter().any(|&s| s));
}

#[rstest]
#[case(2.0)]
#[case(3.0)]
#[case(5.0)]
fn test_spike_count_is_monotone_in_multiplier(#[case] multiplier: f64) {
    let series = sample_series();

    let base = FeaturePolicy {
        spike_multiplier: multiplier,
        ..FeaturePolicy::default()
    };
    let raised = FeaturePolicy {
        spike_multiplier: multiplier * 1.5,
        ..FeaturePolicy::default()
    };

    let count = |policy: &FeaturePolicy| {
        derive(&series, policy, None)
            .unwrap()
            .spikes()
            .iter()
            .filter(|&&s| s)
            .count()
    };

    assert!(count(&raised) <= count(&base));
}

#[test]
fn test_training_only_stats_ignore_later_days() {
    // Quiet training period, explosive tail
    let mut values = vec![10.0; 60];
    values.extend(vec![100.0; 30]);
    let series = DailySeries::from_values("X", day(2023, 1, 1), values).unwrap();
    let cutoff = day(2023, 3, 1); // day 60

    let full = derive(&series, &FeaturePolicy::default(), None).unwrap();
    let train_only = derive(
        &series,
        &FeaturePolicy {
            stats_window: StatsWindow::TrainingOnly,
            ..FeaturePolicy::default()
        },
        Some(cutoff),
    )
    .unwrap();

    // Full-series stats see the tail and raise the ceiling
    assert!(train_only.clip_ceiling() < full.clip_ceiling());
}

#[test]
fn test_spike_lookup_outside_series_defaults_to_false() {
    let series = sample_series();
    let featured = derive(&series, &FeaturePolicy::default(), None).unwrap();

    assert!(!featured.spike_on(day(2030, 1, 1)));
    assert!(!featured.spike_on(day(2000, 1, 1)));
}

#[test]
fn test_window_preserves_flags() {
    let series = sample_series();
    let featured = derive(&series, &FeaturePolicy::default(), None).unwrap();

    let from = day(2023, 2, 15);
    let to = day(2023, 2, 25);
    let window = featured.window(from, to).unwrap();

    assert_eq!(window.len(), 11);
    for (i, (date, _)) in window.series().iter().enumerate() {
        assert_eq!(window.spikes()[i], featured.spike_on(date));
    }
}

#[test]
fn test_invalid_policy_rejected() {
    let series = sample_series();

    let result = derive(
        &series,
        &FeaturePolicy {
            clip_percentile: 150.0,
            ..FeaturePolicy::default()
        },
        None,
    );
    assert!(result.is_err());

    let result = derive(
        &series,
        &FeaturePolicy {
            spike_multiplier: 0.0,
            ..FeaturePolicy::default()
        },
        None,
    );
    assert!(result.is_err());
}
