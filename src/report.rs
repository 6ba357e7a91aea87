//! Console reporting and comparison charts
//!
//! Thin presentation layer over pipeline outcomes: a short textual summary
//! (thousands-separated units, SMAPE as a percentage) and an SVG chart with
//! the actual line, the dashed forecast line, the 80% band, and a shaded
//! forecast-period region.

use crate::error::{ForecastError, Result};
use crate::models::ForecastPoint;
use crate::pipeline::{BacktestOutcome, ForecastOutcome};
use chrono::NaiveDate;
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use std::path::Path;

/// Format a value with thousands separators, e.g. `12,345.67`.
fn thousands(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::new();
    let digits: Vec<char> = int_part.chars().collect();
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*c);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    match frac_part {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}

/// Print the backtest summary to stdout.
pub fn print_backtest(outcome: &BacktestOutcome) {
    if let Some(first_sale) = outcome.first_sale {
        println!("First ever sale of this SKU: {}", first_sale);
    }

    let eval = &outcome.evaluation;
    println!("\nValidation scores for SKU {}", outcome.stock_code);
    println!("  MAE  : {} units", thousands(eval.mae, 2));
    println!("  RMSE : {} units", thousands(eval.rmse, 2));
    println!("  SMAPE: {:.2}%", eval.smape * 100.0);

    println!(
        "\nExpected units shipped for {} in the validation period: {}",
        outcome.stock_code,
        thousands(eval.total_predicted, 0)
    );
    println!("Mean daily sales  : {:.2}", eval.mean_actual);
    println!("Median daily sales: {:.2}", eval.median_actual);
}

/// Print the forward-forecast summary to stdout.
pub fn print_forecast(outcome: &ForecastOutcome) {
    if let Some(first_sale) = outcome.first_sale {
        println!("First ever sale of this SKU: {}", first_sale);
    }

    println!(
        "\nExpected units shipped for {} in the next {} days: {}",
        outcome.stock_code,
        outcome.forecast.len(),
        thousands(outcome.total_forecast, 0)
    );
    println!("\nSummary statistics for the forecast period:");
    println!("Mean daily forecast sales  : {:.2}", outcome.mean_forecast);
    println!("Median daily forecast sales: {:.2}", outcome.median_forecast);
}

const ACTUAL_COLOR: RGBColor = RGBColor(31, 119, 180);
const FORECAST_COLOR: RGBColor = RGBColor(255, 127, 14);
const BAND_COLOR: RGBColor = RGBColor(160, 160, 160);
const PERIOD_COLOR: RGBColor = RGBColor(173, 216, 230);

fn y_ceiling(values: impl Iterator<Item = f64>) -> f64 {
    let max = values.fold(0.0f64, f64::max);
    if max > 0.0 {
        max * 1.1
    } else {
        1.0
    }
}

/// Render the backtest comparison chart (actual vs. predicted) to SVG.
pub fn backtest_chart<P: AsRef<Path>>(path: P, outcome: &BacktestOutcome) -> Result<()> {
    let actual: Vec<(NaiveDate, f64)> = outcome.actual.iter().collect();
    let predicted: Vec<(NaiveDate, f64)> =
        outcome.forecast.iter().map(|p| (p.date, p.point)).collect();

    let x_range = outcome.actual.start_date()..outcome.actual.last_date();
    let y_max = y_ceiling(
        actual
            .iter()
            .map(|&(_, v)| v)
            .chain(predicted.iter().map(|&(_, v)| v)),
    );

    draw_chart(
        path,
        &format!("Validation - {}", outcome.stock_code),
        x_range,
        y_max,
        &actual,
        "Actual",
        &predicted,
        "Predicted",
        None,
        None,
    )
}

/// Render the forward forecast chart (history, forecast, band, shaded
/// forecast period) to SVG.
pub fn forecast_chart<P: AsRef<Path>>(path: P, outcome: &ForecastOutcome) -> Result<()> {
    let history: Vec<(NaiveDate, f64)> = outcome.train.iter().collect();
    let predicted: Vec<(NaiveDate, f64)> =
        outcome.forecast.iter().map(|p| (p.date, p.point)).collect();

    let last_forecast_date = outcome
        .forecast
        .last()
        .map(|p| p.date)
        .unwrap_or_else(|| outcome.train.last_date());
    let x_range = outcome.train.start_date()..last_forecast_date;
    let y_max = y_ceiling(
        history
            .iter()
            .map(|&(_, v)| v)
            .chain(outcome.forecast.iter().map(|p| p.upper)),
    );

    let band: Vec<ForecastPoint> = outcome.forecast.clone();
    let period = (outcome.train.last_date(), last_forecast_date);

    draw_chart(
        path,
        &format!("Future Sales Forecast - {}", outcome.stock_code),
        x_range,
        y_max,
        &history,
        "Actual (Past)",
        &predicted,
        "Forecast",
        Some(&band),
        Some(period),
    )
}

#[allow(clippy::too_many_arguments)]
fn draw_chart<P: AsRef<Path>>(
    path: P,
    caption: &str,
    x_range: std::ops::Range<NaiveDate>,
    y_max: f64,
    actual: &[(NaiveDate, f64)],
    actual_label: &str,
    predicted: &[(NaiveDate, f64)],
    predicted_label: &str,
    band: Option<&[ForecastPoint]>,
    shaded_period: Option<(NaiveDate, NaiveDate)>,
) -> Result<()> {
    let chart_err = |e: DrawingAreaErrorKind<_>| ForecastError::Chart(e.to_string());

    let root = SVGBackend::new(path.as_ref(), (1000, 420)).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .caption(caption, ("sans-serif", 20))
        .set_label_area_size(LabelAreaPosition::Left, 50)
        .set_label_area_size(LabelAreaPosition::Bottom, 35)
        .build_cartesian_2d(x_range, 0f64..y_max)
        .map_err(chart_err)?;

    chart
        .configure_mesh()
        .x_desc("Date")
        .y_desc("Units / Day")
        .x_labels(8)
        .y_labels(6)
        .draw()
        .map_err(chart_err)?;

    if let Some((from, to)) = shaded_period {
        chart
            .draw_series(std::iter::once(Rectangle::new(
                [(from, 0.0), (to, y_max)],
                PERIOD_COLOR.mix(0.3).filled(),
            )))
            .map_err(chart_err)?;
    }

    if let Some(points) = band {
        // Upper bound forward, lower bound back: a closed band polygon
        let mut polygon: Vec<(NaiveDate, f64)> =
            points.iter().map(|p| (p.date, p.upper.max(0.0))).collect();
        polygon.extend(points.iter().rev().map(|p| (p.date, p.lower.max(0.0))));
        chart
            .draw_series(std::iter::once(Polygon::new(
                polygon,
                BAND_COLOR.mix(0.4),
            )))
            .map_err(chart_err)?;
    }

    chart
        .draw_series(LineSeries::new(
            actual.iter().copied(),
            ACTUAL_COLOR.stroke_width(2),
        ))
        .map_err(chart_err)?
        .label(actual_label)
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 16, y)], ACTUAL_COLOR.stroke_width(2)));

    chart
        .draw_series(DashedLineSeries::new(
            predicted.iter().copied(),
            6,
            4,
            FORECAST_COLOR.stroke_width(1),
        ))
        .map_err(chart_err)?
        .label(predicted_label)
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 16, y)], FORECAST_COLOR));

    chart
        .configure_series_labels()
        .border_style(BLACK.mix(0.4))
        .background_style(WHITE.mix(0.8))
        .draw()
        .map_err(chart_err)?;

    root.present().map_err(|e| ForecastError::Chart(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::thousands;

    #[test]
    fn groups_thousands() {
        assert_eq!(thousands(1234567.891, 2), "1,234,567.89");
        assert_eq!(thousands(999.0, 0), "999");
        assert_eq!(thousands(1000.0, 0), "1,000");
        assert_eq!(thousands(-1234.5, 2), "-1,234.50");
    }
}
