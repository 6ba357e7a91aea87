//! CLI for single-SKU demand forecasting and backtesting

use clap::{Parser, Subcommand, ValueEnum};
use demand_forecast::features::{FeaturePolicy, StatsWindow};
use demand_forecast::models::seasonal_regression::{ModelOptions, SeasonalityMode};
use demand_forecast::pipeline::{
    self, Mode, PipelineConfig, PipelineOutcome, DEFAULT_HORIZON_DAYS, DEFAULT_TRAINING_MONTHS,
    DEFAULT_VALIDATION_MONTHS,
};
use demand_forecast::report;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "demand-forecast",
    version,
    about = "Short-horizon daily demand forecasting for a retail SKU"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Score forecast accuracy against a held-out trailing window
    Backtest(BacktestArgs),
    /// Forecast past the end of the series from recent history
    Forecast(ForecastArgs),
}

#[derive(Debug, Parser)]
struct CommonArgs {
    /// Path to the transaction CSV (InvoiceDate, StockCode, Quantity)
    #[arg(long)]
    data: PathBuf,

    /// Target stock code
    #[arg(long)]
    sku: String,

    /// Seasonality mode of the regression model
    #[arg(long, value_enum)]
    seasonality_mode: Option<SeasonalityModeArg>,

    /// Fit yearly seasonality (needs at least a year of history)
    #[arg(long)]
    yearly: bool,

    /// Disable weekly seasonality
    #[arg(long)]
    no_weekly: bool,

    /// Disable the spike exogenous regressor
    #[arg(long)]
    no_spike_regressor: bool,

    /// Compute clip/spike statistics on the training window only instead
    /// of the full series (avoids leaking validation data into features)
    #[arg(long)]
    train_only_stats: bool,

    /// Write a comparison chart to this SVG path
    #[arg(long)]
    chart: Option<PathBuf>,

    /// Print metrics as JSON instead of the text summary
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Parser)]
struct BacktestArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Length of the held-out validation window, in months
    #[arg(long, default_value_t = DEFAULT_VALIDATION_MONTHS)]
    validation_months: u32,
}

#[derive(Debug, Parser)]
struct ForecastArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Days to forecast past the series end
    #[arg(long, default_value_t = DEFAULT_HORIZON_DAYS)]
    horizon: usize,

    /// Length of the trailing training window, in months
    #[arg(long, default_value_t = DEFAULT_TRAINING_MONTHS)]
    train_months: u32,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SeasonalityModeArg {
    Additive,
    Multiplicative,
}

impl From<SeasonalityModeArg> for SeasonalityMode {
    fn from(arg: SeasonalityModeArg) -> Self {
        match arg {
            SeasonalityModeArg::Additive => SeasonalityMode::Additive,
            SeasonalityModeArg::Multiplicative => SeasonalityMode::Multiplicative,
        }
    }
}

fn build_config(common: &CommonArgs, mode: Mode) -> PipelineConfig {
    // Defaults follow the mode: backtests fit the full history with yearly
    // multiplicative seasonality, forward forecasts fit a short recent
    // window additively.
    let (default_mode, default_yearly) = match mode {
        Mode::Backtest { .. } => (SeasonalityMode::Multiplicative, true),
        Mode::Forecast { .. } => (SeasonalityMode::Additive, false),
    };

    let model = ModelOptions {
        seasonality_mode: common
            .seasonality_mode
            .map(SeasonalityMode::from)
            .unwrap_or(default_mode),
        weekly_seasonality: !common.no_weekly,
        yearly_seasonality: common.yearly || default_yearly,
        spike_regressor: !common.no_spike_regressor,
        ..ModelOptions::default()
    };

    let features = FeaturePolicy {
        stats_window: if common.train_only_stats {
            StatsWindow::TrainingOnly
        } else {
            StatsWindow::FullSeries
        },
        ..FeaturePolicy::default()
    };

    PipelineConfig {
        data_path: common.data.clone(),
        stock_code: common.sku.clone(),
        mode,
        features,
        model,
    }
}

fn run(cli: Cli) -> demand_forecast::Result<()> {
    let (common, mode) = match &cli.command {
        Command::Backtest(args) => (
            &args.common,
            Mode::Backtest {
                validation_months: args.validation_months,
            },
        ),
        Command::Forecast(args) => (
            &args.common,
            Mode::Forecast {
                horizon_days: args.horizon,
                training_months: args.train_months,
            },
        ),
    };

    let config = build_config(common, mode);
    let outcome = pipeline::run(&config)?;

    match &outcome {
        PipelineOutcome::Backtest(backtest) => {
            if common.json {
                let json = serde_json::json!({
                    "stock_code": backtest.stock_code,
                    "cutoff": backtest.cutoff,
                    "evaluation": backtest.evaluation,
                    "forecast": backtest.forecast,
                });
                println!("{}", serde_json::to_string_pretty(&json).unwrap_or_default());
            } else {
                report::print_backtest(backtest);
            }
            if let Some(path) = &common.chart {
                report::backtest_chart(path, backtest)?;
                println!("Chart written to {}", path.display());
            }
        }
        PipelineOutcome::Forecast(forecast) => {
            if common.json {
                let json = serde_json::json!({
                    "stock_code": forecast.stock_code,
                    "total_forecast": forecast.total_forecast,
                    "mean_forecast": forecast.mean_forecast,
                    "median_forecast": forecast.median_forecast,
                    "forecast": forecast.forecast,
                });
                println!("{}", serde_json::to_string_pretty(&json).unwrap_or_default());
            } else {
                report::print_forecast(forecast);
            }
            if let Some(path) = &common.chart {
                report::forecast_chart(path, forecast)?;
                println!("Chart written to {}", path.display());
            }
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let sku = match &cli.command {
        Command::Backtest(args) => args.common.sku.clone(),
        Command::Forecast(args) => args.common.sku.clone(),
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error for SKU {}: {}", sku, err);
            ExitCode::FAILURE
        }
    }
}
