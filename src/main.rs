use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use demand_forecast::{config, forecast, loader, telemetry};
use config::Config;
use forecast::{covered_dates, slice_by_date, split, summarize, DistributionGrouping, ForecastEngine};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use telemetry::init_tracing;
use tracing::info;

#[derive(Parser)]
#[command(name = "demand-forecast")]
#[command(about = "Hourly electricity demand: train/test split, distribution and forecast views")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    view: View,

    /// Configuration file (defaults, then this file, then DEMAND__* variables)
    #[arg(short, long, global = true, env = "DEMAND_CONFIG", default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Override the CSV path from the configuration
    #[arg(short, long, global = true)]
    data: Option<PathBuf>,
}

#[derive(Subcommand)]
enum View {
    /// Canonical series split into training and test ranges
    TrainTest,

    /// Box-plot statistics by month, weekday or hour
    Distribution {
        #[arg(short, long, default_value_t = DistributionGrouping::Monthly)]
        grouping: DistributionGrouping,
    },

    /// Fit on the training range and forecast past it
    Forecast {
        /// Only print the forecast for this day (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Override the configured horizon
        #[arg(long)]
        horizon: Option<usize>,

        /// Write the trained model (bincode) to this file
        #[arg(long)]
        save_model: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct Point {
    timestamp: NaiveDateTime,
    value: Option<f64>,
}

#[derive(Serialize)]
struct TrainTestView {
    boundary: NaiveDateTime,
    train: Vec<Point>,
    test: Vec<Point>,
}

#[derive(Serialize)]
struct ForecastView<'a> {
    model_id: &'a str,
    dates: Vec<NaiveDate>,
    average: Option<f64>,
    peak: Option<demand_forecast::domain::ForecastPoint>,
    metrics: Option<&'a forecast::ForecastMetrics>,
    points: Vec<demand_forecast::domain::ForecastPoint>,
}

fn points(series: &demand_forecast::domain::TimeSeries) -> Vec<Point> {
    series
        .iter()
        .map(|(timestamp, value)| Point { timestamp, value })
        .collect()
}

fn emit<T: Serialize>(value: &T) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut cfg = Config::load_from(&cli.config)?;
    if let Some(path) = cli.data {
        cfg.data.path = path;
    }
    if let View::Forecast {
        horizon: Some(horizon),
        ..
    } = cli.view
    {
        cfg.forecast.horizon = horizon;
    }

    let engine = ForecastEngine::new(cfg.engine_config()?)?;
    let raw = loader::CsvSeriesLoader::new(&cfg.data.time_column, &cfg.data.value_column)
        .load_path(&cfg.data.path)
        .with_context(|| format!("loading {}", cfg.data.path.display()))?;
    info!(rows = raw.len(), path = %cfg.data.path.display(), "loaded raw observations");

    match cli.view {
        View::TrainTest => {
            let series = engine.normalize(&raw)?;
            let split = split(&series, engine.config().train_end)?;
            emit(&TrainTestView {
                boundary: split.boundary,
                train: points(&split.train),
                test: points(&split.test),
            })
        }
        View::Distribution { grouping } => {
            let series = engine.normalize(&raw)?;
            emit(&summarize(&series, grouping))
        }
        View::Forecast {
            date, save_model, ..
        } => {
            let run = engine.run(&raw)?;
            if let Some(path) = save_model {
                let file = File::create(&path)
                    .with_context(|| format!("creating {}", path.display()))?;
                bincode::serialize_into(BufWriter::new(file), run.forecaster.model())
                    .context("writing model")?;
                info!(path = %path.display(), "saved trained model");
            }

            let points = match date {
                Some(date) => slice_by_date(&run.forecast, date),
                None => run.forecast.points().to_vec(),
            };
            emit(&ForecastView {
                model_id: &run.forecaster.model().regression.metadata.model_id,
                dates: covered_dates(&run.forecast),
                average: run.forecast.average(),
                peak: run.forecast.peak(),
                metrics: run.metrics.as_ref(),
                points,
            })
        }
    }
}
