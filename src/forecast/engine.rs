use chrono::NaiveDateTime;
use tracing::{info, warn};

use super::autoregressive::{AutoregressiveForecaster, ForecasterConfig, TrainedForecaster};
use super::metrics::ForecastMetrics;
use super::normalize::SeriesNormalizer;
use super::split::{split, TrainTestSplit};
use crate::domain::{DateRange, ForecastResult, Frequency, RawObservation, TimeSeries};
use crate::error::{ForecastError, Result};

/// Everything one pipeline run needs
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub frequency: Frequency,
    /// Display range applied after gap filling; `None` keeps the loaded range
    pub range: Option<DateRange>,
    /// Last instant that belongs to the training range
    pub train_end: NaiveDateTime,
    pub model: ForecasterConfig,
    pub horizon: usize,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        self.model.validate()?;
        if self.horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "horizon must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Output of a full pipeline run
#[derive(Debug, Clone)]
pub struct ForecastRun {
    /// Canonical series over the display range
    pub series: TimeSeries,
    pub split: TrainTestSplit,
    pub forecaster: TrainedForecaster,
    /// Starts one step after the training range
    pub forecast: ForecastResult,
    /// Accuracy against the test range, when they overlap
    pub metrics: Option<ForecastMetrics>,
}

/// Normalize, split, fit and forecast in one pass
#[derive(Debug, Clone)]
pub struct ForecastEngine {
    config: EngineConfig,
}

impl ForecastEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn normalize(&self, raw: &[RawObservation]) -> Result<TimeSeries> {
        let mut normalizer = SeriesNormalizer::new(self.config.frequency);
        if let Some(range) = self.config.range {
            normalizer = normalizer.with_range(range);
        }
        normalizer.normalize(raw)
    }

    pub fn run(&self, raw: &[RawObservation]) -> Result<ForecastRun> {
        let series = self.normalize(raw)?;
        self.run_series(series)
    }

    /// Run on an already canonical series
    pub fn run_series(&self, series: TimeSeries) -> Result<ForecastRun> {
        let split = split(&series, self.config.train_end)?;
        let forecaster = AutoregressiveForecaster::new(self.config.model).fit(&split.train)?;
        let forecast = forecaster.forecast(&split.train, self.config.horizon)?;

        let metrics = match ForecastMetrics::evaluate(&forecast, &split.test) {
            Ok(metrics) => {
                info!(%metrics, "forecast evaluated against test range");
                Some(metrics)
            }
            Err(e) => {
                warn!(error = %e, "forecast not evaluated");
                None
            }
        };

        Ok(ForecastRun {
            series,
            split,
            forecaster,
            forecast,
            metrics,
        })
    }
}
