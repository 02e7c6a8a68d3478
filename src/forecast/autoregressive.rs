//! Autoregressive lag-window forecaster
//!
//! A ridge regression maps the `W` most recent values to the next one.
//! Multi-step forecasts are recursive: each prediction is pushed into a fixed
//! ring buffer and becomes the newest lag of the following step, so errors
//! compound exactly as they do in a deployed autoregressive model.
//!
//! The forecaster only moves Untrained → Trained: [`AutoregressiveForecaster::fit`]
//! consumes the untrained value and returns an immutable [`TrainedForecaster`].

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::features::{check_window, featurize};
use crate::domain::{ForecastResult, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::ml::{LinearRegressionModel, ModelTrainer, TrainingConfig, TrainingDataset};

/// One full day of hourly lags
pub const DEFAULT_LAGS: usize = 24;
pub const DEFAULT_ALPHA: f64 = 1.0;

/// Fixed model configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecasterConfig {
    /// Lag window size W
    pub lags: usize,
    /// Ridge penalty
    pub alpha: f64,
}

impl Default for ForecasterConfig {
    fn default() -> Self {
        Self {
            lags: DEFAULT_LAGS,
            alpha: DEFAULT_ALPHA,
        }
    }
}

impl ForecasterConfig {
    pub fn validate(&self) -> Result<()> {
        check_window(self.lags)?;
        TrainingConfig { alpha: self.alpha }.validate()
    }
}

/// Learned lag coefficients together with the window they expect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LagModel {
    pub lags: usize,
    /// Coefficients are ordered oldest lag first
    pub regression: LinearRegressionModel,
}

/// Untrained forecaster
#[derive(Debug, Clone, Default)]
pub struct AutoregressiveForecaster {
    config: ForecasterConfig,
}

impl AutoregressiveForecaster {
    pub fn new(config: ForecasterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ForecasterConfig {
        &self.config
    }

    /// Train on a canonical series
    pub fn fit(self, train: &TimeSeries) -> Result<TrainedForecaster> {
        self.config.validate()?;
        let lags = self.config.lags;
        let rows = featurize(train, lags)?;
        let dataset = TrainingDataset::from_lag_rows(rows)?;
        let feature_names = (1..=lags).rev().map(|k| format!("lag_{}", k)).collect();

        let regression = ModelTrainer::new(TrainingConfig {
            alpha: self.config.alpha,
        })
        .train_ridge(&dataset, feature_names)?;

        info!(
            model_id = %regression.metadata.model_id,
            lags,
            alpha = self.config.alpha,
            samples = dataset.len(),
            training_mape = regression.metadata.training_metrics.mape,
            "trained autoregressive forecaster"
        );
        Ok(TrainedForecaster {
            model: LagModel { lags, regression },
        })
    }
}

/// Trained forecaster; read-only and shareable across threads
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedForecaster {
    model: LagModel,
}

impl TrainedForecaster {
    /// Rebuild from a previously trained (e.g. deserialized) model
    pub fn from_model(model: LagModel) -> Result<Self> {
        check_window(model.lags)?;
        if model.regression.n_features() != model.lags {
            return Err(ForecastError::InvalidParameter(format!(
                "model has {} coefficients for {} lags",
                model.regression.n_features(),
                model.lags
            )));
        }
        Ok(Self { model })
    }

    pub fn model(&self) -> &LagModel {
        &self.model
    }

    pub fn into_model(self) -> LagModel {
        self.model
    }

    pub fn lags(&self) -> usize {
        self.model.lags
    }

    /// Next value after `window` (the last W values, oldest first)
    pub fn predict_one(&self, window: &[f64]) -> Result<f64> {
        self.model.regression.predict(window)
    }

    /// Recursive forecast of `horizon` steps seeded with `seed` (oldest first)
    pub fn forecast_values(&self, seed: &[f64], horizon: usize) -> Result<Vec<f64>> {
        let lags = self.model.lags;
        if seed.len() < lags {
            return Err(ForecastError::InsufficientHistory {
                required: lags,
                available: seed.len(),
            });
        }
        if horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "horizon must be at least 1".to_string(),
            ));
        }

        let regression = &self.model.regression;
        let mut ring = seed[seed.len() - lags..].to_vec();
        // ring[head] is always the oldest lag
        let mut head = 0;
        let mut out = Vec::with_capacity(horizon);
        for _ in 0..horizon {
            let (newer, oldest_first) = ring.split_at(head);
            let next = oldest_first
                .iter()
                .chain(newer)
                .zip(&regression.coefficients)
                .map(|(x, w)| x * w)
                .sum::<f64>()
                + regression.intercept;
            out.push(next);
            ring[head] = next;
            head = (head + 1) % lags;
        }
        Ok(out)
    }

    /// Forecast `horizon` steps following the last timestamp of `history`
    pub fn forecast(&self, history: &TimeSeries, horizon: usize) -> Result<ForecastResult> {
        let lags = self.model.lags;
        let last = match history.last_timestamp() {
            Some(last) if history.len() >= lags => last,
            _ => {
                return Err(ForecastError::InsufficientHistory {
                    required: lags,
                    available: history.len(),
                })
            }
        };
        let seed = history.slice(history.len() - lags, history.len()).values()?;
        let values = self.forecast_values(&seed, horizon)?;

        let frequency = history.frequency();
        let first = frequency.advance(last, 1);
        debug!(%first, horizon, lags, "recursive forecast");
        Ok(ForecastResult::from_values(first, frequency, values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Frequency;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2017, 11, 29)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn hourly(values: Vec<f64>) -> TimeSeries {
        TimeSeries::from_values(start(), Frequency::hourly(), values)
    }

    fn ramp_two_days() -> TimeSeries {
        hourly((1..=48).map(|v| v as f64).collect())
    }

    fn noisy_daily(len: usize) -> TimeSeries {
        hourly(
            (0..len)
                .map(|i| {
                    let hour = (i % 24) as f64;
                    1000.0 + 300.0 * (hour / 24.0 * std::f64::consts::TAU).sin() + ((i * 7919) % 13) as f64
                })
                .collect(),
        )
    }

    fn trained(series: &TimeSeries, lags: usize) -> TrainedForecaster {
        AutoregressiveForecaster::new(ForecasterConfig { lags, alpha: 1.0 })
            .fit(series)
            .unwrap()
    }

    #[test]
    fn test_fit_requires_window_plus_one() {
        let series = hourly((0..24).map(|v| v as f64).collect());
        let err = AutoregressiveForecaster::default().fit(&series).unwrap_err();
        assert_eq!(
            err,
            ForecastError::InsufficientHistory {
                required: 25,
                available: 24
            }
        );
    }

    #[test]
    fn test_fit_rejects_invalid_config() {
        let series = ramp_two_days();
        for config in [
            ForecasterConfig { lags: 0, alpha: 1.0 },
            ForecasterConfig { lags: 24, alpha: -0.5 },
        ] {
            assert!(matches!(
                AutoregressiveForecaster::new(config).fit(&series),
                Err(ForecastError::InvalidParameter(_))
            ));
        }
    }

    #[test]
    fn test_ramp_scenario_continues_trend() {
        let history = ramp_two_days();
        let forecaster = trained(&history, 24);
        let model = forecaster.model();
        assert_eq!(model.lags, 24);
        assert_eq!(model.regression.coefficients.len(), 24);
        assert_eq!(model.regression.metadata.feature_names[0], "lag_24");
        assert_eq!(model.regression.metadata.feature_names[23], "lag_1");

        let forecast = forecaster.forecast(&history, 24).unwrap();
        assert_eq!(forecast.len(), 24);
        assert_eq!(
            forecast.first_timestamp(),
            Some(history.last_timestamp().unwrap() + Duration::hours(1))
        );

        // Ridge on a unit ramp extrapolates almost exactly one step ahead
        let values = forecast.values();
        assert!((values[0] - 49.0).abs() < 1e-2, "first step {}", values[0]);

        // and is nothing like repeating the last observed day
        let baseline: Vec<f64> = (25..=48).map(|v| v as f64).collect();
        assert!(values
            .iter()
            .zip(&baseline)
            .all(|(forecast, naive)| (forecast - naive).abs() > 1.0));
    }

    #[test]
    fn test_forecast_chains_predict_one() {
        let history = noisy_daily(24 * 7);
        let forecaster = trained(&history, 24);
        let forecast = forecaster.forecast(&history, 3).unwrap().values();

        let mut window = history.values().unwrap()[history.len() - 24..].to_vec();
        let mut chained = Vec::new();
        for _ in 0..3 {
            let next = forecaster.predict_one(&window).unwrap();
            chained.push(next);
            window.remove(0);
            window.push(next);
        }
        for (a, b) in forecast.iter().zip(&chained) {
            assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
        }

        // Predicting from true history instead of predictions gives different steps
        let extended = noisy_daily(24 * 7 + 3).values().unwrap();
        let independent = forecaster
            .predict_one(&extended[extended.len() - 1 - 24..extended.len() - 1])
            .unwrap();
        assert_ne!(independent, forecast[2]);
    }

    #[test]
    fn test_ring_buffer_matches_sliding_window_over_long_horizon() {
        let history = noisy_daily(24 * 5);
        let forecaster = trained(&history, 5);
        let seed = history.values().unwrap();
        let fast = forecaster.forecast_values(&seed, 61).unwrap();

        let mut window = seed[seed.len() - 5..].to_vec();
        for expected in fast {
            let next = forecaster.predict_one(&window).unwrap();
            assert!((next - expected).abs() < 1e-9);
            window.remove(0);
            window.push(next);
        }
    }

    #[test]
    fn test_forecast_argument_errors() {
        let history = ramp_two_days();
        let forecaster = trained(&history, 24);

        let short = hourly((0..23).map(|v| v as f64).collect());
        assert_eq!(
            forecaster.forecast(&short, 5),
            Err(ForecastError::InsufficientHistory {
                required: 24,
                available: 23
            })
        );
        assert!(matches!(
            forecaster.forecast(&history, 0),
            Err(ForecastError::InvalidParameter(_))
        ));
        assert!(matches!(
            forecaster.predict_one(&[1.0; 23]),
            Err(ForecastError::InsufficientHistory { .. })
        ));
        assert!(matches!(
            forecaster.predict_one(&[1.0; 25]),
            Err(ForecastError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_unfilled_seed_is_rejected() {
        let history = ramp_two_days();
        let forecaster = trained(&history, 24);
        let mut slots: Vec<Option<f64>> = history.slots().to_vec();
        *slots.last_mut().unwrap() = None;
        let gappy = TimeSeries::from_slots(start(), Frequency::hourly(), slots);
        assert!(matches!(
            forecaster.forecast(&gappy, 3),
            Err(ForecastError::UnfilledValues { count: 1, .. })
        ));
    }

    #[test]
    fn test_json_preserves_coefficients_bit_for_bit() {
        let mut model = trained(&ramp_two_days(), 24).into_model();
        model.regression.coefficients[0] = 0.013168840186594961;
        model.regression.intercept = 0.1 + 0.2;

        let restored: LagModel =
            serde_json::from_str(&serde_json::to_string(&model).unwrap()).unwrap();
        let bits = |values: &[f64]| values.iter().map(|v| v.to_bits()).collect::<Vec<_>>();
        assert_eq!(
            bits(&restored.regression.coefficients),
            bits(&model.regression.coefficients)
        );
        assert_eq!(
            restored.regression.intercept.to_bits(),
            model.regression.intercept.to_bits()
        );
    }

    #[test]
    fn test_model_serialization_round_trip() {
        let forecaster = trained(&noisy_daily(24 * 3), 24);
        let model = forecaster.model().clone();

        let json = serde_json::to_string(&model).unwrap();
        let from_json: LagModel = serde_json::from_str(&json).unwrap();
        assert_eq!(from_json.lags, model.lags);
        assert_eq!(from_json.regression.coefficients, model.regression.coefficients);
        assert_eq!(from_json.regression.intercept, model.regression.intercept);

        let bytes = bincode::serialize(&model).unwrap();
        let from_bytes: LagModel = bincode::deserialize(&bytes).unwrap();
        assert_eq!(from_bytes, model);

        let restored = TrainedForecaster::from_model(from_bytes).unwrap();
        let history = noisy_daily(48);
        assert_eq!(
            restored.forecast(&history, 10).unwrap(),
            forecaster.forecast(&history, 10).unwrap()
        );
    }

    #[test]
    fn test_from_model_checks_shape() {
        let mut model = trained(&ramp_two_days(), 24).into_model();
        model.lags = 12;
        assert!(matches!(
            TrainedForecaster::from_model(model),
            Err(ForecastError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_shared_model_concurrent_forecasts() {
        let history = noisy_daily(24 * 7);
        let forecaster = trained(&history, 24);
        let expected = forecaster.forecast(&history, 48).unwrap();

        let results: Vec<ForecastResult> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| forecaster.forecast(&history, 48).unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(results.iter().all(|r| r == &expected));
    }
}
