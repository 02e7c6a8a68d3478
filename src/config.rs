use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::domain::{parse_timestamp, DateRange, Frequency};
use crate::forecast::{EngineConfig, ForecasterConfig};

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
pub const ENV_PREFIX: &str = "DEMAND__";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub data: DataConfig,
    pub series: SeriesConfig,
    pub model: ForecasterConfig,
    pub forecast: ForecastConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    pub path: PathBuf,
    pub time_column: String,
    pub value_column: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesConfig {
    pub frequency_minutes: i64,
    /// Display range; both ends or neither
    pub range_start: Option<String>,
    pub range_end: Option<String>,
    pub train_end: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    pub horizon: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data: DataConfig {
                path: PathBuf::from("data/PJME_hourly.csv"),
                time_column: "Datetime".to_string(),
                value_column: "PJME_MW".to_string(),
            },
            series: SeriesConfig {
                frequency_minutes: 60,
                range_start: Some("2015-01-01 00:00:00".to_string()),
                range_end: Some("2017-12-31 23:00:00".to_string()),
                train_end: "2017-11-30 23:59:00".to_string(),
            },
            model: ForecasterConfig::default(),
            forecast: ForecastConfig { horizon: 744 },
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Built-in defaults, then `path` if it exists, then `DEMAND__*` variables
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));
        figment
            .extract()
            .with_context(|| format!("invalid configuration (file {})", path.display()))
    }

    pub fn frequency(&self) -> Result<Frequency> {
        Ok(Frequency::minutes(self.series.frequency_minutes)?)
    }

    pub fn range(&self) -> Result<Option<DateRange>> {
        match (&self.series.range_start, &self.series.range_end) {
            (Some(start), Some(end)) => Ok(Some(
                DateRange::parse(start, end).context("invalid series range")?,
            )),
            (None, None) => Ok(None),
            _ => anyhow::bail!("series.range_start and series.range_end must be set together"),
        }
    }

    pub fn engine_config(&self) -> Result<EngineConfig> {
        let config = EngineConfig {
            frequency: self.frequency()?,
            range: self.range()?,
            train_end: parse_timestamp(&self.series.train_end).context("invalid series.train_end")?,
            model: self.model,
            horizon: self.forecast.horizon,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use figment::Jail;

    #[test]
    fn test_defaults_reproduce_reference_scenario() {
        let engine = Config::default().engine_config().unwrap();
        assert_eq!(engine.frequency, Frequency::hourly());
        assert_eq!(engine.model.lags, 24);
        assert_eq!(engine.model.alpha, 1.0);
        assert_eq!(engine.horizon, 744);
        assert_eq!(
            engine.train_end,
            NaiveDate::from_ymd_opt(2017, 11, 30)
                .unwrap()
                .and_hms_opt(23, 59, 0)
                .unwrap()
        );
        let range = engine.range.unwrap();
        assert_eq!(range.start.to_string(), "2015-01-01 00:00:00");
        assert_eq!(range.end.to_string(), "2017-12-31 23:00:00");
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        Jail::expect_with(|_jail| {
            let config = Config::load_from("nope.toml").map_err(|e| e.to_string())?;
            assert_eq!(config, Config::default());
            Ok(())
        });
    }

    #[test]
    fn test_file_and_env_layering() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "demand.toml",
                r#"
                [data]
                path = "other.csv"
                time_column = "ts"
                value_column = "mw"

                [forecast]
                horizon = 48
                "#,
            )?;
            jail.set_env("DEMAND__MODEL__LAGS", "48");
            jail.set_env("DEMAND__SERIES__FREQUENCY_MINUTES", "15");

            let config = Config::load_from("demand.toml").map_err(|e| e.to_string())?;
            assert_eq!(config.data.path, PathBuf::from("other.csv"));
            assert_eq!(config.data.value_column, "mw");
            assert_eq!(config.forecast.horizon, 48);
            assert_eq!(config.model.lags, 48);
            assert_eq!(config.model.alpha, 1.0);
            assert_eq!(
                config.frequency().map_err(|e| e.to_string())?,
                Frequency::minutes(15).map_err(|e| e.to_string())?
            );
            Ok(())
        });
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = Config::default();
        config.series.frequency_minutes = 0;
        assert!(config.engine_config().is_err());

        let mut config = Config::default();
        config.series.range_end = None;
        assert!(config.range().is_err());

        let mut config = Config::default();
        config.series.train_end = "end of november".to_string();
        assert!(config.engine_config().is_err());

        let mut config = Config::default();
        config.model.lags = 0;
        assert!(config.engine_config().is_err());
    }
}
