//! Feature engineering for forecasting models
//!
//! Lag features turn a series into supervised rows for the autoregressive
//! model; calendar features key the demand distribution summaries.

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::domain::TimeSeries;
use crate::error::{ForecastError, Result};

/// One supervised row: `predictors[j]` is the value `W - j` steps before the target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LagRow {
    /// Trailing window, oldest first
    pub predictors: Vec<f64>,
    pub target: f64,
}

/// Lag rows for a canonical series; every slot must be filled
pub fn featurize(series: &TimeSeries, window: usize) -> Result<Vec<LagRow>> {
    check_window(window)?;
    if series.len() < window + 1 {
        return Err(ForecastError::InsufficientHistory {
            required: window + 1,
            available: series.len(),
        });
    }
    featurize_values(&series.values()?, window)
}

/// Lag rows over a plain slice of values
pub fn featurize_values(values: &[f64], window: usize) -> Result<Vec<LagRow>> {
    check_window(window)?;
    if values.len() < window + 1 {
        return Err(ForecastError::InsufficientHistory {
            required: window + 1,
            available: values.len(),
        });
    }

    Ok(values
        .windows(window + 1)
        .map(|w| LagRow {
            predictors: w[..window].to_vec(),
            target: w[window],
        })
        .collect())
}

pub(crate) fn check_window(window: usize) -> Result<()> {
    if window == 0 {
        return Err(ForecastError::InvalidParameter(
            "lag window must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// Calendar position of a timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarFeatures {
    /// Hour of day (0-23)
    pub hour_of_day: u32,
    /// Day of week (0=Monday, 6=Sunday)
    pub day_of_week: u32,
    /// Month (1-12)
    pub month: u32,
}

impl CalendarFeatures {
    pub fn extract(timestamp: NaiveDateTime) -> Self {
        Self {
            hour_of_day: timestamp.hour(),
            day_of_week: timestamp.weekday().num_days_from_monday(),
            month: timestamp.month(),
        }
    }
}
