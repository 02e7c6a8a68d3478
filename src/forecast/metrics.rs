//! Forecast Metrics and Evaluation
//!
//! Accuracy of a demand forecast against the held-out test range: MAE, RMSE,
//! MAPE and R², plus a coarse quality band.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::{ForecastResult, TimeSeries};

/// Forecast accuracy metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastMetrics {
    /// Mean Absolute Error
    pub mae: f64,
    /// Root Mean Square Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error (%), over non-zero actuals
    pub mape: f64,
    /// R² (coefficient of determination)
    pub r2: f64,
    pub sample_count: usize,
    /// Largest absolute error
    pub max_error: f64,
    /// Smallest absolute error
    pub min_error: f64,
    /// Standard deviation of signed errors
    pub std_dev: f64,
}

impl ForecastMetrics {
    /// Calculate metrics from actual and predicted values
    pub fn calculate(actual: &[f64], predicted: &[f64]) -> Result<Self, ForecastMetricsError> {
        if actual.len() != predicted.len() {
            return Err(ForecastMetricsError::DimensionMismatch {
                actual: actual.len(),
                predicted: predicted.len(),
            });
        }
        if actual.is_empty() {
            return Err(ForecastMetricsError::EmptyData);
        }

        let n = actual.len() as f64;
        let errors: Vec<f64> = actual.iter().zip(predicted).map(|(a, p)| a - p).collect();

        let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;
        let sse: f64 = errors.iter().map(|e| e * e).sum();
        let rmse = (sse / n).sqrt();

        let pct: Vec<f64> = actual
            .iter()
            .zip(&errors)
            .filter(|(a, _)| a.abs() > 1e-6)
            .map(|(a, e)| e.abs() / a.abs() * 100.0)
            .collect();
        let mape = if pct.is_empty() {
            0.0
        } else {
            pct.iter().sum::<f64>() / pct.len() as f64
        };

        let mean_actual = actual.iter().sum::<f64>() / n;
        let sst: f64 = actual.iter().map(|a| (a - mean_actual).powi(2)).sum();
        let r2 = if sst > 1e-10 { 1.0 - sse / sst } else { 0.0 };

        let max_error = errors.iter().map(|e| e.abs()).fold(0.0f64, f64::max);
        let min_error = errors.iter().map(|e| e.abs()).fold(f64::INFINITY, f64::min);

        let mean_error = errors.iter().sum::<f64>() / n;
        let std_dev = (errors.iter().map(|e| (e - mean_error).powi(2)).sum::<f64>() / n).sqrt();

        Ok(Self {
            mae,
            rmse,
            mape,
            r2,
            sample_count: actual.len(),
            max_error,
            min_error,
            std_dev,
        })
    }

    /// Compare a forecast with the observed series over their common timestamps
    ///
    /// Unfilled actual slots are skipped.
    pub fn evaluate(
        forecast: &ForecastResult,
        actual: &TimeSeries,
    ) -> Result<Self, ForecastMetricsError> {
        let (observed, predicted): (Vec<f64>, Vec<f64>) = forecast
            .points()
            .iter()
            .filter_map(|p| {
                let index = actual.index_of(p.timestamp)?;
                actual.value_at(index).map(|a| (a, p.value))
            })
            .unzip();
        if observed.is_empty() {
            return Err(ForecastMetricsError::NoOverlap);
        }
        Self::calculate(&observed, &predicted)
    }

    /// Quality band from MAPE
    pub fn quality(&self) -> ForecastQuality {
        match self.mape {
            m if m < 5.0 => ForecastQuality::Excellent,
            m if m < 10.0 => ForecastQuality::Good,
            m if m < 20.0 => ForecastQuality::Fair,
            m if m < 50.0 => ForecastQuality::Poor,
            _ => ForecastQuality::VeryPoor,
        }
    }
}

impl fmt::Display for ForecastMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MAE={:.3}, RMSE={:.3}, MAPE={:.2}%, R²={:.3}, n={}, quality={:?}",
            self.mae,
            self.rmse,
            self.mape,
            self.r2,
            self.sample_count,
            self.quality()
        )
    }
}

/// Forecast quality classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForecastQuality {
    Excellent, // MAPE < 5%
    Good,      // MAPE 5-10%
    Fair,      // MAPE 10-20%
    Poor,      // MAPE 20-50%
    VeryPoor,  // MAPE > 50%
}

/// Forecast metrics calculation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ForecastMetricsError {
    #[error("Dimension mismatch: actual={actual}, predicted={predicted}")]
    DimensionMismatch { actual: usize, predicted: usize },

    #[error("Empty data provided")]
    EmptyData,

    #[error("Forecast and actual series share no observed timestamps")]
    NoOverlap,
}
