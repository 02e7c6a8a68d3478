//! ML Model Definitions

use serde::{Deserialize, Serialize};

use super::ModelMetadata;
use crate::error::{ForecastError, Result};

/// Linear model `intercept + Σ coefficients[j]·x[j]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegressionModel {
    pub metadata: ModelMetadata,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    /// L2 penalty the coefficients were fitted with
    pub alpha: f64,
}

impl LinearRegressionModel {
    pub fn new(coefficients: Vec<f64>, intercept: f64, alpha: f64, metadata: ModelMetadata) -> Self {
        Self {
            metadata,
            coefficients,
            intercept,
            alpha,
        }
    }

    pub fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    /// Predict a value from features
    pub fn predict(&self, features: &[f64]) -> Result<f64> {
        if features.len() < self.coefficients.len() {
            return Err(ForecastError::InsufficientHistory {
                required: self.coefficients.len(),
                available: features.len(),
            });
        }
        if features.len() > self.coefficients.len() {
            return Err(ForecastError::InvalidParameter(format!(
                "expected {} features, got {}",
                self.coefficients.len(),
                features.len()
            )));
        }
        Ok(self.predict_unchecked(features))
    }

    /// Dot product without the length check; callers guarantee `features.len() == n_features()`
    fn predict_unchecked(&self, features: &[f64]) -> f64 {
        features
            .iter()
            .zip(&self.coefficients)
            .map(|(f, c)| f * c)
            .sum::<f64>()
            + self.intercept
    }
}
