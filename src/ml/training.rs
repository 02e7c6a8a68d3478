//! ML Model Training Pipeline
//!
//! Ridge regression fitted in closed form. Columns and target are centred so
//! the intercept is not penalized, then `(XᵀX + αI) w = Xᵀy` is solved by
//! Cholesky decomposition.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{LinearRegressionModel, ModelMetadata};
use crate::error::{ForecastError, Result};
use crate::forecast::features::LagRow;
use crate::forecast::metrics::ForecastMetrics;

/// Relative floor for the squared Cholesky pivots
const PIVOT_TOLERANCE: f64 = 16.0 * f64::EPSILON;

/// Training Dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingDataset {
    pub features: Vec<Vec<f64>>,
    pub targets: Vec<f64>,
}

impl TrainingDataset {
    pub fn new(features: Vec<Vec<f64>>, targets: Vec<f64>) -> Result<Self> {
        if features.len() != targets.len() {
            return Err(ForecastError::InvalidParameter(format!(
                "feature and target count mismatch: {} features, {} targets",
                features.len(),
                targets.len()
            )));
        }
        if let Some(width) = features.first().map(Vec::len) {
            if features.iter().any(|row| row.len() != width) {
                return Err(ForecastError::InvalidParameter(
                    "all feature rows must have the same length".to_string(),
                ));
            }
        }
        Ok(Self { features, targets })
    }

    pub fn from_lag_rows(rows: Vec<LagRow>) -> Result<Self> {
        let (features, targets) = rows.into_iter().map(|r| (r.predictors, r.target)).unzip();
        Self::new(features, targets)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.features.first().map_or(0, Vec::len)
    }
}

/// Training Configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// L2 penalty strength
    pub alpha: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self { alpha: 1.0 }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.alpha.is_finite() || self.alpha < 0.0 {
            return Err(ForecastError::InvalidParameter(format!(
                "ridge alpha must be finite and non-negative, got {}",
                self.alpha
            )));
        }
        Ok(())
    }
}

/// Model Trainer
#[derive(Debug, Clone)]
pub struct ModelTrainer {
    config: TrainingConfig,
}

impl ModelTrainer {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    /// Fit ridge regression on `dataset`
    pub fn train_ridge(
        &self,
        dataset: &TrainingDataset,
        feature_names: Vec<String>,
    ) -> Result<LinearRegressionModel> {
        self.config.validate()?;
        if dataset.is_empty() {
            return Err(ForecastError::InsufficientHistory {
                required: 1,
                available: 0,
            });
        }
        let mut values = dataset.features.iter().flatten().chain(&dataset.targets);
        if values.any(|v| !v.is_finite()) {
            return Err(ForecastError::DegenerateFit(
                "training data contains non-finite values".to_string(),
            ));
        }

        let n = dataset.len();
        let p = dataset.n_features();
        let x_mean: Vec<f64> = (0..p)
            .map(|j| dataset.features.iter().map(|row| row[j]).sum::<f64>() / n as f64)
            .collect();
        let y_mean = dataset.targets.iter().sum::<f64>() / n as f64;

        let xc = DMatrix::from_fn(n, p, |i, j| dataset.features[i][j] - x_mean[j]);
        let yc = DVector::from_iterator(n, dataset.targets.iter().map(|y| y - y_mean));

        let mut gram = xc.tr_mul(&xc);
        for j in 0..p {
            gram[(j, j)] += self.config.alpha;
        }
        let rhs = xc.tr_mul(&yc);
        let max_diag = gram.diagonal().iter().copied().fold(0.0f64, f64::max);

        let degenerate = || {
            ForecastError::DegenerateFit(format!(
                "normal equations not positive definite (alpha={})",
                self.config.alpha
            ))
        };
        let cholesky = gram.cholesky().ok_or_else(degenerate)?;
        // A singular system can still factorize on rounding noise
        let l = cholesky.l_dirty();
        let min_pivot = (0..p).map(|j| l[(j, j)].powi(2)).fold(f64::INFINITY, f64::min);
        if min_pivot <= PIVOT_TOLERANCE * p as f64 * max_diag {
            return Err(degenerate());
        }
        let weights = cholesky.solve(&rhs);
        let coefficients: Vec<f64> = weights.iter().copied().collect();
        let intercept = y_mean
            - x_mean
                .iter()
                .zip(&coefficients)
                .map(|(m, w)| m * w)
                .sum::<f64>();

        if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ForecastError::DegenerateFit(
                "solution contains non-finite coefficients".to_string(),
            ));
        }

        let fitted: Vec<f64> = dataset
            .features
            .iter()
            .map(|row| intercept + row.iter().zip(&coefficients).map(|(x, w)| x * w).sum::<f64>())
            .collect();
        let training_metrics = ForecastMetrics::calculate(&dataset.targets, &fitted)
            .map_err(|e| ForecastError::DegenerateFit(e.to_string()))?;

        debug!(
            samples = n,
            features = p,
            alpha = self.config.alpha,
            intercept,
            training_rmse = training_metrics.rmse,
            "fitted ridge regression"
        );

        Ok(LinearRegressionModel::new(
            coefficients,
            intercept,
            self.config.alpha,
            ModelMetadata {
                model_id: format!("ridge_{}", uuid::Uuid::new_v4()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                trained_at: chrono::Utc::now(),
                training_samples: n,
                training_metrics,
                feature_names,
            },
        ))
    }
}
