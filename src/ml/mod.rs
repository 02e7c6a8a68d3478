//! Machine Learning Module
//!
//! Regression models behind the autoregressive demand forecaster:
//! - Ridge (L2-regularized) linear regression, solved in closed form
//! - Model metadata for trained instances
//!
//! # Architecture
//! - [`training`] builds datasets and fits models
//! - [`models`] holds trained, immutable models used for inference

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::forecast::metrics::ForecastMetrics;

pub mod models;
pub mod training;

pub use models::LinearRegressionModel;
pub use training::{ModelTrainer, TrainingConfig, TrainingDataset};

/// ML Model Metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_id: String,
    pub version: String,
    pub trained_at: DateTime<Utc>,
    pub training_samples: usize,
    /// In-sample fit quality
    pub training_metrics: ForecastMetrics,
    pub feature_names: Vec<String>,
}
