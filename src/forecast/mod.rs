//! Demand forecasting pipeline
//!
//! raw observations → [`normalize`] → [`split`] → [`features`] →
//! [`autoregressive`] → [`query`], with [`metrics`] and [`distribution`]
//! as read-only views over the results.

pub mod autoregressive;
pub mod distribution;
pub mod engine;
pub mod features;
pub mod metrics;
pub mod normalize;
pub mod query;
pub mod split;

pub use autoregressive::{AutoregressiveForecaster, ForecasterConfig, LagModel, TrainedForecaster};
pub use distribution::{summarize, BoxSummary, DistributionGrouping};
pub use engine::{EngineConfig, ForecastEngine, ForecastRun};
pub use features::{featurize, featurize_values, CalendarFeatures, LagRow};
pub use metrics::{ForecastMetrics, ForecastMetricsError, ForecastQuality};
pub use normalize::{backward_fill, normalize, SeriesNormalizer};
pub use query::{covered_dates, slice_by_date};
pub use split::{split, TrainTestSplit};
