//! Hourly electricity demand forecasting
//!
//! Raw readings are normalized onto a fixed-frequency grid, split into
//! train/test ranges at a boundary, and forecast recursively by a ridge
//! regression over the last `W` values.

pub mod config;
pub mod domain;
pub mod error;
pub mod forecast;
pub mod loader;
pub mod ml;
pub mod telemetry;

pub use error::{ForecastError, Result};
