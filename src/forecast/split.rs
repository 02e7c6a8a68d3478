use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::TimeSeries;
use crate::error::{ForecastError, Result};

/// Train/test partition of one canonical series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainTestSplit {
    /// Entries with timestamp <= boundary
    pub train: TimeSeries,
    /// Entries with timestamp > boundary
    pub test: TimeSeries,
    pub boundary: NaiveDateTime,
}

/// Partition `series` at `boundary` (inclusive on the train side)
pub fn split(series: &TimeSeries, boundary: NaiveDateTime) -> Result<TrainTestSplit> {
    let (first, last) = match (series.first_timestamp(), series.last_timestamp()) {
        (Some(first), Some(last)) if boundary >= first && boundary <= last => (first, last),
        (first, last) => {
            return Err(ForecastError::BoundaryOutOfRange {
                boundary,
                first,
                last,
            })
        }
    };

    let cut = series.count_at_or_before(boundary);
    let train = series.slice(0, cut);
    let test = series.slice(cut, series.len());
    debug!(
        %boundary,
        %first,
        %last,
        train = train.len(),
        test = test.len(),
        "split series"
    );
    Ok(TrainTestSplit {
        train,
        test,
        boundary,
    })
}
