use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ForecastError, Result};

// ============================================================================
// Time Helper Types
// ============================================================================

/// Largest step `chrono::Duration::seconds` can represent
const MAX_SECONDS: i64 = i64::MAX / 1000;

/// Fixed sampling interval of a regular series, in whole seconds
///
/// Serialized as the bare number of seconds and validated on the way in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Frequency {
    seconds: i64,
}

impl Frequency {
    /// Create a frequency from seconds
    pub fn seconds(secs: i64) -> Result<Self> {
        if secs <= 0 || secs > MAX_SECONDS {
            return Err(ForecastError::InvalidFrequency(secs));
        }
        Ok(Self { seconds: secs })
    }

    /// Create a frequency from minutes
    pub fn minutes(mins: i64) -> Result<Self> {
        let secs = mins
            .checked_mul(60)
            .unwrap_or(if mins < 0 { i64::MIN } else { i64::MAX });
        Self::seconds(secs)
    }

    /// Create a frequency from a chrono duration (sub-second parts are dropped)
    pub fn from_duration(duration: Duration) -> Result<Self> {
        Self::seconds(duration.num_seconds())
    }

    /// The hourly frequency of the reference demand data
    pub fn hourly() -> Self {
        Self { seconds: 3600 }
    }

    pub fn as_seconds(&self) -> i64 {
        self.seconds
    }

    /// Offset of the `steps`-th slot from an anchor; `None` past what chrono can represent
    pub fn offset(&self, steps: usize) -> Option<Duration> {
        let secs = i64::try_from(steps).ok()?.checked_mul(self.seconds)?;
        (secs <= MAX_SECONDS).then(|| Duration::seconds(secs))
    }

    /// Timestamp of the `steps`-th slot after `anchor`, saturating at the latest instant
    pub fn advance(&self, anchor: NaiveDateTime, steps: usize) -> NaiveDateTime {
        self.offset(steps)
            .and_then(|offset| anchor.checked_add_signed(offset))
            .unwrap_or(NaiveDateTime::MAX)
    }
}

impl TryFrom<i64> for Frequency {
    type Error = ForecastError;

    fn try_from(seconds: i64) -> Result<Self> {
        Self::seconds(seconds)
    }
}

impl From<Frequency> for i64 {
    fn from(frequency: Frequency) -> Self {
        frequency.seconds
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.seconds % 3600 == 0 {
            write!(f, "{}h", self.seconds / 3600)
        } else if self.seconds % 60 == 0 {
            write!(f, "{}min", self.seconds / 60)
        } else {
            write!(f, "{}s", self.seconds)
        }
    }
}

/// Inclusive range of timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self> {
        if start > end {
            return Err(ForecastError::InvalidParameter(format!(
                "range start {start} is after end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse both bounds with [`parse_timestamp`]
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Self::new(parse_timestamp(start)?, parse_timestamp(end)?)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ..= {}", self.start, self.end)
    }
}

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse a wall-clock timestamp as found in demand exports
///
/// A bare date is read as midnight.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime> {
    let trimmed = raw.trim();
    for format in DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(ts);
        }
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| ForecastError::UnparsableTimestamp(raw.to_string()))
}
