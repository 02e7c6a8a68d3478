//! Regular time series and raw observations
//!
//! A [`TimeSeries`] stores an anchor timestamp, a [`Frequency`] and one slot
//! per grid position, so timestamps are unique, strictly increasing and evenly
//! spaced by construction. A `None` slot is a value no observation could fill.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::types::{parse_timestamp, DateRange, Frequency};
use crate::error::{ForecastError, Result};

/// Timestamp of a raw observation, either already parsed or still text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawTimestamp {
    Parsed(NaiveDateTime),
    Text(String),
}

impl RawTimestamp {
    pub fn resolve(&self) -> Result<NaiveDateTime> {
        match self {
            Self::Parsed(ts) => Ok(*ts),
            Self::Text(raw) => parse_timestamp(raw),
        }
    }
}

impl From<NaiveDateTime> for RawTimestamp {
    fn from(ts: NaiveDateTime) -> Self {
        Self::Parsed(ts)
    }
}

impl From<&str> for RawTimestamp {
    fn from(raw: &str) -> Self {
        Self::Text(raw.to_string())
    }
}

impl From<String> for RawTimestamp {
    fn from(raw: String) -> Self {
        Self::Text(raw)
    }
}

/// One unvalidated `(timestamp, value)` pair; a NaN value marks a missing reading
#[derive(Debug, Clone, PartialEq)]
pub struct RawObservation {
    pub timestamp: RawTimestamp,
    pub value: f64,
}

impl RawObservation {
    pub fn new(timestamp: impl Into<RawTimestamp>, value: f64) -> Self {
        Self {
            timestamp: timestamp.into(),
            value,
        }
    }
}

/// Canonical fixed-frequency series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    start: NaiveDateTime,
    frequency: Frequency,
    slots: Vec<Option<f64>>,
}

impl TimeSeries {
    /// Build a series from grid slots anchored at `start`
    pub fn from_slots(start: NaiveDateTime, frequency: Frequency, slots: Vec<Option<f64>>) -> Self {
        Self {
            start,
            frequency,
            slots,
        }
    }

    /// Build a fully populated series
    pub fn from_values(start: NaiveDateTime, frequency: Frequency, values: Vec<f64>) -> Self {
        Self::from_slots(start, frequency, values.into_iter().map(Some).collect())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    /// Grid anchor; equals the first timestamp when the series is non-empty
    pub fn anchor(&self) -> NaiveDateTime {
        self.start
    }

    pub fn slots(&self) -> &[Option<f64>] {
        &self.slots
    }

    pub fn timestamp_at(&self, index: usize) -> NaiveDateTime {
        self.frequency.advance(self.start, index)
    }

    pub fn value_at(&self, index: usize) -> Option<f64> {
        self.slots.get(index).copied().flatten()
    }

    pub fn first_timestamp(&self) -> Option<NaiveDateTime> {
        (!self.is_empty()).then(|| self.start)
    }

    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.slots.len().checked_sub(1).map(|i| self.timestamp_at(i))
    }

    /// Iterate `(timestamp, value)` pairs in chronological order
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDateTime, Option<f64>)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .map(move |(i, v)| (self.timestamp_at(i), *v))
    }

    /// Grid index of `timestamp`, if it lies on this series' grid and range
    pub fn index_of(&self, timestamp: NaiveDateTime) -> Option<usize> {
        let step = self.frequency.as_seconds();
        let offset = (timestamp - self.start).num_seconds();
        if offset < 0 || offset % step != 0 {
            return None;
        }
        let index = (offset / step) as usize;
        (index < self.slots.len() && self.timestamp_at(index) == timestamp).then_some(index)
    }

    /// Timestamps whose slot is still unresolved
    pub fn unfilled(&self) -> Vec<NaiveDateTime> {
        self.iter()
            .filter(|(_, v)| v.is_none())
            .map(|(ts, _)| ts)
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// All values, failing with `UnfilledValues` if any slot is unresolved
    pub fn values(&self) -> Result<Vec<f64>> {
        let unfilled = self.unfilled();
        if let Some(&first) = unfilled.first() {
            return Err(ForecastError::UnfilledValues {
                count: unfilled.len(),
                first,
            });
        }
        Ok(self.slots.iter().flatten().copied().collect())
    }

    /// Sub-series over slot indices `[from, to)`
    pub fn slice(&self, from: usize, to: usize) -> TimeSeries {
        let to = to.min(self.slots.len());
        let from = from.min(to);
        TimeSeries {
            start: self.timestamp_at(from),
            frequency: self.frequency,
            slots: self.slots[from..to].to_vec(),
        }
    }

    /// Sub-series of the slots whose timestamp falls inside `range`
    pub fn restrict(&self, range: &DateRange) -> TimeSeries {
        let from = self.count_before(range.start);
        let to = self.count_at_or_before(range.end);
        self.slice(from, to)
    }

    /// Number of slots with a timestamp `<= timestamp`
    pub(crate) fn count_at_or_before(&self, timestamp: NaiveDateTime) -> usize {
        if timestamp < self.start {
            return 0;
        }
        let offset = (timestamp - self.start).num_seconds();
        let count = offset / self.frequency.as_seconds() + 1;
        (count as usize).min(self.slots.len())
    }

    /// Number of slots with a timestamp `< timestamp`
    pub(crate) fn count_before(&self, timestamp: NaiveDateTime) -> usize {
        let at_or_before = self.count_at_or_before(timestamp);
        match at_or_before.checked_sub(1) {
            Some(last) if self.timestamp_at(last) == timestamp => last,
            _ => at_or_before,
        }
    }
}
