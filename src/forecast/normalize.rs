//! Series normalization
//!
//! Turns raw, possibly irregular demand readings into a canonical series:
//! duplicates resolved (first occurrence wins), re-indexed onto a fixed
//! frequency grid, gaps backward-filled over the full loaded range and only
//! then narrowed to the requested date range.

use chrono::{Duration, NaiveDateTime};
use std::collections::btree_map::{BTreeMap, Entry};
use tracing::{debug, warn};

use crate::domain::{DateRange, Frequency, RawObservation, TimeSeries};
use crate::error::{ForecastError, Result};

/// Builds canonical series at a fixed frequency
#[derive(Debug, Clone)]
pub struct SeriesNormalizer {
    frequency: Frequency,
    range: Option<DateRange>,
}

impl SeriesNormalizer {
    pub fn new(frequency: Frequency) -> Self {
        Self {
            frequency,
            range: None,
        }
    }

    /// Narrow the output to an inclusive range once gaps are filled
    pub fn with_range(mut self, range: DateRange) -> Self {
        self.range = Some(range);
        self
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn normalize(&self, raw: &[RawObservation]) -> Result<TimeSeries> {
        if raw.is_empty() {
            return Err(ForecastError::EmptyInput);
        }

        let mut observations: BTreeMap<NaiveDateTime, f64> = BTreeMap::new();
        let mut duplicates = 0usize;
        for obs in raw {
            let ts = obs.timestamp.resolve()?;
            match observations.entry(ts) {
                Entry::Vacant(slot) => {
                    slot.insert(obs.value);
                }
                Entry::Occupied(_) => duplicates += 1,
            }
        }

        let (first, last) = match (observations.keys().next(), observations.keys().next_back()) {
            (Some(&first), Some(&last)) => (first, last),
            _ => return Err(ForecastError::EmptyInput),
        };

        let step = self.frequency.as_seconds();
        let len = ((last - first).num_seconds() / step) as usize + 1;
        let mut slots: Vec<Option<f64>> = vec![None; len];
        let mut off_grid = 0usize;
        for (ts, value) in observations {
            let index = ((ts - first).num_seconds() / step) as usize;
            if index >= len || self.frequency.advance(first, index) != ts {
                off_grid += 1;
                continue;
            }
            slots[index] = (!value.is_nan()).then_some(value);
        }

        let missing = slots.iter().filter(|v| v.is_none()).count();
        let filled = backward_fill(&mut slots);
        debug!(
            observations = raw.len(),
            duplicates,
            off_grid,
            missing,
            filled,
            frequency = %self.frequency,
            "re-indexed raw series"
        );

        let series = TimeSeries::from_slots(first, self.frequency, slots);
        let series = match &self.range {
            Some(range) => {
                if range.start < first || range.end > last {
                    warn!(
                        requested = %range,
                        observed_start = %first,
                        observed_end = %last,
                        "requested range exceeds observed data; clipping"
                    );
                }
                series.restrict(range)
            }
            None => series,
        };

        let unfilled = series.unfilled();
        if let (Some(first_gap), Some(last_gap)) = (unfilled.first(), unfilled.last()) {
            warn!(
                count = unfilled.len(),
                first = %first_gap,
                last = %last_gap,
                "trailing slots have no later observation to fill from"
            );
        }
        Ok(series)
    }
}

/// Normalize `raw` at `frequency` without range narrowing
pub fn normalize(raw: &[RawObservation], frequency: Duration) -> Result<TimeSeries> {
    SeriesNormalizer::new(Frequency::from_duration(frequency)?).normalize(raw)
}

/// Fill each missing slot with the next later present value.
///
/// Returns the number of slots filled; trailing gaps stay `None`.
pub fn backward_fill(slots: &mut [Option<f64>]) -> usize {
    let mut next: Option<f64> = None;
    let mut filled = 0;
    for slot in slots.iter_mut().rev() {
        match slot {
            Some(value) => next = Some(*value),
            None => {
                if let Some(value) = next {
                    *slot = Some(value);
                    filled += 1;
                }
            }
        }
    }
    filled
}
