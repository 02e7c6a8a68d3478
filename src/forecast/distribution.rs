//! Demand distribution by calendar position
//!
//! Box-plot statistics of the canonical series grouped by month, weekday or
//! hour of day.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use super::features::CalendarFeatures;
use crate::domain::TimeSeries;

/// Calendar grouping of a series
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DistributionGrouping {
    /// Key 1-12
    Monthly,
    /// Key 1-7, Monday = 1
    Weekly,
    /// Key 1-24, hour of day + 1
    Hourly,
}

impl DistributionGrouping {
    pub fn key(&self, calendar: &CalendarFeatures) -> u32 {
        match self {
            Self::Monthly => calendar.month,
            Self::Weekly => calendar.day_of_week + 1,
            Self::Hourly => calendar.hour_of_day + 1,
        }
    }
}

/// Five-number summary of one group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxSummary {
    pub key: u32,
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl BoxSummary {
    fn from_values(key: u32, mut values: Vec<f64>) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        values.sort_by(f64::total_cmp);
        Some(Self {
            key,
            count: values.len(),
            min: values[0],
            q1: quantile(&values, 0.25),
            median: quantile(&values, 0.5),
            q3: quantile(&values, 0.75),
            max: values[values.len() - 1],
        })
    }
}

/// Linear interpolation between order statistics of a sorted, non-empty slice
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (pos - lower as f64)
}

/// One summary per key that has data, keys ascending
pub fn summarize(series: &TimeSeries, grouping: DistributionGrouping) -> Vec<BoxSummary> {
    let mut groups: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    for (timestamp, value) in series.iter() {
        if let Some(value) = value {
            let key = grouping.key(&CalendarFeatures::extract(timestamp));
            groups.entry(key).or_default().push(value);
        }
    }
    groups
        .into_iter()
        .filter_map(|(key, values)| BoxSummary::from_values(key, values))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Frequency;
    use chrono::{NaiveDate, NaiveDateTime};
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    fn monday() -> NaiveDateTime {
        // 2017-12-04 was a Monday
        NaiveDate::from_ymd_opt(2017, 12, 4)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_quantiles_interpolate() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&sorted, 0.0), 1.0);
        assert_eq!(quantile(&sorted, 0.25), 1.75);
        assert_eq!(quantile(&sorted, 0.5), 2.5);
        assert_eq!(quantile(&sorted, 0.75), 3.25);
        assert_eq!(quantile(&sorted, 1.0), 4.0);
        assert_eq!(quantile(&[7.0], 0.25), 7.0);
    }

    #[test]
    fn test_hourly_keys() {
        // Two days; hour h has values h and 100 + h
        let values: Vec<f64> = (0..48)
            .map(|i| if i < 24 { i as f64 } else { 100.0 + (i - 24) as f64 })
            .collect();
        let series = TimeSeries::from_values(monday(), Frequency::hourly(), values);
        let summary = summarize(&series, DistributionGrouping::Hourly);

        assert_eq!(summary.len(), 24);
        assert_eq!(summary[0].key, 1);
        assert_eq!(summary[23].key, 24);
        let first = &summary[0];
        assert_eq!(first.count, 2);
        assert_eq!(first.min, 0.0);
        assert_eq!(first.max, 100.0);
        assert_eq!(first.median, 50.0);
        assert_eq!(first.q1, 25.0);
        assert_eq!(first.q3, 75.0);
    }

    #[test]
    fn test_weekly_keys_start_monday() {
        let series = TimeSeries::from_values(monday(), Frequency::hourly(), vec![1.0; 24 * 7]);
        let summary = summarize(&series, DistributionGrouping::Weekly);
        let keys: Vec<u32> = summary.iter().map(|s| s.key).collect();
        assert_eq!(keys, vec![1, 2, 3, 4, 5, 6, 7]);
        assert!(summary.iter().all(|s| s.count == 24));
    }

    #[test]
    fn test_monthly_skips_unfilled_and_empty_groups() {
        // Spans Dec 31 22:00 through Jan 1 01:00 with one gap
        let start = NaiveDate::from_ymd_opt(2016, 12, 31)
            .unwrap()
            .and_hms_opt(22, 0, 0)
            .unwrap();
        let series = TimeSeries::from_slots(
            start,
            Frequency::hourly(),
            vec![Some(5.0), None, Some(1.0), Some(3.0)],
        );
        let summary = summarize(&series, DistributionGrouping::Monthly);

        assert_eq!(summary.iter().map(|s| s.key).collect::<Vec<_>>(), vec![1, 12]);
        assert_eq!(summary[0].count, 2);
        assert_eq!(summary[0].median, 2.0);
        assert_eq!(summary[1].count, 1);
        assert_eq!(summary[1].q3, 5.0);
    }

    #[test]
    fn test_grouping_names() {
        assert_eq!(
            DistributionGrouping::from_str("Weekly").unwrap(),
            DistributionGrouping::Weekly
        );
        assert_eq!(DistributionGrouping::Hourly.to_string(), "hourly");
        assert_eq!(DistributionGrouping::iter().count(), 3);
        assert!(DistributionGrouping::from_str("daily").is_err());
    }
}
