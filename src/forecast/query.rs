//! Day-level lookups over a forecast

use chrono::NaiveDate;

use crate::domain::{ForecastPoint, ForecastResult};

/// Points whose calendar date is `date`, in chronological order
///
/// A date outside the forecast yields an empty vector.
pub fn slice_by_date(result: &ForecastResult, date: NaiveDate) -> Vec<ForecastPoint> {
    let points = result.points();
    let start = points.partition_point(|p| p.date() < date);
    let end = start + points[start..].partition_point(|p| p.date() == date);
    points[start..end].to_vec()
}

/// Distinct dates the forecast covers, ascending
pub fn covered_dates(result: &ForecastResult) -> Vec<NaiveDate> {
    let mut dates: Vec<NaiveDate> = result.points().iter().map(ForecastPoint::date).collect();
    dates.dedup();
    dates
}
