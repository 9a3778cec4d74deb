//! Regular-cadence resampling of pooled rows.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::analysis::utility::{mean, round2};
use crate::model::SeriesPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cadence {
    Daily,
    Weekly,
}

impl Cadence {
    fn days(&self) -> i64 {
        match self {
            Cadence::Daily => 1,
            Cadence::Weekly => 7,
        }
    }
}

/// Averages `(date, value)` samples into buckets of `cadence`.
///
/// Buckets are anchored at the earliest date and labelled with their start
/// date. Every bucket up to the last sample gets a point; a bucket with no
/// samples carries no value instead of the previous one.
pub fn resample(
    label: &str,
    samples: impl IntoIterator<Item = (NaiveDate, f64)>,
    cadence: Cadence,
) -> Vec<SeriesPoint> {
    let mut samples: Vec<(NaiveDate, f64)> = samples.into_iter().collect();
    samples.sort_by_key(|(date, _)| *date);

    let (Some(&(origin, _)), Some(&(last, _))) = (samples.first(), samples.last()) else {
        return Vec::new();
    };
    let step = cadence.days();

    let mut buckets: BTreeMap<i64, Vec<f64>> = BTreeMap::new();
    for (date, value) in samples {
        buckets
            .entry((date - origin).num_days() / step)
            .or_default()
            .push(value);
    }

    let count = (last - origin).num_days() / step + 1;
    (0..count)
        .map(|index| {
            let start = origin + Duration::days(index * step);
            match buckets.get(&index) {
                Some(values) => SeriesPoint::new(label, start, round2(mean(values))),
                None => SeriesPoint::gap(label, start),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 10, d).unwrap()
    }

    #[test]
    fn test_daily_pools_same_day() {
        let points = resample(
            "Group 1",
            vec![(day(1), 10.0), (day(1), 20.0), (day(2), 5.0)],
            Cadence::Daily,
        );

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].date, day(1));
        assert_eq!(points[0].metric_value, Some(15.0));
        assert_eq!(points[1].metric_value, Some(5.0));
        assert!(points.iter().all(|p| p.unit_label == "Group 1"));
    }

    #[test]
    fn test_daily_gap_keeps_dates_without_value() {
        let points = resample("g", vec![(day(1), 1.0), (day(4), 4.0)], Cadence::Daily);
        let dates: Vec<_> = points.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![day(1), day(2), day(3), day(4)]);

        let values: Vec<_> = points.iter().map(|p| p.metric_value).collect();
        assert_eq!(values, vec![Some(1.0), None, None, Some(4.0)]);
    }

    #[test]
    fn test_weekly_gap_is_empty_bucket() {
        let points = resample("g", vec![(day(1), 2.0), (day(16), 6.0)], Cadence::Weekly);
        let dates: Vec<_> = points.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![day(1), day(8), day(15)]);
        assert_eq!(points[1].metric_value, None);
        assert_eq!(points[2].metric_value, Some(6.0));
    }

    #[test]
    fn test_weekly_bins_anchor_on_first_date() {
        let samples = (3..=12).map(|d| (day(d), d as f64));
        let points = resample("g", samples, Cadence::Weekly);

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].date, day(3));
        // 3..=9
        assert_eq!(points[0].metric_value, Some(6.0));
        assert_eq!(points[1].date, day(10));
        // 10..=12
        assert_eq!(points[1].metric_value, Some(11.0));
    }

    #[test]
    fn test_empty_input() {
        assert!(resample("g", Vec::new(), Cadence::Weekly).is_empty());
    }
}
