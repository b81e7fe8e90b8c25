//! Data types produced by the bucketing pipeline.

use chrono::{NaiveDate, TimeDelta};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;

/// Column sums for every row sharing a truncated timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    pub(crate) rows: usize,
    pub(crate) sums: Vec<(String, f64)>,
    /// Parallel to `sums`: the source column held only whole numbers.
    pub(crate) integer: Vec<bool>,
    pub(crate) interval: Option<f64>,
}

impl Bucket {
    pub(crate) fn new<'a>(columns: impl Iterator<Item = (&'a str, bool)>) -> Self {
        let (sums, integer) = columns
            .map(|(name, integer)| ((name.to_string(), 0.0), integer))
            .unzip();
        Self {
            rows: 0,
            sums,
            integer,
            interval: None,
        }
    }

    /// Number of table rows that fell into this bucket.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Summed value of a numeric column.
    pub fn get(&self, column: &str) -> Option<f64> {
        self.sums
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, sum)| *sum)
    }

    pub fn sums(&self) -> &[(String, f64)] {
        &self.sums
    }

    /// Rate-normalised energy; set on hourly buckets only.
    pub fn interval(&self) -> Option<f64> {
        self.interval
    }
}

/// Serialized as `{"<column>": sum, ..., "interval": x}` with columns in file order.
/// Sums of integer columns are written as JSON integers.
impl Serialize for Bucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = self.sums.len() + usize::from(self.interval.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        for ((name, sum), integer) in self.sums.iter().zip(&self.integer) {
            match as_whole(*sum) {
                Some(whole) if *integer => map.serialize_entry(name, &whole)?,
                _ => map.serialize_entry(name, sum)?,
            }
        }
        if let Some(interval) = &self.interval {
            map.serialize_entry("interval", interval)?;
        }
        map.end()
    }
}

fn as_whole(v: f64) -> Option<i64> {
    (v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64).then_some(v as i64)
}

/// Buckets keyed by hour of day (0-23).
pub type HourlyBuckets = BTreeMap<u32, Bucket>;

/// Buckets keyed by calendar date.
pub type DailyBuckets = BTreeMap<NaiveDate, Bucket>;

/// Sampling period inferred from the first two readings.
///
/// Only 30-minute data is recognised; any other step is treated as hourly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingInterval {
    HalfHourly,
    Hourly,
}

impl SamplingInterval {
    pub const HALF_HOUR_SECS: i64 = 1800;
    const SECS_PER_DAY: i64 = 86_400;

    /// Classifies the step between two readings by its seconds-within-day
    /// component, so whole days are ignored and negative steps wrap.
    pub fn from_step(step: TimeDelta) -> Self {
        let whole_secs = if step.subsec_nanos() < 0 {
            step.num_seconds() - 1
        } else {
            step.num_seconds()
        };
        if whole_secs.rem_euclid(Self::SECS_PER_DAY) == Self::HALF_HOUR_SECS {
            SamplingInterval::HalfHourly
        } else {
            SamplingInterval::Hourly
        }
    }

    /// Divisor applied to an hourly bucket's summed `E`: about 30 days of
    /// 24.33 hours, doubled for hourly data.
    pub fn divisor(self) -> f64 {
        match self {
            SamplingInterval::HalfHourly => 730.0,
            SamplingInterval::Hourly => 1460.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_hour_step() {
        assert_eq!(
            SamplingInterval::from_step(TimeDelta::minutes(30)),
            SamplingInterval::HalfHourly
        );
    }

    #[test]
    fn test_other_steps_default_to_hourly() {
        for step in [
            TimeDelta::minutes(60),
            TimeDelta::minutes(15),
            TimeDelta::minutes(5),
            TimeDelta::zero(),
            TimeDelta::minutes(-30),
        ] {
            assert_eq!(SamplingInterval::from_step(step), SamplingInterval::Hourly);
        }
    }

    #[test]
    fn test_sub_second_steps_are_truncated() {
        let step = TimeDelta::seconds(1800) + TimeDelta::milliseconds(250);
        assert_eq!(SamplingInterval::from_step(step), SamplingInterval::HalfHourly);
        let step = TimeDelta::seconds(1800) - TimeDelta::milliseconds(250);
        assert_eq!(SamplingInterval::from_step(step), SamplingInterval::Hourly);
    }

    #[test]
    fn test_whole_days_are_ignored() {
        let step = TimeDelta::days(1) + TimeDelta::minutes(30);
        assert_eq!(SamplingInterval::from_step(step), SamplingInterval::HalfHourly);
        // -23h30m wraps to +30m within the day
        let step = TimeDelta::minutes(30) - TimeDelta::days(1);
        assert_eq!(SamplingInterval::from_step(step), SamplingInterval::HalfHourly);
    }

    #[test]
    fn test_bucket_serializes_in_column_order() {
        let mut bucket = Bucket::new([("E", false), ("Q", false)].into_iter());
        bucket.sums[0].1 = 30.0;
        bucket.sums[1].1 = 1.5;
        bucket.interval = Some(0.5);

        let json = serde_json::to_string(&bucket).unwrap();
        assert_eq!(json, r#"{"E":30.0,"Q":1.5,"interval":0.5}"#);
    }

    #[test]
    fn test_integer_column_sums_serialize_as_integers() {
        let mut bucket = Bucket::new([("E", true), ("Q", false)].into_iter());
        bucket.sums[0].1 = 30.0;
        bucket.sums[1].1 = 2.0;
        bucket.interval = Some(30.0 / 730.0);

        let json = serde_json::to_value(&bucket).unwrap();
        assert!(json["E"].is_i64());
        assert_eq!(json["E"], 30);
        assert!(json["Q"].is_f64());
        assert!(json["interval"].is_f64());
    }

    #[test]
    fn test_bucket_without_interval() {
        let bucket = Bucket::new([("E", false)].into_iter());
        assert_eq!(serde_json::to_string(&bucket).unwrap(), r#"{"E":0.0}"#);
        assert_eq!(bucket.get("E"), Some(0.0));
        assert_eq!(bucket.get("Q"), None);
    }
}
