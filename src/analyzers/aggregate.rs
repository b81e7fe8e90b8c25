use chrono::{NaiveDateTime, Timelike};
use std::collections::BTreeMap;

use crate::analyzers::types::{Bucket, DailyBuckets, HourlyBuckets, SamplingInterval};
use crate::error::TableError;
use crate::table::{ColumnValues, ENERGY_COLUMN, TimeSeriesTable, missing_timestamp};

/// Groups rows by a key derived from `AESTTime`, summing every numeric column.
///
/// Every row lands in exactly one bucket. Missing numeric cells count as zero.
pub fn bucket_by<K, F>(table: &TimeSeriesTable, key: F) -> BTreeMap<K, Bucket>
where
    K: Ord,
    F: Fn(&NaiveDateTime) -> K,
{
    let numeric: Vec<(&str, bool, &[Option<f64>])> = table
        .columns()
        .iter()
        .filter_map(|c| match &c.values {
            ColumnValues::Numeric(values) => Some((c.name.as_str(), c.integer, values.as_slice())),
            _ => None,
        })
        .collect();

    let mut buckets: BTreeMap<K, Bucket> = BTreeMap::new();

    for (row, ts) in table.timestamps().iter().enumerate() {
        let ts = ts.unwrap_or_else(missing_timestamp);
        let bucket = buckets.entry(key(&ts)).or_insert_with(|| {
            Bucket::new(numeric.iter().map(|(name, integer, _)| (*name, *integer)))
        });

        bucket.rows += 1;
        for ((_, sum), (_, _, values)) in bucket.sums.iter_mut().zip(&numeric) {
            *sum += values[row].unwrap_or(0.0);
        }
    }

    buckets
}

/// Buckets keyed by hour of day, ignoring the date.
pub fn hourly(table: &TimeSeriesTable) -> HourlyBuckets {
    bucket_by(table, |ts| ts.hour())
}

/// Buckets keyed by calendar date, ignoring the time of day.
pub fn daily(table: &TimeSeriesTable) -> DailyBuckets {
    bucket_by(table, |ts| ts.date())
}

/// Infers the sampling period from the first two rows in file order.
pub fn infer_interval(table: &TimeSeriesTable) -> Result<SamplingInterval, TableError> {
    let timestamps = table.timestamps();
    if timestamps.len() < 2 {
        return Err(TableError::TooFewRows(timestamps.len()));
    }

    let first = timestamps[0].unwrap_or_else(missing_timestamp);
    let second = timestamps[1].unwrap_or_else(missing_timestamp);
    Ok(SamplingInterval::from_step(second - first))
}

/// Sets each hourly bucket's `interval` to its summed `E` over the period's divisor.
pub fn apply_interval(hours: &mut HourlyBuckets, interval: SamplingInterval) {
    let divisor = interval.divisor();
    for bucket in hours.values_mut() {
        let energy = bucket.get(ENERGY_COLUMN).unwrap_or(0.0);
        bucket.interval = Some(energy / divisor);
    }
}
