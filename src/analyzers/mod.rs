//! Time bucketing of meter readings.
//!
//! Rows are grouped by hour of day and by calendar date with every numeric
//! column summed per bucket. Hourly buckets additionally carry an `interval`
//! figure derived from the inferred sampling period.

pub mod aggregate;
pub mod types;
