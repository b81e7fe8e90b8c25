//! The fetch → parse → fill → describe → bucket pipeline.

use serde::{Serialize, Serializer};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::analyzers::aggregate::{apply_interval, daily, hourly, infer_interval};
use crate::analyzers::types::{DailyBuckets, HourlyBuckets, SamplingInterval};
use crate::config::StorageConfig;
use crate::error::{FetchError, SummaryError, TableError};
use crate::stats::{describe, skew};
use crate::store::BlobStore;
use crate::table::{ENERGY_COLUMN, TimeSeriesTable};

/// Statistics and time buckets for one meter file.
///
/// `hours` and `days` serialize as JSON-encoded strings, not nested objects.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryResult {
    #[serde(serialize_with = "as_json_string")]
    pub hours: HourlyBuckets,
    #[serde(serialize_with = "as_json_string")]
    pub days: DailyBuckets,
    /// Mean of the first numeric column.
    pub mean: f64,
    /// Sample standard deviation of the first numeric column.
    pub std: f64,
    /// Skewness of `E`.
    pub skew: f64,
    #[serde(skip)]
    pub interval: SamplingInterval,
}

fn as_json_string<T: Serialize, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
    let json = serde_json::to_string(value).map_err(serde::ser::Error::custom)?;
    serializer.serialize_str(&json)
}

pub struct TimeSeriesSummarizer<S> {
    store: S,
    config: StorageConfig,
}

impl<S: BlobStore> TimeSeriesSummarizer<S> {
    pub fn new(store: S, config: StorageConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Fetches `file` from the configured folder and summarizes it.
    ///
    /// Any failure before parsing starts, including writing the staging file,
    /// is reported as [`SummaryError::NotFound`].
    #[tracing::instrument(skip(self), fields(bucket = %self.config.bucket))]
    pub async fn summarize(&self, file: &str) -> Result<SummaryResult, SummaryError> {
        let staged = self.fetch(file).await?;
        let data = tokio::fs::read(&staged).await.map_err(TableError::Io)?;
        let table = TimeSeriesTable::from_bytes(&data)?;
        Ok(summarize_table(table)?)
    }

    /// Downloads the object and writes it to the scratch directory.
    async fn fetch(&self, file: &str) -> Result<PathBuf, FetchError> {
        let key = self.config.object_key(file);
        let bytes = self.store.fetch(&self.config.bucket, &key).await?;

        let path = self.config.staging_path(file);
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|source| FetchError::Staging {
                path: path.clone(),
                source,
            })?;

        debug!(key = %key, path = %path.display(), bytes = bytes.len(), "Object staged");
        Ok(path)
    }
}

/// Runs the statistics and bucketing steps over a parsed table.
pub fn summarize_table(mut table: TimeSeriesTable) -> Result<SummaryResult, TableError> {
    table.fill_missing();

    let described = describe(&table)?;
    let energy = table.numeric(ENERGY_COLUMN)?;
    let skew = skew(&energy);

    let interval = infer_interval(&table)?;
    let mut hours = hourly(&table);
    apply_interval(&mut hours, interval);
    let days = daily(&table);

    info!(
        rows = table.len(),
        hours = hours.len(),
        days = days.len(),
        ?interval,
        "Meter file summarized"
    );

    Ok(SummaryResult {
        hours,
        days,
        mean: described.mean,
        std: described.std,
        skew,
        interval,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summarize_csv(csv: &str) -> Result<SummaryResult, TableError> {
        summarize_table(TimeSeriesTable::from_bytes(csv.as_bytes()).unwrap())
    }

    #[test]
    fn test_missing_values_count_as_zero() {
        let result = summarize_csv(
            "AESTTime,E\n\
             2021-06-01 00:00,10\n\
             2021-06-01 00:30,\n\
             2021-06-01 01:00,30\n",
        )
        .unwrap();

        assert_eq!(result.hours[&0].get("E"), Some(10.0));
        assert_eq!(result.hours[&1].get("E"), Some(30.0));
        assert_eq!(result.mean, 40.0 / 3.0);
    }

    #[test]
    fn test_mean_comes_from_first_numeric_column() {
        let result = summarize_csv(
            "AESTTime,Q,E\n\
             2021-06-01 00:00,1,100\n\
             2021-06-01 00:30,2,200\n\
             2021-06-01 01:00,3,900\n",
        )
        .unwrap();

        assert_eq!(result.mean, 2.0);
        assert_eq!(result.std, 1.0);
        assert!(result.skew > 0.0);
    }

    #[test]
    fn test_missing_energy_column() {
        let err = summarize_csv("AESTTime,Q\n2021-06-01 00:00,1\n2021-06-01 00:30,2\n").unwrap_err();
        assert!(matches!(err, TableError::MissingColumn(name) if name == "E"));
    }

    #[test]
    fn test_single_row_is_fatal() {
        let err = summarize_csv("AESTTime,E\n2021-06-01 00:00,1\n").unwrap_err();
        assert!(matches!(err, TableError::TooFewRows(1)));
    }

    #[test]
    fn test_payload_encodes_buckets_as_strings() {
        let result = summarize_csv(
            "AESTTime,E\n\
             2021-06-01 00:00,10\n\
             2021-06-01 00:30,20\n\
             2021-06-02 00:00,30\n",
        )
        .unwrap();
        let payload = serde_json::to_value(&result).unwrap();

        let hours: serde_json::Value =
            serde_json::from_str(payload["hours"].as_str().unwrap()).unwrap();
        assert_eq!(hours["0"]["E"], 60.0);
        assert_eq!(hours["0"]["interval"], 60.0 / 730.0);

        let days: serde_json::Value =
            serde_json::from_str(payload["days"].as_str().unwrap()).unwrap();
        assert_eq!(days["2021-06-01"]["E"], 30.0);
        assert_eq!(days["2021-06-02"]["E"], 30.0);
        assert!(days["2021-06-01"].get("interval").is_none());

        assert_eq!(payload["mean"], 20.0);
        assert!(payload.get("interval").is_none());
    }

    #[test]
    fn test_nan_statistics_serialize_as_null() {
        let result = summarize_csv("AESTTime,E\n2021-06-01 00:00,1\n2021-06-01 00:30,2\n").unwrap();
        assert!(result.skew.is_nan());

        let payload = serde_json::to_value(&result).unwrap();
        assert!(payload["skew"].is_null());
    }
}
