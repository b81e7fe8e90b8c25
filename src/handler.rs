//! Invocation contract: an event naming a file in, a summary or a not-found payload out.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{error, warn};

use crate::error::{FetchError, SummaryError};
use crate::store::BlobStore;
use crate::summarizer::{SummaryResult, TimeSeriesSummarizer};

pub const NOT_FOUND_MESSAGE: &str = "File cannot be found, please check file name";

/// Request payload: `{"file": "<identifier>"}`.
#[derive(Debug, Clone, Deserialize)]
pub struct InvocationEvent {
    pub file: String,
}

/// Returned in place of a summary when the file could not be fetched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotFoundResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    /// JSON-encoded `{"message": ...}`.
    pub body: String,
}

impl Default for NotFoundResponse {
    fn default() -> Self {
        let body = serde_json::json!({ "message": NOT_FOUND_MESSAGE }).to_string();
        Self {
            status_code: 200,
            headers: BTreeMap::from([("Content-Type".to_string(), "application/json".to_string())]),
            body,
        }
    }
}

/// The two response shapes share no envelope.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Response {
    Summary(SummaryResult),
    NotFound(NotFoundResponse),
}

/// Summarizes the event's file.
///
/// A failed fetch becomes [`Response::NotFound`]; parse and shape errors are
/// returned as `Err` for the caller to treat as fatal.
#[tracing::instrument(skip(summarizer), fields(file = %event.file))]
pub async fn handle<S: BlobStore>(
    summarizer: &TimeSeriesSummarizer<S>,
    event: InvocationEvent,
) -> Result<Response> {
    match summarizer.summarize(&event.file).await {
        Ok(summary) => Ok(Response::Summary(summary)),
        Err(SummaryError::NotFound(e)) => {
            let kind = match &e {
                FetchError::NotFound { .. } => "not_found",
                FetchError::Transport { .. } => "transport",
                FetchError::Staging { .. } => "staging",
            };
            warn!(kind, error = %e, "Fetch failed, returning not-found response");
            Ok(Response::NotFound(NotFoundResponse::default()))
        }
        Err(e) => {
            error!(error = %e, "Summary failed");
            Err(e).with_context(|| format!("failed to summarize '{}'", event.file))
        }
    }
}

/// Decodes a raw JSON event and handles it. A missing `file` field is an error.
pub async fn handle_json<S: BlobStore>(
    summarizer: &TimeSeriesSummarizer<S>,
    event: &str,
) -> Result<Response> {
    let event: InvocationEvent =
        serde_json::from_str(event).context("invalid invocation event")?;
    handle(summarizer, event).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_payload_shape() {
        let value = serde_json::to_value(Response::NotFound(NotFoundResponse::default())).unwrap();

        assert_eq!(value["statusCode"], 200);
        assert_eq!(value["headers"]["Content-Type"], "application/json");
        let body: serde_json::Value = serde_json::from_str(value["body"].as_str().unwrap()).unwrap();
        assert_eq!(body["message"], NOT_FOUND_MESSAGE);
    }

    #[test]
    fn test_event_requires_file() {
        assert!(serde_json::from_str::<InvocationEvent>(r#"{"name": "x.csv"}"#).is_err());
        let event: InvocationEvent = serde_json::from_str(r#"{"file": "x.csv"}"#).unwrap();
        assert_eq!(event.file, "x.csv");
    }
}
