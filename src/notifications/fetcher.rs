//! Source fetchers: one backend read endpoint per notification category.
//!
//! Records are already scoped to the authenticated user by the backend.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use super::models::{CategoryId, MessageRecord, SourceRecord, TimestampedRecord};

/// Errors a single category fetch can end with.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Backend answered {status} for {url}")]
    Status { status: StatusCode, url: String },

    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("No response within {0:?}")]
    Timeout(Duration),
}

impl FetchError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Transport(_) => "transport",
            FetchError::Status { .. } => "status",
            FetchError::Decode(_) => "decode",
            FetchError::Timeout(_) => "timeout",
        }
    }
}

#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Category every returned record belongs to.
    fn category(&self) -> CategoryId;

    async fn fetch(&self) -> Result<Vec<SourceRecord>, FetchError>;
}

/// Endpoints answer either with a bare array or with `{ "data": [...] }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ListEnvelope<T> {
    Bare(Vec<T>),
    Wrapped { data: Vec<T> },
}

impl<T> ListEnvelope<T> {
    fn into_items(self) -> Vec<T> {
        match self {
            ListEnvelope::Bare(items) | ListEnvelope::Wrapped { data: items } => items,
        }
    }
}

/// Shared HTTP client for the school backend.
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the backend (e.g., "https://school.example.org")
    /// * `timeout_secs` - Per-request timeout in seconds
    /// * `auth_token` - Bearer token of the current session, if any
    pub fn new(
        base_url: String,
        timeout_secs: u64,
        auth_token: Option<String>,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        let base_url = base_url.trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            auth_token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the fetcher reading `category` from `path` (relative to the base URL).
    pub fn fetcher(&self, category: CategoryId, path: &str) -> HttpSourceFetcher {
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };
        HttpSourceFetcher {
            backend: self.clone(),
            category,
            url: format!("{}{}", self.base_url, path),
        }
    }

    /// Fetchers for every configured `(category, path)` pair.
    pub fn fetchers<'a, I>(&self, endpoints: I) -> Vec<Arc<dyn SourceFetcher>>
    where
        I: IntoIterator<Item = (CategoryId, &'a str)>,
    {
        endpoints
            .into_iter()
            .map(|(category, path)| {
                Arc::new(self.fetcher(category, path)) as Arc<dyn SourceFetcher>
            })
            .collect()
    }

    async fn get_list(&self, url: &str) -> Result<Vec<Value>, FetchError> {
        let mut request = self.client.get(url);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                status: response.status(),
                url: url.to_string(),
            });
        }

        let body = response.bytes().await?;
        let envelope: ListEnvelope<Value> =
            serde_json::from_slice(&body).map_err(|e| FetchError::Decode(e.to_string()))?;
        Ok(envelope.into_items())
    }
}

pub struct HttpSourceFetcher {
    backend: BackendClient,
    category: CategoryId,
    url: String,
}

impl HttpSourceFetcher {
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl SourceFetcher for HttpSourceFetcher {
    fn category(&self) -> CategoryId {
        self.category
    }

    async fn fetch(&self) -> Result<Vec<SourceRecord>, FetchError> {
        let items = self.backend.get_list(&self.url).await?;
        Ok(records_from_items(self.category, items))
    }
}

fn decode_each<T: DeserializeOwned>(category: CategoryId, items: Vec<Value>) -> Vec<T> {
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping malformed {} record: {}", category, e);
                None
            }
        })
        .collect()
}

/// Decodes every item on its own, so a malformed or undated record only drops itself.
fn records_from_items(category: CategoryId, items: Vec<Value>) -> Vec<SourceRecord> {
    let total = items.len();
    let decoded: Vec<SourceRecord> = match category {
        CategoryId::Messages => decode_each::<MessageRecord>(category, items)
            .into_iter()
            .map(SourceRecord::Message)
            .collect(),
        CategoryId::PartialGrades => decode_each::<TimestampedRecord>(category, items)
            .into_iter()
            .map(SourceRecord::PartialGrade)
            .collect(),
        CategoryId::ReportCards => decode_each::<TimestampedRecord>(category, items)
            .into_iter()
            .map(SourceRecord::ReportCard)
            .collect(),
        CategoryId::ExternalResults => decode_each::<TimestampedRecord>(category, items)
            .into_iter()
            .map(SourceRecord::ExternalResult)
            .collect(),
    };

    let records: Vec<SourceRecord> = decoded
        .into_iter()
        .filter(|r| r.last_activity().is_some())
        .collect();
    if records.len() < total {
        debug!(
            "Dropped {} of {} {} records",
            total - records.len(),
            total,
            category
        );
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> BackendClient {
        BackendClient::new(base_url.to_string(), 5, None).unwrap()
    }

    #[test]
    fn test_trailing_slash_removal() {
        assert_eq!(
            client("http://localhost:8080/").base_url(),
            "http://localhost:8080"
        );
    }

    #[test]
    fn test_fetcher_url_joining() {
        let backend = client("http://localhost:8080");
        assert_eq!(
            backend.fetcher(CategoryId::Messages, "/api/messages").url(),
            "http://localhost:8080/api/messages"
        );
        assert_eq!(
            backend.fetcher(CategoryId::ReportCards, "api/report-cards").url(),
            "http://localhost:8080/api/report-cards"
        );
    }

    #[test]
    fn test_envelope_accepts_both_shapes() {
        let bare: ListEnvelope<TimestampedRecord> =
            serde_json::from_str(r#"[{"id":"a","updatedAt":"2024-01-01T00:00:00Z"}]"#).unwrap();
        let wrapped: ListEnvelope<TimestampedRecord> = serde_json::from_str(
            r#"{"data":[{"id":"a","updatedAt":"2024-01-01T00:00:00Z"},{"id":"b"}]}"#,
        )
        .unwrap();

        assert_eq!(bare.into_items().len(), 1);
        assert_eq!(wrapped.into_items().len(), 2);
    }

    #[test]
    fn test_malformed_message_only_drops_itself() {
        let items: Vec<Value> = serde_json::from_str(
            r#"[
                {"id":"m1","createdAt":"2024-01-01T00:00:00Z","readAt":null},
                {"id":"m2","createdAt":"yesterday","readAt":null},
                {"id":"m3","updatedAt":"2024-01-03T00:00:00Z","readAt":null},
                {"id":"m4","readAt":null}
            ]"#,
        )
        .unwrap();

        let records = records_from_items(CategoryId::Messages, items);

        let ids: Vec<&str> = records.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["m1", "m3"]);
    }

    #[test]
    fn test_records_carry_their_category() {
        let items: Vec<Value> = serde_json::from_str(
            r#"[{"_id":"a","id":"a","updatedAt":"2024-01-01T00:00:00Z"},{"_id":"b"}]"#,
        )
        .unwrap();

        let records = records_from_items(CategoryId::ExternalResults, items);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].category(), CategoryId::ExternalResults);
        assert_eq!(records[0].id(), "a");
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        let fetcher = client("http://127.0.0.1:9").fetcher(CategoryId::Messages, "/messages");
        let err = fetcher.fetch().await.unwrap_err();
        assert_eq!(err.kind(), "transport");
    }
}
