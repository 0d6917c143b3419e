//! Squid (GraphQL) collaborator.

use std::time::Duration;

use async_trait::async_trait;
use error_stack::{Result, ResultExt};
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{json, Value};
use url::Url;

#[derive(Debug)]
pub enum IndexerError {
    /// Transport-level failure, endpoint unreachable or timed out.
    Connection,
    /// The squid rejected the query or returned an unexpected shape.
    Query,
}

impl error_stack::Context for IndexerError {}

impl std::fmt::Display for IndexerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexerError::Connection => write!(f, "failed to connect to the squid endpoint"),
            IndexerError::Query => write!(f, "squid query failed"),
        }
    }
}

/// The indexer collaborator: executes one query document at a time.
#[async_trait]
pub trait Indexer {
    /// Execute a query document and return the response `data` object.
    async fn execute(&self, document: &str) -> Result<Value, IndexerError>;
}

#[derive(Debug, Clone)]
pub struct GraphqlClientOptions {
    /// Request timeout.
    pub timeout: Duration,
    /// Headers to send with the requests.
    pub headers: HeaderMap<HeaderValue>,
}

impl Default for GraphqlClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            headers: HeaderMap::new(),
        }
    }
}

/// GraphQL-over-HTTP client for a squid endpoint.
#[derive(Clone)]
pub struct GraphqlClient {
    client: reqwest::Client,
    url: Url,
    options: GraphqlClientOptions,
}

#[derive(Debug, serde::Deserialize)]
struct GraphqlResponse {
    data: Option<Value>,
    errors: Option<Vec<Value>>,
}

impl GraphqlClient {
    pub fn new(url: Url, options: GraphqlClientOptions) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
            options,
        }
    }
}

#[async_trait]
impl Indexer for GraphqlClient {
    #[tracing::instrument(level = "debug", skip_all, err(Debug))]
    async fn execute(&self, document: &str) -> Result<Value, IndexerError> {
        let request = self
            .client
            .post(self.url.clone())
            .headers(self.options.headers.clone())
            .json(&json!({ "query": document }))
            .send();

        let Ok(response) = tokio::time::timeout(self.options.timeout, request).await else {
            return Err(IndexerError::Connection).attach_printable("request timed out");
        };

        let response = response
            .change_context(IndexerError::Connection)
            .attach_printable("failed to send query to the squid endpoint")?;

        let response = response
            .error_for_status()
            .change_context(IndexerError::Query)?;

        let body: GraphqlResponse = response
            .json()
            .await
            .change_context(IndexerError::Query)
            .attach_printable("failed to deserialize squid response")?;

        if let Some(errors) = body.errors {
            if !errors.is_empty() {
                return Err(IndexerError::Query)
                    .attach_printable_lazy(|| format!("squid returned errors: {errors:?}"));
            }
        }

        match body.data {
            Some(data) => Ok(data),
            None => Err(IndexerError::Query).attach_printable("response contains no data"),
        }
    }
}
