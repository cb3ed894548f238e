//! Firestore REST API client.
//!
//! - Token caching with refresh margin
//! - HTTP client tuning (pooling, timeouts)
//! - Exponential backoff with jitter
//! - Observability (tracing spans, metrics)

use std::sync::Arc;
use std::time::{Duration, Instant};

use gcp_auth::{CustomServiceAccount, TokenProvider};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tracing::{debug, info_span, Instrument};

use super::metrics::{record_documents_returned, record_request};
use super::retry::{with_retry_when, RetryConfig};
use super::token_cache::{TokenCache, EMULATOR_TOKEN};
use super::types::{
    Aggregation, CommitRequest, CommitResponse, CountAggregation, Document, FromFirestoreValue,
    RunAggregationQueryRequest, RunAggregationQueryResponse, RunQueryRequest, RunQueryResponse,
    StructuredAggregationQuery, StructuredQuery, Write,
};
use crate::error::{StoreError, StoreResult};

/// Alias of the count aggregation in aggregation queries.
const COUNT_ALIAS: &str = "total";

/// Maximum number of writes in one commit.
const MAX_COMMIT_WRITES: usize = 500;

/// Firestore client configuration.
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    /// GCP project ID
    pub project_id: String,
    /// Database ID (usually "(default)")
    pub database_id: String,
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Retry configuration
    pub retry: RetryConfig,
    /// Emulator address; when set, no service account is needed.
    pub emulator_host: Option<String>,
}

impl FirestoreConfig {
    /// Create config from environment variables.
    pub fn from_env() -> StoreResult<Self> {
        let project_id = std::env::var("GCP_PROJECT_ID")
            .or_else(|_| std::env::var("FIREBASE_PROJECT_ID"))
            .map_err(|_| {
                StoreError::auth_error(
                    "GCP_PROJECT_ID or FIREBASE_PROJECT_ID must be set to access Firestore",
                )
            })?;

        if project_id.is_empty() {
            return Err(StoreError::auth_error(
                "GCP_PROJECT_ID or FIREBASE_PROJECT_ID cannot be empty",
            ));
        }

        let secs = |key: &str, default: u64| {
            std::env::var(key)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default)
        };

        Ok(Self {
            project_id,
            database_id: std::env::var("FIRESTORE_DATABASE_ID")
                .unwrap_or_else(|_| "(default)".to_string()),
            timeout: Duration::from_secs(secs("FIRESTORE_TIMEOUT_SECS", 30)),
            connect_timeout: Duration::from_secs(secs("FIRESTORE_CONNECT_TIMEOUT_SECS", 5)),
            retry: RetryConfig::from_env(),
            emulator_host: std::env::var("FIRESTORE_EMULATOR_HOST")
                .ok()
                .filter(|h| !h.is_empty()),
        })
    }
}

/// Firestore REST API client.
#[derive(Clone)]
pub struct FirestoreClient {
    http: Client,
    config: FirestoreConfig,
    base_url: String,
    token_cache: Arc<TokenCache>,
}

impl FirestoreClient {
    /// Create a new Firestore client.
    pub async fn new(config: FirestoreConfig) -> StoreResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("jobtrack-store/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(StoreError::Network)?;

        let (host, token_cache) = match &config.emulator_host {
            Some(host) => {
                let host = if host.starts_with("http://") || host.starts_with("https://") {
                    host.trim_end_matches('/').to_string()
                } else {
                    format!("http://{}", host.trim_end_matches('/'))
                };
                debug!(host = %host, "Using Firestore emulator");
                (host, TokenCache::fixed(EMULATOR_TOKEN))
            }
            None => (
                "https://firestore.googleapis.com".to_string(),
                TokenCache::new(Self::create_auth_provider()?),
            ),
        };

        let base_url = format!(
            "{}/v1/projects/{}/databases/{}/documents",
            host, config.project_id, config.database_id
        );

        Ok(Self {
            http,
            config,
            base_url,
            token_cache: Arc::new(token_cache),
        })
    }

    fn create_auth_provider() -> StoreResult<Arc<dyn TokenProvider>> {
        let service_account = CustomServiceAccount::from_env().map_err(|e| {
            StoreError::auth_error(format!("Failed to load service account: {}", e))
        })?;

        match service_account {
            Some(sa) => Ok(Arc::new(sa)),
            None => Err(StoreError::auth_error(
                "GOOGLE_APPLICATION_CREDENTIALS not set. \
                 Set it to the path of your service account JSON file.",
            )),
        }
    }

    /// Create from environment variables.
    pub async fn from_env() -> StoreResult<Self> {
        Self::new(FirestoreConfig::from_env()?).await
    }

    fn is_access_token_expired(body: &str) -> bool {
        body.contains("ACCESS_TOKEN_EXPIRED") || body.contains("\"UNAUTHENTICATED\"")
    }

    /// URL of a single document. The id segment is percent-encoded.
    fn document_url(&self, collection: &str, doc_id: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            collection,
            urlencoding::encode(doc_id)
        )
    }

    /// Full resource name, as used in writes and query results.
    pub fn full_document_name(&self, collection: &str, doc_id: &str) -> String {
        format!(
            "projects/{}/databases/{}/documents/{}/{}",
            self.config.project_id, self.config.database_id, collection, doc_id
        )
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Get a document.
    pub async fn get_document(&self, collection: &str, doc_id: &str) -> StoreResult<Option<Document>> {
        let url = &self.document_url(collection, doc_id);

        self.execute_request("get_document", collection, Some(doc_id), || async move {
            let response = self.send(|token| self.http.get(url).bearer_auth(token)).await?;
            let status = response.status();

            match status {
                StatusCode::OK => Ok(Some(response.json::<Document>().await?)),
                StatusCode::NOT_FOUND => Ok(None),
                _ => Err(Self::handle_error_response(status, url, response).await),
            }
        })
        .await
    }

    /// Apply writes atomically. Either every write lands or none does.
    pub async fn commit(&self, writes: Vec<Write>) -> StoreResult<CommitResponse> {
        if writes.is_empty() {
            return Ok(CommitResponse::default());
        }
        if writes.len() > MAX_COMMIT_WRITES {
            return Err(StoreError::request_failed(format!(
                "Commit exceeds {} write limit",
                MAX_COMMIT_WRITES
            )));
        }

        // A guarded write that landed before a lost response would fail its
        // precondition when replayed
        let guarded = writes.iter().any(|w| w.current_document.is_some());
        let retryable: fn(&StoreError) -> bool = if guarded {
            StoreError::is_retryable_write
        } else {
            StoreError::is_retryable
        };
        let url = &format!("{}:commit", self.base_url);
        let request = &CommitRequest { writes };

        self.execute_request_when("commit", "batch", None, retryable, || async move {
            let response = self
                .send(|token| self.http.post(url).bearer_auth(token).json(request))
                .await?;
            let status = response.status();

            match status {
                StatusCode::OK => Ok(response.json::<CommitResponse>().await?),
                _ => Err(Self::handle_error_response(status, url, response).await),
            }
        })
        .await
    }

    /// Run a structured query over top-level collections.
    pub async fn run_query(&self, query: StructuredQuery) -> StoreResult<Vec<Document>> {
        let url = &format!("{}:runQuery", self.base_url);
        let collection = query
            .from
            .first()
            .map(|c| c.collection_id.clone())
            .unwrap_or_default();
        let request = &RunQueryRequest {
            structured_query: query,
        };
        let collection = collection.as_str();

        self.execute_request("run_query", collection, None, || async move {
            let response = self
                .send(|token| self.http.post(url).bearer_auth(token).json(request))
                .await?;
            let status = response.status();

            if status != StatusCode::OK {
                return Err(Self::handle_error_response(status, url, response).await);
            }

            // runQuery returns a JSON array of RunQueryResponse objects
            let body = response.text().await?;
            let responses: Vec<RunQueryResponse> = serde_json::from_str(&body).map_err(|e| {
                StoreError::InvalidResponse(format!(
                    "Failed to parse runQuery response: {} (body prefix: {})",
                    e,
                    body.chars().take(200).collect::<String>()
                ))
            })?;

            let docs: Vec<Document> = responses.into_iter().filter_map(|r| r.document).collect();
            record_documents_returned(collection, docs.len());
            Ok(docs)
        })
        .await
    }

    /// Count the documents a query matches, server-side.
    pub async fn count(&self, query: StructuredQuery) -> StoreResult<u64> {
        let url = &format!("{}:runAggregationQuery", self.base_url);
        let collection = query
            .from
            .first()
            .map(|c| c.collection_id.clone())
            .unwrap_or_default();
        let request = &RunAggregationQueryRequest {
            structured_aggregation_query: StructuredAggregationQuery {
                structured_query: query,
                aggregations: vec![Aggregation {
                    alias: COUNT_ALIAS.to_string(),
                    count: CountAggregation::default(),
                }],
            },
        };

        self.execute_request("count", &collection, None, || async move {
            let response = self
                .send(|token| self.http.post(url).bearer_auth(token).json(request))
                .await?;
            let status = response.status();

            if status != StatusCode::OK {
                return Err(Self::handle_error_response(status, url, response).await);
            }

            let responses: Vec<RunAggregationQueryResponse> = response.json().await?;
            responses
                .iter()
                .filter_map(|r| r.result.as_ref())
                .find_map(|r| r.aggregate_fields.get(COUNT_ALIAS))
                .and_then(u64::from_firestore_value)
                .ok_or_else(|| StoreError::InvalidResponse("Aggregation result missing count".to_string()))
        })
        .await
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    /// Send an authorized request, refreshing the token once if it expired.
    async fn send<B>(&self, build: B) -> StoreResult<Response>
    where
        B: Fn(&str) -> RequestBuilder,
    {
        let token = self.token_cache.get_token().await?;
        let response = build(&token).send().await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if !Self::is_access_token_expired(&body) {
            return Err(StoreError::from_http_status(401, body));
        }

        self.token_cache.invalidate().await;
        let token = self.token_cache.get_token().await?;
        Ok(build(&token).send().await?)
    }

    /// Execute a request with retry, tracing and metrics.
    async fn execute_request<T, F, Fut>(
        &self,
        operation: &str,
        collection: &str,
        doc_id: Option<&str>,
        op: F,
    ) -> StoreResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = StoreResult<T>>,
    {
        self.execute_request_when(operation, collection, doc_id, StoreError::is_retryable, op)
            .await
    }

    async fn execute_request_when<T, F, Fut>(
        &self,
        operation: &str,
        collection: &str,
        doc_id: Option<&str>,
        retryable: fn(&StoreError) -> bool,
        op: F,
    ) -> StoreResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = StoreResult<T>>,
    {
        let span = if let Some(id) = doc_id {
            info_span!("store_request", operation = %operation, collection = %collection, doc_id = %id)
        } else {
            info_span!("store_request", operation = %operation, collection = %collection)
        };

        let start = Instant::now();
        let result = with_retry_when(&self.config.retry, operation, retryable, op)
            .instrument(span)
            .await;
        let latency_ms = start.elapsed().as_millis() as f64;

        let status = match &result {
            Ok(_) => 200,
            Err(e) => e.http_status().unwrap_or(500),
        };
        record_request(operation, status, latency_ms);

        result
    }

    async fn handle_error_response(status: StatusCode, url: &str, response: Response) -> StoreError {
        let body = response.text().await.unwrap_or_default();
        StoreError::from_http_status(status.as_u16(), format!("{} failed: {}", url, body))
    }
}
