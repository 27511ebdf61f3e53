//! API client for communicating with the Soracom REST API.
//!
//! This module provides the `ApiClient` struct for logging in, searching
//! SIMs with cursor pagination, and fetching single SIM records.

use std::time::Duration;

use anyhow::{Context, Result};
use futures::stream::{self, Stream, TryStreamExt};
use reqwest::{header, Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::auth::{Coverage, Credentials, Endpoints};
use crate::models::Sim;

use super::query::{SimFilter, SimQuery};
use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default cap on pages followed for one search.
/// At the API's default page size this is several thousand SIMs.
pub const DEFAULT_MAX_PAGES: usize = 100;

const API_KEY_HEADER: &str = "x-soracom-api-key";
const TOKEN_HEADER: &str = "x-soracom-token";

/// Response header some deployments use for the continuation cursor
const NEXT_KEY_HEADER: &str = "x-soracom-next-key";

#[derive(Serialize)]
struct AuthRequest<'a> {
    #[serde(rename = "authKeyId")]
    auth_key_id: &'a str,
    #[serde(rename = "authKey")]
    auth_key: &'a str,
}

#[derive(Deserialize)]
struct AuthResponse {
    #[serde(rename = "apiKey", default)]
    api_key: String,
    #[serde(default)]
    token: String,
    #[serde(rename = "operatorId", default)]
    operator_id: Option<String>,
}

/// Wrapped form of a `/query/sims` page. The bare-array form is parsed
/// directly as `Vec<Sim>`.
#[derive(Debug, Deserialize)]
struct SimListPage {
    #[serde(default)]
    data: Option<Vec<Sim>>,
    #[serde(rename = "lastEvaluatedKey", default)]
    last_evaluated_key: Option<String>,
}

fn fetch_failed() -> ApiError {
    ApiError::FetchFailed("Failed to fetch sims".to_string())
}

/// Parse a list body into its records and body cursor.
///
/// A `null` body or a wrapped page without `data` is a fetch failure. A
/// malformed record reports serde's error for that record.
fn parse_sim_list(text: &str) -> Result<(Vec<Sim>, Option<String>), ApiError> {
    let value: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| ApiError::InvalidResponse(format!("SIM list: {}", e)))?;

    match value {
        serde_json::Value::Null => Err(fetch_failed()),
        serde_json::Value::Array(_) => {
            let sims: Vec<Sim> = serde_json::from_value(value)
                .map_err(|e| ApiError::InvalidResponse(format!("SIM record: {}", e)))?;
            Ok((sims, None))
        }
        serde_json::Value::Object(_) => {
            let page: SimListPage = serde_json::from_value(value)
                .map_err(|e| ApiError::InvalidResponse(format!("SIM record: {}", e)))?;
            let sims = page.data.ok_or_else(fetch_failed)?;
            Ok((sims, page.last_evaluated_key))
        }
        other => Err(ApiError::InvalidResponse(format!(
            "SIM list: expected an array or object, got {}",
            other
        ))),
    }
}

/// One page of search results.
#[derive(Debug, Clone)]
pub struct SimPage {
    pub sims: Vec<Sim>,
    /// Cursor for the next page; `None` on the last page
    pub next_key: Option<String>,
}

/// Pagination state threaded through the page stream
enum PageCursor {
    Start,
    Next { key: String, fetched: usize },
    Done,
}

/// Tunables for `ApiClient`.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub endpoints: Endpoints,
    pub timeout: Duration,
    pub max_pages: usize,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

/// API client for Soracom.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    endpoints: Endpoints,
    max_pages: usize,
    credentials: Option<Credentials>,
}

impl ApiClient {
    /// Create a new API client against the public endpoints
    pub fn new() -> Result<Self> {
        Self::with_options(ClientOptions::default())
    }

    pub fn with_options(options: ClientOptions) -> Result<Self> {
        let client = Client::builder()
            .timeout(options.timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoints: options.endpoints,
            max_pages: options.max_pages.max(1),
            credentials: None,
        })
    }

    /// Create a client bound to the given credentials, sharing the connection pool.
    pub fn with_credentials(&self, credentials: Credentials) -> Self {
        Self {
            client: self.client.clone(),
            endpoints: self.endpoints.clone(),
            max_pages: self.max_pages,
            credentials: Some(credentials),
        }
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.authorized().is_ok()
    }

    pub fn coverage(&self) -> Option<Coverage> {
        self.credentials.as_ref().map(|c| c.coverage())
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    /// Exchange an auth key pair for session credentials.
    ///
    /// The coverage selector picks the deployment: anything starting with
    /// "g" is global, everything else is Japan. Install the result with
    /// `with_credentials`.
    pub async fn authenticate(
        &self,
        auth_key_id: &str,
        auth_key: &str,
        coverage_selector: &str,
    ) -> Result<Credentials> {
        let coverage = Coverage::from_selector(coverage_selector);
        let url = self.endpoints.url(coverage, "/auth");
        debug!(coverage = %coverage, "Authenticating");

        let response = self
            .client
            .post(&url)
            .json(&AuthRequest {
                auth_key_id,
                auth_key,
            })
            .send()
            .await
            .map_err(ApiError::Network)
            .context("Failed to send authentication request")?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, coverage = %coverage, "Authentication rejected");
            return Err(ApiError::Unauthenticated("Failed to authenticate".to_string()).into());
        }

        let auth: AuthResponse = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("auth response: {}", e)))?;

        let credentials = Credentials::new(auth.api_key, auth.token, coverage, auth.operator_id);
        if !credentials.is_complete() {
            warn!("Auth response was missing the API key or token");
            return Err(ApiError::Unauthenticated(
                "Auth response did not include an API key and token".to_string(),
            )
            .into());
        }

        info!(coverage = %coverage, operator_id = ?credentials.operator_id(), "Authenticated");
        Ok(credentials)
    }

    /// Credentials for a request, or `Unauthenticated` if none are installed.
    fn authorized(&self) -> Result<&Credentials, ApiError> {
        match self.credentials {
            Some(ref credentials) if credentials.is_complete() => Ok(credentials),
            _ => Err(ApiError::Unauthenticated("Not authenticated".to_string())),
        }
    }

    fn auth_headers(credentials: &Credentials) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            API_KEY_HEADER,
            header::HeaderValue::from_str(credentials.api_key())
                .context("API key is not a valid header value")?,
        );
        headers.insert(
            TOKEN_HEADER,
            header::HeaderValue::from_str(credentials.token())
                .context("Token is not a valid header value")?,
        );
        Ok(headers)
    }

    /// Resource URL under the coverage base. Each segment is percent-encoded,
    /// so `/`, `?` and `#` inside a segment stay part of that segment.
    fn resource_url(&self, coverage: Coverage, segments: &[&str]) -> Result<Url> {
        let base = self.endpoints.base_url(coverage);
        let mut url = Url::parse(base).with_context(|| format!("Invalid API base URL {}", base))?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("API base URL cannot carry a path: {}", base))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Gated GET: nothing is sent without credentials, and a 401 from the
    /// server is always reported as `Unauthenticated`.
    async fn get(&self, segments: &[&str], query: &[(&str, String)]) -> Result<reqwest::Response> {
        let credentials = self.authorized()?;
        let url = self.resource_url(credentials.coverage(), segments)?;

        let response = self
            .client
            .get(url.clone())
            .headers(Self::auth_headers(credentials)?)
            .query(query)
            .send()
            .await
            .map_err(ApiError::Network)
            .with_context(|| format!("Failed to send GET request to {}", url))?;

        if response.status() == StatusCode::UNAUTHORIZED {
            warn!(url = %url, "Session rejected by server");
            return Err(ApiError::Unauthenticated("Not authenticated".to_string()).into());
        }

        Ok(response)
    }

    // =========================================================================
    // SIM search
    // =========================================================================

    /// Fetch a single page of `/query/sims`.
    pub async fn fetch_sim_page(&self, query: &SimQuery, cursor: Option<&str>) -> Result<SimPage> {
        let response = self.get(&["query", "sims"], &query.params(cursor)).await?;

        let status = response.status();
        let header_key = response
            .headers()
            .get(NEXT_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let text = response
            .text()
            .await
            .map_err(ApiError::Network)
            .context("Failed to read SIM list response")?;

        if !status.is_success() {
            return Err(ApiError::from_status(status, &text).into());
        }

        let text = text.trim();
        if text.is_empty() {
            return Err(fetch_failed().into());
        }

        let (sims, body_key) = parse_sim_list(text)?;

        let next_key = body_key
            .filter(|k| !k.is_empty())
            .or_else(|| header_key.filter(|k| !k.is_empty()));

        debug!(
            filter = query.filter().param_key(),
            count = sims.len(),
            has_more = next_key.is_some(),
            "SIM page received"
        );

        Ok(SimPage { sims, next_key })
    }

    async fn next_page(
        &self,
        query: &SimQuery,
        cursor: PageCursor,
    ) -> Result<Option<(SimPage, PageCursor)>> {
        let (key, fetched) = match cursor {
            PageCursor::Done => return Ok(None),
            PageCursor::Start => (None, 0),
            PageCursor::Next { key, fetched } => {
                if fetched >= self.max_pages {
                    warn!(pages = fetched, "Server still returned a cursor at the page limit");
                    return Err(ApiError::PageLimitExceeded(self.max_pages).into());
                }
                (Some(key), fetched)
            }
        };

        let page = self.fetch_sim_page(query, key.as_deref()).await?;
        let fetched = fetched + 1;
        let next = match page.next_key {
            Some(ref key) => PageCursor::Next {
                key: key.clone(),
                fetched,
            },
            None => PageCursor::Done,
        };
        Ok(Some((page, next)))
    }

    /// Lazily follow the cursor chain, one page at a time.
    ///
    /// Each call starts again from the first page. The stream ends after
    /// the first error, or with `PageLimitExceeded` when the server keeps
    /// returning a cursor past `max_pages`.
    pub fn sim_pages<'a>(&'a self, query: &'a SimQuery) -> impl Stream<Item = Result<SimPage>> + 'a {
        stream::try_unfold(PageCursor::Start, move |cursor| self.next_page(query, cursor))
    }

    /// Lazily yield matching SIMs across all pages.
    pub fn sims<'a>(&'a self, query: &'a SimQuery) -> impl Stream<Item = Result<Sim>> + 'a {
        self.sim_pages(query)
            .map_ok(|page| stream::iter(page.sims.into_iter().map(Ok::<Sim, anyhow::Error>)))
            .try_flatten()
    }

    /// Run a search to completion. Any failure discards the pages already fetched.
    pub async fn search_sims(&self, query: &SimQuery) -> Result<Vec<Sim>> {
        let sims = self
            .sim_pages(query)
            .try_fold(Vec::new(), |mut acc, page| async move {
                acc.extend(page.sims);
                Ok::<_, anyhow::Error>(acc)
            })
            .await?;

        info!(query = %query, count = sims.len(), "SIM search complete");
        Ok(sims)
    }

    pub async fn search(&self, filter: SimFilter, value: &str) -> Result<Vec<Sim>> {
        self.search_sims(&SimQuery::new(filter, value)).await
    }

    pub async fn search_by_name(&self, name: &str) -> Result<Vec<Sim>> {
        self.search(SimFilter::Name, name).await
    }

    pub async fn search_by_group(&self, group: &str) -> Result<Vec<Sim>> {
        self.search(SimFilter::Group, group).await
    }

    pub async fn search_by_tag(&self, tag: &str) -> Result<Vec<Sim>> {
        self.search(SimFilter::Tag, tag).await
    }

    pub async fn search_by_status(&self, status: &str) -> Result<Vec<Sim>> {
        self.search(SimFilter::Status, status).await
    }

    pub async fn search_by_session_status(&self, session_status: &str) -> Result<Vec<Sim>> {
        self.search(SimFilter::SessionStatus, session_status).await
    }

    pub async fn search_by_subscription_status(&self, subscription: &str) -> Result<Vec<Sim>> {
        self.search(SimFilter::SubscriptionStatus, subscription).await
    }

    // =========================================================================
    // Single SIM
    // =========================================================================

    /// Fetch one SIM by id.
    pub async fn get_sim(&self, sim_id: &str) -> Result<Sim> {
        if sim_id.trim().is_empty() {
            return Err(ApiError::UserError(format!("Invalid SIM id: {:?}", sim_id)).into());
        }

        let response = self.get(&["sims", sim_id], &[]).await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(sim_id = sim_id, status = %status, "Failed to fetch sim");
            return Err(ApiError::ServerError(format!(
                "Failed to fetch sim {} (status {}): {}",
                sim_id,
                status,
                ApiError::truncate_body(&body)
            ))
            .into());
        }

        let sim: Sim = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("sim {}: {}", sim_id, e)))?;
        Ok(sim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_array_body() {
        let (sims, key) = parse_sim_list(r#"[{"simId": "a"}, {"simId": "b"}]"#)
            .expect("Failed to parse list body");
        assert_eq!(sims.len(), 2);
        assert!(key.is_none());
    }

    #[test]
    fn test_parse_wrapped_page_body() {
        let (sims, key) = parse_sim_list(r#"{"data": [{"simId": "a"}], "lastEvaluatedKey": "a"}"#)
            .expect("Failed to parse list body");
        assert_eq!(sims.len(), 1);
        assert_eq!(key.as_deref(), Some("a"));
    }

    #[test]
    fn test_parse_missing_payload_is_fetch_failure() {
        for body in ["null", r#"{"data": null}"#, r#"{"lastEvaluatedKey": "x"}"#] {
            match parse_sim_list(body) {
                Err(ApiError::FetchFailed(msg)) => assert_eq!(msg, "Failed to fetch sims"),
                other => panic!("unexpected result for {}: {:?}", body, other),
            }
        }
    }

    #[test]
    fn test_parse_bad_record_names_the_field() {
        // simId must be a string
        let err = parse_sim_list(r#"[{"simId": "a"}, {"simId": 7}]"#)
            .expect_err("bad record should fail");
        match err {
            ApiError::InvalidResponse(msg) => {
                assert!(msg.starts_with("SIM record:"), "message: {}", msg);
                assert!(!msg.contains("did not match any variant"), "message: {}", msg);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_default_options() {
        let options = ClientOptions::default();
        assert_eq!(options.timeout, Duration::from_secs(30));
        assert_eq!(options.max_pages, DEFAULT_MAX_PAGES);
        assert_eq!(options.endpoints, Endpoints::default());
    }

    #[test]
    fn test_unauthenticated_client_is_gated() {
        let client = ApiClient::new().expect("client");
        assert!(!client.is_authenticated());
        assert!(client.authorized().is_err());
        assert_eq!(client.coverage(), None);
    }

    #[test]
    fn test_with_credentials_gates_on_completeness() {
        let client = ApiClient::new().expect("client");

        let authed = client.with_credentials(Credentials::new("key", "token", Coverage::Japan, None));
        assert!(authed.is_authenticated());
        assert_eq!(authed.coverage(), Some(Coverage::Japan));

        let partial = client.with_credentials(Credentials::new("key", "", Coverage::Japan, None));
        assert!(!partial.is_authenticated());

        // The original client is unchanged
        assert!(!client.is_authenticated());
    }

    #[test]
    fn test_auth_headers() {
        let creds = Credentials::new("key-1", "token-1", Coverage::Global, None);
        let headers = ApiClient::auth_headers(&creds).expect("headers");
        assert_eq!(headers.get("X-Soracom-API-Key").and_then(|v| v.to_str().ok()), Some("key-1"));
        assert_eq!(headers.get("X-Soracom-Token").and_then(|v| v.to_str().ok()), Some("token-1"));
    }

    #[test]
    fn test_max_pages_is_at_least_one() {
        let client = ApiClient::with_options(ClientOptions {
            max_pages: 0,
            ..ClientOptions::default()
        })
        .expect("client");
        assert_eq!(client.max_pages(), 1);
    }
}
