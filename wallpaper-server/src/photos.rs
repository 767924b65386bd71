//! Client for the upstream stock-photo REST API.
//!
//! Requests carry the server-held API key in the `Authorization` header.
//! Successful responses are passed back as raw JSON; anything else becomes a
//! [`PhotoApiError`] that keeps the upstream status and body.

use std::sync::Arc;

use reqwest::{Client, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::metrics as server_metrics;

/// Errors that can occur when talking to the photo API.
#[derive(Debug, Error)]
pub enum PhotoApiError {
    /// No API key was configured for the photo service.
    #[error("Photo API key is not configured. Set PEXELS_API_KEY to enable browsing and search")]
    MissingApiKey,
    /// The configured base URL is invalid.
    #[error("invalid photo API URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed (connection, timeout, etc.).
    #[error("photo API request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The photo API answered with a non-success status.
    #[error("photo API returned {status}")]
    Upstream {
        /// Status code returned by the photo API.
        status: StatusCode,
        /// Response body returned by the photo API.
        body: String,
    },
}

/// Asynchronous photo API client.
#[derive(Clone)]
pub struct PhotoClient {
    inner: Arc<InnerClient>,
}

struct InnerClient {
    http: Client,
    base_url: Url,
    api_key: Option<String>,
}

impl PhotoClient {
    /// Create a client for `base_url` (e.g., `https://api.pexels.com/v1`).
    ///
    /// A missing key is accepted here and reported on each request, so the
    /// server can start and serve the editor without photo access.
    ///
    /// # Errors
    ///
    /// Returns [`PhotoApiError::InvalidUrl`] if the URL is malformed.
    /// Returns [`PhotoApiError::Http`] if the HTTP client fails to build.
    pub fn new(base_url: impl AsRef<str>, api_key: Option<String>) -> Result<Self, PhotoApiError> {
        let mut base_url =
            Url::parse(base_url.as_ref()).map_err(|e| PhotoApiError::InvalidUrl(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(PhotoApiError::InvalidUrl(base_url.to_string()));
        }
        // Url::join replaces the last segment unless the path ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = Client::builder()
            .user_agent(format!("wallpaper-studio/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(InnerClient {
                http,
                base_url,
                api_key: api_key.filter(|k| !k.trim().is_empty()),
            }),
        })
    }

    /// Whether an API key is configured.
    #[must_use]
    pub fn has_api_key(&self) -> bool {
        self.inner.api_key.is_some()
    }

    /// Fetch a page of the curated feed.
    ///
    /// # Errors
    ///
    /// See [`PhotoApiError`].
    pub async fn curated(&self, page: u32, per_page: u32) -> Result<Value, PhotoApiError> {
        self.get(
            "curated",
            "curated",
            &[("page", page.to_string()), ("per_page", per_page.to_string())],
        )
        .await
    }

    /// Search photos by keyword.
    ///
    /// # Errors
    ///
    /// See [`PhotoApiError`].
    pub async fn search(
        &self,
        query: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Value, PhotoApiError> {
        self.get(
            "search",
            "search",
            &[
                ("query", query.to_string()),
                ("page", page.to_string()),
                ("per_page", per_page.to_string()),
            ],
        )
        .await
    }

    /// Fetch a single photo by ID.
    ///
    /// # Errors
    ///
    /// See [`PhotoApiError`].
    pub async fn photo(&self, id: u64) -> Result<Value, PhotoApiError> {
        self.get("photo", &format!("photos/{id}"), &[]).await
    }

    async fn get(
        &self,
        endpoint: &'static str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Value, PhotoApiError> {
        let api_key = self
            .inner
            .api_key
            .as_deref()
            .ok_or(PhotoApiError::MissingApiKey)?;
        let url = self
            .inner
            .base_url
            .join(path)
            .map_err(|e| PhotoApiError::InvalidUrl(e.to_string()))?;

        debug!(endpoint, %url, "Forwarding photo API request");
        let response = match self
            .inner
            .http
            .get(url)
            .header(reqwest::header::AUTHORIZATION, api_key)
            .query(query)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!(endpoint, "Photo API unreachable: {err}");
                server_metrics::record_upstream_request(endpoint, 0);
                return Err(err.into());
            }
        };

        let status = response.status();
        server_metrics::record_upstream_request(endpoint, status.as_u16());
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(endpoint, %status, "Photo API returned an error");
            return Err(PhotoApiError::Upstream { status, body });
        }

        Ok(response.json::<Value>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_with_mock(server: &MockServer, key: Option<&str>) -> PhotoClient {
        PhotoClient::new(format!("{}/v1", server.uri()), key.map(String::from))
            .expect("client creation should succeed")
    }

    #[test]
    fn test_invalid_url_rejected() {
        assert!(matches!(
            PhotoClient::new("not a url", None),
            Err(PhotoApiError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        let client = PhotoClient::new("https://api.pexels.com/v1", Some("  ".into()))
            .expect("client");
        assert!(!client.has_api_key());
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn test_curated_sends_key_and_paging() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/curated"))
            .and(header("authorization", "test-key"))
            .and(query_param("page", "2"))
            .and(query_param("per_page", "15"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "page": 2,
                "per_page": 15,
                "photos": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_with_mock(&server, Some("test-key"));
        let body = client.curated(2, 15).await.expect("curated");
        assert_eq!(body["page"], 2);
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn test_upstream_error_keeps_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/photos/42"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
            .mount(&server)
            .await;

        let client = client_with_mock(&server, Some("test-key"));
        match client.photo(42).await {
            Err(PhotoApiError::Upstream { status, body }) => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert_eq!(body, "Not Found");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_key_skips_request() {
        let server = MockServer::start().await;
        let client = client_with_mock(&server, None);
        assert!(matches!(
            client.search("nature", 1, 10).await,
            Err(PhotoApiError::MissingApiKey)
        ));
        let received = server.received_requests().await.unwrap_or_default();
        assert!(received.is_empty());
    }
}
