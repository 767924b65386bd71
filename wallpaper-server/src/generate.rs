//! Client for the text-to-image generation service.
//!
//! The service takes `{"prompt": ...}` and answers with
//! `{"media": {"url": ...}}`. The URL is either already a `data:` URI or a
//! link that is downloaded and inlined, so callers always receive an image
//! data URI.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::metrics as server_metrics;

/// Errors that can occur while generating an image.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// No endpoint or key is configured for the generation service.
    #[error("Image generation is not configured. Set GENERATION_URL and GENERATION_API_KEY")]
    NotConfigured,
    /// The configured endpoint is invalid.
    #[error("invalid generation URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed (connection, timeout, etc.).
    #[error("generation request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The generation service answered with a non-success status.
    #[error("generation service returned {status}")]
    Upstream {
        /// Status code returned by the service.
        status: StatusCode,
        /// Response body returned by the service.
        body: String,
    },
    /// The service answered without any image.
    #[error("No image was generated")]
    NoMedia,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    prompt: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    media: Option<Media>,
}

#[derive(Deserialize)]
struct Media {
    url: Option<String>,
}

/// Asynchronous image generation client.
#[derive(Clone)]
pub struct ImageGenerator {
    inner: Arc<InnerClient>,
}

struct InnerClient {
    http: Client,
    endpoint: Option<Url>,
    api_key: Option<String>,
}

impl ImageGenerator {
    /// Create a generator. Either argument may be absent; requests then
    /// fail with [`GenerationError::NotConfigured`].
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::InvalidUrl`] if the endpoint is malformed.
    /// Returns [`GenerationError::Http`] if the HTTP client fails to build.
    pub fn new(endpoint: Option<&str>, api_key: Option<String>) -> Result<Self, GenerationError> {
        let endpoint = endpoint
            .map(|e| Url::parse(e).map_err(|err| GenerationError::InvalidUrl(err.to_string())))
            .transpose()?;

        let http = Client::builder()
            .user_agent(format!("wallpaper-studio/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(InnerClient {
                http,
                endpoint,
                api_key: api_key.filter(|k| !k.trim().is_empty()),
            }),
        })
    }

    /// Whether both endpoint and key are configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.inner.endpoint.is_some() && self.inner.api_key.is_some()
    }

    /// Generate an image for `prompt`, returning it as a data URI.
    ///
    /// # Errors
    ///
    /// See [`GenerationError`]. Nothing is retried.
    pub async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let result = self.request(prompt).await;
        server_metrics::record_generation(result.is_ok());
        result
    }

    async fn request(&self, prompt: &str) -> Result<String, GenerationError> {
        let (Some(endpoint), Some(api_key)) = (&self.inner.endpoint, &self.inner.api_key) else {
            return Err(GenerationError::NotConfigured);
        };

        debug!(prompt_len = prompt.len(), "Requesting image generation");
        let response = self
            .inner
            .http
            .post(endpoint.clone())
            .bearer_auth(api_key)
            .json(&GenerateRequest { prompt })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "Generation service returned an error");
            return Err(GenerationError::Upstream { status, body });
        }

        let payload: GenerateResponse = response.json().await?;
        let url = payload
            .media
            .and_then(|m| m.url)
            .filter(|u| !u.trim().is_empty())
            .ok_or(GenerationError::NoMedia)?;

        if url.starts_with("data:") {
            info!("Image generated");
            return Ok(url);
        }
        self.inline(&url).await
    }

    /// Download a media link and re-encode it as a data URI.
    async fn inline(&self, url: &str) -> Result<String, GenerationError> {
        let url = Url::parse(url).map_err(|e| GenerationError::InvalidUrl(e.to_string()))?;
        let response = self.inner.http.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "Generated media could not be downloaded");
            return Err(GenerationError::Upstream { status, body });
        }

        let mime = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map_or_else(|| "image/png".to_string(), |v| v.to_string());
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(GenerationError::NoMedia);
        }

        info!(size = bytes.len(), "Image generated");
        Ok(format!("data:{mime};base64,{}", STANDARD.encode(&bytes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn generator_with_mock(server: &MockServer) -> ImageGenerator {
        ImageGenerator::new(
            Some(&format!("{}/generate", server.uri())),
            Some("gen-key".into()),
        )
        .expect("generator creation should succeed")
    }

    #[tokio::test]
    async fn test_not_configured() {
        let generator = ImageGenerator::new(None, Some("key".into())).expect("generator");
        assert!(!generator.is_configured());
        assert!(matches!(
            generator.generate("a lake").await,
            Err(GenerationError::NotConfigured)
        ));
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn test_returns_data_uri() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/generate"))
            .and(header("authorization", "Bearer gen-key"))
            .and(body_json(json!({ "prompt": "misty forest" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "media": { "url": "data:image/png;base64,AAAA" }
            })))
            .mount(&server)
            .await;

        let uri = generator_with_mock(&server)
            .generate("misty forest")
            .await
            .expect("generate");
        assert_eq!(uri, "data:image/png;base64,AAAA");
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn test_inlines_media_link() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "media": { "url": format!("{}/media/1.png", server.uri()) }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/media/1.png"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/png")
                    .set_body_bytes(vec![1_u8, 2, 3]),
            )
            .mount(&server)
            .await;

        let uri = generator_with_mock(&server)
            .generate("dunes")
            .await
            .expect("generate");
        assert_eq!(uri, "data:image/png;base64,AQID");
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn test_missing_media_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "media": null })))
            .mount(&server)
            .await;

        let err = generator_with_mock(&server)
            .generate("nothing")
            .await
            .expect_err("no media");
        assert!(matches!(err, GenerationError::NoMedia));
        assert_eq!(err.to_string(), "No image was generated");
    }
}
