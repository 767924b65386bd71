//! # Wallpaper Studio Server Library
//!
//! HTTP surface of Wallpaper Studio: the photo API proxy, image generation
//! and editing sessions. Used by both the binary and integration tests.

use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use wallpaper_core::SessionStore;

pub mod config;
pub mod editor;
pub mod error;
pub mod extract;
pub mod generate;
pub mod health;
pub mod metrics;
pub mod photos;
pub mod routes;
pub mod validation;

pub use config::{ConfigError, ServerConfig};
pub use error::ApiError;
pub use generate::{GenerationError, ImageGenerator};
pub use photos::{PhotoApiError, PhotoClient};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Photo API client.
    pub photos: PhotoClient,
    /// Image generation client.
    pub generator: ImageGenerator,
    /// Open editing sessions.
    pub sessions: SessionStore,
}

impl AppState {
    /// Build state from server configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured upstream URL is invalid.
    pub fn from_config(config: &ServerConfig) -> Result<Self, ConfigError> {
        let photos = PhotoClient::new(
            &config.pexels_base_url,
            config.photo_api_key().map(String::from),
        )?;
        let generator = ImageGenerator::new(
            config.generation_url.as_deref(),
            config.generation_api_key().map(String::from),
        )?;
        Ok(Self {
            photos,
            generator,
            sessions: SessionStore::with_max_sessions(config.max_sessions)
                .with_idle_timeout(config.session_idle_timeout()),
        })
    }
}

/// Periodically evict idle editing sessions until `shutdown` fires.
///
/// Runs every `period`; the first sweep happens one period after start.
pub fn spawn_session_sweeper(
    sessions: SessionStore,
    period: Duration,
) -> (JoinHandle<()>, oneshot::Sender<()>) {
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = &mut shutdown_rx => {
                    tracing::debug!("session sweeper stopped");
                    break;
                }
                _ = ticker.tick() => {
                    let evicted = sessions.evict_idle();
                    if evicted > 0 {
                        tracing::info!(evicted, open = sessions.count(), "idle sessions evicted");
                        crate::metrics::set_active_sessions(sessions.count());
                    }
                }
            }
        }
    });
    (handle, shutdown_tx)
}

/// Build the API router (health, photos, generation and editor routes).
///
/// Metrics, CORS and tracing layers are added by the binary.
pub fn router(state: AppState) -> Router {
    let upload = Router::new()
        .route("/api/sessions/{id}/image", post(editor::upload_image))
        .layer(DefaultBodyLimit::max(editor::UPLOAD_BODY_LIMIT));

    Router::new()
        // Health
        .route("/health", get(health::readiness))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        // Photo proxy
        .route("/api/photos/curated", get(routes::curated_photos))
        .route("/api/photos/search", get(routes::search_photos))
        .route("/api/photos/{id}", get(routes::get_photo))
        // Generation
        .route("/api/generate", post(routes::generate_image))
        // Editor
        .route("/api/sessions", post(editor::create_session))
        .route(
            "/api/sessions/{id}",
            get(editor::get_session).delete(editor::delete_session),
        )
        .route("/api/sessions/{id}/actions", post(editor::dispatch_action))
        .route(
            "/api/sessions/{id}/data-uri",
            post(editor::add_data_uri).layer(DefaultBodyLimit::max(editor::UPLOAD_BODY_LIMIT * 2)),
        )
        .route(
            "/api/sessions/{id}/notices/{notice_id}",
            delete(editor::dismiss_notice),
        )
        .route("/api/sessions/{id}/export", get(editor::export_session))
        .merge(upload)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    fn test_state() -> AppState {
        AppState {
            photos: PhotoClient::new("https://api.pexels.com/v1", None).expect("photo client"),
            generator: ImageGenerator::new(None, None).expect("generator"),
            sessions: SessionStore::with_max_sessions(4),
        }
    }

    #[test]
    fn test_state_from_config() {
        use clap::Parser;

        let config = ServerConfig::try_parse_from([
            "wallpaper-studio",
            "--pexels-api-key",
            "key",
            "--max-sessions",
            "3",
        ])
        .expect("parse");
        let state = AppState::from_config(&config).expect("state");
        assert!(state.photos.has_api_key());
        assert!(!state.generator.is_configured());
        assert_eq!(state.sessions.max_sessions(), 3);
        assert_eq!(
            state.sessions.idle_timeout(),
            Some(Duration::from_secs(config::DEFAULT_SESSION_IDLE_SECS))
        );
    }

    #[tokio::test]
    async fn test_sweeper_evicts_idle_sessions() {
        let sessions = SessionStore::new().with_idle_timeout(Some(Duration::from_millis(20)));
        let id = sessions.create(10.0, 10.0).expect("create");
        let (handle, shutdown) = spawn_session_sweeper(sessions.clone(), Duration::from_millis(10));

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(!sessions.contains(id));

        let _ = shutdown.send(());
        handle.await.expect("sweeper");
    }

    #[test]
    fn test_state_rejects_bad_generation_url() {
        use clap::Parser;

        let config =
            ServerConfig::try_parse_from(["wallpaper-studio", "--generation-url", "::nope"])
                .expect("parse");
        assert!(AppState::from_config(&config).is_err());
    }

    #[tokio::test]
    async fn test_router_liveness() {
        let response = router(test_state())
            .oneshot(
                Request::builder()
                    .uri("/health/live")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_router_rejects_bad_surface() {
        let response = router(test_state())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/sessions")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"width": 0, "height": 100}"#))
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(body["status"], 400);
    }
}
