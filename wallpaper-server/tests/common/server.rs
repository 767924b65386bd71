//! Test server harness for integration tests.
//!
//! Spins up the real API router on a random port, pointed at mocked
//! upstream photo and generation services.

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use wallpaper_core::SessionStore;
use wallpaper_server::{router, AppState, ImageGenerator, PhotoClient};

/// Upstream configuration for a test server.
#[derive(Debug, Clone, Default)]
pub struct Upstreams {
    /// Photo API base URL.
    pub photo_base_url: Option<String>,
    /// Photo API key.
    pub photo_api_key: Option<String>,
    /// Generation endpoint.
    pub generation_url: Option<String>,
    /// Generation API key.
    pub generation_api_key: Option<String>,
    /// Session limit (default 256).
    pub max_sessions: Option<usize>,
}

/// A test server instance with control handles.
pub struct TestServer {
    addr: SocketAddr,
    sessions: SessionStore,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a server with no upstream credentials.
    #[allow(dead_code)]
    pub async fn start() -> Self {
        Self::start_with(Upstreams::default()).await
    }

    /// Start a new test server on a random available port.
    ///
    /// # Panics
    ///
    /// Panics if no port is available or server fails to bind.
    pub async fn start_with(upstreams: Upstreams) -> Self {
        let port = portpicker::pick_unused_port().expect("no available port");
        let addr = SocketAddr::from(([127, 0, 0, 1], port));

        let photo_base = upstreams
            .photo_base_url
            .unwrap_or_else(|| "https://api.pexels.com/v1".to_string());
        let sessions = SessionStore::with_max_sessions(upstreams.max_sessions.unwrap_or(256));
        let state = AppState {
            photos: PhotoClient::new(photo_base, upstreams.photo_api_key)
                .expect("photo client"),
            generator: ImageGenerator::new(
                upstreams.generation_url.as_deref(),
                upstreams.generation_api_key,
            )
            .expect("generator"),
            sessions: sessions.clone(),
        };
        let app = router(state);

        let listener = TcpListener::bind(addr).await.expect("failed to bind");
        let actual_addr = listener.local_addr().expect("failed to get local addr");

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("server error");
        });

        // Give the server a moment to start
        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;

        Self {
            addr: actual_addr,
            sessions,
            shutdown_tx: Some(shutdown_tx),
            handle,
        }
    }

    /// Get the server's socket address.
    #[allow(dead_code)]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Absolute URL for `path`.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Session store behind the server (for test assertions).
    #[allow(dead_code)]
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Gracefully shut down the server.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        let _ = tokio::time::timeout(tokio::time::Duration::from_secs(5), self.handle).await;
    }
}
