//! Health check endpoints.
//!
//! - `/health/live` - Liveness probe
//! - `/health/ready` - Readiness probe
//! - `/health` - Same as readiness

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::AppState;

/// Health status response.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    /// Overall status: "healthy" or "unhealthy"
    pub status: &'static str,
    /// Server version
    pub version: &'static str,
    /// Individual component checks
    pub checks: HealthChecks,
}

/// Individual health checks.
#[derive(Debug, Serialize)]
pub struct HealthChecks {
    /// Session store accessible and below its limit
    pub session_store: bool,
    /// Photo API key configured
    pub photo_api_key: bool,
    /// Image generation configured
    pub generation: bool,
}

impl HealthChecks {
    /// The editor works without upstream credentials, so only the session
    /// store gates readiness.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.session_store
    }
}

/// Liveness probe - is the server running?
#[tracing::instrument(name = "liveness_probe")]
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// Readiness probe - is the server ready to accept traffic?
#[tracing::instrument(name = "readiness_probe", skip(state))]
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    let checks = HealthChecks {
        session_store: state.sessions.count() < state.sessions.max_sessions(),
        photo_api_key: state.photos.has_api_key(),
        generation: state.generator.is_configured(),
    };
    let ready = checks.is_ready();

    let status = HealthStatus {
        status: if ready { "healthy" } else { "unhealthy" },
        version: env!("CARGO_PKG_VERSION"),
        checks,
    };

    let code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (code, Json(status))
}
