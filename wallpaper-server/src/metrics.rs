//! Prometheus metrics for wallpaper-server.
//!
//! Provides metrics collection and a Prometheus-compatible `/metrics` endpoint.

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

const UPSTREAM_REQUESTS_TOTAL: &str = "wallpaper_upstream_requests_total";
const GENERATIONS_TOTAL: &str = "wallpaper_generations_total";
const EDITOR_ACTIONS_TOTAL: &str = "wallpaper_editor_actions_total";
const SESSIONS_ACTIVE: &str = "wallpaper_sessions_active";
const VALIDATION_FAILURES_TOTAL: &str = "wallpaper_validation_failures_total";

/// Initialize metrics and return the Prometheus handle.
///
/// # Errors
///
/// Returns an error if the Prometheus recorder cannot be installed
/// (e.g., if another recorder is already installed).
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Record a request forwarded to the photo API.
///
/// # Arguments
///
/// * `endpoint` - "curated", "search" or "photo"
/// * `status` - Upstream status code, or 0 when the request never completed
pub fn record_upstream_request(endpoint: &str, status: u16) {
    counter!(
        UPSTREAM_REQUESTS_TOTAL,
        "endpoint" => endpoint.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record an image generation attempt.
pub fn record_generation(success: bool) {
    counter!(GENERATIONS_TOTAL, "success" => success.to_string()).increment(1);
}

/// Record an editor action.
///
/// # Arguments
///
/// * `action` - Action name (e.g., "add_text", "apply_filter", "upload")
/// * `success` - Whether the action succeeded
pub fn record_editor_action(action: &str, success: bool) {
    counter!(
        EDITOR_ACTIONS_TOTAL,
        "action" => action.to_string(),
        "success" => success.to_string()
    )
    .increment(1);
}

/// Update the number of open editing sessions.
#[allow(clippy::cast_precision_loss)]
pub fn set_active_sessions(count: usize) {
    gauge!(SESSIONS_ACTIVE).set(count as f64);
}

/// Record an input validation failure.
///
/// # Arguments
///
/// * `validation_type` - Type of validation that failed (query, prompt, upload, ...)
pub fn record_validation_failure(validation_type: &str) {
    counter!(
        VALIDATION_FAILURES_TOTAL,
        "type" => validation_type.to_string()
    )
    .increment(1);
}
