//! HTTP error type shared by all API handlers.
//!
//! Every failure is rendered as `{"error", "status", "details"}` JSON.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use wallpaper_core::CanvasError;
use wallpaper_renderer::RenderError;

use crate::generate::GenerationError;
use crate::metrics as server_metrics;
use crate::photos::PhotoApiError;
use crate::validation::ValidationError;

/// Upstream bodies are cut to this many characters in `details`.
pub const MAX_DETAILS_CHARS: usize = 500;

/// Errors returned by API handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request parameters.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Photo API failure or misconfiguration.
    #[error(transparent)]
    Photo(#[from] PhotoApiError),
    /// Image generation failure or misconfiguration.
    #[error(transparent)]
    Generation(#[from] GenerationError),
    /// Editing session error.
    #[error(transparent)]
    Editor(#[from] CanvasError),
    /// Export failure.
    #[error(transparent)]
    Render(#[from] RenderError),
    /// Malformed request body.
    #[error("{0}")]
    BadRequest(String),
    /// Path, query or body rejected by an extractor.
    #[error("{message}")]
    Rejected {
        /// Status chosen by the extractor.
        status: StatusCode,
        /// Extractor message.
        message: String,
    },
    /// Referenced resource does not exist.
    #[error("{0}")]
    NotFound(String),
    /// Unexpected server failure.
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// JSON body of an error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Human-readable message.
    pub error: String,
    /// HTTP status code.
    pub status: u16,
    /// Extra context, such as the upstream response body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Photo(err) => match err {
                PhotoApiError::MissingApiKey | PhotoApiError::InvalidUrl(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                PhotoApiError::Http(_) => StatusCode::BAD_GATEWAY,
                PhotoApiError::Upstream { status, .. } => *status,
            },
            Self::Generation(err) => match err {
                GenerationError::NotConfigured | GenerationError::InvalidUrl(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                GenerationError::Http(_) | GenerationError::NoMedia => StatusCode::BAD_GATEWAY,
                GenerationError::Upstream { status, .. } => *status,
            },
            Self::Editor(err) => match err {
                err if err.is_user_facing() => StatusCode::UNPROCESSABLE_ENTITY,
                CanvasError::SessionNotFound(_) | CanvasError::ObjectNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                CanvasError::SessionClosed => StatusCode::GONE,
                CanvasError::SessionLimit(_) => StatusCode::SERVICE_UNAVAILABLE,
                CanvasError::InvalidOperation(_)
                | CanvasError::InvalidSurface { .. }
                | CanvasError::Serialization(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Render(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Rejected { status, .. } => *status,
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            Self::Photo(PhotoApiError::Upstream { body, .. })
            | Self::Generation(GenerationError::Upstream { body, .. }) => {
                Some(truncate_details(body))
            }
            Self::Photo(PhotoApiError::Http(err)) | Self::Generation(GenerationError::Http(err)) => {
                Some(truncate_details(&err.to_string()))
            }
            _ => None,
        }
    }

    fn validation_kind(&self) -> Option<&'static str> {
        match self {
            Self::Validation(err) => Some(err.kind()),
            Self::Rejected { .. } => Some("request"),
            Self::Editor(err) if err.is_user_facing() => Some("editor"),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let Some(kind) = self.validation_kind() {
            server_metrics::record_validation_failure(kind);
        }
        if status.is_server_error() {
            tracing::warn!(%status, "Request failed: {self}");
        } else {
            tracing::debug!(%status, "Request rejected: {self}");
        }

        let body = ErrorBody {
            error: self.to_string(),
            status: status.as_u16(),
            details: self.details(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

/// Keep at most [`MAX_DETAILS_CHARS`] characters.
#[must_use]
pub fn truncate_details(text: &str) -> String {
    text.chars().take(MAX_DETAILS_CHARS).collect()
}
