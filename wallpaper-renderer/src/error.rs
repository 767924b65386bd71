//! Renderer error types.

use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur while decoding, filtering or exporting.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Resource loading failed.
    #[error("Failed to load resource: {0}")]
    Resource(String),

    /// Image bytes could not be decoded.
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// Pixels could not be encoded.
    #[error("Failed to encode image: {0}")]
    Encode(String),

    /// Scene export failed.
    #[error("Export failed: {0}")]
    Export(String),
}

impl From<wallpaper_core::CanvasError> for RenderError {
    fn from(e: wallpaper_core::CanvasError) -> Self {
        Self::Resource(e.to_string())
    }
}
