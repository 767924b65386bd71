//! Error types for editing operations.

use thiserror::Error;

/// Result type for editing operations.
pub type CanvasResult<T> = Result<T, CanvasError>;

/// Errors that can occur in editing operations.
#[derive(Debug, Error)]
pub enum CanvasError {
    /// Object not found in scene.
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    /// An edit action needs a selected object.
    #[error("No object selected")]
    NoSelection,

    /// Filters only apply to image objects.
    #[error("Filters can only be applied to images, not {0}")]
    NotFilterable(&'static str),

    /// The active object cannot be flipped.
    #[error("A {0} cannot be flipped")]
    NotFlippable(&'static str),

    /// Color is not a `#rgb` or `#rrggbb` hex string.
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    /// Uploaded file type is not an accepted image type.
    #[error("Unsupported file type: {0}. Please upload a JPEG, PNG or WebP image")]
    UnsupportedUpload(String),

    /// Uploaded file is empty.
    #[error("Uploaded file is empty")]
    EmptyUpload,

    /// Uploaded file exceeds the size limit.
    #[error("Uploaded file is too large ({size} bytes, max {max})")]
    UploadTooLarge {
        /// Size of the upload in bytes.
        size: usize,
        /// Maximum accepted size in bytes.
        max: usize,
    },

    /// Uploaded bytes do not match the declared image type.
    #[error("File contents do not match declared type {0}")]
    UploadMismatch(String),

    /// Uploaded or generated image could not be read.
    #[error("Could not read image: {0}")]
    UnreadableImage(String),

    /// Search requires a non-empty query.
    #[error("Please enter a search term")]
    EmptyQuery,

    /// Surface size is not finite or outside the accepted range.
    #[error("Surface must be between 1 and 8192 pixels per side, got {width}x{height}")]
    InvalidSurface {
        /// Requested width.
        width: f32,
        /// Requested height.
        height: f32,
    },

    /// Invalid operation for the current session state.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Operation on a session that has been torn down.
    #[error("Editing session is closed")]
    SessionClosed,

    /// Session not present in the store.
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Store refuses new sessions beyond its limit.
    #[error("Too many active sessions (max {0})")]
    SessionLimit(usize),

    /// Scene serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CanvasError {
    /// Whether this error stems from user input and should be shown as a
    /// dismissable notice rather than treated as a failure of the session.
    #[must_use]
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::NoSelection
                | Self::NotFilterable(_)
                | Self::NotFlippable(_)
                | Self::InvalidColor(_)
                | Self::UnsupportedUpload(_)
                | Self::EmptyUpload
                | Self::UploadTooLarge { .. }
                | Self::UploadMismatch(_)
                | Self::UnreadableImage(_)
                | Self::EmptyQuery
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_user_facing() {
        assert!(CanvasError::NoSelection.is_user_facing());
        assert!(CanvasError::EmptyQuery.is_user_facing());
        assert!(CanvasError::UnsupportedUpload("text/plain".into()).is_user_facing());
        assert!(!CanvasError::SessionClosed.is_user_facing());
        assert!(!CanvasError::SessionNotFound("x".into()).is_user_facing());
    }

    #[test]
    fn upload_message_names_accepted_types() {
        let msg = CanvasError::UnsupportedUpload("text/plain".into()).to_string();
        assert!(msg.contains("text/plain"));
        assert!(msg.contains("WebP"));
    }
}
