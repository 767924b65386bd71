//! Input validation for untrusted request data.
//!
//! Query parameters and bodies are validated here before anything is sent
//! upstream.

use thiserror::Error;

/// Smallest accepted page size.
pub const MIN_PER_PAGE: u32 = 1;
/// Largest page size the photo API accepts.
pub const MAX_PER_PAGE: u32 = 80;
/// Page size used when the caller does not ask for one.
pub const DEFAULT_PER_PAGE: u32 = wallpaper_core::gallery::DEFAULT_PER_PAGE;
/// Maximum generation prompt length in characters.
pub const MAX_PROMPT_LEN: usize = 2000;
/// Maximum search query length in characters.
pub const MAX_QUERY_LEN: usize = 200;

/// Validation error types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Search query is missing or blank.
    #[error("Search query is required")]
    EmptyQuery,
    /// Search query exceeds maximum length.
    #[error("query too long (max {MAX_QUERY_LEN} chars)")]
    QueryTooLong,
    /// Prompt is missing or blank.
    #[error("Prompt is required")]
    EmptyPrompt,
    /// Prompt exceeds maximum length.
    #[error("prompt too long (max {MAX_PROMPT_LEN} chars)")]
    PromptTooLong,
}

impl ValidationError {
    /// Short label used for metrics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EmptyQuery | Self::QueryTooLong => "query",
            Self::EmptyPrompt | Self::PromptTooLong => "prompt",
        }
    }
}

/// Validate a search query, returning it trimmed.
///
/// # Errors
///
/// Returns [`ValidationError::EmptyQuery`] if the query is missing or blank.
/// Returns [`ValidationError::QueryTooLong`] if it exceeds [`MAX_QUERY_LEN`].
pub fn validate_query(query: Option<&str>) -> Result<&str, ValidationError> {
    let query = query.map(str::trim).unwrap_or_default();
    if query.is_empty() {
        return Err(ValidationError::EmptyQuery);
    }
    if query.chars().count() > MAX_QUERY_LEN {
        return Err(ValidationError::QueryTooLong);
    }
    Ok(query)
}

/// Validate a generation prompt, returning it trimmed.
///
/// # Errors
///
/// Returns [`ValidationError::EmptyPrompt`] if the prompt is missing or blank.
/// Returns [`ValidationError::PromptTooLong`] if it exceeds [`MAX_PROMPT_LEN`].
pub fn validate_prompt(prompt: Option<&str>) -> Result<&str, ValidationError> {
    let prompt = prompt.map(str::trim).unwrap_or_default();
    if prompt.is_empty() {
        return Err(ValidationError::EmptyPrompt);
    }
    if prompt.chars().count() > MAX_PROMPT_LEN {
        return Err(ValidationError::PromptTooLong);
    }
    Ok(prompt)
}

/// Clamp a requested page size into `MIN_PER_PAGE..=MAX_PER_PAGE`.
#[must_use]
pub fn clamp_per_page(per_page: Option<u32>) -> u32 {
    per_page
        .unwrap_or(DEFAULT_PER_PAGE)
        .clamp(MIN_PER_PAGE, MAX_PER_PAGE)
}

/// Pages start at 1.
#[must_use]
pub fn clamp_page(page: Option<u32>) -> u32 {
    page.unwrap_or(1).max(1)
}
