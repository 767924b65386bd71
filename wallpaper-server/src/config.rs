//! Server configuration from command-line flags and environment.

use std::time::Duration;

use clap::Parser;
use thiserror::Error;

use crate::generate::GenerationError;
use crate::photos::PhotoApiError;

/// Default port for the wallpaper server.
pub const DEFAULT_PORT: u16 = 9474;

/// Default photo API base URL.
pub const DEFAULT_PEXELS_BASE_URL: &str = "https://api.pexels.com/v1";

/// Default idle timeout for editing sessions, in seconds.
pub const DEFAULT_SESSION_IDLE_SECS: u64 = wallpaper_core::DEFAULT_IDLE_TIMEOUT.as_secs();

/// Command-line arguments for the wallpaper server.
#[derive(Debug, Clone, Parser)]
#[command(name = "wallpaper-studio")]
#[command(about = "Wallpaper discovery, generation and editing server")]
#[command(version)]
pub struct ServerConfig {
    /// Port to bind on localhost
    #[arg(long, env = "WALLPAPER_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// API key for the photo service
    #[arg(long, env = "PEXELS_API_KEY", hide_env_values = true)]
    pub pexels_api_key: Option<String>,

    /// Photo service base URL
    #[arg(long, env = "PEXELS_BASE_URL", default_value = DEFAULT_PEXELS_BASE_URL)]
    pub pexels_base_url: String,

    /// Image generation endpoint (e.g., <https://generation.example/v1/images>)
    #[arg(long, env = "GENERATION_URL")]
    pub generation_url: Option<String>,

    /// API key for the image generation service
    #[arg(long, env = "GENERATION_API_KEY", hide_env_values = true)]
    pub generation_api_key: Option<String>,

    /// Maximum concurrently open editing sessions
    #[arg(long, env = "WALLPAPER_MAX_SESSIONS", default_value_t = wallpaper_core::store::DEFAULT_MAX_SESSIONS)]
    pub max_sessions: usize,

    /// Seconds an editing session may sit unused before it is evicted (0 disables)
    #[arg(long, env = "WALLPAPER_SESSION_IDLE_SECS", default_value_t = DEFAULT_SESSION_IDLE_SECS)]
    pub session_idle_secs: u64,
}

impl ServerConfig {
    /// Photo API key, treating blank values as unset.
    #[must_use]
    pub fn photo_api_key(&self) -> Option<&str> {
        non_blank(self.pexels_api_key.as_deref())
    }

    /// Generation API key, treating blank values as unset.
    #[must_use]
    pub fn generation_api_key(&self) -> Option<&str> {
        non_blank(self.generation_api_key.as_deref())
    }

    /// Session idle timeout; `None` when eviction is disabled.
    #[must_use]
    pub fn session_idle_timeout(&self) -> Option<Duration> {
        (self.session_idle_secs > 0).then(|| Duration::from_secs(self.session_idle_secs))
    }
}

/// Invalid startup configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Photo client could not be built.
    #[error("photo API configuration: {0}")]
    Photo(#[from] PhotoApiError),
    /// Generation client could not be built.
    #[error("generation configuration: {0}")]
    Generation(#[from] GenerationError),
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
