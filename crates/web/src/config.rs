//! Application configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BOOKSHELF_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `BOOKSHELF_HOST` - Bind address (default: 127.0.0.1)
//! - `BOOKSHELF_PORT` - Listen port (default: 8000)
//! - `BOOKSHELF_BASE_URL` - Public URL (default: `http://localhost:8000`)
//! - `BOOKSHELF_MEDIA_ROOT` - Directory for uploaded covers (default: media)
//! - `BOOKSHELF_STATIC_DIR` - Directory served under `/static` (default: crates/web/static)
//! - `BOOKSHELF_PAGE_CACHE_SECONDS` - Lifetime of cached public pages, 0 disables (default: 600)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Bookshelf application configuration.
///
/// Assembled once at startup and handed to [`crate::state::AppState`].
#[derive(Debug, Clone)]
pub struct Config {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the site
    pub base_url: String,
    /// Root directory for uploaded media (book covers)
    pub media_root: PathBuf,
    /// Directory with CSS and other static assets
    pub static_dir: PathBuf,
    /// How long anonymous responses for public pages are cached
    pub page_cache_ttl: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("BOOKSHELF_DATABASE_URL")?;
        let host = get_env_or_default("BOOKSHELF_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("BOOKSHELF_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("BOOKSHELF_PORT", "8000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("BOOKSHELF_PORT".to_string(), e.to_string()))?;
        let base_url = get_env_or_default("BOOKSHELF_BASE_URL", "http://localhost:8000");
        validate_base_url(&base_url)?;
        let page_cache_seconds = get_env_or_default("BOOKSHELF_PAGE_CACHE_SECONDS", "600")
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("BOOKSHELF_PAGE_CACHE_SECONDS".to_string(), e.to_string())
            })?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url: base_url.trim_end_matches('/').to_string(),
            media_root: PathBuf::from(get_env_or_default("BOOKSHELF_MEDIA_ROOT", "media")),
            static_dir: PathBuf::from(get_env_or_default(
                "BOOKSHELF_STATIC_DIR",
                "crates/web/static",
            )),
            page_cache_ttl: Duration::from_secs(page_cache_seconds),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Configuration for tests and local tooling that never touches the network.
    #[must_use]
    pub fn for_testing(media_root: PathBuf) -> Self {
        Self {
            database_url: SecretString::from("postgres://localhost/bookshelf_test"),
            host: IpAddr::from([127, 0, 0, 1]),
            port: 8000,
            base_url: "http://localhost:8000".to_string(),
            media_root,
            static_dir: PathBuf::from("static"),
            page_cache_ttl: Duration::from_secs(60),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether session cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn validate_base_url(base_url: &str) -> Result<(), ConfigError> {
    if base_url.starts_with("http://") || base_url.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidEnvVar(
            "BOOKSHELF_BASE_URL".to_string(),
            "must start with http:// or https://".to_string(),
        ))
    }
}
