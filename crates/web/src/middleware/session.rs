//! Session middleware configuration.

use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};

use crate::config::Config;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "bookshelf_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Create the session layer around a store.
///
/// Production passes a `PostgresStore`; tests pass a `MemoryStore`.
///
/// # Arguments
///
/// * `store` - Session store
/// * `config` - Application configuration (decides the `Secure` flag)
#[must_use]
pub fn create_session_layer<S: SessionStore + Clone>(
    store: S,
    config: &Config,
) -> SessionManagerLayer<S> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
