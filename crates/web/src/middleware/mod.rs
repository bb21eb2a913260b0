//! HTTP middleware and request extractors.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions)
//! 5. Security headers (CSP, frame options, etc.)
//! 6. Page cache (public pages only, see [`page_cache`])
//!
//! # Request pipeline
//!
//! Handlers compose the named stages as extractors:
//! authenticate ([`RequireAuth`]) → authorize ([`RequirePermission`],
//! [`RequireStaff`]) → parse-and-validate (forms, ids) → execute
//! (repository call) → render (chosen by [`ResponseMode`]).

pub mod auth;
pub mod flash;
pub mod page_cache;
pub mod request_id;
pub mod response_mode;
pub mod security_headers;
pub mod session;

pub use auth::{
    AuthRejection, CanReadAllBooks, RequireAuth, RequirePermission, RequireStaff,
    RequiredPermission, clear_current_user, set_current_user,
};
pub use flash::{PageContext, push_flash, take_flashes};
pub use page_cache::{PageCache, page_cache_middleware};
pub use request_id::request_id_middleware;
pub use response_mode::ResponseMode;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
