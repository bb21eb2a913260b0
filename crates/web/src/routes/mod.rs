//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                               - Home page (cached)
//! GET  /about/                         - About page (cached)
//! GET  /health                         - Liveness check
//! GET  /health/ready                   - Readiness check (pings the repository)
//!
//! # Books
//! GET  /books/                         - Book list (login)
//! GET  /books/search/?q=               - Search by title or author (public, cached)
//! GET  /books/{id}/                    - Book detail (login + books.special_status)
//! POST /books/{id}/                    - Submit a review (full page or HTMX fragment)
//! POST /books/{id}/delete_review/      - Delete own review (id is the review id)
//! DEL  /books/{id}/delete_review/      - Same, for HTMX
//!
//! # Accounts
//! GET  /accounts/signup/               - Signup page
//! POST /accounts/signup/               - Signup action
//! GET  /accounts/login/                - Login page
//! POST /accounts/login/                - Login action
//! POST /accounts/logout/               - Logout action
//!
//! # Admin (staff)
//! GET  /admin/books/                   - Book table
//! GET  /admin/books/new/               - New book form
//! POST /admin/books/new/               - Create book (multipart)
//! GET  /admin/books/{id}/              - Edit book with inline reviews
//! POST /admin/books/{id}/              - Update book (multipart)
//! POST /admin/books/{id}/delete/       - Delete book and its reviews
//! POST /admin/books/{id}/reviews/      - Add a review inline
//! POST /admin/reviews/{id}/            - Update review text
//! POST /admin/reviews/{id}/delete/     - Delete review
//!
//! # Files
//! GET  /static/*                       - CSS
//! GET  /media/*                        - Uploaded covers
//! ```

pub mod accounts;
pub mod admin;
pub mod books;
pub mod pages;
pub mod search;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::services::ServeDir;
use tower_sessions::SessionStore;

use crate::middleware::{
    create_session_layer, page_cache_middleware, request_id_middleware,
    security_headers_middleware,
};
use crate::services::media::MAX_COVER_BYTES;
use crate::state::AppState;

/// Headroom for the other multipart fields next to a cover upload.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Create the book routes.
pub fn book_routes() -> Router<AppState> {
    Router::new()
        .route("/books/", get(books::book_list))
        .route(
            "/books/{id}/",
            get(books::book_detail).post(books::submit_review),
        )
        .route(
            "/books/{id}/delete_review/",
            post(books::delete_review).delete(books::delete_review),
        )
}

/// Create the public pages served through the page cache.
pub fn cached_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(pages::home))
        .route("/about/", get(pages::about))
        .route("/books/search/", get(search::search_results))
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            page_cache_middleware,
        ))
}

/// Create the account routes.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/accounts/signup/",
            get(accounts::signup_page).post(accounts::signup),
        )
        .route(
            "/accounts/login/",
            get(accounts::login_page).post(accounts::login),
        )
        .route("/accounts/logout/", post(accounts::logout))
}

/// Create the admin routes.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/", get(admin::index))
        .route("/admin/books/", get(admin::books::book_list))
        .route(
            "/admin/books/new/",
            get(admin::books::new_book_page).post(admin::books::create_book),
        )
        .route(
            "/admin/books/{id}/",
            get(admin::books::edit_book_page).post(admin::books::update_book),
        )
        .route("/admin/books/{id}/delete/", post(admin::books::delete_book))
        .route("/admin/books/{id}/reviews/", post(admin::reviews::add_review))
        .route("/admin/reviews/{id}/", post(admin::reviews::update_review))
        .route(
            "/admin/reviews/{id}/delete/",
            post(admin::reviews::delete_review),
        )
        .layer(DefaultBodyLimit::max(MAX_COVER_BYTES + MULTIPART_OVERHEAD_BYTES))
}

/// Build the complete application around a session store.
///
/// Production passes a `PostgresStore`; tests pass a `MemoryStore`. Tracing
/// and Sentry layers are added by the binary.
pub fn app<S>(state: AppState, session_store: S) -> Router
where
    S: SessionStore + Clone,
{
    let session_layer = create_session_layer(session_store, state.config());
    let static_dir = ServeDir::new(&state.config().static_dir);
    let media_dir = ServeDir::new(state.media().root());

    Router::new()
        .merge(cached_routes(state.clone()))
        .route("/health", get(pages::health))
        .route("/health/ready", get(pages::readiness))
        .merge(book_routes())
        .merge(account_routes())
        .merge(admin_routes())
        .nest_service("/static", static_dir)
        .nest_service("/media", media_dir)
        .layer(axum_middleware::from_fn(security_headers_middleware))
        .layer(session_layer)
        .layer(axum_middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// Accept only local redirect targets such as `/books/`.
///
/// Rejects absolute URLs and protocol-relative `//host` paths.
#[must_use]
pub fn safe_next(next: Option<&str>) -> Option<&str> {
    next.filter(|path| {
        path.starts_with('/') && !path.starts_with("//") && !path.starts_with("/\\")
    })
}
