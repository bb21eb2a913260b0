//! Shared harness for the router tests.
//!
//! Builds the full application over [`InMemoryStore`] and a
//! `tower_sessions::MemoryStore`, and drives it with `oneshot`.

#![allow(dead_code, clippy::unwrap_used)]

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use http_body_util::BodyExt;
use image::{ImageFormat, RgbaImage};
use tempfile::TempDir;
use tower::ServiceExt;
use tower_sessions::MemoryStore;

use bookshelf_core::{BookId, Permission, ReviewText};
use bookshelf_web::config::Config;
use bookshelf_web::db::{CatalogRepository, InMemoryStore};
use bookshelf_web::models::{Book, BookInput, Review, User};
use bookshelf_web::routes;
use bookshelf_web::state::AppState;

pub const PASSWORD: &str = "correct horse battery";

/// The application plus direct access to its state for setup and assertions.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    media: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self::with_catalog(store.clone(), store)
    }

    /// Build the application over a custom catalog, e.g. one that fails writes.
    pub fn with_catalog(
        catalog: Arc<dyn CatalogRepository>,
        accounts: Arc<InMemoryStore>,
    ) -> Self {
        let media = TempDir::new().unwrap();
        let config = Config::for_testing(media.path().to_path_buf());
        let state = AppState::new(config, catalog, accounts);
        let router = routes::app(state.clone(), MemoryStore::default());

        Self {
            router,
            state,
            media,
        }
    }

    pub fn media_root(&self) -> &Path {
        self.media.path()
    }

    /// Number of files stored below `covers/`.
    pub fn stored_covers(&self) -> usize {
        std::fs::read_dir(self.media.path().join("covers")).map_or(0, Iterator::count)
    }

    pub fn catalog(&self) -> &dyn CatalogRepository {
        self.state.catalog()
    }

    pub async fn user(&self, email: &str) -> User {
        self.state
            .auth()
            .register(email, None, PASSWORD, false)
            .await
            .unwrap()
    }

    pub async fn staff(&self, email: &str) -> User {
        self.state
            .auth()
            .register(email, None, PASSWORD, true)
            .await
            .unwrap()
    }

    /// A user holding `books.special_status`.
    pub async fn reader(&self, email: &str) -> User {
        let user = self.user(email).await;
        self.state
            .auth()
            .grant_permission(email, Permission::SpecialStatus)
            .await
            .unwrap();
        user
    }

    pub async fn book(&self, title: &str, author: &str, price: &str) -> Book {
        let input = BookInput::parse(title, author, price).unwrap();
        self.catalog().create_book(&input, None).await.unwrap()
    }

    pub async fn review(&self, book: &Book, author: &User, text: &str) -> Review {
        let text = ReviewText::parse(text).unwrap();
        self.catalog()
            .create_review(book.id, author.id, &text)
            .await
            .unwrap()
    }

    pub async fn reviews(&self, book_id: BookId) -> Vec<Review> {
        self.catalog().list_reviews(book_id).await.unwrap()
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, path: &str, cookie: Option<&str>) -> Response<Body> {
        self.send(request("GET", path, cookie).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_form(
        &self,
        path: &str,
        fields: &[(&str, &str)],
        cookie: Option<&str>,
    ) -> Response<Body> {
        let body = Body::from(encode(fields));
        self.send(form_request(path, cookie).body(body).unwrap())
            .await
    }

    /// POST a form the way HTMX does, with `HX-Request: true`.
    pub async fn post_htmx(
        &self,
        path: &str,
        fields: &[(&str, &str)],
        cookie: Option<&str>,
    ) -> Response<Body> {
        self.send(
            form_request(path, cookie)
                .header("hx-request", "true")
                .body(Body::from(encode(fields)))
                .unwrap(),
        )
        .await
    }

    /// Log in through the login form and return the session cookie.
    pub async fn login(&self, email: &str) -> String {
        let response = self
            .post_form(
                "/accounts/login/",
                &[("email", email), ("password", PASSWORD)],
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        session_cookie(&response)
    }
}

fn request(method: &str, path: &str, cookie: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(path);
    match cookie {
        Some(cookie) => builder.header(header::COOKIE, cookie),
        None => builder,
    }
}

fn form_request(path: &str, cookie: Option<&str>) -> axum::http::request::Builder {
    request("POST", path, cookie).header(
        header::CONTENT_TYPE,
        "application/x-www-form-urlencoded",
    )
}

pub fn encode(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// `name=value` of the session cookie set on a response.
pub fn session_cookie(response: &Response<Body>) -> String {
    let set_cookie = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("bookshelf_session="))
        .unwrap();
    set_cookie.split(';').next().unwrap().to_owned()
}

pub fn location(response: &Response<Body>) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// A small, valid PNG.
pub fn png_bytes() -> Vec<u8> {
    let mut bytes = Cursor::new(Vec::new());
    RgbaImage::new(4, 4)
        .write_to(&mut bytes, ImageFormat::Png)
        .unwrap();
    bytes.into_inner()
}
