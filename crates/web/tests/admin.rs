//! Staff-only catalog management.

#![allow(clippy::unwrap_used)]

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};

use bookshelf_core::{BookId, ReviewId, ReviewText, UserId};
use bookshelf_web::db::{CatalogRepository, CoverUpdate, InMemoryStore, RepositoryError};
use bookshelf_web::models::{Book, BookInput, Review};

use common::{TestApp, body_string, location, png_bytes};

const BOUNDARY: &str = "bookshelf-test-boundary";

/// A multipart body with text fields and an optional `cover` file.
fn multipart_body(fields: &[(&str, &str)], cover: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((content_type, bytes)) = cover {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"cover\"; \
                 filename=\"cover\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn multipart_request(path: &str, cookie: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header(header::COOKIE, cookie)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_admin_redirects_anonymous_to_login() {
    let app = TestApp::new();

    let response = app.get("/admin/books/", None).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("/accounts/login/"));
}

#[tokio::test]
async fn test_admin_forbidden_for_non_staff() {
    let app = TestApp::new();
    app.reader("reader@example.com").await;
    let book = app.book("Harry Potter", "JK Rowling", "25.00").await;
    let cookie = app.login("reader@example.com").await;

    let list = app.get("/admin/books/", Some(&cookie)).await;
    assert_eq!(list.status(), StatusCode::FORBIDDEN);

    let delete = app
        .post_form(&format!("{}delete/", book.admin_url()), &[], Some(&cookie))
        .await;
    assert_eq!(delete.status(), StatusCode::FORBIDDEN);
    assert!(app.catalog().get_book(book.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_staff_sees_book_table() {
    let app = TestApp::new();
    app.staff("staff@example.com").await;
    app.book("Harry Potter", "JK Rowling", "25.00").await;
    let cookie = app.login("staff@example.com").await;

    let response = app.get("/admin/books/", Some(&cookie)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("Harry Potter"));
    assert!(body.contains("JK Rowling"));
    assert!(body.contains("25.00"));
}

#[tokio::test]
async fn test_staff_creates_book_with_cover() {
    let app = TestApp::new();
    app.staff("staff@example.com").await;
    let cookie = app.login("staff@example.com").await;

    let body = multipart_body(
        &[("title", "Dune"), ("author", "Frank Herbert"), ("price", "9.5")],
        Some(("image/png", png_bytes().as_slice())),
    );
    let response = app
        .send(multipart_request("/admin/books/new/", &cookie, body))
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin/books/");

    let books = app.catalog().list_books().await.unwrap();
    assert_eq!(books.len(), 1);
    let book = &books[0];
    assert_eq!(book.title, "Dune");
    assert_eq!(book.price.to_string(), "9.50");
    let cover = book.cover.as_deref().unwrap();
    assert!(cover.starts_with("covers/") && cover.ends_with(".png"));
    assert!(app.media_root().join(cover).exists());

    let listing = body_string(app.get("/admin/books/", Some(&cookie)).await).await;
    assert!(listing.contains("was added successfully"));
}

#[tokio::test]
async fn test_invalid_book_form_rerenders_with_errors() {
    let app = TestApp::new();
    app.staff("staff@example.com").await;
    let cookie = app.login("staff@example.com").await;

    let body = multipart_body(
        &[("title", ""), ("author", "Frank Herbert"), ("price", "1.234")],
        None,
    );
    let response = app
        .send(multipart_request("/admin/books/new/", &cookie, body))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let page = body_string(response).await;
    assert!(page.contains("errorlist"));
    assert!(page.contains("Frank Herbert"));
    assert!(app.catalog().list_books().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unsupported_cover_type_is_rejected() {
    let app = TestApp::new();
    app.staff("staff@example.com").await;
    let cookie = app.login("staff@example.com").await;

    let body = multipart_body(
        &[("title", "Dune"), ("author", "Frank Herbert"), ("price", "9.50")],
        Some(("application/pdf", b"%PDF-1.7".as_slice())),
    );
    let response = app
        .send(multipart_request("/admin/books/new/", &cookie, body))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("Upload a valid image"));
    assert!(app.catalog().list_books().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_markup_labelled_as_image_is_rejected() {
    let app = TestApp::new();
    app.staff("staff@example.com").await;
    let cookie = app.login("staff@example.com").await;

    let body = multipart_body(
        &[("title", "Dune"), ("author", "Frank Herbert"), ("price", "9.50")],
        Some((
            "image/png",
            b"<script>alert(1)</script> not an image".as_slice(),
        )),
    );
    let response = app
        .send(multipart_request("/admin/books/new/", &cookie, body))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("Upload a valid image"));
    assert!(app.catalog().list_books().await.unwrap().is_empty());
    assert_eq!(app.stored_covers(), 0);
}

/// Catalog whose book writes always fail.
struct FailingWrites(Arc<InMemoryStore>);

#[async_trait]
impl CatalogRepository for FailingWrites {
    async fn ping(&self) -> Result<(), RepositoryError> {
        self.0.ping().await
    }

    async fn list_books(&self) -> Result<Vec<Book>, RepositoryError> {
        self.0.list_books().await
    }

    async fn search_books(&self, query: &str) -> Result<Vec<Book>, RepositoryError> {
        self.0.search_books(query).await
    }

    async fn get_book(&self, id: BookId) -> Result<Option<Book>, RepositoryError> {
        self.0.get_book(id).await
    }

    async fn create_book(
        &self,
        _input: &BookInput,
        _cover: Option<&str>,
    ) -> Result<Book, RepositoryError> {
        Err(RepositoryError::DataCorruption("write failed".to_owned()))
    }

    async fn update_book(
        &self,
        _id: BookId,
        _input: &BookInput,
        _cover: CoverUpdate,
    ) -> Result<Book, RepositoryError> {
        Err(RepositoryError::DataCorruption("write failed".to_owned()))
    }

    async fn delete_book(&self, id: BookId) -> Result<Option<Book>, RepositoryError> {
        self.0.delete_book(id).await
    }

    async fn list_reviews(&self, book_id: BookId) -> Result<Vec<Review>, RepositoryError> {
        self.0.list_reviews(book_id).await
    }

    async fn get_review(&self, id: ReviewId) -> Result<Option<Review>, RepositoryError> {
        self.0.get_review(id).await
    }

    async fn create_review(
        &self,
        book_id: BookId,
        author_id: UserId,
        text: &ReviewText,
    ) -> Result<Review, RepositoryError> {
        self.0.create_review(book_id, author_id, text).await
    }

    async fn update_review(
        &self,
        id: ReviewId,
        text: &ReviewText,
    ) -> Result<Review, RepositoryError> {
        self.0.update_review(id, text).await
    }

    async fn delete_review(&self, id: ReviewId) -> Result<bool, RepositoryError> {
        self.0.delete_review(id).await
    }
}

#[tokio::test]
async fn test_failed_write_discards_uploaded_cover() {
    let store = Arc::new(InMemoryStore::new());
    let app = TestApp::with_catalog(Arc::new(FailingWrites(store.clone())), store.clone());
    app.staff("staff@example.com").await;
    let input = BookInput::parse("Dune", "Frank Herbert", "9.50").unwrap();
    let book = store.create_book(&input, None).await.unwrap();
    let cookie = app.login("staff@example.com").await;
    let fields = [("title", "Dune"), ("author", "Frank Herbert"), ("price", "9.50")];

    let created = app
        .send(multipart_request(
            "/admin/books/new/",
            &cookie,
            multipart_body(&fields, Some(("image/png", png_bytes().as_slice()))),
        ))
        .await;
    assert_eq!(created.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(app.stored_covers(), 0);

    let updated = app
        .send(multipart_request(
            &book.admin_url(),
            &cookie,
            multipart_body(&fields, Some(("image/png", png_bytes().as_slice()))),
        ))
        .await;
    assert_eq!(updated.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(app.stored_covers(), 0);
    assert!(store.get_book(book.id).await.unwrap().unwrap().cover.is_none());
}

#[tokio::test]
async fn test_staff_updates_book() {
    let app = TestApp::new();
    app.staff("staff@example.com").await;
    let book = app.book("Dune", "Frank Herbert", "9.50").await;
    let cookie = app.login("staff@example.com").await;

    let body = multipart_body(
        &[("title", "Dune Messiah"), ("author", "Frank Herbert"), ("price", "11")],
        None,
    );
    let response = app
        .send(multipart_request(&book.admin_url(), &cookie, body))
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let updated = app.catalog().get_book(book.id).await.unwrap().unwrap();
    assert_eq!(updated.title, "Dune Messiah");
    assert_eq!(updated.price.to_string(), "11.00");
}

#[tokio::test]
async fn test_staff_deletes_book_and_its_reviews() {
    let app = TestApp::new();
    app.staff("staff@example.com").await;
    let reader = app.reader("reader@example.com").await;
    let book = app.book("Harry Potter", "JK Rowling", "25.00").await;
    let review = app.review(&book, &reader, "Magical").await;
    let cookie = app.login("staff@example.com").await;

    let response = app
        .post_form(&format!("{}delete/", book.admin_url()), &[], Some(&cookie))
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(app.catalog().get_book(book.id).await.unwrap().is_none());
    assert!(app.catalog().get_review(review.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_staff_manages_reviews_inline() {
    let app = TestApp::new();
    app.staff("staff@example.com").await;
    app.reader("reader@example.com").await;
    let book = app.book("Harry Potter", "JK Rowling", "25.00").await;
    let cookie = app.login("staff@example.com").await;

    let added = app
        .post_form(
            &format!("{}reviews/", book.admin_url()),
            &[("email", "reader@example.com"), ("review", "Added by staff")],
            Some(&cookie),
        )
        .await;
    assert_eq!(added.status(), StatusCode::SEE_OTHER);
    let reviews = app.reviews(book.id).await;
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0].author_username, "reader");

    let review_id = reviews[0].id;
    let updated = app
        .post_form(
            &format!("/admin/reviews/{review_id}/"),
            &[("review", "Edited by staff")],
            Some(&cookie),
        )
        .await;
    assert_eq!(updated.status(), StatusCode::SEE_OTHER);
    assert_eq!(app.reviews(book.id).await[0].review, "Edited by staff");

    let edit_page = body_string(app.get(&book.admin_url(), Some(&cookie)).await).await;
    assert!(edit_page.contains("Edited by staff"));

    let deleted = app
        .post_form(
            &format!("/admin/reviews/{review_id}/delete/"),
            &[],
            Some(&cookie),
        )
        .await;
    assert_eq!(deleted.status(), StatusCode::SEE_OTHER);
    assert!(app.reviews(book.id).await.is_empty());
}
