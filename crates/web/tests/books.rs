//! Book list, detail and review submission through the full router.

#![allow(clippy::unwrap_used)]

mod common;

use axum::http::StatusCode;

use common::{TestApp, body_string, location};

#[tokio::test]
async fn test_book_list_redirects_anonymous_to_login() {
    let app = TestApp::new();

    let response = app.get("/books/", None).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/accounts/login/?next=%2Fbooks%2F");
}

#[tokio::test]
async fn test_book_list_shows_books_ordered_by_title() {
    let app = TestApp::new();
    app.user("reader@example.com").await;
    app.book("Zen and the Art of Motorcycle Maintenance", "Robert Pirsig", "12.00")
        .await;
    app.book("Harry Potter", "JK Rowling", "25.00").await;
    let cookie = app.login("reader@example.com").await;

    let response = app.get("/books/", Some(&cookie)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    let harry = body.find("Harry Potter").unwrap();
    let zen = body.find("Zen and the Art").unwrap();
    assert!(harry < zen);
}

#[tokio::test]
async fn test_book_detail_requires_permission() {
    let app = TestApp::new();
    app.user("plain@example.com").await;
    let book = app.book("Harry Potter", "JK Rowling", "25.00").await;
    let cookie = app.login("plain@example.com").await;

    let response = app.get(&book.detail_url(), Some(&cookie)).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_string(response).await;
    assert!(!body.contains("Harry Potter"));
}

#[tokio::test]
async fn test_book_detail_redirects_anonymous_to_login() {
    let app = TestApp::new();
    let book = app.book("Harry Potter", "JK Rowling", "25.00").await;

    let response = app.get(&book.detail_url(), None).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("/accounts/login/?next="));
}

#[tokio::test]
async fn test_book_detail_with_permission() {
    let app = TestApp::new();
    let reader = app.reader("reader@example.com").await;
    let book = app.book("Harry Potter", "JK Rowling", "25.00").await;
    app.review(&book, &reader, "An excellent review").await;
    let cookie = app.login("reader@example.com").await;

    let response = app.get(&book.detail_url(), Some(&cookie)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("Harry Potter"));
    assert!(body.contains("JK Rowling"));
    assert!(body.contains("25.00"));
    assert!(body.contains("An excellent review (reader)"));
}

#[tokio::test]
async fn test_unknown_or_malformed_book_id_is_not_found() {
    let app = TestApp::new();
    app.reader("reader@example.com").await;
    let cookie = app.login("reader@example.com").await;

    let malformed = app.get("/books/23145/", Some(&cookie)).await;
    assert_eq!(malformed.status(), StatusCode::NOT_FOUND);

    let unknown = app
        .get(
            "/books/6a1f0a4e-3b0e-4a43-9c55-0d4f4d8a2b11/",
            Some(&cookie),
        )
        .await;
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_submit_review_creates_row_and_redirects() {
    let app = TestApp::new();
    app.reader("reader@example.com").await;
    let book = app.book("Harry Potter", "JK Rowling", "25.00").await;
    let cookie = app.login("reader@example.com").await;

    let response = app
        .post_form(
            &book.detail_url(),
            &[("review", "Loved every page")],
            Some(&cookie),
        )
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), book.detail_url());

    let reviews = app.reviews(book.id).await;
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0].review, "Loved every page");
    assert_eq!(reviews[0].author_username, "reader");

    // The flash is shown once on the next page render
    let page = body_string(app.get(&book.detail_url(), Some(&cookie)).await).await;
    assert!(page.contains("Your review has been added"));
    let again = body_string(app.get(&book.detail_url(), Some(&cookie)).await).await;
    assert!(!again.contains("Your review has been added"));
}

#[tokio::test]
async fn test_flash_survives_missing_book() {
    let app = TestApp::new();
    app.reader("reader@example.com").await;
    let book = app.book("Harry Potter", "JK Rowling", "25.00").await;
    let cookie = app.login("reader@example.com").await;

    app.post_form(
        &book.detail_url(),
        &[("review", "Loved every page")],
        Some(&cookie),
    )
    .await;

    let missing = app
        .get(
            "/books/6a1f0a4e-3b0e-4a43-9c55-0d4f4d8a2b11/",
            Some(&cookie),
        )
        .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let page = body_string(app.get(&book.detail_url(), Some(&cookie)).await).await;
    assert!(page.contains("Your review has been added"));
}

#[tokio::test]
async fn test_submit_empty_review_rerenders_without_creating() {
    let app = TestApp::new();
    app.reader("reader@example.com").await;
    let book = app.book("Harry Potter", "JK Rowling", "25.00").await;
    let cookie = app.login("reader@example.com").await;

    let response = app
        .post_form(&book.detail_url(), &[("review", "   ")], Some(&cookie))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("Form is invalid, try again"));
    assert!(app.reviews(book.id).await.is_empty());
}

#[tokio::test]
async fn test_submit_review_without_permission_is_forbidden() {
    let app = TestApp::new();
    app.user("plain@example.com").await;
    let book = app.book("Harry Potter", "JK Rowling", "25.00").await;
    let cookie = app.login("plain@example.com").await;

    let response = app
        .post_form(&book.detail_url(), &[("review", "Sneaky")], Some(&cookie))
        .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(app.reviews(book.id).await.is_empty());
}

#[tokio::test]
async fn test_htmx_review_returns_escaped_fragment() {
    let app = TestApp::new();
    app.reader("reader@example.com").await;
    let book = app.book("Harry Potter", "JK Rowling", "25.00").await;
    let cookie = app.login("reader@example.com").await;

    let response = app
        .post_htmx(
            &book.detail_url(),
            &[("review", "<script>alert(1)</script>")],
            Some(&cookie),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.trim_start().starts_with("<li"));
    assert!(body.contains("&#60;script&#62;"));
    assert!(!body.contains("<script>"));
    assert!(body.contains("(reader)"));
    assert!(!body.contains("<html"));
    assert_eq!(app.reviews(book.id).await.len(), 1);
}

#[tokio::test]
async fn test_htmx_invalid_review_is_bad_request() {
    let app = TestApp::new();
    app.reader("reader@example.com").await;
    let book = app.book("Harry Potter", "JK Rowling", "25.00").await;
    let cookie = app.login("reader@example.com").await;

    let response = app
        .post_htmx(&book.detail_url(), &[("review", "")], Some(&cookie))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_string(response).await;
    assert!(body.contains("errorlist"));
    assert!(app.reviews(book.id).await.is_empty());
}

#[tokio::test]
async fn test_review_too_long_is_rejected() {
    let app = TestApp::new();
    app.reader("reader@example.com").await;
    let book = app.book("Harry Potter", "JK Rowling", "25.00").await;
    let cookie = app.login("reader@example.com").await;
    let long = "a".repeat(256);

    let response = app
        .post_htmx(&book.detail_url(), &[("review", &long)], Some(&cookie))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.reviews(book.id).await.is_empty());
}
