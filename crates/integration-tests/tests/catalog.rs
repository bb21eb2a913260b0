//! End-to-end checks against a running server.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`bookshelf migrate`)
//! - The web server running (`cargo run -p bookshelf-web`)
//!
//! Run with: `cargo test -p bookshelf-integration-tests -- --ignored`

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;

use bookshelf_integration_tests::TestContext;
use bookshelf_web::db::{CatalogRepository, PgStore};
use bookshelf_web::models::BookInput;

#[tokio::test]
#[ignore = "requires a running server and database"]
async fn test_health() {
    let ctx = TestContext::new().await.unwrap();
    let client = TestContext::client().unwrap();

    let live = client.get(ctx.url("/health")).send().await.unwrap();
    assert_eq!(live.status(), StatusCode::OK);
    assert_eq!(live.text().await.unwrap(), "ok");

    let ready = client.get(ctx.url("/health/ready")).send().await.unwrap();
    assert_eq!(ready.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "requires a running server and database"]
async fn test_book_list_requires_login() {
    let ctx = TestContext::new().await.unwrap();
    let client = TestContext::client().unwrap();

    let resp = client.get(ctx.url("/books/")).send().await.unwrap();

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        resp.headers()["location"],
        "/accounts/login/?next=%2Fbooks%2F"
    );
}

#[tokio::test]
#[ignore = "requires a running server and database"]
async fn test_review_lifecycle() {
    let ctx = TestContext::new().await.unwrap();
    let store = PgStore::new(ctx.pool.clone());
    let input = BookInput::parse("Integration Book", "Test Author", "10.00").unwrap();
    let book = store.create_book(&input, None).await.unwrap();

    let author = ctx.create_user(true).await.unwrap();
    let client = TestContext::client().unwrap();
    ctx.login(&client, &author).await.unwrap();

    let detail = client.get(ctx.url(&book.detail_url())).send().await.unwrap();
    assert_eq!(detail.status(), StatusCode::OK);
    assert!(detail.text().await.unwrap().contains("Integration Book"));

    let posted = client
        .post(ctx.url(&book.detail_url()))
        .header("hx-request", "true")
        .form(&[("review", "Read it twice")])
        .send()
        .await
        .unwrap();
    assert_eq!(posted.status(), StatusCode::OK);
    assert!(posted.text().await.unwrap().contains("Read it twice"));

    let reviews = store.list_reviews(book.id).await.unwrap();
    assert_eq!(reviews.len(), 1);

    // Someone else may not delete it
    let other = ctx.create_user(true).await.unwrap();
    let other_client = TestContext::client().unwrap();
    ctx.login(&other_client, &other).await.unwrap();
    let refused = other_client
        .post(ctx.url(&reviews[0].delete_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(refused.status(), StatusCode::FORBIDDEN);
    assert_eq!(refused.text().await.unwrap(), "Unauthorized");

    let deleted = client
        .delete(ctx.url(&reviews[0].delete_url()))
        .header("hx-request", "true")
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status(), StatusCode::OK);
    assert!(store.list_reviews(book.id).await.unwrap().is_empty());

    store.delete_book(book.id).await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running server and database"]
async fn test_permission_is_required_for_detail() {
    let ctx = TestContext::new().await.unwrap();
    let store = PgStore::new(ctx.pool.clone());
    let input = BookInput::parse("Restricted Book", "Test Author", "1.00").unwrap();
    let book = store.create_book(&input, None).await.unwrap();

    let user = ctx.create_user(false).await.unwrap();
    let client = TestContext::client().unwrap();
    ctx.login(&client, &user).await.unwrap();

    let resp = client.get(ctx.url(&book.detail_url())).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    store.delete_book(book.id).await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running server and database"]
async fn test_search_is_public() {
    let ctx = TestContext::new().await.unwrap();
    let client = TestContext::client().unwrap();

    let resp = client
        .get(ctx.url("/books/search/?q=kart-no-such-book"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("No books matched."));
}
