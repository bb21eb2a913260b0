//! Database operations for the bookshelf `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `app_user` - Site accounts (argon2 password hashes)
//! - `user_permission` - Named permissions granted to users
//! - `book` - Catalog entries
//! - `review` - Reviews, cascading with their book and author
//! - `tower_sessions.session` - Tower-sessions storage
//!
//! # Migrations
//!
//! Migrations are stored in `crates/web/migrations/` and run via:
//! ```bash
//! cargo run -p bookshelf-cli -- migrate
//! ```
//!
//! Handlers only see the [`CatalogRepository`] and [`AccountRepository`]
//! traits. [`PgStore`] backs them in production; [`InMemoryStore`] backs
//! the router tests.

pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use bookshelf_core::{BookId, Email, Permission, ReviewId, ReviewText, UserId};

use crate::models::{Book, BookInput, Review, User};

pub use memory::InMemoryStore;
pub use postgres::PgStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// What to do with a book's cover when it is edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoverUpdate {
    /// Leave the current cover untouched.
    Keep,
    /// Point the book at a newly stored file.
    Replace(String),
    /// Remove the cover reference.
    Clear,
}

/// Books and their reviews.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Check that the backing store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;

    /// All books, ordered by title then id.
    async fn list_books(&self) -> Result<Vec<Book>, RepositoryError>;

    /// Books whose title or author contains `query`, ignoring case.
    ///
    /// The query is matched literally; an empty query matches every book.
    async fn search_books(&self, query: &str) -> Result<Vec<Book>, RepositoryError>;

    async fn get_book(&self, id: BookId) -> Result<Option<Book>, RepositoryError>;

    async fn create_book(
        &self,
        input: &BookInput,
        cover: Option<&str>,
    ) -> Result<Book, RepositoryError>;

    /// Returns `RepositoryError::NotFound` if the book does not exist.
    async fn update_book(
        &self,
        id: BookId,
        input: &BookInput,
        cover: CoverUpdate,
    ) -> Result<Book, RepositoryError>;

    /// Delete a book and, by cascade, all of its reviews.
    ///
    /// Returns the deleted book so its cover file can be removed.
    async fn delete_book(&self, id: BookId) -> Result<Option<Book>, RepositoryError>;

    /// Reviews of a book ordered by id, with author usernames.
    async fn list_reviews(&self, book_id: BookId) -> Result<Vec<Review>, RepositoryError>;

    async fn get_review(&self, id: ReviewId) -> Result<Option<Review>, RepositoryError>;

    /// Returns `RepositoryError::NotFound` if the book or author is gone.
    async fn create_review(
        &self,
        book_id: BookId,
        author_id: UserId,
        text: &ReviewText,
    ) -> Result<Review, RepositoryError>;

    /// Returns `RepositoryError::NotFound` if the review does not exist.
    async fn update_review(
        &self,
        id: ReviewId,
        text: &ReviewText,
    ) -> Result<Review, RepositoryError>;

    /// Returns `true` if a review was deleted.
    async fn delete_review(&self, id: ReviewId) -> Result<bool, RepositoryError>;
}

/// User accounts and their permissions.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Returns `RepositoryError::Conflict` if the e-mail is taken.
    async fn create_user(
        &self,
        email: &Email,
        username: &str,
        password_hash: &str,
        is_staff: bool,
    ) -> Result<User, RepositoryError>;

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    async fn get_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError>;

    /// The user together with their stored password hash.
    async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError>;

    async fn permissions(&self, id: UserId) -> Result<Vec<Permission>, RepositoryError>;

    /// Granting a permission the user already holds is a no-op.
    async fn grant_permission(
        &self,
        id: UserId,
        permission: Permission,
    ) -> Result<(), RepositoryError>;

    /// Returns `true` if the user held the permission.
    async fn revoke_permission(
        &self,
        id: UserId,
        permission: Permission,
    ) -> Result<bool, RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

