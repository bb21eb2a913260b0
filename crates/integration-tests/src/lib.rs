//! Integration tests for Bookshelf.
//!
//! These drive a running server over HTTP and prepare accounts directly in
//! its database. They are `#[ignore]`d so `cargo test` stays self-contained.
//!
//! # Running Tests
//!
//! ```bash
//! cargo run -p bookshelf-cli -- migrate
//! cargo run -p bookshelf-web &
//! cargo test -p bookshelf-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `BOOKSHELF_TEST_URL` - Server under test (default: `http://localhost:8000`)
//! - `BOOKSHELF_DATABASE_URL` - Same database the server uses

use reqwest::{Client, redirect};
use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use bookshelf_core::Permission;
use bookshelf_web::db::{self, PgStore};
use bookshelf_web::models::User;
use bookshelf_web::services::auth::{AuthError, AuthService};

/// Password given to every account created by [`TestContext`].
pub const PASSWORD: &str = "integration-password";

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Connection to the server under test and its database.
pub struct TestContext {
    pub base_url: String,
    pub pool: PgPool,
}

impl TestContext {
    /// Read the environment and connect to the database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database URL is missing or unreachable.
    pub async fn new() -> Result<Self, ContextError> {
        dotenvy::dotenv().ok();

        let base_url = std::env::var("BOOKSHELF_TEST_URL")
            .unwrap_or_else(|_| "http://localhost:8000".to_owned());
        let database_url = std::env::var("BOOKSHELF_DATABASE_URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .map(SecretString::from)
            .map_err(|_| ContextError::MissingEnvVar("BOOKSHELF_DATABASE_URL"))?;
        let pool = db::create_pool(&database_url).await?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            pool,
        })
    }

    /// Absolute URL for a path on the server under test.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// A cookie-keeping client that does not follow redirects.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be built.
    pub fn client() -> Result<Client, ContextError> {
        Ok(Client::builder()
            .cookie_store(true)
            .redirect(redirect::Policy::none())
            .build()?)
    }

    /// Create an account with a unique e-mail, optionally holding
    /// `books.special_status`.
    ///
    /// # Errors
    ///
    /// Returns an error if the account cannot be stored.
    pub async fn create_user(&self, special_status: bool) -> Result<User, ContextError> {
        let store = PgStore::new(self.pool.clone());
        let auth = AuthService::new(&store);
        let email = format!("it-{}@example.com", Uuid::new_v4().simple());

        let user = auth.register(&email, None, PASSWORD, false).await?;
        if special_status {
            auth.grant_permission(&email, Permission::SpecialStatus)
                .await?;
        }
        Ok(user)
    }

    /// Log `user` in on `client` through the login form.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn login(&self, client: &Client, user: &User) -> Result<(), ContextError> {
        client
            .post(self.url("/accounts/login/"))
            .form(&[("email", user.email.as_str()), ("password", PASSWORD)])
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
