//! Authentication service.
//!
//! Password accounts and the named permissions attached to them.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use bookshelf_core::{Email, Permission, UserId};

use crate::db::{AccountRepository, RepositoryError};
use crate::models::User;
use crate::models::user::{USERNAME_MAX_LENGTH, username_or_default};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Authentication service.
///
/// Handles user registration, login, and permission management.
pub struct AuthService<'a> {
    accounts: &'a dyn AccountRepository,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(accounts: &'a dyn AccountRepository) -> Self {
        Self { accounts }
    }

    /// Register a new user with email and password.
    ///
    /// The username falls back to the e-mail local part when blank.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(
        &self,
        email: &str,
        username: Option<&str>,
        password: &str,
        is_staff: bool,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        let username = username_or_default(username, &email);
        if username.chars().count() > USERNAME_MAX_LENGTH {
            return Err(AuthError::InvalidUsername(USERNAME_MAX_LENGTH));
        }

        validate_password(password)?;
        let password_hash = hash_password(password)?;

        let user = self
            .accounts
            .create_user(&email, &username, &password_hash, is_staff)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email)?;

        let (user, password_hash) = self
            .accounts
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }

    /// Whether the user currently holds `permission`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the lookup fails.
    pub async fn has_permission(
        &self,
        user_id: UserId,
        permission: Permission,
    ) -> Result<bool, AuthError> {
        let permissions = self.accounts.permissions(user_id).await?;
        Ok(permissions.contains(&permission))
    }

    /// Grant a permission to the account with this e-mail.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if no account uses the e-mail.
    pub async fn grant_permission(
        &self,
        email: &str,
        permission: Permission,
    ) -> Result<User, AuthError> {
        let user = self.find_user(email).await?;
        self.accounts.grant_permission(user.id, permission).await?;
        tracing::info!(user_id = %user.id, %permission, "Permission granted");
        Ok(user)
    }

    /// Revoke a permission from the account with this e-mail.
    ///
    /// Returns `false` if the user did not hold it.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if no account uses the e-mail.
    pub async fn revoke_permission(
        &self,
        email: &str,
        permission: Permission,
    ) -> Result<bool, AuthError> {
        let user = self.find_user(email).await?;
        let revoked = self.accounts.revoke_permission(user.id, permission).await?;
        tracing::info!(user_id = %user.id, %permission, revoked, "Permission revoked");
        Ok(revoked)
    }

    /// Look up an account by e-mail.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if no account uses the e-mail.
    pub async fn find_user(&self, email: &str) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        self.accounts
            .get_user_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a stored PHC hash.
fn verify_password(password: &str, password_hash: &str) -> Result<(), AuthError> {
    let parsed = PasswordHash::new(password_hash).map_err(|_| AuthError::PasswordHash)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AuthError::InvalidCredentials)
}
