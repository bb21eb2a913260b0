//! User management commands.

use bookshelf_core::{Permission, PermissionError};
use bookshelf_web::db::PgStore;
use bookshelf_web::services::auth::{AuthError, AuthService};
use thiserror::Error;

use super::{ConnectError, connect};

/// Errors that can occur during user operations.
#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Permission(#[from] PermissionError),
}

/// Create a user account.
pub async fn create(
    email: &str,
    password: &str,
    username: Option<&str>,
    staff: bool,
) -> Result<(), UserError> {
    let store = PgStore::new(connect().await?);

    let user = AuthService::new(&store)
        .register(email, username, password, staff)
        .await?;

    tracing::info!(
        "User created! ID: {}, Email: {}, Username: {}, Staff: {}",
        user.id,
        user.email,
        user.username,
        user.is_staff
    );
    Ok(())
}

/// Grant a permission by codename.
pub async fn grant(email: &str, codename: &str) -> Result<(), UserError> {
    let permission = Permission::from_codename(codename)?;
    let store = PgStore::new(connect().await?);

    let user = AuthService::new(&store)
        .grant_permission(email, permission)
        .await?;

    tracing::info!("Granted {} to {}", permission, user.email);
    Ok(())
}

/// Revoke a permission by codename.
pub async fn revoke(email: &str, codename: &str) -> Result<(), UserError> {
    let permission = Permission::from_codename(codename)?;
    let store = PgStore::new(connect().await?);

    if AuthService::new(&store)
        .revoke_permission(email, permission)
        .await?
    {
        tracing::info!("Revoked {} from {}", permission, email);
    } else {
        tracing::warn!("{} did not hold {}", email, permission);
    }
    Ok(())
}
