//! Authentication and authorization extractors.
//!
//! [`RequireAuth`] is the authenticate stage of the request pipeline;
//! [`RequirePermission`] and [`RequireStaff`] build on it for the authorize
//! stage.

use std::marker::PhantomData;

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use bookshelf_core::Permission;

use crate::error::AppError;
use crate::models::{CurrentUser, session_keys};
use crate::state::AppState;

/// Login page path.
pub const LOGIN_PATH: &str = "/accounts/login/";

/// Extractor that requires an authenticated user.
///
/// If the user is not logged in, returns a redirect to the login page with
/// the requested path in `next`.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.username)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Error returned when authentication is required but the user is not logged in.
#[derive(Debug)]
pub enum AuthRejection {
    /// Redirect to the login page, then back to `next`.
    RedirectToLogin { next: String },
    /// Unauthorized response (no session layer installed).
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin { next } => Redirect::to(&login_url(&next)).into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

/// Login URL that returns to `next` afterwards.
#[must_use]
pub fn login_url(next: &str) -> String {
    format!("{LOGIN_PATH}?next={}", urlencoding::encode(next))
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::Unauthorized)?;

        let user: CurrentUser = session
            .get(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten()
            .ok_or_else(|| AuthRejection::RedirectToLogin {
                next: parts
                    .uri
                    .path_and_query()
                    .map_or_else(|| parts.uri.path().to_owned(), ToString::to_string),
            })?;

        Ok(Self(user))
    }
}

/// A permission that a route demands, named at the type level.
pub trait RequiredPermission: Send + Sync + 'static {
    const PERMISSION: Permission;
}

/// Marker for `books.special_status`.
pub struct CanReadAllBooks;

impl RequiredPermission for CanReadAllBooks {
    const PERMISSION: Permission = Permission::SpecialStatus;
}

/// Extractor that requires an authenticated user holding `P::PERMISSION`.
///
/// Permissions are read from the account repository on every request so a
/// revoked grant takes effect immediately. Anonymous users are redirected to
/// login; authenticated users without the permission get 403.
pub struct RequirePermission<P> {
    pub user: CurrentUser,
    _permission: PhantomData<P>,
}

impl<P> FromRequestParts<AppState> for RequirePermission<P>
where
    P: RequiredPermission,
{
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(user) = RequireAuth::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        match state.auth().has_permission(user.id, P::PERMISSION).await {
            Ok(true) => Ok(Self {
                user,
                _permission: PhantomData,
            }),
            Ok(false) => {
                tracing::warn!(
                    user_id = %user.id,
                    permission = %P::PERMISSION,
                    "Permission denied"
                );
                Err(AppError::Forbidden("Forbidden".to_owned()).into_response())
            }
            Err(e) => Err(AppError::from(e).into_response()),
        }
    }
}

/// Extractor that requires a staff account, checked against the repository.
pub struct RequireStaff(pub CurrentUser);

impl FromRequestParts<AppState> for RequireStaff {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(user) = RequireAuth::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        match state.accounts().get_user(user.id).await {
            Ok(Some(account)) if account.is_staff => Ok(Self(user)),
            Ok(Some(_)) => {
                tracing::warn!(user_id = %user.id, "Non-staff user tried the admin area");
                Err(AppError::Forbidden("Forbidden".to_owned()).into_response())
            }
            Ok(None) => Err(AuthRejection::RedirectToLogin {
                next: parts.uri.path().to_owned(),
            }
            .into_response()),
            Err(e) => Err(AppError::from(e).into_response()),
        }
    }
}

/// Store the user in the session, cycling the session id first.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Drop everything from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
