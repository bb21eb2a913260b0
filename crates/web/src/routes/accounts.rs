//! Account route handlers: signup, login and logout.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{PageContext, clear_current_user, push_flash, set_current_user};
use crate::models::{CurrentUser, FlashMessage, User};
use crate::routes::safe_next;
use crate::services::auth::AuthError;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

/// Signup form data.
#[derive(Deserialize)]
pub struct SignupForm {
    pub email: String,
    #[serde(default)]
    pub username: Option<String>,
    pub password: String,
}

/// `?next=` on the login page.
#[derive(Debug, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "accounts/login.html")]
pub struct LoginTemplate {
    pub page: PageContext,
    pub email: String,
    pub next: String,
    pub error: Option<String>,
}

/// Signup page template.
#[derive(Template, WebTemplate)]
#[template(path = "accounts/signup.html")]
pub struct SignupTemplate {
    pub page: PageContext,
    pub email: String,
    pub username: String,
    pub error: Option<String>,
}

async fn start_session(session: &Session, user: &User) -> Result<()> {
    set_current_user(session, &CurrentUser::from(user)).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(page: PageContext, Query(query): Query<NextQuery>) -> impl IntoResponse {
    LoginTemplate {
        page,
        email: String::new(),
        next: safe_next(query.next.as_deref()).unwrap_or_default().to_owned(),
        error: None,
    }
}

/// Handle login form submission.
///
/// Redirects to `next` when it is a local path, otherwise to the home page.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let next = safe_next(form.next.as_deref()).unwrap_or_default().to_owned();

    match state.auth().login(&form.email, &form.password).await {
        Ok(user) => {
            start_session(&session, &user).await?;
            tracing::info!(user_id = %user.id, "User logged in");

            let target = if next.is_empty() { "/" } else { next.as_str() };
            Ok(Redirect::to(target).into_response())
        }
        Err(AuthError::InvalidCredentials | AuthError::InvalidEmail(_)) => {
            tracing::warn!("Login failed");
            Ok(LoginTemplate {
                page: PageContext::load(&session).await,
                email: form.email,
                next,
                error: Some("Invalid email or password".to_owned()),
            }
            .into_response())
        }
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Signup Routes
// =============================================================================

/// Display the signup page.
pub async fn signup_page(page: PageContext) -> impl IntoResponse {
    SignupTemplate {
        page,
        email: String::new(),
        username: String::new(),
        error: None,
    }
}

/// Handle signup form submission.
///
/// The new account is logged in straight away.
#[instrument(skip(state, session, form))]
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SignupForm>,
) -> Result<Response> {
    let result = state
        .auth()
        .register(&form.email, form.username.as_deref(), &form.password, false)
        .await;

    let error = match result {
        Ok(user) => {
            start_session(&session, &user).await?;
            push_flash(&session, FlashMessage::info("Welcome to the bookshelf")).await?;
            return Ok(Redirect::to("/").into_response());
        }
        Err(AuthError::UserAlreadyExists) => {
            "An account with this email already exists".to_owned()
        }
        Err(AuthError::InvalidEmail(_)) => "Enter a valid email address".to_owned(),
        Err(e @ (AuthError::WeakPassword(_) | AuthError::InvalidUsername(_))) => e.to_string(),
        Err(e) => return Err(e.into()),
    };

    tracing::debug!(%error, "Signup rejected");
    Ok(SignupTemplate {
        page: PageContext::load(&session).await,
        email: form.email,
        username: form.username.unwrap_or_default(),
        error: Some(error),
    }
    .into_response())
}

// =============================================================================
// Logout
// =============================================================================

/// Log out and return to the home page.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(Redirect::to("/"))
}
