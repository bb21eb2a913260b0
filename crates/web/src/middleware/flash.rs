//! One-shot flash messages and the per-page context built from them.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::models::{CurrentUser, FlashMessage, session_keys};

/// Queue a message for the next full page render.
///
/// # Errors
///
/// Returns an error if the session cannot be read or written.
pub async fn push_flash(
    session: &Session,
    message: FlashMessage,
) -> Result<(), tower_sessions::session::Error> {
    let mut messages: Vec<FlashMessage> = session
        .get(session_keys::FLASH_MESSAGES)
        .await?
        .unwrap_or_default();
    messages.push(message);
    session.insert(session_keys::FLASH_MESSAGES, messages).await
}

/// Remove and return all queued messages.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn take_flashes(
    session: &Session,
) -> Result<Vec<FlashMessage>, tower_sessions::session::Error> {
    // Only touch the session when something is queued, so anonymous page
    // views do not create one.
    let messages: Option<Vec<FlashMessage>> = session.get(session_keys::FLASH_MESSAGES).await?;
    if messages.is_some() {
        session.remove_value(session_keys::FLASH_MESSAGES).await?;
    }
    Ok(messages.unwrap_or_default())
}

/// Data every full page needs: who is logged in and the pending messages.
///
/// Extracting it drains the flash queue, so only handlers that render a page
/// should extract it. Handlers that may redirect call [`PageContext::load`]
/// once they know they will render.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub user: Option<CurrentUser>,
    pub messages: Vec<FlashMessage>,
}

impl PageContext {
    /// Build the context from a session, draining flash messages.
    pub async fn load(session: &Session) -> Self {
        let user = session
            .get::<CurrentUser>(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten();
        let messages = take_flashes(session).await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to read flash messages");
            Vec::new()
        });

        Self { user, messages }
    }

    #[must_use]
    pub fn is_staff(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.is_staff)
    }
}

impl<S> FromRequestParts<S> for PageContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Session>() {
            Some(session) => Ok(Self::load(session).await),
            None => Ok(Self::default()),
        }
    }
}
