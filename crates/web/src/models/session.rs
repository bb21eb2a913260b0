//! Session-related types.
//!
//! Types stored in the session for authentication state and one-shot messages.

use serde::{Deserialize, Serialize};

use bookshelf_core::{Email, UserId};

use super::User;

/// Session-stored user identity.
///
/// Permissions are deliberately absent; they are re-read from the account
/// repository whenever a handler asks for one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Display name shown next to reviews.
    pub username: String,
    /// Whether the user may open the admin area.
    pub is_staff: bool,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            is_staff: user.is_staff,
        }
    }
}

/// Severity of a flash message, used as a CSS class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Info,
    Error,
}

impl FlashLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Error => "error",
        }
    }
}

/// A message shown once on the next full page render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub level: FlashLevel,
    pub text: String,
}

impl FlashMessage {
    #[must_use]
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Success,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Info,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Error,
            text: text.into(),
        }
    }

    /// CSS class for the message container.
    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        self.level.as_str()
    }
}

/// Session keys.
pub mod session_keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for pending flash messages.
    pub const FLASH_MESSAGES: &str = "flash_messages";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_flash_message_session_format() {
        let message = FlashMessage::error("Form is invalid, try again");
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["level"], "error");
        assert_eq!(json["text"], "Form is invalid, try again");

        let back: FlashMessage = serde_json::from_value(json).unwrap();
        assert_eq!(back, message);
        assert_eq!(back.css_class(), "error");
    }
}
