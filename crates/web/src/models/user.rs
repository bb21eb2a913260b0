//! User domain types.

use chrono::{DateTime, Utc};

use bookshelf_core::{Email, UserId};

/// A site account.
///
/// The password hash never leaves the account repository except through
/// `AccountRepository::get_password_hash`.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Login e-mail address.
    pub email: Email,
    /// Display name.
    pub username: String,
    /// Whether the user may use the admin area.
    pub is_staff: bool,
    /// When the user signed up.
    pub created_at: DateTime<Utc>,
}

/// Longest accepted username.
pub const USERNAME_MAX_LENGTH: usize = 150;

/// Pick the display name for a new account.
///
/// An explicit, non-blank username wins; otherwise the e-mail local part is
/// used.
#[must_use]
pub fn username_or_default(username: Option<&str>, email: &Email) -> String {
    username
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map_or_else(|| email.local_part().to_owned(), str::to_owned)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_username_defaults_to_local_part() {
        let email = Email::parse("reader@example.com").unwrap();
        assert_eq!(username_or_default(None, &email), "reader");
        assert_eq!(username_or_default(Some("   "), &email), "reader");
    }

    #[test]
    fn test_explicit_username_is_trimmed() {
        let email = Email::parse("reader@example.com").unwrap();
        assert_eq!(username_or_default(Some(" bookworm "), &email), "bookworm");
    }
}
