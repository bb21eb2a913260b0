//! Review text.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`ReviewText`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ReviewTextError {
    /// Nothing but whitespace was submitted.
    #[error("this field is required")]
    Empty,
    /// The text exceeds the column width.
    #[error("ensure this value has at most {max} characters (it has {actual})")]
    TooLong {
        /// Maximum allowed characters.
        max: usize,
        /// Characters submitted.
        actual: usize,
    },
}

/// The body of a review: trimmed, non-empty, at most 255 characters.
///
/// ```
/// use bookshelf_core::ReviewText;
///
/// assert_eq!(ReviewText::parse("  a good book ").unwrap().as_str(), "a good book");
/// assert!(ReviewText::parse("   ").is_err());
/// assert!(ReviewText::parse(&"x".repeat(256)).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewText(String);

impl ReviewText {
    /// Maximum length in characters (`VARCHAR(255)`).
    pub const MAX_LENGTH: usize = 255;

    /// Parse review text submitted by a user.
    ///
    /// # Errors
    ///
    /// Returns `ReviewTextError::Empty` for blank input and
    /// `ReviewTextError::TooLong` when the trimmed text has more than 255
    /// characters.
    pub fn parse(s: &str) -> Result<Self, ReviewTextError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ReviewTextError::Empty);
        }

        let actual = s.chars().count();
        if actual > Self::MAX_LENGTH {
            return Err(ReviewTextError::TooLong {
                max: Self::MAX_LENGTH,
                actual,
            });
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the text as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the value and returns the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ReviewText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ReviewText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
