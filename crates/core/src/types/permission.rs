//! Named permissions checked in addition to plain authentication.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a permission codename is unknown.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown permission: {0}")]
pub struct PermissionError(String);

/// An access-control flag granted to individual users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Can read all books (detail pages and their reviews).
    SpecialStatus,
}

impl Permission {
    /// Every permission known to the application.
    pub const ALL: [Self; 1] = [Self::SpecialStatus];

    /// Stable identifier stored in the database, e.g. `books.special_status`.
    #[must_use]
    pub const fn codename(&self) -> &'static str {
        match self {
            Self::SpecialStatus => "books.special_status",
        }
    }

    /// Human readable description.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::SpecialStatus => "can read all books",
        }
    }

    /// Look up a permission by codename.
    ///
    /// The app label prefix is optional, so both `books.special_status` and
    /// `special_status` resolve.
    ///
    /// # Errors
    ///
    /// Returns `PermissionError` if no permission has that codename.
    pub fn from_codename(codename: &str) -> Result<Self, PermissionError> {
        Self::ALL
            .into_iter()
            .find(|p| {
                let full = p.codename();
                codename == full || full.split_once('.').is_some_and(|(_, short)| short == codename)
            })
            .ok_or_else(|| PermissionError(codename.to_owned()))
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.codename())
    }
}

impl FromStr for Permission {
    type Err = PermissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_codename(s)
    }
}
