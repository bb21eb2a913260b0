//! Domain models for the bookshelf site.
//!
//! These are validated domain objects, separate from the database row types
//! in [`crate::db`].

pub mod book;
pub mod session;
pub mod user;

pub use book::{Book, BookInput, BookInputErrors, Review};
pub use session::{CurrentUser, FlashLevel, FlashMessage, session_keys};
pub use user::User;
