//! Staff-only catalog management.
//!
//! Every handler takes [`RequireStaff`](crate::middleware::RequireStaff):
//! anonymous visitors are sent to login and other users get 403.

pub mod books;
pub mod reviews;

use axum::response::Redirect;

use crate::middleware::RequireStaff;

/// The admin landing page is the book table.
pub async fn index(RequireStaff(_user): RequireStaff) -> Redirect {
    Redirect::to("/admin/books/")
}
