//! Inline review editing on the admin book page.

use axum::{
    Form,
    extract::{Path, State},
    response::Redirect,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use bookshelf_core::ReviewText;

use crate::error::Result;
use crate::middleware::{RequireStaff, push_flash};
use crate::models::FlashMessage;
use crate::routes::books::{find_book, find_review};
use crate::services::auth::AuthError;
use crate::state::AppState;

/// New inline review.
#[derive(Debug, Deserialize)]
pub struct AddReviewForm {
    /// E-mail of the account the review is attributed to.
    pub email: String,
    #[serde(default)]
    pub review: String,
}

/// Edited review text.
#[derive(Debug, Deserialize)]
pub struct UpdateReviewForm {
    #[serde(default)]
    pub review: String,
}

/// Add a review to a book on behalf of a user.
#[instrument(skip(state, staff, session), fields(staff_id = %staff.id))]
pub async fn add_review(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<AddReviewForm>,
) -> Result<Redirect> {
    let book = find_book(&state, &id).await?;
    let back = Redirect::to(&book.admin_url());

    let author = match state.auth().find_user(&form.email).await {
        Ok(user) => user,
        Err(AuthError::UserNotFound | AuthError::InvalidEmail(_)) => {
            let message = format!("No user with email {}", form.email.trim());
            push_flash(&session, FlashMessage::error(message)).await?;
            return Ok(back);
        }
        Err(e) => return Err(e.into()),
    };

    let text = match ReviewText::parse(&form.review) {
        Ok(text) => text,
        Err(e) => {
            push_flash(&session, FlashMessage::error(format!("Review: {e}"))).await?;
            return Ok(back);
        }
    };

    let review = state.catalog().create_review(book.id, author.id, &text).await?;
    tracing::info!(review_id = %review.id, book_id = %book.id, "Review added by staff");

    push_flash(&session, FlashMessage::success("The review was added successfully.")).await?;
    Ok(back)
}

/// Replace a review's text.
#[instrument(skip(state, staff, session), fields(staff_id = %staff.id))]
pub async fn update_review(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<UpdateReviewForm>,
) -> Result<Redirect> {
    let review = find_review(&state, &id).await?;
    let back = Redirect::to(&review.book_admin_url());

    match ReviewText::parse(&form.review) {
        Ok(text) => {
            state.catalog().update_review(review.id, &text).await?;
            tracing::info!(review_id = %review.id, "Review updated by staff");
            push_flash(&session, FlashMessage::success("The review was changed successfully."))
                .await?;
        }
        Err(e) => {
            push_flash(&session, FlashMessage::error(format!("Review: {e}"))).await?;
        }
    }

    Ok(back)
}

/// Delete any review.
#[instrument(skip(state, staff, session), fields(staff_id = %staff.id))]
pub async fn delete_review(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    session: Session,
    Path(id): Path<String>,
) -> Result<Redirect> {
    let review = find_review(&state, &id).await?;

    state.catalog().delete_review(review.id).await?;
    tracing::info!(review_id = %review.id, "Review deleted by staff");

    push_flash(&session, FlashMessage::success("The review was deleted successfully.")).await?;
    Ok(Redirect::to(&review.book_admin_url()))
}
