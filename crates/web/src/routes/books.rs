//! Book list, book detail with review submission, and review deletion.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use bookshelf_core::{BookId, ReviewId, ReviewText};

use crate::error::{AppError, Result};
use crate::middleware::{
    CanReadAllBooks, PageContext, RequireAuth, RequirePermission, ResponseMode, push_flash,
};
use crate::models::{Book, CurrentUser, FlashMessage, Review};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Review form data.
#[derive(Debug, Deserialize)]
pub struct ReviewForm {
    #[serde(default)]
    pub review: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Book list template.
#[derive(Template, WebTemplate)]
#[template(path = "books/book_list.html")]
pub struct BookListTemplate {
    pub page: PageContext,
    pub books: Vec<Book>,
}

/// A review as shown on the detail page.
pub struct ReviewView {
    pub review: Review,
    pub can_delete: bool,
}

impl ReviewView {
    fn for_viewer(review: Review, viewer: &CurrentUser) -> Self {
        let can_delete = review.author_id == viewer.id;
        Self { review, can_delete }
    }
}

/// Book detail template.
#[derive(Template, WebTemplate)]
#[template(path = "books/book_detail.html")]
pub struct BookDetailTemplate {
    pub page: PageContext,
    pub book: Book,
    pub reviews: Vec<ReviewView>,
    /// Text to put back in the form after a failed submission.
    pub review_text: String,
    pub review_error: Option<String>,
}

/// Single review list item (HTMX fragment).
#[derive(Template, WebTemplate)]
#[template(path = "partials/review_item.html")]
pub struct ReviewItemTemplate {
    pub item: ReviewView,
}

/// Validation messages (HTMX fragment).
#[derive(Template, WebTemplate)]
#[template(path = "partials/form_errors.html")]
pub struct FormErrorsTemplate {
    pub errors: Vec<String>,
}

// =============================================================================
// Helpers
// =============================================================================

/// Parse a book id from the path, treating malformed ids as missing.
pub(crate) async fn find_book(state: &AppState, raw_id: &str) -> Result<Book> {
    let not_found = || AppError::NotFound(format!("book {raw_id}"));
    let id = BookId::parse(raw_id).map_err(|_| not_found())?;
    state.catalog().get_book(id).await?.ok_or_else(not_found)
}

/// Parse a review id from the path, treating malformed ids as missing.
pub(crate) async fn find_review(state: &AppState, raw_id: &str) -> Result<Review> {
    let not_found = || AppError::NotFound(format!("review {raw_id}"));
    let id: ReviewId = raw_id.parse().map_err(|_| not_found())?;
    state.catalog().get_review(id).await?.ok_or_else(not_found)
}

async fn detail_page(
    state: &AppState,
    page: PageContext,
    viewer: &CurrentUser,
    book: Book,
    review_text: String,
    review_error: Option<String>,
) -> Result<BookDetailTemplate> {
    let reviews = state
        .catalog()
        .list_reviews(book.id)
        .await?
        .into_iter()
        .map(|review| ReviewView::for_viewer(review, viewer))
        .collect();

    Ok(BookDetailTemplate {
        page,
        book,
        reviews,
        review_text,
        review_error,
    })
}

// =============================================================================
// Routes
// =============================================================================

/// List every book, ordered by title.
#[instrument(skip(state, page, user), fields(user_id = %user.id))]
pub async fn book_list(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    page: PageContext,
) -> Result<BookListTemplate> {
    let books = state.catalog().list_books().await?;
    Ok(BookListTemplate { page, books })
}

/// Display a book with its reviews and an empty review form.
///
/// Flash messages are only drained once the book is found, so a 404 leaves
/// them for the next page.
#[instrument(skip(state, auth, session), fields(user_id = %auth.user.id))]
pub async fn book_detail(
    State(state): State<AppState>,
    auth: RequirePermission<CanReadAllBooks>,
    session: Session,
    Path(id): Path<String>,
) -> Result<BookDetailTemplate> {
    let book = find_book(&state, &id).await?;
    let page = PageContext::load(&session).await;
    detail_page(&state, page, &auth.user, book, String::new(), None).await
}

/// Handle a review submission.
///
/// HTMX requests get the new `<li>` on success or a 400 with the messages;
/// other requests get a redirect on success or the page re-rendered with
/// errors.
#[instrument(skip(state, auth, session, form), fields(user_id = %auth.user.id))]
pub async fn submit_review(
    State(state): State<AppState>,
    auth: RequirePermission<CanReadAllBooks>,
    mode: ResponseMode,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<ReviewForm>,
) -> Result<Response> {
    let book = find_book(&state, &id).await?;
    let user = auth.user;

    let text = match ReviewText::parse(&form.review) {
        Ok(text) => text,
        Err(e) => {
            tracing::debug!(error = %e, "Rejected review");
            if mode.is_fragment() {
                let errors = FormErrorsTemplate {
                    errors: vec![e.to_string()],
                };
                return Ok((StatusCode::BAD_REQUEST, errors).into_response());
            }

            push_flash(&session, FlashMessage::error("Form is invalid, try again")).await?;
            let page = PageContext::load(&session).await;
            let template =
                detail_page(&state, page, &user, book, form.review, Some(e.to_string())).await?;
            return Ok(template.into_response());
        }
    };

    let review = state.catalog().create_review(book.id, user.id, &text).await?;
    tracing::info!(review_id = %review.id, book_id = %book.id, "Review added");

    if mode.is_fragment() {
        let item = ReviewView::for_viewer(review, &user);
        return Ok((StatusCode::OK, ReviewItemTemplate { item }).into_response());
    }

    push_flash(&session, FlashMessage::success("Your review has been added")).await?;
    Ok(Redirect::to(&book.detail_url()).into_response())
}

/// Delete a review. Only its author may do so.
///
/// The path segment is the review id.
#[instrument(skip(state, user, session), fields(user_id = %user.id))]
pub async fn delete_review(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    mode: ResponseMode,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response> {
    let review = find_review(&state, &id).await?;

    if review.author_id != user.id {
        tracing::warn!(review_id = %review.id, "Refused to delete another user's review");
        return Err(AppError::Forbidden("Unauthorized".to_owned()));
    }

    state.catalog().delete_review(review.id).await?;
    tracing::info!(review_id = %review.id, "Review deleted");

    if mode.is_fragment() {
        return Ok((
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            "",
        )
            .into_response());
    }

    push_flash(&session, FlashMessage::success("Review deleted")).await?;
    Ok(Redirect::to(&review.book_url()).into_response())
}
