//! Book create, edit and delete for staff.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    body::Bytes,
    extract::{Multipart, Path, State, multipart::MultipartError},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use crate::db::CoverUpdate;
use crate::error::{AppError, Result};
use crate::middleware::{PageContext, RequireStaff, push_flash};
use crate::models::{Book, BookInput, BookInputErrors, FlashMessage, Review};
use crate::routes::books::find_book;
use crate::services::media::MediaError;
use crate::state::AppState;

// =============================================================================
// Multipart form
// =============================================================================

/// Raw fields of the book form.
#[derive(Default)]
pub struct BookUpload {
    pub title: String,
    pub author: String,
    pub price: String,
    pub cover: Option<Bytes>,
    pub clear_cover: bool,
}

fn bad_multipart(e: MultipartError) -> AppError {
    AppError::BadRequest(e.body_text())
}

/// Read the multipart book form. Unknown fields are ignored.
async fn read_book_form(mut multipart: Multipart) -> Result<BookUpload> {
    let mut upload = BookUpload::default();

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().unwrap_or_default().to_owned();
        match name.as_str() {
            "title" => upload.title = field.text().await.map_err(bad_multipart)?,
            "author" => upload.author = field.text().await.map_err(bad_multipart)?,
            "price" => upload.price = field.text().await.map_err(bad_multipart)?,
            "clear_cover" => upload.clear_cover = true,
            "cover" => {
                let bytes = field.bytes().await.map_err(bad_multipart)?;
                // Browsers send an empty part when no file was chosen.
                if !bytes.is_empty() {
                    upload.cover = Some(bytes);
                }
            }
            _ => {}
        }
    }

    Ok(upload)
}

// =============================================================================
// Templates
// =============================================================================

/// Admin book table.
#[derive(Template, WebTemplate)]
#[template(path = "admin/book_list.html")]
pub struct AdminBookListTemplate {
    pub page: PageContext,
    pub books: Vec<Book>,
}

/// Create or edit form. The review section is shown when `book` is set.
#[derive(Template, WebTemplate)]
#[template(path = "admin/book_form.html")]
pub struct BookFormTemplate {
    pub page: PageContext,
    pub heading: String,
    pub action: String,
    pub title: String,
    pub author: String,
    pub price: String,
    pub errors: BookInputErrors,
    pub cover_error: Option<String>,
    pub book: Option<Book>,
    pub reviews: Vec<Review>,
}

impl BookFormTemplate {
    fn new_book(page: PageContext) -> Self {
        Self {
            page,
            heading: "Add book".to_owned(),
            action: "/admin/books/new/".to_owned(),
            title: String::new(),
            author: String::new(),
            price: String::new(),
            errors: BookInputErrors::default(),
            cover_error: None,
            book: None,
            reviews: Vec::new(),
        }
    }

    fn edit_book(page: PageContext, book: Book, reviews: Vec<Review>) -> Self {
        Self {
            page,
            heading: format!("Change book: {}", book.title),
            action: book.admin_url(),
            title: book.title.clone(),
            author: book.author.clone(),
            price: book.price.to_string(),
            errors: BookInputErrors::default(),
            cover_error: None,
            book: Some(book),
            reviews,
        }
    }

    /// Put the submitted values back so the user can correct them.
    fn with_submission(
        mut self,
        upload: BookUpload,
        errors: BookInputErrors,
        cover_error: Option<String>,
    ) -> Self {
        self.title = upload.title;
        self.author = upload.author;
        self.price = upload.price;
        self.errors = errors;
        self.cover_error = cover_error;
        self
    }
}

/// Message for a cover rejected because of what was uploaded.
fn cover_rejection(e: &MediaError) -> Option<String> {
    match e {
        MediaError::UnsupportedType(_) | MediaError::InvalidImage(_) | MediaError::TooLarge => {
            Some(format!("Upload a valid image (JPEG, PNG, GIF or WebP): {e}"))
        }
        MediaError::InvalidPath(_) | MediaError::Io(_) => None,
    }
}

/// Remove a cover file that is no longer referenced, logging failures.
async fn discard_cover(state: &AppState, path: &str) {
    if let Err(e) = state.media().remove(path).await {
        tracing::warn!(error = %e, path, "Failed to remove cover file");
    }
}

// =============================================================================
// Routes
// =============================================================================

/// Book table with title, author and price columns.
#[instrument(skip(state, staff, page), fields(staff_id = %staff.id))]
pub async fn book_list(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    page: PageContext,
) -> Result<AdminBookListTemplate> {
    let books = state.catalog().list_books().await?;
    Ok(AdminBookListTemplate { page, books })
}

/// Empty book form.
pub async fn new_book_page(
    RequireStaff(_staff): RequireStaff,
    page: PageContext,
) -> BookFormTemplate {
    BookFormTemplate::new_book(page)
}

/// Create a book from the multipart form.
#[instrument(skip(state, staff, session, multipart), fields(staff_id = %staff.id))]
pub async fn create_book(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    session: Session,
    multipart: Multipart,
) -> Result<Response> {
    let mut upload = read_book_form(multipart).await?;

    let input = match BookInput::parse(&upload.title, &upload.author, &upload.price) {
        Ok(input) => input,
        Err(errors) => {
            let page = PageContext::load(&session).await;
            return Ok(BookFormTemplate::new_book(page)
                .with_submission(upload, errors, None)
                .into_response());
        }
    };

    let cover = match upload.cover.take() {
        Some(file) => match state.media().save_cover(&file).await {
            Ok(path) => Some(path),
            Err(e) => match cover_rejection(&e) {
                Some(message) => {
                    let page = PageContext::load(&session).await;
                    return Ok(BookFormTemplate::new_book(page)
                        .with_submission(upload, BookInputErrors::default(), Some(message))
                        .into_response());
                }
                None => return Err(e.into()),
            },
        },
        None => None,
    };

    let book = match state.catalog().create_book(&input, cover.as_deref()).await {
        Ok(book) => book,
        Err(e) => {
            if let Some(path) = cover.as_deref() {
                discard_cover(&state, path).await;
            }
            return Err(e.into());
        }
    };
    tracing::info!(book_id = %book.id, title = %book.title, "Book created");
    state.page_cache().invalidate_all();

    let message = format!("The book \u{201c}{}\u{201d} was added successfully.", book.title);
    push_flash(&session, FlashMessage::success(message)).await?;
    Ok(Redirect::to("/admin/books/").into_response())
}

/// Edit form with the inline review editor.
#[instrument(skip(state, staff, session), fields(staff_id = %staff.id))]
pub async fn edit_book_page(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    session: Session,
    Path(id): Path<String>,
) -> Result<BookFormTemplate> {
    let book = find_book(&state, &id).await?;
    let reviews = state.catalog().list_reviews(book.id).await?;
    let page = PageContext::load(&session).await;
    Ok(BookFormTemplate::edit_book(page, book, reviews))
}

/// Update a book from the multipart form.
#[instrument(skip(state, staff, session, multipart), fields(staff_id = %staff.id))]
pub async fn update_book(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    session: Session,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Response> {
    let book = find_book(&state, &id).await?;
    let mut upload = read_book_form(multipart).await?;

    let input = match BookInput::parse(&upload.title, &upload.author, &upload.price) {
        Ok(input) => input,
        Err(errors) => {
            let reviews = state.catalog().list_reviews(book.id).await?;
            let page = PageContext::load(&session).await;
            return Ok(BookFormTemplate::edit_book(page, book, reviews)
                .with_submission(upload, errors, None)
                .into_response());
        }
    };

    let cover = match upload.cover.take() {
        Some(file) => match state.media().save_cover(&file).await {
            Ok(path) => CoverUpdate::Replace(path),
            Err(e) => match cover_rejection(&e) {
                Some(message) => {
                    let reviews = state.catalog().list_reviews(book.id).await?;
                    let page = PageContext::load(&session).await;
                    return Ok(BookFormTemplate::edit_book(page, book, reviews)
                        .with_submission(upload, BookInputErrors::default(), Some(message))
                        .into_response());
                }
                None => return Err(e.into()),
            },
        },
        None if upload.clear_cover => CoverUpdate::Clear,
        None => CoverUpdate::Keep,
    };

    let replaces_cover = cover != CoverUpdate::Keep;
    let new_cover = match &cover {
        CoverUpdate::Replace(path) => Some(path.clone()),
        CoverUpdate::Clear | CoverUpdate::Keep => None,
    };
    let updated = match state.catalog().update_book(book.id, &input, cover).await {
        Ok(updated) => updated,
        Err(e) => {
            if let Some(path) = new_cover.as_deref() {
                discard_cover(&state, path).await;
            }
            return Err(e.into());
        }
    };
    tracing::info!(book_id = %updated.id, "Book updated");
    state.page_cache().invalidate_all();

    if replaces_cover && let Some(old) = book.cover.as_deref() {
        discard_cover(&state, old).await;
    }

    let message = format!(
        "The book \u{201c}{}\u{201d} was changed successfully.",
        updated.title
    );
    push_flash(&session, FlashMessage::success(message)).await?;
    Ok(Redirect::to("/admin/books/").into_response())
}

/// Delete a book, its reviews and its cover file.
#[instrument(skip(state, staff, session), fields(staff_id = %staff.id))]
pub async fn delete_book(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    session: Session,
    Path(id): Path<String>,
) -> Result<Redirect> {
    let book = find_book(&state, &id).await?;

    let Some(deleted) = state.catalog().delete_book(book.id).await? else {
        return Err(AppError::NotFound(format!("book {id}")));
    };
    tracing::info!(book_id = %deleted.id, "Book deleted");
    state.page_cache().invalidate_all();

    if let Some(cover) = deleted.cover.as_deref() {
        discard_cover(&state, cover).await;
    }

    let message = format!(
        "The book \u{201c}{}\u{201d} was deleted successfully.",
        deleted.title
    );
    push_flash(&session, FlashMessage::success(message)).await?;
    Ok(Redirect::to("/admin/books/"))
}
