//! Catalog domain types.

use std::fmt;

use bookshelf_core::{BookId, Price, ReviewId, UserId};

/// Longest accepted title or author name, in characters.
pub const TEXT_FIELD_MAX_LENGTH: usize = 200;

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub price: Price,
    /// Path of the cover image relative to the media root.
    pub cover: Option<String>,
}

/// URL of a book's public detail page.
#[must_use]
pub fn book_detail_url(id: BookId) -> String {
    format!("/books/{id}/")
}

/// URL of a book's admin edit page.
#[must_use]
pub fn book_admin_url(id: BookId) -> String {
    format!("/admin/books/{id}/")
}

impl Book {
    /// URL of the public detail page.
    #[must_use]
    pub fn detail_url(&self) -> String {
        book_detail_url(self.id)
    }

    /// URL of the admin edit page.
    #[must_use]
    pub fn admin_url(&self) -> String {
        book_admin_url(self.id)
    }

    /// Public URL of the cover image, if one was uploaded.
    #[must_use]
    pub fn cover_url(&self) -> Option<String> {
        self.cover.as_ref().map(|path| format!("/media/{path}"))
    }
}

/// A review with its author's display name resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    pub id: ReviewId,
    pub book_id: BookId,
    pub review: String,
    pub author_id: UserId,
    pub author_username: String,
}

impl Review {
    /// Detail page of the reviewed book.
    #[must_use]
    pub fn book_url(&self) -> String {
        book_detail_url(self.book_id)
    }

    /// Admin edit page of the reviewed book.
    #[must_use]
    pub fn book_admin_url(&self) -> String {
        book_admin_url(self.book_id)
    }

    /// Admin URL that updates this review.
    #[must_use]
    pub fn admin_url(&self) -> String {
        format!("/admin/reviews/{}/", self.id)
    }

    /// Admin URL that deletes this review.
    #[must_use]
    pub fn admin_delete_url(&self) -> String {
        format!("/admin/reviews/{}/delete/", self.id)
    }

    /// URL that deletes this review when POSTed or DELETEd.
    #[must_use]
    pub fn delete_url(&self) -> String {
        format!("/books/{}/delete_review/", self.id)
    }
}

/// Validated title, author and price for creating or editing a book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookInput {
    pub title: String,
    pub author: String,
    pub price: Price,
}

/// Per-field messages for a rejected [`BookInput`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookInputErrors {
    pub title: Option<String>,
    pub author: Option<String>,
    pub price: Option<String>,
}

impl BookInputErrors {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none() && self.author.is_none() && self.price.is_none()
    }
}

impl fmt::Display for BookInputErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = [
            ("title", &self.title),
            ("author", &self.author),
            ("price", &self.price),
        ];
        let mut first = true;
        for (name, message) in fields {
            if let Some(message) = message {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{name}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for BookInputErrors {}

impl BookInput {
    /// Validate raw form fields.
    ///
    /// # Errors
    ///
    /// Returns every field problem at once so the form can show them together.
    pub fn parse(title: &str, author: &str, price: &str) -> Result<Self, BookInputErrors> {
        let mut errors = BookInputErrors::default();

        let title = check_text_field(title).map_err(|e| errors.title = Some(e));
        let author = check_text_field(author).map_err(|e| errors.author = Some(e));
        let price = Price::parse(price).map_err(|e| errors.price = Some(e.to_string()));

        match (title, author, price) {
            (Ok(title), Ok(author), Ok(price)) => Ok(Self {
                title,
                author,
                price,
            }),
            _ => Err(errors),
        }
    }
}

fn check_text_field(value: &str) -> Result<String, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err("this field is required".to_owned());
    }
    let length = value.chars().count();
    if length > TEXT_FIELD_MAX_LENGTH {
        return Err(format!(
            "ensure this value has at most {TEXT_FIELD_MAX_LENGTH} characters (it has {length})"
        ));
    }
    Ok(value.to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_book_input_trims_fields() {
        let input = BookInput::parse("  Dune ", " Frank Herbert", "9.5").unwrap();
        assert_eq!(input.title, "Dune");
        assert_eq!(input.author, "Frank Herbert");
        assert_eq!(input.price.to_string(), "9.50");
    }

    #[test]
    fn test_book_input_collects_all_errors() {
        let errors = BookInput::parse("", "", "cheap").unwrap_err();
        assert!(errors.title.is_some());
        assert!(errors.author.is_some());
        assert!(errors.price.is_some());
        assert!(!errors.is_empty());
        assert_eq!(
            errors.to_string(),
            "title: this field is required; author: this field is required; price: enter a number"
        );
    }

    #[test]
    fn test_book_input_rejects_long_title() {
        let title = "x".repeat(TEXT_FIELD_MAX_LENGTH + 1);
        let errors = BookInput::parse(&title, "Anon", "1").unwrap_err();
        assert!(errors.title.unwrap().contains("at most 200"));
        assert!(errors.author.is_none());
    }

    #[test]
    fn test_urls() {
        let book = Book {
            id: BookId::generate(),
            title: "Dune".to_owned(),
            author: "Frank Herbert".to_owned(),
            price: Price::parse("10").unwrap(),
            cover: Some("covers/dune.png".to_owned()),
        };
        assert_eq!(book.detail_url(), format!("/books/{}/", book.id));
        assert_eq!(book.admin_url(), format!("/admin/books/{}/", book.id));
        assert_eq!(book.cover_url().as_deref(), Some("/media/covers/dune.png"));

        let review = Review {
            id: ReviewId::new(7),
            book_id: book.id,
            review: "Spice".to_owned(),
            author_id: UserId::new(1),
            author_username: "paul".to_owned(),
        };
        assert_eq!(review.book_url(), book.detail_url());
        assert_eq!(review.book_admin_url(), book.admin_url());
        assert_eq!(review.delete_url(), "/books/7/delete_review/");
        assert_eq!(review.admin_url(), "/admin/reviews/7/");
        assert_eq!(review.admin_delete_url(), "/admin/reviews/7/delete/");
    }
}
