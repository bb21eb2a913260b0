//! Catalog commands.
//!
//! # Seed file format
//!
//! ```yaml
//! - title: Dune
//!   author: Frank Herbert
//!   price: "9.99"
//! - title: Harry Potter
//!   author: JK Rowling
//!   price: 25
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use bookshelf_web::db::{CatalogRepository, PgStore, RepositoryError};
use bookshelf_web::models::{BookInput, BookInputErrors};

use super::{ConnectError, connect};

#[derive(Debug, Error)]
pub enum BooksError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Invalid book: {0}")]
    Invalid(#[from] BookInputErrors),

    #[error("Invalid book #{index} ({title}): {errors}")]
    InvalidEntry {
        index: usize,
        title: String,
        errors: BookInputErrors,
    },

    #[error("Failed to read {0}: {1}")]
    Read(String, std::io::Error),

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// One entry of a seed file.
#[derive(Debug, Deserialize)]
pub struct SeedBook {
    pub title: String,
    pub author: String,
    pub price: SeedPrice,
}

/// Prices may be written as YAML numbers or strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SeedPrice {
    Text(String),
    Number(serde_yaml::Number),
}

impl SeedPrice {
    fn as_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Number(number) => number.to_string(),
        }
    }
}

/// Parse a seed file, validating every entry before anything is written.
pub fn parse_seed(yaml: &str) -> Result<Vec<BookInput>, BooksError> {
    let entries: Vec<SeedBook> = serde_yaml::from_str(yaml)?;

    entries
        .into_iter()
        .enumerate()
        .map(|(i, entry)| {
            BookInput::parse(&entry.title, &entry.author, &entry.price.as_text()).map_err(
                |errors| BooksError::InvalidEntry {
                    index: i + 1,
                    title: entry.title.clone(),
                    errors,
                },
            )
        })
        .collect()
}

/// Add a single book.
pub async fn add(title: &str, author: &str, price: &str) -> Result<(), BooksError> {
    let input = BookInput::parse(title, author, price)?;
    let store = PgStore::new(connect().await?);

    let book = store.create_book(&input, None).await?;
    tracing::info!("Book added! ID: {}, Title: {}", book.id, book.title);
    Ok(())
}

/// Add every book in a YAML file.
pub async fn seed(path: &Path) -> Result<(), BooksError> {
    let yaml = std::fs::read_to_string(path)
        .map_err(|e| BooksError::Read(path.display().to_string(), e))?;
    let books = parse_seed(&yaml)?;

    let store = PgStore::new(connect().await?);
    for input in &books {
        let book = store.create_book(input, None).await?;
        tracing::debug!(book_id = %book.id, title = %book.title, "Seeded book");
    }

    tracing::info!("Seeded {} books from {}", books.len(), path.display());
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seed_accepts_numbers_and_strings() {
        let yaml = r#"
- title: Dune
  author: Frank Herbert
  price: "9.99"
- title: Harry Potter
  author: JK Rowling
  price: 25
"#;
        let books = parse_seed(yaml).unwrap();
        assert_eq!(books.len(), 2);
        assert_eq!(books[0].price.to_string(), "9.99");
        assert_eq!(books[1].price.to_string(), "25.00");
    }

    #[test]
    fn test_parse_seed_rejects_invalid_entry() {
        let yaml = r#"
- title: Dune
  author: Frank Herbert
  price: "9.99"
- title: ""
  author: Nobody
  price: "1.234"
"#;
        let err = parse_seed(yaml).unwrap_err();
        assert!(matches!(err, BooksError::InvalidEntry { index: 2, .. }));
    }

    #[test]
    fn test_parse_seed_rejects_malformed_yaml() {
        assert!(matches!(
            parse_seed("title: [unclosed"),
            Err(BooksError::Yaml(_))
        ));
    }
}
