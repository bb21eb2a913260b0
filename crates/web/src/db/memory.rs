//! In-process implementation of the repository traits.
//!
//! Mirrors the `PostgreSQL` schema's cascades and unique constraints so the
//! router can be exercised without a database.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use bookshelf_core::{BookId, Email, Permission, ReviewId, ReviewText, UserId};

use super::{AccountRepository, CatalogRepository, CoverUpdate, RepositoryError};
use crate::models::{Book, BookInput, Review, User};

struct StoredReview {
    book_id: BookId,
    review: String,
    author_id: UserId,
}

struct StoredUser {
    user: User,
    password_hash: String,
}

#[derive(Default)]
struct Tables {
    books: BTreeMap<BookId, Book>,
    reviews: BTreeMap<ReviewId, StoredReview>,
    users: BTreeMap<UserId, StoredUser>,
    permissions: HashSet<(UserId, Permission)>,
    last_review_id: i64,
    last_user_id: i64,
}

fn sorted_books<'a>(books: impl Iterator<Item = &'a Book>) -> Vec<Book> {
    let mut books: Vec<Book> = books.cloned().collect();
    books.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
    books
}

impl Tables {
    fn review(&self, id: ReviewId, stored: &StoredReview) -> Result<Review, RepositoryError> {
        let author = self.users.get(&stored.author_id).ok_or_else(|| {
            RepositoryError::DataCorruption(format!("review {id} has no author"))
        })?;

        Ok(Review {
            id,
            book_id: stored.book_id,
            review: stored.review.clone(),
            author_id: stored.author_id,
            author_username: author.user.username.clone(),
        })
    }
}

/// Repository that keeps everything in memory behind a `RwLock`.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches_query(book: &Book, needle: &str) -> bool {
    book.title.to_lowercase().contains(needle) || book.author.to_lowercase().contains(needle)
}

#[async_trait]
impl CatalogRepository for InMemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn list_books(&self) -> Result<Vec<Book>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(sorted_books(tables.books.values()))
    }

    async fn search_books(&self, query: &str) -> Result<Vec<Book>, RepositoryError> {
        let needle = query.to_lowercase();
        let tables = self.tables.read().await;
        Ok(sorted_books(
            tables
                .books
                .values()
                .filter(|book| matches_query(book, &needle)),
        ))
    }

    async fn get_book(&self, id: BookId) -> Result<Option<Book>, RepositoryError> {
        Ok(self.tables.read().await.books.get(&id).cloned())
    }

    async fn create_book(
        &self,
        input: &BookInput,
        cover: Option<&str>,
    ) -> Result<Book, RepositoryError> {
        let book = Book {
            id: BookId::generate(),
            title: input.title.clone(),
            author: input.author.clone(),
            price: input.price,
            cover: cover.map(str::to_owned),
        };
        self.tables.write().await.books.insert(book.id, book.clone());
        Ok(book)
    }

    async fn update_book(
        &self,
        id: BookId,
        input: &BookInput,
        cover: CoverUpdate,
    ) -> Result<Book, RepositoryError> {
        let mut tables = self.tables.write().await;
        let book = tables.books.get_mut(&id).ok_or(RepositoryError::NotFound)?;

        book.title.clone_from(&input.title);
        book.author.clone_from(&input.author);
        book.price = input.price;
        match cover {
            CoverUpdate::Keep => {}
            CoverUpdate::Replace(path) => book.cover = Some(path),
            CoverUpdate::Clear => book.cover = None,
        }

        Ok(book.clone())
    }

    async fn delete_book(&self, id: BookId) -> Result<Option<Book>, RepositoryError> {
        let mut tables = self.tables.write().await;
        let deleted = tables.books.remove(&id);
        if deleted.is_some() {
            tables.reviews.retain(|_, review| review.book_id != id);
        }
        Ok(deleted)
    }

    async fn list_reviews(&self, book_id: BookId) -> Result<Vec<Review>, RepositoryError> {
        let tables = self.tables.read().await;
        tables
            .reviews
            .iter()
            .filter(|(_, stored)| stored.book_id == book_id)
            .map(|(id, stored)| tables.review(*id, stored))
            .collect()
    }

    async fn get_review(&self, id: ReviewId) -> Result<Option<Review>, RepositoryError> {
        let tables = self.tables.read().await;
        tables
            .reviews
            .get(&id)
            .map(|stored| tables.review(id, stored))
            .transpose()
    }

    async fn create_review(
        &self,
        book_id: BookId,
        author_id: UserId,
        text: &ReviewText,
    ) -> Result<Review, RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.books.contains_key(&book_id) || !tables.users.contains_key(&author_id) {
            return Err(RepositoryError::NotFound);
        }

        tables.last_review_id += 1;
        let id = ReviewId::new(tables.last_review_id);
        let stored = StoredReview {
            book_id,
            review: text.as_str().to_owned(),
            author_id,
        };
        let review = tables.review(id, &stored)?;
        tables.reviews.insert(id, stored);
        Ok(review)
    }

    async fn update_review(
        &self,
        id: ReviewId,
        text: &ReviewText,
    ) -> Result<Review, RepositoryError> {
        let mut tables = self.tables.write().await;
        let stored = tables.reviews.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        stored.review = text.as_str().to_owned();

        let stored = tables.reviews.get(&id).ok_or(RepositoryError::NotFound)?;
        tables.review(id, stored)
    }

    async fn delete_review(&self, id: ReviewId) -> Result<bool, RepositoryError> {
        Ok(self.tables.write().await.reviews.remove(&id).is_some())
    }
}

#[async_trait]
impl AccountRepository for InMemoryStore {
    async fn create_user(
        &self,
        email: &Email,
        username: &str,
        password_hash: &str,
        is_staff: bool,
    ) -> Result<User, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|stored| &stored.user.email == email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        tables.last_user_id += 1;
        let user = User {
            id: UserId::new(tables.last_user_id),
            email: email.clone(),
            username: username.to_owned(),
            is_staff,
            created_at: Utc::now(),
        };
        tables.users.insert(
            user.id,
            StoredUser {
                user: user.clone(),
                password_hash: password_hash.to_owned(),
            },
        );
        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(&id).map(|stored| stored.user.clone()))
    }

    async fn get_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .get_password_hash(email)
            .await?
            .map(|(user, _)| user))
    }

    async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|stored| &stored.user.email == email)
            .map(|stored| (stored.user.clone(), stored.password_hash.clone())))
    }

    async fn permissions(&self, id: UserId) -> Result<Vec<Permission>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(Permission::ALL
            .into_iter()
            .filter(|permission| tables.permissions.contains(&(id, *permission)))
            .collect())
    }

    async fn grant_permission(
        &self,
        id: UserId,
        permission: Permission,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&id) {
            return Err(RepositoryError::NotFound);
        }
        tables.permissions.insert((id, permission));
        Ok(())
    }

    async fn revoke_permission(
        &self,
        id: UserId,
        permission: Permission,
    ) -> Result<bool, RepositoryError> {
        Ok(self.tables.write().await.permissions.remove(&(id, permission)))
    }
}
