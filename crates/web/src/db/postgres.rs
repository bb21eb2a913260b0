//! `PostgreSQL` implementation of the repository traits.
//!
//! Queries are checked at runtime (`query_as` + `FromRow`) so the crate builds
//! without a live database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use bookshelf_core::{BookId, Email, Permission, Price, ReviewId, ReviewText, UserId};

use super::{AccountRepository, CatalogRepository, CoverUpdate, RepositoryError};
use crate::models::{Book, BookInput, Review, User};

/// Repository backed by a `PostgreSQL` pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// =============================================================================
// Row types
// =============================================================================

#[derive(sqlx::FromRow)]
struct BookRow {
    id: Uuid,
    title: String,
    author: String,
    price: Decimal,
    cover: Option<String>,
}

impl TryFrom<BookRow> for Book {
    type Error = RepositoryError;

    fn try_from(row: BookRow) -> Result<Self, Self::Error> {
        let price = Price::new(row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price for book {}: {e}", row.id))
        })?;

        Ok(Self {
            id: BookId::from_uuid(row.id),
            title: row.title,
            author: row.author,
            price,
            cover: row.cover,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: i64,
    book_id: Uuid,
    review: String,
    author_id: i64,
    author_username: String,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: ReviewId::new(row.id),
            book_id: BookId::from_uuid(row.book_id),
            review: row.review,
            author_id: UserId::new(row.author_id),
            author_username: row.author_username,
        }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    username: String,
    is_staff: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            email,
            username: row.username,
            is_staff: row.is_staff,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct UserWithHashRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

/// Map foreign key violations to `NotFound`, everything else to `Database`.
fn missing_parent(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_foreign_key_violation()
    {
        return RepositoryError::NotFound;
    }
    RepositoryError::Database(e)
}

const BOOK_COLUMNS: &str = "id, title, author, price, cover";

const REVIEW_SELECT: &str = r"
    SELECT r.id, r.book_id, r.review, r.author_id, u.username AS author_username
    FROM review r
    JOIN app_user u ON u.id = r.author_id
";

// =============================================================================
// Catalog
// =============================================================================

#[async_trait]
impl CatalogRepository for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn list_books(&self) -> Result<Vec<Book>, RepositoryError> {
        let rows = sqlx::query_as::<_, BookRow>(&format!(
            "SELECT {BOOK_COLUMNS} FROM book ORDER BY title, id"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Book::try_from).collect()
    }

    async fn search_books(&self, query: &str) -> Result<Vec<Book>, RepositoryError> {
        // strpos keeps `%` and `_` literal, unlike ILIKE.
        let rows = sqlx::query_as::<_, BookRow>(&format!(
            r"
            SELECT {BOOK_COLUMNS} FROM book
            WHERE strpos(lower(title), lower($1)) > 0
               OR strpos(lower(author), lower($1)) > 0
            ORDER BY title, id
            "
        ))
        .bind(query)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Book::try_from).collect()
    }

    async fn get_book(&self, id: BookId) -> Result<Option<Book>, RepositoryError> {
        let row = sqlx::query_as::<_, BookRow>(&format!(
            "SELECT {BOOK_COLUMNS} FROM book WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Book::try_from).transpose()
    }

    async fn create_book(
        &self,
        input: &BookInput,
        cover: Option<&str>,
    ) -> Result<Book, RepositoryError> {
        let row = sqlx::query_as::<_, BookRow>(&format!(
            r"
            INSERT INTO book (id, title, author, price, cover)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {BOOK_COLUMNS}
            "
        ))
        .bind(BookId::generate().as_uuid())
        .bind(&input.title)
        .bind(&input.author)
        .bind(input.price.amount())
        .bind(cover)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn update_book(
        &self,
        id: BookId,
        input: &BookInput,
        cover: CoverUpdate,
    ) -> Result<Book, RepositoryError> {
        let (replace_cover, new_cover) = match cover {
            CoverUpdate::Keep => (false, None),
            CoverUpdate::Replace(path) => (true, Some(path)),
            CoverUpdate::Clear => (true, None),
        };

        let row = sqlx::query_as::<_, BookRow>(&format!(
            r"
            UPDATE book
            SET title = $2,
                author = $3,
                price = $4,
                cover = CASE WHEN $5 THEN $6 ELSE cover END
            WHERE id = $1
            RETURNING {BOOK_COLUMNS}
            "
        ))
        .bind(id.as_uuid())
        .bind(&input.title)
        .bind(&input.author)
        .bind(input.price.amount())
        .bind(replace_cover)
        .bind(new_cover)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    async fn delete_book(&self, id: BookId) -> Result<Option<Book>, RepositoryError> {
        let row = sqlx::query_as::<_, BookRow>(&format!(
            "DELETE FROM book WHERE id = $1 RETURNING {BOOK_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Book::try_from).transpose()
    }

    async fn list_reviews(&self, book_id: BookId) -> Result<Vec<Review>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReviewRow>(&format!(
            "{REVIEW_SELECT} WHERE r.book_id = $1 ORDER BY r.id"
        ))
        .bind(book_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Review::from).collect())
    }

    async fn get_review(&self, id: ReviewId) -> Result<Option<Review>, RepositoryError> {
        let row = sqlx::query_as::<_, ReviewRow>(&format!("{REVIEW_SELECT} WHERE r.id = $1"))
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Review::from))
    }

    async fn create_review(
        &self,
        book_id: BookId,
        author_id: UserId,
        text: &ReviewText,
    ) -> Result<Review, RepositoryError> {
        let row = sqlx::query_as::<_, ReviewRow>(
            r"
            WITH inserted AS (
                INSERT INTO review (book_id, review, author_id)
                VALUES ($1, $2, $3)
                RETURNING id, book_id, review, author_id
            )
            SELECT i.id, i.book_id, i.review, i.author_id, u.username AS author_username
            FROM inserted i
            JOIN app_user u ON u.id = i.author_id
            ",
        )
        .bind(book_id.as_uuid())
        .bind(text.as_str())
        .bind(author_id.as_i64())
        .fetch_one(&self.pool)
        .await
        .map_err(missing_parent)?;

        Ok(row.into())
    }

    async fn update_review(
        &self,
        id: ReviewId,
        text: &ReviewText,
    ) -> Result<Review, RepositoryError> {
        let row = sqlx::query_as::<_, ReviewRow>(
            r"
            WITH updated AS (
                UPDATE review SET review = $2 WHERE id = $1
                RETURNING id, book_id, review, author_id
            )
            SELECT d.id, d.book_id, d.review, d.author_id, u.username AS author_username
            FROM updated d
            JOIN app_user u ON u.id = d.author_id
            ",
        )
        .bind(id.as_i64())
        .bind(text.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    async fn delete_review(&self, id: ReviewId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM review WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// Accounts
// =============================================================================

#[async_trait]
impl AccountRepository for PgStore {
    async fn create_user(
        &self,
        email: &Email,
        username: &str,
        password_hash: &str,
        is_staff: bool,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO app_user (email, username, password_hash, is_staff)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, username, is_staff, created_at
            ",
        )
        .bind(email.as_str())
        .bind(username)
        .bind(password_hash)
        .bind(is_staff)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        row.try_into()
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, username, is_staff, created_at FROM app_user WHERE id = $1",
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn get_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, username, is_staff, created_at FROM app_user WHERE email = $1",
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserWithHashRow>(
            r"
            SELECT id, email, username, is_staff, created_at, password_hash
            FROM app_user
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some((r.user.try_into()?, r.password_hash))),
            None => Ok(None),
        }
    }

    async fn permissions(&self, id: UserId) -> Result<Vec<Permission>, RepositoryError> {
        let codenames: Vec<String> = sqlx::query_scalar(
            "SELECT codename FROM user_permission WHERE user_id = $1 ORDER BY codename",
        )
        .bind(id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        codenames
            .iter()
            .map(|codename| {
                Permission::from_codename(codename)
                    .map_err(|e| RepositoryError::DataCorruption(e.to_string()))
            })
            .collect()
    }

    async fn grant_permission(
        &self,
        id: UserId,
        permission: Permission,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO user_permission (user_id, codename)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            ",
        )
        .bind(id.as_i64())
        .bind(permission.codename())
        .execute(&self.pool)
        .await
        .map_err(missing_parent)?;

        Ok(())
    }

    async fn revoke_permission(
        &self,
        id: UserId,
        permission: Permission,
    ) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM user_permission WHERE user_id = $1 AND codename = $2")
                .bind(id.as_i64())
                .bind(permission.codename())
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }
}
