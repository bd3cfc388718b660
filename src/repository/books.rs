//! Books repository. Genres live in the `book_genres` join table and are
//! aggregated into `Book::genre_ids` on read.

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookInput},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BooksRepository: Send + Sync {
    async fn get_by_id(&self, id: i32) -> AppResult<Book>;
    /// All books ordered by title, then id
    async fn list(&self) -> AppResult<Vec<Book>>;
    async fn list_by_author(&self, author_id: i32) -> AppResult<Vec<Book>>;
    /// Case-insensitive containment match on title, ordered by title, then id
    async fn search_by_title(&self, substring: &str) -> AppResult<Vec<Book>>;
    /// `book.genre_ids` must already be sorted and deduplicated
    async fn create(&self, book: &BookInput) -> AppResult<Book>;
    async fn update(&self, id: i32, book: &BookInput) -> AppResult<Book>;
    async fn delete(&self, id: i32) -> AppResult<()>;
    async fn count(&self) -> AppResult<i64>;
}

const SELECT_BOOKS: &str = r#"
    SELECT b.id, b.title, b.summary, b.isbn, b.author_id, b.language_id,
           COALESCE(
               array_agg(bg.genre_id ORDER BY bg.genre_id) FILTER (WHERE bg.genre_id IS NOT NULL),
               '{}'
           ) AS genre_ids
    FROM books b
    LEFT JOIN book_genres bg ON bg.book_id = b.id
"#;

/// Build an ILIKE pattern matching `s` literally anywhere in the value
pub fn contains_pattern(s: &str) -> String {
    let escaped = s
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[derive(Clone)]
pub struct PgBooksRepository {
    pool: Pool<Postgres>,
}

impl PgBooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn insert_genres(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        book_id: i32,
        genre_ids: &[i32],
    ) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO book_genres (book_id, genre_id) SELECT $1, UNNEST($2::int4[])",
        )
        .bind(book_id)
        .bind(genre_ids)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl BooksRepository for PgBooksRepository {
    async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        let query = format!("{} WHERE b.id = $1 GROUP BY b.id", SELECT_BOOKS);
        sqlx::query_as::<_, Book>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("Book", id))
    }

    async fn list(&self) -> AppResult<Vec<Book>> {
        let query = format!("{} GROUP BY b.id ORDER BY b.title, b.id", SELECT_BOOKS);
        let books = sqlx::query_as::<_, Book>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    async fn list_by_author(&self, author_id: i32) -> AppResult<Vec<Book>> {
        let query = format!(
            "{} WHERE b.author_id = $1 GROUP BY b.id ORDER BY b.title, b.id",
            SELECT_BOOKS
        );
        let books = sqlx::query_as::<_, Book>(&query)
            .bind(author_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    async fn search_by_title(&self, substring: &str) -> AppResult<Vec<Book>> {
        let query = format!(
            "{} WHERE b.title ILIKE $1 ESCAPE '\\' GROUP BY b.id ORDER BY b.title, b.id",
            SELECT_BOOKS
        );
        let books = sqlx::query_as::<_, Book>(&query)
            .bind(contains_pattern(substring))
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    async fn create(&self, book: &BookInput) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO books (title, summary, isbn, author_id, language_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&book.title)
        .bind(&book.summary)
        .bind(&book.isbn)
        .bind(book.author_id)
        .bind(book.language_id)
        .fetch_one(&mut *tx)
        .await?;

        Self::insert_genres(&mut tx, id, &book.genre_ids).await?;
        tx.commit().await?;

        self.get_by_id(id).await
    }

    async fn update(&self, id: i32, book: &BookInput) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE books
            SET title = $2, summary = $3, isbn = $4, author_id = $5, language_id = $6
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&book.title)
        .bind(&book.summary)
        .bind(&book.isbn)
        .bind(book.author_id)
        .bind(book.language_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Book", id));
        }

        sqlx::query("DELETE FROM book_genres WHERE book_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        Self::insert_genres(&mut tx, id, &book.genre_ids).await?;
        tx.commit().await?;

        self.get_by_id(id).await
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Book", id));
        }
        Ok(())
    }

    async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
