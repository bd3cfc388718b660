//! Authors repository

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::author::{Author, AuthorInput},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthorsRepository: Send + Sync {
    async fn get_by_id(&self, id: i32) -> AppResult<Author>;
    /// All authors in display order (last name, youngest first, id)
    async fn list(&self) -> AppResult<Vec<Author>>;
    async fn create(&self, author: &AuthorInput) -> AppResult<Author>;
    async fn update(&self, id: i32, author: &AuthorInput) -> AppResult<Author>;
    async fn delete(&self, id: i32) -> AppResult<()>;
    async fn count(&self) -> AppResult<i64>;
}

#[derive(Clone)]
pub struct PgAuthorsRepository {
    pool: Pool<Postgres>,
}

impl PgAuthorsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthorsRepository for PgAuthorsRepository {
    async fn get_by_id(&self, id: i32) -> AppResult<Author> {
        sqlx::query_as::<_, Author>(
            "SELECT id, first_name, last_name, date_of_birth, date_of_death FROM authors WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::not_found("Author", id))
    }

    async fn list(&self) -> AppResult<Vec<Author>> {
        let authors = sqlx::query_as::<_, Author>(
            r#"
            SELECT id, first_name, last_name, date_of_birth, date_of_death
            FROM authors
            ORDER BY last_name, date_of_birth DESC NULLS LAST, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(authors)
    }

    async fn create(&self, author: &AuthorInput) -> AppResult<Author> {
        let created = sqlx::query_as::<_, Author>(
            r#"
            INSERT INTO authors (first_name, last_name, date_of_birth, date_of_death)
            VALUES ($1, $2, $3, $4)
            RETURNING id, first_name, last_name, date_of_birth, date_of_death
            "#,
        )
        .bind(&author.first_name)
        .bind(&author.last_name)
        .bind(author.date_of_birth)
        .bind(author.date_of_death)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn update(&self, id: i32, author: &AuthorInput) -> AppResult<Author> {
        sqlx::query_as::<_, Author>(
            r#"
            UPDATE authors
            SET first_name = $2, last_name = $3, date_of_birth = $4, date_of_death = $5
            WHERE id = $1
            RETURNING id, first_name, last_name, date_of_birth, date_of_death
            "#,
        )
        .bind(id)
        .bind(&author.first_name)
        .bind(&author.last_name)
        .bind(author.date_of_birth)
        .bind(author.date_of_death)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::not_found("Author", id))
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Author", id));
        }
        Ok(())
    }

    async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM authors")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
