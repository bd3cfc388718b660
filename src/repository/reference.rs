//! Genres and languages repository

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::reference::{Genre, Language},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReferenceRepository: Send + Sync {
    async fn list_genres(&self) -> AppResult<Vec<Genre>>;
    /// Genres among `ids` that exist, ordered by id
    async fn get_genres(&self, ids: &[i32]) -> AppResult<Vec<Genre>>;
    async fn create_genre(&self, name: &str) -> AppResult<Genre>;
    async fn count_genres(&self) -> AppResult<i64>;
    async fn list_languages(&self) -> AppResult<Vec<Language>>;
    async fn get_language(&self, id: i32) -> AppResult<Language>;
    async fn create_language(&self, name: &str) -> AppResult<Language>;
}

#[derive(Clone)]
pub struct PgReferenceRepository {
    pool: Pool<Postgres>,
}

impl PgReferenceRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReferenceRepository for PgReferenceRepository {
    async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        let genres = sqlx::query_as::<_, Genre>("SELECT id, name FROM genres ORDER BY name, id")
            .fetch_all(&self.pool)
            .await?;
        Ok(genres)
    }

    async fn get_genres(&self, ids: &[i32]) -> AppResult<Vec<Genre>> {
        let genres = sqlx::query_as::<_, Genre>(
            "SELECT id, name FROM genres WHERE id = ANY($1) ORDER BY id",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(genres)
    }

    async fn create_genre(&self, name: &str) -> AppResult<Genre> {
        let genre = sqlx::query_as::<_, Genre>(
            "INSERT INTO genres (name) VALUES ($1) RETURNING id, name",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(genre)
    }

    async fn count_genres(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM genres")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn list_languages(&self) -> AppResult<Vec<Language>> {
        let languages =
            sqlx::query_as::<_, Language>("SELECT id, name FROM languages ORDER BY name, id")
                .fetch_all(&self.pool)
                .await?;
        Ok(languages)
    }

    async fn get_language(&self, id: i32) -> AppResult<Language> {
        sqlx::query_as::<_, Language>("SELECT id, name FROM languages WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("Language", id))
    }

    async fn create_language(&self, name: &str) -> AppResult<Language> {
        let language = sqlx::query_as::<_, Language>(
            "INSERT INTO languages (name) VALUES ($1) RETURNING id, name",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(language)
    }
}
