//! Users repository (identity collaborator storage)

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::user::{Capability, User, UserRow},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UsersRepository: Send + Sync {
    async fn get_by_id(&self, id: i32) -> AppResult<User>;
    async fn get_by_username(&self, username: &str) -> AppResult<Option<User>>;
    async fn create(
        &self,
        username: &str,
        password_hash: &str,
        capabilities: &[Capability],
    ) -> AppResult<User>;
}

#[derive(Clone)]
pub struct PgUsersRepository {
    pool: Pool<Postgres>,
}

impl PgUsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UsersRepository for PgUsersRepository {
    async fn get_by_id(&self, id: i32) -> AppResult<User> {
        sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password_hash, capabilities FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(User::from)
        .ok_or_else(|| AppError::not_found("User", id))
    }

    async fn get_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password_hash, capabilities FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn create(
        &self,
        username: &str,
        password_hash: &str,
        capabilities: &[Capability],
    ) -> AppResult<User> {
        let capabilities: Vec<String> = capabilities.iter().map(|c| c.to_string()).collect();
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (username, password_hash, capabilities)
            VALUES ($1, $2, $3)
            RETURNING id, username, password_hash, capabilities
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .bind(capabilities)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict(format!("Username {} is taken", username))
            }
            other => AppError::from(other),
        })?;
        Ok(row.into())
    }
}
