//! Book instances repository: lookups by id plus filter + order queries

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::book_instance::{BookInstance, LoanStatus},
};

/// Result ordering for instance queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InstanceOrder {
    #[default]
    Id,
    /// Earliest due first (undated last), ties broken by id
    DueBack,
}

/// Conjunctive filter over book instances
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstanceFilter {
    pub status: Option<LoanStatus>,
    pub borrower_id: Option<i32>,
    pub book_id: Option<i32>,
    pub order: InstanceOrder,
}

impl InstanceFilter {
    pub fn with_status(status: LoanStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn for_book(book_id: i32) -> Self {
        Self {
            book_id: Some(book_id),
            ..Default::default()
        }
    }

    pub fn borrower(mut self, borrower_id: i32) -> Self {
        self.borrower_id = Some(borrower_id);
        self
    }

    pub fn ordered_by_due_back(mut self) -> Self {
        self.order = InstanceOrder::DueBack;
        self
    }

    pub fn matches(&self, instance: &BookInstance) -> bool {
        self.status.map_or(true, |s| instance.status == s)
            && self.borrower_id.map_or(true, |b| instance.borrower_id == Some(b))
            && self.book_id.map_or(true, |b| instance.book_id == b)
    }

    /// WHERE clause with positional parameters in status, borrower, book order
    fn where_clause(&self) -> String {
        let mut conditions = Vec::new();
        let mut idx = 1;

        if self.status.is_some() {
            conditions.push(format!("status = ${}", idx));
            idx += 1;
        }
        if self.borrower_id.is_some() {
            conditions.push(format!("borrower_id = ${}", idx));
            idx += 1;
        }
        if self.book_id.is_some() {
            conditions.push(format!("book_id = ${}", idx));
        }

        if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        }
    }

    fn order_clause(&self) -> &'static str {
        match self.order {
            InstanceOrder::Id => "ORDER BY id",
            InstanceOrder::DueBack => "ORDER BY due_back ASC NULLS LAST, id",
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookInstancesRepository: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> AppResult<BookInstance>;
    async fn find(&self, filter: &InstanceFilter) -> AppResult<Vec<BookInstance>>;
    async fn count(&self, filter: &InstanceFilter) -> AppResult<i64>;
    async fn insert(&self, instance: &BookInstance) -> AppResult<()>;
    /// Overwrite the mutable fields of an existing instance
    async fn save(&self, instance: &BookInstance) -> AppResult<()>;
}

#[derive(Clone)]
pub struct PgBookInstancesRepository {
    pool: Pool<Postgres>,
}

impl PgBookInstancesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookInstancesRepository for PgBookInstancesRepository {
    async fn get_by_id(&self, id: Uuid) -> AppResult<BookInstance> {
        sqlx::query_as::<_, BookInstance>(
            "SELECT id, book_id, imprint, due_back, borrower_id, status FROM book_instances WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::not_found("Book instance", id))
    }

    async fn find(&self, filter: &InstanceFilter) -> AppResult<Vec<BookInstance>> {
        let query = format!(
            "SELECT id, book_id, imprint, due_back, borrower_id, status FROM book_instances {} {}",
            filter.where_clause(),
            filter.order_clause()
        );

        let mut builder = sqlx::query_as::<_, BookInstance>(&query);
        if let Some(status) = filter.status {
            builder = builder.bind(status);
        }
        if let Some(borrower_id) = filter.borrower_id {
            builder = builder.bind(borrower_id);
        }
        if let Some(book_id) = filter.book_id {
            builder = builder.bind(book_id);
        }

        let rows = builder.fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn count(&self, filter: &InstanceFilter) -> AppResult<i64> {
        let query = format!("SELECT COUNT(*) FROM book_instances {}", filter.where_clause());

        let mut builder = sqlx::query_scalar::<_, i64>(&query);
        if let Some(status) = filter.status {
            builder = builder.bind(status);
        }
        if let Some(borrower_id) = filter.borrower_id {
            builder = builder.bind(borrower_id);
        }
        if let Some(book_id) = filter.book_id {
            builder = builder.bind(book_id);
        }

        let count = builder.fetch_one(&self.pool).await?;
        Ok(count)
    }

    async fn insert(&self, instance: &BookInstance) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO book_instances (id, book_id, imprint, due_back, borrower_id, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(instance.id)
        .bind(instance.book_id)
        .bind(&instance.imprint)
        .bind(instance.due_back)
        .bind(instance.borrower_id)
        .bind(instance.status)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn save(&self, instance: &BookInstance) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE book_instances
            SET imprint = $2, due_back = $3, borrower_id = $4, status = $5
            WHERE id = $1
            "#,
        )
        .bind(instance.id)
        .bind(&instance.imprint)
        .bind(instance.due_back)
        .bind(instance.borrower_id)
        .bind(instance.status)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Book instance", instance.id));
        }
        Ok(())
    }
}
