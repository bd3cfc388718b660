//! Repository layer: storage traits and their backends

pub mod authors;
pub mod book_instances;
pub mod books;
pub mod memory;
pub mod reference;
pub mod users;

use std::sync::Arc;

use sqlx::{Pool, Postgres};

use crate::error::AppResult;

pub use authors::AuthorsRepository;
pub use book_instances::{BookInstancesRepository, InstanceFilter, InstanceOrder};
pub use books::BooksRepository;
pub use memory::MemoryStore;
pub use reference::ReferenceRepository;
pub use users::UsersRepository;

/// Main repository struct holding one handle per entity store
#[derive(Clone)]
pub struct Repository {
    pub authors: Arc<dyn AuthorsRepository>,
    pub books: Arc<dyn BooksRepository>,
    pub reference: Arc<dyn ReferenceRepository>,
    pub instances: Arc<dyn BookInstancesRepository>,
    pub users: Arc<dyn UsersRepository>,
    pub(crate) pool: Option<Pool<Postgres>>,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            authors: Arc::new(authors::PgAuthorsRepository::new(pool.clone())),
            books: Arc::new(books::PgBooksRepository::new(pool.clone())),
            reference: Arc::new(reference::PgReferenceRepository::new(pool.clone())),
            instances: Arc::new(book_instances::PgBookInstancesRepository::new(pool.clone())),
            users: Arc::new(users::PgUsersRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// Repository over a shared in-memory store
    pub fn in_memory(store: MemoryStore) -> Self {
        Self {
            authors: Arc::new(store.clone()),
            books: Arc::new(store.clone()),
            reference: Arc::new(store.clone()),
            instances: Arc::new(store.clone()),
            users: Arc::new(store),
            pool: None,
        }
    }

    /// Check that the backing store answers
    pub async fn ping(&self) -> AppResult<()> {
        if let Some(pool) = &self.pool {
            sqlx::query("SELECT 1").execute(pool).await?;
        }
        Ok(())
    }
}
